pub mod config;
pub mod error;
pub mod routes;
pub mod store;
pub mod validation;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, ErrorHandlerResponse, ErrorHandlers, Logger};
use actix_web::{guard, web, App, Error, HttpResponse};
use tasklist_shared::ApiResponse;

pub use config::Config;
pub use error::ApiError;
pub use store::{StoreError, TaskPatch, TaskStore};

fn response_headers(frontend_url: &str) -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", frontend_url))
        .add(("Access-Control-Allow-Credentials", "true"))
        .add((
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, PATCH, DELETE, OPTIONS",
        ))
        .add(("Access-Control-Allow-Headers", "Content-Type"))
        .add(("Vary", "Origin"))
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "SAMEORIGIN"))
        .add(("Referrer-Policy", "no-referrer"))
}

/// Rewrites any 5xx that did not come from `ApiError` into a generic
/// envelope, so internal error text never reaches the client.
fn internal_error_envelope<B>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let is_json = res
        .response()
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes().starts_with(b"application/json"));
    if is_json {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let status = res.status();
    log::error!(
        "Unhandled {status} for {} {}",
        res.request().method(),
        res.request().path()
    );
    let (req, _) = res.into_parts();
    let response = HttpResponse::build(status)
        .json(ApiResponse::<()>::failure("Internal server error"));
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, response).map_into_right_body(),
    ))
}

/// Builds the HTTP application around an already connected store.
pub fn app(
    store: TaskStore,
    frontend_url: &str,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(store))
        .app_data(routes::json_config())
        .wrap(ErrorHandlers::new().default_handler_server(internal_error_envelope))
        .wrap(response_headers(frontend_url))
        .wrap(Logger::default())
        .service(
            web::resource("/{tail:.*}")
                .guard(guard::Options())
                .to(routes::preflight),
        )
        .configure(routes::configure)
        .default_service(web::to(routes::route_not_found))
}
