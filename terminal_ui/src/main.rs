mod api;
mod state;
mod ui;

use std::{env, io, time::Duration};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use api::{HttpTaskApi, TaskApi, DEFAULT_API_URL};
use state::TaskList;
use ui::View;

const TICK: Duration = Duration::from_millis(250);

#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

async fn handle_key<A: TaskApi>(key: KeyEvent, tasks: &mut TaskList<A>, view: &mut View) -> Flow {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }

    if tasks.pending_delete().is_some() {
        match key.code {
            KeyCode::Char('y') => tasks.confirm_delete().await,
            KeyCode::Char('n') | KeyCode::Esc => tasks.cancel_delete(),
            _ => {}
        }
        return Flow::Continue;
    }

    if let Some(draft) = tasks.edit_draft_mut() {
        match key.code {
            KeyCode::Char(c) => draft.push(c),
            KeyCode::Backspace => {
                draft.pop();
            }
            KeyCode::Enter => tasks.commit_edit().await,
            KeyCode::Esc => tasks.cancel_edit(),
            _ => {}
        }
        return Flow::Continue;
    }

    if view.adding {
        match key.code {
            KeyCode::Char(c) => tasks.input_mut().push(c),
            KeyCode::Backspace => {
                tasks.input_mut().pop();
            }
            KeyCode::Enter => tasks.submit_new_task().await,
            KeyCode::Esc => view.adding = false,
            _ => {}
        }
        return Flow::Continue;
    }

    let selected = view
        .selected()
        .and_then(|i| tasks.tasks().get(i))
        .map(|task| task.id);
    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Char('a') | KeyCode::Char('i') => view.adding = true,
        KeyCode::Down | KeyCode::Char('j') => view.next(tasks.tasks().len()),
        KeyCode::Up | KeyCode::Char('k') => view.previous(),
        KeyCode::Char('r') => tasks.load().await,
        KeyCode::Char('x') => tasks.dismiss_error(),
        KeyCode::Char(' ') => {
            if let Some(id) = selected {
                tasks.toggle(id).await;
            }
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(id) = selected {
                tasks.begin_edit(id);
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(id) = selected {
                tasks.request_delete(id);
            }
        }
        _ => {}
    }
    Flow::Continue
}

async fn run<B: Backend, A: TaskApi>(
    terminal: &mut Terminal<B>,
    tasks: &mut TaskList<A>,
) -> io::Result<()> {
    let mut view = View::default();
    terminal.draw(|f| ui::draw(f, tasks, &mut view))?;
    tasks.load().await;

    loop {
        view.clamp(tasks.tasks().len());
        terminal.draw(|f| ui::draw(f, tasks, &mut view))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if handle_key(key, tasks, &mut view).await == Flow::Quit {
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = env::var("TASKLIST_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let mut tasks = TaskList::new(HttpTaskApi::new(&base_url)?);

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run(&mut terminal, &mut tasks).await;

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    Ok(())
}
