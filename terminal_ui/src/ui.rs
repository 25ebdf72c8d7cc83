use chrono::{DateTime, Local, Utc};
use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::api::TaskApi;
use crate::state::TaskList;

/// Terminal-only view state: which row is selected and whether the
/// new-task line has focus.
#[derive(Default)]
pub struct View {
    pub list: ListState,
    pub adding: bool,
}

impl View {
    pub fn selected(&self) -> Option<usize> {
        self.list.selected()
    }

    /// Keeps the selection inside a list of `len` rows.
    pub fn clamp(&mut self, len: usize) {
        let selected = match (self.list.selected(), len) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(i), len) => Some(i.min(len - 1)),
        };
        self.list.select(selected);
    }

    pub fn next(&mut self, len: usize) {
        if len > 0 {
            let i = self.list.selected().map_or(0, |i| (i + 1).min(len - 1));
            self.list.select(Some(i));
        }
    }

    pub fn previous(&mut self) {
        if let Some(i) = self.list.selected() {
            self.list.select(Some(i.saturating_sub(1)));
        }
    }
}

/// Column of the cursor after `input`, kept inside the bordered `area`.
fn input_cursor_x(area: Rect, input: &str) -> u16 {
    let typed = u16::try_from(input.chars().count()).unwrap_or(u16::MAX);
    let x = area.x.saturating_add(1).saturating_add(typed);
    x.min(area.right().saturating_sub(2))
}

fn format_date(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%b %-d, %H:%M").to_string()
}

pub fn draw<B: Backend, A: TaskApi>(f: &mut Frame<B>, tasks: &TaskList<A>, view: &mut View) {
    if tasks.is_loading() {
        let loading = Paragraph::new("Loading tasks...")
            .block(Block::default().borders(Borders::ALL).title("tasklist"))
            .alignment(Alignment::Center);
        f.render_widget(loading, f.size());
        return;
    }

    let error_height = if tasks.error().is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(error_height),
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.size());

    draw_stats(f, tasks, chunks[0]);
    if let Some(error) = tasks.error() {
        let banner = Paragraph::new(error)
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title("error (x to dismiss)"))
            .wrap(Wrap { trim: true });
        f.render_widget(banner, chunks[1]);
    }
    draw_input(f, tasks, view, chunks[2]);
    draw_tasks(f, tasks, view, chunks[3]);
    draw_help(f, tasks, view, chunks[4]);
}

fn draw_stats<B: Backend, A: TaskApi>(f: &mut Frame<B>, tasks: &TaskList<A>, area: Rect) {
    let stats = tasks.stats();
    let line = Spans::from(vec![
        Span::raw("Total: "),
        Span::styled(stats.total.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("   Completed: "),
        Span::styled(
            stats.completed.to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   Remaining: "),
        Span::styled(
            stats.remaining.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ]);
    let header = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title("To-Do List"))
        .alignment(Alignment::Center);
    f.render_widget(header, area);
}

fn draw_input<B: Backend, A: TaskApi>(
    f: &mut Frame<B>,
    tasks: &TaskList<A>,
    view: &View,
    area: Rect,
) {
    let style = if view.adding {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let input = Paragraph::new(tasks.input())
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Add a new task..."));
    f.render_widget(input, area);
    if view.adding {
        f.set_cursor(input_cursor_x(area, tasks.input()), area.y + 1);
    }
}

fn draw_tasks<B: Backend, A: TaskApi>(
    f: &mut Frame<B>,
    tasks: &TaskList<A>,
    view: &mut View,
    area: Rect,
) {
    let block = Block::default().borders(Borders::ALL).title("Tasks");
    if tasks.tasks().is_empty() {
        let empty = Paragraph::new("No tasks yet. Add one above to get started!")
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = tasks
        .tasks()
        .iter()
        .map(|task| {
            let checkbox = if task.completed { "[x] " } else { "[ ] " };
            let text = match tasks.editing() {
                Some(edit) if edit.id == task.id => Span::styled(
                    format!("{}_", edit.draft),
                    Style::default().fg(Color::Yellow),
                ),
                _ if task.completed => Span::styled(
                    task.text.clone(),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT),
                ),
                _ => Span::raw(task.text.clone()),
            };
            let mut line = vec![Span::raw(checkbox), text];
            if tasks.pending_delete() == Some(task.id) {
                line.push(Span::styled(
                    "  delete? (y/n)",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ));
            }
            line.push(Span::styled(
                format!("  {}", format_date(&task.created_at)),
                Style::default().fg(Color::LightBlue),
            ));
            ListItem::new(Spans::from(line))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut view.list);
}

fn draw_help<B: Backend, A: TaskApi>(
    f: &mut Frame<B>,
    tasks: &TaskList<A>,
    view: &View,
    area: Rect,
) {
    let help = if tasks.pending_delete().is_some() {
        "y: delete  n/esc: keep"
    } else if tasks.editing().is_some() {
        "enter: save  esc: cancel"
    } else if view.adding {
        "enter: add task  esc: done"
    } else {
        "a: add  space: toggle  e: edit  d: delete  r: reload  x: dismiss error  q: quit"
    };
    let line = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    f.render_widget(line, area);
}
