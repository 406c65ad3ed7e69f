use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

use quotebook::{
    categories, pick_random, validate_submission, Quote, QuoteStore, SyncEngine, SyncTrigger,
    DEFAULT_SYNC_INTERVAL_SECS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Add,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Text,
    Category,
}

pub struct App {
    pub quotes: Vec<Quote>,
    pub categories: Vec<String>,
    pub selected_index: usize,
    pub current: Option<Quote>,
    pub mode: Mode,
    pub input_field: InputField,
    pub input_text: String,
    pub input_category: String,
    pub status: Option<String>,
    pub last_sync: Instant,
    pub sync_period: Duration,
}

impl App {
    pub fn new(store: &QuoteStore) -> Self {
        let quotes = store.load_quotes();
        let cats = categories(&quotes);
        let selected = store.load_selected_category();
        let selected_index = cats.iter().position(|c| *c == selected).unwrap_or(0);

        let mut app = App {
            quotes,
            categories: cats,
            selected_index,
            current: None,
            mode: Mode::Browse,
            input_field: InputField::Text,
            input_text: String::new(),
            input_category: String::new(),
            status: None,
            last_sync: Instant::now(),
            sync_period: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
        };
        app.pick_new();
        app
    }

    pub fn selected_category(&self) -> &str {
        self.categories
            .get(self.selected_index)
            .map(String::as_str)
            .unwrap_or(quotebook::CATEGORY_ALL)
    }

    pub fn pick_new(&mut self) {
        self.current = pick_random(&self.quotes, self.selected_category()).cloned();
    }

    /// Recompute the category list after a mutation, keeping the current
    /// selection when it still exists.
    pub fn refresh_categories(&mut self) {
        let keep = self.categories.get(self.selected_index).cloned();
        self.categories = categories(&self.quotes);
        self.selected_index = keep
            .and_then(|name| self.categories.iter().position(|c| *c == name))
            .unwrap_or(0);
    }

    pub fn next_category(&mut self) {
        if !self.categories.is_empty() {
            self.selected_index = (self.selected_index + 1) % self.categories.len();
        }
    }

    pub fn previous_category(&mut self) {
        if !self.categories.is_empty() {
            self.selected_index = if self.selected_index == 0 {
                self.categories.len() - 1
            } else {
                self.selected_index - 1
            };
        }
    }

    fn clear_input(&mut self) {
        self.input_text.clear();
        self.input_category.clear();
        self.input_field = InputField::Text;
    }

    fn active_input(&mut self) -> &mut String {
        match self.input_field {
            InputField::Text => &mut self.input_text,
            InputField::Category => &mut self.input_category,
        }
    }
}

pub fn run_ui(app: &mut App, store: &QuoteStore, engine: &SyncEngine, rt: &Runtime) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, app, store, engine, rt);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &QuoteStore,
    engine: &SyncEngine,
    rt: &Runtime,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        // Periodic sync rides the input poll tick
        if app.last_sync.elapsed() >= app.sync_period {
            run_sync(app, store, engine, rt, SyncTrigger::Interval);
        }

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            match app.mode {
                Mode::Browse => match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char('n') | KeyCode::Char(' ') => {
                        app.status = None;
                        app.pick_new();
                    }
                    KeyCode::Left => {
                        app.previous_category();
                        store.save_selected_category(app.selected_category())?;
                        app.pick_new();
                    }
                    KeyCode::Right => {
                        app.next_category();
                        store.save_selected_category(app.selected_category())?;
                        app.pick_new();
                    }
                    KeyCode::Char('s') => {
                        run_sync(app, store, engine, rt, SyncTrigger::Manual);
                    }
                    KeyCode::Char('a') => {
                        app.mode = Mode::Add;
                        app.clear_input();
                        app.status = None;
                    }
                    _ => {}
                },
                Mode::Add => match key.code {
                    KeyCode::Esc => {
                        app.mode = Mode::Browse;
                        app.clear_input();
                    }
                    KeyCode::Tab => {
                        app.input_field = match app.input_field {
                            InputField::Text => InputField::Category,
                            InputField::Category => InputField::Text,
                        };
                    }
                    KeyCode::Enter => submit_quote(app, store, engine, rt)?,
                    KeyCode::Backspace => {
                        app.active_input().pop();
                    }
                    KeyCode::Char(c) => {
                        app.active_input().push(c);
                    }
                    _ => {}
                },
            }
        }
    }
}

fn submit_quote(app: &mut App, store: &QuoteStore, engine: &SyncEngine, rt: &Runtime) -> Result<()> {
    match validate_submission(&app.input_text, &app.input_category, &app.quotes) {
        Ok(quote) => {
            app.quotes.push(quote.clone());
            store.save_quotes(&app.quotes)?;
            app.refresh_categories();
            app.status = Some(format!("Added \"{}\"", quote.text));
            app.mode = Mode::Browse;
            app.clear_input();
            if app.current.is_none() {
                app.pick_new();
            }

            // Already saved locally; the mock endpoint does not persist
            if let Err(err) = rt.block_on(engine.remote().push_quote(&quote)) {
                tracing::warn!("push to remote failed: {err}");
            }
        }
        // Surface the validation failure and stay in the form
        Err(err) => app.status = Some(err.to_string()),
    }
    Ok(())
}

fn run_sync(
    app: &mut App,
    store: &QuoteStore,
    engine: &SyncEngine,
    rt: &Runtime,
    trigger: SyncTrigger,
) {
    match rt.block_on(engine.sync_once(store, trigger)) {
        Ok(report) => {
            app.quotes = store.load_quotes();
            app.refresh_categories();

            if report.merge.conflict_occurred() {
                app.status = Some(format!(
                    "{} conflict(s) resolved automatically, server data preferred",
                    report.merge.conflicts.len()
                ));
            } else if report.merge.changed() {
                app.status = Some(format!("Synced: {} new quote(s)", report.merge.added));
            } else if trigger == SyncTrigger::Manual {
                app.status = Some("Synced: no changes".to_string());
            }

            if app.current.is_none() {
                app.pick_new();
            }
        }
        Err(err) => {
            tracing::warn!("sync failed: {err:#}");
            if trigger == SyncTrigger::Manual {
                app.status = Some("Sync failed, will retry later".to_string());
            }
        }
    }
    app.last_sync = Instant::now();
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(f.size());

    // Category selector
    let mut spans: Vec<Span> = Vec::new();
    for (i, category) in app.categories.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let style = if i == app.selected_index {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(category.clone(), style));
    }
    let selector = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Category"));
    f.render_widget(selector, chunks[0]);

    // Quote display
    let body = match &app.current {
        Some(quote) => vec![
            Line::from(format!("\"{}\"", quote.text)),
            Line::from(""),
            Line::from(Span::styled(
                format!("- {}", quote.category),
                Style::default().fg(Color::Cyan),
            )),
        ],
        None => vec![Line::from("No quotes available.")],
    };
    let display = Paragraph::new(body)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Quote"));
    f.render_widget(display, chunks[1]);

    // Add form or key help
    match app.mode {
        Mode::Add => {
            let active = Style::default().fg(Color::Yellow);
            let idle = Style::default();
            let marker = |field| if app.input_field == field { "▌" } else { "" };

            let form = Paragraph::new(vec![
                Line::from(Span::styled(
                    format!("Text: {}{}", app.input_text, marker(InputField::Text)),
                    if app.input_field == InputField::Text { active } else { idle },
                )),
                Line::from(Span::styled(
                    format!("Category: {}{}", app.input_category, marker(InputField::Category)),
                    if app.input_field == InputField::Category { active } else { idle },
                )),
            ])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Add Quote (Tab: switch field, Enter: save, Esc: cancel)"),
            );
            f.render_widget(form, chunks[2]);
        }
        Mode::Browse => {
            let help = Paragraph::new(
                "n/space: new quote   ←/→: category   a: add   s: sync now   q: quit",
            )
            .block(Block::default().borders(Borders::ALL).title("Keys"));
            f.render_widget(help, chunks[2]);
        }
    }

    // Status line
    let status = Paragraph::new(app.status.clone().unwrap_or_default())
        .style(Style::default().fg(Color::Green));
    f.render_widget(status, chunks[3]);
}
