mod ui;

use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Position, Rect},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    time::Duration,
};

use taplock::{
    auth::{AuthSession, LoginError},
    backdrop::Backdrop,
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    sequence::CommitError,
    stats::{AttemptDb, AttemptRecord},
};

const TICK_RATE_MS: u64 = 100;
const EXPORT_FILE: &str = "taplock_attempts.csv";

/// graphical click-pattern login tui
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A graphical password TUI: click an ordered pattern on the canvas to save it as your password, then reproduce the same clicks within the tolerance to log in."
)]
pub struct Cli {
    /// maximum per-axis deviation (in cells) for two clicks to count as the same point
    #[clap(short = 't', long)]
    tolerance: Option<i32>,

    /// backdrop scene drawn behind the click canvas
    #[clap(short = 'b', long, value_enum)]
    backdrop: Option<BackdropKind>,

    /// do not record login attempts to the history database
    #[clap(long)]
    no_history: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum BackdropKind {
    Dots,
    Grid,
    Peaks,
}

impl BackdropKind {
    fn name(&self) -> String {
        self.to_string().to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Entry,
    Details,
    Verified,
    AttemptStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortBy {
    Recent,
    Deviation,
}

#[derive(Debug)]
pub struct StatsViewState {
    pub scroll_offset: usize,
    pub sort_by: SortBy,
}

impl Default for StatsViewState {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            sort_by: SortBy::Recent,
        }
    }
}

/// Status message the presentation layer surfaces for the last action, in
/// place of the original modal message boxes.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Success(String),
    Error(String),
}

const FIELD_COUNT: usize = 3;

/// The post-authentication details form.
#[derive(Debug, Default)]
pub struct DetailsForm {
    pub name: String,
    pub id: String,
    pub contact: String,
    pub focus: usize,
}

impl DetailsForm {
    pub fn focused_value_mut(&mut self) -> &mut String {
        match self.focus {
            0 => &mut self.name,
            1 => &mut self.id,
            _ => &mut self.contact,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FIELD_COUNT;
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + FIELD_COUNT - 1) % FIELD_COUNT;
    }

    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.id.trim().is_empty()
            && !self.contact.trim().is_empty()
    }
}

#[derive(Debug)]
pub struct App {
    pub session: AuthSession,
    pub backdrop: Backdrop,
    pub state: AppState,
    pub notice: Option<Notice>,
    pub form: DetailsForm,
    pub attempt_db: Option<AttemptDb>,
    pub stats_view: StatsViewState,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let attempt_db = if config.record_attempts {
            AttemptDb::new().ok()
        } else {
            None
        };

        Self {
            session: AuthSession::new(config.tolerance),
            backdrop: Backdrop::named_or_default(&config.backdrop),
            state: AppState::Entry,
            notice: None,
            form: DetailsForm::default(),
            attempt_db,
            stats_view: StatsViewState::default(),
        }
    }

    /// Translate an absolute terminal click into a canvas point and record it.
    pub fn on_click(&mut self, column: u16, row: u16, area: Rect) {
        if self.state != AppState::Entry {
            return;
        }

        let canvas = ui::canvas_rect(area);
        if !canvas.contains(Position::new(column, row)) {
            return;
        }

        self.session
            .on_point_entered((column - canvas.x) as i32, (row - canvas.y) as i32);
        self.notice = None;
    }

    /// Handle a key event; returns false when the app should exit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Esc {
            return false;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            // ctrl+c to quit
            return false;
        }

        match self.state {
            AppState::Entry => match key.code {
                KeyCode::Char('s') => self.save_password(),
                KeyCode::Char('l') | KeyCode::Enter => self.attempt_login(),
                KeyCode::Char('c') => {
                    self.session.clear_entry();
                    self.notice = Some(Notice::Info("Canvas cleared.".into()));
                }
                KeyCode::Char('a') => {
                    self.stats_view = StatsViewState::default();
                    self.notice = None;
                    self.state = AppState::AttemptStats;
                }
                _ => {}
            },
            AppState::Details => match key.code {
                KeyCode::Enter => self.submit_details(),
                KeyCode::Tab | KeyCode::Down => self.form.focus_next(),
                KeyCode::BackTab | KeyCode::Up => self.form.focus_prev(),
                KeyCode::Backspace => {
                    self.form.focused_value_mut().pop();
                }
                KeyCode::Char(c) => {
                    self.form.focused_value_mut().push(c);
                }
                _ => {}
            },
            AppState::Verified => {
                if key.code == KeyCode::Char('r') {
                    self.start_over();
                }
            }
            AppState::AttemptStats => match key.code {
                KeyCode::Char('b') | KeyCode::Backspace => {
                    self.notice = None;
                    self.state = AppState::Entry;
                }
                KeyCode::Char('d') => {
                    self.stats_view.sort_by = match self.stats_view.sort_by {
                        SortBy::Recent => SortBy::Deviation,
                        SortBy::Deviation => SortBy::Recent,
                    };
                    self.stats_view.scroll_offset = 0;
                }
                KeyCode::Char('e') => self.export_history(),
                KeyCode::Up => {
                    self.stats_view.scroll_offset = self.stats_view.scroll_offset.saturating_sub(1);
                }
                KeyCode::Down => self.stats_view.scroll_offset += 1,
                KeyCode::PageUp => {
                    self.stats_view.scroll_offset =
                        self.stats_view.scroll_offset.saturating_sub(10);
                }
                KeyCode::PageDown => self.stats_view.scroll_offset += 10,
                KeyCode::Home => self.stats_view.scroll_offset = 0,
                _ => {}
            },
        }

        true
    }

    fn save_password(&mut self) {
        match self.session.on_save_requested() {
            Ok(()) => self.notice = Some(Notice::Success("Password saved successfully!".into())),
            Err(CommitError::EmptySequence) => {
                self.notice = Some(Notice::Error(
                    "Please select points for your password.".into(),
                ));
            }
        }
    }

    fn attempt_login(&mut self) {
        if !self.session.has_saved() {
            self.notice = Some(Notice::Error(
                "No password saved, please save a password first!".into(),
            ));
            return;
        }

        let attempt = match self.session.on_login_requested() {
            Ok(attempt) => attempt,
            // Unreachable behind the has_saved() check above.
            Err(LoginError::NoSavedPassword) => return,
        };

        if let Some(ref db) = self.attempt_db {
            let _ = db.record_attempt(&AttemptRecord {
                matched: attempt.matched,
                points_entered: attempt.entered_len,
                points_saved: attempt.saved_len,
                max_deviation: attempt.max_deviation.map(i64::from),
                timestamp: Local::now(),
            });
        }

        if attempt.matched {
            self.notice = Some(Notice::Success("Login successful!".into()));
            self.state = AppState::Details;
        } else {
            self.notice = Some(Notice::Error("Incorrect password!".into()));
        }
    }

    fn submit_details(&mut self) {
        if self.form.is_complete() {
            self.notice = Some(Notice::Info("Details submitted successfully!".into()));
            self.state = AppState::Verified;
        } else {
            self.notice = Some(Notice::Error("Please fill in all fields.".into()));
        }
    }

    fn start_over(&mut self) {
        self.session.log_out();
        self.form = DetailsForm::default();
        self.stats_view = StatsViewState::default();
        self.notice = None;
        self.state = AppState::Entry;
    }

    fn export_history(&mut self) {
        let Some(ref db) = self.attempt_db else {
            self.notice = Some(Notice::Error("Attempt history is disabled.".into()));
            return;
        };

        let result = File::create(EXPORT_FILE)
            .map_err(Into::into)
            .and_then(|file| db.export_csv(file));

        self.notice = Some(match result {
            Ok(()) => Notice::Success(format!("History exported to {EXPORT_FILE}.")),
            Err(_) => Notice::Error("Could not export attempt history.".into()),
        });
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(t) = cli.tolerance {
        if t < 0 {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, "tolerance must be non-negative")
                .exit();
        }
    }

    let store = FileConfigStore::new();
    let mut config = store.load();

    let mut changed = false;
    if let Some(t) = cli.tolerance {
        config.tolerance = t;
        changed = true;
    }
    if let Some(kind) = cli.backdrop {
        config.backdrop = kind.name();
        changed = true;
    }
    if changed {
        let _ = store.save(&config);
    }
    // Session-only override, never persisted.
    if cli.no_history {
        config.record_attempts = false;
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config);
    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen,
    )?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let events = CrosstermEventSource::new();
    let ticker = FixedTicker::new(Duration::from_millis(TICK_RATE_MS));
    let runner = Runner::new(events, ticker);

    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step() {
            AppEvent::Tick => {}
            AppEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            AppEvent::Click(column, row) => {
                let size = terminal.size()?;
                app.on_click(column, row, Rect::new(0, 0, size.width, size.height));
                terminal.draw(|f| ui::draw(app, f))?;
            }
            AppEvent::Key(key) => {
                if !app.on_key(key) {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    Ok(())
}
