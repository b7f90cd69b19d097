pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use mathdrill::{
    app_dirs::AppDirs,
    clock::LocalClock,
    config::{Config, ConfigStore, FileConfigStore},
    drill::{Drill, DrillKind},
    question::{OperatorFilter, RandomQuestions, Tier, TABLE_BASES},
    review::Review,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    session::{Advance, AnswerOutcome, LevelReport, Resolution, Session},
    store::FileProgressStore,
    timer::Countdown,
    ValidationError,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

const MAX_INPUT_LEN: usize = 12;

/// arithmetic practice in the terminal: eight levels, daily streaks, review of misses
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed arithmetic levels that unlock one after another, free practice by level and operator, multiplication tables, and a daily goal with a streak counter."
)]
pub struct Cli {
    /// number of questions in one level run
    #[clap(short = 'q', long, value_parser = parse_question_count)]
    questions_per_level: Option<usize>,

    /// seconds allowed for each level question
    #[clap(short = 's', long)]
    question_secs: Option<u64>,

    /// questions to solve each day
    #[clap(short = 'g', long)]
    daily_goal: Option<u32>,

    /// starting level for practice mode
    #[clap(short = 't', long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=8))]
    tier: u8,

    /// operator for practice mode
    #[clap(short = 'o', long, value_enum, default_value_t = OperatorFilter::Any)]
    op: OperatorFilter,

    /// keep progress in this file instead of the state directory
    #[clap(long)]
    progress_file: Option<PathBuf>,

    /// seed for reproducible questions
    #[clap(long)]
    seed: Option<u64>,
}

fn parse_question_count(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("a level needs at least one question".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Cli {
    /// Stored config with command line overrides applied
    fn apply_to(&self, stored: &Config) -> Config {
        Config {
            questions_per_level: self.questions_per_level.unwrap_or(stored.questions_per_level),
            question_secs: self.question_secs.unwrap_or(stored.question_secs),
            ..stored.clone()
        }
    }

    fn practice_kind(&self) -> DrillKind {
        DrillKind::Practice {
            tier: Tier::new(self.tier).unwrap_or(Tier::FIRST),
            filter: self.op,
        }
    }

    fn rngs(&self) -> (RandomQuestions, StdRng) {
        match self.seed {
            Some(seed) => (
                RandomQuestions::seeded(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (RandomQuestions::from_entropy(), StdRng::from_entropy()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Tab {
    Levels,
    Practice,
    Tables,
    Stats,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Levels, Tab::Practice, Tab::Tables, Tab::Stats];

    fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelScreen {
    Select,
    Play,
    Report,
    Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Status {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub rng: StdRng,
    pub tab: Tab,
    pub level_screen: LevelScreen,
    pub selected_tier: Tier,
    pub input: String,
    pub status: Status,
    /// Pause between a resolved level question and the next one
    pub feedback: Countdown,
    pub feedback_delay: Duration,
    pub report: Option<LevelReport>,
    pub review: Option<Review>,
    pub practice: Drill,
    pub tables: Drill,
    pub confirm_reset: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: Session, rng: StdRng, feedback_delay: Duration, practice: DrillKind) -> Self {
        Self {
            session,
            rng,
            tab: Tab::Levels,
            level_screen: LevelScreen::Select,
            selected_tier: Tier::FIRST,
            input: String::new(),
            status: Status::info("Pick an unlocked level and press Enter."),
            feedback: Countdown::new(),
            feedback_delay,
            report: None,
            review: None,
            practice: Drill::new(practice),
            tables: Drill::new(DrillKind::tables()),
            confirm_reset: false,
            should_quit: false,
        }
    }

    fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Status {
            kind,
            text: text.into(),
        };
    }

    fn reject(&mut self, e: ValidationError) {
        self.set_status(StatusKind::Error, e.to_string());
    }

    fn show_outcome(&mut self, outcome: AnswerOutcome, praise: &str) {
        match outcome.resolution {
            Resolution::Correct => self.set_status(StatusKind::Ok, format!("✅ {praise}")),
            Resolution::Wrong => self.set_status(
                StatusKind::Error,
                format!("❌ Wrong. Correct answer: {}", outcome.correct_answer),
            ),
            Resolution::TimedOut => self.set_status(
                StatusKind::Error,
                format!("⏰ Time up! Correct answer: {}", outcome.correct_answer),
            ),
        }
    }

    /// Whether the answer box is live on the current screen
    pub fn takes_input(&self) -> bool {
        match self.tab {
            Tab::Levels => match self.level_screen {
                LevelScreen::Play => !self.feedback.is_armed(),
                LevelScreen::Review => true,
                _ => false,
            },
            Tab::Practice | Tab::Tables => true,
            Tab::Stats => false,
        }
    }

    fn edit_input(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' || c == '.' => {
                if self.input.len() < MAX_INPUT_LEN {
                    self.input.push(c);
                }
                true
            }
            KeyCode::Backspace => {
                self.input.pop();
                true
            }
            _ => false,
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.input.clear();
        self.confirm_reset = false;
        let hint = match tab {
            Tab::Levels => "Pick an unlocked level and press Enter.",
            Tab::Practice => "Press n for a new question.",
            Tab::Tables => "Practice any table from 2 to 20.",
            Tab::Stats => "Your progress so far.",
        };
        self.status = Status::info(hint);
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.takes_input() && self.edit_input(key.code) {
            return;
        }

        let in_level = self.tab == Tab::Levels && self.level_screen != LevelScreen::Select;
        if !in_level {
            match key.code {
                KeyCode::Tab => return self.switch_tab(self.tab.next()),
                KeyCode::BackTab => return self.switch_tab(self.tab.prev()),
                KeyCode::Esc => {
                    self.should_quit = true;
                    return;
                }
                _ => {}
            }
        }

        match self.tab {
            Tab::Levels => match self.level_screen {
                LevelScreen::Select => self.on_select_key(key.code),
                LevelScreen::Play => self.on_play_key(key.code),
                LevelScreen::Report => self.on_report_key(key.code),
                LevelScreen::Review => self.on_review_key(key.code),
            },
            Tab::Practice => self.on_practice_key(key.code),
            Tab::Tables => self.on_tables_key(key.code),
            Tab::Stats => self.on_stats_key(key.code),
        }
    }

    fn on_select_key(&mut self, code: KeyCode) {
        let n = self.selected_tier.number();
        let moved = match code {
            KeyCode::Left => Tier::new(n.saturating_sub(1)),
            KeyCode::Right => Tier::new(n + 1),
            KeyCode::Up => Tier::new(n.saturating_sub(4)),
            KeyCode::Down => Tier::new(n + 4),
            KeyCode::Enter => {
                self.start_level(self.selected_tier);
                None
            }
            _ => None,
        };
        if let Some(tier) = moved {
            self.selected_tier = tier;
        }
    }

    pub fn start_level(&mut self, tier: Tier) {
        match self.session.start_level(tier) {
            Ok(()) => {
                self.selected_tier = tier;
                self.level_screen = LevelScreen::Play;
                self.input.clear();
                self.feedback.cancel();
                self.report = None;
                self.review = None;
                let secs = self.session.config().question_time.as_secs();
                self.set_status(
                    StatusKind::Info,
                    format!("Solve each question within {secs} seconds."),
                );
            }
            Err(e) => self.reject(e),
        }
    }

    fn on_play_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter if !self.feedback.is_armed() => {
                match self.session.submit_answer(&self.input) {
                    Ok(outcome) => {
                        self.show_outcome(outcome, "Correct! Great job.");
                        self.feedback.start(self.feedback_delay);
                    }
                    Err(e) => self.reject(e),
                }
            }
            KeyCode::Esc => {
                self.session.quit_level();
                self.feedback.cancel();
                self.input.clear();
                self.level_screen = LevelScreen::Select;
                self.set_status(StatusKind::Info, "Level abandoned.");
            }
            _ => {}
        }
    }

    fn on_report_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('r') => {
                let tier = self.report.as_ref().map_or(self.selected_tier, |r| r.tier);
                self.start_level(tier);
            }
            KeyCode::Char('v') => {
                let wrong = self
                    .report
                    .as_ref()
                    .map(|r| r.wrong_list.clone())
                    .unwrap_or_default();
                if let Some(review) = Review::new(wrong) {
                    self.review = Some(review);
                    self.input.clear();
                    self.level_screen = LevelScreen::Review;
                    self.set_status(StatusKind::Info, "Try solving it again yourself.");
                }
            }
            KeyCode::Esc | KeyCode::Char('b') => {
                self.level_screen = LevelScreen::Select;
                self.status = Status::info("Pick an unlocked level and press Enter.");
            }
            _ => {}
        }
    }

    fn on_review_key(&mut self, code: KeyCode) {
        let Some(review) = self.review.as_mut() else {
            self.level_screen = LevelScreen::Report;
            return;
        };
        match code {
            KeyCode::Enter => match review.check(&self.input) {
                Ok(true) => self.set_status(StatusKind::Ok, "✅ Correct! Nice improvement."),
                Ok(false) => {
                    let correct = review.current().correct;
                    self.set_status(
                        StatusKind::Error,
                        format!("❌ Not correct. Correct answer is {correct}."),
                    );
                }
                Err(e) => self.reject(e),
            },
            KeyCode::Right | KeyCode::Char('n') => {
                if review.next() {
                    self.input.clear();
                    self.set_status(StatusKind::Info, "Try solving it again yourself.");
                } else {
                    self.set_status(
                        StatusKind::Ok,
                        "You have reviewed all wrong questions for this level.",
                    );
                }
            }
            KeyCode::Esc | KeyCode::Char('b') => {
                self.input.clear();
                self.level_screen = LevelScreen::Report;
            }
            _ => {}
        }
    }

    fn on_practice_key(&mut self, code: KeyCode) {
        let DrillKind::Practice { tier, filter } = self.practice.kind() else {
            return;
        };
        match code {
            KeyCode::Left | KeyCode::Right => {
                let next = if code == KeyCode::Left {
                    tier.prev()
                } else {
                    tier.next()
                };
                if let Some(tier) = next {
                    self.practice.set_kind(DrillKind::Practice { tier, filter });
                }
            }
            KeyCode::Up | KeyCode::Down => {
                let all = OperatorFilter::ALL;
                let i = all.iter().position(|f| *f == filter).unwrap_or(0);
                let j = if code == KeyCode::Down {
                    (i + 1) % all.len()
                } else {
                    (i + all.len() - 1) % all.len()
                };
                self.practice.set_kind(DrillKind::Practice {
                    tier,
                    filter: all[j],
                });
            }
            KeyCode::Char('n') => {
                self.practice.new_question(&mut self.rng);
                self.input.clear();
                self.set_status(StatusKind::Info, "Solve and press Enter.");
            }
            KeyCode::Enter => self.check_drill(Tab::Practice),
            KeyCode::Char('x') => {
                self.practice.reset();
                self.input.clear();
                self.set_status(StatusKind::Info, "Press n to start.");
            }
            _ => {}
        }
    }

    fn on_tables_key(&mut self, code: KeyCode) {
        let DrillKind::Tables { base } = self.tables.kind() else {
            return;
        };
        match code {
            KeyCode::Left | KeyCode::Right => {
                let delta = if code == KeyCode::Left { -1 } else { 1 };
                let base = (base + delta).clamp(*TABLE_BASES.start(), *TABLE_BASES.end());
                self.tables.set_kind(DrillKind::Tables { base });
            }
            KeyCode::Char('n') => {
                self.tables.new_question(&mut self.rng);
                self.input.clear();
                self.set_status(StatusKind::Info, "Solve and press Enter.");
            }
            KeyCode::Enter => self.check_drill(Tab::Tables),
            KeyCode::Char('x') => {
                self.tables.reset();
                self.input.clear();
                self.set_status(StatusKind::Info, "Practice any table from 2 to 20.");
            }
            _ => {}
        }
    }

    fn check_drill(&mut self, tab: Tab) {
        let drill = if tab == Tab::Tables {
            &mut self.tables
        } else {
            &mut self.practice
        };
        match drill.check(&self.input, &mut self.session) {
            Ok(outcome) => self.show_outcome(outcome, "Correct!"),
            Err(e) => self.reject(e),
        }
    }

    fn on_stats_key(&mut self, code: KeyCode) {
        if self.confirm_reset {
            self.confirm_reset = false;
            if code == KeyCode::Char('y') {
                self.session.reset_progress();
                self.selected_tier = Tier::FIRST;
                self.report = None;
                self.review = None;
                self.set_status(StatusKind::Ok, "All progress has been reset.");
            } else {
                self.set_status(StatusKind::Info, "Reset cancelled.");
            }
        } else if code == KeyCode::Char('R') {
            self.confirm_reset = true;
            self.set_status(
                StatusKind::Error,
                "Reset all saved progress? Press y to confirm.",
            );
        }
    }

    pub fn on_tick(&mut self, elapsed: Duration) {
        self.session.refresh_day();
        if self.tab != Tab::Levels && self.session.run().is_none() {
            return;
        }

        if let Some(outcome) = self.session.tick(elapsed) {
            self.show_outcome(outcome, "");
            self.feedback.start(self.feedback_delay);
            return;
        }

        if self.feedback.tick(elapsed) {
            self.input.clear();
            match self.session.advance() {
                Ok(Advance::Next) => {
                    self.set_status(StatusKind::Info, "Next question.");
                }
                Ok(Advance::Finished) => {
                    self.report = self.session.run().and_then(|r| r.report()).cloned();
                    if let Some(report) = &self.report {
                        self.status = Status::info(format!(
                            "You answered {} out of {} questions correctly in Level {}.",
                            report.correct, report.total, report.tier
                        ));
                    }
                    self.level_screen = LevelScreen::Report;
                }
                Err(e) => self.reject(e),
            }
        }
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mathdrill=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn build_app(cli: &Cli) -> App {
    let config_store = FileConfigStore::new();
    let stored = config_store.load();
    let config = cli.apply_to(&stored);
    if config != stored {
        if let Err(e) = config_store.save(&config) {
            tracing::warn!(error = %e, "could not save config");
        }
    }

    let store = match &cli.progress_file {
        Some(path) => FileProgressStore::with_path(path),
        None => FileProgressStore::new(),
    };
    tracing::info!(path = %store.path().display(), "using progress file");

    let (questions, rng) = cli.rngs();
    let mut session = Session::open(
        Box::new(store),
        Box::new(LocalClock),
        Box::new(questions),
        config.session_config(),
    );
    if let Some(goal) = cli.daily_goal {
        if let Err(e) = session.set_daily_goal(goal) {
            tracing::warn!(error = %e, "ignoring daily goal");
        }
    }

    App::new(session, rng, config.feedback_delay(), cli.practice_kind())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();
    let mut app = build_app(&cli);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    terminal.draw(|f| ui::draw(app, f))?;
    while !app.should_quit {
        match runner.step() {
            AppEvent::Key(key) => app.on_key(key),
            AppEvent::Tick(elapsed) => app.on_tick(elapsed),
            AppEvent::Resize => {}
        }
        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}
