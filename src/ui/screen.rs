use ratatui::{layout::Rect, Frame};

use crate::{
    ui::{drills, levels, stats},
    App, LevelScreen, Tab,
};

/// A UI screen boundary: draws the body area and names its keys
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect);
    fn help(&self) -> &'static str;
}

pub struct LevelSelectScreen;

impl Screen for LevelSelectScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        levels::render_select(app, f, area);
    }

    fn help(&self) -> &'static str {
        "←↑↓→ choose · Enter start · Tab switch · Esc quit"
    }
}

pub struct LevelPlayScreen;

impl Screen for LevelPlayScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        levels::render_play(app, f, area);
    }

    fn help(&self) -> &'static str {
        "type answer · Enter submit · Esc leave level"
    }
}

pub struct LevelReportScreen;

impl Screen for LevelReportScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        levels::render_report(app, f, area);
    }

    fn help(&self) -> &'static str {
        "r retry · v review wrong answers · Esc back to levels"
    }
}

pub struct ReviewScreen;

impl Screen for ReviewScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        levels::render_review(app, f, area);
    }

    fn help(&self) -> &'static str {
        "type answer · Enter check · n next · Esc back to report"
    }
}

pub struct PracticeScreen;

impl Screen for PracticeScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        drills::render_drill(&app.practice, &app.input, f, area);
    }

    fn help(&self) -> &'static str {
        "←→ level · ↑↓ operator · n new · Enter check · x reset · Tab switch · Esc quit"
    }
}

pub struct TablesScreen;

impl Screen for TablesScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        drills::render_drill(&app.tables, &app.input, f, area);
    }

    fn help(&self) -> &'static str {
        "←→ table · n new · Enter check · x reset · Tab switch · Esc quit"
    }
}

pub struct StatsScreen;

impl Screen for StatsScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        stats::render_stats(app, f, area);
    }

    fn help(&self) -> &'static str {
        "R reset all progress · Tab switch · Esc quit"
    }
}

/// Screen for the current tab and level state
pub fn current_screen(app: &App) -> Box<dyn Screen> {
    match app.tab {
        Tab::Levels => match app.level_screen {
            LevelScreen::Select => Box::new(LevelSelectScreen),
            LevelScreen::Play => Box::new(LevelPlayScreen),
            LevelScreen::Report => Box::new(LevelReportScreen),
            LevelScreen::Review => Box::new(ReviewScreen),
        },
        Tab::Practice => Box::new(PracticeScreen),
        Tab::Tables => Box::new(TablesScreen),
        Tab::Stats => Box::new(StatsScreen),
    }
}
