pub mod drills;
pub mod levels;
pub mod screen;
pub mod stats;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{App, StatusKind, Tab};

const HORIZONTAL_MARGIN: u16 = 2;
const INPUT_PROMPT: &str = " Your answer: ";

pub fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

pub fn green_bold() -> Style {
    bold().fg(Color::Green)
}

pub fn red_bold() -> Style {
    bold().fg(Color::Red)
}

/// Tab bar, body, status line and key help
pub fn draw(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(app, f, chunks[0]);

    let screen = screen::current_screen(app);
    screen.render(app, f, chunks[1]);

    let status_style = match app.status.kind {
        StatusKind::Info => Style::default(),
        StatusKind::Ok => green_bold(),
        StatusKind::Error => red_bold(),
    };
    f.render_widget(
        Paragraph::new(Span::styled(app.status.text.as_str(), status_style)),
        chunks[2],
    );
    f.render_widget(
        Paragraph::new(Span::styled(screen.help(), dim())),
        chunks[3],
    );
}

fn render_header(app: &App, f: &mut Frame, area: Rect) {
    let daily = app.session.daily();
    let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.to_string())).collect();
    let selected = Tab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);

    let streak = format!(
        " 🔥 {} day streak · {}/{} today ",
        daily.streak, daily.today_solved, daily.daily_goal
    );
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(bold().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" mathdrill ", bold()))
                .title_top(Line::from(streak).right_aligned()),
        );
    f.render_widget(tabs, area);
}

/// One-line answer box; places the terminal cursor after the typed text
pub fn render_input(input: &str, active: bool, f: &mut Frame, area: Rect) {
    let style = if active { bold() } else { dim() };
    let line = Line::from(vec![
        Span::styled(INPUT_PROMPT, dim()),
        Span::styled(input, style),
    ]);
    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
    if active {
        let x = area.x + 1 + (INPUT_PROMPT.width() + input.width()) as u16;
        f.set_cursor_position(Position::new(x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

/// Large centered question line
pub fn question_line(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, bold().fg(Color::Cyan))).alignment(Alignment::Center)
}
