use mathdrill::question::{Tier, TIER_COUNT};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Row, Table},
    Frame,
};

use super::{bold, dim, green_bold};
use crate::App;

pub fn render_stats(app: &App, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Length(3), Constraint::Min(4)])
        .split(area);

    let progress = app.session.progress();
    let daily = app.session.daily();
    let summary = vec![
        Line::from(vec![
            Span::raw("Streak: "),
            Span::styled(format!("{} days", daily.streak), bold()),
        ]),
        Line::from(vec![
            Span::raw("Last day: "),
            Span::styled(daily.last_date.format("%Y-%m-%d").to_string(), bold()),
        ]),
        Line::from(vec![
            Span::raw("Completed levels: "),
            Span::styled(
                format!("{} / {TIER_COUNT}", progress.completed_count()),
                bold(),
            ),
        ]),
        if daily.goal_reached() {
            Line::from(Span::styled("Daily goal reached 🎯", green_bold()))
        } else {
            Line::from(Span::styled(
                format!(
                    "{} more to reach today's goal",
                    daily.daily_goal.saturating_sub(daily.today_solved)
                ),
                dim(),
            ))
        },
    ];
    f.render_widget(
        Paragraph::new(summary).block(Block::default().borders(Borders::ALL).title(" Stats ")),
        chunks[0],
    );

    let goal = daily.daily_goal.max(1);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Today "))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio((f64::from(daily.today_solved) / f64::from(goal)).min(1.0))
        .label(format!("{} / {}", daily.today_solved, daily.daily_goal));
    f.render_widget(gauge, chunks[1]);

    let rows = Tier::ALL.iter().map(|&tier| {
        let level = progress.level(tier);
        let status = if !progress.is_unlocked(tier) {
            "locked"
        } else if level.completed {
            "completed"
        } else {
            "unlocked"
        };
        let best = if level.completed {
            format!("{}%", level.best_accuracy)
        } else {
            "-".to_string()
        };
        let row = Row::new(vec![format!("Level {tier}"), status.to_string(), best]);
        if level.completed {
            row.style(Style::default().fg(Color::Green))
        } else if status == "locked" {
            row.style(dim())
        } else {
            row
        }
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(8),
        ],
    )
    .header(Row::new(vec!["Level", "Status", "Best"]).style(bold()))
    .block(Block::default().borders(Borders::ALL).title(" Levels "));
    f.render_widget(table, chunks[2]);
}
