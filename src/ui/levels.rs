use itertools::Itertools;
use mathdrill::{question::Tier, timer::format_clock};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Row, Table},
    Frame,
};
use std::time::Duration;

use super::{bold, dim, green_bold, question_line, red_bold, render_input};
use crate::App;

const CARDS_PER_ROW: usize = 4;
const LOW_TIME: Duration = Duration::from_secs(10);

pub fn render_select(app: &App, f: &mut Frame, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 2); 2])
        .split(area);

    for (row_area, tiers) in rows.iter().zip(&Tier::ALL.iter().chunks(CARDS_PER_ROW)) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, CARDS_PER_ROW as u32); CARDS_PER_ROW])
            .split(*row_area);
        for (card, tier) in cols.iter().zip(tiers) {
            render_card(app, *tier, f, *card);
        }
    }
}

fn render_card(app: &App, tier: Tier, f: &mut Frame, area: Rect) {
    let level = app.session.level(tier);
    let unlocked = app.session.progress().is_unlocked(tier);

    let border = if tier == app.selected_tier {
        bold().fg(Color::Yellow)
    } else if unlocked {
        Style::default()
    } else {
        dim()
    };
    let status = if !unlocked {
        Span::styled("🔒 Locked", dim())
    } else if level.completed {
        Span::styled("✅ Completed", green_bold())
    } else {
        Span::raw("🔓 Unlocked")
    };
    let best = if level.completed {
        format!("Best: {}%", level.best_accuracy)
    } else {
        "Best: -".to_string()
    };

    let lines = vec![
        Line::from(Span::styled(format!("Level {tier}"), bold())),
        Line::from(status),
        Line::from(Span::styled(best, dim())),
    ];
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border),
        ),
        area,
    );
}

pub fn render_play(app: &App, f: &mut Frame, area: Rect) {
    let Some(run) = app.session.run() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(12)])
        .split(chunks[0]);

    let total = run.total().max(1);
    let shown = (run.question_index() + 1).min(total);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Level {} ", run.tier())),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio((run.question_index() as f64 / total as f64).clamp(0.0, 1.0))
        .label(format!("Question {shown} / {total}"));
    f.render_widget(gauge, top[0]);

    let (clock, clock_style) = match run.time_left() {
        Some(left) if left <= LOW_TIME => (format_clock(left), red_bold()),
        Some(left) => (format_clock(left), bold()),
        None => ("--:--".to_string(), dim()),
    };
    f.render_widget(
        Paragraph::new(Span::styled(format!("⏱ {clock}"), clock_style))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        top[1],
    );

    let question = run.current_question().map_or("", |q| q.text());
    f.render_widget(
        Paragraph::new(vec![Line::default(), question_line(question)]),
        chunks[1],
    );

    render_input(&app.input, !run.is_answered(), f, chunks[2]);

    let counts = Line::from(vec![
        Span::styled(format!("Correct: {}", run.correct_count()), green_bold()),
        Span::raw("  "),
        Span::styled(format!("Wrong: {}", run.wrong_count()), red_bold()),
        Span::raw("  "),
        Span::raw(format!("Accuracy: {}%", run.live_accuracy())),
    ]);
    f.render_widget(Paragraph::new(counts), chunks[3]);
}

pub fn render_report(app: &App, f: &mut Frame, area: Rect) {
    let Some(report) = &app.report else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(3)])
        .split(area);

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Accuracy: "),
            Span::styled(format!("{}%", report.accuracy), bold()),
            Span::styled(format!("   best {}%", report.best_accuracy), dim()),
        ]),
        Line::from(vec![
            Span::styled(format!("Correct: {}", report.correct), green_bold()),
            Span::raw("  "),
            Span::styled(format!("Wrong: {}", report.wrong), red_bold()),
            Span::raw(format!("  of {}", report.total)),
        ]),
    ];
    match report.newly_unlocked {
        Some(next) => lines.push(Line::from(Span::styled(
            format!("🔓 Level {next} unlocked!"),
            bold().fg(Color::Yellow),
        ))),
        None if report.tier == Tier::LAST => lines.push(Line::from(Span::styled(
            "🏆 You've cleared the final level.",
            bold().fg(Color::Yellow),
        ))),
        None => {}
    }
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(format!(" Level {} Report ", report.tier), bold())),
        ),
        chunks[0],
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Wrong answers ({}) ", report.wrong_list.len()));
    if report.wrong_list.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("No mistakes. 🎉", green_bold())).block(block),
            chunks[1],
        );
        return;
    }

    let rows = report
        .wrong_list
        .iter()
        .map(|w| Row::new(vec![w.question.clone(), w.correct.to_string()]));
    let table = Table::new(rows, [Constraint::Min(12), Constraint::Length(14)])
        .header(Row::new(vec!["Question", "Correct answer"]).style(bold()))
        .block(block);
    f.render_widget(table, chunks[1]);
}

pub fn render_review(app: &App, f: &mut Frame, area: Rect) {
    let Some(review) = &app.review else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(3)])
        .split(area);

    let verdict = match review.last_check() {
        Some(true) => Line::from(Span::styled("✅", green_bold())),
        Some(false) => Line::from(Span::styled("❌", red_bold())),
        None => Line::default(),
    }
    .alignment(Alignment::Center);
    let lines = vec![
        Line::default(),
        question_line(&review.current().question),
        verdict,
    ];
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(format!(
            " Review {} / {} ",
            review.index() + 1,
            review.len()
        ))),
        chunks[0],
    );
    render_input(&app.input, true, f, chunks[1]);
}
