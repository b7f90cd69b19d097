use mathdrill::drill::{Drill, DrillKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{bold, dim, green_bold, question_line, red_bold, render_input};

/// Practice and times-table tabs share one layout
pub fn render_drill(drill: &Drill, input: &str, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    let selection = match drill.kind() {
        DrillKind::Practice { tier, filter } => Line::from(vec![
            Span::raw("Level "),
            Span::styled(format!("◀ {tier} ▶"), bold()),
            Span::raw("   Operator "),
            Span::styled(format!("▲ {filter} ▼"), bold()),
        ]),
        DrillKind::Tables { base } => Line::from(vec![
            Span::raw("Table of "),
            Span::styled(format!("◀ {base} ▶"), bold()),
        ]),
    };
    let title = match drill.kind() {
        DrillKind::Practice { .. } => " Free practice ",
        DrillKind::Tables { .. } => " Multiplication tables ",
    };
    f.render_widget(
        Paragraph::new(selection).block(Block::default().borders(Borders::ALL).title(title)),
        chunks[0],
    );

    let body = match drill.current() {
        Some(q) => vec![Line::default(), question_line(q.text())],
        None => vec![
            Line::default(),
            Line::from(Span::styled("Press n for a question", dim())).alignment(Alignment::Center),
        ],
    };
    f.render_widget(Paragraph::new(body), chunks[1]);

    render_input(input, drill.current().is_some() && !drill.is_answered(), f, chunks[2]);

    let counts = Line::from(vec![
        Span::styled(format!("Correct: {}", drill.correct()), green_bold()),
        Span::raw("  "),
        Span::styled(format!("Wrong: {}", drill.wrong()), red_bold()),
    ]);
    f.render_widget(Paragraph::new(counts), chunks[3]);
}
