use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::mode::GameMode;
use crate::session::Phase;
use crate::trainer::Snapshot;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const MASK_GLYPH: &str = "?";

impl Widget for Snapshot<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.phase {
            Phase::Idle => render_mode_selector(area, buf),
            Phase::Active | Phase::Won => render_session(&self, area, buf),
        }
    }
}

fn render_mode_selector(area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let mut lines = vec![
        Line::from(Span::styled("Select your typing mode", bold)),
        Line::from(""),
    ];
    for (n, mode) in GameMode::ALL.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("[{}] ", n + 1), Style::default().fg(Color::Cyan)),
            Span::raw(mode.title()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("(esc) quit", dim)));

    let height = lines.len() as u16;
    let top = area.height.saturating_sub(height) / 2;
    let chunk = Rect::new(area.x, area.y + top, area.width, height.min(area.height));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunk, buf);
}

fn render_session(snapshot: &Snapshot<'_>, area: Rect, buf: &mut Buffer) {
    if snapshot.layout.is_none() {
        return;
    }

    let row_count = snapshot.mode.map_or(1, |m| m.key_rows().len());
    let keyboard_height = (row_count * 2) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),               // progress
            Constraint::Length(1),               // padding
            Constraint::Length(keyboard_height), // keys
            Constraint::Length(2),               // prompt
            Constraint::Length(2),               // history
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let masked = snapshot.mask.iter().filter(|&&bit| bit).count();
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(snapshot.progress.clamp(0.0, 1.0))
        .label(format!("{masked}/{} hidden", snapshot.mask.len()))
        .render(chunks[0], buf);

    let rows = keyboard_lines(snapshot, chunks[2].width);
    Paragraph::new(rows)
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    prompt_line(snapshot).render(chunks[3], buf);

    Paragraph::new(history_line(snapshot))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[4], buf);

    let dim = Style::default().add_modifier(Modifier::DIM);
    let legend = if snapshot.won() {
        "(enter) new layout / (tab) modes / (esc) quit"
    } else {
        "(ctrl+r) new layout / (tab) modes / (esc) quit"
    };
    Paragraph::new(Span::styled(legend, dim))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
}

/// One styled line per keyboard row, with blank lines in between.
fn keyboard_lines<'a>(snapshot: &Snapshot<'a>, width: u16) -> Vec<Line<'a>> {
    let Some(layout) = snapshot.layout else {
        return Vec::new();
    };
    let groups: Vec<usize> = match snapshot.mode {
        Some(mode) => mode.group_lengths().to_vec(),
        None => vec![layout.len()],
    };
    let per_row = groups.iter().sum::<usize>().max(1);

    let expected_style = Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let pressed_style = Style::default().bg(Color::DarkGray);
    let masked_style = Style::default().add_modifier(Modifier::DIM);

    // Drop the padding around keys when the full row would not fit
    let full_row = "[ x ] ".repeat(per_row) + &"  ".repeat(groups.len());
    let compact = full_row.width() > width as usize;

    let mut lines = Vec::new();
    for (row_idx, row) in layout.entries().chunks(per_row).enumerate() {
        let mut spans = Vec::new();
        let mut offset = 0;
        for (group_idx, &len) in groups.iter().enumerate() {
            if group_idx > 0 {
                spans.push(Span::raw("  "));
            }
            for (i, &(_, letter)) in row.iter().enumerate().skip(offset).take(len) {
                let hidden = snapshot.mask.get(row_idx * per_row + i).copied().unwrap_or(false);
                let glyph = if hidden {
                    MASK_GLYPH.to_string()
                } else {
                    letter.to_string()
                };
                let style = if Some(letter) == snapshot.expected && !hidden {
                    expected_style
                } else if Some(letter) == snapshot.pressed {
                    pressed_style
                } else if hidden {
                    masked_style
                } else {
                    Style::default()
                };
                let text = if compact {
                    format!("{glyph} ")
                } else {
                    format!("[ {glyph} ] ")
                };
                spans.push(Span::styled(text, style));
            }
            offset += len;
        }
        if row_idx > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(spans));
    }
    lines
}

fn prompt_line<'a>(snapshot: &Snapshot<'a>) -> Paragraph<'a> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let line = if snapshot.won() {
        Line::from(vec![
            Span::styled("All keys hidden. You win!", bold.fg(Color::Green)),
            Span::raw(format!("  {}% acc", snapshot.accuracy)),
        ])
    } else {
        let target = snapshot
            .expected
            .map(|c| c.to_string())
            .unwrap_or_default();
        Line::from(vec![
            Span::raw("type "),
            Span::styled(target, bold.fg(Color::Yellow)),
        ])
    };
    Paragraph::new(line).alignment(Alignment::Center)
}

/// Expected letters of recent presses: green if hit, red if missed,
/// underlined when the key was hidden at the time.
fn history_line<'a>(snapshot: &Snapshot<'a>) -> Line<'a> {
    let spans: Vec<Span> = snapshot
        .history
        .iter()
        .map(|entry| {
            let mut style = Style::default().add_modifier(Modifier::BOLD).fg(
                if entry.is_correct() {
                    Color::Green
                } else {
                    Color::Red
                },
            );
            if entry.masked {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            Span::styled(entry.expected.to_string(), style)
        })
        .collect();
    Line::from(spans)
}
