use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::message::MessageKind;

pub fn draw(app: &mut App, frame: &mut Frame) {
    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(frame.area());

    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store inner dimensions for scroll calculations (minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" sqlchat: {} ", app.client.base_url()));

    let chat_text = if app.transcript.is_empty() && !app.is_busy() {
        Text::from(Span::styled(
            "Ask a question about your data...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in &app.transcript {
            match msg.kind {
                MessageKind::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                }
                MessageKind::Bot => {
                    lines.push(Line::from(Span::styled(
                        "Bot:",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )));
                }
                MessageKind::Error => {
                    lines.push(Line::from(Span::styled(
                        "Error:",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )));
                }
            }

            for line in msg.text.lines() {
                lines.push(Line::from(line));
            }

            if let Some(sql) = &msg.sql {
                lines.push(Line::from(Span::styled(
                    format!("SQL: {sql}"),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                )));
            }

            lines.push(Line::default());
        }

        if app.is_busy() {
            lines.push(Line::from(Span::styled(
                "Bot:",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.is_busy();

    let (border_color, title) = if busy {
        (Color::DarkGray, " Waiting for response... ")
    } else {
        (Color::Yellow, " Ask a question... (Enter to send) ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible in long drafts.
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .draft
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input_style = if busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let input = Paragraph::new(visible_text)
        .style(input_style)
        .block(input_block);

    frame.render_widget(input, area);

    // Show the terminal cursor only while the input accepts edits
    if !busy {
        let cursor_x = input_cursor_col(cursor_pos, scroll_offset, inner_width);
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Column of the terminal cursor inside the input box. The visible slice is
/// bounded by the inner width, so the cursor column is clamped to it too
/// (a zero-width box would otherwise leave the offset unbounded).
fn input_cursor_col(cursor_pos: usize, scroll_offset: usize, inner_width: usize) -> u16 {
    cursor_pos.saturating_sub(scroll_offset).min(inner_width) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_col_tracks_the_visible_slice() {
        assert_eq!(input_cursor_col(0, 0, 40), 0);
        assert_eq!(input_cursor_col(7, 0, 40), 7);
        // Scrolled: cursor sits on the last visible column
        assert_eq!(input_cursor_col(50, 11, 40), 39);
    }

    #[test]
    fn cursor_col_is_clamped_for_oversized_drafts() {
        // Draft far longer than u16 with no width to scroll against must
        // not wrap around the cast
        assert_eq!(input_cursor_col(100_000, 0, 0), 0);
        assert_eq!(input_cursor_col(100_000, 0, 40), 40);
    }
}
