use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::StudioView;
use crate::app::{App, Focus, NoticeLevel};
use crate::stats::StoryStats;

fn panel<'a>(app: &App, title: impl Into<Line<'a>>, focused: bool) -> Block<'a> {
    let color = if focused {
        app.theme.accent
    } else {
        app.theme.border
    };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color))
}

fn heading(text: &str, color: Color) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

fn hint(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::DarkGray),
    ))
}

/// Center a `width` x `height` box inside `area`.
fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    Rect {
        x: area.x + x,
        y: area.y + y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Rows `lines` occupy once wrapped to `width` columns.
pub fn visual_height(lines: &[Line], width: usize) -> usize {
    if width == 0 {
        return lines.len();
    }
    lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum()
}

pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (status, color) = match app.service_online {
        Some(true) => ("● online", Color::Green),
        Some(false) => ("● offline", Color::Red),
        None => ("● checking", Color::Yellow),
    };

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            " ✦ Chronicle ",
            Style::default()
                .fg(app.theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("AI story studio", Style::default().fg(Color::DarkGray)),
    ]));
    frame.render_widget(title, halves[0]);

    let service = Paragraph::new(Line::from(vec![
        Span::styled(app.service_label.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(status, Style::default().fg(color)),
        Span::raw(" "),
    ]))
    .alignment(Alignment::Right);
    frame.render_widget(service, halves[1]);
}

pub fn render_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Prompt;
    let text = if app.options.prompt.is_empty() {
        Line::from(Span::styled(
            "Describe your story idea...",
            Style::default().fg(Color::Gray),
        ))
    } else {
        let mut prompt = app.options.prompt.clone();
        if focused {
            prompt.push('▌');
        }
        Line::from(Span::styled(
            prompt,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
    };

    let input = Paragraph::new(text)
        .block(panel(app, " Prompt ", focused))
        .wrap(Wrap { trim: false });

    frame.render_widget(input, area);
}

pub fn render_options(frame: &mut Frame, app: &App, view: &StudioView, area: Rect) {
    let value = Style::default().fg(app.theme.accent);
    let check = |on: bool| if on { "[x]" } else { "[ ]" };
    let options = &app.options;

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Genre   "),
            Span::styled(options.genre.label(), value),
            Span::styled("  F2", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::raw("Length  "),
            Span::styled(options.length.label(), value),
            Span::styled("  F3", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::raw("Tone    "),
            Span::styled(options.tone.clone(), value),
            Span::styled("  F4", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::raw(format!("{} Plot twist", check(options.include_twist))),
            Span::styled("  F5", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::raw(format!("{} Heavy dialogue", check(options.heavy_dialogue))),
            Span::styled("  F6", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
    ];

    if view.generating {
        lines.push(Line::from(Span::styled(
            "Weaving your story...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
    } else if options.prompt.trim().is_empty() {
        lines.push(hint("Ctrl+G  Weave Story"));
    } else {
        lines.push(Line::from(Span::styled(
            "Ctrl+G  Weave Story",
            Style::default()
                .fg(app.theme.accent)
                .add_modifier(Modifier::BOLD),
        )));
    }

    let paragraph = Paragraph::new(lines).block(panel(app, " Options ", false));
    frame.render_widget(paragraph, area);
}

pub fn render_reader(frame: &mut Frame, app: &mut App, view: &StudioView, area: Rect) {
    let focused = app.focus == Focus::Reader;

    let Some(story) = &view.current else {
        let welcome = Paragraph::new(vec![
            Line::from(""),
            heading("Your story awaits", app.theme.accent),
            hint("Write a prompt, pick a genre, then press Ctrl+G"),
        ])
        .alignment(Alignment::Center)
        .block(panel(app, " Reader ", focused))
        .wrap(Wrap { trim: false });
        frame.render_widget(welcome, area);
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", story.genre.label().to_uppercase()),
                Style::default()
                    .fg(Color::Black)
                    .bg(app.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "  {}",
                    story.created_at.with_timezone(&Local).format("%b %-d, %Y")
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(""),
    ];

    if focused {
        // Raw text while editing so markers stay visible.
        let mut raw: Vec<Line> = story
            .content
            .split('\n')
            .map(|line| Line::from(line.to_string()))
            .collect();
        if let Some(last) = raw.last_mut() {
            last.push_span(Span::styled("▌", Style::default().fg(app.theme.accent)));
        }
        lines.extend(raw);
    } else {
        lines.extend(super::markdown::render_story_lines(&story.content));
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    let max_scroll = visual_height(&lines, inner_width).saturating_sub(inner_height);
    app.reader_scroll = app.reader_scroll.min(max_scroll);

    let title = Line::from(Span::styled(
        format!(" {} ", story.title),
        Style::default().add_modifier(Modifier::BOLD),
    ));

    let reader = Paragraph::new(lines)
        .block(panel(app, title, focused))
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(app.reader_scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(reader, area);
}

pub fn render_continue_input(frame: &mut Frame, app: &App, view: &StudioView, area: Rect) {
    let focused = app.focus == Focus::Continue;
    let title = if view.expanding {
        " Continue · writing... "
    } else {
        " Continue "
    };

    let text = if view.current.is_none() {
        hint("Generate a story first")
    } else if app.instruction.is_empty() {
        Line::from(Span::styled(
            "What happens next?",
            Style::default().fg(Color::Gray),
        ))
    } else {
        let mut instruction = app.instruction.clone();
        if focused {
            instruction.push('▌');
        }
        Line::from(instruction)
    };

    let input = Paragraph::new(text).block(panel(app, title, focused));
    frame.render_widget(input, area);
}

pub fn render_sparks(frame: &mut Frame, app: &App, view: &StudioView, area: Rect) {
    let mut lines = Vec::new();

    if view.suggesting {
        lines.push(Line::from(Span::styled(
            "Generating ideas...",
            Style::default().fg(Color::Yellow),
        )));
    }

    match &view.suggestions {
        Some(bundle) => {
            let sections = [
                ("Titles", &bundle.titles),
                ("Characters", &bundle.character_names),
                ("Plot ideas", &bundle.plot_ideas),
            ];
            for (name, items) in sections {
                lines.push(heading(name, app.theme.accent));
                lines.extend(items.iter().map(|item| Line::from(format!("• {item}"))));
                lines.push(Line::from(""));
            }
        }
        None if !view.suggesting => {
            lines.push(hint("Enter a prompt to see creative sparks here"));
        }
        None => {}
    }

    let sparks = Paragraph::new(lines)
        .block(panel(app, " AI Spark ", false))
        .wrap(Wrap { trim: false });

    frame.render_widget(sparks, area);
}

pub fn render_history(frame: &mut Frame, app: &mut App, view: &StudioView, area: Rect) {
    let focused = app.focus == Focus::History;
    let block = panel(app, " Recent Works ", focused);

    if view.history.is_empty() {
        frame.render_widget(Paragraph::new(hint("No stories yet")).block(block), area);
        return;
    }

    app.history_cursor = app.history_cursor.min(view.history.len() - 1);
    let current = view.current_id();

    let items: Vec<ListItem> = view
        .history
        .iter()
        .map(|entry| {
            let marker = if Some(entry.id) == current { "▸ " } else { "  " };
            let title_style = if Some(entry.id) == current {
                Style::default()
                    .fg(app.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(marker, Style::default().fg(app.theme.accent)),
                    Span::styled(entry.title.clone(), title_style),
                ]),
                Line::from(Span::styled(
                    format!(
                        "  {} · {}",
                        entry.genre.label(),
                        entry.created_at.with_timezone(&Local).format("%b %-d")
                    ),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let mut state = ListState::default();
    if focused {
        state.select(Some(app.history_cursor));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(list, area, &mut state);
}

pub fn render_notice(frame: &mut Frame, app: &App, area: Rect) {
    let Some(notice) = &app.notice else {
        return;
    };

    let style = match notice.level {
        NoticeLevel::Info => Style::default().fg(Color::Green),
        NoticeLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    };

    frame.render_widget(
        Paragraph::new(notice.text.clone())
            .alignment(Alignment::Center)
            .style(style),
        area,
    );
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            "Tab: Focus | Ctrl+G: Weave | Ctrl+S: Save | Ctrl+O: Info | F1: Help | Ctrl+C: Quit",
            Style::default().fg(Color::DarkGray),
        )
    };

    let bar = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(style);

    frame.render_widget(bar, area);
}

pub fn render_help_window(frame: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help_text = vec![
        heading("Chronicle - Keyboard Shortcuts", app.theme.accent),
        Line::from(""),
        Line::from(Span::styled("General:", bold)),
        Line::from("  Tab/Shift+Tab - Move focus between panels"),
        Line::from("  F1 / Ctrl+H   - Show/hide this help"),
        Line::from("  Ctrl+O        - Show/hide story info"),
        Line::from("  Ctrl+C twice  - Quit application"),
        Line::from("  Ctrl+Q        - Quit application"),
        Line::from(""),
        Line::from(Span::styled("Writing:", bold)),
        Line::from("  Ctrl+G        - Weave a story from the prompt"),
        Line::from("  F2 / F3 / F4  - Cycle genre, length, tone"),
        Line::from("  F5 / F6       - Toggle plot twist, heavy dialogue"),
        Line::from("  Enter         - Continue story (Continue panel)"),
        Line::from("  Ctrl+S        - Save current story as text"),
        Line::from(""),
        Line::from(Span::styled("Reading:", bold)),
        Line::from("  Up/Down       - Scroll story / move in history"),
        Line::from("  PgUp/PgDn     - Scroll story"),
        Line::from("  Home/End      - Jump to start/end"),
        Line::from("  Enter         - Open story (Recent Works)"),
        Line::from(""),
        hint("Press F1 or Esc to close"),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(panel(app, " Help ", false))
        .wrap(Wrap { trim: false });

    let popup = popup_area(area, 60, 26);
    frame.render_widget(Clear, popup);
    frame.render_widget(help_paragraph, popup);
}

pub fn render_info_window(frame: &mut Frame, app: &App, view: &StudioView, area: Rect) {
    let mut info_text = vec![
        heading("Studio Information", app.theme.accent),
        Line::from(""),
        Line::from(vec![
            Span::raw("Service: "),
            Span::styled(app.service_label.clone(), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::raw("Stories this session: "),
            Span::styled(
                view.history.len().to_string(),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(""),
    ];

    match &view.current {
        Some(story) => {
            let stats = StoryStats::of(&story.content);
            info_text.extend([
                Line::from(vec![
                    Span::raw("Words: "),
                    Span::styled(stats.words.to_string(), Style::default().fg(Color::Green)),
                ]),
                Line::from(vec![
                    Span::raw("Tokens (est.): "),
                    Span::styled(stats.tokens.to_string(), Style::default().fg(Color::Blue)),
                ]),
                Line::from(vec![
                    Span::raw("Reading time: "),
                    Span::styled(
                        format!("{} min", stats.minutes),
                        Style::default().fg(Color::Magenta),
                    ),
                ]),
                Line::from(""),
                Line::from(Span::styled(
                    story.summary.clone(),
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
            ]);
        }
        None => info_text.push(hint("No story selected")),
    }

    info_text.push(Line::from(""));
    info_text.push(hint("Press Ctrl+O to close"));

    let info_paragraph = Paragraph::new(info_text)
        .block(panel(app, " Info ", false))
        .wrap(Wrap { trim: false });

    let popup = popup_area(area, 50, 16);
    frame.render_widget(Clear, popup);
    frame.render_widget(info_paragraph, popup);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visual_height_counts_wrapped_rows() {
        let lines = vec![
            Line::from("short"),
            Line::from(""),
            Line::from("x".repeat(25)),
        ];
        assert_eq!(visual_height(&lines, 10), 1 + 1 + 3);
        assert_eq!(visual_height(&lines, 0), 3);
    }

    #[test]
    fn test_popup_area_centered_and_clamped() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(popup_area(area, 60, 20), Rect::new(20, 10, 60, 20));

        let small = Rect::new(0, 0, 30, 10);
        let popup = popup_area(small, 60, 20);
        assert_eq!(popup.width, 30);
        assert_eq!(popup.height, 10);
    }
}
