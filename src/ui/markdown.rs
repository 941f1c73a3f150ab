// Light markdown styling for story prose

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Convert story text to ratatui Lines with styling
pub fn render_story_lines(text: &str) -> Vec<Line<'static>> {
    text.lines().map(render_story_line).collect()
}

/// `---`, `***` or `* * *` on a line of its own
pub fn is_scene_break(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && (compact.chars().all(|c| c == '-') || compact.chars().all(|c| c == '*'))
}

fn render_story_line(line: &str) -> Line<'static> {
    let trimmed = line.trim_start();

    if is_scene_break(line) {
        return Line::from(Span::styled(
            "~ ~ ~",
            Style::default().fg(Color::DarkGray),
        ))
        .centered();
    }

    if let Some(rest) = trimmed.strip_prefix('#') {
        let level = 1 + rest.chars().take_while(|&c| c == '#').count();
        let heading = rest.trim_start_matches('#').trim().to_string();
        let color = match level {
            1 => Color::Yellow,
            2 => Color::Cyan,
            _ => Color::Blue,
        };
        return Line::from(Span::styled(
            heading,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    if let Some(quote) = trimmed.strip_prefix("> ").or_else(|| trimmed.strip_prefix('>')) {
        let mut spans = vec![Span::styled("│ ", Style::default().fg(Color::DarkGray))];
        spans.extend(
            render_inline(quote)
                .into_iter()
                .map(|span| span.patch_style(Style::default().add_modifier(Modifier::ITALIC))),
        );
        return Line::from(spans);
    }

    if let Some(item) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
    {
        let mut spans = vec![Span::styled("• ", Style::default().fg(Color::Cyan))];
        spans.extend(render_inline(item));
        return Line::from(spans);
    }

    Line::from(render_inline(line))
}

/// Bold (`**text**`) and italic (`*text*`); unmatched markers stay literal.
fn render_inline(text: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut current_text = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '*' {
            current_text.push(ch);
            continue;
        }

        let bold = chars.peek() == Some(&'*');
        if bold {
            chars.next();
        }

        let mut inner = String::new();
        let mut found_close = false;
        while let Some(c) = chars.next() {
            if c == '*' {
                if !bold {
                    found_close = true;
                    break;
                }
                if chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
            }
            inner.push(c);
        }

        if found_close && !inner.is_empty() {
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }
            let modifier = if bold { Modifier::BOLD } else { Modifier::ITALIC };
            spans.push(Span::styled(inner, Style::default().add_modifier(modifier)));
        } else {
            current_text.push_str(if bold { "**" } else { "*" });
            current_text.push_str(&inner);
            if found_close {
                current_text.push_str(if bold { "**" } else { "*" });
            }
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    spans
}
