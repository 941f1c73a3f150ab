pub mod markdown;
pub mod widgets;

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Color,
    Frame,
};
use uuid::Uuid;

use crate::app::App;
use crate::coordinator::{Coordinator, Operation};
use crate::models::{Genre, Story, SuggestionBundle, ThemeConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub accent: Color,
    pub border: Color,
}

impl Theme {
    fn parse(name: &str, fallback: Color) -> Color {
        name.trim().parse().unwrap_or(fallback)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Magenta,
            border: Color::Cyan,
        }
    }
}

impl From<&ThemeConfig> for Theme {
    fn from(config: &ThemeConfig) -> Self {
        let default = Self::default();
        Self {
            accent: Self::parse(&config.accent_color, default.accent),
            border: Self::parse(&config.border_color, default.border),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub title: String,
    pub genre: Genre,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of coordinator state taken once per frame.
#[derive(Debug, Clone, Default)]
pub struct StudioView {
    pub history: Vec<HistoryEntry>,
    pub current: Option<Story>,
    pub suggestions: Option<SuggestionBundle>,
    pub generating: bool,
    pub expanding: bool,
    pub suggesting: bool,
}

impl StudioView {
    pub fn capture(coordinator: &Coordinator) -> Self {
        let history = coordinator.with_collection(|collection| {
            collection
                .stories()
                .iter()
                .map(|story| HistoryEntry {
                    id: story.id,
                    title: story.title.clone(),
                    genre: story.genre,
                    created_at: story.created_at,
                })
                .collect()
        });

        Self {
            history,
            current: coordinator.current_story(),
            suggestions: coordinator.suggestions(),
            generating: coordinator.is_busy(Operation::Generate),
            expanding: coordinator.is_busy(Operation::Expand),
            suggesting: coordinator.is_busy(Operation::Suggest),
        }
    }

    pub fn current_id(&self) -> Option<Uuid> {
        self.current.as_ref().map(|story| story.id)
    }
}

pub fn render(frame: &mut Frame, app: &mut App, view: &StudioView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Panels
            Constraint::Length(1), // Notice line
            Constraint::Length(1), // Bottom keymap bar
        ])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(38), // Controls
            Constraint::Min(30),    // Reader
            Constraint::Length(34), // Sidebar
        ])
        .split(rows[1]);

    let controls = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(10)])
        .split(columns[0]);

    let reader = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(columns[1]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Min(0)])
        .split(columns[2]);

    widgets::render_header(frame, app, rows[0]);
    widgets::render_prompt(frame, app, controls[0]);
    widgets::render_options(frame, app, view, controls[1]);
    widgets::render_reader(frame, app, view, reader[0]);
    widgets::render_continue_input(frame, app, view, reader[1]);
    widgets::render_sparks(frame, app, view, sidebar[0]);
    widgets::render_history(frame, app, view, sidebar[1]);
    widgets::render_notice(frame, app, rows[2]);
    widgets::render_bottom_bar(frame, app, rows[3]);

    if app.show_help {
        widgets::render_help_window(frame, app, frame.area());
    }

    if app.show_info {
        widgets::render_info_window(frame, app, view, frame.area());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppConfig, GeneratedStory};
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &mut App, view: &StudioView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|frame| render(frame, app, view)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn story() -> Story {
        Story::new(
            GeneratedStory {
                title: "The Glass Orchard".to_string(),
                content: "Nobody planted the trees.\n\n* * *\n\nThey grew anyway.".to_string(),
                summary: "Trees appear overnight.".to_string(),
            },
            Genre::Mystery,
        )
    }

    #[test]
    fn test_theme_from_config() {
        let theme = Theme::from(&ThemeConfig {
            accent_color: "yellow".to_string(),
            border_color: "#102030".to_string(),
        });
        assert_eq!(theme.accent, Color::Yellow);
        assert_eq!(theme.border, Color::Rgb(0x10, 0x20, 0x30));
    }

    #[test]
    fn test_theme_falls_back_on_unknown_color() {
        let theme = Theme::from(&ThemeConfig {
            accent_color: "not-a-color".to_string(),
            border_color: "cyan".to_string(),
        });
        assert_eq!(theme, Theme::default());
    }

    #[test]
    fn test_render_empty_studio() {
        let mut app = App::new(&AppConfig::default(), "gemini".to_string());
        let screen = draw(&mut app, &StudioView::default());

        assert!(screen.contains("Chronicle"));
        assert!(screen.contains("Enter a prompt to see creative"));
        assert!(screen.contains("No stories yet"));
    }

    #[test]
    fn test_render_current_story() {
        let mut app = App::new(&AppConfig::default(), "gemini".to_string());
        let story = story();
        let view = StudioView {
            history: vec![HistoryEntry {
                id: story.id,
                title: story.title.clone(),
                genre: story.genre,
                created_at: story.created_at,
            }],
            current: Some(story),
            ..StudioView::default()
        };

        let screen = draw(&mut app, &view);

        assert!(screen.contains("The Glass Orchard"));
        assert!(screen.contains("Nobody planted the trees."));
        assert!(screen.contains("~ ~ ~"));
        assert!(!screen.contains("No stories yet"));
    }

    #[test]
    fn test_render_busy_indicators() {
        let mut app = App::new(&AppConfig::default(), "gemini".to_string());
        let view = StudioView {
            generating: true,
            suggesting: true,
            ..StudioView::default()
        };

        let screen = draw(&mut app, &view);

        assert!(screen.contains("Weaving your story..."));
        assert!(screen.contains("Generating ideas..."));
    }

    #[test]
    fn test_render_suggestions() {
        let mut app = App::new(&AppConfig::default(), "gemini".to_string());
        let view = StudioView {
            suggestions: Some(SuggestionBundle {
                titles: vec!["Salt and Iron".to_string()],
                character_names: vec!["Ilse".to_string()],
                plot_ideas: vec!["The lighthouse keeper lies".to_string()],
            }),
            ..StudioView::default()
        };

        let screen = draw(&mut app, &view);

        assert!(screen.contains("Salt and Iron"));
        assert!(screen.contains("Ilse"));
        assert!(screen.contains("The lighthouse keeper lies"));
    }

    #[test]
    fn test_render_help_popup() {
        let mut app = App::new(&AppConfig::default(), "gemini".to_string());
        app.toggle_help();
        let screen = draw(&mut app, &StudioView::default());
        assert!(screen.contains("Keyboard Shortcuts"));
    }
}
