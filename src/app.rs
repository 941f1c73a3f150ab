use std::time::{Duration, Instant};

use crate::events::AppEvent;
use crate::models::{AppConfig, GenerationOptions};
use crate::ui::Theme;

const NOTICE_TTL: Duration = Duration::from_secs(6);

/// Panel that receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Prompt,
    Reader,
    Continue,
    History,
}

impl Focus {
    pub const fn next(self) -> Self {
        match self {
            Self::Prompt => Self::Reader,
            Self::Reader => Self::Continue,
            Self::Continue => Self::History,
            Self::History => Self::Prompt,
        }
    }

    pub const fn prev(self) -> Self {
        match self {
            Self::Prompt => Self::History,
            Self::Reader => Self::Prompt,
            Self::Continue => Self::Reader,
            Self::History => Self::Continue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub shown_at: Instant,
}

#[derive(Debug)]
pub struct App {
    pub focus: Focus,
    pub should_quit: bool,
    pub exit_pending: bool,
    pub show_help: bool,
    pub show_info: bool,

    /// Options State: edited by the controls panel, copied into each generate call.
    pub options: GenerationOptions,
    pub instruction: String,

    pub reader_scroll: usize,
    pub history_cursor: usize,
    pub notice: Option<Notice>,

    pub service_label: String,
    pub service_online: Option<bool>,
    pub export_dir: String,
    pub theme: Theme,
}

impl App {
    pub fn new(config: &AppConfig, service_label: String) -> Self {
        Self {
            focus: Focus::Prompt,
            should_quit: false,
            exit_pending: false,
            show_help: false,
            show_info: false,
            options: GenerationOptions::default(),
            instruction: String::new(),
            reader_scroll: 0,
            history_cursor: 0,
            notice: None,
            service_label,
            service_online: None,
            export_dir: config.export.directory.clone(),
            theme: Theme::from(&config.theme),
        }
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    pub const fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub const fn toggle_info(&mut self) {
        self.show_info = !self.show_info;
    }

    pub const fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub const fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    pub const fn scroll_up(&mut self, amount: usize) {
        self.reader_scroll = self.reader_scroll.saturating_sub(amount);
    }

    pub const fn scroll_down(&mut self, amount: usize) {
        self.reader_scroll = self.reader_scroll.saturating_add(amount);
    }

    pub const fn scroll_to_top(&mut self) {
        self.reader_scroll = 0;
    }

    pub const fn scroll_to_bottom(&mut self) {
        // Clamped to the real content height when the reader is drawn.
        self.reader_scroll = usize::MAX;
    }

    pub const fn history_up(&mut self) {
        self.history_cursor = self.history_cursor.saturating_sub(1);
    }

    pub fn history_down(&mut self, history_len: usize) {
        if history_len > 0 {
            self.history_cursor = (self.history_cursor + 1).min(history_len - 1);
        }
    }

    pub fn set_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    /// Drop the notice once it has been visible for a while.
    pub fn expire_notice(&mut self, now: Instant) {
        if self
            .notice
            .as_ref()
            .is_some_and(|notice| now.duration_since(notice.shown_at) >= NOTICE_TTL)
        {
            self.notice = None;
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::StoryGenerated { .. } => {
                self.reader_scroll = 0;
                self.history_cursor = 0;
                self.focus = Focus::Reader;
                self.set_notice(NoticeLevel::Info, "Story ready");
            }
            AppEvent::StoryExpanded { .. } => {
                self.instruction.clear();
                self.scroll_to_bottom();
            }
            AppEvent::SuggestionsUpdated => {}
            AppEvent::OperationFailed { operation, message } => {
                self.set_notice(
                    NoticeLevel::Error,
                    format!("{}: {message}", operation.failure_notice()),
                );
            }
        }
    }
}

/// Edits typed into the reader panel, applied to the end of the story text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEdit {
    Insert(char),
    Newline,
    Backspace,
}

/// Apply `edit` to `text`; returns false when nothing changed.
pub fn apply_edit(text: &mut String, edit: TextEdit) -> bool {
    match edit {
        TextEdit::Insert(c) => {
            text.push(c);
            true
        }
        TextEdit::Newline => {
            text.push('\n');
            true
        }
        TextEdit::Backspace => text.pop().is_some(),
    }
}
