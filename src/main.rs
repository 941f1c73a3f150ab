mod api;
mod app;
mod config;
mod coordinator;
mod debounce;
mod error;
mod events;
mod export;
mod models;
mod stats;
mod story;
mod ui;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, prelude::*};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use api::StoryService;
use app::{apply_edit, App, Focus, NoticeLevel, TextEdit};
use coordinator::{Coordinator, CoordinatorSettings, Operation};
use events::AppEvent;
use models::AppConfig;
use ui::StudioView;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_config().context("Failed to load config")?;
    init_logging(&config)?;
    tracing::info!(provider = ?config.service.provider, "Chronicle starting");

    let model = api::create_model(&config.service)?;
    let service = StoryService::new(model);

    // Create channel for async events
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    let coordinator = Arc::new(
        Coordinator::new(service.clone(), CoordinatorSettings::from(&config.coordinator))
            .with_events(tx),
    );

    let mut app = App::new(&config, coordinator.describe_service());
    app.service_online = Some(
        tokio::time::timeout(HEALTH_CHECK_TIMEOUT, service.health_check())
            .await
            .unwrap_or(false),
    );
    if app.service_online != Some(true) {
        tracing::warn!(service = %app.service_label, "Generation service is not reachable");
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &coordinator, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    coordinator.shutdown();
    tracing::info!("Chronicle stopped");

    if let Err(err) = res {
        tracing::error!(error = ?err, "Chronicle exited with an error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Log to a file; stdout belongs to the terminal UI.
fn init_logging(config: &AppConfig) -> Result<()> {
    let path = config::get_log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let level = &config.log.level;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CHRONICLE_LOG")
                .unwrap_or_else(|_| EnvFilter::new(format!("warn,chronicle={level}"))),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

const fn is_ctrl(modifiers: KeyModifiers) -> bool {
    modifiers.contains(KeyModifiers::CONTROL)
}

fn handle_popup_keys(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> bool {
    if app.show_help {
        match key {
            KeyCode::F(1) | KeyCode::Esc => app.show_help = false,
            KeyCode::Char('h') if is_ctrl(modifiers) => app.show_help = false,
            _ => {}
        }
        return true;
    }

    if app.show_info {
        match key {
            KeyCode::Esc => app.show_info = false,
            KeyCode::Char('o') if is_ctrl(modifiers) => app.show_info = false,
            _ => {}
        }
        return true;
    }

    false
}

fn prompt_changed(app: &App, coordinator: &Arc<Coordinator>) {
    coordinator.on_prompt_changed(app.options.prompt.clone(), app.options.genre);
}

fn start_generate(app: &App, coordinator: &Arc<Coordinator>) {
    // Generation control is disabled while a story is being woven.
    if coordinator.is_busy(Operation::Generate) || app.options.prompt.trim().is_empty() {
        return;
    }

    let options = app.options.clone();
    let coordinator = Arc::clone(coordinator);
    tokio::spawn(async move {
        // Failures reach the UI as OperationFailed events.
        let _ = coordinator.generate(&options).await;
    });
}

fn start_expand(app: &App, coordinator: &Arc<Coordinator>, view: &StudioView) {
    let Some(story_id) = view.current_id() else {
        return;
    };
    if coordinator.is_busy(Operation::Expand) || app.instruction.trim().is_empty() {
        return;
    }

    let instruction = app.instruction.clone();
    let coordinator = Arc::clone(coordinator);
    tokio::spawn(async move {
        let _ = coordinator.expand(story_id, &instruction).await;
    });
}

fn save_current_story(app: &mut App, view: &StudioView) {
    let Some(story) = &view.current else {
        app.set_notice(NoticeLevel::Info, "Nothing to save yet");
        return;
    };

    match export::save_story(Path::new(&app.export_dir), story) {
        Ok(path) => app.set_notice(NoticeLevel::Info, format!("Saved to {}", path.display())),
        Err(err) => {
            tracing::error!(error = ?err, "Export failed");
            app.set_notice(NoticeLevel::Error, format!("Save failed: {err}"));
        }
    }
}

fn edit_current_story(coordinator: &Coordinator, edit: TextEdit) {
    coordinator.edit_current_story(|content| apply_edit(content, edit));
}

fn handle_focus_keys(
    app: &mut App,
    key: KeyCode,
    coordinator: &Arc<Coordinator>,
    view: &StudioView,
) {
    match app.focus {
        Focus::Prompt => match key {
            KeyCode::Char(c) => {
                app.options.prompt.push(c);
                prompt_changed(app, coordinator);
            }
            KeyCode::Backspace => {
                if app.options.prompt.pop().is_some() {
                    prompt_changed(app, coordinator);
                }
            }
            KeyCode::Enter => start_generate(app, coordinator),
            _ => {}
        },
        Focus::Reader => match key {
            KeyCode::Up => app.scroll_up(1),
            KeyCode::Down => app.scroll_down(1),
            KeyCode::PageUp => app.scroll_up(10),
            KeyCode::PageDown => app.scroll_down(10),
            KeyCode::Home => app.scroll_to_top(),
            KeyCode::End => app.scroll_to_bottom(),
            KeyCode::Char(c) => edit_current_story(coordinator, TextEdit::Insert(c)),
            KeyCode::Enter => edit_current_story(coordinator, TextEdit::Newline),
            KeyCode::Backspace => edit_current_story(coordinator, TextEdit::Backspace),
            _ => {}
        },
        Focus::Continue => match key {
            KeyCode::Char(c) => app.instruction.push(c),
            KeyCode::Backspace => {
                app.instruction.pop();
            }
            KeyCode::Enter => start_expand(app, coordinator, view),
            _ => {}
        },
        Focus::History => match key {
            KeyCode::Up => app.history_up(),
            KeyCode::Down => app.history_down(view.history.len()),
            KeyCode::Enter => {
                if let Some(entry) = view.history.get(app.history_cursor) {
                    if coordinator.select_story(entry.id) {
                        app.scroll_to_top();
                    }
                }
            }
            _ => {}
        },
    }
}

fn handle_keyboard_input(
    app: &mut App,
    key: KeyCode,
    modifiers: KeyModifiers,
    coordinator: &Arc<Coordinator>,
    view: &StudioView,
) {
    match key {
        KeyCode::Char('q') if is_ctrl(modifiers) => app.quit(),
        KeyCode::Char('h') if is_ctrl(modifiers) => app.toggle_help(),
        KeyCode::F(1) => app.toggle_help(),
        KeyCode::Char('o') if is_ctrl(modifiers) => app.toggle_info(),
        KeyCode::Char('g') if is_ctrl(modifiers) => start_generate(app, coordinator),
        KeyCode::Char('s') if is_ctrl(modifiers) => save_current_story(app, view),
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        KeyCode::F(2) => {
            app.options.genre = app.options.genre.next();
            prompt_changed(app, coordinator);
        }
        KeyCode::F(3) => app.options.length = app.options.length.next(),
        KeyCode::F(4) => app.options.cycle_tone(),
        KeyCode::F(5) => app.options.include_twist = !app.options.include_twist,
        KeyCode::F(6) => app.options.heavy_dialogue = !app.options.heavy_dialogue,
        _ if is_ctrl(modifiers) => {}
        _ => handle_focus_keys(app, key, coordinator, view),
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    coordinator: &Arc<Coordinator>,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        let view = StudioView::capture(coordinator);
        terminal.draw(|f| ui::render(f, app, &view))?;

        while let Ok(app_event) = event_rx.try_recv() {
            app.handle_event(app_event);
        }
        app.expire_notice(Instant::now());

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if handle_popup_keys(app, key.code, key.modifiers) {
                        continue;
                    }

                    match key.code {
                        KeyCode::Char('c') if is_ctrl(key.modifiers) => {
                            if app.exit_pending {
                                app.quit();
                            } else {
                                app.exit_pending = true;
                            }
                            continue;
                        }
                        KeyCode::Esc if app.exit_pending => {
                            app.exit_pending = false;
                            continue;
                        }
                        _ if app.exit_pending => {
                            // Any other key cancels pending exit
                            app.exit_pending = false;
                        }
                        _ => {}
                    }

                    handle_keyboard_input(app, key.code, key.modifiers, coordinator, &view);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
