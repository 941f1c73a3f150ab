// Request coordination between the studio state and the generation service

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::StoryService;
use crate::debounce::Debouncer;
use crate::error::ServiceError;
use crate::events::AppEvent;
use crate::models::{CoordinatorConfig, GenerationOptions, Genre, Story, SuggestionBundle};
use crate::story::StoryCollection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorSettings {
    pub debounce: Duration,
    /// Prompts must be strictly longer than this (in characters) to fetch suggestions.
    pub suggestion_min_chars: usize,
    pub call_timeout: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from(&CoordinatorConfig::default())
    }
}

impl From<&CoordinatorConfig> for CoordinatorSettings {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            suggestion_min_chars: config.suggestion_min_chars,
            call_timeout: Duration::from_secs(config.call_timeout_secs),
        }
    }
}

/// The three kinds of request the studio sends to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Generate,
    Expand,
    Suggest,
}

impl Operation {
    pub const fn failure_notice(self) -> &'static str {
        match self {
            Self::Generate => "Failed to weave a story",
            Self::Expand => "Expansion failed",
            Self::Suggest => "Could not fetch suggestions",
        }
    }
}

/// One in-flight counter per operation. An operation is busy while its counter is non-zero.
#[derive(Debug, Default)]
pub struct BusyFlags {
    generating: AtomicUsize,
    expanding: AtomicUsize,
    suggesting: AtomicUsize,
}

impl BusyFlags {
    const fn counter(&self, operation: Operation) -> &AtomicUsize {
        match operation {
            Operation::Generate => &self.generating,
            Operation::Expand => &self.expanding,
            Operation::Suggest => &self.suggesting,
        }
    }

    pub fn is_busy(&self, operation: Operation) -> bool {
        self.counter(operation).load(Ordering::SeqCst) > 0
    }

    fn acquire(&self, operation: Operation) -> BusyGuard<'_> {
        let counter = self.counter(operation);
        counter.fetch_add(1, Ordering::SeqCst);
        BusyGuard { counter }
    }
}

/// Clears its share of a busy flag on every exit path, including cancellation.
pub struct BusyGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionOutcome {
    Applied,
    /// A newer suggestion request was issued before this one completed.
    Discarded,
    /// Prompt too short; no request was sent.
    Skipped,
}

#[derive(Debug, Default)]
struct StudioState {
    collection: StoryCollection,
    suggestions: Option<SuggestionBundle>,
}

pub struct Coordinator {
    service: StoryService,
    settings: CoordinatorSettings,
    state: Mutex<StudioState>,
    busy: BusyFlags,
    suggestion_seq: AtomicU64,
    debouncer: Debouncer,
    events: Option<mpsc::UnboundedSender<AppEvent>>,
}

impl Coordinator {
    pub fn new(service: StoryService, settings: CoordinatorSettings) -> Self {
        let debouncer = Debouncer::new(settings.debounce);
        Self {
            service,
            settings,
            state: Mutex::new(StudioState::default()),
            busy: BusyFlags::default(),
            suggestion_seq: AtomicU64::new(0),
            debouncer,
            events: None,
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn describe_service(&self) -> String {
        self.service.describe()
    }

    fn state(&self) -> MutexGuard<'_, StudioState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: AppEvent) {
        if let Some(events) = &self.events {
            // The UI may already be gone during teardown.
            let _ = events.send(event);
        }
    }

    fn report_failure(&self, operation: Operation, err: &ServiceError) {
        tracing::warn!(?operation, kind = ?err.kind(), error = %err, "Request failed");
        self.emit(AppEvent::OperationFailed {
            operation,
            message: err.to_string(),
        });
    }

    async fn call<T, F>(&self, request: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        let timeout = self.settings.call_timeout;
        tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| ServiceError::transport(format!("no response within {timeout:?}")))?
    }

    pub fn is_busy(&self, operation: Operation) -> bool {
        self.busy.is_busy(operation)
    }

    /// Generate a story and make it current. A blank prompt sends nothing and returns `None`.
    pub async fn generate(&self, options: &GenerationOptions) -> Result<Option<Story>, ServiceError> {
        if options.prompt.trim().is_empty() {
            tracing::debug!("Generate skipped: empty prompt");
            return Ok(None);
        }

        let _busy = self.busy.acquire(Operation::Generate);
        let started = Instant::now();
        tracing::info!(genre = %options.genre, length = %options.length, "Generating story");

        let result = self.call(self.service.generate_story(options)).await;
        match result {
            Ok(generated) => {
                let story = Story::new(generated, options.genre);
                self.state().collection.record_new_story(story.clone());
                tracing::info!(
                    story_id = %story.id,
                    title = %story.title,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Story generated"
                );
                self.emit(AppEvent::StoryGenerated { story_id: story.id });
                Ok(Some(story))
            }
            Err(err) => {
                self.report_failure(Operation::Generate, &err);
                Err(err)
            }
        }
    }

    /// Append a continuation to the current story.
    ///
    /// Returns the new content, or `None` without contacting the service when
    /// `instruction` is blank or `story_id` is not the current story.
    pub async fn expand(
        &self,
        story_id: Uuid,
        instruction: &str,
    ) -> Result<Option<String>, ServiceError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            tracing::debug!("Expand skipped: empty instruction");
            return Ok(None);
        }

        let content = self
            .state()
            .collection
            .current()
            .filter(|story| story.id == story_id)
            .map(|story| story.content.clone());
        let Some(content) = content else {
            tracing::debug!(story_id = %story_id, "Expand skipped: not the current story");
            return Ok(None);
        };

        let _busy = self.busy.acquire(Operation::Expand);
        let started = Instant::now();

        let result = self.call(self.service.expand_story(&content, instruction)).await;
        match result {
            Ok(continuation) => {
                let updated = {
                    let mut state = self.state();
                    // Append to the latest text so edits made while waiting are kept.
                    let latest = state
                        .collection
                        .get(story_id)
                        .map_or(content, |story| story.content.clone());
                    let updated = format!("{latest}\n\n{continuation}");
                    state
                        .collection
                        .update_story_content(story_id, updated.clone());
                    updated
                };
                tracing::info!(
                    story_id = %story_id,
                    appended_chars = continuation.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Story expanded"
                );
                self.emit(AppEvent::StoryExpanded { story_id });
                Ok(Some(updated))
            }
            Err(err) => {
                self.report_failure(Operation::Expand, &err);
                Err(err)
            }
        }
    }

    /// Fetch suggestions for `(prompt, genre)`. Only the most recently issued
    /// request may replace the current bundle.
    pub async fn suggest(
        &self,
        prompt: &str,
        genre: Genre,
    ) -> Result<SuggestionOutcome, ServiceError> {
        if prompt.chars().count() <= self.settings.suggestion_min_chars {
            return Ok(SuggestionOutcome::Skipped);
        }

        let seq = self.suggestion_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let _busy = self.busy.acquire(Operation::Suggest);
        tracing::debug!(seq, %genre, "Requesting suggestions");

        let result = self.call(self.service.suggestions(prompt, genre)).await;
        match result {
            Ok(bundle) => {
                {
                    let mut state = self.state();
                    if self.suggestion_seq.load(Ordering::SeqCst) != seq {
                        tracing::debug!(seq, "Discarding superseded suggestions");
                        return Ok(SuggestionOutcome::Discarded);
                    }
                    state.suggestions = Some(bundle);
                }
                self.emit(AppEvent::SuggestionsUpdated);
                Ok(SuggestionOutcome::Applied)
            }
            Err(err) => {
                if self.suggestion_seq.load(Ordering::SeqCst) == seq {
                    self.report_failure(Operation::Suggest, &err);
                } else {
                    tracing::debug!(seq, error = %err, "Superseded suggestion request failed");
                }
                Err(err)
            }
        }
    }

    /// Restart the suggestion debounce for an edited prompt or genre.
    pub fn on_prompt_changed(self: &Arc<Self>, prompt: String, genre: Genre) {
        let coordinator = Arc::downgrade(self);
        self.debouncer.schedule(async move {
            let Some(coordinator) = coordinator.upgrade() else {
                return;
            };
            // Failures are logged and reported by `suggest`.
            let _ = coordinator.suggest(&prompt, genre).await;
        });
    }

    /// Cancel the pending suggestion timer. Call when the UI shuts down.
    pub fn shutdown(&self) {
        self.debouncer.cancel();
    }

    pub fn select_story(&self, id: Uuid) -> bool {
        self.state().collection.select_story(id)
    }

    /// Apply a manual edit to the current story's latest content under one lock,
    /// so a continuation landing concurrently is never overwritten.
    pub fn edit_current_story(&self, edit: impl FnOnce(&mut String) -> bool) -> bool {
        self.state().collection.edit_current(edit)
    }

    pub fn current_story(&self) -> Option<Story> {
        self.state().collection.current().cloned()
    }

    pub fn suggestions(&self) -> Option<SuggestionBundle> {
        self.state().suggestions.clone()
    }

    /// Run `f` against the story history without cloning it.
    pub fn with_collection<R>(&self, f: impl FnOnce(&StoryCollection) -> R) -> R {
        f(&self.state().collection)
    }
}
