// Event types for async communication

use uuid::Uuid;

use crate::coordinator::Operation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A new story was generated and is now current
    StoryGenerated { story_id: Uuid },
    /// Continuation text was appended to a story
    StoryExpanded { story_id: Uuid },
    /// A fresh suggestion bundle replaced the previous one
    SuggestionsUpdated,
    /// A request to the generation service failed
    OperationFailed { operation: Operation, message: String },
}
