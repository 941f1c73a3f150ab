// In-memory story history

use uuid::Uuid;

use crate::models::Story;

/// Stories generated this session, newest first, plus the one being read.
///
/// The current story is stored as an id into `stories`, so the reader and the
/// history list always see the same content for a given story.
#[derive(Debug, Default, Clone)]
pub struct StoryCollection {
    stories: Vec<Story>,
    current: Option<Uuid>,
}

impl StoryCollection {
    /// Prepend `story` and make it current.
    pub fn record_new_story(&mut self, story: Story) {
        self.current = Some(story.id);
        self.stories.insert(0, story);
    }

    /// Replace the content of the story with `id` in place. Unknown ids are ignored.
    pub fn update_story_content(&mut self, id: Uuid, content: String) -> bool {
        match self.stories.iter_mut().find(|s| s.id == id) {
            Some(story) => {
                story.content = content;
                true
            }
            None => {
                tracing::debug!(story_id = %id, "Content update for unknown story ignored");
                false
            }
        }
    }

    /// Apply `edit` to the current story's content in place. Returns false when
    /// there is no current story or `edit` reports no change.
    pub fn edit_current(&mut self, edit: impl FnOnce(&mut String) -> bool) -> bool {
        let Some(id) = self.current else {
            return false;
        };
        self.stories
            .iter_mut()
            .find(|s| s.id == id)
            .is_some_and(|story| edit(&mut story.content))
    }

    /// Make the story with `id` current; unknown ids leave the selection alone.
    pub fn select_story(&mut self, id: Uuid) -> bool {
        if self.get(id).is_some() {
            self.current = Some(id);
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Story> {
        self.stories.iter().find(|s| s.id == id)
    }

    pub fn current(&self) -> Option<&Story> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }
}
