// Reading statistics for the info popup

const WORDS_PER_MINUTE: usize = 200;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Approximate token count: ~1.3 tokens per word to account for subword tokenization.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn estimate_tokens(text: &str) -> usize {
    ((word_count(text) as f64) * 1.3).ceil() as usize
}

/// Whole minutes needed to read `words`, at least one for any non-empty text.
pub const fn reading_minutes(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryStats {
    pub words: usize,
    pub tokens: usize,
    pub minutes: usize,
}

impl StoryStats {
    pub fn of(text: &str) -> Self {
        let words = word_count(text);
        Self {
            words,
            tokens: estimate_tokens(text),
            minutes: reading_minutes(words),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("The cave\nwas   warm."), 4);
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert!(estimate_tokens("Hello world") > 2);

        let short = estimate_tokens("Hi");
        let long = estimate_tokens("This is a much longer sentence with many words");
        assert!(long > short);
    }

    #[test]
    fn test_long_text() {
        let long_text = "word ".repeat(1000);
        let tokens = estimate_tokens(&long_text);
        assert!(tokens > 1000);
        assert!(tokens < 2000);
    }

    #[test]
    fn test_reading_minutes() {
        assert_eq!(reading_minutes(0), 0);
        assert_eq!(reading_minutes(1), 1);
        assert_eq!(reading_minutes(200), 1);
        assert_eq!(reading_minutes(201), 2);
    }

    #[test]
    fn test_story_stats() {
        let stats = StoryStats::of(&"word ".repeat(300));
        assert_eq!(stats.words, 300);
        assert!(stats.tokens > stats.words);
        assert_eq!(stats.minutes, 2);
    }
}
