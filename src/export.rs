// Saving stories as plain text files

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::models::Story;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").expect("valid regex"));

/// `<title>.txt` with every run of non-word characters replaced by `_`.
/// A title with no word characters at all falls back to `untitled.txt`.
pub fn download_file_name(title: &str) -> String {
    let stem = NON_WORD.replace_all(title, "_");
    if stem.trim_matches('_').is_empty() {
        "untitled.txt".to_string()
    } else {
        format!("{stem}.txt")
    }
}

pub fn render_text(story: &Story) -> String {
    format!("# {}\n\n{}", story.title, story.content)
}

/// Write `story` into `dir`, returning the path of the new file.
pub fn save_story(dir: &Path, story: &Story) -> Result<PathBuf> {
    fs::create_dir_all(dir).context("Failed to create export directory")?;

    let path = dir.join(download_file_name(&story.title));
    fs::write(&path, render_text(story)).context("Failed to write story file")?;

    tracing::info!(story_id = %story.id, path = %path.display(), "Story exported");
    Ok(path)
}
