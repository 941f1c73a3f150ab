// Prompt text for the story calls

use serde_json::json;

use crate::models::{GenerationOptions, Genre};

pub fn story_prompt(options: &GenerationOptions) -> String {
    let twist = if options.include_twist { "Yes" } else { "No" };
    let dialogue = if options.heavy_dialogue {
        "Heavy"
    } else {
        "Balanced"
    };

    format!(
        r#"Generate a {genre} story based on this prompt: "{prompt}".

Constraints:
- Length: Target {length}
- Tone: {tone}
- Include Plot Twist: {twist}
- Dialogue focus: {dialogue}

Output the result in JSON format with the following structure:
{{
  "title": "An evocative title",
  "content": "The full story in markdown format",
  "summary": "A 2-sentence captivating summary"
}}"#,
        genre = options.genre,
        prompt = options.prompt.trim(),
        length = options.length,
        tone = options.tone,
    )
}

pub fn expand_prompt(content: &str, instruction: &str) -> String {
    format!(
        r#"Continue the following story based on this instruction: "{instruction}".
Maintain the existing tone and character voices.

Existing Story:
"{content}"

Output ONLY the new continuation text in markdown."#,
        instruction = instruction.trim(),
    )
}

pub fn suggestions_prompt(prompt: &str, genre: Genre) -> String {
    format!(
        r#"Give me 3 titles, 5 character names, and 3 plot twist ideas for a {genre} story based on this: "{prompt}""#,
        prompt = prompt.trim(),
    )
}

/// JSON Schema for [`crate::models::SuggestionBundle`]. All three arrays are required.
pub fn suggestions_schema() -> serde_json::Value {
    let string_array = json!({ "type": "array", "items": { "type": "string" } });
    json!({
        "type": "object",
        "properties": {
            "titles": string_array,
            "characterNames": string_array,
            "plotIdeas": string_array,
        },
        "required": ["titles", "characterNames", "plotIdeas"],
    })
}
