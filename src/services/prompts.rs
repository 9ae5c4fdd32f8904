//! Prompt builders for each generation step.
//!
//! All builders are pure: the only state they see is what is passed in, which
//! for page text is the slice of pages written so far.

use crate::core::story::{Page, StoryConfiguration};

const QUOTE_CHARS: [char; 3] = ['"', '\u{201C}', '\u{201D}'];

/// Removes every double quote character the model wraps titles in.
pub fn clean_title(raw: &str) -> String {
    raw.chars()
        .filter(|c| !QUOTE_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn title_prompt(config: &StoryConfiguration) -> String {
    format!(
        "Create a short, magical title for a children's story.\
        \nMain character: {}, {}.\
        \nSetting: {}.\
        \nThe reader is {} years old.\
        \nReturn only the title, nothing else.",
        config.character_name,
        config.character_description(),
        config.theme.display_name(),
        config.reader_age,
    )
}

pub fn cover_prompt(config: &StoryConfiguration, title: &str) -> String {
    format!(
        "A children's book cover illustration for the story \"{}\".\
        \nIt shows {}, {}.\
        \nStyle: {}.\
        \nDo not include any text or lettering in the image.",
        title,
        config.character_name,
        config.character_description(),
        config.theme.style(),
    )
}

/// `previous` holds every page written so far, in order.
pub fn page_text_prompt(config: &StoryConfiguration, title: &str, previous: &[Page]) -> String {
    let page_number = previous.len() + 1;

    let story_so_far = if previous.is_empty() {
        "(This is the first page.)".to_string()
    } else {
        previous
            .iter()
            .enumerate()
            .map(|(i, page)| format!("Page {}: {}", i + 1, page.text))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let story_idea = if config.story_prompt.trim().is_empty() {
        "Let your imagination choose the adventure."
    } else {
        config.story_prompt.trim()
    };

    let ending = if page_number >= config.page_count {
        "\nThis is the last page, so bring the story to a happy ending."
    } else {
        ""
    };

    format!(
        "You are writing a picture book for a {}-year-old reader.\
        \nTitle: {}\
        \nMain character: {}, {}\
        \nSetting: {}\
        \nThe story should gently teach {}.\
        \nStory idea: {}\
        \n\nStory so far:\n{}\
        \n\nWrite page {} of {}. Use two or three short sentences suited to the reader's age.{}\
        \nReturn only the text of this next page. Do not add a page number or a heading.",
        config.reader_age,
        title,
        config.character_name,
        config.character_description(),
        config.theme.display_name(),
        config.moral.phrase(),
        story_idea,
        story_so_far,
        page_number,
        config.page_count,
        ending,
    )
}

/// `page_index` is zero-based.
pub fn page_image_prompt(config: &StoryConfiguration, page_index: usize, page_text: &str) -> String {
    format!(
        "Illustration for page {} of a children's picture book.\
        \nScene: {}\
        \nMain character: {}, {}.\
        \nStyle: {}.\
        \nDo not include any text or lettering in the image.",
        page_index + 1,
        page_text,
        config.character_name,
        config.character_description(),
        config.theme.style(),
    )
}
