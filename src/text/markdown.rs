//! Удаление markdown-разметки из озвучиваемого текста

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADING: Regex = Regex::new(r"(?m)^#{1,6}\s+").unwrap();
    static ref CODE_FENCE: Regex = Regex::new(r"```[\s\S]*?```").unwrap();
    static ref INLINE_CODE: Regex = Regex::new(r"`([^`]*)`").unwrap();
    static ref BOLD_STARS: Regex = Regex::new(r"\*\*(.*?)\*\*").unwrap();
    static ref BOLD_UNDERSCORES: Regex = Regex::new(r"__(.*?)__").unwrap();
    static ref ITALIC_STAR: Regex = Regex::new(r"\*(.*?)\*").unwrap();
    static ref ITALIC_UNDERSCORE: Regex = Regex::new(r"_(.*?)_").unwrap();
    static ref STRIKETHROUGH: Regex = Regex::new(r"~~(.*?)~~").unwrap();
    static ref IMAGE: Regex = Regex::new(r"!\[([^\]]*)\]\([^)]+\)").unwrap();
    static ref LINK: Regex = Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n{2,}").unwrap();
}

/// Удалить markdown-разметку, оставив читаемый текст
///
/// Блоки кода удаляются целиком, у ссылок и картинок остаётся подпись.
pub fn strip_markdown(markdown: &str) -> String {
    let text = HEADING.replace_all(markdown, "");
    let text = CODE_FENCE.replace_all(&text, "");
    let text = INLINE_CODE.replace_all(&text, "${1}");
    let text = BOLD_STARS.replace_all(&text, "${1}");
    let text = BOLD_UNDERSCORES.replace_all(&text, "${1}");
    let text = ITALIC_STAR.replace_all(&text, "${1}");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "${1}");
    let text = STRIKETHROUGH.replace_all(&text, "${1}");
    let text = IMAGE.replace_all(&text, "${1}");
    let text = LINK.replace_all(&text, "${1}");
    let text = HTML_TAG.replace_all(&text, "");
    BLANK_LINES.replace_all(text.trim(), "\n").into_owned()
}
