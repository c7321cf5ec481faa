//! Модуль для разбора разметки исключения
//!
//! Текст внутри `<NoTTSHere>…</NoTTSHere>` попадает в транскрипт,
//! но никогда не отправляется на синтез.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::{Result, TimelineError};

/// Открывающий маркер исключения
pub const OPEN_MARKER: &str = "<NoTTSHere>";
/// Закрывающий маркер исключения
pub const CLOSE_MARKER: &str = "</NoTTSHere>";

lazy_static! {
    static ref MARKER: Regex = Regex::new(r"<(/?)NoTTSHere>").unwrap();
}

/// Фрагмент текста с признаком озвучивания
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Текст фрагмента без маркеров
    pub text: String,
    /// Нужно ли отправлять фрагмент на синтез
    pub speakable: bool,
}

impl Token {
    fn new(text: &str, speakable: bool) -> Self {
        Self {
            text: text.to_string(),
            speakable,
        }
    }
}

/// Разбить размеченный текст на чередующиеся озвучиваемые и неозвучиваемые фрагменты
///
/// Пустые и состоящие из пробелов фрагменты отбрасываются. Незакрытый,
/// лишний закрывающий или вложенный маркер приводит к `MalformedMarkup`.
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;
    let mut opened_at: Option<usize> = None;

    for caps in MARKER.captures_iter(text) {
        let marker = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let closing = caps.get(1).map_or(false, |slash| !slash.as_str().is_empty());
        let fragment = &text[cursor..marker.start()];

        match (closing, opened_at) {
            (false, None) => {
                push_fragment(&mut tokens, fragment, true);
                opened_at = Some(marker.start());
            }
            (false, Some(outer)) => {
                return Err(TimelineError::MalformedMarkup {
                    position: marker.start(),
                    reason: format!("nested {} inside region opened at byte {}", OPEN_MARKER, outer),
                });
            }
            (true, Some(_)) => {
                push_fragment(&mut tokens, fragment, false);
                opened_at = None;
            }
            (true, None) => {
                return Err(TimelineError::MalformedMarkup {
                    position: marker.start(),
                    reason: format!("{} without matching {}", CLOSE_MARKER, OPEN_MARKER),
                });
            }
        }
        cursor = marker.end();
    }

    if let Some(position) = opened_at {
        return Err(TimelineError::MalformedMarkup {
            position,
            reason: format!("{} is never closed", OPEN_MARKER),
        });
    }

    push_fragment(&mut tokens, &text[cursor..], true);
    Ok(tokens)
}

fn push_fragment(tokens: &mut Vec<Token>, fragment: &str, speakable: bool) {
    if fragment.trim().is_empty() {
        return;
    }
    tokens.push(Token::new(fragment, speakable));
}
