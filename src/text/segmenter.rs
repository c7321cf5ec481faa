//! Модуль нарезки текста на предложения
//!
//! Озвучиваемые фрагменты режутся по знакам препинания, неозвучиваемые
//! переходят в результат целиком. Каждый сегмент получает сквозной индекс.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::text::markdown::strip_markdown;
use crate::text::markup::Token;

lazy_static! {
    static ref STRONG_BREAK: Regex = Regex::new(r"([，。．！!？?])").unwrap();
    static ref ASCII_PERIOD: Regex = Regex::new(r"\.(\s|$)").unwrap();
}

/// Единица работы синтеза
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Сквозной индекс сегмента (0..N-1)
    pub index: usize,
    /// Текст сегмента
    pub text: String,
    /// Нужно ли отправлять сегмент на синтез
    pub speakable: bool,
}

/// Параметры нарезки
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentOptions {
    /// Удалять markdown из озвучиваемых фрагментов перед нарезкой
    pub strip_markdown: bool,
}

/// Разбить озвучиваемый текст на предложения
pub fn split_sentences(text: &str) -> Vec<String> {
    let marked = STRONG_BREAK.replace_all(text, "${1}\n");
    let marked = ASCII_PERIOD.replace_all(&marked, ".\n${1}");

    marked
        .split('\n')
        .map(str::trim)
        .filter(|sentence| has_linguistic_content(sentence))
        .map(str::to_string)
        .collect()
}

/// Есть ли в строке хотя бы одна буква (иероглифы считаются буквами)
fn has_linguistic_content(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// Превратить токены в пронумерованные сегменты
pub fn segment_tokens(tokens: &[Token], options: &SegmentOptions) -> Vec<Segment> {
    let mut segments = Vec::new();

    for token in tokens {
        if !token.speakable {
            segments.push(Segment {
                index: segments.len(),
                text: token.text.clone(),
                speakable: false,
            });
            continue;
        }

        let sentences = if options.strip_markdown {
            split_sentences(&strip_markdown(&token.text))
        } else {
            split_sentences(&token.text)
        };

        for sentence in sentences {
            segments.push(Segment {
                index: segments.len(),
                text: sentence,
                speakable: true,
            });
        }
    }

    log::debug!(
        "Segmented {} token(s) into {} segment(s)",
        tokens.len(),
        segments.len()
    );
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::markup::tokenize;

    #[test]
    fn test_split_full_width_punctuation() {
        assert_eq!(
            split_sentences("今天天氣很好，我們去散步。你要來嗎？好啊！"),
            vec!["今天天氣很好，", "我們去散步。", "你要來嗎？", "好啊！"]
        );
    }

    #[test]
    fn test_split_ascii_period_only_before_whitespace() {
        assert_eq!(
            split_sentences("Version 3.14 is out. Update now.It works"),
            vec!["Version 3.14 is out.", "Update now.It works"]
        );
        assert_eq!(split_sentences("Done."), vec!["Done."]);
    }

    #[test]
    fn test_punctuation_noise_is_dropped() {
        assert_eq!(split_sentences("。。！ ？\n   ，"), Vec::<String>::new());
        assert_eq!(split_sentences("「好」。……"), vec!["「好」。"]);
    }

    #[test]
    fn test_existing_newlines_split() {
        assert_eq!(split_sentences("第一行\n第二行"), vec!["第一行", "第二行"]);
    }

    #[test]
    fn test_segment_indices_are_dense() {
        let tokens = tokenize("晴天。下雨，<NoTTSHere>(旁白)</NoTTSHere>出發。<NoTTSHere>（完）</NoTTSHere>").unwrap();
        let segments = segment_tokens(&tokens, &SegmentOptions::default());

        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["晴天。", "下雨，", "(旁白)", "出發。", "（完）"]);
        let speakable: Vec<bool> = segments.iter().map(|s| s.speakable).collect();
        assert_eq!(speakable, vec![true, true, false, true, false]);
        for (expected, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index, expected);
        }
    }

    #[test]
    fn test_non_speakable_kept_verbatim() {
        let tokens = tokenize("<NoTTSHere>圖：記者攝。 資料來源！</NoTTSHere>").unwrap();
        let segments = segment_tokens(&tokens, &SegmentOptions::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "圖：記者攝。 資料來源！");
        assert!(!segments[0].speakable);
    }

    #[test]
    fn test_markdown_stripping_option() {
        let tokens = tokenize("## 標題\n**重要**消息。").unwrap();
        let plain = segment_tokens(&tokens, &SegmentOptions::default());
        assert_eq!(plain[0].text, "## 標題");

        let stripped = segment_tokens(&tokens, &SegmentOptions { strip_markdown: true });
        let texts: Vec<&str> = stripped.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["標題", "重要消息。"]);
    }
}
