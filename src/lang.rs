//! Statistical language detection, the crawler's one external-collaborator
//! dependency named in the specification (`detect(text) -> ISO-639-1-ish
//! code`). Grounded in `boyboi86-rust-web-crawler`'s use of `whatlang`;
//! any equivalent detector is a drop-in replacement for this module alone.

use whatlang::{detect, Lang};

/// Detects the dominant language of `text`. Returns `"unknown"` for short
/// or undetectable input, matching the parser's own length gate.
pub fn detect_language(text: &str) -> String {
    if text.chars().count() <= 50 {
        return "unknown".to_string();
    }
    match detect(text) {
        Some(info) => to_iso_639_1(info.lang()),
        None => "unknown".to_string(),
    }
}

/// `whatlang` reports ISO 639-3 codes; map the common ones down to the
/// two-letter codes `<html lang>` attributes and factor/search-priority
/// configuration use. Anything outside this table falls back to its raw
/// 639-3 code rather than being lost.
fn to_iso_639_1(lang: Lang) -> String {
    let code = match lang {
        Lang::Eng => Some("en"),
        Lang::Por => Some("pt"),
        Lang::Spa => Some("es"),
        Lang::Fra => Some("fr"),
        Lang::Deu => Some("de"),
        Lang::Ita => Some("it"),
        Lang::Nld => Some("nl"),
        Lang::Rus => Some("ru"),
        _ => None,
    };
    code.map(str::to_string).unwrap_or_else(|| lang.code().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unknown() {
        assert_eq!(detect_language("hi"), "unknown");
    }

    #[test]
    fn detects_english() {
        let text = "The quick brown fox jumps over the lazy dog near the riverbank every single morning.";
        assert_eq!(detect_language(text), "en");
    }
}
