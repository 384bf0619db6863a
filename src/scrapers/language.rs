//! Language identification for review bodies.
//!
//! Detection is trigram-based (via `whatlang`) and keeps only the best guess;
//! the confidence score and reliability flag are discarded.

use crate::models::UNDETERMINED_LANGUAGE;
use whatlang::detect;

/// Detect the language of `text` and return its ISO-639 code.
///
/// Two-letter ISO-639-1 codes are returned where one exists; otherwise the
/// three-letter ISO-639-3 code reported by the detector. Empty or
/// undetectable text yields [`UNDETERMINED_LANGUAGE`].
pub fn detect_language(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return UNDETERMINED_LANGUAGE.to_string();
    }

    match detect(trimmed) {
        Some(info) => iso_639_1(info.lang().code()).to_string(),
        None => UNDETERMINED_LANGUAGE.to_string(),
    }
}

fn iso_639_1(code: &'static str) -> &'static str {
    match code {
        "afr" => "af",
        "ara" => "ar",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jpn" => "ja",
        "kat" => "ka",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mkd" => "mk",
        "nld" => "nl",
        "nob" => "nb",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "slk" => "sk",
        "slv" => "sl",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tha" => "th",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "vie" => "vi",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_french_review() {
        let review = "C'est un excellent album. Les chansons sont magnifiques et \
                      la production est vraiment soignée, je le recommande à tous.";
        assert_eq!(detect_language(review), "fr");
        assert_eq!(detect_language("C'est un excellent album"), "fr");
    }

    #[test]
    fn test_detects_english_review() {
        let review = "This is an excellent album. The songs are beautiful and the \
                      production is really careful, I would recommend it to everyone.";
        assert_eq!(detect_language(review), "en");
    }

    #[test]
    fn test_empty_text_is_undetermined() {
        assert_eq!(detect_language(""), UNDETERMINED_LANGUAGE);
        assert_eq!(detect_language("   \n\t "), UNDETERMINED_LANGUAGE);
    }

    #[test]
    fn test_unmapped_codes_pass_through() {
        assert_eq!(iso_639_1("tgl"), "tgl");
        assert_eq!(iso_639_1("deu"), "de");
    }
}
