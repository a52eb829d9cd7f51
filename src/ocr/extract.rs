use anyhow::Result;
use regex::Regex;
use tracing::debug;

/// Ejection fraction label followed by its value:
/// - `FE` (Spanish) or `EF` (English), any case, as a word or as `LVEF`
/// - an optional method qualifier in parentheses: `EF(Teich)`
/// - optional separators: whitespace, punctuation, `=`
/// - a decimal number with `.` or `,`: 60, 55.3, 55,3
const EF_PATTERN: &str = r"(?i)(?:\b|LV)(?:FE|EF)(?:\s*\([^)\d]*\))?[\s\p{P}=]*(\d+(?:[.,]\d+)?)";

/// Stored when no ejection fraction is found in the recognized text.
pub const NO_SUGGESTION: &str = "---";

/// Returns the first ejection fraction value in `text`, with a decimal
/// comma written as a point.
pub fn extract_ejection_fraction(text: &str) -> Result<Option<String>> {
    let ef_regex = Regex::new(EF_PATTERN)?;

    let value = ef_regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace(',', "."));

    debug!("Ejection fraction match: {:?}", value);
    Ok(value)
}

/// Like [`extract_ejection_fraction`], but falls back to [`NO_SUGGESTION`].
pub fn suggest_ejection_fraction(text: &str) -> Result<String> {
    Ok(extract_ejection_fraction(text)?.unwrap_or_else(|| NO_SUGGESTION.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fe_with_colon_and_decimal() {
        assert_eq!(suggest_ejection_fraction("FE: 55.3").unwrap(), "55.3");
    }

    #[test]
    fn test_ef_with_space() {
        assert_eq!(suggest_ejection_fraction("EF 60").unwrap(), "60");
    }

    #[test]
    fn test_no_token_is_placeholder() {
        assert_eq!(
            suggest_ejection_fraction("HR 72 bpm\nIVSd 0.9 cm").unwrap(),
            "---"
        );
        assert_eq!(suggest_ejection_fraction("").unwrap(), "---");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(suggest_ejection_fraction("fe=48").unwrap(), "48");
        assert_eq!(suggest_ejection_fraction("Ef - 62.5 %").unwrap(), "62.5");
    }

    #[test]
    fn test_embedded_in_ocr_noise() {
        let text = "LVIDd 4.8 cm\nLVIDs 3.1 cm\nLVEF(Teich) ...\nFE(Teich)\nEF: 64 %\nFS 35 %";
        assert_eq!(suggest_ejection_fraction(text).unwrap(), "64");
    }

    #[test]
    fn test_lvef_label_matches() {
        assert_eq!(suggest_ejection_fraction("LVEF 58").unwrap(), "58");
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(suggest_ejection_fraction("EF 55\nFE 70").unwrap(), "55");
    }

    #[test]
    fn test_punctuation_after_label() {
        assert_eq!(suggest_ejection_fraction("EF. 60").unwrap(), "60");
        assert_eq!(suggest_ejection_fraction("FE %: 58").unwrap(), "58");
        assert_eq!(suggest_ejection_fraction("EF (%) 61").unwrap(), "61");
    }

    #[test]
    fn test_method_qualifier() {
        assert_eq!(suggest_ejection_fraction("EF(Teich) 64 %").unwrap(), "64");
        assert_eq!(suggest_ejection_fraction("FE (Simpson): 57.5").unwrap(), "57.5");
    }

    #[test]
    fn test_decimal_comma_becomes_point() {
        assert_eq!(suggest_ejection_fraction("FE: 55,3").unwrap(), "55.3");
        assert_eq!(suggest_ejection_fraction("EF 60, FS 32").unwrap(), "60");
    }

    #[test]
    fn test_label_inside_other_words_ignored() {
        assert_eq!(suggest_ejection_fraction("REF 12 EF 60").unwrap(), "60");
        assert_eq!(suggest_ejection_fraction("CAFE 3\nFE 52").unwrap(), "52");
    }

    #[test]
    fn test_label_without_number_is_none() {
        assert_eq!(extract_ejection_fraction("EF: n/a").unwrap(), None);
    }
}
