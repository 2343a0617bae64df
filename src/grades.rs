//! The one place string cells become numbers.

/// Parses a final-score cell. Blank, `-` and anything that is not a finite
/// number mean "not graded yet". A comma decimal separator is accepted.
pub fn parse_score(raw: &str) -> Option<f64> {
    let cell = raw.trim();
    if cell.is_empty() {
        return None;
    }
    let value: f64 = if cell.contains(',') && !cell.contains('.') {
        cell.replace(',', ".").parse().ok()?
    } else {
        cell.parse().ok()?
    };
    value.is_finite().then_some(value)
}

/// Parses a credit cell, falling back to 0.
pub fn parse_credits(raw: &str) -> u32 {
    raw.trim().parse().unwrap_or(0)
}

/// `F` and `F+` are the only failing letters.
pub fn is_fail_grade(letter: &str) -> bool {
    matches!(letter.trim().to_ascii_uppercase().as_str(), "F" | "F+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_scores_stay_absent() {
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("  "), None);
        assert_eq!(parse_score("-"), None);
        assert_eq!(parse_score("abc"), None);
        assert_eq!(parse_score("NaN"), None);
        assert_eq!(parse_score("inf"), None);
    }

    #[test]
    fn zero_is_a_real_score() {
        assert_eq!(parse_score("0"), Some(0.0));
        assert_eq!(parse_score("0.0"), Some(0.0));
    }

    #[test]
    fn accepts_comma_decimals() {
        assert_eq!(parse_score(" 7,5 "), Some(7.5));
        assert_eq!(parse_score("8.25"), Some(8.25));
        assert_eq!(parse_score("1,234.5"), None);
    }

    #[test]
    fn credits_default_to_zero() {
        assert_eq!(parse_credits("3"), 3);
        assert_eq!(parse_credits(" 4 "), 4);
        assert_eq!(parse_credits(""), 0);
        assert_eq!(parse_credits("three"), 0);
        assert_eq!(parse_credits("-2"), 0);
    }

    #[test]
    fn only_f_and_f_plus_fail() {
        assert!(is_fail_grade("F"));
        assert!(is_fail_grade(" f+ "));
        assert!(!is_fail_grade("D"));
        assert!(!is_fail_grade("D+"));
        assert!(!is_fail_grade(""));
    }
}
