//! Actual-vs-expected comparison.
//!
//! Without a tolerance the values must be equal (see [`Value`]'s Python-style equality). With a tolerance, equal
//! values still match outright; otherwise both sides must be numeric and no further apart than the tolerance.

use crate::value::Value;

/// Result of comparing one actual value to its expectation.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Match,
    /// The assertion does not hold. Counted as a failure.
    Mismatch(String),
    /// The comparison itself could not be performed. Counted as an error.
    Incomparable(String),
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Match)
    }
}

/// Compare `actual` against `expected`, optionally within an absolute `tolerance`.
pub fn check(actual: &Value, expected: &Value, tolerance: Option<f64>) -> Verdict {
    let Some(tolerance) = tolerance else {
        return if actual == expected {
            Verdict::Match
        } else {
            Verdict::Mismatch(format!("{} != {}", actual, expected))
        };
    };

    if tolerance.is_nan() || tolerance < 0.0 {
        return Verdict::Incomparable(format!("tolerance must be a non-negative number, got {}", tolerance));
    }
    if actual == expected {
        return Verdict::Match;
    }

    let (Some(a), Some(e)) = (actual.as_f64(), expected.as_f64()) else {
        return Verdict::Incomparable(format!(
            "TypeError: unsupported operand type(s) for -: '{}' and '{}'",
            actual.type_name(),
            expected.type_name()
        ));
    };

    let difference = (a - e).abs();
    if difference <= tolerance {
        Verdict::Match
    } else {
        Verdict::Mismatch(format!(
            "{} != {} within {} delta ({} difference)",
            actual, expected, tolerance, difference
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert_eq!(check(&Value::Int(4), &Value::Int(4), None), Verdict::Match);
    }

    #[test]
    fn test_exact_mismatch_message() {
        assert_eq!(
            check(&Value::Int(3), &Value::Int(4), None),
            Verdict::Mismatch("3 != 4".to_string())
        );
    }

    #[test]
    fn test_exact_comparison_ignores_float_noise_only_with_tolerance() {
        let actual = Value::Float(0.1 + 0.2);
        let expected = Value::Float(0.3);
        assert!(!check(&actual, &expected, None).is_match());
        assert!(check(&actual, &expected, Some(1e-9)).is_match());
    }

    #[test]
    fn test_tolerance_bounds() {
        let actual = Value::Float(4.05);
        let expected = Value::Float(4.0);
        assert_eq!(check(&actual, &expected, Some(0.1)), Verdict::Match);
        assert!(matches!(check(&actual, &expected, Some(0.01)), Verdict::Mismatch(_)));
    }

    #[test]
    fn test_tolerance_is_inclusive() {
        assert!(check(&Value::Int(5), &Value::Int(3), Some(2.0)).is_match());
    }

    #[test]
    fn test_tolerance_mixed_int_float() {
        assert!(check(&Value::Int(4), &Value::Float(4.2), Some(0.25)).is_match());
    }

    #[test]
    fn test_tolerance_on_equal_non_numeric_values_matches() {
        let s = Value::from("abc");
        assert_eq!(check(&s, &s.clone(), Some(0.1)), Verdict::Match);
    }

    #[test]
    fn test_tolerance_on_non_numeric_values_is_incomparable() {
        let verdict = check(&Value::from("abc"), &Value::Float(1.0), Some(0.1));
        assert_eq!(
            verdict,
            Verdict::Incomparable("TypeError: unsupported operand type(s) for -: 'str' and 'float'".to_string())
        );
    }

    #[test]
    fn test_negative_tolerance_is_incomparable() {
        assert!(matches!(
            check(&Value::Int(1), &Value::Int(1), Some(-1.0)),
            Verdict::Incomparable(_)
        ));
    }

    #[test]
    fn test_nan_tolerance_is_incomparable() {
        assert!(matches!(
            check(&Value::Float(1.0), &Value::Float(1.0), Some(f64::NAN)),
            Verdict::Incomparable(_)
        ));
    }

    #[test]
    fn test_bool_counts_as_int() {
        assert_eq!(check(&Value::Bool(true), &Value::Int(1), None), Verdict::Match);
        assert_eq!(check(&Value::Bool(true), &Value::Float(1.05), Some(0.1)), Verdict::Match);
        assert!(matches!(check(&Value::Bool(false), &Value::Int(1), None), Verdict::Mismatch(_)));
    }

    #[test]
    fn test_tuple_does_not_match_list() {
        let verdict = check(&Value::tuple([2, 1]), &Value::list([2, 1]), None);
        assert_eq!(verdict, Verdict::Mismatch("(2, 1) != [2, 1]".to_string()));
    }

    #[test]
    fn test_large_int_does_not_match_rounded_float() {
        let big = Value::Int((1 << 53) + 1);
        assert!(matches!(check(&big, &Value::Float(9_007_199_254_740_992.0), None), Verdict::Mismatch(_)));
    }
}
