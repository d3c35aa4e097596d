//! Password strength grading
//!
//! A password earns one point for each of: at least 8 characters, at least
//! 12 characters, both ASCII lower- and uppercase letters, an ASCII digit,
//! and any character outside `[A-Za-z0-9]`. The score maps to a grade:
//!
//! ```text
//! 0..=1  Weak
//! 2      Fair
//! 3      Good
//! 4..=5  Strong
//! ```
//!
//! The grade is advisory. Nothing in the engine refuses a weak password.

use std::fmt;

/// Password strength classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PasswordStrength {
    Weak,
    Fair,
    Good,
    Strong,
}

impl PasswordStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            PasswordStrength::Weak => "weak",
            PasswordStrength::Fair => "fair",
            PasswordStrength::Good => "good",
            PasswordStrength::Strong => "strong",
        }
    }

    /// Weak and fair passwords are worth a warning before encrypting.
    pub fn is_weak(&self) -> bool {
        *self <= PasswordStrength::Fair
    }
}

impl fmt::Display for PasswordStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score a password on length and character classes.
pub fn strength_score(password: &str) -> u8 {
    let len = password.chars().count();
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_ascii_alphanumeric());

    (len >= 8) as u8
        + (len >= 12) as u8
        + (has_lower && has_upper) as u8
        + has_digit as u8
        + has_symbol as u8
}

/// Grade a password.
pub fn analyze_strength(password: &str) -> PasswordStrength {
    match strength_score(password) {
        0..=1 => PasswordStrength::Weak,
        2 => PasswordStrength::Fair,
        3 => PasswordStrength::Good,
        _ => PasswordStrength::Strong,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_password_scores_zero() {
        assert_eq!(strength_score(""), 0);
        assert_eq!(analyze_strength(""), PasswordStrength::Weak);
    }

    #[test]
    fn test_length_thresholds() {
        assert_eq!(strength_score("abcdefg"), 0);
        assert_eq!(strength_score("abcdefgh"), 1);
        assert_eq!(strength_score("abcdefghijk"), 1);
        assert_eq!(strength_score("abcdefghijkl"), 2);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 7 characters, 14 bytes
        assert_eq!(strength_score("ééééééé"), 1);
    }

    #[test]
    fn test_mixed_case_needs_both() {
        assert_eq!(strength_score("abc"), 0);
        assert_eq!(strength_score("ABC"), 0);
        assert_eq!(strength_score("aBc"), 1);
    }

    #[test]
    fn test_digit_point() {
        assert_eq!(strength_score("abc1"), 1);
    }

    #[test]
    fn test_symbol_point() {
        assert_eq!(strength_score("abc!"), 1);
        assert_eq!(strength_score("a b"), 1);
        assert_eq!(strength_score("abcé"), 1);
    }

    #[test]
    fn test_grade_boundaries() {
        // score 1
        assert_eq!(analyze_strength("password"), PasswordStrength::Weak);
        // score 2
        assert_eq!(analyze_strength("password1"), PasswordStrength::Fair);
        // score 3
        assert_eq!(analyze_strength("Password1"), PasswordStrength::Good);
        // score 4
        assert_eq!(analyze_strength("Password1!"), PasswordStrength::Strong);
        // score 5
        assert_eq!(analyze_strength("Password1!xyz"), PasswordStrength::Strong);
    }

    #[test]
    fn test_short_complex_password_is_good() {
        // mixed case, digit, symbol but under 8 characters
        assert_eq!(strength_score("aB1!"), 3);
        assert_eq!(analyze_strength("aB1!"), PasswordStrength::Good);
    }

    #[test]
    fn test_is_weak_and_display() {
        assert!(PasswordStrength::Weak.is_weak());
        assert!(PasswordStrength::Fair.is_weak());
        assert!(!PasswordStrength::Good.is_weak());
        assert!(!PasswordStrength::Strong.is_weak());
        assert_eq!(PasswordStrength::Strong.to_string(), "strong");
    }
}
