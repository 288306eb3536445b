use crate::constants::MAX_DIFFICULTY;
use crate::error::{LedgerError, Result};

/// Length of the run of `'0'` characters at the start of a hex digest.
pub fn count_leading_hex_zeros(hash: &str) -> usize {
    hash.bytes().take_while(|b| *b == b'0').count()
}

/// Accepts difficulties a SHA-256 hex digest can actually satisfy.
pub fn check_difficulty(difficulty: usize) -> Result<usize> {
    if difficulty > MAX_DIFFICULTY {
        return Err(LedgerError::Validation(format!(
            "difficulty {difficulty} exceeds the {MAX_DIFFICULTY} hex digits of a block hash"
        )));
    }
    Ok(difficulty)
}

pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    count_leading_hex_zeros(hash) >= difficulty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_hex_zero_examples() {
        assert_eq!(count_leading_hex_zeros(""), 0);
        assert_eq!(count_leading_hex_zeros("abc"), 0);
        assert_eq!(count_leading_hex_zeros("0abc"), 1);
        assert_eq!(count_leading_hex_zeros("000f00"), 3);
        assert_eq!(count_leading_hex_zeros(&"0".repeat(64)), 64);
    }

    #[test]
    fn difficulty_beyond_digest_length_is_rejected() {
        assert_eq!(check_difficulty(0).unwrap(), 0);
        assert_eq!(check_difficulty(64).unwrap(), 64);
        assert!(matches!(
            check_difficulty(65),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn difficulty_zero_accepts_anything() {
        assert!(meets_difficulty("ffff", 0));
        assert!(meets_difficulty("00ff", 2));
        assert!(!meets_difficulty("0fff", 2));
    }
}
