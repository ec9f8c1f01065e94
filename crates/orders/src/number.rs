//! Human-readable order number generation.
//!
//! Format: `NS-<YYYYMMDD><4 random digits>`, e.g. `NS-202608251234`.
//! The 4-digit suffix is drawn independently per attempt; uniqueness is
//! guaranteed by the store's unique constraint plus regeneration on
//! collision, not by the random space alone.

use chrono::NaiveDate;
use rand::Rng;

/// Prefix shared by all order numbers.
pub const PREFIX: &str = "NS-";

/// Generates an order number for the given creation date (UTC).
pub fn generate(date: NaiveDate) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("{PREFIX}{}{suffix:04}", date.format("%Y%m%d"))
}

/// Returns true if `s` has the `NS-` + 12 digits shape.
pub fn matches_format(s: &str) -> bool {
    s.strip_prefix(PREFIX)
        .is_some_and(|digits| digits.len() == 12 && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    #[test]
    fn generated_numbers_match_the_format() {
        for _ in 0..100 {
            let number = generate(date());
            assert!(matches_format(&number), "bad number: {number}");
            assert!(number.starts_with("NS-20250307"));
        }
    }

    #[test]
    fn suffix_is_zero_padded() {
        // 16 characters total: "NS-" + 8 date digits + 4 suffix digits.
        assert_eq!(generate(date()).len(), 16);
    }

    #[test]
    fn format_check_rejects_malformed_numbers() {
        assert!(matches_format("NS-202503070042"));
        assert!(!matches_format("NS-2025030742"));
        assert!(!matches_format("NS-20250307-042"));
        assert!(!matches_format("XX-202503070042"));
        assert!(!matches_format("NS-20250307abcd"));
    }
}
