//! Application-number generation and check-digit validation.
//!
//! Layout (15 ASCII characters):
//!
//! ```text
//! CC YYYY T SSSSSSS K
//! |  |    | |       +-- check character: weighted sum mod 11, 10 => 'X'
//! |  |    | +---------- 7-digit serial
//! |  |    +------------ 1-digit sub-type code
//! |  +----------------- 4-digit year
//! +-------------------- 2-letter country code
//! ```
//!
//! The check character weights each of the first 14 characters by its
//! 1-based position. Country letters contribute zero but still occupy
//! positions 1 and 2, so the digit weights start at 3.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use crate::error::CoreError;

/// Total length of an application number.
pub const APPLICATION_NUMBER_LEN: usize = 15;

/// Number of distinct 7-digit serials.
const SERIAL_SPACE: u64 = 10_000_000;

/// Compute the check character for the 14-character body of a number.
pub fn check_character(body: &str) -> char {
    let sum: u32 = body
        .chars()
        .enumerate()
        .map(|(i, c)| c.to_digit(10).unwrap_or(0) * (i as u32 + 1))
        .sum();
    match sum % 11 {
        10 => 'X',
        r => char::from_digit(r, 10).unwrap_or('X'),
    }
}

/// Verify that `number` is well-formed and its last character matches the
/// recomputed check character.
pub fn validate(number: &str) -> Result<(), CoreError> {
    if number.len() != APPLICATION_NUMBER_LEN || !number.is_ascii() {
        return Err(CoreError::Format(format!(
            "Application number must be {APPLICATION_NUMBER_LEN} ASCII characters, got '{number}'"
        )));
    }
    let (body, check) = number.split_at(APPLICATION_NUMBER_LEN - 1);
    validate_country(&body[..2])?;
    if !body[2..].bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::Format(format!(
            "Application number '{number}' must have 12 digits after the country code"
        )));
    }
    let expected = check_character(body);
    if check.chars().next() != Some(expected) {
        return Err(CoreError::Format(format!(
            "Application number '{number}' has check character '{check}', expected '{expected}'"
        )));
    }
    Ok(())
}

/// Check that `country` is two uppercase ASCII letters.
pub fn validate_country(country: &str) -> Result<(), CoreError> {
    if country.len() != 2 || !country.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(CoreError::Format(format!(
            "Country code must be 2 uppercase ASCII letters, got '{country}'"
        )));
    }
    Ok(())
}

fn validate_digits(field: &str, value: &str, len: usize) -> Result<(), CoreError> {
    if value.len() != len || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::Format(format!(
            "{field} must be exactly {len} digit(s), got '{value}'"
        )));
    }
    Ok(())
}

/// Issues application numbers with process-unique serials.
///
/// Serials come from an atomic counter that starts at a random offset, so
/// concurrent callers never observe the same serial within a process and
/// restarts are unlikely to replay a recent range. The `uq_assets_application_number`
/// constraint remains the final arbiter across processes.
#[derive(Debug)]
pub struct ApplicationNumberGenerator {
    next: AtomicU64,
}

impl Default for ApplicationNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationNumberGenerator {
    /// Create a generator seeded from the thread RNG.
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random_range(0..SERIAL_SPACE))
    }

    /// Create a generator whose first serial is `seed % 10_000_000`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }

    fn next_serial(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) % SERIAL_SPACE
    }

    /// Build a new application number.
    ///
    /// Fails with [`CoreError::Format`] if `country` is not two uppercase
    /// letters, `year` is not four digits, or `type_code` is not one digit.
    pub fn generate(&self, country: &str, year: &str, type_code: &str) -> Result<String, CoreError> {
        validate_country(country)?;
        validate_digits("Year", year, 4)?;
        validate_digits("Type code", type_code, 1)?;

        let body = format!("{country}{year}{type_code}{:07}", self.next_serial());
        let check = check_character(&body);
        Ok(format!("{body}{check}"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn generated_number_has_expected_layout() {
        let gen = ApplicationNumberGenerator::with_seed(42);
        let number = gen.generate("CN", "2024", "1").unwrap();
        assert_eq!(number.len(), APPLICATION_NUMBER_LEN);
        assert!(number.starts_with("CN20241"));
        assert_eq!(&number[7..14], "0000042");
        validate(&number).unwrap();
    }

    #[test]
    fn check_character_known_value() {
        // digits 2,0,2,4,1,0,0,0,0,0,4,2 at positions 3..=14
        // 2*3 + 0*4 + 2*5 + 4*6 + 1*7 + 4*13 + 2*14 = 127; 127 % 11 = 6
        assert_eq!(check_character("CN202410000042"), '6');
    }

    #[test]
    fn remainder_ten_maps_to_x() {
        // 1*3 + 1*4 = 7, then serial digit d at position 14: 7 + 14d = 10 mod 11
        // d = 1 -> 21 % 11 = 10
        assert_eq!(check_character("CN110000000001"), 'X');
        validate("CN110000000001X").unwrap();
    }

    #[test]
    fn every_generated_number_validates() {
        let gen = ApplicationNumberGenerator::with_seed(9_999_990);
        for _ in 0..50 {
            let number = gen.generate("US", "2025", "3").unwrap();
            validate(&number).unwrap();
        }
    }

    #[test]
    fn serial_wraps_within_seven_digits() {
        let gen = ApplicationNumberGenerator::with_seed(SERIAL_SPACE - 1);
        let a = gen.generate("CN", "2024", "2").unwrap();
        let b = gen.generate("CN", "2024", "2").unwrap();
        assert_eq!(&a[7..14], "9999999");
        assert_eq!(&b[7..14], "0000000");
    }

    #[test]
    fn wrong_field_lengths_fail_with_format_error() {
        let gen = ApplicationNumberGenerator::with_seed(0);
        assert!(matches!(gen.generate("CHN", "2024", "1"), Err(CoreError::Format(_))));
        assert!(matches!(gen.generate("CN", "24", "1"), Err(CoreError::Format(_))));
        assert!(matches!(gen.generate("CN", "2024", "12"), Err(CoreError::Format(_))));
        assert!(matches!(gen.generate("cn", "2024", "1"), Err(CoreError::Format(_))));
        assert!(matches!(gen.generate("CN", "20a4", "1"), Err(CoreError::Format(_))));
    }

    #[test]
    fn validate_rejects_tampered_number() {
        let gen = ApplicationNumberGenerator::with_seed(1234);
        let number = gen.generate("CN", "2024", "1").unwrap();
        let mut tampered: Vec<char> = number.chars().collect();
        tampered[9] = if tampered[9] == '5' { '6' } else { '5' };
        let tampered: String = tampered.into_iter().collect();
        assert!(validate(&tampered).is_err());
        assert!(validate("CN2024").is_err());
    }

    #[test]
    fn concurrent_generation_yields_unique_serials() {
        let gen = Arc::new(ApplicationNumberGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gen = Arc::clone(&gen);
                std::thread::spawn(move || {
                    (0..500)
                        .map(|_| gen.generate("CN", "2024", "1").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for number in handle.join().unwrap() {
                assert!(seen.insert(number), "duplicate application number");
            }
        }
        assert_eq!(seen.len(), 4000);
    }
}
