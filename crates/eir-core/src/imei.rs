//! IMEI normalisation and Luhn validation.
//!
//! Same shape as the teacher's `Cpf`: clean non-digit characters, validate
//! length, then validate a checksum digit over the cleaned string. CPF uses
//! a sum-of-weighted-digits mod 11 algorithm; IMEI uses Luhn (mod 10) over
//! the 15-digit TAC+SNR+check-digit string.

use crate::error::EirError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Imei {
    /// Always the 15-digit form used for validation and storage, even when
    /// the caller supplied 16 digits (IMEISV — software version dropped).
    number: String,
}

impl Imei {
    pub fn new(input: &str) -> Result<Self, EirError> {
        let cleaned = Self::clean(input);

        if !Self::is_valid_length(&cleaned) {
            return Err(EirError::InvalidImei(format!(
                "expected 14-16 digits, got {}",
                cleaned.len()
            )));
        }

        // 14 digits: no check digit present, nothing to validate yet but
        // accept as-is (some legacy MEs report TAC+SNR without check digit).
        // 15 or 16 digits: validate Luhn over the first 15.
        let validated = if cleaned.len() >= 15 {
            let core = &cleaned[..15];
            if !Self::validate_luhn(core) {
                return Err(EirError::InvalidImei(format!(
                    "Luhn checksum failed for IMEI: {}",
                    input
                )));
            }
            core.to_string()
        } else {
            cleaned
        };

        Ok(Self { number: validated })
    }

    pub fn as_str(&self) -> &str {
        &self.number
    }

    /// First 8 digits: Type Allocation Code.
    pub fn manufacturer_tac(&self) -> Option<String> {
        if self.number.len() >= 8 {
            Some(self.number[..8].to_string())
        } else {
            None
        }
    }

    fn clean(input: &str) -> String {
        input.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    fn is_valid_length(cleaned: &str) -> bool {
        matches!(cleaned.len(), 14..=16) && cleaned.chars().all(|c| c.is_ascii_digit())
    }

    /// Standard Luhn: double every second digit counting from the right
    /// (the rightmost, the check digit itself, is left undoubled), sum,
    /// and require the total to be a multiple of 10.
    fn validate_luhn(digits: &str) -> bool {
        let mut sum = 0u32;
        for (i, c) in digits.chars().rev().enumerate() {
            let mut d = c.to_digit(10).unwrap();
            if i % 2 == 1 {
                d *= 2;
                if d > 9 {
                    d -= 9;
                }
            }
            sum += d;
        }
        sum % 10 == 0
    }
}

impl std::fmt::Display for Imei {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number)
    }
}

impl TryFrom<&str> for Imei {
    type Error = EirError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Imei::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_15_digit_imei() {
        let imei = Imei::new("490154203237518").unwrap();
        assert_eq!(imei.as_str(), "490154203237518");
        assert_eq!(imei.manufacturer_tac().unwrap(), "49015420");
    }

    #[test]
    fn accepts_imeisv_by_truncating_to_15() {
        // IMEISV appends a 2-digit software version; only the first 15 are
        // validated and stored.
        let imei = Imei::new("4901542032375189").unwrap();
        assert_eq!(imei.as_str(), "490154203237518");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Imei::new("12345").is_err());
        assert!(Imei::new("1234567890123456789").is_err());
    }

    #[test]
    fn rejects_bad_checksum() {
        assert!(Imei::new("490154203237519").is_err());
    }

    #[test]
    fn strips_formatting_characters() {
        let imei = Imei::new("49-015420-323751-8").unwrap();
        assert_eq!(imei.as_str(), "490154203237518");
    }
}
