use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for sensitive contact data (guest phone numbers, emails) that
/// masks its value in Debug/Display output while serializing normally.
///
/// API responses need the real value; the wrapper exists to prevent
/// accidental leakage through log macros like tracing::info!("{:?}", req).
#[derive(Clone, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn as_inner(&self) -> &T {
        &self.0
    }
}

/// Redacts a phone number for operator-facing suggestion lists, keeping
/// only the trailing digits ("******7841").
pub fn redact_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 4 {
        return "*".repeat(digits.len());
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(digits.len() - 4), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_debug_output() {
        let phone = Masked("+92 300 1234567".to_string());
        assert_eq!(format!("{:?}", phone), "********");
        assert_eq!(format!("{}", phone), "********");
    }

    #[test]
    fn test_redact_phone_keeps_tail() {
        assert_eq!(redact_phone("+923001234567"), "********4567");
        assert_eq!(redact_phone("123"), "***");
    }
}
