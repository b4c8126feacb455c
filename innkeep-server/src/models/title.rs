//! Title validation for hotels and rooms

use super::ValidationError;

/// Maximum length for titles
const MAX_TITLE_LEN: usize = 256;

/// Validated, trimmed title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    /// Create a new title.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 256 characters
    ///
    /// # Example
    /// ```
    /// use innkeep_server::models::Title;
    ///
    /// assert!(Title::new("Grand Budapest").is_ok());
    /// assert!(Title::new("").is_err());
    /// assert!(Title::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }

        if trimmed.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_whitespace() {
        let title = Title::new("  Seaside Inn  ").unwrap();
        assert_eq!(title.as_str(), "Seaside Inn");
    }

    #[test]
    fn rejects_blank() {
        assert!(matches!(
            Title::new(" \t ").unwrap_err(),
            ValidationError::Empty { field: "title" }
        ));
    }

    #[test]
    fn counts_chars_not_bytes() {
        // Cyrillic letters are two bytes each
        let title = "ж".repeat(256);
        assert!(Title::new(&title).is_ok());

        let too_long = "ж".repeat(257);
        assert!(matches!(
            Title::new(&too_long).unwrap_err(),
            ValidationError::TooLong { max: 256, .. }
        ));
    }
}
