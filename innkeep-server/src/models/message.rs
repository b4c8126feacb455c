//! Support chat message text

use super::ValidationError;

/// Maximum length for message text (64KB)
const MAX_TEXT_LEN: usize = 65536;

/// Validated chat message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageText(String);

impl MessageText {
    /// Create new message text.
    ///
    /// # Rules
    /// - Must contain something other than whitespace
    /// - Max 64KB (65536 bytes)
    ///
    /// Surrounding whitespace is kept as typed.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.trim().is_empty() {
            return Err(ValidationError::Empty { field: "text" });
        }

        if s.len() > MAX_TEXT_LEN {
            return Err(ValidationError::TooLong {
                field: "text",
                max: MAX_TEXT_LEN,
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
