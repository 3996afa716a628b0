//! # Bounded Text
//!
//! Free-text fields on a swap request. Lengths are counted in Unicode scalar
//! values, not bytes, so a 500-character limit means the same thing to the
//! client as it does here.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Upper bound for skill names and categories.
pub const SKILL_LABEL_MAX_CHARS: usize = 255;

/// Upper bound for request and response messages.
pub const NOTE_MAX_CHARS: usize = 500;

/// A required, trimmed skill name or category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SkillLabel(String);

impl SkillLabel {
    /// Trim and validate a label for the named field.
    ///
    /// # Errors
    ///
    /// [`ValidationError::Blank`] if nothing remains after trimming,
    /// [`ValidationError::TooLong`] above [`SKILL_LABEL_MAX_CHARS`].
    pub fn new(field: &'static str, value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Blank { field });
        }
        let actual = trimmed.chars().count();
        if actual > SKILL_LABEL_MAX_CHARS {
            return Err(ValidationError::TooLong {
                field,
                max: SKILL_LABEL_MAX_CHARS,
                actual,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for SkillLabel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new("skill", raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for SkillLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for SkillLabel {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// An optional, trimmed message of at most [`NOTE_MAX_CHARS`] characters.
///
/// Absence is represented as the empty note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Note(String);

impl Note {
    /// Trim and bound a message for the named field.
    ///
    /// # Errors
    ///
    /// [`ValidationError::TooLong`] above [`NOTE_MAX_CHARS`].
    pub fn new(field: &'static str, value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = value.as_ref().trim();
        let actual = trimmed.chars().count();
        if actual > NOTE_MAX_CHARS {
            return Err(ValidationError::TooLong {
                field,
                max: NOTE_MAX_CHARS,
                actual,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Convert an optional input, treating `None` as empty.
    ///
    /// # Errors
    ///
    /// Same as [`Note::new`].
    pub fn from_optional(
        field: &'static str,
        value: Option<&str>,
    ) -> Result<Self, ValidationError> {
        value.map_or_else(|| Ok(Self::default()), |v| Self::new(field, v))
    }

    /// The empty note.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Return the note as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the note is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Note {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new("message", raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn skill_label_is_trimmed() {
        let label = SkillLabel::new("skillRequested", "  Guitar  ").unwrap();
        assert_eq!(label, "Guitar");
    }

    #[test]
    fn blank_skill_label_rejected() {
        let err = SkillLabel::new("skillCategory", " \t ").unwrap_err();
        assert_eq!(
            err,
            ValidationError::Blank {
                field: "skillCategory"
            }
        );
    }

    #[test]
    fn note_at_limit_accepted() {
        let text = "a".repeat(NOTE_MAX_CHARS);
        assert!(Note::new("message", &text).is_ok());
    }

    #[test]
    fn note_over_limit_rejected() {
        let text = "a".repeat(NOTE_MAX_CHARS + 1);
        let err = Note::new("responseMessage", &text).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TooLong {
                field: "responseMessage",
                actual: 501,
                ..
            }
        ));
    }

    #[test]
    fn note_limit_counts_characters_not_bytes() {
        // 500 two-byte characters are 1000 bytes but still within the limit.
        let text = "é".repeat(NOTE_MAX_CHARS);
        assert!(Note::new("message", &text).is_ok());
    }

    #[test]
    fn missing_note_is_empty() {
        let note = Note::from_optional("message", None).unwrap();
        assert!(note.is_empty());
    }

    #[test]
    fn deserialize_routes_through_validation() {
        let result: Result<SkillLabel, _> = serde_json::from_str("\"   \"");
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn accepted_labels_are_never_blank(s in ".{0,300}") {
            if let Ok(label) = SkillLabel::new("skill", &s) {
                prop_assert!(!label.as_str().trim().is_empty());
                prop_assert_eq!(label.as_str(), label.as_str().trim());
            }
        }
    }
}
