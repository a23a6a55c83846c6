//! Validation limits applied by the mutation coordinator.

use crate::task::domain::{FieldUpdate, TaskDomainError, TaskPatch, TaskTitle};
use serde::Deserialize;

/// Length limits for caller-supplied task text.
///
/// # Examples
///
/// ```
/// use flux_board::task::services::TaskValidationConfig;
///
/// let config = TaskValidationConfig::default();
/// assert_eq!(config.max_title_chars, 200);
///
/// let strict = TaskValidationConfig::strict();
/// assert!(strict.max_description_chars < config.max_description_chars);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskValidationConfig {
    /// Maximum title length in characters.
    pub max_title_chars: usize,
    /// Maximum description length in characters.
    pub max_description_chars: usize,
}

impl Default for TaskValidationConfig {
    fn default() -> Self {
        Self {
            max_title_chars: 200,
            max_description_chars: 10_000,
        }
    }
}

impl TaskValidationConfig {
    /// Creates a lenient configuration with generous limits.
    ///
    /// Useful for imports of existing boards.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            max_title_chars: 1_000,
            max_description_chars: 100_000,
        }
    }

    /// Creates a strict configuration with reduced limits.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            max_title_chars: 80,
            max_description_chars: 2_000,
        }
    }

    /// Checks a title against the configured limit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TitleTooLong`] when the limit is exceeded.
    pub fn check_title(&self, title: &TaskTitle) -> Result<(), TaskDomainError> {
        let actual = title.as_str().chars().count();
        if actual > self.max_title_chars {
            return Err(TaskDomainError::TitleTooLong {
                max: self.max_title_chars,
                actual,
            });
        }
        Ok(())
    }

    /// Checks a description against the configured limit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DescriptionTooLong`] when the limit is
    /// exceeded.
    pub fn check_description(&self, description: Option<&str>) -> Result<(), TaskDomainError> {
        let actual = description.map_or(0, |text| text.chars().count());
        if actual > self.max_description_chars {
            return Err(TaskDomainError::DescriptionTooLong {
                max: self.max_description_chars,
                actual,
            });
        }
        Ok(())
    }

    /// Checks the text a patch would write.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] for a blank or oversized title, or an
    /// oversized description.
    pub fn check_patch(&self, patch: &TaskPatch) -> Result<(), TaskDomainError> {
        if let Some(raw) = patch.title() {
            self.check_title(&TaskTitle::new(raw)?)?;
        }
        if let FieldUpdate::Set(description) = patch.description() {
            self.check_description(Some(description))?;
        }
        Ok(())
    }
}
