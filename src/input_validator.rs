use crate::errors::{AuthorityError, AuthorityResult, SPECIAL_CHARS};

/// Validator for free-text name fields coming from request forms.
///
/// Only the fixed special-character set is rejected; anything else is left to
/// the lookup that follows.
#[derive(Debug, Clone)]
pub struct InputValidator {
    forbidden: Vec<char>,
}

impl InputValidator {
    pub fn new() -> Self {
        Self {
            forbidden: SPECIAL_CHARS.chars().collect(),
        }
    }

    /// Reject `value` if it contains any special character.
    pub fn validate_name(&self, field: &str, value: &str) -> AuthorityResult<()> {
        if self.contains_special_chars(value) {
            tracing::warn!(field, "rejected name containing special characters");
            return Err(AuthorityError::invalid_input(field));
        }
        Ok(())
    }

    fn contains_special_chars(&self, input: &str) -> bool {
        input.chars().any(|c| self.forbidden.contains(&c))
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}
