//! Secret masking for logs and command output.
//!
//! Hook commands and provider CLIs occasionally echo credential values
//! (connection strings, tokens) on stdout or stderr. Everything appended to
//! the setup log passes through an [`OutputMasker`] populated with the
//! credential values the run resolved.

use std::collections::HashMap;

use crate::config::CredentialStore;

/// Credential keys whose values are masked in setup logs when present.
const MASKED_KEYS: &[&str] = &[
    "GITHUB_API_TOKEN",
    "YC_OAUTH_TOKEN",
    "DB_ADMIN_PASSWORD",
];

/// Masks secret values in output strings.
///
/// # Example
///
/// ```
/// use groundwork::secrets::OutputMasker;
///
/// let mut masker = OutputMasker::new();
/// masker.add_secret("super-secret-value");
///
/// let output = masker.mask("The key is super-secret-value here");
/// assert_eq!(output, "The key is [REDACTED] here");
/// ```
pub struct OutputMasker {
    /// Map of secret values to their masked representation.
    secrets: HashMap<String, String>,
    /// The mask string to use.
    mask: String,
}

impl OutputMasker {
    /// Create a new masker with default mask string.
    pub fn new() -> Self {
        Self {
            secrets: HashMap::new(),
            mask: "[REDACTED]".to_string(),
        }
    }

    /// Create a masker seeded with the well-known credential values from a
    /// store.
    pub fn from_store(store: &dyn CredentialStore) -> Self {
        let mut masker = Self::new();
        for key in MASKED_KEYS {
            if let Some(value) = store.lookup(key) {
                masker.add_secret(value);
            }
        }
        masker
    }

    /// Register a secret value to be masked.
    ///
    /// Empty strings are ignored.
    pub fn add_secret(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.secrets.insert(value, self.mask.clone());
        }
    }

    /// Mask any secret values in the given string.
    pub fn mask(&self, input: &str) -> String {
        let mut result = input.to_string();
        for (secret, mask) in &self.secrets {
            result = result.replace(secret, mask);
        }
        result
    }

    /// Get the number of registered secrets.
    pub fn secret_count(&self) -> usize {
        self.secrets.len()
    }
}

impl Default for OutputMasker {
    fn default() -> Self {
        Self::new()
    }
}
