// src/migration/sanitize.rs

//! Redaction of error text before it leaves the engine
//!
//! Outside debug mode any message that mentions a credential-like word, or
//! contains a known secret value, is replaced wholesale. In debug mode the
//! message is kept and only the values next to credential-like field names
//! (and known secret values) are masked.

use regex::Regex;
use std::sync::LazyLock;

/// Words that mark a message as possibly carrying credentials
pub const SENSITIVE_KEYWORDS: [&str; 6] = ["password", "secret", "token", "key", "credential", "auth"];

/// Replacement for a whole message outside debug mode
pub const GENERIC_MESSAGE: &str =
    "details withheld because they may contain sensitive values; re-run with debug mode for field-level detail";

/// Replacement for a single value
pub const REDACTED: &str = "[REDACTED]";

static FIELD_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b((?:[a-z_]*)(?:password|secret|token|key|credential|auth)[a-z_]*)(\s*[=:]\s*)("[^"]*"|'[^']*'|[^\s,;]+)"#,
    )
    .unwrap()
});

/// Scrubs messages for one migration run
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    debug: bool,
    secrets: Vec<String>,
}

impl Sanitizer {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            secrets: Vec::new(),
        }
    }

    /// Also mask these literal values
    pub fn with_secrets<I, S>(mut self, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secrets.extend(
            secrets
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty()),
        );
        self
    }

    pub fn sanitize(&self, message: &str) -> String {
        if self.debug {
            self.redact_fields(message)
        } else if self.is_sensitive(message) {
            GENERIC_MESSAGE.to_string()
        } else {
            message.to_string()
        }
    }

    fn is_sensitive(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        SENSITIVE_KEYWORDS.iter().any(|k| lower.contains(k))
            || self.secrets.iter().any(|s| message.contains(s.as_str()))
    }

    fn redact_fields(&self, message: &str) -> String {
        let mut redacted = message.to_string();
        for secret in &self.secrets {
            redacted = redacted.replace(secret.as_str(), REDACTED);
        }
        FIELD_VALUE
            .replace_all(&redacted, format!("${{1}}${{2}}{}", REDACTED).as_str())
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(message: &str, debug: bool) -> String {
        Sanitizer::new(debug).sanitize(message)
    }

    #[test]
    fn test_plain_message_passes_through() {
        assert_eq!(
            sanitize("transfer_configs row 4 is locked", false),
            "transfer_configs row 4 is locked"
        );
    }

    #[test]
    fn test_keyword_replaces_whole_message() {
        let out = sanitize("insert failed for 'prod password vault': disk I/O error", false);
        assert_eq!(out, GENERIC_MESSAGE);
        assert!(!out.contains("prod password vault"));
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        assert_eq!(sanitize("bad Access_Key", false), GENERIC_MESSAGE);
        assert_eq!(sanitize("OAuth refresh failed", false), GENERIC_MESSAGE);
    }

    #[test]
    fn test_known_secret_value_triggers_replacement() {
        let sanitizer = Sanitizer::new(false).with_secrets(["s3cr3tvalue"]);
        assert_eq!(sanitizer.sanitize("got s3cr3tvalue back"), GENERIC_MESSAGE);
    }

    #[test]
    fn test_debug_mode_redacts_field_values_only() {
        let sanitizer = Sanitizer::new(true).with_secrets(["hunter2"]);
        let out = sanitizer.sanitize("login failed: password=hunter2 host=files.example.com");
        assert_eq!(out, "login failed: password=[REDACTED] host=files.example.com");

        let out = sanitizer.sanitize("client_secret: \"abc def\", region: eu");
        assert_eq!(out, "client_secret: [REDACTED], region: eu");
    }

    #[test]
    fn test_debug_mode_masks_bare_secret_values() {
        let sanitizer = Sanitizer::new(true).with_secrets(["hunter2", ""]);
        assert_eq!(
            sanitizer.sanitize("unexpected value hunter2 in row"),
            "unexpected value [REDACTED] in row"
        );
    }
}
