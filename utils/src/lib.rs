//! # Relay Utilities
//!
//! Prompt normalization, cache keys, id generation and prompt fingerprints.
//!
//! Cache keys are a pure function of `(model, normalized prompt)`, so two
//! prompts that differ only in case or whitespace always share an entry.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Model segment used in cache keys when a request names no model.
pub const DEFAULT_MODEL_KEY: &str = "default";

/// Lowercase a prompt and collapse every whitespace run into one space.
///
/// # Examples
///
/// ```
/// use utils::normalize_prompt;
///
/// assert_eq!(normalize_prompt("  Hello \n  World "), "hello world");
/// ```
#[must_use]
pub fn normalize_prompt(prompt: &str) -> String {
    prompt
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Build the response-cache key for a model and prompt.
#[must_use]
pub fn cache_key(model: Option<&str>, prompt: &str) -> String {
    format!(
        "{}:{}",
        model.unwrap_or(DEFAULT_MODEL_KEY),
        normalize_prompt(prompt)
    )
}

/// Generate a process-unique identifier with a readable prefix.
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Count whitespace-separated words.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Short SHA-256 fingerprint of a prompt, safe to put in log lines.
#[must_use]
pub fn prompt_fingerprint(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}

/// Render a JSON value as conversation text: strings verbatim, everything
/// else as compact JSON.
#[must_use]
pub fn stringify_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cache_key_ignores_case_and_whitespace() {
        assert_eq!(
            cache_key(Some("gpt"), "Hello   world"),
            cache_key(Some("gpt"), "hello world")
        );
        assert_eq!(cache_key(Some("gpt"), "hello world"), "gpt:hello world");
    }

    #[test]
    fn test_cache_key_default_model() {
        assert_eq!(cache_key(None, "Hi"), "default:hi");
        assert_ne!(cache_key(None, "hi"), cache_key(Some("gpt"), "hi"));
    }

    #[test]
    fn test_generate_id_uniqueness() {
        let first = generate_id("cmpl");
        let second = generate_id("cmpl");
        assert_ne!(first, second);
        assert!(first.starts_with("cmpl-"));
    }

    #[test]
    fn test_prompt_fingerprint_is_stable() {
        assert_eq!(prompt_fingerprint("abc"), prompt_fingerprint("abc"));
        assert_ne!(prompt_fingerprint("abc"), prompt_fingerprint("abd"));
        assert_eq!(prompt_fingerprint("abc").len(), 12);
    }

    #[test]
    fn test_stringify_value() {
        assert_eq!(stringify_value(&serde_json::json!("plain")), "plain");
        assert_eq!(
            stringify_value(&serde_json::json!({"answer": 42})),
            r#"{"answer":42}"#
        );
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count(" one  two\tthree\n"), 3);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(prompt in "\\PC*") {
            let once = normalize_prompt(&prompt);
            prop_assert_eq!(normalize_prompt(&once), once);
        }

        #[test]
        fn prop_key_insensitive_to_spacing(words in proptest::collection::vec("[a-zA-Z]{1,8}", 1..6), gap in 1usize..4) {
            let tight = words.join(" ");
            let loose = words.join(&" ".repeat(gap));
            prop_assert_eq!(
                cache_key(Some("m"), &tight.to_uppercase()),
                cache_key(Some("m"), &format!("  {loose} "))
            );
        }
    }
}
