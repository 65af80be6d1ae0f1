//! Token resolution for card text.
//!
//! Card text carries two kinds of placeholders written as `{{ name }}`:
//!
//! - **Static tokens** are resolved once, at publish time, from a table
//!   supplied with the invocation. The result is identical for every user.
//! - **Profile tokens** live under the reserved `profile.` namespace and are
//!   resolved later, per user, by the renderer. Publish-time resolution never
//!   touches them.
//!
//! Resolution is a single pass: a replacement value that itself contains
//! `{{...}}` is emitted literally and never expanded again.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex_lite::{Captures, Regex};

/// Reserved namespace for tokens resolved at render time.
pub const PROFILE_PREFIX: &str = "profile.";

/// Static token name → literal replacement value.
pub type TokenTable = BTreeMap<String, String>;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("Invalid token pattern"));

/// Whether a trimmed token name belongs to the profile namespace.
pub fn is_profile_token(name: &str) -> bool {
    name.starts_with(PROFILE_PREFIX)
}

/// Resolve static tokens in `text`.
///
/// Profile tokens and tokens missing from `tokens` are left exactly as
/// written, including their original whitespace.
///
/// ```
/// use cardpress_core::token::{resolve, TokenTable};
///
/// let mut tokens = TokenTable::new();
/// tokens.insert("env.brand".into(), "Acme".into());
/// assert_eq!(
///     resolve("Hi {{ env.brand }}, {{profile.name}}", &tokens),
///     "Hi Acme, {{profile.name}}"
/// );
/// ```
pub fn resolve(text: &str, tokens: &TokenTable) -> String {
    if text.is_empty() {
        return String::new();
    }

    TOKEN_PATTERN
        .replace_all(text, |caps: &Captures<'_>| {
            let name = caps[1].trim();
            if is_profile_token(name) {
                return caps[0].to_string();
            }
            match tokens.get(name) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Render-time pass: substitute `{{ profile.<key> }}` from per-user values.
///
/// Only profile tokens are considered; static tokens and profile keys with no
/// value are left untouched.
pub fn render_profile(text: &str, profile: &HashMap<String, String>) -> String {
    if text.is_empty() {
        return String::new();
    }

    TOKEN_PATTERN
        .replace_all(text, |caps: &Captures<'_>| {
            let value = caps[1]
                .trim()
                .strip_prefix(PROFILE_PREFIX)
                .and_then(|key| profile.get(key));
            match value {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Trimmed names of every token in `text`, in order of appearance.
pub fn token_names(text: &str) -> Vec<String> {
    TOKEN_PATTERN
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

/// Non-profile tokens in `text` that have no entry in `tokens`.
///
/// These pass through resolution untouched, which usually means the static
/// table is missing a value.
pub fn unresolved_static_tokens(text: &str, tokens: &TokenTable) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for name in token_names(text) {
        if !is_profile_token(&name) && !tokens.contains_key(&name) && !missing.contains(&name) {
            missing.push(name);
        }
    }
    missing
}
