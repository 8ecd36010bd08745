//! Environment variable lookup helpers.
//!
//! Every helper reads from an [`EnvSnapshot`] and walks a primary key followed
//! by its alias chain, so fallback logic lives in one place.

use super::EnvSnapshot;

fn lookup<'a>(env: &'a EnvSnapshot, primary: &str, aliases: &[&str]) -> Option<&'a str> {
    env.get_str(primary)
        .or_else(|| aliases.iter().find_map(|a| env.get_str(a)))
}

/// Read the primary key or an alias, falling back to `default` when unset or empty.
pub fn env_or<F>(env: &EnvSnapshot, primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    lookup(env, primary, aliases)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(default)
}

/// Read the primary key or an alias. Empty (after trimming) counts as unset.
pub fn env_optional(env: &EnvSnapshot, primary: &str, aliases: &[&str]) -> Option<String> {
    lookup(env, primary, aliases).and_then(|s| {
        let s = s.trim();
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    })
}

/// Parse a boolean variable: 0/false/no/off are false, any other value is true.
pub fn env_bool(env: &EnvSnapshot, primary: &str, aliases: &[&str], default: bool) -> bool {
    match lookup(env, primary, aliases) {
        Some(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}
