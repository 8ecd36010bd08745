//! Immutable copy of the process environment.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Point-in-time copy of environment variables.
///
/// Taken once per run so every derived value (config, child overlay) sees the
/// same view, and so nothing has to touch the global environment afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<OsString, OsString>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        std::env::vars_os().collect()
    }

    pub fn get(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    /// Value as UTF-8; non-UTF-8 values are treated as unset.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(OsStr::to_str)
    }

    pub fn into_inner(self) -> BTreeMap<OsString, OsString> {
        self.vars
    }
}

impl<K, V> FromIterator<(K, V)> for EnvSnapshot
where
    K: Into<OsString>,
    V: Into<OsString>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
