use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static VAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    // `${name}` where name is anything but a closing brace.
    Regex::new(r"\$\{([^}]*)\}").expect("valid variable pattern")
});

/// Session variables set with `:set` and referenced as `${name}`.
///
/// Nothing here touches the process environment; the store lives and dies
/// with the session.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    vars: HashMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or override a variable. The last write wins.
    pub fn set(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// All variables sorted by name.
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<_> = self
            .vars
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        out.sort_unstable();
        out
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Replace every `${name}` in `line` with its value.
    ///
    /// Unknown names keep their `${name}` token verbatim. This is a single
    /// left-to-right pass: a value containing `${...}` is inserted as is and
    /// never expanded again.
    pub fn substitute(&self, line: &str) -> String {
        VAR_REF
            .replace_all(line, |caps: &Captures| match self.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}
