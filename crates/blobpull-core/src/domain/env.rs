//! Environment snapshot of the invoking run and `$VAR` / `${VAR}` expansion.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static MACRO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z0-9_.]+)\}|([A-Za-z0-9_]+))").expect("macro pattern compiles")
});

/// Ordered string -> string mapping taken from the invoking run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvVars(BTreeMap<String, String>);

impl EnvVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace `$NAME` and `${NAME}` with values from this snapshot.
    /// Unknown variables stay verbatim.
    pub fn expand<'a>(&self, template: &'a str) -> Cow<'a, str> {
        MACRO.replace_all(template, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match self.get(name) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
    }
}

impl FromIterator<(String, String)> for EnvVars {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn env() -> EnvVars {
        EnvVars::new()
            .with("BUILD_NUMBER", "42")
            .with("TARGET", "release")
            .with("dotted.name", "x")
    }

    #[rstest]
    #[case::plain("out/$TARGET/*.jar", "out/release/*.jar")]
    #[case::braced("builds/${BUILD_NUMBER}/", "builds/42/")]
    #[case::dotted("${dotted.name}", "x")]
    #[case::unknown_kept("$MISSING/${ALSO_MISSING}", "$MISSING/${ALSO_MISSING}")]
    #[case::no_macro("**/*", "**/*")]
    #[case::adjacent("$TARGET-$BUILD_NUMBER", "release-42")]
    fn expands_macros(#[case] template: &str, #[case] expected: &str) {
        assert_eq!(env().expand(template), expected);
    }

    #[test]
    fn snapshot_is_ordered_by_key() {
        let env: EnvVars = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]
        .into_iter()
        .collect();
        let s = serde_json::to_string(&env).unwrap();
        assert_eq!(s, r#"{"a":"1","b":"2"}"#);
    }
}
