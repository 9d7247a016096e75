//! Storage account model and container-name rules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Endpoint used when an account is configured without one.
pub const DEFAULT_BLOB_ENDPOINT: &str = "https://blob.core.windows.net/";

/// Credentials and endpoint of one blob-store account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccountInfo {
    pub name: String,
    pub access_key: String,
    #[serde(default)]
    pub blob_endpoint: String,
}

impl StorageAccountInfo {
    pub fn new(
        name: impl Into<String>,
        access_key: impl Into<String>,
        blob_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            access_key: access_key.into(),
            blob_endpoint: blob_endpoint.into(),
        }
    }

    /// Copy of this account with its endpoint run through [`canonical_endpoint`].
    pub fn canonicalized(&self) -> Self {
        Self {
            blob_endpoint: canonical_endpoint(&self.blob_endpoint),
            ..self.clone()
        }
    }
}

// access_key は伏せる
impl fmt::Debug for StorageAccountInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAccountInfo")
            .field("name", &self.name)
            .field("access_key", &"<redacted>")
            .field("blob_endpoint", &self.blob_endpoint)
            .finish()
    }
}

/// Normalize a blob endpoint: default when blank, `https://` when the scheme
/// is missing, and always a trailing `/`.
pub fn canonical_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return DEFAULT_BLOB_ENDPOINT.to_string();
    }

    let lower = trimmed.to_ascii_lowercase();
    let mut url = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// Container naming rules of the blob store.
///
/// 3-63 characters of `[a-z0-9-]`, starting with a letter or digit, without
/// consecutive or trailing hyphens. `$root` is the one reserved exception.
pub fn is_valid_container_name(name: &str) -> bool {
    if name == "$root" {
        return true;
    }
    if !(3..=63).contains(&name.len()) {
        return false;
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return false;
    }
    if name.starts_with('-') || name.ends_with('-') {
        return false;
    }
    !name.contains("--")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::blank("", DEFAULT_BLOB_ENDPOINT)]
    #[case::spaces("   ", DEFAULT_BLOB_ENDPOINT)]
    #[case::no_slash("https://acc.blob.core.windows.net", "https://acc.blob.core.windows.net/")]
    #[case::no_scheme("acc.blob.core.windows.net/", "https://acc.blob.core.windows.net/")]
    #[case::http_kept("http://127.0.0.1:10000/devstore", "http://127.0.0.1:10000/devstore/")]
    #[case::already_canonical("https://x/", "https://x/")]
    fn endpoints_are_canonicalized(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(canonical_endpoint(input), expected);
    }

    #[rstest]
    #[case::simple("artifacts", true)]
    #[case::digits_and_hyphen("build-42", true)]
    #[case::root("$root", true)]
    #[case::too_short("ab", false)]
    #[case::upper("Artifacts", false)]
    #[case::leading_hyphen("-abc", false)]
    #[case::trailing_hyphen("abc-", false)]
    #[case::double_hyphen("a--b", false)]
    #[case::underscore("a_b_c", false)]
    fn container_names_follow_store_rules(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(is_valid_container_name(name), valid);
    }

    #[test]
    fn container_name_length_limit() {
        assert!(is_valid_container_name(&"a".repeat(63)));
        assert!(!is_valid_container_name(&"a".repeat(64)));
    }

    #[test]
    fn debug_output_hides_access_key() {
        let acc = StorageAccountInfo::new("acc", "s3cr3t", "");
        let dbg = format!("{acc:?}");
        assert!(dbg.contains("acc"));
        assert!(!dbg.contains("s3cr3t"));
    }

    #[test]
    fn canonicalized_keeps_credentials() {
        let acc = StorageAccountInfo::new("acc", "key", "").canonicalized();
        assert_eq!(acc.blob_endpoint, DEFAULT_BLOB_ENDPOINT);
        assert_eq!(acc.access_key, "key");
    }
}
