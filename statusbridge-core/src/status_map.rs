//! Status translation table: tracking-system status code → external label.
//!
//! Built once at startup and shared read-only. Codes missing from the table
//! translate to nothing; callers that need a printable value use
//! [`UNKNOWN_STATUS`], which no entry is allowed to carry as its label.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Sentinel label for codes that have no translation.
pub const UNKNOWN_STATUS: &str = "Unknown";

const DEFAULT_ENTRIES: &[(&str, &str)] = &[
    ("wtg", "NEW"),
    ("ip", "IN PROGRESS"),
    ("hld", "ON HOLD"),
    ("profi", "NEED POST APPROVAL"),
    ("apr", "APPROVED"),
    ("omt", "OMIT"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct StatusMap {
    entries: BTreeMap<String, String>,
}

impl StatusMap {
    /// Build a table, rejecting empty codes, empty labels, and labels that
    /// collide with [`UNKNOWN_STATUS`].
    pub fn new<I, K, V>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (code, label) in entries {
            let code = code.into();
            let label = label.into();
            if code.trim().is_empty() {
                return Err(ConfigError::InvalidStatusMap(
                    "status code must not be empty".to_string(),
                ));
            }
            if label.trim().is_empty() {
                return Err(ConfigError::InvalidStatusMap(format!(
                    "label for '{code}' must not be empty"
                )));
            }
            if label.trim().eq_ignore_ascii_case(UNKNOWN_STATUS) {
                return Err(ConfigError::InvalidStatusMap(format!(
                    "label for '{code}' collides with the '{UNKNOWN_STATUS}' sentinel"
                )));
            }
            map.insert(code, label);
        }
        Ok(Self { entries: map })
    }

    /// Translate a status code, `None` when the code is unmapped.
    pub fn translate(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    /// Translate a status code, falling back to [`UNKNOWN_STATUS`].
    pub fn label_or_unknown(&self, code: &str) -> &str {
        self.translate(code).unwrap_or(UNKNOWN_STATUS)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StatusMap {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ENTRIES
                .iter()
                .map(|(code, label)| (code.to_string(), label.to_string()))
                .collect(),
        }
    }
}

impl TryFrom<BTreeMap<String, String>> for StatusMap {
    type Error = ConfigError;

    fn try_from(entries: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<StatusMap> for BTreeMap<String, String> {
    fn from(map: StatusMap) -> Self {
        map.entries
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("wtg", "NEW")]
    #[case("ip", "IN PROGRESS")]
    #[case("hld", "ON HOLD")]
    #[case("profi", "NEED POST APPROVAL")]
    #[case("apr", "APPROVED")]
    #[case("omt", "OMIT")]
    fn default_table_translates_known_codes(#[case] code: &str, #[case] label: &str) {
        assert_eq!(StatusMap::default().translate(code), Some(label));
    }

    #[rstest]
    #[case("xyz")]
    #[case("")]
    #[case("IP")]
    fn unmapped_codes_fall_back_to_sentinel(#[case] code: &str) {
        let map = StatusMap::default();
        assert_eq!(map.translate(code), None);
        assert_eq!(map.label_or_unknown(code), UNKNOWN_STATUS);
    }

    #[test]
    fn sentinel_never_appears_as_a_label() {
        assert!(StatusMap::default()
            .iter()
            .all(|(_, label)| label != UNKNOWN_STATUS));
    }

    #[rstest]
    #[case("fin", "unknown")]
    #[case("fin", "Unknown")]
    #[case("fin", "  ")]
    #[case(" ", "FINAL")]
    fn invalid_entries_are_rejected(#[case] code: &str, #[case] label: &str) {
        let err = StatusMap::new([(code, label)]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStatusMap(_)), "got: {err}");
    }

    #[test]
    fn yaml_deserialization_validates() {
        let map: StatusMap = serde_yaml::from_str("fin: FINAL\nip: WORKING\n").expect("parse");
        assert_eq!(map.translate("fin"), Some("FINAL"));
        assert_eq!(map.len(), 2);

        let err = serde_yaml::from_str::<StatusMap>("fin: Unknown\n").unwrap_err();
        assert!(err.to_string().contains("sentinel"), "got: {err}");
    }
}
