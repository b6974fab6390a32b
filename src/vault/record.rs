//! SecretRecord and its serialized payload.
//!
//! A record is a named bundle of environment variables.  The payload
//! written inside each vault file is JSON:
//!
//! ```text
//! {"name": "api", "variables": {"API_KEY": "..."}}
//! ```
//!
//! Older vaults hold one variable per record instead:
//!
//! ```text
//! {"name": "db", "exposed": "DB_URL", "value": "..."}
//! ```
//!
//! Both shapes deserialize into `RecordPayload`; `into_record` folds the
//! legacy pair into a one-entry `variables` map.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{EnvBoxError, Result};

/// A decrypted secret record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    /// Unique name of the record (e.g. "api").
    pub name: String,

    /// Exposed variable name -> value.
    pub variables: BTreeMap<String, String>,

    /// The vault file this record was loaded from.
    /// Assigned by the repository; never serialized.
    pub storage_location: Option<PathBuf>,
}

impl SecretRecord {
    pub fn new(name: impl Into<String>, variables: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            variables,
            storage_location: None,
        }
    }

    /// A record exposing a single variable.
    pub fn single(
        name: impl Into<String>,
        exposed: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let mut variables = BTreeMap::new();
        variables.insert(exposed.into(), value.into());
        Self::new(name, variables)
    }

    /// Names of the variables this record exposes, in sorted order.
    pub fn exposed_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }
}

/// JSON payload stored inside a vault file.
///
/// Written with `variables` only; read with either `variables` or the
/// legacy `exposed`/`value` pair.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RecordPayload {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl RecordPayload {
    pub fn from_record(record: &SecretRecord) -> Self {
        Self {
            name: record.name.clone(),
            variables: Some(record.variables.clone()),
            exposed: None,
            value: None,
        }
    }

    /// Normalize into a `SecretRecord`.
    ///
    /// A non-empty `variables` map wins.  Otherwise the legacy pair is
    /// used, with the exposed name defaulting to the record name.
    pub fn into_record(self) -> Result<SecretRecord> {
        if self.name.is_empty() {
            return Err(EnvBoxError::InvalidRecord("record has no name".into()));
        }

        if let Some(variables) = self.variables.filter(|v| !v.is_empty()) {
            return Ok(SecretRecord::new(self.name, variables));
        }

        match self.value {
            Some(value) => {
                let exposed = self
                    .exposed
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| self.name.clone());
                Ok(SecretRecord::single(self.name, exposed, value))
            }
            None => Err(EnvBoxError::InvalidRecord(format!(
                "record '{}' has no variables",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<SecretRecord> {
        serde_json::from_str::<RecordPayload>(json)
            .map_err(EnvBoxError::from)
            .and_then(RecordPayload::into_record)
    }

    #[test]
    fn legacy_record_is_normalized() {
        let record = parse(r#"{"name":"db","exposed":"DB_URL","value":"x"}"#).unwrap();
        assert_eq!(record, SecretRecord::single("db", "DB_URL", "x"));
    }

    #[test]
    fn legacy_record_without_exposed_uses_name() {
        let record = parse(r#"{"name":"TOKEN","exposed":"","value":"t"}"#).unwrap();
        assert_eq!(record.variables.get("TOKEN").map(String::as_str), Some("t"));
    }

    #[test]
    fn variables_win_over_legacy_fields() {
        let record = parse(
            r#"{"name":"api","exposed":"OLD","value":"old","variables":{"API_KEY":"new"}}"#,
        )
        .unwrap();
        assert_eq!(record, SecretRecord::single("api", "API_KEY", "new"));
    }

    #[test]
    fn empty_variables_fall_back_to_legacy_pair() {
        let record = parse(r#"{"name":"db","variables":{},"exposed":"DB","value":"v"}"#).unwrap();
        assert_eq!(record, SecretRecord::single("db", "DB", "v"));
    }

    #[test]
    fn payload_without_any_value_is_rejected() {
        assert!(matches!(
            parse(r#"{"name":"db"}"#),
            Err(EnvBoxError::InvalidRecord(_))
        ));
    }

    #[test]
    fn payload_without_name_is_rejected() {
        assert!(parse(r#"{"name":"","variables":{"A":"1"}}"#).is_err());
        assert!(parse(r#"{"variables":{"A":"1"}}"#).is_err());
    }

    #[test]
    fn written_payload_has_no_legacy_fields() {
        let json =
            serde_json::to_string(&RecordPayload::from_record(&SecretRecord::single("a", "A", "1")))
                .unwrap();
        assert_eq!(json, r#"{"name":"a","variables":{"A":"1"}}"#);
    }
}
