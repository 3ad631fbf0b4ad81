use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Deserializer, Serialize};

/// Project-wide Result type
pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Attribute name carrying the record type tag
pub const OBJECT_CLASS: &str = "objectClass";

/// Attribute name carrying the distinguished name
pub const DN: &str = "dn";

/// Value of a single directory attribute.
///
/// The gateway emits `null` for an attribute without values, a string for a
/// single value and an array for multi-valued attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Attribute present without a value, or cleared by an edit
    Null,
    /// Single value
    Single(String),
    /// Multiple values
    Multi(Vec<String>),
}

impl AttributeValue {
    /// True if `value` is one of the values held
    pub fn contains(&self, value: &str) -> bool {
        match self {
            AttributeValue::Null => false,
            AttributeValue::Single(v) => v == value,
            AttributeValue::Multi(vs) => vs.iter().any(|v| v == value),
        }
    }

    /// Values as a slice-like list, empty for `Null`
    pub fn values(&self) -> Vec<&str> {
        match self {
            AttributeValue::Null => Vec::new(),
            AttributeValue::Single(v) => vec![v.as_str()],
            AttributeValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Single(v) => write!(f, "{}", v),
            AttributeValue::Multi(vs) => write!(f, "{}", vs.join(", ")),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Single(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Single(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        AttributeValue::Multi(values)
    }
}

/// One directory entry: a DN plus its attributes.
///
/// Serialized flat, as the gateway expects: `{"dn": ..., "cn": ..., ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Distinguished name, never changed after creation
    pub dn: String,
    /// Every other attribute, `objectClass` included
    #[serde(flatten)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl DirectoryEntry {
    /// Create an entry without attributes
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(name)
    }

    /// The record type tag, if the entry carries one
    pub fn object_class(&self) -> Option<&AttributeValue> {
        self.get(OBJECT_CLASS)
    }

    /// True if the entry is tagged with the object class of `kind`
    pub fn is_kind(&self, kind: RecordKind) -> bool {
        self.object_class()
            .map(|oc| oc.contains(kind.object_class()))
            .unwrap_or(false)
    }
}

/// Entries returned by a `search`, in the order the gateway sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    entries: Vec<DirectoryEntry>,
}

impl SearchResult {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self { entries }
    }

    /// Look up an entry by its DN
    pub fn get(&self, dn: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.dn == dn)
    }

    /// Remove and return the entry with the given DN
    pub fn take(&mut self, dn: &str) -> Option<DirectoryEntry> {
        let idx = self.entries.iter().position(|e| e.dn == dn)?;
        Some(self.entries.remove(idx))
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DirectoryEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Backend status as reported by the `serverstatus` verb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Status code; `1` means connected
    #[serde(rename = "_status", default, deserialize_with = "status_code")]
    pub code: i64,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// Error number reported by the directory library, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errno: Option<i64>,
}

impl ServerStatus {
    /// Status code of a connected backend
    pub const CONNECTED: i64 = 1;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            errno: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.code == Self::CONNECTED
    }
}

/// The gateway encodes numbers as doubles, so accept `1` and `1.0` alike.
fn status_code<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .ok_or_else(|| serde::de::Error::custom(format!("invalid status code: {}", n))),
        other => Err(serde::de::Error::custom(format!("invalid status code: {}", other))),
    }
}

/// Record types managed through the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// PKCS#11 private key objects
    Certificate,
    /// Trusted issuers of the TLS pool
    Issuer,
}

impl RecordKind {
    /// The objectClass tag identifying this record type
    pub fn object_class(&self) -> &'static str {
        match self {
            RecordKind::Certificate => "pkcs11PrivateKeyObject",
            RecordKind::Issuer => "tlsPoolTrustedIssuer",
        }
    }

    /// Search filter selecting records of this type
    pub fn filter(&self) -> String {
        format!("{}={}", OBJECT_CLASS, self.object_class())
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Certificate => write!(f, "certificates"),
            RecordKind::Issuer => write!(f, "issuers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_serializes_flat() {
        let entry = DirectoryEntry::new("cn=ca,dc=example,dc=com")
            .with("cn", "ca")
            .with(OBJECT_CLASS, RecordKind::Issuer.object_class());

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "dn": "cn=ca,dc=example,dc=com",
                "cn": "ca",
                "objectClass": "tlsPoolTrustedIssuer"
            })
        );
    }

    #[test]
    fn test_entry_accepts_null_and_multi_values() {
        let entry: DirectoryEntry = serde_json::from_value(json!({
            "dn": "cn=ca,dc=example,dc=com",
            "description": null,
            "objectClass": ["top", "tlsPoolTrustedIssuer"]
        }))
        .unwrap();

        assert_eq!(entry.get("description"), Some(&AttributeValue::Null));
        assert!(entry.is_kind(RecordKind::Issuer));
        assert!(!entry.is_kind(RecordKind::Certificate));
    }

    #[test]
    fn test_server_status_decoding() {
        let status: ServerStatus =
            serde_json::from_value(json!({"_status": 1.0, "message": "OK"})).unwrap();
        assert!(status.is_connected());
        assert_eq!(status.message, "OK");

        let status: ServerStatus = serde_json::from_value(json!({"message": "Disconnected"})).unwrap();
        assert_eq!(status.code, 0);
        assert!(!status.is_connected());

        let status: ServerStatus =
            serde_json::from_value(json!({"_status": 0, "errno": 81})).unwrap();
        assert_eq!(status.errno, Some(81));
        assert_eq!(status.message, "");
    }

    #[test]
    fn test_fractional_status_code_is_rejected() {
        let result = serde_json::from_value::<ServerStatus>(json!({"_status": 1.9, "message": "OK"}));
        assert!(result.is_err());

        let result = serde_json::from_value::<ServerStatus>(json!({"_status": "1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_record_kind_filter() {
        assert_eq!(RecordKind::Certificate.filter(), "objectClass=pkcs11PrivateKeyObject");
        assert_eq!(RecordKind::Issuer.filter(), "objectClass=tlsPoolTrustedIssuer");
    }
}
