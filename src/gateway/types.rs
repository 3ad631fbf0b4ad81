use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::types::{DirectoryEntry, Result, SearchResult, DN};

/// Request envelope; serialized with the variant name in the `verb` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "lowercase")]
pub enum Request {
    Search { base: String, filter: String },
    Add { values: Vec<DirectoryEntry> },
    Update { values: Vec<DirectoryEntry> },
    Delete { dn: String },
    ServerStatus,
    Connect { uri: String, user: String, password: Password },
    Stop,
}

impl Request {
    /// Wire name of the verb
    pub fn verb(&self) -> &'static str {
        match self {
            Request::Search { .. } => "search",
            Request::Add { .. } => "add",
            Request::Update { .. } => "update",
            Request::Delete { .. } => "delete",
            Request::ServerStatus => "serverstatus",
            Request::Connect { .. } => "connect",
            Request::Stop => "stop",
        }
    }

    /// Whether the caller reads the response body
    pub fn expects_body(&self) -> bool {
        matches!(self, Request::Search { .. } | Request::ServerStatus)
    }
}

/// Password sent with `connect`; hidden from `Debug` output
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Decode a `search` response.
///
/// The gateway answers with an object keyed by DN. Entries keep the order of
/// the response; an entry without a `dn` attribute takes its key.
pub fn decode_search(body: Value) -> Result<SearchResult> {
    let map = match body {
        Value::Null => return Ok(SearchResult::default()),
        Value::Object(map) => map,
        other => {
            return Err(Error::Serialization(format!(
                "search response must be an object keyed by DN, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        let mut attrs = match value {
            Value::Object(attrs) => attrs,
            other => {
                return Err(Error::Serialization(format!(
                    "entry {} must be an object, got {}",
                    key,
                    json_kind(&other)
                )))
            }
        };
        if !attrs.contains_key(DN) {
            attrs.insert(DN.to_string(), Value::String(key));
        }
        entries.push(serde_json::from_value::<DirectoryEntry>(Value::Object(attrs))?);
    }

    Ok(SearchResult::new(entries))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributeValue;
    use serde_json::json;

    #[test]
    fn test_envelopes_carry_verb() {
        let search = serde_json::to_value(Request::Search {
            base: "dc=example,dc=com".into(),
            filter: "objectClass=tlsPoolTrustedIssuer".into(),
        })
        .unwrap();
        assert_eq!(
            search,
            json!({
                "verb": "search",
                "base": "dc=example,dc=com",
                "filter": "objectClass=tlsPoolTrustedIssuer"
            })
        );

        assert_eq!(
            serde_json::to_value(Request::ServerStatus).unwrap(),
            json!({"verb": "serverstatus"})
        );
        assert_eq!(
            serde_json::to_value(Request::Delete { dn: "cn=x".into() }).unwrap(),
            json!({"verb": "delete", "dn": "cn=x"})
        );

        let connect = Request::Connect {
            uri: "ldap://localhost:389/".into(),
            user: "cn=admin".into(),
            password: Password::new("secret"),
        };
        assert_eq!(
            serde_json::to_value(&connect).unwrap(),
            json!({
                "verb": "connect",
                "uri": "ldap://localhost:389/",
                "user": "cn=admin",
                "password": "secret"
            })
        );
        assert!(!format!("{:?}", connect).contains("secret"));
    }

    #[test]
    fn test_update_values_are_flat_entries() {
        let entry = DirectoryEntry::new("cn=ca,dc=example,dc=com").with("description", "root");
        let value = serde_json::to_value(Request::Update { values: vec![entry] }).unwrap();
        assert_eq!(
            value,
            json!({
                "verb": "update",
                "values": [{"dn": "cn=ca,dc=example,dc=com", "description": "root"}]
            })
        );
    }

    #[test]
    fn test_decode_search_keeps_order_and_fills_dn() {
        let body = json!({
            "cn=zeta,dc=example,dc=com": {
                "dn": "cn=zeta,dc=example,dc=com",
                "cn": "zeta"
            },
            "cn=alpha,dc=example,dc=com": {
                "cn": "alpha",
                "seeAlso": ["a", "b"]
            }
        });

        let result = decode_search(body).unwrap();
        let dns: Vec<&str> = result.entries().iter().map(|e| e.dn.as_str()).collect();
        assert_eq!(dns, vec!["cn=zeta,dc=example,dc=com", "cn=alpha,dc=example,dc=com"]);

        let alpha = result.get("cn=alpha,dc=example,dc=com").unwrap();
        assert_eq!(
            alpha.get("seeAlso"),
            Some(&AttributeValue::Multi(vec!["a".into(), "b".into()]))
        );
        assert!(alpha.get(DN).is_none());
    }

    #[test]
    fn test_decode_search_empty_and_malformed() {
        assert!(decode_search(json!({})).unwrap().is_empty());
        assert!(decode_search(Value::Null).unwrap().is_empty());
        assert!(matches!(
            decode_search(json!([{"dn": "cn=x"}])),
            Err(Error::Serialization(_))
        ));
        assert!(matches!(
            decode_search(json!({"cn=x": "oops"})),
            Err(Error::Serialization(_))
        ));
    }
}
