//! Directory Gateway Contract
//!
//! Every backend call is a POST of one JSON envelope to one endpoint; the
//! `verb` field selects the operation. [`DirectoryGateway::dispatch`] is the
//! only transport-specific method, the verbs are built on top of it.

pub mod types;
pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::types::{DirectoryEntry, Result, SearchResult, ServerStatus};

pub use types::{decode_search, Password, Request};
pub use http::HttpGateway;
pub use mock::{MockGateway, MockReply};

/// Client side of the gateway
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    /// Send one envelope and return the decoded response body.
    ///
    /// Verbs whose response is ignored may yield `Value::Null`.
    async fn dispatch(&self, request: Request) -> Result<Value>;

    /// Search below `base` with an LDAP-style `filter`
    async fn search(&self, base: &str, filter: &str) -> Result<SearchResult> {
        debug!("search base={} filter={}", base, filter);
        let body = self
            .dispatch(Request::Search {
                base: base.to_string(),
                filter: filter.to_string(),
            })
            .await?;
        decode_search(body)
    }

    /// Create entries
    async fn add(&self, values: Vec<DirectoryEntry>) -> Result<()> {
        debug!("add {} entries", values.len());
        self.dispatch(Request::Add { values }).await.map(|_| ())
    }

    /// Modify entries; each value carries its `dn` and the changed attributes
    async fn update(&self, values: Vec<DirectoryEntry>) -> Result<()> {
        debug!("update {} entries", values.len());
        self.dispatch(Request::Update { values }).await.map(|_| ())
    }

    /// Remove the entry named `dn`
    async fn delete(&self, dn: &str) -> Result<()> {
        debug!("delete dn={}", dn);
        self.dispatch(Request::Delete { dn: dn.to_string() }).await.map(|_| ())
    }

    /// Probe the backend's directory connection
    async fn serverstatus(&self) -> Result<ServerStatus> {
        let body = self.dispatch(Request::ServerStatus).await?;
        let status = match body {
            Value::Null => ServerStatus::new(0, ""),
            other => serde_json::from_value(other)?,
        };
        debug!("serverstatus code={} message={:?}", status.code, status.message);
        Ok(status)
    }

    /// Ask the backend to connect to a directory server.
    ///
    /// The password travels in the request body; the gateway offers no other
    /// way to authenticate.
    async fn connect(&self, uri: &str, user: &str, password: &str) -> Result<()> {
        debug!("connect uri={} user={}", uri, user);
        self.dispatch(Request::Connect {
            uri: uri.to_string(),
            user: user.to_string(),
            password: Password::new(password),
        })
        .await
        .map(|_| ())
    }

    /// Ask the backend to drop its directory connection
    async fn stop(&self) -> Result<()> {
        debug!("stop");
        self.dispatch(Request::Stop).await.map(|_| ())
    }
}
