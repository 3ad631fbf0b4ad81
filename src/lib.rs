//! Crank - management client for certificates and trusted issuers
//!
//! Talks to the Crank gateway, a CGI endpoint in front of an LDAP directory,
//! and provides the view-models of its management screens.

// Foundational layer
pub mod error;
pub mod types;
pub mod config;
pub mod telemetry;

// Core layer
pub mod gateway;

// Application layer
pub mod view;
pub mod app;

// Public key types
pub use crate::error::Error;
pub use crate::types::{AttributeValue, DirectoryEntry, RecordKind, Result, SearchResult, ServerStatus};
pub use crate::config::{Config, MutationPolicy};
pub use crate::gateway::{DirectoryGateway, HttpGateway, MockGateway};
pub use crate::view::{Navigation, Route, ViewContext};
pub use crate::app::{App, Screen};
