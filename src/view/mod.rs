//! View-models
//!
//! Each view owns its working state, talks to the gateway through an
//! injected [`ViewContext`] and reports where the user goes next as a
//! [`Navigation`]. Nothing is shared between views.

pub mod route;
pub mod list;
pub mod detail;
pub mod create;
pub mod remove;
pub mod status;

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{Config, MutationPolicy};
use crate::gateway::DirectoryGateway;
use crate::types::{AttributeValue, DirectoryEntry, Result};

pub use route::Route;
pub use list::ListView;
pub use detail::IssuerDetailView;
pub use create::IssuerCreateView;
pub use remove::IssuerRemoveView;
pub use status::{ConnectionState, StatusView};

/// Dependencies handed to every view
#[derive(Clone)]
pub struct ViewContext {
    pub gateway: Arc<dyn DirectoryGateway>,
    pub config: Arc<Config>,
}

impl ViewContext {
    pub fn new(gateway: Arc<dyn DirectoryGateway>, config: Arc<Config>) -> Self {
        Self { gateway, config }
    }

    /// Search base for list views
    pub fn basedn(&self) -> &str {
        &self.config.directory.basedn
    }

    /// Submit a mutation and decide where to go, following the configured
    /// [`MutationPolicy`].
    pub(crate) async fn mutate(&self, mutation: Mutation, to: Route) -> Result<Navigation> {
        match self.config.views.mutation_policy {
            MutationPolicy::Optimistic => {
                let gateway = Arc::clone(&self.gateway);
                let handle = tokio::spawn(async move {
                    let verb = mutation.verb();
                    let result = mutation.apply(gateway.as_ref()).await;
                    if let Err(e) = &result {
                        warn!("{} failed after navigating away: {}", verb, e);
                    }
                    result
                });
                info!("Navigating to {} without waiting for the gateway", to);
                Ok(Navigation::Optimistic {
                    to,
                    pending: PendingMutation { handle },
                })
            }
            MutationPolicy::Confirmed => {
                mutation.apply(self.gateway.as_ref()).await?;
                Ok(Navigation::Go(to))
            }
        }
    }
}

/// Mutating gateway calls issued by views
#[derive(Debug, Clone)]
pub(crate) enum Mutation {
    Add(Vec<DirectoryEntry>),
    Update(Vec<DirectoryEntry>),
    Delete(String),
}

impl Mutation {
    fn verb(&self) -> &'static str {
        match self {
            Mutation::Add(_) => "add",
            Mutation::Update(_) => "update",
            Mutation::Delete(_) => "delete",
        }
    }

    async fn apply(self, gateway: &dyn DirectoryGateway) -> Result<()> {
        match self {
            Mutation::Add(values) => gateway.add(values).await,
            Mutation::Update(values) => gateway.update(values).await,
            Mutation::Delete(dn) => gateway.delete(&dn).await,
        }
    }
}

/// Where the user goes after a view action
#[derive(Debug)]
pub enum Navigation {
    /// Remain on the current view
    Stay,
    /// Move to another route
    Go(Route),
    /// Move to another route while the mutation is still in flight
    Optimistic {
        to: Route,
        pending: PendingMutation,
    },
}

impl Navigation {
    /// Target route, if the view is left
    pub fn route(&self) -> Option<&Route> {
        match self {
            Navigation::Stay => None,
            Navigation::Go(to) | Navigation::Optimistic { to, .. } => Some(to),
        }
    }

    pub fn is_stay(&self) -> bool {
        matches!(self, Navigation::Stay)
    }
}

/// Mutation still running after an optimistic navigation.
///
/// Dropping it leaves the request running in the background.
#[derive(Debug)]
pub struct PendingMutation {
    handle: JoinHandle<Result<()>>,
}

impl PendingMutation {
    /// Wait for the gateway's answer
    pub async fn settle(self) -> Result<()> {
        self.handle.await?
    }
}

/// One attribute as presented to the rendering layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub name: String,
    pub value: AttributeValue,
    pub editable: bool,
}
