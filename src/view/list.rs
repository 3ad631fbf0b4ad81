use tracing::{debug, warn};

use crate::types::{DirectoryEntry, RecordKind};
use crate::view::{Route, ViewContext};

/// List of all records of one type below the configured base
#[derive(Debug, Clone)]
pub struct ListView {
    kind: RecordKind,
    /// True once the search succeeded
    pub status: bool,
    /// Entries exactly as returned by the gateway
    pub entries: Vec<DirectoryEntry>,
}

impl ListView {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            status: false,
            entries: Vec::new(),
        }
    }

    /// Create the view and run its search
    pub async fn mount(ctx: &ViewContext, kind: RecordKind) -> Self {
        let mut view = Self::new(kind);
        view.load(ctx).await;
        view
    }

    /// Fetch the record list; any failure leaves an empty, unloaded view
    pub async fn load(&mut self, ctx: &ViewContext) {
        match ctx.gateway.search(ctx.basedn(), &self.kind.filter()).await {
            Ok(result) => {
                debug!("Loaded {} {}", result.len(), self.kind);
                self.entries = result.into_entries();
                self.status = true;
            }
            Err(e) => {
                warn!("Could not load {}: {}", self.kind, e);
                self.entries.clear();
                self.status = false;
            }
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Route to the detail view of one entry
    pub fn view_route(&self, entry: &DirectoryEntry) -> Route {
        Route::view(self.kind, entry.dn.clone())
    }

    /// Route to the creation view
    pub fn add_route(&self) -> Route {
        match self.kind {
            RecordKind::Certificate => Route::CertificateAdd,
            RecordKind::Issuer => Route::IssuerAdd,
        }
    }

    /// Route to the removal view; only issuers can be removed
    pub fn remove_route(&self, entry: &DirectoryEntry) -> Option<Route> {
        match self.kind {
            RecordKind::Certificate => None,
            RecordKind::Issuer => Some(Route::IssuerRemove(entry.dn.clone())),
        }
    }
}
