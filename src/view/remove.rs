use tracing::info;

use crate::types::Result;
use crate::view::{Mutation, Navigation, Route, ViewContext};

/// Removal of one trusted issuer
#[derive(Debug, Clone)]
pub struct IssuerRemoveView {
    pub issuerdn: String,
}

impl IssuerRemoveView {
    pub fn new(issuerdn: impl Into<String>) -> Self {
        Self { issuerdn: issuerdn.into() }
    }

    /// Delete the issuer and return to the list; there is no confirmation
    /// step
    pub async fn do_rm(&self, ctx: &ViewContext) -> Result<Navigation> {
        if self.issuerdn.is_empty() {
            return Ok(Navigation::Stay);
        }
        info!("Removing issuer {}", self.issuerdn);
        ctx.mutate(Mutation::Delete(self.issuerdn.clone()), Route::Issuers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::MutationPolicy;
    use crate::error::Error;
    use crate::gateway::{MockGateway, MockReply, Request};
    use crate::view::testing::context;

    #[tokio::test]
    async fn test_rm_deletes_and_returns_to_list() {
        let gateway = Arc::new(MockGateway::new());
        let ctx = context(gateway.clone(), MutationPolicy::Optimistic);

        let view = IssuerRemoveView::new("cn=ca,dc=example,dc=com");
        let navigation = view.do_rm(&ctx).await.unwrap();

        assert_eq!(navigation.route(), Some(&Route::Issuers));
        if let Navigation::Optimistic { pending, .. } = navigation {
            pending.settle().await.unwrap();
        }
        assert_eq!(
            gateway.requests(),
            vec![Request::Delete { dn: "cn=ca,dc=example,dc=com".into() }]
        );
    }

    #[tokio::test]
    async fn test_confirmed_rm_stops_on_failure() {
        let gateway = Arc::new(MockGateway::new().reply("delete", MockReply::Status(404, "No such object".into())));
        let ctx = context(gateway, MutationPolicy::Confirmed);

        let view = IssuerRemoveView::new("cn=gone,dc=example,dc=com");
        assert!(matches!(view.do_rm(&ctx).await, Err(Error::Gateway { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_double_submit_sends_two_deletes() {
        let gateway = Arc::new(MockGateway::new());
        let ctx = context(gateway.clone(), MutationPolicy::Confirmed);

        let view = IssuerRemoveView::new("cn=ca,dc=example,dc=com");
        view.do_rm(&ctx).await.unwrap();
        view.do_rm(&ctx).await.unwrap();

        assert_eq!(gateway.requests_for("delete").len(), 2);
    }
}
