use std::fmt;
use tracing::{info, warn};

use crate::gateway::Password;
use crate::types::ServerStatus;
use crate::view::{Navigation, Route, ViewContext};

/// Message shown while the first probe is in flight
pub const CHECKING: &str = "Checking ..";

/// Message shown when the gateway cannot be reached or rejects a call
pub const CONTACT_ERROR: &str = "Error contacting Crank";

/// Status code shown before any successful probe
pub const UNKNOWN_STATUS: i64 = -1;

/// Connection state as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Backend status and the form to connect it to a directory server
#[derive(Debug, Clone)]
pub struct StatusView {
    /// True while the backend reports a directory connection
    pub status: bool,
    /// Last status code reported, `-1` until known
    pub statuscode: i64,
    /// Message reported by the backend, or a fixed error message
    pub serverstatus: String,
    /// Directory server to connect to
    pub uri: String,
    /// Bind user
    pub user: String,
    /// Bind password
    pub password: Password,
}

impl Default for StatusView {
    fn default() -> Self {
        Self {
            status: false,
            statuscode: UNKNOWN_STATUS,
            serverstatus: CHECKING.to_string(),
            uri: String::new(),
            user: String::new(),
            password: Password::new(""),
        }
    }
}

impl StatusView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the view and run the first probe
    pub async fn mount(ctx: &ViewContext, redirect: Option<Route>) -> (Self, Navigation) {
        let mut view = Self::new();
        let navigation = view.do_status(ctx, redirect).await;
        (view, navigation)
    }

    pub fn state(&self) -> ConnectionState {
        if self.status {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Probe the backend; when connected and `redirect` is given, go there
    pub async fn do_status(&mut self, ctx: &ViewContext, redirect: Option<Route>) -> Navigation {
        match ctx.gateway.serverstatus().await {
            Ok(status) => {
                self.apply(&status);
                match redirect {
                    Some(to) if self.status => Navigation::Go(to),
                    _ => Navigation::Stay,
                }
            }
            Err(e) => {
                warn!("Status probe failed: {}", e);
                self.disconnect_with_error();
                Navigation::Stay
            }
        }
    }

    /// Ask the backend to connect with the stored URI and credentials, then
    /// probe again and go to the issuer list if that probe reports connected
    pub async fn do_connect(&mut self, ctx: &ViewContext) -> Navigation {
        info!("Connecting backend to {} as {}", self.uri, self.user);
        if let Err(e) = ctx
            .gateway
            .connect(&self.uri, &self.user, self.password.expose())
            .await
        {
            warn!("Connect failed: {}", e);
            self.disconnect_with_error();
            return Navigation::Stay;
        }
        self.do_status(ctx, Some(Route::Issuers)).await
    }

    /// Ask the backend to drop its directory connection, then probe again
    pub async fn do_stop(&mut self, ctx: &ViewContext) -> Navigation {
        if let Err(e) = ctx.gateway.stop().await {
            warn!("Stop failed: {}", e);
            self.disconnect_with_error();
            return Navigation::Stay;
        }
        self.do_status(ctx, None).await
    }

    fn apply(&mut self, status: &ServerStatus) {
        self.serverstatus = status.message.clone();
        self.statuscode = status.code;
        self.status = status.is_connected();
    }

    fn disconnect_with_error(&mut self) {
        self.serverstatus = CONTACT_ERROR.to_string();
        self.statuscode = UNKNOWN_STATUS;
        self.status = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use serde_json::json;

    use crate::config::MutationPolicy;
    use crate::gateway::{MockGateway, MockReply, Request};
    use crate::view::testing::context;

    #[test]
    fn test_initial_state_is_checking() {
        let view = StatusView::new();
        assert_eq!(view.state(), ConnectionState::Disconnected);
        assert_eq!(view.statuscode, -1);
        assert_eq!(view.serverstatus, "Checking ..");
    }

    #[tokio::test]
    async fn test_status_reports_connected() {
        let gateway = Arc::new(
            MockGateway::new().reply_json("serverstatus", json!({"_status": 1, "message": "OK"})),
        );
        let ctx = context(gateway, MutationPolicy::Optimistic);

        let (view, navigation) = StatusView::mount(&ctx, None).await;
        assert!(view.status);
        assert_eq!(view.statuscode, 1);
        assert_eq!(view.serverstatus, "OK");
        assert!(navigation.is_stay());
    }

    #[tokio::test]
    async fn test_status_redirects_only_when_connected() {
        let gateway = Arc::new(
            MockGateway::new()
                .reply_json("serverstatus", json!({"_status": 0, "message": "Not connected"}))
                .reply_json("serverstatus", json!({"_status": 1, "message": "OK"})),
        );
        let ctx = context(gateway, MutationPolicy::Optimistic);

        let (mut view, navigation) = StatusView::mount(&ctx, Some(Route::Certificates)).await;
        assert!(!view.status);
        assert_eq!(view.statuscode, 0);
        assert!(navigation.is_stay());

        let navigation = view.do_status(&ctx, Some(Route::Certificates)).await;
        assert!(matches!(navigation, Navigation::Go(Route::Certificates)));
    }

    #[tokio::test]
    async fn test_probe_failure_collapses_to_error() {
        let gateway = Arc::new(MockGateway::new().reply("serverstatus", MockReply::Unreachable));
        let ctx = context(gateway, MutationPolicy::Optimistic);

        let (view, _) = StatusView::mount(&ctx, Some(Route::Issuers)).await;
        assert_eq!(view.state(), ConnectionState::Disconnected);
        assert_eq!(view.statuscode, -1);
        assert_eq!(view.serverstatus, "Error contacting Crank");
    }

    #[tokio::test]
    async fn test_fractional_status_code_is_a_contact_error() {
        let gateway = Arc::new(
            MockGateway::new().reply_json("serverstatus", json!({"_status": 1.9, "message": "OK"})),
        );
        let ctx = context(gateway, MutationPolicy::Optimistic);

        let (view, navigation) = StatusView::mount(&ctx, Some(Route::Issuers)).await;
        assert!(navigation.is_stay());
        assert!(!view.status);
        assert_eq!(view.serverstatus, CONTACT_ERROR);
    }

    fn connect_form() -> StatusView {
        let mut view = StatusView::new();
        view.uri = "ldap://localhost:389/".into();
        view.user = "cn=admin,dc=example,dc=com".into();
        view.password = Password::new("secret");
        view
    }

    #[tokio::test]
    async fn test_connect_then_navigate_to_issuers() {
        let gateway = Arc::new(
            MockGateway::new().reply_json("serverstatus", json!({"_status": 1, "message": "OK"})),
        );
        let ctx = context(gateway.clone(), MutationPolicy::Optimistic);

        let mut view = connect_form();
        let navigation = view.do_connect(&ctx).await;

        assert!(matches!(navigation, Navigation::Go(Route::Issuers)));
        assert_eq!(view.state(), ConnectionState::Connected);

        let requests = gateway.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0],
            Request::Connect {
                uri: "ldap://localhost:389/".into(),
                user: "cn=admin,dc=example,dc=com".into(),
                password: Password::new("secret"),
            }
        );
        assert_eq!(requests[1], Request::ServerStatus);
    }

    #[tokio::test]
    async fn test_connect_without_connection_stays() {
        let gateway = Arc::new(
            MockGateway::new().reply_json("serverstatus", json!({"_status": 0, "message": "Bind failed"})),
        );
        let ctx = context(gateway, MutationPolicy::Optimistic);

        let mut view = connect_form();
        let navigation = view.do_connect(&ctx).await;

        assert!(navigation.is_stay());
        assert_eq!(view.state(), ConnectionState::Disconnected);
        assert_eq!(view.serverstatus, "Bind failed");
    }

    #[tokio::test]
    async fn test_connect_failure_skips_probe() {
        let gateway = Arc::new(MockGateway::new().reply("connect", MockReply::Status(500, "boom".into())));
        let ctx = context(gateway.clone(), MutationPolicy::Optimistic);

        let mut view = connect_form();
        assert!(view.do_connect(&ctx).await.is_stay());
        assert_eq!(view.serverstatus, CONTACT_ERROR);
        assert!(gateway.requests_for("serverstatus").is_empty());
    }

    #[tokio::test]
    async fn test_stop_reprobes_status() {
        let gateway = Arc::new(
            MockGateway::new().reply_json("serverstatus", json!({"_status": 0, "message": "Stopped"})),
        );
        let ctx = context(gateway.clone(), MutationPolicy::Optimistic);

        let mut view = StatusView::new();
        view.status = true;
        view.statuscode = 1;

        assert!(view.do_stop(&ctx).await.is_stay());
        assert!(!view.status);
        assert_eq!(view.serverstatus, "Stopped");
        assert_eq!(gateway.requests(), vec![Request::Stop, Request::ServerStatus]);
    }
}
