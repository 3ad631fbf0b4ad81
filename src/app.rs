//! Routing: mounts the view behind a route and follows navigations

use std::fmt;
use tracing::debug;

use crate::types::RecordKind;
use crate::view::{
    FieldView, IssuerCreateView, IssuerDetailView, IssuerRemoveView, ListView, Navigation,
    PendingMutation, Route, ViewContext,
};

/// The view mounted for a route
#[derive(Debug, Clone)]
pub enum Screen {
    Certificates(ListView),
    Issuers(ListView),
    IssuerView(IssuerDetailView),
    IssuerAdd(IssuerCreateView),
    IssuerRemove(IssuerRemoveView),
    /// Route without an implementation
    Placeholder(Route),
}

impl Screen {
    /// Create the view for `route`, running its initial load
    pub async fn mount(ctx: &ViewContext, route: &Route) -> Screen {
        debug!("Mounting {}", route);
        match route {
            Route::Certificates => Screen::Certificates(ListView::mount(ctx, RecordKind::Certificate).await),
            Route::Issuers => Screen::Issuers(ListView::mount(ctx, RecordKind::Issuer).await),
            Route::IssuerView(dn) => Screen::IssuerView(IssuerDetailView::mount(ctx, dn.clone()).await),
            Route::IssuerAdd => Screen::IssuerAdd(IssuerCreateView::new()),
            Route::IssuerRemove(dn) => Screen::IssuerRemove(IssuerRemoveView::new(dn.clone())),
            Route::CertificateView(_) | Route::CertificateAdd => Screen::Placeholder(route.clone()),
        }
    }
}

/// Current route and its screen
pub struct App {
    ctx: ViewContext,
    route: Route,
    screen: Screen,
}

impl App {
    /// Mount the screen for `route`
    pub async fn open(ctx: ViewContext, route: Route) -> Self {
        let screen = Screen::mount(&ctx, &route).await;
        Self { ctx, route, screen }
    }

    /// Replace the current screen; views are never reused across routes
    pub async fn navigate(&mut self, route: Route) {
        self.screen = Screen::mount(&self.ctx, &route).await;
        self.route = route;
    }

    /// Apply a navigation returned by a view action.
    ///
    /// An optimistic navigation moves on at once and hands back the mutation
    /// that is still in flight.
    pub async fn follow(&mut self, navigation: Navigation) -> Option<PendingMutation> {
        match navigation {
            Navigation::Stay => None,
            Navigation::Go(to) => {
                self.navigate(to).await;
                None
            }
            Navigation::Optimistic { to, pending } => {
                self.navigate(to).await;
                Some(pending)
            }
        }
    }

    pub fn context(&self) -> &ViewContext {
        &self.ctx
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Certificates(view) | Screen::Issuers(view) => render_list(f, view),
            Screen::IssuerView(view) => {
                writeln!(f, "Issuer {}", view.issuerdn())?;
                if !view.status() {
                    return writeln!(f, "  (not loaded)");
                }
                render_fields(f, &view.fields())
            }
            Screen::IssuerAdd(view) => {
                writeln!(f, "New issuer")?;
                render_fields(f, &view.fields())
            }
            Screen::IssuerRemove(view) => writeln!(f, "Remove issuer {}?", view.issuerdn),
            Screen::Placeholder(route) => writeln!(f, "{} is not available yet", route),
        }
    }
}

fn render_list(f: &mut fmt::Formatter<'_>, view: &ListView) -> fmt::Result {
    if !view.status {
        return writeln!(f, "{}: not loaded", view.kind());
    }
    writeln!(f, "{} ({})", view.kind(), view.entries.len())?;
    for entry in &view.entries {
        writeln!(f, "  {}  {}", entry.dn, view.view_route(entry).href())?;
    }
    Ok(())
}

fn render_fields(f: &mut fmt::Formatter<'_>, fields: &[FieldView]) -> fmt::Result {
    let width = fields.iter().map(|field| field.name.len()).max().unwrap_or(0);
    for field in fields {
        let marker = if field.editable { ' ' } else { '*' };
        writeln!(f, " {}{:width$}  {}", marker, field.name, field.value, width = width)?;
    }
    Ok(())
}
