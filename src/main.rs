use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crank::{
    config::Config,
    gateway::{HttpGateway, Password},
    telemetry,
    view::{IssuerCreateView, IssuerDetailView, IssuerRemoveView, StatusView},
    App, Navigation, Route, ViewContext,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "crank", version, about = "Manage certificates and trusted issuers through the Crank gateway")]
struct Cli {
    /// Configuration file (overrides CRANK_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the backend's directory connection
    Status,
    /// Connect the backend to a directory server
    Connect {
        /// Directory server URI, e.g. ldap://localhost:389/
        uri: String,
        #[arg(short, long, default_value = "")]
        user: String,
        #[arg(short, long, env = "CRANK_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,
    },
    /// Disconnect the backend from its directory server
    Stop,
    /// List certificates
    Certificates,
    /// List trusted issuers
    Issuers,
    /// Work with one trusted issuer
    Issuer {
        #[command(subcommand)]
        action: IssuerAction,
    },
    /// Open a route (e.g. '#!/issuers') and print its screen
    Open { route: String },
}

#[derive(Subcommand)]
enum IssuerAction {
    /// Show an issuer
    View { dn: String },
    /// Add an issuer
    Add {
        dn: String,
        /// Attribute as name=value; repeat for more
        #[arg(short, long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, String)>,
    },
    /// Change attributes of an issuer
    Edit {
        dn: String,
        /// Attribute as name=value; repeat for more
        #[arg(short, long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, String)>,
        /// Attribute to remove; repeat for more
        #[arg(long)]
        clear: Vec<String>,
    },
    /// Remove an issuer
    Rm { dn: String },
}

fn parse_attr(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{}'", s)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // 2. Initialize logging
    telemetry::init_logging(&config)?;

    // 3. Build the gateway client
    let gateway = HttpGateway::new(&config)?;
    info!("Using gateway at {}", gateway.endpoint());
    let ctx = ViewContext::new(Arc::new(gateway), Arc::new(config));

    match cli.command {
        Command::Status => {
            let (view, _) = StatusView::mount(&ctx, None).await;
            print_status(&view);
        }
        Command::Connect { uri, user, password } => {
            let mut view = StatusView::new();
            view.uri = uri;
            view.user = user;
            view.password = Password::new(password);
            let navigation = view.do_connect(&ctx).await;
            print_status(&view);
            follow(ctx, navigation).await?;
        }
        Command::Stop => {
            let mut view = StatusView::new();
            view.do_stop(&ctx).await;
            print_status(&view);
        }
        Command::Certificates => show(ctx, Route::Certificates).await,
        Command::Issuers => show(ctx, Route::Issuers).await,
        Command::Open { route } => show(ctx, Route::resolve(&route)).await,
        Command::Issuer { action } => run_issuer(ctx, action).await?,
    }

    Ok(())
}

async fn run_issuer(ctx: ViewContext, action: IssuerAction) -> Result<()> {
    let navigation = match action {
        IssuerAction::View { dn } => {
            show(ctx, Route::IssuerView(dn)).await;
            return Ok(());
        }
        IssuerAction::Add { dn, attrs } => {
            let mut view = IssuerCreateView::new();
            view.set_dn(dn);
            for (name, value) in attrs {
                view.set_field(&name, value)?;
            }
            view.do_save(&ctx).await?
        }
        IssuerAction::Edit { dn, attrs, clear } => {
            let mut view = IssuerDetailView::mount(&ctx, dn).await;
            if !view.status() {
                bail!("Issuer {} could not be loaded", view.issuerdn());
            }
            for (name, value) in attrs {
                view.set_field(&name, value)?;
            }
            for name in clear {
                view.clear_field(&name)?;
            }
            view.do_save(&ctx).await?
        }
        IssuerAction::Rm { dn } => IssuerRemoveView::new(dn).do_rm(&ctx).await?,
    };

    if navigation.is_stay() {
        bail!("Nothing to submit");
    }
    follow(ctx, navigation).await
}

/// Follow a navigation and print the screen it lands on. A mutation still in
/// flight is awaited first so the listing reflects it and the process does
/// not exit before the request is sent.
async fn follow(ctx: ViewContext, navigation: Navigation) -> Result<()> {
    let to = match navigation {
        Navigation::Stay => return Ok(()),
        Navigation::Go(to) => to,
        Navigation::Optimistic { to, pending } => {
            if let Err(e) = pending.settle().await {
                warn!("Request was not accepted: {}", e);
            }
            to
        }
    };
    show(ctx, to).await;
    Ok(())
}

async fn show(ctx: ViewContext, route: Route) {
    let app = App::open(ctx, route).await;
    println!("{}", app.route().href());
    print!("{}", app.screen());
}

fn print_status(view: &StatusView) {
    println!("{} ({}): {}", view.state(), view.statuscode, view.serverstatus);
}
