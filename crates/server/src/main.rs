//! certvault entry point.
//!
//! ```text
//! certvault                  bootstrap and wait for a shutdown signal
//! certvault migrate          run pending migrations and exit
//! certvault rotate-crl <id>  regenerate a CA's CRL and print it
//! ```

mod state;

use std::sync::Arc;

use certvault_common::Config;
use certvault_core::{ActorContext, ActorType};
use state::AppServices;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, shutting down");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "certvault=debug,certvault_core=debug,certvault_db=info".into());
    let json = std::env::var("CERTVAULT_LOG_FORMAT").is_ok_and(|format| format == "json");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::load()?;

    let db = certvault_db::init(&config).await?;
    info!("Connected to database");

    certvault_db::migrate(&db).await?;
    info!("Migrations completed");

    let services = AppServices::new(Arc::new(db), &config)?;

    match args.first().map(String::as_str) {
        None | Some("serve") => {
            info!("certvault ready");
            shutdown_signal().await;
        }
        Some("migrate") => {}
        Some("rotate-crl") => {
            let ca_id = args.get(1).ok_or("usage: certvault rotate-crl <ca-id>")?;
            let operator = ActorContext {
                actor: ActorType::Service,
                actor_id: "certvault-cli".to_string(),
                actor_auth_method: None,
                actor_org_id: None,
            };
            let crl = services
                .certificate_authorities
                .rotate_ca_crl(&operator, ca_id)
                .await?;
            println!("{crl}");
        }
        Some(other) => return Err(format!("unknown command: {other}").into()),
    }

    info!("certvault stopped");
    Ok(())
}
