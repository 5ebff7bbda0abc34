use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

mod balancer;
mod cli;
mod config;
mod error;
mod events;
mod executor;
mod scanner;

#[cfg(test)]
mod tests;

use cli::Cli;
use config::BalancerConfig;
use events::EventHub;
use executor::SshRunner;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logdir_balancer=info".into()),
        )
        .init();

    info!("logdir-balancer v{} starting up", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut config = BalancerConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    let settings = config.settings()?;
    let destination = config.ssh_destination().context("HOST must be set")?;
    info!(
        "Balancing broker {} on {} (environment {})",
        settings.broker_id, destination, settings.environment_tag
    );

    let runner = SshRunner::new(destination, config.run_as.clone());
    let mut drives = scanner::load_drives(&runner, &settings.mount_filter).await?;

    let mut stdout = std::io::stdout();
    if cli.report_only {
        let goal = balancer::classify_drives(&mut drives, settings.threshold_band)?;
        cli::write_drive_table(&mut stdout, &drives, Some(goal))?;
        return Ok(());
    }

    cli::write_drive_table(&mut stdout, &drives, None)?;
    if !cli.yes && !cli::confirm(&mut std::io::stdin().lock(), &mut stdout)? {
        info!("Aborted by operator, nothing moved");
        return Ok(());
    }

    let event_hub = EventHub::new(256);
    let reporter = tokio::spawn(events::report_progress(event_hub.subscribe()));

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let result =
        balancer::run_balance(&runner, &settings, &event_hub, cancel, &mut drives).await;

    drop(event_hub);
    let _ = reporter.await;

    let summary = result?;
    info!(
        "Finished run {} in {}s: goal {:.2}%, {} rounds, {} partitions moved, {} failed, \
         {} bytes planned ({:?})",
        summary.run_id,
        (summary.finished_at - summary.started_at).num_seconds(),
        summary.goal * 100.0,
        summary.rounds,
        summary.partitions_moved,
        summary.partitions_failed,
        summary.bytes_planned,
        summary.stop_reason
    );
    Ok(())
}

/// Cancel the run on SIGTERM or SIGINT. Relocations already submitted keep running.
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { warn!("Received Ctrl+C, stopping after the current poll..."); },
        () = terminate => { warn!("Received SIGTERM, stopping after the current poll..."); },
    }
    cancel.cancel();
}
