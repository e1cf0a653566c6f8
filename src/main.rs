/*!
 * Round-Robin Scheduler Daemon - Main Entry Point
 *
 * Starts the process registry, the scheduling loop and the control socket,
 * then runs until Ctrl+C.
 */

use miette::IntoDiagnostic;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};

use rr_sched::{
    init_tracing, ControlChannel, ControlServer, ProcessRegistry, SchedulerConfig,
    SchedulerTask, SignalController,
};

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing();

    info!("Round-robin scheduler starting...");
    let config = SchedulerConfig::load()?;

    info!("Initializing process registry...");
    let controller = Arc::new(SignalController::new());
    let registry = Arc::new(ProcessRegistry::with_lock_timeout(
        controller,
        config.lock_timeout(),
    ));

    info!(quantum = ?config.quantum(), "Starting scheduling loop...");
    let task = SchedulerTask::spawn(Arc::clone(&registry), &config)?;

    let channel = ControlChannel::new(Arc::clone(&registry), config.read_mode);
    let server = ControlServer::bind(&config.socket_path, channel)?;
    let socket = server.path().to_path_buf();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let serving = tokio::spawn(server.serve(async {
        let _ = stop_rx.await;
    }));

    info!(socket = %socket.display(), "Scheduler ready - register with `echo $$ | nc -U {}`", socket.display());
    info!("Press Ctrl+C to exit");

    tokio::signal::ctrl_c().await.into_diagnostic()?;
    info!("Shutdown signal received");

    let _ = stop_tx.send(());
    match serving.await {
        Ok(Err(e)) => error!(error = %e, "Control server error"),
        Err(e) => error!(error = %e, "Control server task failed"),
        Ok(Ok(())) => {}
    }

    let released = task.shutdown().await;
    info!(released, "Scheduler stopped");
    Ok(())
}
