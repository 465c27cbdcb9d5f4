//! Main entry point for the OSS file import server.
//!
//! Loads configuration, starts the cron-driven import scheduler, and serves
//! the REST API until Ctrl+C or SIGTERM.

use std::sync::Arc;

use clap::Parser;
use fileimport_core::{CronSchedule, run_scheduler};
use fileimport_server::{AppState, Cli, Configuration, startup};
use tracing::{error, info, warn};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let configuration = Configuration::new(&cli)?;

    let _logging_guard = startup::init_logging(&configuration.logging_config()?)?;

    configuration.validate()?;
    let server_settings = configuration.server_settings()?;
    let task_settings = configuration.task_settings()?;

    let app_state = Arc::new(AppState::from_configuration(&configuration).await?);
    let shutdown = startup::wait_for_shutdown_signal().await;

    if cli.run_once {
        info!("running a single import");
        let outcome =
            startup::run_with_shutdown(app_state.processor().process_files(), shutdown.subscribe())
                .await;
        return match outcome {
            Some(Ok(report)) if report.is_clean() => {
                info!(completed = report.completed, "import finished");
                Ok(())
            }
            Some(Ok(report)) => {
                error!(failed = ?report.failed, "import finished with failures");
                Err(format!("{} file(s) failed to import", report.failed.len()).into())
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(()),
        };
    }

    let scheduler = if task_settings.enabled {
        let schedule = CronSchedule::parse(&task_settings.cron)?;
        Some(tokio::spawn(run_scheduler(
            app_state.processor().clone(),
            schedule,
            shutdown.subscribe(),
        )))
    } else {
        warn!("scheduled imports are disabled, only manual runs are available");
        None
    };

    let server = startup::main_server(app_state, &server_settings)?;
    let handle = server.handle();
    let mut stop_rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = stop_rx.recv().await;
        handle.stop(true).await;
    });

    info!(
        address = %server_settings.address,
        port = server_settings.port,
        context_path = %server_settings.context_path,
        "file import server started"
    );
    server.await?;

    // The server can also exit on its own; make sure the scheduler follows.
    shutdown.shutdown();
    if let Some(scheduler) = scheduler
        && let Err(e) = scheduler.await
    {
        error!(error = %e, "scheduler task ended abnormally");
    }

    info!("file import server stopped");
    Ok(())
}
