//! Cron-driven import runs.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use fileimport_common::{ImportError, Result};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::processor::FileProcessor;

/// Parsed six-field cron expression (`sec min hour day-of-month month day-of-week`)
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: Schedule,
}

impl CronSchedule {
    /// Parse a cron expression.
    ///
    /// `?` is accepted as "any" in the day fields, and a classic five-field
    /// expression is run at second zero.
    pub fn parse(expr: &str) -> Result<Self> {
        let normalized = normalize(expr);
        let schedule = Schedule::from_str(&normalized)
            .map_err(|e| ImportError::config(format!("invalid cron expression '{expr}': {e}")))?;
        Ok(Self {
            expression: normalized,
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First fire time strictly after `t`.
    pub fn next_after(&self, t: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&t).next()
    }
}

fn normalize(expr: &str) -> String {
    let fields: Vec<String> = expr
        .split_whitespace()
        .map(|f| if f == "?" { "*".to_string() } else { f.to_string() })
        .collect();
    if fields.len() == 5 {
        format!("0 {}", fields.join(" "))
    } else {
        fields.join(" ")
    }
}

/// Run `processor` on every fire time of `schedule` until shutdown.
///
/// A run still in progress when the next fire time arrives is not
/// interrupted; that tick is skipped.
pub async fn run_scheduler(
    processor: Arc<FileProcessor>,
    schedule: CronSchedule,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!(cron = %schedule.expression(), "import scheduler started");

    loop {
        let now = Utc::now();
        let Some(next) = schedule.next_after(now) else {
            warn!(cron = %schedule.expression(), "cron expression has no upcoming fire time");
            return;
        };
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.recv() => {
                info!("import scheduler stopped");
                return;
            }
        }

        match processor.process_files().await {
            Ok(report) => info!(
                processed = report.processed,
                completed = report.completed,
                failed = report.failed.len(),
                "scheduled import finished"
            ),
            Err(ImportError::RunInProgress) => {
                warn!("previous import still running, skipping scheduled run")
            }
            Err(e) => error!(error = %e, "scheduled import failed"),
        }
    }
}
