//! Runs a whole SPRT session: plan, execute, record

use chrono::Utc;
use tracing::{info, warn};

use crate::config::{Preset, SprtConfig};
use crate::error::Result;
use crate::executor::{CommandRunner, Executor};
use crate::host::HostOs;
use crate::plan::{Invocation, Plan};
use crate::report::{RunRecord, RUN_RECORD_FILE};

/// Build the plan for `config`, execute it with `runner` and write the run
/// record into the workspace.
///
/// The record is written even when a strict run aborts, as long as the
/// workspace exists by then.
pub fn run_sprt<R: CommandRunner>(
    config: &SprtConfig,
    preset: Preset,
    host: HostOs,
    runner: R,
    strict: bool,
) -> Result<RunRecord> {
    let plan = Plan::build(config, host)?;
    info!(
        "testing {} against {}@{} ({} preset, concurrency {})",
        config.source_dir.display(),
        config.repo_url,
        config.branch,
        preset,
        config.threads
    );

    let started_at = Utc::now();
    let mut executor = Executor::new(runner).strict(strict);
    let result = executor.execute(&plan);

    let record = RunRecord {
        started_at,
        finished_at: Utc::now(),
        preset,
        host,
        config: config.clone(),
        match_command: plan
            .match_invocation()
            .map(Invocation::command_line)
            .unwrap_or_default(),
        steps: plan.steps,
        outcomes: executor.into_outcomes(),
    };

    if config.workspace.is_dir() {
        let path = config.workspace.join(RUN_RECORD_FILE);
        match record.save(&path) {
            Ok(()) => info!("run record written to {}", path.display()),
            Err(e) => warn!("could not write run record: {}", e),
        }
    }

    result.map(|()| record)
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod orchestrator_tests;
