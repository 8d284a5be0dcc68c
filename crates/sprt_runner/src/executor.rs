//! Executes a [`Plan`] step by step

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, ExitStatus};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{Result, SprtError};
use crate::plan::{Action, Invocation, Plan, Step};

/// Exit information of a finished step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessExit {
    pub success: bool,
    /// Exit code (None if the process was killed by a signal)
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn from_code(code: i32) -> Self {
        Self {
            success: code == 0,
            code: Some(code),
        }
    }

    fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

impl From<ExitStatus> for ProcessExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

/// Spawns external programs.
///
/// The system implementation blocks until the child exits; tests substitute
/// a runner that only records invocations.
pub trait CommandRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ProcessExit>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &mut T {
    fn run(&mut self, invocation: &Invocation) -> Result<ProcessExit> {
        (**self).run(invocation)
    }
}

/// Runs programs with inherited stdio so their output reaches the console
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ProcessExit> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        let status = command.status().map_err(|source| SprtError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        Ok(status.into())
    }
}

/// What happened to one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub label: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub elapsed_ms: u64,
    /// Error message for steps that never produced an exit status
    pub error: Option<String>,
}

impl StepOutcome {
    fn finished(step: &Step, exit: ProcessExit, elapsed: Duration) -> Self {
        Self {
            label: step.label.clone(),
            success: exit.success,
            exit_code: exit.code,
            elapsed_ms: millis(elapsed),
            error: None,
        }
    }

    fn errored(step: &Step, err: &SprtError, elapsed: Duration) -> Self {
        Self {
            label: step.label.clone(),
            success: false,
            exit_code: None,
            elapsed_ms: millis(elapsed),
            error: Some(err.to_string()),
        }
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Walks a plan in order.
///
/// By default a failing step is logged and the run continues, so a broken
/// build still shows up as a failed match. That includes programs that
/// cannot be spawned at all. In strict mode the first failure ends the run.
pub struct Executor<R> {
    runner: R,
    strict: bool,
    outcomes: Vec<StepOutcome>,
}

impl<R: CommandRunner> Executor<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            strict: false,
            outcomes: Vec::new(),
        }
    }

    /// Stop at the first failed step
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Execute every step of `plan`, recording an outcome per attempted step
    pub fn execute(&mut self, plan: &Plan) -> Result<()> {
        let total = plan.steps.len();
        for (i, step) in plan.steps.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, total, step.label);

            let started = Instant::now();
            let result = self.perform(step);
            let elapsed = started.elapsed();

            match result {
                Ok(exit) => {
                    self.outcomes.push(StepOutcome::finished(step, exit, elapsed));
                    if !exit.success {
                        warn!("step '{}' failed with {}", step.label, exit.describe());
                        if self.strict {
                            return Err(SprtError::StepFailed {
                                step: step.label.clone(),
                                status: exit.describe(),
                            });
                        }
                    }
                }
                Err(err) => {
                    warn!("step '{}' failed: {}", step.label, err);
                    self.outcomes.push(StepOutcome::errored(step, &err, elapsed));
                    if self.strict {
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }

    fn perform(&mut self, step: &Step) -> Result<ProcessExit> {
        match &step.action {
            Action::RecreateDir { path } => {
                recreate_dir(path)?;
                Ok(ProcessExit::ok())
            }
            Action::Copy { from, to } => {
                debug!("copy {} -> {}", from.display(), to.display());
                fs::copy(from, to).map_err(|source| SprtError::Io {
                    path: from.clone(),
                    source,
                })?;
                Ok(ProcessExit::ok())
            }
            Action::Spawn(invocation) => {
                debug!("spawn {}", invocation.command_line());
                self.runner.run(invocation)
            }
        }
    }

    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<StepOutcome> {
        self.outcomes
    }
}

/// Remove `path` if it exists and create it again, empty
pub fn recreate_dir(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => debug!("removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(source) => {
            return Err(SprtError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }
    fs::create_dir_all(path).map_err(|source| SprtError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod executor_tests;
