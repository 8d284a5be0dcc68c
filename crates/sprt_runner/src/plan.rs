//! The ordered list of steps a run performs
//!
//! Building a [`Plan`] only reads the filesystem to validate paths: nothing
//! is modified and no process is spawned until an
//! [`Executor`](crate::Executor) walks it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::config::SprtConfig;
use crate::cutechess::{command_line, match_args};
use crate::error::{Result, SprtError};
use crate::host::HostOs;

pub const STEP_RECREATE_WORKSPACE: &str = "recreate workspace";
pub const STEP_BUILD_LOCAL: &str = "build local";
pub const STEP_CLONE_REFERENCE: &str = "clone reference";
pub const STEP_BUILD_REFERENCE: &str = "build reference";
pub const STEP_STAGE_NEW: &str = "stage new binary";
pub const STEP_STAGE_OLD: &str = "stage old binary";
pub const STEP_RUN_MATCH: &str = "run match";

/// An external program together with its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory (None = inherit)
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn command_line(&self) -> String {
        command_line(&self.program, &self.args)
    }
}

/// What a single step does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Remove the directory if present, then create it empty
    RecreateDir { path: PathBuf },
    Spawn(Invocation),
    Copy { from: PathBuf, to: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub label: String,
    pub action: Action,
}

impl Step {
    fn new(label: &str, action: Action) -> Self {
        Self {
            label: label.to_string(),
            action,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            Action::RecreateDir { path } => {
                write!(f, "{}: recreate {}", self.label, path.display())
            }
            Action::Spawn(inv) => match &inv.cwd {
                Some(dir) => write!(f, "{}: (in {}) {}", self.label, dir.display(), inv.command_line()),
                None => write!(f, "{}: {}", self.label, inv.command_line()),
            },
            Action::Copy { from, to } => {
                write!(f, "{}: copy {} -> {}", self.label, from.display(), to.display())
            }
        }
    }
}

/// A full run, ready to be executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub steps: Vec<Step>,
    /// Staged binary of the local build
    pub new_binary: PathBuf,
    /// Staged binary of the reference build
    pub old_binary: PathBuf,
    pub pgn_path: PathBuf,
}

impl Plan {
    /// Lay out every step of a run for `config` on `host`
    pub fn build(config: &SprtConfig, host: HostOs) -> Result<Self> {
        let (build_program, build_args) = config
            .build_command
            .split_first()
            .ok_or_else(|| SprtError::Config("build_command is empty".to_string()))?;
        if config.engine_name.is_empty() {
            return Err(SprtError::Config("engine_name is empty".to_string()));
        }
        check_workspace(config)?;

        let build_in = |dir: &Path| Invocation {
            program: build_program.clone(),
            args: build_args.to_vec(),
            cwd: Some(dir.to_path_buf()),
        };

        let exe = host.exe_name(&config.engine_name);
        let reference_dir = config.reference_dir();
        let local_binary = release_dir(&config.source_dir).join(&exe);
        let reference_binary = release_dir(&reference_dir).join(&exe);
        let new_binary = config
            .workspace
            .join(host.exe_name(&format!("{}-new", config.engine_name)));
        let old_binary = config
            .workspace
            .join(host.exe_name(&format!("{}-old", config.engine_name)));

        let clone = Invocation {
            program: "git".to_string(),
            args: vec![
                "clone".to_string(),
                "-b".to_string(),
                config.branch.clone(),
                config.repo_url.clone(),
                reference_dir.display().to_string(),
            ],
            cwd: None,
        };

        let run_match = Invocation {
            program: config.match_settings.tool.clone(),
            args: match_args(config, &new_binary, &old_binary),
            cwd: None,
        };

        let steps = vec![
            Step::new(
                STEP_RECREATE_WORKSPACE,
                Action::RecreateDir {
                    path: config.workspace.clone(),
                },
            ),
            Step::new(STEP_BUILD_LOCAL, Action::Spawn(build_in(&config.source_dir))),
            Step::new(STEP_CLONE_REFERENCE, Action::Spawn(clone)),
            Step::new(STEP_BUILD_REFERENCE, Action::Spawn(build_in(&reference_dir))),
            Step::new(
                STEP_STAGE_NEW,
                Action::Copy {
                    from: local_binary,
                    to: new_binary.clone(),
                },
            ),
            Step::new(
                STEP_STAGE_OLD,
                Action::Copy {
                    from: reference_binary,
                    to: old_binary.clone(),
                },
            ),
            Step::new(STEP_RUN_MATCH, Action::Spawn(run_match)),
        ];

        Ok(Self {
            steps,
            new_binary,
            old_binary,
            pgn_path: config.pgn_path(),
        })
    }

    /// The match-runner invocation, if the plan has one
    pub fn match_invocation(&self) -> Option<&Invocation> {
        self.steps
            .iter()
            .filter(|step| step.label == STEP_RUN_MATCH)
            .find_map(|step| match &step.action {
                Action::Spawn(inv) => Some(inv),
                _ => None,
            })
    }

    /// Numbered, one-line-per-step description for `--dry-run`
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("{:>2}. {}\n", i + 1, step));
        }
        out
    }
}

/// The workspace is wiped on every run, so it must not hold the source tree
fn check_workspace(config: &SprtConfig) -> Result<()> {
    if config.workspace.as_os_str().is_empty() {
        return Err(SprtError::Config("workspace is empty".to_string()));
    }

    let workspace = resolve_path(&config.workspace);
    let source = resolve_path(&config.source_dir);
    if source.starts_with(&workspace) {
        return Err(SprtError::Config(format!(
            "workspace {} contains the source tree {}",
            config.workspace.display(),
            config.source_dir.display()
        )));
    }
    Ok(())
}

/// Absolute, lexically normalised form of `path` with its longest existing
/// prefix canonicalised, so symlinked and not-yet-created paths compare alike
fn resolve_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };
    let normal = normalize(&absolute);

    let mut existing = normal.as_path();
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = std::fs::canonicalize(existing) {
            return rest
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return normal,
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn release_dir(root: &Path) -> PathBuf {
    root.join("target").join("release")
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod plan_tests;
