//! Run record storage and reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{Preset, SprtConfig};
use crate::error::{Result, SprtError};
use crate::executor::StepOutcome;
use crate::host::HostOs;
use crate::plan::Step;

/// File name of the run record inside the workspace
pub const RUN_RECORD_FILE: &str = "sprt_run.json";

/// Everything needed to understand a finished (or aborted) run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub preset: Preset,
    pub host: HostOs,
    pub config: SprtConfig,
    pub steps: Vec<Step>,
    /// Match runner command line, for copy-pasting
    pub match_command: String,
    pub outcomes: Vec<StepOutcome>,
}

impl RunRecord {
    /// True when every planned step ran and succeeded
    pub fn completed(&self) -> bool {
        self.outcomes.len() == self.steps.len() && self.outcomes.iter().all(|o| o.success)
    }

    pub fn failed_steps(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| o.label.as_str())
            .collect()
    }

    /// Save record to JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| SprtError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load record from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| SprtError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(SprtError::Deserialize)
    }

    /// Generate a text report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "=== SPRT run: {} vs {} ({}) ===\n\n",
            self.config.source_dir.display(),
            self.config.branch,
            self.preset
        ));
        report.push_str(&format!("{:<20} {:>8} {:>10}\n", "Step", "Status", "Time"));
        report.push_str(&"-".repeat(40));
        report.push('\n');

        for outcome in &self.outcomes {
            let status = match (outcome.success, outcome.exit_code) {
                (true, _) => "ok".to_string(),
                (false, Some(code)) => format!("exit {}", code),
                (false, None) => "error".to_string(),
            };
            report.push_str(&format!(
                "{:<20} {:>8} {:>8.1}s\n",
                outcome.label,
                status,
                outcome.elapsed_ms as f64 / 1000.0
            ));
        }

        let skipped = self.steps.len().saturating_sub(self.outcomes.len());
        if skipped > 0 {
            report.push_str(&format!("({} step(s) not run)\n", skipped));
        }

        report
    }

    /// Print report to stdout
    pub fn print_report(&self) {
        println!("{}", self.generate_report());
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod report_tests;
