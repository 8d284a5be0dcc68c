//! Host operating system detection

use serde::{Deserialize, Serialize};

/// The operating system family the orchestrator runs on.
///
/// Only the executable suffix depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostOs {
    Windows,
    Unix,
}

impl HostOs {
    /// The OS this binary was compiled for
    pub fn current() -> Self {
        if cfg!(windows) {
            HostOs::Windows
        } else {
            HostOs::Unix
        }
    }

    /// Suffix appended to executable file names
    pub fn exe_suffix(self) -> &'static str {
        match self {
            HostOs::Windows => ".exe",
            HostOs::Unix => "",
        }
    }

    /// File name of an executable called `stem` on this host
    pub fn exe_name(self, stem: &str) -> String {
        format!("{}{}", stem, self.exe_suffix())
    }
}

impl std::fmt::Display for HostOs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostOs::Windows => write!(f, "windows"),
            HostOs::Unix => write!(f, "unix"),
        }
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod host_tests;
