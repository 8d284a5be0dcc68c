//! Run configuration
//!
//! A run is configured in three layers, lowest precedence first:
//! a named [`Preset`], an optional TOML file, and command-line flags.
//! The file and the flags are both expressed as [`ConfigOverrides`].

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SprtError};

/// Remote repository the reference build is cloned from
pub const DEFAULT_REPO_URL: &str = "https://github.com/dewaeq/beatrijs";

/// Cargo binary name of the engine
pub const DEFAULT_ENGINE_NAME: &str = "beatrijs";

/// Default number of concurrent games
pub const DEFAULT_THREADS: u32 = 6;

/// Default branch to test against
pub const DEFAULT_BRANCH: &str = "master";

/// Default scratch workspace, relative to the working directory
pub const DEFAULT_WORKSPACE: &str = "tmp";

/// Named bundles of match defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Draw and resign adjudication, beta = 0.05
    #[default]
    Adjudicated,
    /// No adjudication, beta = 0.95
    Unadjudicated,
}

impl Preset {
    pub fn name(self) -> &'static str {
        match self {
            Preset::Adjudicated => "adjudicated",
            Preset::Unadjudicated => "unadjudicated",
        }
    }

    /// Opening book used when nothing overrides it
    pub fn book(self) -> PathBuf {
        match self {
            Preset::Adjudicated => PathBuf::from("./book.bin"),
            Preset::Unadjudicated => PathBuf::from("./books/book.bin"),
        }
    }

    pub fn beta(self) -> f64 {
        match self {
            Preset::Adjudicated => 0.05,
            Preset::Unadjudicated => 0.95,
        }
    }

    pub fn adjudicated(self) -> bool {
        matches!(self, Preset::Adjudicated)
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// SPRT hypotheses and error rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SprtBounds {
    pub elo0: f64,
    pub elo1: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl Default for SprtBounds {
    fn default() -> Self {
        Self {
            elo0: 0.0,
            elo1: 10.0,
            alpha: 0.05,
            beta: 0.05,
        }
    }
}

/// Declare a draw once both engines agree the score is close for long enough
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawAdjudication {
    pub move_number: u32,
    pub move_count: u32,
    pub score: i32,
}

impl Default for DrawAdjudication {
    fn default() -> Self {
        Self {
            move_number: 40,
            move_count: 20,
            score: 10,
        }
    }
}

/// Declare a loss once an engine has been lost by `score` for `move_count` moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResignAdjudication {
    pub move_count: u32,
    pub score: i32,
}

impl Default for ResignAdjudication {
    fn default() -> Self {
        Self {
            move_count: 15,
            score: 600,
        }
    }
}

/// Everything passed to the match runner apart from the engines themselves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Program name of the tournament manager
    pub tool: String,
    pub time_control: String,
    /// Restart engines between games
    pub restart: bool,
    pub protocol: String,
    /// Plies taken from the opening book
    pub book_depth: u32,
    /// Games per pairing
    pub games: u32,
    pub rounds: u32,
    pub repeat: u32,
    pub max_moves: u32,
    pub sprt: SprtBounds,
    pub draw: Option<DrawAdjudication>,
    pub resign: Option<ResignAdjudication>,
    /// Print ratings every N games
    pub rating_interval: u32,
    /// Keep playing after an engine crash
    pub recover: bool,
    /// PGN log file name inside the workspace
    pub pgn_file: String,
}

impl MatchSettings {
    pub fn for_preset(preset: Preset) -> Self {
        let adjudicated = preset.adjudicated();
        Self {
            tool: "cutechess-cli".to_string(),
            time_control: "inf/8+0.08".to_string(),
            restart: true,
            protocol: "uci".to_string(),
            book_depth: 4,
            games: 2,
            rounds: 2500,
            repeat: 2,
            max_moves: 200,
            sprt: SprtBounds {
                beta: preset.beta(),
                ..Default::default()
            },
            draw: adjudicated.then(DrawAdjudication::default),
            resign: adjudicated.then(ResignAdjudication::default),
            rating_interval: 10,
            recover: true,
            pgn_file: "sprt.pgn".to_string(),
        }
    }
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self::for_preset(Preset::default())
    }
}

/// Fully resolved configuration of a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprtConfig {
    /// Hash table size in MB for both engines (None = engine default)
    pub hash_mb: Option<u32>,
    /// Concurrency handed to the match runner
    pub threads: u32,
    /// Branch of the reference repository
    pub branch: String,
    /// Opening book path
    pub book: PathBuf,
    pub repo_url: String,
    pub engine_name: String,
    /// Local source tree that is built as the "new" engine
    pub source_dir: PathBuf,
    /// Scratch directory, recreated empty on every run
    pub workspace: PathBuf,
    /// Program and arguments of the release build
    pub build_command: Vec<String>,
    pub match_settings: MatchSettings,
}

impl SprtConfig {
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            hash_mb: None,
            threads: DEFAULT_THREADS,
            branch: DEFAULT_BRANCH.to_string(),
            book: preset.book(),
            repo_url: DEFAULT_REPO_URL.to_string(),
            engine_name: DEFAULT_ENGINE_NAME.to_string(),
            source_dir: PathBuf::from("."),
            workspace: PathBuf::from(DEFAULT_WORKSPACE),
            build_command: vec![
                "cargo".to_string(),
                "build".to_string(),
                "--release".to_string(),
            ],
            match_settings: MatchSettings::for_preset(preset),
        }
    }

    /// Where the reference repository is cloned
    pub fn reference_dir(&self) -> PathBuf {
        self.workspace.join(&self.engine_name)
    }

    /// Where the match runner writes its game log
    pub fn pgn_path(&self) -> PathBuf {
        self.workspace.join(&self.match_settings.pgn_file)
    }
}

impl Default for SprtConfig {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}

/// A partial configuration, read from TOML or assembled from CLI flags
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub preset: Option<Preset>,
    pub hash_mb: Option<u32>,
    pub threads: Option<u32>,
    pub branch: Option<String>,
    pub book: Option<PathBuf>,
    pub repo_url: Option<String>,
    pub engine_name: Option<String>,
    pub source_dir: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
    pub build_command: Option<Vec<String>>,
    pub tool: Option<String>,
    pub time_control: Option<String>,
    pub games: Option<u32>,
    pub rounds: Option<u32>,
    pub max_moves: Option<u32>,
    /// `false` strips draw and resign adjudication, `true` restores the defaults
    pub adjudicate: Option<bool>,
    pub sprt: Option<SprtOverrides>,
}

/// Partial `[sprt]` table
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SprtOverrides {
    pub elo0: Option<f64>,
    pub elo1: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
}

impl ConfigOverrides {
    /// Parse overrides from TOML text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SprtError::Config(e.to_string()))
    }

    /// Load overrides from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| SprtError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|e| match e {
            SprtError::Config(msg) => SprtError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Overwrite every field of `config` that this layer sets
    pub fn apply_to(&self, config: &mut SprtConfig) {
        if let Some(hash) = self.hash_mb {
            config.hash_mb = Some(hash);
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(branch) = &self.branch {
            config.branch = branch.clone();
        }
        if let Some(book) = &self.book {
            config.book = book.clone();
        }
        if let Some(url) = &self.repo_url {
            config.repo_url = url.clone();
        }
        if let Some(name) = &self.engine_name {
            config.engine_name = name.clone();
        }
        if let Some(dir) = &self.source_dir {
            config.source_dir = dir.clone();
        }
        if let Some(dir) = &self.workspace {
            config.workspace = dir.clone();
        }
        if let Some(command) = &self.build_command {
            config.build_command = command.clone();
        }

        let settings = &mut config.match_settings;
        if let Some(tool) = &self.tool {
            settings.tool = tool.clone();
        }
        if let Some(tc) = &self.time_control {
            settings.time_control = tc.clone();
        }
        if let Some(games) = self.games {
            settings.games = games;
        }
        if let Some(rounds) = self.rounds {
            settings.rounds = rounds;
        }
        if let Some(max_moves) = self.max_moves {
            settings.max_moves = max_moves;
        }
        match self.adjudicate {
            Some(true) => {
                settings.draw.get_or_insert_with(DrawAdjudication::default);
                settings.resign.get_or_insert_with(ResignAdjudication::default);
            }
            Some(false) => {
                settings.draw = None;
                settings.resign = None;
            }
            None => {}
        }
        if let Some(sprt) = &self.sprt {
            let bounds = &mut settings.sprt;
            bounds.elo0 = sprt.elo0.unwrap_or(bounds.elo0);
            bounds.elo1 = sprt.elo1.unwrap_or(bounds.elo1);
            bounds.alpha = sprt.alpha.unwrap_or(bounds.alpha);
            bounds.beta = sprt.beta.unwrap_or(bounds.beta);
        }
    }
}

/// Combine the layers into a final configuration.
///
/// The preset is taken from the CLI, then the file, then the default.
pub fn resolve(file: Option<&ConfigOverrides>, cli: &ConfigOverrides) -> (Preset, SprtConfig) {
    let preset = cli
        .preset
        .or_else(|| file.and_then(|f| f.preset))
        .unwrap_or_default();

    let mut config = SprtConfig::from_preset(preset);
    if let Some(file) = file {
        file.apply_to(&mut config);
    }
    cli.apply_to(&mut config);

    (preset, config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
