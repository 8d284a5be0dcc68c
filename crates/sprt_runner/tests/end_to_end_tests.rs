//! Full runs against a simulated toolchain.
//!
//! The fake runner stands in for cargo, git and cutechess-cli: builds drop an
//! executable into `target/release`, clones create the checkout directory and
//! the match writes a PGN file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use sprt_runner::{
    resolve, run_sprt, CommandRunner, ConfigOverrides, HostOs, Invocation, Preset, ProcessExit,
    Result, RunRecord, RUN_RECORD_FILE, STEP_BUILD_LOCAL, STEP_BUILD_REFERENCE,
    STEP_CLONE_REFERENCE, STEP_RUN_MATCH,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{pid}_{nanos}"))
}

struct FakeToolchain {
    host: HostOs,
    engine: String,
    calls: Vec<Invocation>,
    /// Number of entries in the workspace when the first build started
    workspace_entries_at_build: Option<usize>,
    workspace: PathBuf,
}

impl FakeToolchain {
    fn new(host: HostOs, workspace: &Path) -> Self {
        Self {
            host,
            engine: "beatrijs".to_string(),
            calls: Vec::new(),
            workspace_entries_at_build: None,
            workspace: workspace.to_path_buf(),
        }
    }
}

impl CommandRunner for FakeToolchain {
    fn run(&mut self, invocation: &Invocation) -> Result<ProcessExit> {
        self.calls.push(invocation.clone());
        match invocation.program.as_str() {
            "cargo" => {
                if self.workspace_entries_at_build.is_none() {
                    let entries = fs::read_dir(&self.workspace).map(|d| d.count()).ok();
                    self.workspace_entries_at_build = entries;
                }
                let dir = invocation.cwd.clone().unwrap().join("target").join("release");
                fs::create_dir_all(&dir).unwrap();
                fs::write(dir.join(self.host.exe_name(&self.engine)), b"engine").unwrap();
            }
            "git" => {
                fs::create_dir_all(invocation.args.last().unwrap()).unwrap();
            }
            "cutechess-cli" => {
                let pgn = invocation
                    .args
                    .iter()
                    .skip_while(|a| a.as_str() != "-pgnout")
                    .nth(1)
                    .unwrap();
                fs::write(pgn, "[Event \"?\"]\n").unwrap();
            }
            other => panic!("unexpected program {}", other),
        }
        Ok(ProcessExit::ok())
    }
}

fn find<'a>(calls: &'a [Invocation], program: &str) -> Vec<&'a Invocation> {
    calls.iter().filter(|c| c.program == program).collect()
}

#[test]
fn test_dev_branch_with_hash_and_threads() {
    let root = unique_temp_dir("sprt_e2e");
    let workspace = root.join("tmp");

    // Leftovers from a previous run must disappear
    fs::create_dir_all(workspace.join("beatrijs")).unwrap();
    fs::write(workspace.join("sprt.pgn"), "old games").unwrap();

    let cli = ConfigOverrides {
        hash_mb: Some(64),
        threads: Some(4),
        branch: Some("dev".to_string()),
        source_dir: Some(root.clone()),
        workspace: Some(workspace.clone()),
        ..Default::default()
    };
    let (preset, config) = resolve(None, &cli);
    assert_eq!(preset, Preset::Adjudicated);

    let host = HostOs::current();
    let mut toolchain = FakeToolchain::new(host, &workspace);
    let record = run_sprt(&config, preset, host, &mut toolchain, true).unwrap();

    assert!(record.completed(), "{}", record.generate_report());
    let labels: Vec<_> = record.outcomes.iter().map(|o| o.label.as_str()).collect();
    let build_local = labels.iter().position(|l| *l == STEP_BUILD_LOCAL).unwrap();
    let clone = labels.iter().position(|l| *l == STEP_CLONE_REFERENCE).unwrap();
    let build_ref = labels.iter().position(|l| *l == STEP_BUILD_REFERENCE).unwrap();
    let run_match = labels.iter().position(|l| *l == STEP_RUN_MATCH).unwrap();
    assert!(build_local < clone && clone < build_ref && build_ref < run_match);

    // (1) workspace was empty before building
    assert_eq!(toolchain.workspace_entries_at_build, Some(0));

    // (2) local release build in the source tree
    let builds = find(&toolchain.calls, "cargo");
    assert_eq!(builds.len(), 2);
    assert_eq!(builds[0].args, vec!["build", "--release"]);
    assert_eq!(builds[0].cwd.as_deref(), Some(root.as_path()));

    // (3) dev branch cloned and built inside tmp/beatrijs
    let clone = find(&toolchain.calls, "git")[0];
    assert_eq!(&clone.args[..3], &["clone", "-b", "dev"]);
    assert_eq!(Path::new(clone.args.last().unwrap()), workspace.join("beatrijs"));
    assert_eq!(builds[1].cwd.as_deref(), Some(workspace.join("beatrijs").as_path()));

    // (4) both binaries staged
    let new_binary = workspace.join(host.exe_name("beatrijs-new"));
    let old_binary = workspace.join(host.exe_name("beatrijs-old"));
    assert!(new_binary.is_file());
    assert!(old_binary.is_file());

    // (5) match with concurrency 4 and hash 64 for both engines
    let matches = find(&toolchain.calls, "cutechess-cli");
    assert_eq!(matches.len(), 1);
    let args = &matches[0].args;
    let concurrency = args.iter().position(|a| a == "-concurrency").unwrap();
    assert_eq!(args[concurrency + 1], "4");
    assert!(args.contains(&"option.Hash=64".to_string()));
    assert!(args.contains(&format!("cmd={}", new_binary.display())));
    assert!(args.contains(&format!("cmd={}", old_binary.display())));

    // Old PGN replaced, run record present
    assert_eq!(fs::read_to_string(workspace.join("sprt.pgn")).unwrap(), "[Event \"?\"]\n");
    let saved = RunRecord::load(&workspace.join(RUN_RECORD_FILE)).unwrap();
    assert_eq!(saved.config.branch, "dev");
    assert!(saved.completed());

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_toml_file_selects_unadjudicated_preset() {
    let root = unique_temp_dir("sprt_e2e_toml");
    fs::create_dir_all(&root).unwrap();
    let config_path = root.join("sprt.toml");
    fs::write(
        &config_path,
        r#"
preset = "unadjudicated"
book = "openings/8moves.bin"
threads = 2
"#,
    )
    .unwrap();

    let file = ConfigOverrides::load(&config_path).unwrap();
    let cli = ConfigOverrides {
        source_dir: Some(root.clone()),
        workspace: Some(root.join("tmp")),
        ..Default::default()
    };
    let (preset, config) = resolve(Some(&file), &cli);

    let host = HostOs::current();
    let mut toolchain = FakeToolchain::new(host, &root.join("tmp"));
    let record = run_sprt(&config, preset, host, &mut toolchain, false).unwrap();
    assert!(record.completed());

    let args = &find(&toolchain.calls, "cutechess-cli")[0].args;
    assert!(args.contains(&"beta=0.95".to_string()));
    assert!(args.contains(&"book=openings/8moves.bin".to_string()));
    assert!(!args.iter().any(|a| a == "-draw" || a == "-resign"));
    assert!(!args.iter().any(|a| a.starts_with("option.Hash")));

    fs::remove_dir_all(&root).ok();
}
