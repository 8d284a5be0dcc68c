use super::*;
use crate::config::{Preset, SprtConfig};

fn args_for(config: &SprtConfig) -> Vec<String> {
    match_args(config, Path::new("tmp/beatrijs-new"), Path::new("tmp/beatrijs-old"))
}

/// Value following `flag` in the argument list
fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1).map(String::as_str)
}

#[test]
fn test_engines_come_first() {
    let args = args_for(&SprtConfig::default());
    assert_eq!(
        &args[..6],
        &[
            "-engine",
            "cmd=tmp/beatrijs-new",
            "name=new",
            "-engine",
            "cmd=tmp/beatrijs-old",
            "name=old",
        ]
    );
}

#[test]
fn test_default_adjudicated_args() {
    let args = args_for(&SprtConfig::default());
    let line = args.join(" ");

    assert!(line.contains("-each restart=on tc=inf/8+0.08 book=./book.bin bookdepth=4 proto=uci"));
    assert!(line.contains("-games 2 -rounds 2500 -repeat 2 -maxmoves 200"));
    assert!(line.contains("-sprt elo0=0 elo1=10 alpha=0.05 beta=0.05"));
    assert!(line.contains("-draw movenumber=40 movecount=20 score=10"));
    assert!(line.contains("-resign movecount=15 score=600"));
    assert!(line.contains("-ratinginterval 10 -recover -pgnout"));
    assert_eq!(value_after(&args, "-concurrency"), Some("6"));
}

#[test]
fn test_unadjudicated_args() {
    let args = args_for(&SprtConfig::from_preset(Preset::Unadjudicated));
    let line = args.join(" ");

    assert!(line.contains("beta=0.95"));
    assert!(line.contains("book=./books/book.bin"));
    assert!(!args.iter().any(|a| a == "-draw"));
    assert!(!args.iter().any(|a| a == "-resign"));
}

#[test]
fn test_hash_option_only_when_set() {
    let mut config = SprtConfig::default();
    let args = args_for(&config);
    assert!(!args.iter().any(|a| a.starts_with("option.Hash")));

    config.hash_mb = Some(64);
    let args = args_for(&config);
    let hash_args: Vec<_> = args.iter().filter(|a| a.starts_with("option.Hash")).collect();
    assert_eq!(hash_args, vec!["option.Hash=64"]);

    // Hash belongs to -each so both engines receive it
    let each = args.iter().position(|a| a == "-each").unwrap();
    let hash = args.iter().position(|a| a == "option.Hash=64").unwrap();
    let games = args.iter().position(|a| a == "-games").unwrap();
    assert!(each < hash && hash < games);
}

#[test]
fn test_concurrency_and_pgn_follow_config() {
    let mut config = SprtConfig::default();
    config.threads = 4;
    config.workspace = "scratch".into();

    let args = args_for(&config);
    assert_eq!(value_after(&args, "-concurrency"), Some("4"));
    let pgn = value_after(&args, "-pgnout").unwrap();
    assert_eq!(Path::new(pgn), Path::new("scratch").join("sprt.pgn"));
}

#[test]
fn test_recover_can_be_disabled() {
    let mut config = SprtConfig::default();
    config.match_settings.recover = false;
    config.match_settings.restart = false;

    let args = args_for(&config);
    assert!(!args.iter().any(|a| a == "-recover"));
    assert!(args.iter().any(|a| a == "restart=off"));
}

#[test]
fn test_command_line_quotes_spaces() {
    let line = command_line(
        "cutechess-cli",
        &["-engine".to_string(), "cmd=my dir/engine".to_string(), String::new()],
    );
    assert_eq!(line, "cutechess-cli -engine \"cmd=my dir/engine\" \"\"");
}
