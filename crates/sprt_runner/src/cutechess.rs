//! Argument list for the cutechess-cli match runner

use std::path::Path;

use crate::config::SprtConfig;

/// Display name of the locally built engine
pub const NEW_ENGINE_NAME: &str = "new";

/// Display name of the reference engine
pub const OLD_ENGINE_NAME: &str = "old";

/// Build the argument list for an SPRT match between `new_engine` and `old_engine`.
///
/// The result is meant to be passed to a process spawn as-is; nothing is
/// quoted or escaped.
pub fn match_args(config: &SprtConfig, new_engine: &Path, old_engine: &Path) -> Vec<String> {
    let settings = &config.match_settings;
    let mut args = Vec::new();

    push_engine(&mut args, new_engine, NEW_ENGINE_NAME);
    push_engine(&mut args, old_engine, OLD_ENGINE_NAME);

    // Options shared by both engines
    args.push("-each".to_string());
    args.push(format!("restart={}", if settings.restart { "on" } else { "off" }));
    args.push(format!("tc={}", settings.time_control));
    args.push(format!("book={}", config.book.display()));
    args.push(format!("bookdepth={}", settings.book_depth));
    args.push(format!("proto={}", settings.protocol));
    if let Some(hash) = config.hash_mb {
        args.push(format!("option.Hash={}", hash));
    }

    push_flag(&mut args, "-games", settings.games);
    push_flag(&mut args, "-rounds", settings.rounds);
    push_flag(&mut args, "-repeat", settings.repeat);
    push_flag(&mut args, "-maxmoves", settings.max_moves);

    let sprt = &settings.sprt;
    args.push("-sprt".to_string());
    args.push(format!("elo0={}", sprt.elo0));
    args.push(format!("elo1={}", sprt.elo1));
    args.push(format!("alpha={}", sprt.alpha));
    args.push(format!("beta={}", sprt.beta));

    push_flag(&mut args, "-concurrency", config.threads);

    if let Some(draw) = &settings.draw {
        args.push("-draw".to_string());
        args.push(format!("movenumber={}", draw.move_number));
        args.push(format!("movecount={}", draw.move_count));
        args.push(format!("score={}", draw.score));
    }
    if let Some(resign) = &settings.resign {
        args.push("-resign".to_string());
        args.push(format!("movecount={}", resign.move_count));
        args.push(format!("score={}", resign.score));
    }

    push_flag(&mut args, "-ratinginterval", settings.rating_interval);
    if settings.recover {
        args.push("-recover".to_string());
    }
    args.push("-pgnout".to_string());
    args.push(config.pgn_path().display().to_string());

    args
}

fn push_engine(args: &mut Vec<String>, cmd: &Path, name: &str) {
    args.push("-engine".to_string());
    args.push(format!("cmd={}", cmd.display()));
    args.push(format!("name={}", name));
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: u32) {
    args.push(flag.to_string());
    args.push(value.to_string());
}

/// Render a program and its arguments as a single human-readable line.
///
/// Only for logs and run records; never handed to a shell.
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(|part| {
            if part.is_empty() || part.contains(char::is_whitespace) {
                format!("\"{}\"", part)
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "cutechess_tests.rs"]
mod cutechess_tests;
