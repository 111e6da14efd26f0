//! OpenDDL command-line tool for checking and reformatting .oddl files.
//!
//! Usage: oddl [lint|minimize|pretty] [OPTIONS] <FILE>...
//!
//! Options:
//!   -w, --write            Rewrite each file in place (minimize, pretty)
//!   --max-depth <N>        Deepest allowed structure nesting [env: ODDL_MAX_DEPTH]
//!   -h, --help             Print help
//!   -V, --version          Print version

use liboddl::{parse_with_options, Diagnostic, Document, Format, ParseOptions};
use std::fs;
use std::path::Path;
use std::process;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Lint,
    Minimize,
    Pretty,
}

impl Action {
    /// Letter and word forms, optionally prefixed by `-` and `--`.
    fn from_arg(arg: &str) -> Option<Action> {
        match arg {
            "l" | "lint" | "-l" | "--lint" => Some(Action::Lint),
            "m" | "minimize" | "-m" | "--minimize" => Some(Action::Minimize),
            "p" | "pretty" | "-p" | "--pretty" => Some(Action::Pretty),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
struct Config {
    action: Action,
    write_back: bool,
    max_depth: Option<usize>,
    files: Vec<String>,
}

#[derive(Debug, PartialEq)]
enum Command {
    Run(Config),
    Help,
    Version,
}

fn is_help(arg: &str) -> bool {
    matches!(arg, "h" | "help" | "-h" | "--help")
}

fn parse_depth(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Invalid nesting depth: {}", s)),
    }
}

/// Interpret the arguments after the program name. An action word is only
/// recognized first; after that, bare words are file names.
fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut config = Config {
        action: Action::Lint,
        write_back: false,
        max_depth: None,
        files: Vec::new(),
    };
    if args.is_empty() {
        return Ok(Command::Help);
    }

    let mut i = 0;
    if is_help(&args[0]) {
        return Ok(Command::Help);
    }
    if let Some(action) = Action::from_arg(&args[0]) {
        config.action = action;
        i = 1;
    }

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            "-w" | "--write" => {
                config.write_back = true;
            }
            "--max-depth" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| "--max-depth requires an argument".to_string())?;
                config.max_depth = Some(parse_depth(value)?);
            }
            arg if arg.starts_with('-') => match Action::from_arg(arg) {
                Some(action) => config.action = action,
                None => return Err(format!("Unknown option: {}", arg)),
            },
            arg => config.files.push(arg.to_string()),
        }
        i += 1;
    }

    if config.files.is_empty() {
        return Err("No input files".to_string());
    }
    if config.write_back && config.action == Action::Lint {
        return Err("--write only applies to minimize and pretty".to_string());
    }
    Ok(Command::Run(config))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match parse_args(&args) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            print_help();
            return;
        }
        Ok(Command::Version) => {
            println!("oddl {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Try 'oddl --help' for usage.");
            process::exit(1);
        }
    };

    let mut options = ParseOptions::default();
    if let Ok(value) = std::env::var("ODDL_MAX_DEPTH") {
        match parse_depth(&value) {
            Ok(n) => options.max_depth = n,
            Err(e) => {
                eprintln!("Error: ODDL_MAX_DEPTH: {}", e);
                process::exit(1);
            }
        }
    }
    if let Some(n) = config.max_depth {
        options.max_depth = n;
    }

    let mut exit_code = 0;
    for path in &config.files {
        if !process_file(path, &config, &options) {
            exit_code = 1;
        }
    }
    process::exit(exit_code);
}

/// Run the action on one file. Returns false if the file could not be read,
/// parsed, or written, or if linting found errors.
fn process_file(path: &str, config: &Config, options: &ParseOptions) -> bool {
    let _span = info_span!("file", path).entered();

    let input = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", path, e);
            return false;
        }
    };

    let filename = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());
    let doc = match parse_with_options(&input, &options.clone().with_filename(&filename)) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            return false;
        }
    };

    let format = match config.action {
        Action::Lint => {
            let findings = lint_report(&doc);
            if findings.is_empty() {
                println!("{}: ok", path);
            }
            for finding in &findings {
                println!("{}:{}", path, finding);
            }
            return !findings.iter().any(|d| d.is_error());
        }
        Action::Minimize => Format::Minimized,
        Action::Pretty => Format::Pretty,
    };

    let mut output = doc.write(format);
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }

    if config.write_back {
        if output == input {
            info!("unchanged");
            return true;
        }
        if let Err(e) = fs::write(path, &output) {
            eprintln!("Error writing {}: {}", path, e);
            return false;
        }
        info!(bytes = output.len(), "rewrote");
    } else {
        print!("{}", output);
    }
    true
}

/// Parse advisories and linter findings together, ordered by position.
fn lint_report(doc: &Document) -> Vec<Diagnostic> {
    let mut findings = doc.warnings().to_vec();
    findings.extend(doc.check());
    findings.sort_by_key(|d| (d.line, d.column));
    findings
}

fn print_help() {
    println!(
        "oddl - OpenDDL command-line tool

USAGE:
    oddl [lint|minimize|pretty] [OPTIONS] <FILE>...
    oddl help

ACTIONS:
    h, help        Show this usage and quit
    l, lint        Check each .oddl file and report any problems (easiest to
                   use after pretty); this is the default action
    m, minimize    Remove all redundant whitespace from each .oddl file
    p, pretty      Insert newlines and whitespace to make each .oddl file
                   human-readable

    Letter actions may be prefixed by - and word actions by --, e.g. -m or
    --pretty.

OPTIONS:
    -w, --write            Rewrite each file in place instead of printing it
                           (minimize and pretty only)

    --max-depth <N>        Deepest allowed structure nesting [default: {}]
                           Also read from the ODDL_MAX_DEPTH environment variable

    -h, --help             Print help

    -V, --version          Print version

Lint reports parse advisories alongside its findings. Set RUST_LOG=info for
per-file progress on stderr.
Exits with status 1 if any file fails to parse or has lint errors.

EXAMPLES:
    # Check files
    oddl scene.oddl materials.oddl

    # Reformat a file in place
    oddl pretty -w scene.oddl

    # Print the minimized form
    oddl -m scene.oddl",
        liboddl::DEFAULT_MAX_DEPTH
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run(list: &[&str]) -> Config {
        match parse_args(&args(list)) {
            Ok(Command::Run(config)) => config,
            other => panic!("expected a run: {:?}", other),
        }
    }

    #[test]
    fn test_default_action_is_lint() {
        let config = run(&["a.oddl", "b.oddl"]);
        assert_eq!(config.action, Action::Lint);
        assert_eq!(config.files, vec!["a.oddl", "b.oddl"]);
    }

    #[test]
    fn test_action_forms() {
        for form in ["m", "minimize", "-m", "--minimize"] {
            assert_eq!(run(&[form, "x.oddl"]).action, Action::Minimize);
        }
        for form in ["p", "pretty", "-p", "--pretty"] {
            assert_eq!(run(&[form, "x.oddl"]).action, Action::Pretty);
        }
        assert_eq!(run(&["--lint", "x.oddl"]).action, Action::Lint);
        // A bare word after the first argument is a file.
        assert_eq!(run(&["x.oddl", "pretty"]).files, vec!["x.oddl", "pretty"]);
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse_args(&[]), Ok(Command::Help));
        for form in ["h", "help", "-h", "--help"] {
            assert_eq!(parse_args(&args(&[form])), Ok(Command::Help));
        }
        assert_eq!(parse_args(&args(&["-V"])), Ok(Command::Version));
    }

    #[test]
    fn test_options() {
        let config = run(&["pretty", "-w", "--max-depth", "12", "x.oddl"]);
        assert!(config.write_back);
        assert_eq!(config.max_depth, Some(12));
    }

    #[test]
    fn test_lint_report_includes_advisories() {
        let doc = liboddl::parse("u8 {300}\ns {\"\\?\"}\n// trailing").unwrap();
        let lines: Vec<String> = lint_report(&doc).iter().map(|d| d.to_string()).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("1:5: error: "), "{:?}", lines);
        assert!(lines[1].starts_with("2:5: warning: "), "{:?}", lines);
        assert!(lines[2].starts_with("3:1: warning: "), "{:?}", lines);

        let clean = liboddl::parse("u8 {3}").unwrap();
        assert!(lint_report(&clean).is_empty());
    }

    #[test]
    fn test_errors() {
        assert!(parse_args(&args(&["lint"])).is_err());
        assert!(parse_args(&args(&["--max-depth", "0", "x.oddl"])).is_err());
        assert!(parse_args(&args(&["--max-depth"])).is_err());
        assert!(parse_args(&args(&["--bogus", "x.oddl"])).is_err());
        assert!(parse_args(&args(&["-w", "x.oddl"])).is_err());
    }
}
