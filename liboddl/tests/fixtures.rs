//! Test harness for the OpenDDL parser against fixture files.
//!
//! Reads all .oddl files from test/oddl/, parses them, and compares the
//! pretty and minimized output against test/pretty/ and test/min/. Files in
//! test/bad/ are expected to fail with the message in the matching .error
//! file, and files in test/lint/ are expected to produce the findings listed
//! in the matching .lint file.

use std::fs;
use std::path::{Path, PathBuf};

use liboddl::{parse, parse_with_filename, Format};

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

/// All files with a given extension in a subdirectory of test/, sorted.
fn fixture_files(subdir: &str, ext: &str) -> Vec<PathBuf> {
    let pattern = test_root().join(subdir).join(format!("*.{}", ext));
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .flatten()
        .collect();
    files.sort();
    files
}

/// The file with the same stem in `subdir` with extension `ext`.
fn companion(path: &Path, subdir: &str, ext: &str) -> PathBuf {
    let stem = path.file_stem().unwrap().to_string_lossy();
    test_root().join(subdir).join(format!("{}.{}", stem, ext))
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

fn run_oddl_test(path: &Path) -> Result<(), String> {
    let name = file_name(path);
    let input = fs::read_to_string(path).map_err(|e| format!("{}: {}", name, e))?;
    let doc = parse_with_filename(&input, Some(&name))
        .map_err(|e| format!("{}: unexpected parse error: {}", name, e))?;

    let errors: Vec<String> = doc
        .check()
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.to_string())
        .collect();
    if !errors.is_empty() {
        return Err(format!("{}: lint errors: {:?}", name, errors));
    }

    let pretty = doc.write(Format::Pretty);
    let expected = fs::read_to_string(companion(path, "pretty", "oddl"))
        .map_err(|e| format!("{}: missing pretty output: {}", name, e))?;
    if pretty != expected {
        return Err(format!(
            "{}: pretty mismatch\n  expected:\n{}\n  actual:\n{}",
            name, expected, pretty
        ));
    }

    let min = doc.write(Format::Minimized);
    let expected = fs::read_to_string(companion(path, "min", "oddl"))
        .map_err(|e| format!("{}: missing minimized output: {}", name, e))?;
    if min != expected.trim_end() {
        return Err(format!(
            "{}: minimized mismatch\n  expected: {}\n  actual:   {}",
            name,
            expected.trim_end(),
            min
        ));
    }

    for (format, text) in [("pretty", &pretty), ("minimized", &min)] {
        match parse(text) {
            Ok(reparsed) if reparsed == doc => {}
            Ok(_) => return Err(format!("{}: {} output does not round-trip", name, format)),
            Err(e) => return Err(format!("{}: {} output does not parse: {}", name, format, e)),
        }
    }
    Ok(())
}

fn run_bad_test(path: &Path) -> Result<(), String> {
    let name = file_name(path);
    let input = fs::read_to_string(path).map_err(|e| format!("{}: {}", name, e))?;
    let expected = fs::read_to_string(companion(path, "bad", "error"))
        .map_err(|e| format!("{}: missing .error file: {}", name, e))?;
    match parse_with_filename(&input, Some(&name)) {
        Ok(_) => Err(format!("{}: expected an error, but parsing succeeded", name)),
        Err(e) if e.to_string() == expected.trim_end() => Ok(()),
        Err(e) => Err(format!(
            "{}: error mismatch\n  expected: {}\n  actual:   {}",
            name,
            expected.trim_end(),
            e
        )),
    }
}

fn run_lint_test(path: &Path) -> Result<(), String> {
    let name = file_name(path);
    let input = fs::read_to_string(path).map_err(|e| format!("{}: {}", name, e))?;
    let expected = fs::read_to_string(companion(path, "lint", "lint"))
        .map_err(|e| format!("{}: missing .lint file: {}", name, e))?;
    let doc = parse(&input).map_err(|e| format!("{}: unexpected parse error: {}", name, e))?;
    let actual: Vec<String> = doc.check().iter().map(|d| d.to_string()).collect();
    let expected: Vec<&str> = expected.lines().collect();
    if actual != expected {
        return Err(format!(
            "{}: findings mismatch\n  expected: {:#?}\n  actual:   {:#?}",
            name, expected, actual
        ));
    }
    Ok(())
}

fn run_all(kind: &str, files: &[PathBuf], run: fn(&Path) -> Result<(), String>) {
    assert!(!files.is_empty(), "no {} fixtures found", kind);
    println!("\nRunning {} {} fixtures:", files.len(), kind);

    let errors: Vec<String> = files.iter().filter_map(|f| run(f).err()).collect();
    println!(
        "\nResults: {} passed, {} failed",
        files.len() - errors.len(),
        errors.len()
    );
    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }
    assert!(errors.is_empty(), "{} {} fixtures failed", errors.len(), kind);
}

#[test]
fn test_all_oddl_fixtures() {
    run_all("valid", &fixture_files("oddl", "oddl"), run_oddl_test);
}

#[test]
fn test_all_bad_fixtures() {
    run_all("invalid", &fixture_files("bad", "oddl"), run_bad_test);
}

#[test]
fn test_all_lint_fixtures() {
    run_all("lint", &fixture_files("lint", "oddl"), run_lint_test);
}

#[test]
fn test_pretty_is_idempotent() {
    for path in fixture_files("oddl", "oddl") {
        let input = fs::read_to_string(&path).unwrap();
        let once = parse(&input).unwrap().write(Format::Pretty);
        let twice = parse(&once).unwrap().write(Format::Pretty);
        assert_eq!(once, twice, "{}", path.display());
    }
}
