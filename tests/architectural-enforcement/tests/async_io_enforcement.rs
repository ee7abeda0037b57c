//! Integration Test: Sleep and Blocking I/O Prohibition
//!
//! **Policy**: Production code in the TUI and conductor runs on the tokio
//! runtime and MUST NOT block it.
//! **Exceptions**: the TUI frame timer (`tokio::time::sleep`), config
//! loading before the conductor starts, the binary's log file setup.

use architectural_enforcement::{production_sources, ProductionSource};

const PRODUCTION_DIRS: &[&str] = &["conductor/core/src", "tui/src"];

/// Files allowed to touch `std::fs`: both run before any request is sent
const STD_FS_ALLOWED: &[&str] = &["conductor/core/src/config", "tui/src/main.rs"];

fn all_sources() -> Vec<ProductionSource> {
    PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| production_sources(dir))
        .collect()
}

fn report(kind: &str, violations: &[String]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {kind} found in production code:\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!(
        "\nFound {} {kind} violation(s) in production code.\nFix these before merging!",
        violations.len()
    );
}

#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for source in all_sources() {
        for (line_number, code) in source.code_lines() {
            let sleeps = code.contains("::sleep(") || code.contains(".sleep(");
            if !sleeps {
                continue;
            }
            // Frame pacing is the only sleep the TUI may do
            let frame_timer = source.is_under("tui/src") && code.contains("tokio::time::sleep(");
            if !frame_timer {
                violations.push(format!(
                    "{}:{} - {}",
                    source.path.display(),
                    line_number,
                    code.trim()
                ));
            }
        }
    }

    report("sleep", &violations);
}

#[test]
fn test_no_blocking_io_in_production_code() {
    let mut violations = Vec::new();

    for source in all_sources() {
        let fs_allowed = STD_FS_ALLOWED.iter().any(|p| source.is_under(p));

        for (line_number, code) in source.code_lines() {
            let reason = if code.contains("reqwest::blocking") {
                Some("Blocking HTTP client")
            } else if code.contains("std::net") {
                Some("Blocking network I/O")
            } else if code.contains("std::fs") && !fs_allowed {
                Some("Blocking file I/O")
            } else {
                None
            };

            if let Some(reason) = reason {
                violations.push(format!(
                    "{}:{} - {}: {}",
                    source.path.display(),
                    line_number,
                    reason,
                    code.trim()
                ));
            }
        }
    }

    report("blocking I/O", &violations);
}

#[test]
fn test_scan_covers_both_crates() {
    let sources = all_sources();
    assert!(sources.iter().any(|s| s.is_under("conductor/core/src")));
    assert!(sources.iter().any(|s| s.is_under("tui/src")));
}
