//! Architectural Enforcement Integration Tests
//!
//! This package holds tests that scan the workspace sources and enforce:
//! - No sleeping in production code outside the TUI frame loop
//! - No blocking I/O on the async paths of the conductor and TUI
//!
//! The helpers here locate the workspace and strip test modules, so the
//! checks only see code that ships.

use std::fs;
use std::path::{Path, PathBuf};

/// Marker that starts the in-file test module
const TEST_MODULE_MARKER: &str = "#[cfg(test)]";

/// A source file with its test module cut off
#[derive(Debug)]
pub struct ProductionSource {
    /// Path relative to the workspace root
    pub path: PathBuf,
    /// Lines before the first `#[cfg(test)]`
    pub lines: Vec<String>,
}

impl ProductionSource {
    /// Lines with `//` comments removed, numbered from 1
    pub fn code_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines.iter().enumerate().map(|(idx, line)| {
            let code = line.split("//").next().unwrap_or(line);
            (idx + 1, code)
        })
    }

    /// Whether this file lives under `prefix` (workspace-relative)
    pub fn is_under(&self, prefix: &str) -> bool {
        self.path.starts_with(prefix)
    }
}

/// Workspace root, two levels above this package
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// All `.rs` files under `dir` (workspace-relative), test modules stripped
pub fn production_sources(dir: &str) -> Vec<ProductionSource> {
    let root = workspace_root();
    let base = root.join(dir);
    if !base.exists() {
        return Vec::new();
    }

    let mut sources = Vec::new();
    for entry in walkdir::WalkDir::new(&base)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        let lines = content
            .lines()
            .take_while(|line| line.trim() != TEST_MODULE_MARKER)
            .map(str::to_string)
            .collect();
        let relative = path.strip_prefix(&root).unwrap_or(path).to_path_buf();
        sources.push(ProductionSource {
            path: relative,
            lines,
        });
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_has_members() {
        let root = workspace_root();
        assert!(root.join("conductor/core/src/lib.rs").exists());
        assert!(root.join("tui/src/lib.rs").exists());
    }

    #[test]
    fn test_test_modules_are_stripped() {
        let sources = production_sources("conductor/core/src");
        assert!(!sources.is_empty());
        for source in &sources {
            assert!(source.lines.iter().all(|l| l.trim() != TEST_MODULE_MARKER));
        }
    }
}
