//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles
//! across the lesson crates:
//! - No blocking sleeps or blocking HTTP in async code
//! - No panicking shortcuts (`unwrap`, `expect`) in production code
//! - Surfaces talk to the backend only through the conductor
//!
//! Helpers here walk the workspace sources and strip test code so the checks
//! only see what ships.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Source directories that hold production code
pub const PRODUCTION_DIRS: &[&str] = &["conductor/core/src", "conductor/cli/src"];

/// Workspace root, two levels above this crate
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// A production source file, already stripped of tests and comments
#[derive(Debug)]
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: PathBuf,
    /// `(line number, text)` for every production line
    pub lines: Vec<(usize, String)>,
}

impl SourceFile {
    /// Lines containing `pattern`
    pub fn find<'a>(&'a self, pattern: &'a str) -> impl Iterator<Item = &'a (usize, String)> {
        self.lines.iter().filter(move |(_, text)| text.contains(pattern))
    }
}

/// Every `.rs` file under [`PRODUCTION_DIRS`]
pub fn production_sources() -> Vec<SourceFile> {
    let root = workspace_root();
    let mut files = Vec::new();

    for dir in PRODUCTION_DIRS {
        for entry in WalkDir::new(root.join(dir))
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        {
            let Ok(contents) = fs::read_to_string(entry.path()) else {
                continue;
            };
            let path = entry
                .path()
                .strip_prefix(&root)
                .unwrap_or(entry.path())
                .to_path_buf();
            files.push(SourceFile {
                path,
                lines: production_lines(&contents),
            });
        }
    }

    files
}

/// Drop comment lines and everything from the first `#[cfg(test)]` onward
pub fn production_lines(contents: &str) -> Vec<(usize, String)> {
    contents
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect()
}

/// Format violations as `path:line: text`, one per line
pub fn report(violations: &[(PathBuf, usize, String)]) -> String {
    violations
        .iter()
        .map(|(path, line, text)| format!("{}:{line}: {}", path.display(), text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collect every production line matching any of `patterns`
pub fn violations(patterns: &[&str]) -> Vec<(PathBuf, usize, String)> {
    let mut found = Vec::new();
    for file in production_sources() {
        for pattern in patterns {
            for (line, text) in file.find(pattern) {
                found.push((file.path.clone(), *line, text.clone()));
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_tests() {
        let src = "fn a() {}\n// note\n#[cfg(test)]\nmod tests { fn b() { x.unwrap(); } }\n";
        let lines = production_lines(src);
        assert_eq!(lines, vec![(1, "fn a() {}".to_string())]);
    }

    #[test]
    fn test_sources_found() {
        let files = production_sources();
        assert!(files
            .iter()
            .any(|f| f.path.ends_with("conductor/core/src/session.rs")));
        assert!(files.iter().any(|f| f.path.ends_with("conductor/cli/src/main.rs")));
    }
}
