//! Input file selection
//!
//! Explicit paths come first, in the order given, followed by glob matches
//! (each pattern's matches in alphabetical order). A path named twice is
//! converted once.

use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::{CliError, Result};

pub fn collect_inputs(files: &[PathBuf], patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut inputs = Vec::new();

    for file in files {
        if seen.insert(file.clone()) {
            inputs.push(file.clone());
        }
    }

    for pattern in patterns {
        let entries = glob::glob(pattern).map_err(|e| CliError::InvalidGlob {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;

        let mut matched = 0usize;
        for entry in entries {
            let path = entry.map_err(|e| CliError::Io(e.into_error()))?;
            if !path.is_file() {
                continue;
            }
            matched += 1;
            if seen.insert(path.clone()) {
                inputs.push(path);
            }
        }

        if matched == 0 {
            warn!(pattern = %pattern, "Glob pattern matched no files");
        } else {
            debug!(pattern = %pattern, matched, "Expanded glob pattern");
        }
    }

    if inputs.is_empty() {
        return Err(CliError::NoInputs);
    }

    Ok(inputs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn test_explicit_files_keep_order_and_dedupe() {
        let a = PathBuf::from("b.gbk");
        let b = PathBuf::from("a.gbk");

        let inputs = collect_inputs(&[a.clone(), b.clone(), a.clone()], &[]).unwrap();
        assert_eq!(inputs, vec![a, b]);
    }

    #[test]
    fn test_glob_expansion() {
        let dir = TempDir::new().unwrap();
        let second = touch(&dir, "b.gbk");
        let first = touch(&dir, "a.gbk");
        touch(&dir, "notes.txt");
        std::fs::create_dir(dir.path().join("sub.gbk")).unwrap();

        let pattern = format!("{}/*.gbk", dir.path().display());
        let inputs = collect_inputs(&[second.clone()], &[pattern]).unwrap();

        // explicit file first, glob match deduplicated, directories ignored
        assert_eq!(inputs, vec![second, first]);
    }

    #[test]
    fn test_no_inputs() {
        let dir = TempDir::new().unwrap();
        let pattern = format!("{}/*.gbk", dir.path().display());

        let err = collect_inputs(&[], &[pattern]).unwrap_err();
        assert!(matches!(err, CliError::NoInputs));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = collect_inputs(&[], &["[".to_string()]).unwrap_err();
        assert!(matches!(err, CliError::InvalidGlob { .. }));
    }
}
