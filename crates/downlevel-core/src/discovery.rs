//! Finding the C# files to rewrite
//!
//! Directories are walked with `walkdir`; every file is matched, by its
//! path relative to the walked directory, against the include and exclude
//! globs. Files named on the command line are taken as they are, except
//! that generated files are still skipped.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::DownlevelConfig;
use crate::error::DownlevelError;
use crate::result::Result;

/// Suffixes of files produced by code generators
const GENERATED_SUFFIXES: &[&str] = &[".g.cs", ".g.i.cs", ".designer.cs"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Files found by one discovery run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredFiles {
    /// Files to process, sorted
    pub files: Vec<PathBuf>,
    /// Generated files left out
    pub skipped: Vec<PathBuf>,
}

/// Include/exclude matcher over directories and explicit files
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    skip_generated: bool,
}

impl FileDiscovery {
    pub fn new(include: &[String], exclude: &[String], skip_generated: bool) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
            skip_generated,
        })
    }

    pub fn from_config(config: &DownlevelConfig) -> Result<Self> {
        Self::new(
            &config.include_patterns(),
            &config.exclude_patterns(),
            config.skip_generated(),
        )
    }

    /// Expand `paths` into the files to process
    pub fn discover(&self, paths: &[PathBuf]) -> Result<DiscoveredFiles> {
        let mut found = DiscoveredFiles::default();

        for path in paths {
            if path.is_file() {
                self.take(path.clone(), &mut found);
            } else if path.is_dir() {
                self.walk(path, &mut found);
            } else {
                return Err(DownlevelError::discovery_error(format!(
                    "Path does not exist: {}",
                    path.display()
                )));
            }
        }

        found.files.sort();
        found.files.dedup();
        found.skipped.sort();
        found.skipped.dedup();
        debug!(
            files = found.files.len(),
            skipped = found.skipped.len(),
            "Discovery finished"
        );
        Ok(found)
    }

    /// Whether `relative` passes the include and exclude globs
    pub fn matches(&self, relative: &Path) -> bool {
        let included = self
            .include
            .iter()
            .any(|pattern| pattern.matches_path_with(relative, MATCH_OPTIONS));
        included
            && !self
                .exclude
                .iter()
                .any(|pattern| pattern.matches_path_with(relative, MATCH_OPTIONS))
    }

    fn walk(&self, root: &Path, found: &mut DiscoveredFiles) {
        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if self.matches(relative) {
                self.take(entry.into_path(), found);
            }
        }
    }

    fn take(&self, path: PathBuf, found: &mut DiscoveredFiles) {
        if self.skip_generated && is_generated(&path) {
            debug!("Skipping generated file {}", path.display());
            found.skipped.push(path);
        } else {
            found.files.push(path);
        }
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| {
                DownlevelError::discovery_error(format!("Invalid glob pattern '{pattern}': {e}"))
            })
        })
        .collect()
}

/// `Foo.g.cs`, `Foo.g.i.cs` and `Foo.Designer.cs` style names
pub fn is_generated(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let name = name.to_ascii_lowercase();
    GENERATED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "class C { }\n").unwrap();
        path
    }

    fn names(root: &Path, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_discover_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "Program.cs");
        touch(root, "src/Models/Person.cs");
        touch(root, "src/Form1.Designer.cs");
        touch(root, "obj/Debug/App.AssemblyInfo.cs");
        touch(root, "bin/Release/Other.cs");
        touch(root, "README.md");

        let discovery = FileDiscovery::from_config(&DownlevelConfig::default()).unwrap();
        let found = discovery.discover(&[root.to_path_buf()]).unwrap();

        assert_eq!(names(root, &found.files), vec!["Program.cs", "src/Models/Person.cs"]);
        assert_eq!(names(root, &found.skipped), vec!["src/Form1.Designer.cs"]);
    }

    #[test]
    fn test_explicit_files_skip_globs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let script = touch(root, "bin/Tool.csx");
        let generated = touch(root, "Api.g.cs");

        let discovery = FileDiscovery::from_config(&DownlevelConfig::default()).unwrap();
        let found = discovery.discover(&[script.clone(), generated.clone()]).unwrap();
        assert_eq!(found.files, vec![script]);
        assert_eq!(found.skipped, vec![generated]);
    }

    #[test]
    fn test_generated_files_kept_when_asked() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "Api.g.i.cs");

        let discovery = FileDiscovery::new(&["**/*.cs".to_string()], &[], false).unwrap();
        let found = discovery.discover(&[root.to_path_buf()]).unwrap();
        assert_eq!(names(root, &found.files), vec!["Api.g.i.cs"]);
        assert!(found.skipped.is_empty());
    }

    #[test]
    fn test_is_generated() {
        assert!(is_generated(Path::new("a/Resources.Designer.cs")));
        assert!(is_generated(Path::new("View.g.cs")));
        assert!(is_generated(Path::new("View.g.i.cs")));
        assert!(!is_generated(Path::new("Designer.cs")));
        assert!(!is_generated(Path::new("Log.cs")));
    }

    #[test]
    fn test_errors() {
        let invalid = FileDiscovery::new(&["[".to_string()], &[], true);
        assert_eq!(invalid.unwrap_err().kind(), ErrorKind::Discovery);

        let discovery = FileDiscovery::from_config(&DownlevelConfig::default()).unwrap();
        let missing = discovery.discover(&[PathBuf::from("does/not/exist")]);
        assert_eq!(missing.unwrap_err().kind(), ErrorKind::Discovery);
    }
}
