//! Build output discovery
//!
//! Lists the files under the build directory and filters them with the
//! configured glob pattern. Patterns without a `/` match the file name at any
//! depth, so `*.js` selects `app.js` and `assets/vendor.js` alike.

use globset::{GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Default pattern for deployable assets
pub const DEFAULT_FILE_PATTERN: &str =
    "**/*.{js,css,png,gif,ico,jpg,map,xml,txt,svg,swf,eot,ttf,woff,woff2}";

/// Build output errors
#[derive(Error, Debug)]
pub enum FilesError {
    #[error("Invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to scan {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Compiled file selection pattern
#[derive(Debug, Clone)]
pub struct FilePattern {
    pattern: String,
    matcher: GlobMatcher,
    match_base: bool,
}

impl FilePattern {
    pub fn new(pattern: &str) -> Result<Self, FilesError> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| FilesError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
            match_base: !pattern.contains('/'),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Whether a relative POSIX path is selected
    pub fn matches(&self, path: &str) -> bool {
        if self.match_base {
            let name = path.rsplit('/').next().unwrap_or(path);
            self.matcher.is_match(name)
        } else {
            self.matcher.is_match(path)
        }
    }

    /// Keep the selected paths, preserving order
    pub fn filter<'a, I>(&self, paths: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        paths
            .into_iter()
            .filter(|path| self.matches(path))
            .cloned()
            .collect()
    }
}

/// Every regular file under `dir`, as sorted relative POSIX paths
pub fn scan_dist(dir: &Path) -> Result<Vec<String>, FilesError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|source| FilesError::Scan {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        if let Ok(relative) = entry.path().strip_prefix(dir) {
            let posix = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push(posix);
        }
    }

    files.sort();
    Ok(files)
}
