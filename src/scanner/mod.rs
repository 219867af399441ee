//! Source tree scanner for threatspec tags

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::comment::{CommentParser, TagComment};

/// Scans a file or directory tree for tag comments
pub struct Scanner {
    root: PathBuf,
    exclude_patterns: GlobSet,
    parser: CommentParser,
}

/// Default patterns to always exclude
const DEFAULT_EXCLUDES: &[&str] = &[
    "threatspec.toml",
    ".threatspec/**",
    "*.threatspec.json",
];

impl Scanner {
    /// Create a new scanner for the given path (with default excludes and markers)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, &[], &[])
    }

    /// Create a new scanner with custom exclude patterns and comment markers
    ///
    /// Default excludes are always added. An empty marker list keeps the
    /// default markers.
    pub fn with_config(root: impl Into<PathBuf>, excludes: &[String], markers: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();

        for pattern in DEFAULT_EXCLUDES.iter().copied().chain(excludes.iter().map(String::as_str)) {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => warn!("Ignoring invalid exclude pattern '{}': {}", pattern, e),
            }
        }

        let parser = if markers.is_empty() {
            CommentParser::new()
        } else {
            CommentParser::with_markers(markers)
        };

        Self {
            root: root.into(),
            exclude_patterns: builder.build().unwrap_or_else(|_| GlobSet::empty()),
            parser,
        }
    }

    /// Scan the tree and return all tags found, in walk order
    pub async fn scan(&self) -> Result<Vec<TagComment>> {
        let mut tags = Vec::new();

        if self.root.is_file() {
            // An explicitly named file is always read
            return self.scan_file(&self.root).await;
        }
        if !self.root.exists() {
            anyhow::bail!("Path not found: {}", self.root.display());
        }

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();

            if !path.is_file() || self.is_excluded(path) || !Self::is_parseable(path) {
                continue;
            }

            match self.scan_file(path).await {
                Ok(file_tags) => tags.extend(file_tags),
                // Not valid UTF-8 or unreadable
                Err(e) => debug!("Skipping {}: {:#}", path.display(), e),
            }
        }

        debug!("Found {} tags under {}", tags.len(), self.root.display());
        Ok(tags)
    }

    async fn scan_file(&self, path: &Path) -> Result<Vec<TagComment>> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        Ok(self.parser.parse_file(path, &content))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        if self.exclude_patterns.is_match(relative) {
            return true;
        }
        // Also check the file name alone for simple patterns like "threatspec.toml"
        relative
            .file_name()
            .is_some_and(|name| self.exclude_patterns.is_match(name))
    }

    /// Check if a file is worth reading for comments
    ///
    /// All text files are scanned, only known binary formats are skipped.
    fn is_parseable(path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            // Makefile, Dockerfile, ...
            return true;
        };

        !matches!(
            ext.to_lowercase().as_str(),
            // Images
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "ico" | "webp" | "tiff" | "psd"
            // Audio/Video
            | "mp3" | "mp4" | "wav" | "avi" | "mkv" | "mov" | "flac" | "ogg" | "webm"
            // Archives
            | "zip" | "tar" | "gz" | "bz2" | "xz" | "7z" | "rar" | "dmg" | "iso" | "jar"
            // Binaries
            | "exe" | "dll" | "so" | "dylib" | "bin" | "o" | "a" | "lib"
            // Documents (binary)
            | "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "odt"
            // Fonts
            | "ttf" | "otf" | "woff" | "woff2" | "eot"
            // Database
            | "db" | "sqlite" | "sqlite3"
            | "lock"
            | "class" | "pyc" | "pyo" | "wasm" | "rlib"
        )
    }
}
