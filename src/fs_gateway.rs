//! Filesystem gateway for a Markdown vault.
//!
//! Every path handed to or returned from this module is relative to the
//! vault root and uses `/` separators, so it can double as a document id.
//! Paths that are absolute or climb out of the vault with `..` are rejected.

use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use zk_chat_core::{ZkError, ZkResult};

use crate::config::DB_DIRNAME;

/// Reads and writes Markdown files under a vault root.
pub struct MarkdownFilesystemGateway {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
}

impl MarkdownFilesystemGateway {
    pub fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let include = build_globset(&["**/*.md".to_string()])?;
        let exclude = build_globset(&[
            "**/.git/**".to_string(),
            "**/.obsidian/**".to_string(),
            format!("**/{}/**", DB_DIRNAME),
        ])?;
        Ok(Self {
            root: root.into(),
            include,
            exclude,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily enumerate relative paths of every Markdown file in the vault.
    ///
    /// Order is depth-first with entries sorted by file name. Each call
    /// starts a fresh walk.
    pub fn iterate_markdown_files(&self) -> impl Iterator<Item = ZkResult<String>> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        let path = e
                            .path()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| self.root.display().to_string());
                        return Some(Err(ZkError::filesystem(path, io::Error::from(e))));
                    }
                };
                if !entry.file_type().is_file() {
                    return None;
                }
                let rel = self.relative(entry.path());
                if self.exclude.is_match(&rel) || !self.include.is_match(&rel) {
                    return None;
                }
                Some(Ok(rel))
            })
    }

    pub fn path_exists(&self, relative_path: &str) -> bool {
        self.get_full_path(relative_path)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// Absolute path for a vault-relative path.
    pub fn get_full_path(&self, relative_path: &str) -> ZkResult<PathBuf> {
        let rel = Path::new(relative_path);
        let escapes = rel.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(ZkError::filesystem(
                relative_path,
                io::Error::new(io::ErrorKind::InvalidInput, "path escapes the vault root"),
            ));
        }
        Ok(self.root.join(rel))
    }

    /// Vault-relative parent directory of `relative_path` (`""` for the root).
    pub fn get_directory_path(&self, relative_path: &str) -> String {
        match relative_path.rfind('/') {
            Some(pos) => relative_path[..pos].to_string(),
            None => String::new(),
        }
    }

    pub fn create_directory(&self, relative_path: &str) -> ZkResult<()> {
        let full = self.get_full_path(relative_path)?;
        std::fs::create_dir_all(&full).map_err(|e| ZkError::filesystem(relative_path, e))
    }

    pub fn read_file(&self, relative_path: &str) -> ZkResult<String> {
        let full = self.get_full_path(relative_path)?;
        std::fs::read_to_string(&full).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ZkError::NotFound(relative_path.to_string()),
            _ => ZkError::filesystem(relative_path, e),
        })
    }

    pub fn write_file(&self, relative_path: &str, content: &str) -> ZkResult<()> {
        let full = self.get_full_path(relative_path)?;
        std::fs::write(&full, content).map_err(|e| ZkError::filesystem(relative_path, e))
    }

    pub fn get_modified_time(&self, relative_path: &str) -> ZkResult<DateTime<Utc>> {
        let full = self.get_full_path(relative_path)?;
        let modified = std::fs::metadata(&full)
            .and_then(|m| m.modified())
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ZkError::NotFound(relative_path.to_string()),
                _ => ZkError::filesystem(relative_path, e),
            })?;
        Ok(DateTime::<Utc>::from(modified))
    }

    /// Move a file, creating the target's parent directories.
    pub fn rename_file(&self, from: &str, to: &str) -> ZkResult<()> {
        let source = self.get_full_path(from)?;
        let target = self.get_full_path(to)?;
        if !source.is_file() {
            return Err(ZkError::NotFound(from.to_string()));
        }
        let dir = self.get_directory_path(to);
        if !dir.is_empty() {
            self.create_directory(&dir)?;
        }
        std::fs::rename(&source, &target).map_err(|e| ZkError::filesystem(to, e))
    }

    pub fn delete_file(&self, relative_path: &str) -> ZkResult<()> {
        let full = self.get_full_path(relative_path)?;
        std::fs::remove_file(&full).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ZkError::NotFound(relative_path.to_string()),
            _ => ZkError::filesystem(relative_path, e),
        })
    }

    fn relative(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
