//! Line-oriented `KEY=VALUE` configuration store.
//!
//! The store backs the node's `.env` file, which the compose CLI consumes
//! as its environment source at launch time. Mutation is strictly
//! line-oriented: an upsert replaces the one line whose key matches, or
//! appends a new line, and every other line (including comments, blank
//! lines, and anything unparseable) is preserved byte-for-byte in its
//! original position. Values are never interpreted, so URLs and key
//! material with `:`, `/`, or `?` pass through untouched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{CoreError, Result};
use crate::fsio::write_secure_file;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// A `KEY=VALUE` assignment. The value is everything after the first
    /// `=` up to the end of the line, verbatim.
    Pair { key: String, value: String },
    /// Anything else: comments, blank lines, malformed lines. Kept as-is.
    Raw(String),
}

/// Outcome of a single upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Replaced,
    Appended,
}

/// An ordered `KEY=VALUE` store backed by a file.
///
/// Loading a missing file yields an empty store; the file is created on
/// the first `save`. Writes are atomic (temp file + rename) with 0o600
/// permissions, since the store carries private key material.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
    lines: Vec<Line>,
}

impl EnvFile {
    /// Load the store from `path`, or return an empty store if the file
    /// does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Env file {} not present, starting empty", path.display());
            return Ok(Self {
                path: path.to_path_buf(),
                lines: Vec::new(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| CoreError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            lines: content.lines().map(parse_line).collect(),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of the unique line for `key`, or `None` if no line matches.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Pair { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// All `KEY=VALUE` assignments in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Pair { key, value } => Some((key.as_str(), value.as_str())),
            Line::Raw(_) => None,
        })
    }

    /// Replace the line for `key` in place, or append `KEY=VALUE` at the
    /// end.
    ///
    /// Idempotent: after the call exactly one line for `key` exists, at
    /// the position of the first prior occurrence (stray duplicates are
    /// collapsed). All other lines keep their content and relative order.
    /// An empty value is allowed; an empty key is rejected.
    pub fn upsert(&mut self, key: &str, value: &str) -> Result<Upsert> {
        if key.is_empty() {
            return Err(CoreError::EmptyKey);
        }

        let first = self.lines.iter().position(|line| {
            matches!(line, Line::Pair { key: k, .. } if k == key)
        });

        match first {
            Some(index) => {
                self.lines[index] = Line::Pair {
                    key: key.to_string(),
                    value: value.to_string(),
                };

                // Collapse duplicates left behind by hand edits.
                let mut position = 0usize;
                self.lines.retain(|line| {
                    let duplicate = position > index
                        && matches!(line, Line::Pair { key: k, .. } if k == key);
                    position += 1;
                    !duplicate
                });

                Ok(Upsert::Replaced)
            }
            None => {
                self.lines.push(Line::Pair {
                    key: key.to_string(),
                    value: value.to_string(),
                });
                Ok(Upsert::Appended)
            }
        }
    }

    /// Render the store back to text, one line per entry, trailing newline
    /// when non-empty.
    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Pair { key, value } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(value);
                }
                Line::Raw(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }

    /// Write the store to its backing file, creating parent directories as
    /// needed.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CoreError::WriteFile {
                path: self.path.clone(),
                source,
            })?;
        }
        write_secure_file(&self.path, self.render().as_bytes())
    }
}

/// Resolve the store to a flat map using the same `.env` parser the
/// service controller applies at launch time.
///
/// Read-only companion to [`EnvFile`]: operations that need final values
/// (the admin push, status display) go through this; mutation never does,
/// because it must preserve unknown lines byte-for-byte.
pub fn resolved_values(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let mut values = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(|source| CoreError::EnvFileParse {
        path: path.to_path_buf(),
        source,
    })? {
        let (key, value) = item.map_err(|source| CoreError::EnvFileParse {
            path: path.to_path_buf(),
            source,
        })?;
        values.insert(key, value);
    }

    Ok(values)
}

fn parse_line(line: &str) -> Line {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Raw(line.to_string());
    }

    match line.split_once('=') {
        Some((key, value)) if !key.is_empty() => Line::Pair {
            key: key.to_string(),
            value: value.to_string(),
        },
        _ => Line::Raw(line.to_string()),
    }
}
