//! Filter & transform: include/exclude glob sets and local path computation.
//!
//! Patterns are matched against the remote path exactly as stored
//! (case-sensitive). `*` does not cross `/`, `**` spans directories, and a
//! pattern without any `/` also matches at any depth.

use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use super::artifact::BlobRef;
use super::errors::{PullError, Result};
use super::ids::BuildNumber;

/// Include pattern used when none is configured.
pub const MATCH_ALL: &str = "**/*";

/// Archive bundle produced by the publish step; excluded unless opted in.
pub const ARCHIVE_BUNDLE_NAME: &str = "archive.zip";

/// Compiled include/exclude pattern sets.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    include: GlobSet,
    exclude: GlobSet,
}

impl FilterSpec {
    /// Build from comma-separated pattern strings.
    ///
    /// An empty include list becomes [`MATCH_ALL`]. Unless
    /// `include_archive_zips` is set, [`ARCHIVE_BUNDLE_NAME`] is appended to
    /// the exclude list.
    pub fn new(include: &str, exclude: &str, include_archive_zips: bool) -> Result<Self> {
        let mut include_patterns = split_patterns(include);
        if include_patterns.is_empty() {
            include_patterns.push(MATCH_ALL.to_string());
        }

        let mut exclude_patterns = split_patterns(exclude);
        if !include_archive_zips {
            exclude_patterns.push(ARCHIVE_BUNDLE_NAME.to_string());
        }

        Ok(Self {
            include: compile(&include_patterns)?,
            exclude: compile(&exclude_patterns)?,
            include_patterns,
            exclude_patterns,
        })
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.include_patterns
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }

    /// At least one include pattern and no exclude pattern match `remote_path`.
    pub fn matches(&self, remote_path: &str) -> bool {
        self.include.is_match(remote_path) && !self.exclude.is_match(remote_path)
    }
}

fn split_patterns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn compile(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(glob(pattern)?);
        if !pattern.contains('/') {
            builder.add(glob(&format!("**/{pattern}"))?);
        }
    }
    builder.build().map_err(|source| PullError::InvalidPattern {
        pattern: patterns.join(","),
        source,
    })
}

fn glob(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| PullError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// How the source prefix is removed from a remote path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripRule {
    /// Drop everything up to and including the first segment equal to the
    /// build number (`builds/42/out/a.jar` -> `out/a.jar`).
    ThroughBuildNumber(BuildNumber),

    /// Drop a listing prefix when present. Only whole segments are removed:
    /// a prefix ending inside a segment keeps that segment.
    Prefix(String),
}

impl StripRule {
    pub fn strip<'a>(&self, remote_path: &'a str) -> &'a str {
        match self {
            StripRule::ThroughBuildNumber(number) => {
                let needle = number.to_string();
                let mut offset = 0;
                for segment in remote_path.split('/') {
                    offset += segment.len() + 1;
                    if segment == needle {
                        return remote_path.get(offset..).unwrap_or("");
                    }
                }
                remote_path
            }
            StripRule::Prefix(prefix) => strip_segments(remote_path, prefix),
        }
    }
}

fn strip_segments<'a>(remote_path: &'a str, prefix: &str) -> &'a str {
    let Some(rest) = remote_path.strip_prefix(prefix) else {
        return remote_path;
    };
    if prefix.is_empty() || prefix.ends_with('/') || rest.is_empty() {
        return rest;
    }
    if let Some(rest) = rest.strip_prefix('/') {
        return rest;
    }
    // `night` on `nightly/tool.bin`
    match prefix.rfind('/') {
        Some(idx) => remote_path.get(idx + 1..).unwrap_or(remote_path),
        None => remote_path,
    }
}

/// Relative local path for a blob under the destination root.
///
/// Flatten keeps only the basename. Otherwise the remaining directory
/// structure after [`StripRule::strip`] is kept; when stripping consumes the
/// whole path the basename is used. Paths that would leave the destination
/// root are rejected.
pub fn local_relative_path(blob: &BlobRef, strip: &StripRule, flatten: bool) -> Result<PathBuf> {
    let mut relative = if flatten {
        blob.basename()
    } else {
        strip.strip(&blob.remote_path)
    };
    if segments(relative).next().is_none() {
        relative = blob.basename();
    }

    let mut out = PathBuf::new();
    for segment in segments(relative) {
        if segment == ".." {
            return Err(PullError::UnsafePath(blob.remote_path.clone()));
        }
        out.push(segment);
    }

    let is_plain = out
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if out.as_os_str().is_empty() || !is_plain {
        return Err(PullError::UnsafePath(blob.remote_path.clone()));
    }
    Ok(out)
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

/// A blob that passed the filter together with where it will be written.
#[derive(Debug)]
pub struct PlannedFile {
    pub blob: BlobRef,
    pub target: Result<PathBuf>,
}

impl PlannedFile {
    pub fn destination(&self, root: &Path) -> Option<PathBuf> {
        self.target.as_ref().ok().map(|rel| root.join(rel))
    }
}

/// Filter `blobs` (order preserved) and compute each survivor's local path.
pub fn plan(blobs: &[BlobRef], filter: &FilterSpec, strip: &StripRule, flatten: bool) -> Vec<PlannedFile> {
    blobs
        .iter()
        .filter(|blob| filter.matches(&blob.remote_path))
        .map(|blob| PlannedFile {
            blob: blob.clone(),
            target: local_relative_path(blob, strip, flatten),
        })
        .collect()
}
