//! Capabilities supplied by the host: SDK resolution, import path
//! resolution, and document loading.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use smol_str::SmolStr;

use super::collector::PropertyValueCollector;
use super::error::{LoadError, SdkResolveError};
use crate::syntax::Expr;

// ============================================================================
// SDK REFERENCES
// ============================================================================

/// `Name`, `Name/Version`, or `Name/min=Version`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SdkReference {
    pub name: SmolStr,
    pub version: Option<SmolStr>,
    pub min_version: Option<SmolStr>,
}

impl SdkReference {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            version: None,
            min_version: None,
        }
    }

    /// Parse a single SDK reference. Returns `None` for an empty name.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (name, version) = match text.split_once('/') {
            Some((name, version)) => (name.trim(), Some(version.trim())),
            None => (text, None),
        };
        if name.is_empty() {
            return None;
        }
        let mut sdk = SdkReference::new(name);
        match version {
            Some(v) if v.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("min=")) => {
                sdk.min_version = Some(v[4..].trim().into());
            }
            Some(v) if !v.is_empty() => sdk.version = Some(v.into()),
            _ => {}
        }
        Some(sdk)
    }

    /// Parse a `;`-separated list, skipping empty entries.
    pub fn parse_list(text: &str) -> Vec<Self> {
        text.split(';').filter_map(Self::parse).collect()
    }
}

impl fmt::Display for SdkReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(v) = &self.version {
            write!(f, "/{v}")?;
        } else if let Some(v) = &self.min_version {
            write!(f, "/min={v}")?;
        }
        Ok(())
    }
}

/// Resolves an SDK to the directory containing its `Sdk.props`/`Sdk.targets`.
pub trait SdkResolver: Send + Sync {
    /// `Ok(None)` when the SDK is simply not available.
    fn resolve_sdk(&self, sdk: &SdkReference, project: &Path) -> Result<Option<PathBuf>, SdkResolveError>;
}

// ============================================================================
// IMPORTS
// ============================================================================

/// Everything an import resolver needs to turn an `Import Project` value into files.
#[derive(Debug)]
pub struct ImportRequest<'a> {
    /// The file containing the `Import` element.
    pub importing_file: &'a Path,
    /// The top-level project being built.
    pub project_file: &'a Path,
    /// The parsed `Project` value.
    pub expr: &'a Expr,
    /// The raw `Project` value.
    pub text: &'a str,
    /// Resolved SDK directory, when the import is SDK-relative.
    pub sdk_dir: Option<&'a Path>,
    pub max_permutations: usize,
}

/// Turns an import path expression into zero or more existing files.
pub trait ImportResolver: Send + Sync {
    fn resolve_import(&self, request: &ImportRequest<'_>, properties: &PropertyValueCollector) -> Vec<PathBuf>;
}

// ============================================================================
// DOCUMENTS
// ============================================================================

/// The text of a build file and when it was last modified.
#[derive(Clone, Debug)]
pub struct LoadedDocument {
    pub text: Arc<str>,
    pub timestamp: Option<SystemTime>,
}

/// Loads imported build files.
pub trait DocumentSource: Send + Sync {
    fn load(&self, path: &Path) -> Result<LoadedDocument, LoadError>;
}
