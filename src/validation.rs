//! Identifier and destination path validation
//!
//! Everything handed to the privileged capability passes through this module.
//! The syntactic checks ([`validate_package_identifier`],
//! [`validate_relative_path`], [`validate_source_identifier`]) are pure. The
//! canonical containment check in [`PathValidator::resolve_canonical_destination`]
//! touches the filesystem only to resolve symlinks.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Default root under which per-package private data directories live
pub const DEFAULT_PRIVILEGED_ROOT: &str = "/data/data";

/// Characters that carry meaning for a shell
const SHELL_METACHARACTERS: &[char] = &[';', '|', '&', '$', '`'];

#[allow(clippy::expect_used)]
static PACKAGE_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$")
        .expect("package identifier pattern is valid")
});

/// Check a dotted package identifier such as `com.example.app`
///
/// # Examples
///
/// ```
/// use bit_installer::validation::validate_package_identifier;
///
/// assert!(validate_package_identifier("com.example.app"));
/// assert!(!validate_package_identifier("com"));
/// assert!(!validate_package_identifier("com.1example"));
/// ```
#[must_use]
pub fn validate_package_identifier(s: &str) -> bool {
    PACKAGE_ID_REGEX.is_match(s)
}

/// Syntactic check for a path relative to a package's data directory
///
/// Rejects `..` anywhere, a leading `/`, and shell metacharacters. This is
/// necessary but not sufficient; destinations must still be resolved with
/// [`PathValidator::resolve_canonical_destination`].
#[must_use]
pub fn validate_relative_path(s: &str) -> bool {
    !s.contains("..") && !s.starts_with('/') && !s.contains(SHELL_METACHARACTERS)
}

/// Check an `owner/repo` source identifier
#[must_use]
pub fn validate_source_identifier(s: &str) -> bool {
    let mut parts = s.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) => {
            !owner.trim().is_empty()
                && !name.trim().is_empty()
                && !owner.contains("..")
                && !name.contains("..")
        }
        _ => false,
    }
}

/// Validated dotted package identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PackageId(String);

impl PackageId {
    /// Validate and wrap a package identifier
    pub fn parse(s: &str) -> Result<Self> {
        if validate_package_identifier(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::validation(
                "package_id",
                format!("'{s}' is not a dotted identifier"),
            ))
        }
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Syntactically validated relative destination path
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RelativeDestinationPath(String);

impl RelativeDestinationPath {
    /// Validate and wrap a relative destination path
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::validation("relative_path", "path is empty"));
        }
        if validate_relative_path(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::validation(
                "relative_path",
                format!("'{s}' contains traversal, an absolute prefix or shell metacharacters"),
            ))
        }
    }

    /// The path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelativeDestinationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated `owner/name` pair identifying a release source
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceIdentifier {
    owner: String,
    name: String,
}

impl SourceIdentifier {
    /// Validate and split an `owner/name` string
    pub fn parse(s: &str) -> Result<Self> {
        if !validate_source_identifier(s) {
            return Err(Error::validation(
                "source",
                format!("'{s}' is not in owner/repository format"),
            ));
        }
        match s.split_once('/') {
            Some((owner, name)) => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            None => Err(Error::validation("source", "missing '/' separator")),
        }
    }

    /// Repository owner
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Absolute, symlink-free destination proven to live under a package root
///
/// Only [`PathValidator::resolve_canonical_destination`] can build one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalDestination {
    path: PathBuf,
}

impl CanonicalDestination {
    /// The resolved path
    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for CanonicalDestination {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for CanonicalDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Resolves destinations under a trusted privileged root
#[derive(Clone, Debug)]
pub struct PathValidator {
    privileged_root: PathBuf,
}

impl Default for PathValidator {
    fn default() -> Self {
        Self::new(DEFAULT_PRIVILEGED_ROOT)
    }
}

impl PathValidator {
    /// Create a validator rooted at `privileged_root` (e.g. `/data/data`)
    pub fn new(privileged_root: impl Into<PathBuf>) -> Self {
        Self {
            privileged_root: privileged_root.into(),
        }
    }

    /// The trusted root prefix
    pub fn privileged_root(&self) -> &Path {
        &self.privileged_root
    }

    /// Resolve `<root>/<package_id>/<relative_path>` to a canonical path
    ///
    /// Returns `None` unless both syntactic validators pass, the package root
    /// and the destination resolve, and the resolved destination is a strict
    /// descendant of the resolved package root. Containment is compared per
    /// path component, so `/data/appX` never matches `/data/appXevil`.
    ///
    /// A destination that does not exist yet is resolved through its parent
    /// directory, which must exist. A dangling symlink is never resolved.
    pub fn resolve_canonical_destination(
        &self,
        package_id: &str,
        relative_path: &str,
    ) -> Option<CanonicalDestination> {
        if !validate_package_identifier(package_id) || !validate_relative_path(relative_path) {
            return None;
        }

        let root = self.privileged_root.join(package_id);
        let canonical_root = std::fs::canonicalize(&root).ok()?;
        let canonical = canonicalize_target(&root.join(relative_path))?;

        if canonical != canonical_root && canonical.starts_with(&canonical_root) {
            Some(CanonicalDestination { path: canonical })
        } else {
            tracing::warn!(
                package_id,
                relative_path,
                resolved = %canonical.display(),
                "destination escapes package root"
            );
            None
        }
    }

    /// Typed variant of [`Self::resolve_canonical_destination`]
    pub fn resolve(
        &self,
        package_id: &PackageId,
        relative_path: &RelativeDestinationPath,
    ) -> Result<CanonicalDestination> {
        self.resolve_canonical_destination(package_id.as_str(), relative_path.as_str())
            .ok_or_else(|| {
                Error::validation(
                    "destination",
                    format!("'{relative_path}' does not resolve inside package '{package_id}'"),
                )
            })
    }
}

fn canonicalize_target(target: &Path) -> Option<PathBuf> {
    match std::fs::canonicalize(target) {
        Ok(path) => Some(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            // Something exists but cannot be resolved: a dangling symlink
            if std::fs::symlink_metadata(target).is_ok() {
                return None;
            }
            let file_name = target.file_name()?;
            let parent = std::fs::canonicalize(target.parent()?).ok()?;
            Some(parent.join(file_name))
        }
        Err(_) => None,
    }
}
