//! Next-version resolution
//!
//! A release is driven by a single argument: either a bump keyword
//! (`major`, `minor`, `patch`) applied to the manifest's current version,
//! or an explicit semantic version used verbatim.

use crate::core::error::ValidationError;
use semver::{Prerelease, Version};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Version component to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl BumpKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "major" => Some(BumpKind::Major),
            "minor" => Some(BumpKind::Minor),
            "patch" => Some(BumpKind::Patch),
            _ => None,
        }
    }

    /// Increment `current` the way `npm version` does
    ///
    /// A prerelease is promoted to its release when the bumped components
    /// are already at their reset values (`1.0.0-rc.1` + major = `1.0.0`).
    pub fn apply(self, current: &Version) -> Version {
        let is_pre = !current.pre.is_empty();
        let mut next = Version::new(current.major, current.minor, current.patch);
        match self {
            BumpKind::Major => {
                if current.minor != 0 || current.patch != 0 || !is_pre {
                    next.major += 1;
                }
                next.minor = 0;
                next.patch = 0;
            }
            BumpKind::Minor => {
                if current.patch != 0 || !is_pre {
                    next.minor += 1;
                }
                next.patch = 0;
            }
            BumpKind::Patch => {
                if !is_pre {
                    next.patch += 1;
                }
            }
        }
        next.pre = Prerelease::EMPTY;
        next
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            BumpKind::Major => "major",
            BumpKind::Minor => "minor",
            BumpKind::Patch => "patch",
        };
        f.write_str(keyword)
    }
}

/// Parsed release argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionArg {
    Bump(BumpKind),
    Explicit(Version),
}

impl VersionArg {
    /// Compute the next version relative to `current`
    pub fn resolve(&self, current: &str) -> Result<Version, ValidationError> {
        match self {
            VersionArg::Explicit(version) => Ok(version.clone()),
            VersionArg::Bump(kind) => {
                let current = Version::parse(current)
                    .map_err(|_| ValidationError::InvalidCurrentVersion(current.to_string()))?;
                Ok(kind.apply(&current))
            }
        }
    }
}

impl FromStr for VersionArg {
    type Err = ValidationError;

    fn from_str(arg: &str) -> Result<Self, Self::Err> {
        if let Some(kind) = BumpKind::from_keyword(arg) {
            return Ok(VersionArg::Bump(kind));
        }
        Version::parse(arg)
            .map(VersionArg::Explicit)
            .map_err(|_| ValidationError::InvalidVersionArgument(arg.to_string()))
    }
}

impl fmt::Display for VersionArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionArg::Bump(kind) => write!(f, "{}", kind),
            VersionArg::Explicit(version) => write!(f, "{}", version),
        }
    }
}

/// Resolve `arg` against `current`
///
/// Explicit versions are returned unchanged, even when lower than
/// `current`; see [`ensure_forward`] for the strict check.
pub fn resolve(current: &str, arg: &str) -> Result<Version, ValidationError> {
    arg.parse::<VersionArg>()?.resolve(current)
}

/// Reject a next version that does not move past `current`
pub fn ensure_forward(current: &str, next: &Version) -> Result<(), ValidationError> {
    let parsed = Version::parse(current)
        .map_err(|_| ValidationError::InvalidCurrentVersion(current.to_string()))?;
    // Build metadata does not count toward precedence
    if next.cmp_precedence(&parsed) != Ordering::Greater {
        return Err(ValidationError::VersionNotIncreased {
            current: current.to_string(),
            next: next.to_string(),
        });
    }
    Ok(())
}
