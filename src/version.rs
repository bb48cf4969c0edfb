//! Package versions and version range matching
//!
//! Package manifests carry NuGet-style versions (`1.0`, `1.2.3`, `2.0.0-beta1`)
//! and interval-notation ranges (`[1.0,2.0)`). Versions are normalized into
//! [`semver::Version`] so ordering follows semantic versioning.
//!
//! # Examples
//!
//! ```
//! use relpack::{parse_version, VersionRange};
//!
//! let range: VersionRange = "[1.0,2.0)".parse().unwrap();
//! assert!(range.matches(&parse_version("1.5").unwrap()));
//! assert!(!range.matches(&parse_version("2.0").unwrap()));
//! ```

use crate::{Error, Result};
use semver::{BuildMetadata, Version};
use std::fmt;
use std::str::FromStr;

/// Parse a package version, accepting the short forms manifests use
///
/// `1` and `1.0` are widened to `1.0.0`. A zero fourth component is dropped
/// (`1.2.3.0` is `1.2.3`); any other is kept as leading build metadata, so
/// `0.86.0.518` becomes `0.86.0+518` and still orders after `0.86.0`.
pub fn parse_version(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidVersion(input.to_string()));
    }

    let (core, suffix) = match trimmed.find(['-', '+']) {
        Some(idx) => trimmed.split_at(idx),
        None => (trimmed, ""),
    };

    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return Err(Error::InvalidVersion(input.to_string()));
    }

    let mut revision = None;
    match parts.len() {
        1 | 2 => parts.resize(3, "0"),
        3 => {}
        4 => {
            let rev = parts[3].parse::<u64>().map_err(|_| Error::InvalidVersion(input.to_string()))?;
            if rev != 0 {
                revision = Some(rev);
            }
            parts.truncate(3);
        }
        _ => return Err(Error::InvalidVersion(input.to_string())),
    }

    let normalized = format!("{}{}", parts.join("."), suffix);
    let mut version =
        Version::parse(&normalized).map_err(|_| Error::InvalidVersion(input.to_string()))?;

    if let Some(rev) = revision {
        let build = if version.build.is_empty() {
            rev.to_string()
        } else {
            format!("{}.{}", rev, version.build)
        };
        version.build =
            BuildMetadata::new(&build).map_err(|_| Error::InvalidVersion(input.to_string()))?;
    }

    Ok(version)
}

/// A version constraint with optional, independently inclusive bounds
///
/// An absent bound is unbounded on that side, so `VersionRange::default()`
/// accepts every version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRange {
    pub min: Option<Version>,
    pub min_inclusive: bool,
    pub max: Option<Version>,
    pub max_inclusive: bool,
}

impl VersionRange {
    /// Range accepting every version at or above `min`
    pub fn at_least(min: Version) -> Self {
        Self {
            min: Some(min),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
        }
    }

    /// Range accepting exactly `version`
    pub fn exact(version: Version) -> Self {
        Self {
            min: Some(version.clone()),
            min_inclusive: true,
            max: Some(version),
            max_inclusive: true,
        }
    }

    /// Check whether `version` satisfies both bounds of this range
    pub fn matches(&self, version: &Version) -> bool {
        let min_ok = match &self.min {
            None => true,
            Some(min) if self.min_inclusive => version >= min,
            Some(min) => version > min,
        };

        let max_ok = match &self.max {
            None => true,
            Some(max) if self.max_inclusive => version <= max,
            Some(max) => version < max,
        };

        min_ok && max_ok
    }
}

/// Check `version` against an optional range; no range matches everything
pub fn matches(range: Option<&VersionRange>, version: &Version) -> bool {
    range.map_or(true, |r| r.matches(version))
}

impl FromStr for VersionRange {
    type Err = Error;

    /// Parse interval notation
    ///
    /// * `1.0` - at least 1.0
    /// * `[1.0]` - exactly 1.0
    /// * `[1.0,2.0)` - 1.0 inclusive up to 2.0 exclusive
    /// * `(,2.0]` - anything up to and including 2.0
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::InvalidVersionRange(s.to_string());

        if s.is_empty() {
            return Ok(Self::default());
        }

        let first = s.chars().next().ok_or_else(invalid)?;
        if first != '[' && first != '(' {
            return Ok(Self::at_least(parse_version(s).map_err(|_| invalid())?));
        }

        let last = s.chars().last().ok_or_else(invalid)?;
        if s.len() < 3 || (last != ']' && last != ')') {
            return Err(invalid());
        }

        let min_inclusive = first == '[';
        let max_inclusive = last == ']';
        let inner = &s[1..s.len() - 1];

        let Some((low, high)) = inner.split_once(',') else {
            // Single version in brackets is only meaningful as [x]
            if !(min_inclusive && max_inclusive) {
                return Err(invalid());
            }
            return Ok(Self::exact(parse_version(inner).map_err(|_| invalid())?));
        };

        if high.contains(',') {
            return Err(invalid());
        }

        let parse_bound = |text: &str| -> Result<Option<Version>> {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else {
                parse_version(text).map(Some).map_err(|_| invalid())
            }
        };

        let min = parse_bound(low)?;
        let max = parse_bound(high)?;

        if min.is_none() && max.is_none() {
            return Err(invalid());
        }

        Ok(Self {
            min,
            min_inclusive,
            max,
            max_inclusive,
        })
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (None, None) => write!(f, "*"),
            (Some(min), None) if self.min_inclusive => write!(f, "{}", min),
            (Some(min), Some(max)) if min == max && self.min_inclusive && self.max_inclusive => {
                write!(f, "[{}]", min)
            }
            (min, max) => {
                let open = if self.min_inclusive { '[' } else { '(' };
                let close = if self.max_inclusive { ']' } else { ')' };
                let min = min.as_ref().map(|v| v.to_string()).unwrap_or_default();
                let max = max.as_ref().map(|v| v.to_string()).unwrap_or_default();
                write!(f, "{}{},{}{}", open, min, max, close)
            }
        }
    }
}
