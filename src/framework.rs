//! Target platform identifiers
//!
//! A target platform is a runtime family plus a version, written either as a
//! `lib/` folder short name (`net45`, `sl5`, `MonoAndroid`) or as a full name
//! (`.NETFramework,Version=v4.5`). Both spellings parse into the same
//! [`TargetPlatform`].

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Short-name prefixes and the runtime family each one stands for
///
/// Longer prefixes come first so `netcore` wins over `net`.
const FAMILIES: &[(&str, &str)] = &[
    ("netcore", ".NETCore"),
    ("net", ".NETFramework"),
    ("winrt", ".NETCore"),
    ("windows", "Windows"),
    ("win", "Windows"),
    ("sl", "Silverlight"),
    ("wp", "WindowsPhone"),
    ("monoandroid", "MonoAndroid"),
    ("monotouch", "MonoTouch"),
    ("monomac", "MonoMac"),
    ("portable-", ".NETPortable"),
];

/// A runtime family and version that library files are compiled for
#[derive(Debug, Clone)]
pub struct TargetPlatform {
    identifier: String,
    version: Vec<u32>,
    short_name: String,
}

impl TargetPlatform {
    /// The runtime family, e.g. `.NETFramework`
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Version components with trailing zeros removed (`4.0` is `[4]`)
    pub fn version(&self) -> &[u32] {
        &self.version
    }

    /// Folder-style name, e.g. `net45`
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// True when both platforms belong to the same runtime family
    pub fn same_family(&self, other: &TargetPlatform) -> bool {
        self.identifier.eq_ignore_ascii_case(&other.identifier)
    }

    /// True when `self` is the same family as `other` with a strictly higher version
    pub fn is_newer_than(&self, other: &TargetPlatform) -> bool {
        self.same_family(other) && self.version > other.version
    }

    /// .NETFramework 4.0, the oldest runtime a release package can target
    pub fn net40() -> Self {
        Self::new(".NETFramework", vec![4, 0])
    }

    fn new(identifier: &str, version: Vec<u32>) -> Self {
        let version = trim_version(version);
        let short_name = short_name_for(identifier, &version);
        Self {
            identifier: identifier.to_string(),
            version,
            short_name,
        }
    }

    /// Parse a `lib/` folder name such as `net45`, `net451`, `sl5` or `MonoAndroid`
    pub fn from_folder(folder: &str) -> Result<Self> {
        let lower = folder.to_ascii_lowercase();
        let invalid = || Error::InvalidManifest(format!("Unrecognized platform folder '{}'", folder));

        let (prefix, identifier) = FAMILIES
            .iter()
            .find(|(prefix, _)| lower.starts_with(prefix))
            .ok_or_else(invalid)?;

        if *identifier == ".NETPortable" {
            return Ok(Self {
                identifier: identifier.to_string(),
                version: Vec::new(),
                short_name: folder.to_string(),
            });
        }

        let rest = &lower[prefix.len()..];
        let version = if rest.is_empty() {
            Vec::new()
        } else if rest.contains('.') {
            rest.split('.')
                .map(|p| p.parse::<u32>().map_err(|_| invalid()))
                .collect::<Result<Vec<_>>>()?
        } else if rest.bytes().all(|b| b.is_ascii_digit()) {
            // net45 -> 4.5, net451 -> 4.5.1
            rest.bytes().map(|b| u32::from(b - b'0')).collect()
        } else {
            return Err(invalid());
        };

        Ok(Self::new(identifier, version))
    }

    /// Parse a framework name declared in a manifest attribute
    ///
    /// Manifests name frameworks this crate has no family for (`uap10.0`,
    /// `net45-client`). Those are kept as a platform equal only to the same
    /// name, so declarations scoped to them never match a known target.
    pub fn from_declaration(name: &str) -> Self {
        let name = name.trim();
        name.parse()
            .or_else(|_| Self::from_full_name(name))
            .unwrap_or_else(|_| Self::opaque(name))
    }

    fn opaque(name: &str) -> Self {
        Self {
            identifier: name.to_string(),
            version: Vec::new(),
            short_name: name.to_string(),
        }
    }

    /// Parse a full framework name such as `.NETFramework,Version=v4.5` or `.NETFramework4.5`
    pub fn from_full_name(name: &str) -> Result<Self> {
        let invalid = || Error::InvalidManifest(format!("Unrecognized target framework '{}'", name));

        let mut parts = name.split(',');
        let identifier = parts.next().map(str::trim).filter(|s| !s.is_empty()).ok_or_else(invalid)?;

        let mut version = None;
        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                return Err(invalid());
            };
            if key.trim().eq_ignore_ascii_case("version") {
                let value = value.trim().trim_start_matches(['v', 'V']);
                version = Some(
                    value
                        .split('.')
                        .map(|p| p.parse::<u32>().map_err(|_| invalid()))
                        .collect::<Result<Vec<_>>>()?,
                );
            }
        }

        // `.NETFramework4.5` carries its version in the identifier
        let (identifier, version) = match version {
            Some(version) => (identifier, version),
            None => split_trailing_version(identifier),
        };

        let canonical = FAMILIES
            .iter()
            .map(|(_, id)| *id)
            .find(|id| id.eq_ignore_ascii_case(identifier))
            .unwrap_or(identifier);

        Ok(Self::new(canonical, version))
    }
}

/// `.NETFramework4.5` becomes (`.NETFramework`, `[4, 5]`); names without a
/// trailing version come back whole
fn split_trailing_version(name: &str) -> (&str, Vec<u32>) {
    let head = name.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
    let tail = &name[head.len()..];
    if head.is_empty() || !tail.starts_with(|c: char| c.is_ascii_digit()) {
        return (name, Vec::new());
    }

    match tail
        .split('.')
        .map(str::parse::<u32>)
        .collect::<std::result::Result<Vec<_>, _>>()
    {
        Ok(version) => (head, version),
        Err(_) => (name, Vec::new()),
    }
}

fn trim_version(mut version: Vec<u32>) -> Vec<u32> {
    while version.last() == Some(&0) {
        version.pop();
    }
    version
}

fn short_name_for(identifier: &str, version: &[u32]) -> String {
    let prefix = FAMILIES
        .iter()
        .find(|(_, id)| *id == identifier)
        .map(|(prefix, _)| *prefix)
        .unwrap_or(identifier);

    let mut digits: Vec<String> = version.iter().map(u32::to_string).collect();
    if identifier == ".NETFramework" && digits.len() == 1 {
        // net40, not net4
        digits.push("0".to_string());
    }

    if digits.iter().all(|d| d.len() == 1) {
        format!("{}{}", prefix, digits.concat())
    } else {
        format!("{}{}", prefix, digits.join("."))
    }
}

impl PartialEq for TargetPlatform {
    fn eq(&self, other: &Self) -> bool {
        self.same_family(other) && self.version == other.version
    }
}

impl Eq for TargetPlatform {}

impl std::hash::Hash for TargetPlatform {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identifier.to_ascii_lowercase().hash(state);
        self.version.hash(state);
    }
}

impl FromStr for TargetPlatform {
    type Err = Error;

    /// Accepts either spelling; a comma marks a full name
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains(',') || s.starts_with('.') {
            Self::from_full_name(s)
        } else {
            Self::from_folder(s)
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name)
    }
}
