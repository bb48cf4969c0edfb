//! relpack - Release package builder for NuGet-style application packages
//!
//! relpack turns an application `.nupkg` into a self-contained release package
//! ready for an installer/updater to consume:
//!
//! - Transitive dependency resolution against a local package directory
//! - Dependency library files merged in, filtered to the application's platform
//! - Manifest rewritten without dependencies, with rendered release notes
//! - Developer documentation stripped and delta content types declared
//!
//! # Examples
//!
//! ```no_run
//! use relpack::ReleasePackage;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut release = ReleasePackage::new("App.1.0.0.nupkg", false);
//! let output = release.suggested_release_file_name()?;
//! release.create_release_package(&output, Some(Path::new("packages")), None)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`release`] - Build release packages
//! - [`resolver`] - Resolve transitive dependencies for one platform
//! - [`store`] - Look up candidate packages on disk
//! - [`package`] - Read package archives
//! - [`manifest`] - Parse and rewrite `.nuspec` manifests
//! - [`policy`] - Decide which library files ship for a platform
//! - [`framework`] - Target platform names
//! - [`version`] - NuGet-style versions and version ranges
//! - [`content_types`] - `[Content_Types].xml` handling
//! - [`archive`] - Zip extraction and packing
//! - [`config`] - User configuration
//! - [`error`] - Error types and result handling

pub mod archive;
pub mod config;
pub mod content_types;
pub mod error;
pub mod framework;
pub mod manifest;
pub mod package;
pub mod policy;
pub mod release;
pub mod resolver;
pub mod store;
pub mod version;

pub use config::{Config, LogConfig, PolicyConfig, ResolverConfig, SelectionPolicy, StoreConfig};
pub use error::{Error, Result};
pub use framework::TargetPlatform;
pub use manifest::{Dependency, Manifest};
pub use package::{LibFile, Package};
pub use policy::{PlatformPolicy, Rejection};
pub use release::{build_release_archive, ReleaseNotesProcessor, ReleasePackage};
pub use resolver::resolve_dependencies;
pub use store::PackageStore;
pub use version::{parse_version, VersionRange};
