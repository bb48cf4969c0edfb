//! Package store: candidate dependency archives on disk
//!
//! The store indexes a search root (and optionally a machine-wide cache) the
//! first time a lookup needs it, then answers every later lookup from that
//! in-memory catalog. A store value is meant to live for one build.
//!
//! # Examples
//!
//! ```no_run
//! use relpack::{PackageStore, SelectionPolicy, VersionRange};
//!
//! let store = PackageStore::new(Some("packages".into()), None, SelectionPolicy::FirstMatch);
//! let range: VersionRange = "[1.0,2.0)".parse().unwrap();
//! if let Some(pkg) = store.find("Newtonsoft.Json", Some(&range)) {
//!     println!("Found {}", pkg.full_name());
//! }
//! ```

use crate::config::{SelectionPolicy, StoreConfig};
use crate::version::{self, VersionRange};
use crate::Package;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Read-only lookup of packages by id and version range
#[derive(Debug)]
pub struct PackageStore {
    root: Option<PathBuf>,
    machine_cache: Option<PathBuf>,
    selection: SelectionPolicy,
    catalog: OnceLock<Vec<Arc<Package>>>,
    machine_catalog: OnceLock<Vec<Arc<Package>>>,
}

impl PackageStore {
    pub fn new(
        root: Option<PathBuf>,
        machine_cache: Option<PathBuf>,
        selection: SelectionPolicy,
    ) -> Self {
        Self {
            root,
            machine_cache,
            selection,
            catalog: OnceLock::new(),
            machine_catalog: OnceLock::new(),
        }
    }

    /// Store for `root`, falling back to the configured search root when `root` is `None`
    pub fn from_config(root: Option<&Path>, config: &StoreConfig) -> Self {
        Self::new(
            root.map(Path::to_path_buf).or_else(|| config.packages_dir.clone()),
            config.machine_cache.clone(),
            config.selection,
        )
    }

    /// The directories this store searches, in lookup order
    pub fn search_roots(&self) -> Vec<String> {
        self.root
            .iter()
            .chain(self.machine_cache.iter())
            .map(|p| p.display().to_string())
            .collect()
    }

    /// Find a package whose id matches `id` (case-insensitively) and whose
    /// version satisfies `range`
    ///
    /// The search root is consulted first; the machine cache only when the
    /// search root has no match.
    pub fn find(&self, id: &str, range: Option<&VersionRange>) -> Option<Arc<Package>> {
        self.select(self.catalog(), id, range)
            .or_else(|| self.select(self.machine_catalog(), id, range))
    }

    /// Every package in the search root's catalog
    pub fn catalog(&self) -> &[Arc<Package>] {
        self.catalog
            .get_or_init(|| self.root.as_deref().map(build_catalog).unwrap_or_default())
    }

    fn machine_catalog(&self) -> &[Arc<Package>] {
        self.machine_catalog.get_or_init(|| {
            self.machine_cache
                .as_deref()
                .map(build_catalog)
                .unwrap_or_default()
        })
    }

    fn select(
        &self,
        catalog: &[Arc<Package>],
        id: &str,
        range: Option<&VersionRange>,
    ) -> Option<Arc<Package>> {
        let mut candidates = catalog
            .iter()
            .filter(|p| p.id().eq_ignore_ascii_case(id))
            .filter(|p| version::matches(range, p.version()));

        let chosen = match self.selection {
            SelectionPolicy::FirstMatch => candidates.next(),
            SelectionPolicy::HighestVersion => {
                let mut best: Option<&Arc<Package>> = None;
                for candidate in candidates {
                    if best.map_or(true, |b| candidate.version() > b.version()) {
                        best = Some(candidate);
                    }
                }
                best
            }
        };

        chosen.cloned()
    }
}

/// Open every package archive under `root`, in file-name order
///
/// Archives that fail to open are left out of the catalog.
fn build_catalog(root: &Path) -> Vec<Arc<Package>> {
    let mut packages = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Skipping unreadable path in package root");
                continue;
            }
        };

        if !Package::is_package_file(entry.path()) {
            continue;
        }

        match Package::open(entry.path()) {
            Ok(package) => packages.push(Arc::new(package)),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Ignoring invalid package archive")
            }
        }
    }

    debug!(root = %root.display(), packages = packages.len(), "Indexed package root");
    packages
}
