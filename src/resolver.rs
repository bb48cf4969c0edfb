//! Dependency resolution for a single target platform
//!
//! Resolution walks the dependency declarations depth-first. Each package is
//! identified by its full name (`id version`); a package already visited in
//! the current walk is never descended into again, which keeps diamonds to a
//! single entry and lets cycles terminate.
//!
//! # Examples
//!
//! ```no_run
//! use relpack::{resolve_dependencies, Package, PackageStore, ResolverConfig, SelectionPolicy};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let app = Package::open("App.1.0.0.nupkg")?;
//! let store = PackageStore::new(Some("packages".into()), None, SelectionPolicy::FirstMatch);
//! let target = "net45".parse()?;
//!
//! let resolved = resolve_dependencies(&app, &target, &store, &ResolverConfig::default())?;
//! println!("Resolved {} packages", resolved.len());
//! # Ok(())
//! # }
//! ```

use crate::{Error, Package, PackageStore, ResolverConfig, Result, TargetPlatform};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error};

/// Resolve every transitive dependency of `package` for `target`
///
/// Declarations scoped to other platforms are skipped. The result holds each
/// package once, in the order it was first reached; `package` itself is never
/// part of it. A declaration the store cannot satisfy is an error naming the
/// missing id and the search roots.
pub fn resolve_dependencies(
    package: &Package,
    target: &TargetPlatform,
    store: &PackageStore,
    config: &ResolverConfig,
) -> Result<Vec<Arc<Package>>> {
    let mut visited = HashSet::new();
    visited.insert(identity(package));

    let mut resolved = Vec::new();
    walk(package, target, store, config, 0, &mut visited, &mut resolved)?;

    debug!(
        package = %package.full_name(),
        target = %target,
        count = resolved.len(),
        "Resolved dependencies"
    );
    Ok(resolved)
}

/// `depth` is 0 for the root package and 1 for its direct dependencies
fn walk(
    package: &Package,
    target: &TargetPlatform,
    store: &PackageStore,
    config: &ResolverConfig,
    depth: usize,
    visited: &mut HashSet<String>,
    resolved: &mut Vec<Arc<Package>>,
) -> Result<()> {
    if depth > config.max_depth {
        return Err(Error::DependencyDepthExceeded {
            package: package.full_name(),
            max_depth: config.max_depth,
        });
    }

    for dependency in package.manifest().dependencies_for(target) {
        let Some(found) = store.find(&dependency.id, dependency.range.as_ref()) else {
            let range = dependency
                .range
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "*".to_string());
            error!(
                id = %dependency.id,
                range = %range,
                required_by = %package.full_name(),
                "Couldn't find a package satisfying the dependency"
            );
            let mut search_roots = store.search_roots();
            if search_roots.is_empty() {
                search_roots.push("(no package directory configured)".to_string());
            }
            return Err(Error::DependencyNotFound {
                id: dependency.id.clone(),
                range,
                search_roots,
            });
        };

        if !visited.insert(identity(&found)) {
            continue;
        }

        debug!(
            dependency = %found.full_name(),
            required_by = %package.full_name(),
            "Resolved dependency"
        );
        resolved.push(Arc::clone(&found));
        walk(&found, target, store, config, depth + 1, visited, resolved)?;
    }

    Ok(())
}

/// Case-insensitive full name
fn identity(package: &Package) -> String {
    package.full_name().to_lowercase()
}
