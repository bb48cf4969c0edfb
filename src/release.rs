//! Release package creation
//!
//! A release package is an application package with the library files of all
//! its resolved dependencies copied in, its dependency declarations removed,
//! and content types for delta updates declared. The work happens in a
//! scratch directory that is removed on every exit path; the output archive
//! only appears once it is complete.
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
//!
//! let render = |notes: &str| format!("<p>{}</p>", notes);
//! let path = release.create_release_package(&output, Some(Path::new("packages")), Some(&render))?;
//! println!("Created {}", path.display());
//! # Ok(())
//! # }
//! ```

use crate::content_types::{self, CONTENT_TYPES_FILE};
use crate::manifest;
use crate::{
    archive, resolve_dependencies, Config, Error, Package, PackageStore, PlatformPolicy, Result,
    TargetPlatform,
};
use regex::Regex;
use semver::Version;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Text transform applied to the release notes, e.g. markdown to HTML
pub type ReleaseNotesProcessor<'a> = &'a dyn Fn(&str) -> String;

/// Extensions of binaries whose XML documentation is stripped
const BINARY_EXTENSIONS: &[&str] = &["dll", "exe"];

/// An application package on its way to becoming a release package
#[derive(Debug, Clone)]
pub struct ReleasePackage {
    input_package_file: PathBuf,
    release_package_file: Option<PathBuf>,
}

impl ReleasePackage {
    /// Wrap an input package
    ///
    /// With `is_release_package` set, the input already is a finished release
    /// package and [`create_release_package`](Self::create_release_package)
    /// returns it without doing any work.
    pub fn new<P: AsRef<Path>>(input_package_file: P, is_release_package: bool) -> Self {
        let input_package_file = input_package_file.as_ref().to_path_buf();
        let release_package_file = is_release_package.then(|| input_package_file.clone());
        Self {
            input_package_file,
            release_package_file,
        }
    }

    pub fn input_package_file(&self) -> &Path {
        &self.input_package_file
    }

    /// The finished release package, once there is one
    pub fn release_package_file(&self) -> Option<&Path> {
        self.release_package_file.as_deref()
    }

    /// `{id}-{version}-full.nupkg`, read from the input package's manifest
    pub fn suggested_release_file_name(&self) -> Result<String> {
        let package = Package::open(&self.input_package_file)?;
        Ok(suggested_file_name(package.id(), package.version()))
    }

    /// Version encoded in the input file name (`App-1.2.0.nupkg`, `App-1.2.0-full.nupkg`)
    pub fn version(&self) -> Option<Version> {
        version_from_file_name(&self.input_package_file)
    }

    /// Build the release package at `output_file` using the default configuration
    ///
    /// `packages_root_dir` is where dependency archives are looked up.
    pub fn create_release_package<P: AsRef<Path>>(
        &mut self,
        output_file: P,
        packages_root_dir: Option<&Path>,
        release_notes_processor: Option<ReleaseNotesProcessor<'_>>,
    ) -> Result<PathBuf> {
        self.create_release_package_with_config(
            output_file,
            packages_root_dir,
            release_notes_processor,
            &Config::default(),
        )
    }

    /// Build the release package at `output_file`
    ///
    /// `packages_root_dir` overrides `config.store.packages_dir`. Once this
    /// succeeds, later calls return the same path without rebuilding.
    pub fn create_release_package_with_config<P: AsRef<Path>>(
        &mut self,
        output_file: P,
        packages_root_dir: Option<&Path>,
        release_notes_processor: Option<ReleaseNotesProcessor<'_>>,
        config: &Config,
    ) -> Result<PathBuf> {
        if let Some(existing) = &self.release_package_file {
            debug!(package = %existing.display(), "Already a release package");
            return Ok(existing.clone());
        }

        let output_file = output_file.as_ref();
        if output_file.as_os_str().is_empty() {
            return Err(Error::Other("Output file path is empty".to_string()));
        }

        let package = Package::open(&self.input_package_file)?;
        let target = single_target_platform(&package, &self.input_package_file)?;
        info!(package = %package.full_name(), target = %target, "Creating release package");

        let store = PackageStore::from_config(packages_root_dir, &config.store);
        let dependencies = resolve_dependencies(&package, &target, &store, &config.resolver)?;
        let policy = PlatformPolicy::from_config(&config.policy)?;

        build_release_archive(
            &self.input_package_file,
            &dependencies,
            &target,
            output_file,
            release_notes_processor,
            &policy,
        )?;

        self.release_package_file = Some(output_file.to_path_buf());
        Ok(output_file.to_path_buf())
    }
}

/// `{id}-{version}-full.nupkg`
pub fn suggested_file_name(id: &str, version: &Version) -> String {
    format!("{}-{}-full.{}", id, version, crate::package::PACKAGE_EXTENSION)
}

/// The one platform `package` targets
///
/// Packages targeting several platforms cannot become a release package, and
/// neither can packages targeting none.
pub fn single_target_platform(package: &Package, path: &Path) -> Result<TargetPlatform> {
    match package.supported_platforms() {
        [single] => Ok(single.clone()),
        [] => Err(Error::MissingPlatform(path.display().to_string())),
        many => Err(Error::AmbiguousPlatform {
            package: path.display().to_string(),
            platforms: many.iter().map(ToString::to_string).collect(),
        }),
    }
}

/// Turn `input` plus its resolved `dependencies` into a release archive at `output`
///
/// Steps, all inside a scratch directory:
/// 1. extract `input`
/// 2. copy in every dependency library file `policy` accepts for `target`
/// 3. drop `dependencies` from the manifest
/// 4. delete XML documentation of binaries
/// 5. render the release notes, if a processor is given
/// 6. declare delta content types
/// 7. pack the scratch directory into `output`
pub fn build_release_archive(
    input: &Path,
    dependencies: &[Arc<Package>],
    target: &TargetPlatform,
    output: &Path,
    release_notes_processor: Option<ReleaseNotesProcessor<'_>>,
    policy: &PlatformPolicy,
) -> Result<PathBuf> {
    let workspace = tempfile::Builder::new().prefix("relpack-").tempdir()?;
    let root = workspace.path();
    debug!(workspace = %root.display(), "Created scratch directory");

    archive::extract_all(input, root)?;
    extract_dependent_packages(dependencies, root, target, policy)?;

    let spec_path = find_manifest_file(root)?;
    let xml = fs::read_to_string(&spec_path)?;
    let mut xml = manifest::remove_dependencies(&xml)?;

    remove_developer_documentation(root)?;

    if let Some(render) = release_notes_processor {
        match manifest::render_release_notes(&xml, render)? {
            Some(rendered) => xml = rendered,
            None => info!(manifest = %spec_path.display(), "No release notes found"),
        }
    }
    fs::write(&spec_path, xml)?;

    add_delta_files_to_content_types(root)?;

    let files = archive::pack_directory(root, output)?;
    info!(output = %output.display(), files, "Release package written");

    // Dropping the TempDir removes the scratch directory; surface failures here
    workspace.close()?;
    Ok(output.to_path_buf())
}

fn extract_dependent_packages(
    dependencies: &[Arc<Package>],
    root: &Path,
    target: &TargetPlatform,
    policy: &PlatformPolicy,
) -> Result<()> {
    for package in dependencies {
        info!(package = %package.id(), version = %package.version(), "Scanning");
        let written = package.copy_lib_files(root, |file| {
            policy.accept(&file.path, file.platform.as_ref(), target)
        })?;
        debug!(package = %package.full_name(), files = written, "Copied library files");
    }
    Ok(())
}

/// The manifest at the root of an extracted package
fn find_manifest_file(root: &Path) -> Result<PathBuf> {
    let mut manifests: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("nuspec"))
        })
        .collect();
    manifests.sort();

    manifests
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvalidManifest("Extracted package has no .nuspec manifest".to_string()))
}

/// Delete `Foo.xml` next to every `Foo.dll` / `Foo.exe`, matching names case-insensitively
fn remove_developer_documentation(root: &Path) -> Result<()> {
    let mut binaries: HashMap<PathBuf, HashSet<String>> = HashMap::new();
    let mut docs: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let (Some(stem), Some(ext), Some(dir)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
            path.parent(),
        ) else {
            continue;
        };

        let ext = ext.to_ascii_lowercase();
        if BINARY_EXTENSIONS.contains(&ext.as_str()) {
            binaries
                .entry(dir.to_path_buf())
                .or_default()
                .insert(stem.to_lowercase());
        } else if ext == "xml" {
            docs.push(path.to_path_buf());
        }
    }

    for doc in docs {
        let documented = match (doc.parent(), doc.file_stem().and_then(|s| s.to_str())) {
            (Some(dir), Some(stem)) => binaries
                .get(dir)
                .is_some_and(|stems| stems.contains(&stem.to_lowercase())),
            _ => false,
        };

        if documented {
            debug!(file = %doc.display(), "Removing developer documentation");
            fs::remove_file(&doc)?;
        }
    }

    Ok(())
}

fn add_delta_files_to_content_types(root: &Path) -> Result<()> {
    let path = root.join(CONTENT_TYPES_FILE);
    let xml = if path.exists() {
        fs::read_to_string(&path)?
    } else {
        debug!("No content types file, creating one");
        content_types::empty_content_types().to_string()
    };

    let merged = content_types::merge_delta_content_types(&xml)?;
    fs::write(&path, merged)?;
    Ok(())
}

static FILE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[-.](\d+(?:\.\d+){1,3}(?:-[0-9a-z][0-9a-z.]*)?(?:\+[0-9a-z][0-9a-z.]*)?)(?:-full|-delta)?\.nupkg$",
    )
    .expect("valid package file name pattern")
});

/// Version in a package file name: the last `-x.y[.z[.r]][-pre][+build]` before an optional `-full`/`-delta`
pub fn version_from_file_name(path: &Path) -> Option<Version> {
    let name = path.file_name()?.to_str()?;
    let captures = FILE_VERSION.captures(name)?;
    let text = captures.get(1)?.as_str();
    let text = text
        .strip_suffix("-full")
        .or_else(|| text.strip_suffix("-delta"))
        .unwrap_or(text);
    crate::version::parse_version(text).ok()
}
