//! Package archives
//!
//! A [`Package`] is read from a `.nupkg` zip: its manifest is parsed and its
//! entry list indexed when it is opened, file contents are streamed from the
//! archive only when they are copied.

use crate::archive;
use crate::manifest::{Dependency, Manifest};
use crate::{Error, Result, TargetPlatform};
use semver::Version;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension of package archives
pub const PACKAGE_EXTENSION: &str = "nupkg";

/// A library file inside a package (`lib/<platform>/<file>`)
#[derive(Debug, Clone)]
pub struct LibFile {
    /// Archive entry name, `/`-separated
    pub path: String,
    /// Platform declared by the folder under `lib/`, if it names one
    pub platform: Option<TargetPlatform>,
}

/// An immutable view of one package archive
#[derive(Debug, Clone)]
pub struct Package {
    path: PathBuf,
    manifest: Manifest,
    lib_files: Vec<LibFile>,
    supported_platforms: Vec<TargetPlatform>,
}

impl Package {
    /// Open a package archive, reading its manifest and file list
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut zip = archive::open(path)?;

        let manifests: Vec<String> = zip
            .file_names()
            .filter(|name| !name.contains('/') && has_extension(name, "nuspec"))
            .map(String::from)
            .collect();

        let manifest_name = match manifests.as_slice() {
            [single] => single.clone(),
            [] => {
                return Err(Error::InvalidManifest(format!(
                    "{} contains no .nuspec manifest",
                    path.display()
                )))
            }
            _ => {
                return Err(Error::InvalidManifest(format!(
                    "{} contains more than one .nuspec manifest: {}",
                    path.display(),
                    manifests.join(", ")
                )))
            }
        };

        let xml = archive::read_entry_to_string(&mut zip, &manifest_name)?;
        let manifest = Manifest::parse(&xml).map_err(|e| match e {
            Error::InvalidManifest(msg) => {
                Error::InvalidManifest(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })?;

        let mut entry_names: Vec<String> = zip.file_names().map(String::from).collect();
        entry_names.sort();

        let lib_files: Vec<LibFile> = entry_names
            .into_iter()
            .filter(|name| is_lib_entry(name))
            .map(|name| {
                let platform = platform_folder(&name).and_then(|folder| {
                    TargetPlatform::from_folder(folder)
                        .map_err(|_| debug!(entry = %name, "Library folder names no known platform"))
                        .ok()
                });
                LibFile {
                    path: name,
                    platform,
                }
            })
            .collect();

        let mut supported_platforms: Vec<TargetPlatform> = Vec::new();
        let declared = lib_files
            .iter()
            .filter_map(|f| f.platform.clone())
            .chain(manifest.framework_assemblies.iter().cloned());
        for platform in declared {
            if !supported_platforms.contains(&platform) {
                supported_platforms.push(platform);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            manifest,
            lib_files,
            supported_platforms,
        })
    }

    /// Quick check whether a path looks like a package archive
    pub fn is_package_file(path: &Path) -> bool {
        path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| has_extension(n, PACKAGE_EXTENSION))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn version(&self) -> &Version {
        &self.manifest.version
    }

    /// `"{id} {version}"`, the identity used to deduplicate packages
    pub fn full_name(&self) -> String {
        format!("{} {}", self.manifest.id, self.manifest.version)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn release_notes(&self) -> Option<&str> {
        self.manifest.release_notes.as_deref()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.manifest.dependencies
    }

    pub fn lib_files(&self) -> &[LibFile] {
        &self.lib_files
    }

    /// Platforms this package has library files or framework references for
    pub fn supported_platforms(&self) -> &[TargetPlatform] {
        &self.supported_platforms
    }

    /// Copy the library files `accept` approves into `dest_root` at their archive paths
    ///
    /// Returns the number of files written.
    pub fn copy_lib_files<F>(&self, dest_root: &Path, mut accept: F) -> Result<usize>
    where
        F: FnMut(&LibFile) -> bool,
    {
        let mut zip = archive::open(&self.path)?;
        let mut written = 0;

        for file in &self.lib_files {
            if !accept(file) {
                continue;
            }

            let relative = safe_relative_path(&file.path).ok_or_else(|| {
                Error::InvalidManifest(format!(
                    "{} has a library file with an unsafe path: {}",
                    self.full_name(),
                    file.path
                ))
            })?;
            let dest = dest_root.join(relative);

            debug!(file = %file.path, dest = %dest.display(), "Writing library file");
            archive::extract_entry(&mut zip, &file.path, &dest)?;
            written += 1;
        }

        Ok(written)
    }
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

fn is_lib_entry(name: &str) -> bool {
    !name.ends_with('/')
        && name
            .get(..4)
            .is_some_and(|head| head.eq_ignore_ascii_case("lib/"))
}

/// `net45` for `lib/net45/Foo.dll`; `None` for files directly under `lib/`
fn platform_folder(name: &str) -> Option<&str> {
    let mut segments = name.split('/');
    segments.next()?;
    let folder = segments.next()?;
    segments.next()?;
    Some(folder)
}

/// Relative path for an archive entry name, refusing absolute paths and `..`
fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for segment in name.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') || s.contains(':') => return None,
            s => path.push(s),
        }
    }
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}
