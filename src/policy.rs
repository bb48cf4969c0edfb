//! Platform filter policy for library files copied into a release package
//!
//! Desktop hosts cannot load assemblies built for sandboxed or mobile
//! runtimes, and a host on the oldest supported runtime cannot load
//! assemblies built for a newer revision of it. Both rules are evaluated per
//! file.

use crate::config::PolicyConfig;
use crate::{Result, TargetPlatform};
use tracing::info;

/// Platform folder prefixes that are never shipped in a desktop release
pub const DENIED_PLATFORMS: &[&str] = &[
    "sl",
    "winrt",
    "netcore",
    "win8",
    "windows8",
    "MonoAndroid",
    "MonoTouch",
    "MonoMac",
    "wp",
];

/// Oldest runtime revision a release package can target
pub const OLDEST_RUNTIME: &str = "net40";

/// Why a file was left out of the release package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The platform folder belongs to a denied family
    UnsupportedPlatform(String),
    /// The file targets a newer runtime revision than the oldest-runtime target
    NewerRuntime { file: String, target: String },
}

/// Classification rules deciding which library files ship for a target
#[derive(Debug, Clone)]
pub struct PlatformPolicy {
    denied: Vec<String>,
    oldest_runtime: TargetPlatform,
}

impl PlatformPolicy {
    pub fn new(denied: Vec<String>, oldest_runtime: TargetPlatform) -> Self {
        Self {
            denied,
            oldest_runtime,
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Result<Self> {
        Ok(Self::new(
            config.denied_platforms.clone(),
            config.oldest_runtime.parse()?,
        ))
    }

    /// Decide whether a library file is acceptable, with the reason when it isn't
    ///
    /// `file_path` is the archive-relative path (`lib/net45/Foo.dll`) and
    /// `file_platform` the platform its folder declares, if any.
    pub fn check(
        &self,
        file_path: &str,
        file_platform: Option<&TargetPlatform>,
        target: &TargetPlatform,
    ) -> std::result::Result<(), Rejection> {
        let folder = platform_folder(file_path);
        if let Some(denied) = self
            .denied
            .iter()
            .find(|d| starts_with_ignore_case(folder, d))
        {
            return Err(Rejection::UnsupportedPlatform(denied.clone()));
        }

        if *target == self.oldest_runtime {
            if let Some(platform) = file_platform {
                if platform.is_newer_than(target) {
                    return Err(Rejection::NewerRuntime {
                        file: platform.to_string(),
                        target: target.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Same as [`check`](Self::check), logging the reason for rejected files
    pub fn accept(
        &self,
        file_path: &str,
        file_platform: Option<&TargetPlatform>,
        target: &TargetPlatform,
    ) -> bool {
        match self.check(file_path, file_platform, target) {
            Ok(()) => true,
            Err(Rejection::UnsupportedPlatform(family)) => {
                info!(file = file_path, family = %family, "Ignoring file as the platform is not acceptable");
                false
            }
            Err(Rejection::NewerRuntime { file, target }) => {
                info!(
                    file = file_path,
                    file_platform = %file,
                    target = %target,
                    "Ignoring file built for a newer runtime than the target"
                );
                false
            }
        }
    }
}

impl Default for PlatformPolicy {
    fn default() -> Self {
        Self::new(
            DENIED_PLATFORMS.iter().map(|s| s.to_string()).collect(),
            TargetPlatform::net40(),
        )
    }
}

/// The part of a library path after the leading `lib/` folder
fn platform_folder(path: &str) -> &str {
    let path = path.trim_start_matches(['/', '\\']);
    match path.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("lib/") || head.eq_ignore_ascii_case("lib\\") => {
            &path[4..]
        }
        _ => path,
    }
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> TargetPlatform {
        s.parse().unwrap()
    }

    #[test]
    fn test_denied_families_rejected_for_any_target() {
        let policy = PlatformPolicy::default();
        for path in [
            "lib/winrt/Lib.dll",
            "lib/sl5/Lib.dll",
            "lib/wp8/Lib.dll",
            "lib/netcore45/Lib.dll",
            "lib/Win8/Lib.dll",
            "lib/monoandroid/Lib.dll",
            "lib/MonoTouch10/Lib.dll",
        ] {
            assert!(!policy.accept(path, None, &p("net45")), "{} should be rejected", path);
            assert!(!policy.accept(path, None, &p("net40")), "{} should be rejected", path);
        }
    }

    #[test]
    fn test_desktop_folders_accepted() {
        let policy = PlatformPolicy::default();
        assert!(policy.accept("lib/net45/Lib.dll", Some(&p("net45")), &p("net45")));
        assert!(policy.accept("lib/net40/Lib.dll", Some(&p("net40")), &p("net45")));
        assert!(policy.accept("lib/net20/Lib.dll", Some(&p("net20")), &p("net40")));
        assert!(policy.accept("lib/Lib.dll", None, &p("net40")));
    }

    #[test]
    fn test_newer_runtime_rejected_only_for_oldest_target() {
        let policy = PlatformPolicy::default();
        assert_eq!(
            policy.check("lib/net45/Lib.dll", Some(&p("net45")), &p("net40")),
            Err(Rejection::NewerRuntime {
                file: "net45".to_string(),
                target: "net40".to_string()
            })
        );
        assert!(policy.accept("lib/net45/Lib.dll", Some(&p("net45")), &p("net45")));
        assert!(policy.accept("lib/net451/Lib.dll", Some(&p("net451")), &p("net45")));
    }

    #[test]
    fn test_platform_folder() {
        assert_eq!(platform_folder("lib/net45/Lib.dll"), "net45/Lib.dll");
        assert_eq!(platform_folder("LIB\\sl5\\Lib.dll"), "sl5\\Lib.dll");
        assert_eq!(platform_folder("content/x.txt"), "content/x.txt");
    }
}
