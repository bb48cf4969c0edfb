use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Version parsing error: {0}")]
    SemVer(#[from] semver::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Could not move finished archive into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("The input package file {package} targets multiple platforms - {} - \
             and cannot be transformed into a release package.\n\n\
             Hint: A release package is built for exactly one platform.\n\
             Repack the application so that lib/ contains a single platform folder\n\
             (for example lib/net45/) and no frameworkAssembly entries for other platforms.",
             .platforms.join("; "))]
    AmbiguousPlatform {
        package: String,
        platforms: Vec<String>,
    },

    #[error("The input package file {0} does not target any platform\n\n\
             Hint: Place the application's binaries under a platform folder such as lib/net45/.")]
    MissingPlatform(String),

    #[error("Couldn't find file for package in {}: {id} ({range})\n\n\
             Hint: Every dependency must be available as a .nupkg archive in the search roots.\n\
             Check the packages directory passed with --packages, or the store.packages_dir\n\
             and store.machine_cache settings in your configuration.",
             .search_roots.join(", "))]
    DependencyNotFound {
        id: String,
        range: String,
        search_roots: Vec<String>,
    },

    #[error("Dependency graph of {package} is deeper than {max_depth} levels\n\n\
             Hint: Raise resolver.max_depth in your configuration if the graph is genuinely this deep.")]
    DependencyDepthExceeded { package: String, max_depth: usize },

    #[error("Invalid package manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Invalid version range '{0}'")]
    InvalidVersionRange(String),

    #[error("Invalid content types file: {0}")]
    InvalidContentTypes(String),

    #[error("{0}")]
    Other(String),
}
