//! Bundle modes.

/// How dependencies of a package are bundled.
///
/// The mode is supplied once per packaging request and decides which
/// bundling engines are offered to the asset stager, and in which slot.
///
/// # Example
///
/// ```
/// use layerpack_schema::BundleMode;
///
/// let mode: BundleMode = "local-only".parse().unwrap();
/// assert_eq!(mode, BundleMode::LocalOnly);
/// assert_eq!(BundleMode::default(), BundleMode::LocalWithDockerFallback);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum BundleMode {
    /// Install with the local package manager, fall back to a container build.
    #[default]
    LocalWithDockerFallback,
    /// Install with the local package manager only; never start a container.
    LocalOnly,
    /// Always build inside the installer container.
    DockerOnly,
}

impl BundleMode {
    /// Every mode, in documentation order.
    pub const ALL: [Self; 3] = [Self::LocalWithDockerFallback, Self::LocalOnly, Self::DockerOnly];

    /// Kebab-case name used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalWithDockerFallback => "local-with-docker-fallback",
            Self::LocalOnly => "local-only",
            Self::DockerOnly => "docker-only",
        }
    }

    /// Whether this mode offers the local package manager at all.
    pub fn uses_local(&self) -> bool {
        !matches!(self, Self::DockerOnly)
    }

    /// Whether this mode may start a container build.
    pub fn uses_docker(&self) -> bool {
        !matches!(self, Self::LocalOnly)
    }

    /// One-line description for help output.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::LocalWithDockerFallback => {
                "local package manager, container build if the local install fails"
            }
            Self::LocalOnly => "local package manager only; a failed install is final",
            Self::DockerOnly => "container build only; the local package manager is never run",
        }
    }
}

impl std::fmt::Display for BundleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BundleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "local-with-docker-fallback" | "fallback" => Ok(Self::LocalWithDockerFallback),
            "local-only" | "local" => Ok(Self::LocalOnly),
            "docker-only" | "docker" => Ok(Self::DockerOnly),
            _ => Err(format!(
                "Unknown bundle mode: {s} (expected one of: local-with-docker-fallback, local-only, docker-only)"
            )),
        }
    }
}
