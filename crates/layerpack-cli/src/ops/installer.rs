//! Installer image build context.
//!
//! The `Dockerfile` and `install.sh` are compiled into the binary and written
//! to a temporary directory when no build context is configured, so an
//! installed `layerpack` does not depend on its source checkout.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const DOCKERFILE: &str = include_str!("../../installer/Dockerfile");
pub const INSTALL_SCRIPT: &str = include_str!("../../installer/install.sh");

/// Build context handed to `docker build`.
#[derive(Debug)]
pub enum InstallerContext {
    /// A directory named by flag, environment or config.
    Directory(PathBuf),
    /// The bundled files, removed on drop.
    Embedded(TempDir),
}

impl InstallerContext {
    /// `dir` when given, otherwise the bundled context.
    pub fn resolve(dir: Option<&Path>) -> io::Result<Self> {
        match dir {
            Some(dir) => Ok(Self::Directory(dir.to_path_buf())),
            None => Self::embedded(),
        }
    }

    /// Write the bundled context into a fresh temporary directory.
    pub fn embedded() -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("layerpack-installer-")
            .tempdir()?;
        std::fs::write(dir.path().join("Dockerfile"), DOCKERFILE)?;

        let script = dir.path().join("install.sh");
        std::fs::write(&script, INSTALL_SCRIPT)?;
        make_executable(&script)?;

        tracing::debug!("Wrote installer context to {}", dir.path().display());
        Ok(Self::Embedded(dir))
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(dir) => dir,
            Self::Embedded(dir) => dir.path(),
        }
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_context_is_self_contained() {
        let context = InstallerContext::embedded().unwrap();
        let dir = context.path().to_path_buf();

        assert!(!dir.starts_with(env!("CARGO_MANIFEST_DIR")));
        assert_eq!(
            std::fs::read_to_string(dir.join("Dockerfile")).unwrap(),
            DOCKERFILE
        );
        assert_eq!(
            std::fs::read_to_string(dir.join("install.sh")).unwrap(),
            INSTALL_SCRIPT
        );
        assert!(DOCKERFILE.contains("COPY install.sh /usr/bin/install.sh"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(dir.join("install.sh"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o111, 0o111);
        }

        drop(context);
        assert!(!dir.exists());
    }

    #[test]
    fn test_configured_directory_is_used_as_is() {
        let context = InstallerContext::resolve(Some(Path::new("/srv/installer"))).unwrap();
        assert_eq!(context.path(), Path::new("/srv/installer"));
        assert!(matches!(context, InstallerContext::Directory(_)));
    }
}
