//! End-to-end tests driving the `layerpack` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A project directory with a `node_modules` tree.
struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        Self { temp_dir }
    }

    fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    fn install(&self, name: &str) -> PathBuf {
        let dir = self.root().join("node_modules").join(name);
        std::fs::create_dir_all(&dir).expect("failed to create package dir");
        std::fs::write(
            dir.join("package.json"),
            format!(r#"{{"name":"{name}","version":"1.2.3","dependencies":{{"left-pad":"1"}}}}"#),
        )
        .expect("failed to write package.json");
        dir
    }

    /// A stand-in package manager that installs one module, or fails.
    #[cfg(unix)]
    fn fake_package_manager(&self, succeed: bool) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = self.root().join(if succeed { "yarn-ok" } else { "yarn-fail" });
        let body = if succeed {
            "#!/bin/sh\nmkdir -p nodejs/node_modules/left-pad\n"
        } else {
            "#!/bin/sh\necho 'network down' >&2\nexit 1\n"
        };
        std::fs::write(&script, body).expect("failed to write script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("failed to chmod script");
        script
    }

    /// A stand-in container runtime. `build` checks the context and records
    /// its path in `build-context`; `run` installs one module into the
    /// mounted output directory.
    #[cfg(unix)]
    fn fake_docker(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = self.root().join("docker-fake");
        let body = format!(
            r#"#!/bin/sh
case "$1" in
  build)
    test -f "$3/Dockerfile" && test -x "$3/install.sh" || {{ echo "bad context: $3" >&2; exit 1; }}
    echo "$3" > "{record}"
    echo sha256:fake
    ;;
  run)
    for arg in "$@"; do
      case "$arg" in
        *:/asset-output:delegated) out="${{arg%:/asset-output:delegated}}" ;;
      esac
    done
    mkdir -p "$out/nodejs/node_modules/from-docker"
    ;;
esac
"#,
            record = self.root().join("build-context").display()
        );
        std::fs::write(&script, body).expect("failed to write script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("failed to chmod script");
        script
    }

    fn write_config(&self, package_manager: &Path) -> PathBuf {
        let path = self.root().join("layerpack.toml");
        std::fs::write(
            &path,
            format!(
                "[bundling]\npackage_manager = \"{}\"\n",
                package_manager.display()
            ),
        )
        .expect("failed to write config");
        path
    }

    fn layerpack(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_layerpack"));
        cmd.current_dir(self.root());
        for var in [
            "NODE_PATH",
            "RUST_LOG",
            "LAYERPACK_CONFIG",
            "LAYERPACK_BUNDLE_MODE",
            "LAYERPACK_STAGE_DIR",
            "LAYERPACK_INSTALLER_DIR",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.layerpack()
            .args(args)
            .output()
            .expect("failed to run layerpack")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Usage:"));
    assert!(text.contains("bundle"));
    assert!(text.contains("locate"));
}

#[test]
fn test_bundle_help_lists_modes_flag() {
    let ctx = TestContext::new();
    let output = ctx.run(&["bundle", "--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("--mode"));
    assert!(text.contains("--no-staging"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    assert!(ctx.run(&["--version"]).status.success());
}

#[test]
fn test_modes_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["modes"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for mode in ["local-with-docker-fallback", "local-only", "docker-only"] {
        assert!(text.contains(mode), "missing {mode} in {text}");
    }
    assert!(text.contains("(default)"));
}

#[test]
fn test_locate_scoped_package() {
    let ctx = TestContext::new();
    let dir = ctx.install("@acme/deps");
    std::fs::create_dir_all(ctx.root().join("src")).unwrap();

    let output = ctx.run(&["locate", "@acme/deps", "--from", "src"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        PathBuf::from(stdout(&output)),
        dir.canonicalize().unwrap()
    );
}

#[test]
fn test_locate_subdirectory() {
    let ctx = TestContext::new();
    let dir = ctx.install("deps");

    let output = ctx.run(&["locate", "deps", "--subdirectory", "lib"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        PathBuf::from(stdout(&output)),
        dir.canonicalize().unwrap().join("lib")
    );

    let escape = ctx.run(&["locate", "deps", "--subdirectory", "../other"]);
    assert!(!escape.status.success());
}

#[test]
fn test_locate_missing_package_fails() {
    let ctx = TestContext::new();
    let output = ctx.run(&["locate", "left-pad"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Package not found"));
}

#[test]
fn test_invalid_mode_is_rejected() {
    let ctx = TestContext::new();
    ctx.install("deps");
    let output = ctx.run(&["bundle", "deps", "--mode", "remote"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown bundle mode"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let ctx = TestContext::new();
    ctx.install("deps");
    std::fs::write(ctx.root().join("layerpack.toml"), "[bundling]\ncolour = \"red\"\n").unwrap();
    let output = ctx.run(&["bundle", "deps", "--mode", "local-only"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid config"));
}

#[cfg(unix)]
#[test]
fn test_bundle_local_only_stages_and_registers() {
    let ctx = TestContext::new();
    ctx.install("deps");
    let yarn = ctx.fake_package_manager(true);
    ctx.write_config(&yarn);

    let output = ctx.run(&[
        "bundle",
        "deps",
        "--mode",
        "local-only",
        "--stage-dir",
        "layer.out",
    ]);
    assert!(output.status.success(), "{output:?}");

    let layer = PathBuf::from(stdout(&output));
    assert!(layer.is_absolute());
    let stage_dir = ctx.root().canonicalize().unwrap().join("layer.out");
    assert!(layer.starts_with(&stage_dir), "{layer:?}");
    assert!(layer.join("package.json").is_file());
    assert!(layer.join("nodejs/node_modules/left-pad").is_dir());

    let registry = std::fs::read_to_string(ctx.root().join("layer.out/layers.json")).unwrap();
    assert!(registry.contains("\"deps\""));
    assert!(registry.contains("1.2.3"));
}

#[cfg(unix)]
#[test]
fn test_bundle_local_only_failure_reports_diagnostic() {
    let ctx = TestContext::new();
    ctx.install("deps");
    let yarn = ctx.fake_package_manager(false);
    let config = ctx.write_config(&yarn);

    let output = ctx
        .layerpack()
        .args(["--config"])
        .arg(&config)
        .args(["bundle", "deps"])
        .env("LAYERPACK_BUNDLE_MODE", "local-only")
        .output()
        .expect("failed to run layerpack");
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("docker bundling disabled; local bundling must have failed"));

    let staged: Vec<_> = std::fs::read_dir(ctx.root().join("layer.out"))
        .map(|entries| entries.filter_map(Result::ok).collect())
        .unwrap_or_default();
    assert!(staged.is_empty(), "{staged:?}");
}

#[cfg(unix)]
#[test]
fn test_bundle_docker_only_builds_from_embedded_context() {
    let ctx = TestContext::new();
    ctx.install("deps");
    let docker = ctx.fake_docker();
    std::fs::write(
        ctx.root().join("layerpack.toml"),
        format!("[bundling]\ndocker = \"{}\"\n", docker.display()),
    )
    .unwrap();

    let output = ctx.run(&["bundle", "deps", "--mode", "docker-only"]);
    assert!(output.status.success(), "{output:?}");

    let layer = PathBuf::from(stdout(&output));
    assert!(layer.join("nodejs/node_modules/from-docker").is_dir());
    assert!(String::from_utf8_lossy(&output.stderr).contains("via container"));

    let context = std::fs::read_to_string(ctx.root().join("build-context")).unwrap();
    let context = PathBuf::from(context.trim());
    assert!(!context.starts_with(env!("CARGO_MANIFEST_DIR")), "{context:?}");
    assert!(!context.exists(), "installer context left behind at {context:?}");

    let registry = std::fs::read_to_string(ctx.root().join("layer.out/layers.json")).unwrap();
    assert!(registry.contains(r#""staged_by": "container""#), "{registry}");
}
