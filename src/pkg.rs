// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Debian packaging of the linux build artifacts.
///
/// Registers `pkg/deb`, `pkg/deb/:package_:version_:architecture.deb`,
/// `clean/pkg/deb` and `clean/pkg`.
use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
    rc::Rc
};

use tracing::info;

use crate::{
    build::{self, BuildConfig},
    config::Config,
    error::{self, Error},
    process::CommandRunner,
    registry::Registry,
    target::{Action, Context, action_fn}
};

/// Root of every packaging artifact, relative to the workspace root.
pub const PKG_DIR: &str = "pkg";
/// Directory receiving `.deb` files, relative to the workspace root.
pub const DEB_DIR: &str = "pkg/deb";
/// Tool assembling the package from a staged tree.
pub const PACKAGER: &str = "dpkg-deb";

const STAGING_DIR: &str = ".staging";

/// Maps toolchain architecture names to Debian architecture names.
///
/// Unknown names are passed through unchanged.
///
/// # Examples
///
/// ```
/// assert_eq!(gack::pkg::debian_architecture("386"), "i386");
/// assert_eq!(gack::pkg::debian_architecture("arm-7"), "armhf");
/// assert_eq!(gack::pkg::debian_architecture("amd64"), "amd64");
/// ```
pub fn debian_architecture(arch: &str) -> &str {
    match arch {
        "386" => "i386",
        "arm-5" | "arm-6" => "armel",
        "arm-7" => "armhf",
        "mipsle" => "mipsel",
        "mips64le" => "mips64el",
        other => other
    }
}

/// File name of the package built for `package`, `version` and `arch`.
pub fn deb_name(package: &str, version: &str, arch: &str) -> String {
    format!("{package}_{version}_{arch}.deb")
}

/// Renders the `DEBIAN/control` file for a package.
pub fn control_file(config: &Config, package: &str, version: &str, arch: &str) -> String {
    let mut control = String::new();
    let _ = writeln!(control, "Package: {package}");
    let _ = writeln!(control, "Version: {version}");
    let _ = writeln!(control, "Architecture: {}", debian_architecture(arch));
    let _ = writeln!(
        control,
        "Maintainer: {} <{}>",
        config.maintainer, config.maintainer_email
    );
    if !config.homepage.is_empty() {
        let _ = writeln!(control, "Homepage: {}", config.homepage);
    }
    let _ = writeln!(control, "Description: {}", config.short_description);
    for line in config.description.lines() {
        if line.trim().is_empty() {
            control.push_str(" .\n");
        } else {
            let _ = writeln!(control, " {line}");
        }
    }
    control
}

/// Packaging action shared by the `pkg` targets.
#[derive(Clone)]
pub struct DebPackager {
    runner: Rc<dyn CommandRunner>,
    root:   PathBuf
}

impl DebPackager {
    /// Creates a packager operating inside `root`.
    pub fn new(runner: Rc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into()
        }
    }

    fn package(
        &self,
        config: &Config,
        package: &str,
        version: &str,
        arch: &str
    ) -> Result<PathBuf, Error> {
        let deb_dir = self.root.join(DEB_DIR);
        let staging_root = deb_dir.join(STAGING_DIR);
        let staging = staging_root.join(format!("{package}_{version}_{arch}"));
        let output = deb_dir.join(deb_name(package, version, arch));

        let built = self.stage_and_build(config, &staging, &output, package, version, arch);
        let cleaned = build::remove_dir_if_exists(&staging_root);
        built.and(cleaned)?;
        Ok(output)
    }

    fn stage_and_build(
        &self,
        config: &Config,
        staging: &Path,
        output: &Path,
        package: &str,
        version: &str,
        arch: &str
    ) -> Result<(), Error> {
        let binary = self
            .root
            .join(build::OUTPUT_DIR)
            .join(build::artifact_name(package, "linux", arch));

        build::remove_dir_if_exists(staging)?;
        let bin_dir = staging.join("usr").join("bin");
        let control_dir = staging.join("DEBIAN");
        for dir in [&bin_dir, &control_dir] {
            fs::create_dir_all(dir).map_err(|source| error::io_error(dir, source))?;
        }

        let installed = bin_dir.join(package);
        fs::copy(&binary, &installed).map_err(|source| error::io_error(&binary, source))?;
        make_executable(&installed)?;

        let control_path = control_dir.join("control");
        fs::write(&control_path, control_file(config, package, version, arch))
            .map_err(|source| error::io_error(&control_path, source))?;

        let args = vec![
            "--build".to_owned(),
            "--root-owner-group".to_owned(),
            staging.to_string_lossy().into_owned(),
            output.to_string_lossy().into_owned(),
        ];
        self.runner.run(PACKAGER, &args)?;
        Ok(())
    }

    fn clean_deb(&self) -> Result<(), Error> {
        let dir = self.root.join(DEB_DIR);
        info!("Cleaning {}", dir.display());
        build::remove_dir_if_exists(&dir)
    }

    fn clean_all(&self) -> Result<(), Error> {
        let dir = self.root.join(PKG_DIR);
        info!("Cleaning {}", dir.display());
        build::remove_dir_if_exists(&dir)
    }
}

impl Action for DebPackager {
    fn execute(&self, context: &Context<'_>) -> Result<(), Error> {
        info!("Packaging {}", context.subject());
        self.package(
            context.config(),
            context.param("package"),
            context.param("version"),
            context.param("architecture")
        )
        .map(|_| ())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|source| error::io_error(path, source))
}

#[cfg(not(unix))]
fn make_executable(_: &Path) -> Result<(), Error> {
    Ok(())
}

/// Registers the Debian targets for every configured linux architecture.
pub fn register(registry: &mut Registry, packager: DebPackager) {
    let package = registry.config().package_name.clone();
    let version = registry.config().version.clone();
    let linux_archs: Vec<String> = BuildConfig::from_config(registry.config())
        .dependencies()
        .into_iter()
        .filter(|dependency| dependency.platform == "linux")
        .map(|dependency| dependency.arch)
        .collect();

    for arch in &linux_archs {
        let deb = format!("{DEB_DIR}/{}", deb_name(&package, &version, arch));
        registry.add_dependency("pkg/deb", &deb, None, &[]);
    }

    registry.register(
        "pkg/deb/:package_:version_:architecture.deb",
        Some(Box::new(packager.clone())),
        &["build/:package_linux_:architecture"]
    );

    let deb = packager.clone();
    registry.add_dependency(
        "clean/pkg",
        "clean/pkg/deb",
        Some(action_fn(move |_| deb.clean_deb())),
        &[]
    );
    registry.add_dependency(
        "clean",
        "clean/pkg",
        Some(action_fn(move |_| packager.clean_all())),
        &[]
    );
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path, rc::Rc};

    use tempfile::tempdir;

    use super::{DebPackager, PACKAGER, control_file, register};
    use crate::{Config, Error, Registry, action_fn, process::testing::ScriptedRunner};

    fn config() -> Config {
        Config::parse(
            r#"
package_name: tool
version: "1.0"
maintainer: Jane Doe
maintainer_email: jane@example.com
homepage: https://example.com
short_description: A tool
description: |
  First paragraph.

  Second paragraph.
build:
  platforms:
    linux: [amd64, arm-7]
    windows-10: [amd64]
"#
        )
        .expect("valid configuration")
    }

    #[test]
    fn control_file_lists_metadata() {
        let control = control_file(&config(), "tool", "1.0", "arm-7");
        assert_eq!(
            control,
            "Package: tool\nVersion: 1.0\nArchitecture: armhf\nMaintainer: Jane Doe \
             <jane@example.com>\nHomepage: https://example.com\nDescription: A tool\n First \
             paragraph.\n .\n Second paragraph.\n"
        );
    }

    #[test]
    fn control_file_omits_empty_homepage() {
        let control = control_file(&Config::default(), "tool", "1.0", "amd64");
        assert!(!control.contains("Homepage"));
    }

    #[test]
    fn register_aggregates_linux_packages_only() {
        let mut registry = Registry::new(config());
        register(&mut registry, DebPackager::new(Rc::new(ScriptedRunner::succeeding()), "."));

        let aggregate = registry.target("pkg/deb").expect("pkg/deb aggregate");
        assert_eq!(
            aggregate.dependencies(),
            ["pkg/deb/tool_1.0_amd64.deb", "pkg/deb/tool_1.0_arm-7.deb"]
        );
        let clean_pkg = registry.target("clean/pkg").expect("clean/pkg");
        assert!(clean_pkg.action().is_some());
        assert_eq!(clean_pkg.dependencies(), ["clean/pkg/deb"]);
    }

    #[test]
    fn package_builds_deb_from_linux_artifact() {
        let temp = tempdir().expect("failed to create tempdir");
        let root = temp.path().to_path_buf();
        fs::create_dir_all(root.join("build")).expect("create build dir");

        let runner = Rc::new(ScriptedRunner::new(|program, args| {
            assert_eq!(program, PACKAGER);
            let staging = Path::new(&args[2]);
            let control = fs::read_to_string(staging.join("DEBIAN/control")).expect("control");
            assert!(control.contains("Architecture: amd64"));
            assert!(staging.join("usr/bin/tool").exists());
            fs::write(&args[3], "deb").expect("write package");
            Ok(String::new())
        }));

        let mut registry = Registry::new(config());
        register(&mut registry, DebPackager::new(runner.clone(), &root));
        let build_root = root.clone();
        registry.register(
            "build/:package_:platform_:architecture",
            Some(action_fn(move |context| {
                let artifact = build_root.join("build").join(context.param("*").replace("build/", ""));
                fs::write(artifact, "binary").map_err(|e| Error::action(e.to_string()))
            })),
            &[]
        );

        registry.execute("pkg/deb/tool_1.0_amd64.deb").expect("packaging succeeds");

        assert!(root.join("pkg/deb/tool_1.0_amd64.deb").exists());
        assert!(!root.join("pkg/deb/.staging").exists());
        assert_eq!(runner.programs(), [PACKAGER]);
    }

    #[test]
    fn package_reports_missing_binary() {
        let temp = tempdir().expect("failed to create tempdir");
        let mut registry = Registry::new(config());
        register(&mut registry, DebPackager::new(Rc::new(ScriptedRunner::succeeding()), temp.path()));
        registry.register("build/:package_:platform_:architecture", None, &[]);

        let error = registry.execute("pkg/deb/tool_1.0_amd64.deb").expect_err("binary missing");
        match error {
            Error::Io {
                path, ..
            } => assert!(path.ends_with("build/tool_linux_amd64"), "{path:?}"),
            other => panic!("unexpected error variant: {other:?}")
        }
        assert!(!temp.path().join("pkg/deb/.staging").exists());
    }

    #[test]
    fn packager_failure_is_reported_and_staging_removed() {
        let temp = tempdir().expect("failed to create tempdir");
        let root = temp.path().to_path_buf();
        fs::create_dir_all(root.join("build")).expect("create build dir");
        fs::write(root.join("build/tool_linux_amd64"), "binary").expect("write binary");

        let runner = Rc::new(ScriptedRunner::new(|program, _| {
            Err(Error::command(program, "exit status: 2"))
        }));
        let mut registry = Registry::new(config());
        register(&mut registry, DebPackager::new(runner, &root));
        registry.register("build/:package_:platform_:architecture", None, &[]);

        let error = registry.execute("pkg/deb/tool_1.0_amd64.deb").expect_err("dpkg-deb fails");
        assert!(matches!(error, Error::Command { ref program, .. } if program == PACKAGER));
        assert!(!root.join("pkg/deb/.staging").exists());
        assert!(!root.join("pkg/deb/tool_1.0_amd64.deb").exists());
    }

    #[test]
    fn clean_removes_package_tree() {
        let temp = tempdir().expect("failed to create tempdir");
        let deb_dir = temp.path().join("pkg/deb");
        fs::create_dir_all(&deb_dir).expect("create deb dir");
        fs::write(deb_dir.join("tool_1.0_amd64.deb"), "deb").expect("write package");

        let mut registry = Registry::new(config());
        register(&mut registry, DebPackager::new(Rc::new(ScriptedRunner::succeeding()), temp.path()));

        registry.execute("clean/pkg").expect("clean succeeds");
        assert!(!temp.path().join("pkg").exists());
    }
}
