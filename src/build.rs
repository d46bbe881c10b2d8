// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Cross-compilation targets backed by a Docker-hosted toolchain.
///
/// Registers `build`, `build/:package_:platform_:architecture`,
/// `dependencies/build` and `clean/build`.
use std::{
    cell::Cell,
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::Config,
    error::{self, Error},
    process::CommandRunner,
    registry::Registry,
    target::{Action, Context, action_fn}
};

/// Top-level key of the build section in `gack.yml`.
pub const SECTION: &str = "build";
/// Image pulled by `dependencies/build`.
pub const TOOLCHAIN_IMAGE: &str = "karalabe/xgo-latest";
/// Cross-compiler invoked for every artifact.
pub const TOOLCHAIN: &str = "xgo";
/// Directory receiving build artifacts, relative to the workspace root.
pub const OUTPUT_DIR: &str = "build";

/// Platforms and architectures to build for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Architectures keyed by platform name.
    #[serde(default)]
    pub platforms: BTreeMap<String, Vec<String>>
}

impl Default for BuildConfig {
    fn default() -> Self {
        let platforms = [
            (
                "linux",
                &[
                    "386", "amd64", "arm-5", "arm-6", "arm-7", "arm64", "mips", "mips64",
                    "mips64le", "mipsle"
                ][..]
            ),
            ("windows-10", &["386", "amd64"][..]),
            ("darwin-10.6", &["386", "amd64"][..])
        ];

        Self {
            platforms: platforms
                .iter()
                .map(|(platform, archs)| {
                    (
                        (*platform).to_owned(),
                        archs.iter().map(|arch| (*arch).to_owned()).collect()
                    )
                })
                .collect()
        }
    }
}

impl BuildConfig {
    /// Reads the build section, falling back to the defaults when it is
    /// absent or malformed.
    pub fn from_config(config: &Config) -> Self {
        match config.section(SECTION) {
            Ok(build) => build,
            Err(Error::ConfigKeyNotFound {
                ..
            }) => Self::default(),
            Err(error) => {
                warn!("Ignoring {} section: {}", SECTION, error);
                Self::default()
            }
        }
    }

    /// Every configured platform and architecture pair.
    pub fn dependencies(&self) -> Vec<Platform> {
        self.platforms
            .iter()
            .flat_map(|(platform, archs)| {
                archs.iter().map(move |arch| Platform {
                    platform: platform.clone(),
                    arch:     arch.clone()
                })
            })
            .collect()
    }
}

/// Platform and architecture of a single artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Operating system, optionally with a version suffix.
    pub platform: String,
    /// Architecture name as understood by the toolchain.
    pub arch:     String
}

/// File name of the artifact built for `package` on `platform`/`arch`.
///
/// # Examples
///
/// ```
/// assert_eq!(gack::build::artifact_name("tool", "linux", "amd64"), "tool_linux_amd64");
/// ```
pub fn artifact_name(package: &str, platform: &str, arch: &str) -> String {
    format!("{package}_{platform}_{arch}")
}

/// Cross-compiling action shared by the build targets.
#[derive(Clone)]
pub struct Builder {
    runner:          Rc<dyn CommandRunner>,
    root:            PathBuf,
    toolchain_ready: Rc<Cell<bool>>
}

impl Builder {
    /// Creates a builder operating inside `root`.
    pub fn new(runner: Rc<dyn CommandRunner>, root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            root: root.into(),
            toolchain_ready: Rc::new(Cell::new(false))
        }
    }

    fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    /// Pulls the toolchain image once per process.
    fn install_toolchain(&self) -> Result<(), Error> {
        if self.toolchain_ready.get() {
            return Ok(());
        }
        info!("Installing build dependencies");
        self.runner
            .run("docker", &["pull".to_owned(), TOOLCHAIN_IMAGE.to_owned()])?;
        self.toolchain_ready.set(true);
        Ok(())
    }

    fn clean(&self) -> Result<(), Error> {
        let dir = self.output_dir();
        info!("Cleaning {}", dir.display());
        remove_dir_if_exists(&dir)
    }

    fn build(&self, package: &str, platform: &str, arch: &str) -> Result<PathBuf, Error> {
        let output_dir = self.output_dir();
        fs::create_dir_all(&output_dir).map_err(|source| error::io_error(&output_dir, source))?;

        let args = vec![
            format!("--targets={platform}/{arch}"),
            "-out".to_owned(),
            output_dir.join(format!("tmp_{package}")).to_string_lossy().into_owned(),
            format!("{}/", self.root.display()),
        ];

        let spinner = spinner(format!("Compiling {platform}/{arch}..."));
        let result = self.runner.run(TOOLCHAIN, &args);
        spinner.finish_and_clear();
        result?;

        let produced = toolchain_outputs(&output_dir, package, platform)?;
        let [produced_file] = produced.as_slice() else {
            return Err(Error::validation(format!(
                "expected {TOOLCHAIN} to produce exactly one file, but got {produced:?}"
            )));
        };

        let destination = output_dir.join(artifact_name(package, platform, arch));
        fs::rename(produced_file, &destination).map_err(|source| error::io_error(&destination, source))?;
        Ok(destination)
    }
}

impl Action for Builder {
    fn execute(&self, context: &Context<'_>) -> Result<(), Error> {
        info!("Building {}", context.subject());
        self.build(
            context.param("package"),
            context.param("platform"),
            context.param("architecture")
        )
        .map(|_| ())
    }

    fn default_config(&self) -> Option<(String, serde_yaml::Value)> {
        let value = serde_yaml::to_value(BuildConfig::default()).ok()?;
        Some((SECTION.to_owned(), value))
    }
}

/// Registers the build targets for every configured platform.
pub fn register(registry: &mut Registry, builder: Builder) {
    let package = registry.config().package_name.clone();
    for dependency in BuildConfig::from_config(registry.config()).dependencies() {
        let artifact = artifact_name(&package, &dependency.platform, &dependency.arch);
        registry.add_dependency("build", &format!("{OUTPUT_DIR}/{artifact}"), None, &[]);
    }

    registry.register(
        "build/:package_:platform_:architecture",
        Some(Box::new(builder.clone())),
        &["dependencies/build"]
    );

    let installer = builder.clone();
    registry.add_dependency(
        "dependencies",
        "dependencies/build",
        Some(action_fn(move |_| installer.install_toolchain())),
        &[]
    );

    registry.add_dependency(
        "clean",
        "clean/build",
        Some(action_fn(move |_| builder.clean())),
        &[]
    );
}

/// Removes `path` recursively; a missing directory is not an error.
pub(crate) fn remove_dir_if_exists(path: &Path) -> Result<(), Error> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(error::io_error(path, source))
    }
}

fn toolchain_outputs(dir: &Path, package: &str, platform: &str) -> Result<Vec<PathBuf>, Error> {
    let prefix = format!("tmp_{package}-{platform}");
    let entries = fs::read_dir(dir).map_err(|source| error::io_error(dir, source))?;
    let mut produced = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| error::io_error(dir, source))?;
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            produced.push(entry.path());
        }
    }
    produced.sort();
    Ok(produced)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
