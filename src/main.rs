//! Command-line interface for the `gack` binary.
//!
//! Loads `gack.yml`, registers the bundled build, packaging and generator
//! targets, then executes the requested target or lists the available ones.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process,
    rc::Rc
};

use clap::{ArgAction, Parser};
use gack::{
    Config, DEFAULT_CONFIG_FILE, Error, Registry,
    build::{self, Builder},
    generator, io_error, logging,
    pkg::{self, DebPackager},
    process::{CommandRunner, SystemRunner}
};
use tracing::warn;

/// Command line interface for executing targets.
#[derive(Debug, Parser)]
#[command(name = "gack", version, about = "Run pattern-addressed build targets")]
struct Cli {
    /// Settings file read before the targets are registered.
    #[arg(
        long = "config",
        value_name = "PATH",
        env = "GACK_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    config: PathBuf,

    /// Print the registered target patterns to stdout, one per line in
    /// priority order without the usage header, and exit with status 0.
    #[arg(long = "list", action = ArgAction::SetTrue)]
    list: bool,

    /// Print the listing as a JSON array.
    #[arg(long = "json", action = ArgAction::SetTrue, requires = "list")]
    json: bool,

    /// Target to execute, e.g. `build` or `pkg/deb/tool_1.0_amd64.deb`.
    #[arg(value_name = "TARGET")]
    target: Option<String>
}

/// Entry point that reports errors and sets the appropriate exit status.
fn main() {
    logging::init();
    let cli = Cli::parse();
    let registry = load_registry(&cli.config);

    let status = match run(&cli, &registry) {
        Ok(status) => status,
        Err(error) => {
            eprintln!("{}", error.to_display_string());
            1
        }
    };
    process::exit(status);
}

/// Builds the registry with every bundled plugin.
///
/// A settings file that cannot be loaded is reported and replaced by the
/// defaults so `generate` and `clean` stay usable in a fresh checkout.
fn load_registry(config_path: &Path) -> Registry {
    let config = Config::load(config_path).unwrap_or_else(|error| {
        warn!("{}", error.to_display_string());
        Config::default()
    });

    let runner: Rc<dyn CommandRunner> = Rc::new(SystemRunner);
    let mut registry = Registry::new(config);
    build::register(&mut registry, Builder::new(Rc::clone(&runner), "."));
    generator::register(&mut registry, config_path);
    pkg::register(&mut registry, DebPackager::new(runner, "."));
    registry
}

/// Executes the CLI request and returns the process exit status.
///
/// # Errors
///
/// Propagates the error of the executed target or of writing the listing.
fn run(cli: &Cli, registry: &Registry) -> Result<i32, Error> {
    if cli.list {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        if cli.json {
            write_target_names_json(&mut handle, registry)?;
        } else {
            write_target_names(&mut handle, registry).map_err(stream_error)?;
        }
        return Ok(0);
    }

    match cli.target.as_deref() {
        Some(target) => {
            registry.execute(target)?;
            Ok(0)
        }
        None => {
            let stderr = io::stderr();
            let mut handle = stderr.lock();
            write_usage(&mut handle, registry).map_err(stream_error)?;
            Ok(1)
        }
    }
}

fn write_usage<W: Write>(writer: &mut W, registry: &Registry) -> io::Result<()> {
    writeln!(writer, "Usage: gack [--config <PATH>] [TARGET]")?;
    writeln!(writer, "Available targets are:")?;
    write_target_names(writer, registry)
}

fn write_target_names<W: Write>(writer: &mut W, registry: &Registry) -> io::Result<()> {
    for name in registry.target_names() {
        writeln!(writer, "\t{name}")?;
    }
    Ok(())
}

fn write_target_names_json<W: Write>(writer: &mut W, registry: &Registry) -> Result<(), Error> {
    serde_json::to_writer(&mut *writer, registry.target_names())?;
    writeln!(writer).map_err(stream_error)
}

fn stream_error(source: io::Error) -> Error {
    io_error(Path::new("<stdout>"), source)
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, path::Path};

    use clap::Parser;
    use tempfile::tempdir;

    use super::{
        Cli, load_registry, run, write_target_names, write_target_names_json, write_usage
    };

    #[test]
    fn cli_defaults_to_gack_yml() {
        let cli = Cli::try_parse_from(["gack", "build"]).expect("failed to parse CLI");
        assert_eq!(cli.target.as_deref(), Some("build"));
        assert!(!cli.list);
        if std::env::var_os("GACK_CONFIG").is_none() {
            assert_eq!(cli.config, Path::new("gack.yml"));
        }
    }

    #[test]
    fn json_listing_requires_list_flag() {
        assert!(Cli::try_parse_from(["gack", "--json"]).is_err());
        let cli = Cli::try_parse_from(["gack", "--list", "--json"]).expect("failed to parse CLI");
        assert!(cli.list && cli.json);
    }

    #[test]
    fn registry_loads_configured_platforms() {
        let temp = tempdir().expect("failed to create tempdir");
        let config = temp.path().join("gack.yml");
        std::fs::write(
            &config,
            "package_name: tool\nversion: 1.0.0\nbuild:\n  platforms:\n    linux: [amd64]\n"
        )
        .expect("failed to write config");

        let registry = load_registry(&config);
        let build = registry.target("build").expect("build aggregate");
        assert_eq!(build.dependencies(), ["build/tool_linux_amd64"]);
        let deb = registry.target("pkg/deb").expect("pkg/deb aggregate");
        assert_eq!(deb.dependencies(), ["pkg/deb/tool_1.0.0_amd64.deb"]);
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let temp = tempdir().expect("failed to create tempdir");
        let registry = load_registry(&temp.path().join("absent.yml"));
        assert_eq!(registry.config().package_name, "");
        assert!(registry.target_names().iter().any(|name| name == "generate"));
    }

    #[test]
    fn usage_lists_targets_in_priority_order() {
        let temp = tempdir().expect("failed to create tempdir");
        let registry = load_registry(&temp.path().join("absent.yml"));

        let mut buffer = Cursor::new(Vec::new());
        write_usage(&mut buffer, &registry).expect("write usage");
        let output = String::from_utf8(buffer.into_inner()).expect("invalid UTF-8");

        let listed: Vec<&str> =
            output.lines().skip(2).map(|line| line.trim_start_matches('\t')).collect();
        assert_eq!(listed, registry.target_names());
        assert!(output.starts_with("Usage: gack"));
    }

    #[test]
    fn listing_prints_bare_names_and_succeeds() {
        let temp = tempdir().expect("failed to create tempdir");
        let registry = load_registry(&temp.path().join("absent.yml"));

        let mut buffer = Cursor::new(Vec::new());
        write_target_names(&mut buffer, &registry).expect("write listing");
        let output = String::from_utf8(buffer.into_inner()).expect("invalid UTF-8");
        assert!(!output.contains("Usage"));
        assert_eq!(output.lines().count(), registry.target_names().len());

        let cli = Cli::try_parse_from(["gack", "--list"]).expect("failed to parse CLI");
        assert_eq!(run(&cli, &registry).expect("listing printed"), 0);
    }

    #[test]
    fn json_listing_is_an_array_of_names() {
        let temp = tempdir().expect("failed to create tempdir");
        let registry = load_registry(&temp.path().join("absent.yml"));

        let mut buffer = Cursor::new(Vec::new());
        write_target_names_json(&mut buffer, &registry).expect("write json");
        let names: Vec<String> =
            serde_json::from_slice(&buffer.into_inner()).expect("valid JSON listing");
        assert_eq!(names, registry.target_names());
    }

    #[test]
    fn unknown_target_is_reported() {
        let temp = tempdir().expect("failed to create tempdir");
        let registry = load_registry(&temp.path().join("absent.yml"));
        let cli = Cli::try_parse_from(["gack", "does/not/exist"]).expect("failed to parse CLI");

        let error = run(&cli, &registry).expect_err("no such target");
        assert_eq!(error.to_string(), "no targets match does/not/exist");
    }

    #[test]
    fn missing_target_exits_with_failure_status() {
        let temp = tempdir().expect("failed to create tempdir");
        let registry = load_registry(&temp.path().join("absent.yml"));
        let cli = Cli::try_parse_from(["gack"]).expect("failed to parse CLI");

        assert_eq!(run(&cli, &registry).expect("usage printed"), 1);
    }
}
