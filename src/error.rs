#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the target runner."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Errors returned by a dependency or by an action travel up the execution
//! tree unchanged; there is no wrapper variant for "a dependency failed".

use std::path::{Path, PathBuf};

/// Unified error type returned by the registry, the configuration loader,
/// the bundled actions and the CLI.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Raised when no registered pattern matches the requested subject.
    #[error("no targets match {subject}")]
    NoMatch {
        /// Subject that failed to resolve.
        subject: String
    },
    /// Wraps I/O errors together with the path that triggered them.
    #[error("I/O failure at {path:?}: {source}")]
    Io {
        /// Location of the file or directory being accessed.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding and encoding errors.
    #[error("invalid configuration: {source}")]
    Config {
        /// Source error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Wraps JSON serialization errors when writing listings.
    #[error("failed to serialize output: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Returned when a configuration section is requested but absent.
    #[error("configuration key not found: {key}")]
    ConfigKeyNotFound {
        /// Name of the missing top-level key.
        key: String
    },
    /// An external program could not be spawned or exited unsuccessfully.
    #[error("command `{program}` failed: {message}")]
    Command {
        /// Program that was invoked.
        program: String,
        /// Exit status and captured output, or the spawn error.
        message: String
    },
    /// Returned when inputs violate an invariant of an action.
    #[error("validation failed: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Free-form failure reported by a caller-supplied action.
    #[error("{message}")]
    Action {
        /// Message reported by the action.
        message: String
    }
}

impl Error {
    /// Constructs a [`Error::NoMatch`] for the given subject.
    pub fn no_match<S>(subject: S) -> Self
    where
        S: Into<String>
    {
        Self::NoMatch {
            subject: subject.into()
        }
    }

    /// Constructs a validation error from the provided message.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs an action error from the provided message.
    ///
    /// Intended for closures registered through
    /// [`action_fn`](crate::action_fn) that have no richer error to report.
    pub fn action<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Action {
            message: message.into()
        }
    }

    /// Constructs a command error for `program`.
    pub fn command<P, M>(program: P, message: M) -> Self
    where
        P: Into<String>,
        M: Into<String>
    {
        Self::Command {
            program: program.into(),
            message: message.into()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Config {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}
