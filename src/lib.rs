//! Make-like runner for pattern-addressed targets.
//!
//! Targets are registered under patterns such as
//! `build/:package_:platform_:architecture`. Executing a subject finds the
//! first matching pattern, runs the target's dependency templates with the
//! captured values substituted, and finally runs the target's own action.
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//!
//! use gack::{Config, Registry, action_fn};
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let mut registry = Registry::new(Config::default());
//!
//! let seen = Rc::clone(&log);
//! registry.register(
//!     "build/:name",
//!     Some(action_fn(move |context| {
//!         seen.borrow_mut().push(context.param("name").to_owned());
//!         Ok(())
//!     })),
//!     &[]
//! );
//! registry.register("release/:name", None, &["build/:name"]);
//!
//! registry.execute("release/tool").expect("release succeeds");
//! assert_eq!(*log.borrow(), ["tool"]);
//! ```

pub mod build;
mod config;
mod error;
pub mod generator;
mod lexer;
pub mod logging;
mod pattern;
pub mod pkg;
pub mod process;
mod registry;
mod target;

pub use config::{Config, DEFAULT_CONFIG_FILE};
pub use error::{Error, io_error};
pub use lexer::{DELIMITER, Token, tokenize};
pub use pattern::{FULL_SUBJECT, MISSING, Match, Pattern};
pub use registry::{Registry, Resolved};
pub use target::{Action, Context, Target, action_fn};
