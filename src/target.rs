// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Registry entries and the action capability they carry.

use crate::{
    config::Config,
    error::Error,
    pattern::{Match, Pattern},
    registry::Registry
};

/// Work performed when a target is executed.
///
/// Closures with the signature `Fn(&Context<'_>) -> Result<(), Error>`
/// implement the trait, see [`action_fn`].
pub trait Action {
    /// Runs the action for the matched subject.
    ///
    /// # Errors
    ///
    /// Any error is returned to the caller of
    /// [`Registry::execute`](crate::Registry::execute) unchanged.
    fn execute(&self, context: &Context<'_>) -> Result<(), Error>;

    /// Default settings section contributed to a generated `gack.yml`.
    ///
    /// Returns the top-level key and its value.
    fn default_config(&self) -> Option<(String, serde_yaml::Value)> {
        None
    }
}

impl<F> Action for F
where
    F: Fn(&Context<'_>) -> Result<(), Error>
{
    fn execute(&self, context: &Context<'_>) -> Result<(), Error> {
        self(context)
    }
}

/// Boxes a closure as an [`Action`].
///
/// # Examples
///
/// ```
/// use gack::{Config, Registry, action_fn};
///
/// let mut registry = Registry::new(Config::default());
/// registry.register(
///     "greet/:name",
///     Some(action_fn(|context| {
///         assert_eq!(context.param("name"), "world");
///         Ok(())
///     })),
///     &[]
/// );
/// registry.execute("greet/world").expect("action succeeds");
/// ```
pub fn action_fn<F>(action: F) -> Box<dyn Action>
where
    F: Fn(&Context<'_>) -> Result<(), Error> + 'static
{
    Box::new(action)
}

/// View handed to an [`Action`] while it runs.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    matched:  &'a Match,
    registry: &'a Registry
}

impl<'a> Context<'a> {
    pub(crate) fn new(matched: &'a Match, registry: &'a Registry) -> Self {
        Self {
            matched,
            registry
        }
    }

    /// Match that selected the running target.
    pub fn matched(&self) -> &'a Match {
        self.matched
    }

    /// Subject the target was executed for.
    pub fn subject(&self) -> &'a str {
        self.matched.subject()
    }

    /// Captured value for `name`, or an empty string when nothing was
    /// captured under that name.
    pub fn param(&self, name: &str) -> &'a str {
        self.matched.param(name).unwrap_or_default()
    }

    /// Registry executing the target.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Settings the registry was created with.
    pub fn config(&self) -> &'a Config {
        self.registry.config()
    }
}

/// Pattern together with its action and dependency templates.
pub struct Target {
    pattern:      Pattern,
    action:       Option<Box<dyn Action>>,
    dependencies: Vec<String>
}

impl Target {
    pub(crate) fn new(
        pattern: &str,
        action: Option<Box<dyn Action>>,
        dependencies: Vec<String>
    ) -> Self {
        Self {
            pattern: Pattern::new(pattern),
            action,
            dependencies
        }
    }

    /// Compiled pattern addressing the target.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Action run after the dependencies succeed, if any.
    pub fn action(&self) -> Option<&dyn Action> {
        self.action.as_deref()
    }

    /// Dependency templates in declaration order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub(crate) fn merge(&mut self, action: Option<Box<dyn Action>>, dependencies: &[&str]) {
        self.action = action;
        self.dependencies
            .extend(dependencies.iter().map(|dependency| (*dependency).to_owned()));
    }

    pub(crate) fn push_dependency(&mut self, dependency: &str) {
        self.dependencies.push(dependency.to_owned());
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("pattern", &self.pattern.as_str())
            .field("action", &self.action.is_some())
            .field("dependencies", &self.dependencies)
            .finish()
    }
}
