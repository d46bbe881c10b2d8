// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Target registry and the dependency-driven executor.
//!
//! Targets are keyed by their pattern string. Lookups try patterns in
//! descending lexicographic order, so `build/:package` is tried before
//! `build` and the first successful match wins.
//!
//! Execution is a depth-first, left-to-right, fail-fast walk over the
//! dependency templates reachable from the requested subject. There is no
//! memoization and no cycle detection: a dependency referenced twice runs
//! twice, and a cycle recurses until the stack is exhausted.

use std::collections::{HashMap, hash_map::Entry};

use tracing::{debug, info};

use crate::{
    config::Config,
    error::Error,
    pattern::Match,
    target::{Action, Context, Target}
};

/// Outcome of a successful [`Registry::lookup`].
#[derive(Debug)]
pub struct Resolved<'a> {
    /// Target whose pattern matched.
    pub target:       &'a Target,
    /// Dependency templates of the target, not yet interpolated.
    pub dependencies: &'a [String],
    /// Match produced by the target's pattern.
    pub matched:      Match
}

/// Collection of targets plus the settings shared by their actions.
pub struct Registry {
    config:       Config,
    targets:      HashMap<String, Target>,
    target_names: Vec<String>
}

impl Registry {
    /// Creates an empty registry around `config`.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            targets: HashMap::new(),
            target_names: Vec::new()
        }
    }

    /// Settings handed to every action through its [`Context`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registered pattern strings in lookup priority order.
    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    /// Returns the target registered under exactly `pattern`.
    pub fn target(&self, pattern: &str) -> Option<&Target> {
        self.targets.get(pattern)
    }

    /// Registers `pattern` or merges into an existing registration.
    ///
    /// A new pattern is compiled and inserted into the priority order. An
    /// existing one has its action replaced, `None` included, and the new
    /// dependency templates appended after the previous ones.
    pub fn register(
        &mut self,
        pattern: &str,
        action: Option<Box<dyn Action>>,
        dependencies: &[&str]
    ) -> &Target {
        match self.targets.entry(pattern.to_owned()) {
            Entry::Occupied(entry) => {
                debug!("Merging registration for {}", pattern);
                let target = entry.into_mut();
                target.merge(action, dependencies);
                target
            }
            Entry::Vacant(entry) => {
                debug!("Registering target {}", pattern);
                self.target_names.push(pattern.to_owned());
                self.target_names.sort_unstable_by(|left, right| right.cmp(left));
                let dependencies = dependencies.iter().map(|dependency| (*dependency).to_owned());
                entry.insert(Target::new(pattern, action, dependencies.collect()))
            }
        }
    }

    /// Appends `dependency` to the templates of `pattern`.
    ///
    /// A bare target without an action is created for `pattern` when it is
    /// unknown. When `action` is given, `dependency` itself is registered
    /// with that action and `dependencies` first. This is how aggregate
    /// targets such as `clean` collect their parts.
    pub fn add_dependency(
        &mut self,
        pattern: &str,
        dependency: &str,
        action: Option<Box<dyn Action>>,
        dependencies: &[&str]
    ) {
        if !self.targets.contains_key(pattern) {
            self.register(pattern, None, &[]);
        }

        if action.is_some() {
            self.register(dependency, action, dependencies);
        }

        if let Some(target) = self.targets.get_mut(pattern) {
            target.push_dependency(dependency);
        }
    }

    /// Finds the first target, in priority order, whose pattern matches.
    pub fn lookup(&self, subject: &str) -> Option<Resolved<'_>> {
        self.target_names.iter().find_map(|name| {
            let target = self.targets.get(name)?;
            let matched = target.pattern().matches(subject);
            matched.is_match().then(|| Resolved {
                target,
                dependencies: target.dependencies(),
                matched
            })
        })
    }

    /// Executes the target matching `subject` after its dependencies.
    ///
    /// Dependency templates are interpolated against the match and executed
    /// recursively in declaration order. The first failure stops the walk
    /// and is returned unchanged; later dependencies and the target's own
    /// action do not run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMatch`] when no pattern matches `subject`, or the
    /// first error reported by a dependency or the action.
    pub fn execute(&self, subject: &str) -> Result<(), Error> {
        let Resolved {
            target,
            dependencies,
            matched
        } = self.lookup(subject).ok_or_else(|| Error::no_match(subject))?;
        debug!("{} resolved to pattern {}", subject, target.pattern().as_str());

        for template in dependencies {
            let dependency = matched.interpolate(template);
            debug!("{} depends on {}", subject, dependency);
            self.execute(&dependency)?;
        }

        if let Some(action) = target.action() {
            info!("Running {}", subject);
            action.execute(&Context::new(&matched, self))?;
        }
        Ok(())
    }

    /// Builds the settings written by the `generate` target.
    ///
    /// Starts from [`Config::scaffold`] and adds the default section of
    /// every registered action that provides one.
    pub fn default_config(&self) -> Config {
        let mut config = Config::scaffold();
        for name in &self.target_names {
            let section = self
                .targets
                .get(name)
                .and_then(Target::action)
                .and_then(|action| action.default_config());
            if let Some((key, value)) = section {
                config.sections.insert(key, value);
            }
        }
        config
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("target_names", &self.target_names)
            .finish()
    }
}
