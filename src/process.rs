// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// External program invocation used by the bundled actions.
///
/// Actions talk to a [`CommandRunner`] rather than to
/// [`std::process::Command`] directly so tests can script toolchain output.
use std::process::Command;

use tracing::debug;

use crate::error::Error;

/// Runs external programs on behalf of actions.
pub trait CommandRunner {
    /// Runs `program` with `args` and returns its combined stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Command`] when the program cannot be spawned or exits
    /// with a non-zero status.
    fn run(&self, program: &str, args: &[String]) -> Result<String, Error>;
}

/// [`CommandRunner`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String, Error> {
        debug!("Running {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| Error::command(program, e.to_string()))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(combined)
        } else {
            Err(Error::command(
                program,
                format!("{}: {}", output.status, combined.trim())
            ))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::CommandRunner;
    use crate::error::Error;

    /// Records invocations and answers them through a caller-supplied hook.
    pub(crate) struct ScriptedRunner {
        pub(crate) calls: RefCell<Vec<Vec<String>>>,
        respond:          Box<dyn Fn(&str, &[String]) -> Result<String, Error>>
    }

    impl ScriptedRunner {
        pub(crate) fn new<F>(respond: F) -> Self
        where
            F: Fn(&str, &[String]) -> Result<String, Error> + 'static
        {
            Self {
                calls:   RefCell::new(Vec::new()),
                respond: Box::new(respond)
            }
        }

        pub(crate) fn succeeding() -> Self {
            Self::new(|_, _| Ok(String::new()))
        }

        pub(crate) fn programs(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|call| call[0].clone()).collect()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, program: &str, args: &[String]) -> Result<String, Error> {
            let mut call = vec![program.to_owned()];
            call.extend(args.iter().cloned());
            self.calls.borrow_mut().push(call);
            (self.respond)(program, args)
        }
    }
}
