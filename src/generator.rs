// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Scaffolding of a default `gack.yml`.
use std::{fs::File, path::PathBuf};

use tracing::info;

use crate::{error, registry::Registry, target::action_fn};

/// Registers the `generate` target writing the default settings to `path`.
///
/// The written document holds placeholder package metadata plus the default
/// section of every registered action, so plugins should be registered
/// before the target runs.
pub fn register(registry: &mut Registry, path: impl Into<PathBuf>) {
    let path = path.into();
    registry.register(
        "generate",
        Some(action_fn(move |context| {
            info!("Writing default configuration to {}", path.display());
            let config = context.registry().default_config();
            let file = File::create(&path).map_err(|source| error::io_error(&path, source))?;
            config.write(file)
        })),
        &[]
    );
}
