//! Settings document read from `gack.yml`.
//!
//! The top level carries package metadata shared by every action. Any other
//! top-level key is kept verbatim as a plugin section and decoded on demand
//! through [`Config::section`], so plugins own the shape of their settings.

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::Path
};

use serde::{
    Deserialize, Serialize,
    de::{self, DeserializeOwned}
};

use crate::error::{self, Error};

/// Default location of the settings file relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gack.yml";

/// Package-level settings passed to the registry at construction.
///
/// # Examples
///
/// ```
/// use gack::Config;
///
/// let yaml = r#"
/// package_name: tool
/// version: 1.2.0
/// build:
///   platforms:
///     linux: [amd64]
/// "#;
/// let config = Config::parse(yaml).expect("valid configuration");
/// assert_eq!(config.package_name, "tool");
/// assert!(config.sections.contains_key("build"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    /// Name of the package being built.
    pub package_name:      String,
    /// Package version used in artifact names, kept as written.
    pub version:           String,
    /// Maintainer name recorded in packages.
    pub maintainer:        String,
    /// Maintainer e-mail recorded in packages.
    pub maintainer_email:  String,
    /// Project homepage.
    pub homepage:          String,
    /// One-line package summary.
    pub short_description: String,
    /// Long package description.
    pub description:       String,
    /// Plugin sections keyed by their top-level name.
    #[serde(flatten)]
    pub sections:          BTreeMap<String, serde_yaml::Value>
}

impl Config {
    /// Placeholder settings written by the `generate` target.
    pub fn scaffold() -> Self {
        Self {
            package_name:      "package".to_owned(),
            version:           "version".to_owned(),
            maintainer:        "Maintainer".to_owned(),
            maintainer_email:  "maintainer@email.com".to_owned(),
            homepage:          "http://package.com".to_owned(),
            short_description: "short description".to_owned(),
            description:       "description".to_owned(),
            sections:          BTreeMap::new()
        }
    }

    /// Reads and parses the settings file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::Config`] when it is not a valid settings document.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|source| error::io_error(path, source))?;
        Self::parse(&contents)
    }

    /// Parses a settings document.
    ///
    /// Documents without content (blank, comments only or a bare `---`)
    /// produce [`Config::default`]. Metadata scalars keep their source text,
    /// so `version: 1.10` stays `"1.10"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the YAML cannot be decoded or the top
    /// level is not a mapping.
    pub fn parse(contents: &str) -> Result<Self, Error> {
        if is_blank_document(contents) {
            return Ok(Self::default());
        }

        let value: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let mapping = match value {
            serde_yaml::Value::Null => return Ok(Self::default()),
            serde_yaml::Value::Mapping(mapping) => mapping,
            other => {
                return Err(Error::from(<serde_yaml::Error as de::Error>::custom(
                    format!("expected a mapping at the top level, got {other:?}")
                )));
            }
        };

        let metadata: Metadata = serde_yaml::from_str(contents)?;
        let sections = mapping
            .into_iter()
            .filter_map(|(key, value)| match key {
                serde_yaml::Value::String(key) if !METADATA_KEYS.contains(&key.as_str()) => {
                    Some((key, value))
                }
                _ => None
            })
            .collect();

        Ok(Self {
            package_name: metadata.package_name.unwrap_or_default(),
            version: metadata.version.unwrap_or_default(),
            maintainer: metadata.maintainer.unwrap_or_default(),
            maintainer_email: metadata.maintainer_email.unwrap_or_default(),
            homepage: metadata.homepage.unwrap_or_default(),
            short_description: metadata.short_description.unwrap_or_default(),
            description: metadata.description.unwrap_or_default(),
            sections
        })
    }

    /// Serializes the settings as YAML into `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when serialization or writing fails.
    pub fn write<W: Write>(&self, writer: W) -> Result<(), Error> {
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Decodes the plugin section stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigKeyNotFound`] when the section is absent and
    /// [`Error::Config`] when it does not have the expected shape.
    pub fn section<T>(&self, name: &str) -> Result<T, Error>
    where
        T: DeserializeOwned
    {
        let value = self.sections.get(name).ok_or_else(|| Error::ConfigKeyNotFound {
            key: name.to_owned()
        })?;
        Ok(serde_yaml::from_value(value.clone())?)
    }
}

const METADATA_KEYS: [&str; 7] = [
    "package_name",
    "version",
    "maintainer",
    "maintainer_email",
    "homepage",
    "short_description",
    "description"
];

/// Metadata decoded straight from the document text.
///
/// Decoding into `String` reads plain scalars verbatim, which a detour through
/// [`serde_yaml::Value`] would not (`1.10` becomes the float `1.1`).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Metadata {
    package_name:      Option<String>,
    version:           Option<String>,
    maintainer:        Option<String>,
    maintainer_email:  Option<String>,
    homepage:          Option<String>,
    short_description: Option<String>,
    description:       Option<String>
}

fn is_blank_document(contents: &str) -> bool {
    contents.lines().map(str::trim).all(|line| {
        line.is_empty() || line == "---" || line == "..." || line.starts_with('#')
    })
}
