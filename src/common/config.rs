//! Config files with inline documentation.
//!
//! A config struct lists its keys once through [`documented_config!`]; the
//! trait then writes a TOML file where every key is preceded by a comment
//! describing it, and loads files that only set some of the keys.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata about a configuration key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFieldMeta {
    pub name: &'static str,
    pub description: &'static str,
}

pub trait DocumentedConfig: Sized + Default + Serialize + DeserializeOwned {
    fn field_metadata() -> Vec<ConfigFieldMeta>;

    /// TOML value of a documented key, `None` for unknown keys.
    fn field_value(&self, name: &str) -> Option<toml::Value>;

    fn config_path() -> Result<PathBuf>;

    fn to_documented_toml(&self) -> String {
        let mut output = String::new();
        for field in Self::field_metadata() {
            let Some(value) = self.field_value(field.name) else {
                continue;
            };
            output.push_str(&format!("# {}\n{} = {}\n\n", field.description, field.name, value));
        }
        output
    }

    fn save_with_documentation(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }
        fs::write(path, self.to_documented_toml())
            .with_context(|| format!("writing config to {}", path.display()))
    }

    /// Missing files yield the defaults; missing keys are filled from them.
    fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_path()?)
    }
}

/// Implement [`DocumentedConfig`] from a list of `"key" => field.path, "description";` entries.
#[macro_export]
macro_rules! documented_config {
    (
        $config_name:ident,
        $( $key:literal => $($field:ident).+ , $desc:literal ; )*
        => $path:expr
    ) => {
        impl $crate::common::config::DocumentedConfig for $config_name {
            fn field_metadata() -> Vec<$crate::common::config::ConfigFieldMeta> {
                vec![
                    $(
                        $crate::common::config::ConfigFieldMeta {
                            name: $key,
                            description: $desc,
                        },
                    )*
                ]
            }

            fn field_value(&self, name: &str) -> Option<toml::Value> {
                match name {
                    $( $key => toml::Value::try_from(&self $(.$field)+).ok(), )*
                    _ => None,
                }
            }

            fn config_path() -> anyhow::Result<std::path::PathBuf> {
                $path
            }
        }
    };
}
