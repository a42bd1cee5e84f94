use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::Path,
};

use crate::{components::COMPONENT_NAME_EXTENSION, error::DerefError};

/// Options for local dereferencing.
///
/// Loadable from a TOML file:
///
/// ```toml
/// annotate-component-names = true
/// component-name-extension = "x-component-name"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DereferenceOptions {
    /// Tag every value inlined from the component store with the name it was stored under.
    pub annotate_component_names: bool,
    /// Vendor extension the component name is written to. Must start with `x-`.
    pub component_name_extension: String,
}

impl Default for DereferenceOptions {
    fn default() -> Self {
        DereferenceOptions {
            annotate_component_names: true,
            component_name_extension: COMPONENT_NAME_EXTENSION.to_string(),
        }
    }
}

impl DereferenceOptions {
    /// Options that inline values without tagging them.
    pub fn without_annotations() -> Self {
        DereferenceOptions {
            annotate_component_names: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), DerefError> {
        if !self.component_name_extension.starts_with("x-") {
            return Err(DerefError::Serialization(format!(
                "component-name-extension '{}' must start with 'x-'",
                self.component_name_extension
            )));
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DerefError> {
        let options: DereferenceOptions = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Read options from a TOML file. A missing file yields the defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DerefError> {
        let path = path.as_ref();
        tracing::debug!("Attempting to read dereference options from: {:?}", path);
        if !path.exists() {
            tracing::debug!("Options file not found, using defaults.");
            return Ok(DereferenceOptions::default());
        }
        let content = read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, DerefError> {
        Ok(toml::to_string(self)?)
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), DerefError> {
        tracing::debug!("Attempting to write dereference options to: {:?}", path.as_ref());
        write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
