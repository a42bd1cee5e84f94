use std::{fmt, io};

use serde::{Deserialize, Serialize};
use serde_json::{Error as JsonError, Value as JsonValue};
use serde_yaml::Error as YamlError;
use thiserror::Error;
use url::ParseError as UrlParseError;

use crate::reference::{ComponentKey, ComponentKind, ExternalReference, RefIdentity};

/// Structured report of two component stores defining the same kind/key pair.
///
/// The conflicting entities are captured as JSON snapshots so the report can be rendered or
/// logged by the caller without knowing the concrete entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCollision {
    pub kind: ComponentKind,
    pub key: ComponentKey,
    pub existing: JsonValue,
    pub incoming: JsonValue,
}

impl fmt::Display for ComponentCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} component '{}' is defined by both stores (existing: {}, incoming: {})",
            self.kind, self.key, self.existing, self.incoming
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum DerefError {
    #[error("Component collision: {0}")]
    ComponentCollision(Box<ComponentCollision>),
    #[error("Vendor extension collision on '{key}' (existing: {existing}, incoming: {incoming})")]
    ExtensionCollision {
        key: String,
        existing: JsonValue,
        incoming: JsonValue,
    },
    #[error("Missing reference: no {kind} component named '{key}'")]
    MissingReference { kind: ComponentKind, key: String },
    #[error("Reference cycle: {}", render_chain(chain))]
    ReferenceCycle { chain: Vec<RefIdentity> },
    #[error("External {kind} reference '{reference}' has not been loaded into the component store")]
    UnloadedExternalReference {
        kind: ComponentKind,
        reference: ExternalReference,
    },
    #[error("Loader failed for '{reference}': {source}")]
    LoaderFailure {
        reference: ExternalReference,
        source: Box<DerefError>,
    },
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    #[error("Invalid component key: {0}")]
    InvalidComponentKey(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("Custom error: {0}")]
    Custom(String),
}

fn render_chain(chain: &[RefIdentity]) -> String {
    chain
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<String>>()
        .join(" -> ")
}

impl DerefError {
    /// The collision report, if this error is a component collision.
    pub fn as_collision(&self) -> Option<&ComponentCollision> {
        match self {
            DerefError::ComponentCollision(collision) => Some(collision),
            _ => None,
        }
    }

    /// The chain of references being expanded when a cycle was found.
    pub fn cycle_chain(&self) -> Option<&[RefIdentity]> {
        match self {
            DerefError::ReferenceCycle { chain } => Some(chain),
            _ => None,
        }
    }

    /// True for errors that came out of an external loader call.
    pub fn is_loader_failure(&self) -> bool {
        matches!(self, DerefError::LoaderFailure { .. })
    }
}

impl From<ComponentCollision> for DerefError {
    fn from(src: ComponentCollision) -> DerefError {
        DerefError::ComponentCollision(Box::new(src))
    }
}

impl From<toml::de::Error> for DerefError {
    fn from(src: toml::de::Error) -> DerefError {
        DerefError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for DerefError {
    fn from(src: toml::ser::Error) -> DerefError {
        DerefError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for DerefError {
    fn from(src: JsonError) -> DerefError {
        DerefError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<YamlError> for DerefError {
    fn from(src: YamlError) -> DerefError {
        DerefError::Serialization(format!("YAML (de)serialization error: {src}"))
    }
}

impl From<UrlParseError> for DerefError {
    fn from(src: UrlParseError) -> DerefError {
        DerefError::InvalidReference(format!("Invalid URL: {src}"))
    }
}

impl From<io::Error> for DerefError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => DerefError::NotFound(format!("{x}")),
            _ => DerefError::Io(format!("IOError: {}", x.kind())),
        }
    }
}
