//! References between entities of an API document.
//!
//! A [`Reference<T>`] points at an entity of kind `T` either inside the local component store
//! (`#/components/<kind>/<key>`) or inside another document (`<uri>#<fragment>`). References are
//! immutable values compared and hashed only by what they point at.

use std::{
    borrow::Borrow,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
    marker::PhantomData,
    str::FromStr,
};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::{components::Component, error::DerefError};

/// Prefix shared by every local component reference.
pub const COMPONENTS_PREFIX: &str = "#/components/";

static COMPONENT_KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.\-_]+$").expect("component key pattern is a valid regex")
});

static COMPONENT_KEY_FORBIDDEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9.\-_]+").expect("forbidden character class is valid"));

/// The referenceable entity kinds held by a component store, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentKind {
    Schemas,
    Responses,
    Parameters,
    Examples,
    RequestBodies,
    Headers,
    SecuritySchemes,
    Links,
    Callbacks,
    PathItems,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 10] = [
        ComponentKind::Schemas,
        ComponentKind::Responses,
        ComponentKind::Parameters,
        ComponentKind::Examples,
        ComponentKind::RequestBodies,
        ComponentKind::Headers,
        ComponentKind::SecuritySchemes,
        ComponentKind::Links,
        ComponentKind::Callbacks,
        ComponentKind::PathItems,
    ];

    /// Collection name used in `#/components/<name>/...` and in the serialized store.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Schemas => "schemas",
            ComponentKind::Responses => "responses",
            ComponentKind::Parameters => "parameters",
            ComponentKind::Examples => "examples",
            ComponentKind::RequestBodies => "requestBodies",
            ComponentKind::Headers => "headers",
            ComponentKind::SecuritySchemes => "securitySchemes",
            ComponentKind::Links => "links",
            ComponentKind::Callbacks => "callbacks",
            ComponentKind::PathItems => "pathItems",
        }
    }
}

impl Display for ComponentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = DerefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DerefError::InvalidReference(format!("unknown component kind '{s}'")))
    }
}

/// Name of an entry in a component store.
///
/// Keys are non-empty and restricted to `[a-zA-Z0-9.\-_]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentKey(String);

impl ComponentKey {
    pub fn new(key: impl Into<String>) -> Result<Self, DerefError> {
        let key = key.into();
        if COMPONENT_KEY_PATTERN.is_match(&key) {
            Ok(ComponentKey(key))
        } else {
            Err(DerefError::InvalidComponentKey(format!(
                "'{key}' must be non-empty and contain only letters, digits, '.', '-' or '_'"
            )))
        }
    }

    /// Map an arbitrary string onto a valid key, replacing each run of forbidden characters with
    /// a single `_`.
    pub fn sanitized(raw: &str) -> Result<Self, DerefError> {
        let replaced = COMPONENT_KEY_FORBIDDEN.replace_all(raw, "_");
        let trimmed = replaced.trim_matches('_');
        ComponentKey::new(trimmed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ComponentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ComponentKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ComponentKey {
    type Error = DerefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ComponentKey::new(value)
    }
}

impl TryFrom<&str> for ComponentKey {
    type Error = DerefError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ComponentKey::new(value)
    }
}

impl From<ComponentKey> for String {
    fn from(key: ComponentKey) -> String {
        key.0
    }
}

/// A pointer into another document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalReference {
    /// Document location, possibly relative to the referring document.
    pub uri: String,
    /// Location inside that document (without the leading `#`).
    pub fragment: Option<String>,
}

impl ExternalReference {
    pub fn new(uri: impl Into<String>, fragment: Option<String>) -> Self {
        ExternalReference {
            uri: uri.into(),
            fragment,
        }
    }

    /// Resolve the document location against the URL of the referring document.
    pub fn resolve_against(&self, base: &Url) -> Result<Url, DerefError> {
        let mut url = base.join(&self.uri)?;
        url.set_fragment(self.fragment.as_deref());
        Ok(url)
    }
}

impl Display for ExternalReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.fragment {
            Some(fragment) => write!(f, "{}#{}", self.uri, fragment),
            None => f.write_str(&self.uri),
        }
    }
}

/// What a reference points at, independent of the entity type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RefTarget {
    Component(ComponentKey),
    External(ExternalReference),
}

/// Identity of a reference: target kind plus target. Used to track the chain of references
/// being expanded during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefIdentity {
    pub kind: ComponentKind,
    pub target: RefTarget,
}

impl Display for RefIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.target {
            RefTarget::Component(key) => write!(f, "{COMPONENTS_PREFIX}{}/{}", self.kind, key),
            RefTarget::External(external) => write!(f, "{external} ({})", self.kind),
        }
    }
}

/// Reference to an entity of type `T`.
pub struct Reference<T> {
    target: RefTarget,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Reference<T> {
    pub fn component(key: ComponentKey) -> Self {
        Reference {
            target: RefTarget::Component(key),
            _kind: PhantomData,
        }
    }

    pub fn external(reference: ExternalReference) -> Self {
        Reference {
            target: RefTarget::External(reference),
            _kind: PhantomData,
        }
    }

    pub fn target(&self) -> &RefTarget {
        &self.target
    }

    pub fn component_key(&self) -> Option<&ComponentKey> {
        match &self.target {
            RefTarget::Component(key) => Some(key),
            RefTarget::External(_) => None,
        }
    }

    pub fn external_reference(&self) -> Option<&ExternalReference> {
        match &self.target {
            RefTarget::External(external) => Some(external),
            RefTarget::Component(_) => None,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self.target, RefTarget::External(_))
    }
}

impl<T: Component> Reference<T> {
    pub fn identity(&self) -> RefIdentity {
        RefIdentity {
            kind: T::KIND,
            target: self.target.clone(),
        }
    }

    /// Shorthand for a local reference to a component key given as a string.
    pub fn named(key: &str) -> Result<Self, DerefError> {
        Ok(Reference::component(ComponentKey::new(key)?))
    }

    /// The `$ref` string for this reference.
    pub fn to_ref_string(&self) -> String {
        match &self.target {
            RefTarget::Component(key) => format!("{COMPONENTS_PREFIX}{}/{}", T::KIND, key),
            RefTarget::External(external) => external.to_string(),
        }
    }
}

impl<T> Clone for Reference<T> {
    fn clone(&self) -> Self {
        Reference {
            target: self.target.clone(),
            _kind: PhantomData,
        }
    }
}

impl<T> PartialEq for Reference<T> {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}

impl<T> Eq for Reference<T> {}

impl<T> Hash for Reference<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.target.hash(state)
    }
}

impl<T> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reference").field(&self.target).finish()
    }
}

impl<T: Component> Display for Reference<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ref_string())
    }
}

impl<T: Component> FromStr for Reference<T> {
    type Err = DerefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(pointer) = s.strip_prefix(COMPONENTS_PREFIX) {
            let Some((kind, key)) = pointer.split_once('/') else {
                return Err(DerefError::InvalidReference(format!(
                    "'{s}' does not name a component"
                )));
            };
            let kind: ComponentKind = kind.parse()?;
            if kind != T::KIND {
                return Err(DerefError::InvalidReference(format!(
                    "'{s}' points at {kind}, expected a reference to {}",
                    T::KIND
                )));
            }
            return Ok(Reference::component(ComponentKey::new(key)?));
        }
        if s.starts_with('#') {
            return Err(DerefError::InvalidReference(format!(
                "'{s}' is a local reference outside of #/components"
            )));
        }
        if s.is_empty() {
            return Err(DerefError::InvalidReference(
                "a reference cannot be empty".to_string(),
            ));
        }
        let (uri, fragment) = match s.split_once('#') {
            Some((uri, fragment)) => (uri, Some(fragment.to_string())),
            None => (s, None),
        };
        Ok(Reference::external(ExternalReference::new(uri, fragment)))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReference {
    #[serde(rename = "$ref")]
    reference: String,
}

impl<T: Component> Serialize for Reference<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawReference {
            reference: self.to_ref_string(),
        }
        .serialize(serializer)
    }
}

impl<'de, T: Component> Deserialize<'de> for Reference<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawReference::deserialize(deserializer)?;
        raw.reference.parse().map_err(D::Error::custom)
    }
}
