//! Operation parameters and their serialization context.
//!
//! The `style` and `explode` fields are filled with their location-dependent defaults when a
//! document omits them, and are omitted again on output when they still equal those defaults, so
//! a decoded document re-encodes to what was written.
//!
//! Style names are decoded case-insensitively. A non-canonical spelling such as `"Form"` is
//! accepted and recorded as a warning on the parameter instead of failing the whole document.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{
    components::VendorExtensions,
    deref::{visit_all, Dereferenceable, SlotVisitor},
    either::{Either, RefOr},
    error::DerefError,
    model::{response::visit_content, Example, MediaType, Schema},
    ordered_map::OrderedMap,
    reference::ComponentKey,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterStyle {
    Form,
    Simple,
    Matrix,
    Label,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl ParameterStyle {
    pub const ALL: [ParameterStyle; 7] = [
        ParameterStyle::Form,
        ParameterStyle::Simple,
        ParameterStyle::Matrix,
        ParameterStyle::Label,
        ParameterStyle::SpaceDelimited,
        ParameterStyle::PipeDelimited,
        ParameterStyle::DeepObject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterStyle::Form => "form",
            ParameterStyle::Simple => "simple",
            ParameterStyle::Matrix => "matrix",
            ParameterStyle::Label => "label",
            ParameterStyle::SpaceDelimited => "spaceDelimited",
            ParameterStyle::PipeDelimited => "pipeDelimited",
            ParameterStyle::DeepObject => "deepObject",
        }
    }

    /// Style used when a parameter at `location` does not name one.
    pub fn default_for(location: ParameterLocation) -> Self {
        match location {
            ParameterLocation::Query | ParameterLocation::Cookie => ParameterStyle::Form,
            ParameterLocation::Path | ParameterLocation::Header => ParameterStyle::Simple,
        }
    }

    /// Only `form` explodes by default.
    pub fn default_explode(&self) -> bool {
        matches!(self, ParameterStyle::Form)
    }

    /// Parse a style name ignoring case. The flag is true when `raw` is not the canonical
    /// spelling.
    pub fn parse_lenient(raw: &str) -> Result<(Self, bool), DerefError> {
        ParameterStyle::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(raw))
            .map(|style| (style, style.as_str() != raw))
            .ok_or_else(|| DerefError::Serialization(format!("unknown parameter style '{raw}'")))
    }
}

impl Display for ParameterStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawParameter", into = "RawParameter")]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub description: Option<String>,
    pub required: bool,
    pub deprecated: bool,
    pub style: ParameterStyle,
    pub explode: bool,
    pub allow_reserved: bool,
    pub schema: Option<RefOr<Schema>>,
    pub example: Option<JsonValue>,
    pub examples: OrderedMap<String, RefOr<Example>>,
    pub content: OrderedMap<String, MediaType>,
    pub vendor_extensions: VendorExtensions,
    warnings: Vec<String>,
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.location == other.location
            && self.description == other.description
            && self.required == other.required
            && self.deprecated == other.deprecated
            && self.style == other.style
            && self.explode == other.explode
            && self.allow_reserved == other.allow_reserved
            && self.schema == other.schema
            && self.example == other.example
            && self.examples == other.examples
            && self.content == other.content
            && self.vendor_extensions == other.vendor_extensions
    }
}

impl Parameter {
    /// A parameter with the default style for `location`. Path parameters are required.
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        let style = ParameterStyle::default_for(location);
        Parameter {
            name: name.into(),
            location,
            description: None,
            required: location == ParameterLocation::Path,
            deprecated: false,
            style,
            explode: style.default_explode(),
            allow_reserved: false,
            schema: None,
            example: None,
            examples: OrderedMap::new(),
            content: OrderedMap::new(),
            vendor_extensions: VendorExtensions::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<RefOr<Schema>>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Change the style; `explode` follows the new style's default.
    pub fn with_style(mut self, style: ParameterStyle) -> Self {
        self.style = style;
        self.explode = style.default_explode();
        self
    }

    /// The explicit example, or else the first inline example value.
    pub fn example(&self) -> Option<&JsonValue> {
        self.example.as_ref().or_else(|| {
            self.examples
                .values()
                .filter_map(Either::as_value)
                .find_map(|example| example.value.as_ref())
        })
    }

    /// Problems tolerated while decoding this parameter.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl Dereferenceable for Parameter {
    fn visit_slots<V: SlotVisitor>(&mut self, visitor: &mut V) -> Result<(), DerefError> {
        if let Some(schema) = self.schema.as_mut() {
            visitor.visit(schema)?;
        }
        visit_all(self.examples.values_mut(), visitor)?;
        visit_content(&mut self.content, visitor)
    }

    fn annotate_component_name(&mut self, extension: &str, name: &ComponentKey) {
        self.vendor_extensions.set_component_name(extension, name);
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParameter {
    name: String,
    #[serde(rename = "in")]
    location: ParameterLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explode: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    allow_reserved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<RefOr<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    example: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    examples: OrderedMap<String, RefOr<Example>>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    content: OrderedMap<String, MediaType>,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    vendor_extensions: VendorExtensions,
}

impl TryFrom<RawParameter> for Parameter {
    type Error = DerefError;

    fn try_from(raw: RawParameter) -> Result<Self, Self::Error> {
        let mut warnings = Vec::new();
        let style = match raw.style.as_deref() {
            Some(written) => {
                let (style, non_canonical) = ParameterStyle::parse_lenient(written)?;
                if non_canonical {
                    let warning = format!(
                        "parameter '{}': style '{written}' decoded as '{style}'",
                        raw.name
                    );
                    tracing::warn!("[Parameter::try_from] {warning}");
                    warnings.push(warning);
                }
                style
            }
            None => ParameterStyle::default_for(raw.location),
        };
        let required = match (raw.location, raw.required) {
            (ParameterLocation::Path, Some(true)) => true,
            (ParameterLocation::Path, _) => {
                return Err(DerefError::Serialization(format!(
                    "path parameter '{}' must be declared required",
                    raw.name
                )));
            }
            (_, required) => required.unwrap_or(false),
        };
        Ok(Parameter {
            name: raw.name,
            location: raw.location,
            description: raw.description,
            required,
            deprecated: raw.deprecated,
            style,
            explode: raw.explode.unwrap_or_else(|| style.default_explode()),
            allow_reserved: raw.allow_reserved,
            schema: raw.schema,
            example: raw.example,
            examples: raw.examples,
            content: raw.content,
            vendor_extensions: raw.vendor_extensions,
            warnings,
        })
    }
}

impl From<Parameter> for RawParameter {
    fn from(parameter: Parameter) -> Self {
        let default_style = ParameterStyle::default_for(parameter.location);
        RawParameter {
            name: parameter.name,
            location: parameter.location,
            description: parameter.description,
            required: parameter.required.then_some(true),
            deprecated: parameter.deprecated,
            style: (parameter.style != default_style).then(|| parameter.style.as_str().to_string()),
            explode: (parameter.explode != parameter.style.default_explode())
                .then_some(parameter.explode),
            allow_reserved: parameter.allow_reserved,
            schema: parameter.schema,
            example: parameter.example,
            examples: parameter.examples,
            content: parameter.content,
            vendor_extensions: parameter.vendor_extensions,
        }
    }
}
