use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::{
    components::VendorExtensions,
    deref::{visit_all, Dereferenceable, SlotVisitor},
    either::RefOr,
    error::DerefError,
    ordered_map::OrderedMap,
    reference::ComponentKey,
};

/// A JSON schema.
///
/// Keywords that can hold nested schemas are modelled so their references get resolved. Every
/// other keyword (`nullable`, `minimum`, `default`, ...) is kept as-is in [`Schema::keywords`],
/// in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawSchema")]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub properties: OrderedMap<String, RefOr<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<RefOr<Schema>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<RefOr<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<RefOr<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<RefOr<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<RefOr<Schema>>>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<JsonValue>,
    /// Keywords without nested schema slots. Their values are never dereferenced.
    #[serde(flatten, default, skip_serializing_if = "OrderedMap::is_empty")]
    pub keywords: OrderedMap<String, JsonValue>,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    pub vendor_extensions: VendorExtensions,
}

/// `additionalProperties`: a plain allow/deny flag or a schema for the extra properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<RefOr<Schema>>),
}

impl<'de> Deserialize<'de> for AdditionalProperties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match JsonValue::deserialize(deserializer)? {
            JsonValue::Bool(allowed) => Ok(AdditionalProperties::Allowed(allowed)),
            schema => RefOr::<Schema>::deserialize(schema)
                .map(|schema| AdditionalProperties::Schema(Box::new(schema)))
                .map_err(D::Error::custom),
        }
    }
}

impl Schema {
    pub fn typed(schema_type: impl Into<String>) -> Self {
        Schema {
            schema_type: Some(schema_type.into()),
            ..Default::default()
        }
    }

    pub fn object() -> Self {
        Self::typed("object")
    }

    pub fn array_of(items: impl Into<RefOr<Schema>>) -> Self {
        Schema {
            items: Some(Box::new(items.into())),
            ..Self::typed("array")
        }
    }

    pub fn with_property(
        mut self,
        name: impl Into<String>,
        schema: impl Into<RefOr<Schema>>,
    ) -> Self {
        self.properties.insert(name.into(), schema.into());
        self
    }
}

impl Dereferenceable for Schema {
    fn visit_slots<V: SlotVisitor>(&mut self, visitor: &mut V) -> Result<(), DerefError> {
        visit_all(self.properties.values_mut(), visitor)?;
        if let Some(AdditionalProperties::Schema(schema)) = self.additional_properties.as_mut() {
            visitor.visit(&mut **schema)?;
        }
        if let Some(items) = self.items.as_deref_mut() {
            visitor.visit(items)?;
        }
        visit_all(self.all_of.iter_mut(), visitor)?;
        visit_all(self.one_of.iter_mut(), visitor)?;
        visit_all(self.any_of.iter_mut(), visitor)?;
        if let Some(not) = self.not.as_deref_mut() {
            visitor.visit(not)?;
        }
        Ok(())
    }

    fn annotate_component_name(&mut self, extension: &str, name: &ComponentKey) {
        self.vendor_extensions.set_component_name(extension, name);
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchema {
    #[serde(rename = "type", default)]
    schema_type: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    properties: OrderedMap<String, RefOr<Schema>>,
    #[serde(default)]
    additional_properties: Option<AdditionalProperties>,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    items: Option<Box<RefOr<Schema>>>,
    #[serde(default)]
    all_of: Vec<RefOr<Schema>>,
    #[serde(default)]
    one_of: Vec<RefOr<Schema>>,
    #[serde(default)]
    any_of: Vec<RefOr<Schema>>,
    #[serde(default)]
    not: Option<Box<RefOr<Schema>>>,
    #[serde(rename = "enum", default)]
    enum_values: Vec<JsonValue>,
    #[serde(flatten)]
    rest: OrderedMap<String, JsonValue>,
}

impl TryFrom<RawSchema> for Schema {
    type Error = DerefError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        let mut keywords = OrderedMap::new();
        let mut vendor_extensions = VendorExtensions::new();
        for (key, value) in raw.rest {
            if key == "$ref" {
                return Err(DerefError::InvalidReference(
                    "'$ref' cannot sit next to schema keywords".to_string(),
                ));
            }
            if key.starts_with("x-") {
                vendor_extensions.insert(key, value)?;
            } else {
                keywords.insert(key, value);
            }
        }
        Ok(Schema {
            schema_type: raw.schema_type,
            format: raw.format,
            title: raw.title,
            description: raw.description,
            properties: raw.properties,
            additional_properties: raw.additional_properties,
            required: raw.required,
            items: raw.items,
            all_of: raw.all_of,
            one_of: raw.one_of,
            any_of: raw.any_of,
            not: raw.not,
            enum_values: raw.enum_values,
            keywords,
            vendor_extensions,
        })
    }
}
