use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{
    components::VendorExtensions,
    deref::{visit_all, Dereferenceable, SlotVisitor},
    either::RefOr,
    error::DerefError,
    model::{Example, Header, Link, Schema},
    ordered_map::OrderedMap,
    reference::ComponentKey,
};

/// Content of one media type in a request or response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub examples: OrderedMap<String, RefOr<Example>>,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    pub vendor_extensions: VendorExtensions,
}

impl MediaType {
    pub fn with_schema(schema: impl Into<RefOr<Schema>>) -> Self {
        MediaType {
            schema: Some(schema.into()),
            ..Default::default()
        }
    }
}

impl Dereferenceable for MediaType {
    fn visit_slots<V: SlotVisitor>(&mut self, visitor: &mut V) -> Result<(), DerefError> {
        if let Some(schema) = self.schema.as_mut() {
            visitor.visit(schema)?;
        }
        visit_all(self.examples.values_mut(), visitor)
    }
}

/// Visit the nested slots of every media type in a content map.
pub(crate) fn visit_content<V: SlotVisitor>(
    content: &mut OrderedMap<String, MediaType>,
    visitor: &mut V,
) -> Result<(), DerefError> {
    for media_type in content.values_mut() {
        media_type.visit_slots(visitor)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub description: String,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub headers: OrderedMap<String, RefOr<Header>>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub content: OrderedMap<String, MediaType>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub links: OrderedMap<String, RefOr<Link>>,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    pub vendor_extensions: VendorExtensions,
}

impl Response {
    pub fn new(description: impl Into<String>) -> Self {
        Response {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, media_type: impl Into<String>, content: MediaType) -> Self {
        self.content.insert(media_type.into(), content);
        self
    }
}

impl Dereferenceable for Response {
    fn visit_slots<V: SlotVisitor>(&mut self, visitor: &mut V) -> Result<(), DerefError> {
        visit_all(self.headers.values_mut(), visitor)?;
        visit_content(&mut self.content, visitor)?;
        visit_all(self.links.values_mut(), visitor)
    }

    fn annotate_component_name(&mut self, extension: &str, name: &ComponentKey) {
        self.vendor_extensions.set_component_name(extension, name);
    }
}
