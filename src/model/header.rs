use serde::{Deserialize, Serialize};

use crate::{
    components::VendorExtensions,
    deref::{Dereferenceable, SlotVisitor},
    either::RefOr,
    error::DerefError,
    model::{response::visit_content, MediaType, Schema},
    ordered_map::OrderedMap,
    reference::ComponentKey,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub content: OrderedMap<String, MediaType>,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    pub vendor_extensions: VendorExtensions,
}

impl Dereferenceable for Header {
    fn visit_slots<V: SlotVisitor>(&mut self, visitor: &mut V) -> Result<(), DerefError> {
        if let Some(schema) = self.schema.as_mut() {
            visitor.visit(schema)?;
        }
        visit_content(&mut self.content, visitor)
    }

    fn annotate_component_name(&mut self, extension: &str, name: &ComponentKey) {
        self.vendor_extensions.set_component_name(extension, name);
    }
}
