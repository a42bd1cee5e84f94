use serde::{Deserialize, Serialize};

use crate::{
    components::VendorExtensions,
    deref::{Dereferenceable, SlotVisitor},
    error::DerefError,
    model::{response::visit_content, MediaType},
    ordered_map::OrderedMap,
    reference::ComponentKey,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: OrderedMap<String, MediaType>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    pub vendor_extensions: VendorExtensions,
}

impl Dereferenceable for RequestBody {
    fn visit_slots<V: SlotVisitor>(&mut self, visitor: &mut V) -> Result<(), DerefError> {
        visit_content(&mut self.content, visitor)
    }

    fn annotate_component_name(&mut self, extension: &str, name: &ComponentKey) {
        self.vendor_extensions.set_component_name(extension, name);
    }
}
