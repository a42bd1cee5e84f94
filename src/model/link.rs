use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{
    components::VendorExtensions, deref::Dereferenceable, ordered_map::OrderedMap,
    reference::ComponentKey,
};

/// Design-time link between a response and another operation. Runtime expressions are carried as
/// opaque values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub parameters: OrderedMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    pub vendor_extensions: VendorExtensions,
}

impl Dereferenceable for Link {
    fn annotate_component_name(&mut self, extension: &str, name: &ComponentKey) {
        self.vendor_extensions.set_component_name(extension, name);
    }
}
