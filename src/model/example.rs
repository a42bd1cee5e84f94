use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{components::VendorExtensions, deref::Dereferenceable, reference::ComponentKey};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
    /// Location of an example kept outside the document. Never fetched by this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_value: Option<String>,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    pub vendor_extensions: VendorExtensions,
}

impl Example {
    pub fn with_value(value: JsonValue) -> Self {
        Example {
            value: Some(value),
            ..Default::default()
        }
    }
}

impl Dereferenceable for Example {
    fn annotate_component_name(&mut self, extension: &str, name: &ComponentKey) {
        self.vendor_extensions.set_component_name(extension, name);
    }
}
