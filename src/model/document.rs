use serde::{Deserialize, Serialize};

use crate::{
    components::{Components, VendorExtensions},
    config::DereferenceOptions,
    deref::{dereferenced, visit_all, Dereferenceable, Dereferenced, LocalResolver, SlotVisitor},
    either::RefOr,
    error::DerefError,
    model::PathItem,
    ordered_map::OrderedMap,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    pub vendor_extensions: VendorExtensions,
}

/// Root of an API description: the paths graph plus the component store it references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub openapi: String,
    pub info: Info,
    #[serde(default)]
    pub paths: OrderedMap<String, RefOr<PathItem>>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub components: Components,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    pub vendor_extensions: VendorExtensions,
}

fn is_blank(components: &Components) -> bool {
    components.is_empty() && components.vendor_extensions.is_empty()
}

impl Document {
    pub fn new(openapi: impl Into<String>, info: Info) -> Self {
        Document {
            openapi: openapi.into(),
            info,
            ..Default::default()
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, DerefError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, DerefError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_json_string(&self) -> Result<String, DerefError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, DerefError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// A copy of this document with every reference reachable from `paths` inlined.
    ///
    /// The copy's component store is empty. External references must have been loaded with
    /// [`Document::externally_dereference`] beforehand.
    pub fn locally_dereferenced(&self) -> Result<Dereferenced<Document>, DerefError> {
        self.locally_dereferenced_with(&DereferenceOptions::default())
    }

    #[tracing::instrument(skip_all, fields(paths = self.paths.len()))]
    pub fn locally_dereferenced_with(
        &self,
        options: &DereferenceOptions,
    ) -> Result<Dereferenced<Document>, DerefError> {
        options.validate()?;
        let mut resolver = LocalResolver::new(&self.components, options);
        let mut resolved = resolver.dereference(self)?;
        resolved.components = Components::default();
        tracing::debug!(
            "[Document::locally_dereferenced] inlined {} components",
            self.components.len()
        );
        Ok(dereferenced(resolved))
    }
}

impl Dereferenceable for Document {
    fn visit_slots<V: SlotVisitor>(&mut self, visitor: &mut V) -> Result<(), DerefError> {
        visit_all(self.paths.values_mut(), visitor)
    }
}
