use serde::{Deserialize, Serialize};

use crate::{
    components::VendorExtensions,
    deref::{visit_all, Dereferenceable, SlotVisitor},
    either::RefOr,
    error::DerefError,
    model::{Callbacks, Parameter, RequestBody, Response},
    ordered_map::OrderedMap,
    reference::ComponentKey,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOr<Parameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RefOr<RequestBody>>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub responses: OrderedMap<String, RefOr<Response>>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub callbacks: OrderedMap<String, RefOr<Callbacks>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    pub vendor_extensions: VendorExtensions,
}

impl Operation {
    pub fn with_response(
        mut self,
        status: impl Into<String>,
        response: impl Into<RefOr<Response>>,
    ) -> Self {
        self.responses.insert(status.into(), response.into());
        self
    }

    pub fn with_parameter(mut self, parameter: impl Into<RefOr<Parameter>>) -> Self {
        self.parameters.push(parameter.into());
        self
    }
}

impl Dereferenceable for Operation {
    fn visit_slots<V: SlotVisitor>(&mut self, visitor: &mut V) -> Result<(), DerefError> {
        visit_all(self.parameters.iter_mut(), visitor)?;
        if let Some(request_body) = self.request_body.as_mut() {
            visitor.visit(request_body)?;
        }
        visit_all(self.responses.values_mut(), visitor)?;
        visit_all(self.callbacks.values_mut(), visitor)
    }
}

/// Operations available on a single path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOr<Parameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    pub vendor_extensions: VendorExtensions,
}

impl PathItem {
    /// Operations in method order: get, put, post, delete, options, head, patch, trace.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        [
            &self.get,
            &self.put,
            &self.post,
            &self.delete,
            &self.options,
            &self.head,
            &self.patch,
            &self.trace,
        ]
        .into_iter()
        .filter_map(Option::as_ref)
    }

    pub fn operations_mut(&mut self) -> impl Iterator<Item = &mut Operation> {
        [
            &mut self.get,
            &mut self.put,
            &mut self.post,
            &mut self.delete,
            &mut self.options,
            &mut self.head,
            &mut self.patch,
            &mut self.trace,
        ]
        .into_iter()
        .filter_map(Option::as_mut)
    }
}

impl Dereferenceable for PathItem {
    fn visit_slots<V: SlotVisitor>(&mut self, visitor: &mut V) -> Result<(), DerefError> {
        visit_all(self.parameters.iter_mut(), visitor)?;
        for operation in self.operations_mut() {
            operation.visit_slots(visitor)?;
        }
        Ok(())
    }

    fn annotate_component_name(&mut self, extension: &str, name: &ComponentKey) {
        self.vendor_extensions.set_component_name(extension, name);
    }
}
