use std::{
    borrow::Borrow,
    fmt::{self, Display, Formatter},
};

use serde::{Deserialize, Serialize};

use crate::{
    deref::{visit_all, Dereferenceable, SlotVisitor},
    either::RefOr,
    error::DerefError,
    model::PathItem,
    ordered_map::OrderedMap,
};

/// Key of a callback group: a URL template whose `{...}` segments are runtime expressions
/// evaluated against the triggering request, e.g. `{$request.body#/callbackUrl}`.
///
/// A callback URL is never looked up anywhere. It dereferences to itself and contributes no
/// components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackUrl(String);

impl CallbackUrl {
    pub fn new(template: impl Into<String>) -> Self {
        CallbackUrl(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The runtime expressions embedded in the template, in order of appearance.
    pub fn expressions(&self) -> Vec<&str> {
        let mut expressions = Vec::new();
        let mut rest = self.0.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                break;
            };
            expressions.push(&after[..end]);
            rest = &after[end + 1..];
        }
        expressions
    }
}

impl Display for CallbackUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CallbackUrl {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Dereferenceable for CallbackUrl {}

/// A callback group: the requests the API may issue back to the caller, keyed by URL template.
pub type Callbacks = OrderedMap<CallbackUrl, RefOr<PathItem>>;

impl Dereferenceable for Callbacks {
    fn visit_slots<V: SlotVisitor>(&mut self, visitor: &mut V) -> Result<(), DerefError> {
        visit_all(self.values_mut(), visitor)
    }
}
