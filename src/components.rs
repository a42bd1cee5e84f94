//! The component store: reusable, named entities a document can reference.
//!
//! [`Components`] keeps one [`OrderedMap`] per [`ComponentKind`]. Every entry is a [`RefOr<T>`],
//! so a component may be an inline value, an alias of another component, or (until external
//! resolution has run) a pointer into another document.
//!
//! ## Merging
//!
//! [`Components::merge`] treats *every* shared kind/key pair as a conflict, even when both stores
//! hold identical values. Two documents reusing a component name is an authoring conflict the
//! caller has to see. Kinds are checked in [`ComponentKind::ALL`] order, then vendor extensions,
//! and nothing is inserted unless the whole merge succeeds.

use std::{collections::HashMap, fmt};

use serde::{
    de::{DeserializeOwned, Error as DeError, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value as JsonValue;

use crate::{
    deref::{Dereferenceable, SlotVisitor},
    either::RefOr,
    error::{ComponentCollision, DerefError},
    model::{
        Callbacks, Example, Header, Link, Parameter, PathItem, RequestBody, Response, Schema,
        SecurityScheme,
    },
    ordered_map::OrderedMap,
    reference::{ComponentKey, ComponentKind, ExternalReference, RefTarget, Reference},
};

/// Vendor extension used to remember which component an inlined value was dereferenced from.
pub const COMPONENT_NAME_EXTENSION: &str = "x-component-name";

/// Components of one kind, keyed by component name.
pub type ComponentMap<T> = OrderedMap<ComponentKey, RefOr<T>>;

/// A referenceable entity kind that lives in its own collection of the component store.
pub trait Component:
    Dereferenceable
    + Clone
    + fmt::Debug
    + PartialEq
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const KIND: ComponentKind;

    fn component_map(components: &Components) -> &ComponentMap<Self>;

    fn component_map_mut(components: &mut Components) -> &mut ComponentMap<Self>;
}

macro_rules! component_kind {
    ($ty:ty, $kind:ident, $field:ident) => {
        impl Component for $ty {
            const KIND: ComponentKind = ComponentKind::$kind;

            fn component_map(components: &Components) -> &ComponentMap<Self> {
                &components.$field
            }

            fn component_map_mut(components: &mut Components) -> &mut ComponentMap<Self> {
                &mut components.$field
            }
        }
    };
}

component_kind!(Schema, Schemas, schemas);
component_kind!(Response, Responses, responses);
component_kind!(Parameter, Parameters, parameters);
component_kind!(Example, Examples, examples);
component_kind!(RequestBody, RequestBodies, request_bodies);
component_kind!(Header, Headers, headers);
component_kind!(SecurityScheme, SecuritySchemes, security_schemes);
component_kind!(Link, Links, links);
component_kind!(Callbacks, Callbacks, callbacks);
component_kind!(PathItem, PathItems, path_items);

/// `x-*` keys attached to an object.
///
/// Deserialization rejects any key that does not start with `x-`, which is what makes an unknown
/// field (such as a stray `$ref`) a decode error on objects that accept extensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VendorExtensions(OrderedMap<String, JsonValue>);

impl VendorExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }

    /// Insert an extension; keys without the `x-` prefix are refused.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: JsonValue,
    ) -> Result<Option<JsonValue>, DerefError> {
        let key = key.into();
        if !key.starts_with("x-") {
            return Err(DerefError::Serialization(format!(
                "vendor extension '{key}' must start with 'x-'"
            )));
        }
        Ok(self.0.insert(key, value))
    }

    /// Record the component an inlined value came from.
    pub(crate) fn set_component_name(&mut self, extension: &str, name: &ComponentKey) {
        self.0.insert(
            extension.to_string(),
            JsonValue::String(name.as_str().to_string()),
        );
    }

    /// The recorded component name, if this value was inlined from the component store.
    pub fn component_name(&self, extension: &str) -> Option<&str> {
        self.0.get(extension).and_then(JsonValue::as_str)
    }

    fn merge(&mut self, other: VendorExtensions) -> Result<(), DerefError> {
        self.0.merge(other.0, |key, existing, incoming| {
            Err(DerefError::ExtensionCollision {
                key: key.clone(),
                existing: existing.clone(),
                incoming,
            })
        })
    }
}

impl Serialize for VendorExtensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

struct VendorExtensionsVisitor;

impl<'de> Visitor<'de> for VendorExtensionsVisitor {
    type Value = VendorExtensions;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of x- prefixed vendor extensions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut extensions = VendorExtensions::new();
        while let Some((key, value)) = access.next_entry::<String, JsonValue>()? {
            extensions.insert(key, value).map_err(A::Error::custom)?;
        }
        Ok(extensions)
    }
}

impl<'de> Deserialize<'de> for VendorExtensions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(VendorExtensionsVisitor)
    }
}

/// One ordered map per referenceable entity kind, plus the store's own vendor extensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub schemas: ComponentMap<Schema>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub responses: ComponentMap<Response>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub parameters: ComponentMap<Parameter>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub examples: ComponentMap<Example>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub request_bodies: ComponentMap<RequestBody>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub headers: ComponentMap<Header>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub security_schemes: ComponentMap<SecurityScheme>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub links: ComponentMap<Link>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub callbacks: ComponentMap<Callbacks>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub path_items: ComponentMap<PathItem>,
    #[serde(flatten, default, skip_serializing_if = "VendorExtensions::is_empty")]
    pub vendor_extensions: VendorExtensions,
    /// External reference each loaded component was fetched for. Not serialized.
    #[serde(skip)]
    origins: HashMap<(ComponentKind, ComponentKey), ExternalReference>,
}

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff every kind's map is empty. Vendor extensions do not count as components.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of components across all kinds.
    pub fn len(&self) -> usize {
        self.schemas.len()
            + self.responses.len()
            + self.parameters.len()
            + self.examples.len()
            + self.request_bodies.len()
            + self.headers.len()
            + self.security_schemes.len()
            + self.links.len()
            + self.callbacks.len()
            + self.path_items.len()
    }

    /// Number of components of one kind.
    pub fn len_of(&self, kind: ComponentKind) -> usize {
        match kind {
            ComponentKind::Schemas => self.schemas.len(),
            ComponentKind::Responses => self.responses.len(),
            ComponentKind::Parameters => self.parameters.len(),
            ComponentKind::Examples => self.examples.len(),
            ComponentKind::RequestBodies => self.request_bodies.len(),
            ComponentKind::Headers => self.headers.len(),
            ComponentKind::SecuritySchemes => self.security_schemes.len(),
            ComponentKind::Links => self.links.len(),
            ComponentKind::Callbacks => self.callbacks.len(),
            ComponentKind::PathItems => self.path_items.len(),
        }
    }

    pub fn get<T: Component>(&self, key: &str) -> Option<&RefOr<T>> {
        T::component_map(self).get(key)
    }

    pub fn contains<T: Component>(&self, key: &str) -> bool {
        T::component_map(self).contains_key(key)
    }

    /// Insert or overwrite a component, keeping an existing key's position.
    pub fn insert<T: Component>(
        &mut self,
        key: ComponentKey,
        component: impl Into<RefOr<T>>,
    ) -> Option<RefOr<T>> {
        self.origins.remove(&(T::KIND, key.clone()));
        T::component_map_mut(self).insert(key, component.into())
    }

    pub fn remove<T: Component>(&mut self, key: &str) -> Option<RefOr<T>> {
        self.origins
            .retain(|(kind, origin_key), _| *kind != T::KIND || origin_key.as_str() != key);
        T::component_map_mut(self).remove(key)
    }

    /// The external reference a component was loaded for, if it came from another document.
    pub fn origin<T: Component>(&self, key: &ComponentKey) -> Option<&ExternalReference> {
        self.origins.get(&(T::KIND, key.clone()))
    }

    pub(crate) fn record_origin<T: Component>(
        &mut self,
        key: ComponentKey,
        reference: ExternalReference,
    ) {
        self.origins.insert((T::KIND, key), reference);
    }

    /// A reference to an existing component. Fails rather than hand out a dangling reference.
    pub fn reference<T: Component>(&self, key: &str) -> Result<Reference<T>, DerefError> {
        let map = T::component_map(self);
        map.index_of(key)
            .and_then(|index| map.get_index(index))
            .map(|(key, _)| Reference::component(key.clone()))
            .ok_or_else(|| missing::<T>(key))
    }

    /// The store entry a reference points at.
    ///
    /// External references are not looked up here: they must first be loaded by
    /// [`Components::externally_dereference`], which rewrites them into local references.
    pub fn lookup<T: Component>(&self, reference: &Reference<T>) -> Result<&RefOr<T>, DerefError> {
        match reference.target() {
            RefTarget::Component(key) => T::component_map(self)
                .get(key)
                .ok_or_else(|| missing::<T>(key.as_str())),
            RefTarget::External(external) => Err(DerefError::UnloadedExternalReference {
                kind: T::KIND,
                reference: external.clone(),
            }),
        }
    }

    /// Merge `other` into this store.
    ///
    /// Any kind/key pair present in both stores is a [`ComponentCollision`], including pairs whose
    /// values are identical. The first collision (in [`ComponentKind::ALL`] order, then `other`'s
    /// key order) is reported and the store is left untouched.
    pub fn merge(&mut self, other: Components) -> Result<(), DerefError> {
        if let Some(collision) = self.first_collision(&other) {
            tracing::debug!("[Components::merge] rejecting merge: {collision}");
            return Err(collision);
        }
        let Components {
            schemas,
            responses,
            parameters,
            examples,
            request_bodies,
            headers,
            security_schemes,
            links,
            callbacks,
            path_items,
            vendor_extensions,
            origins,
        } = other;
        merge_kind(&mut self.schemas, schemas)?;
        merge_kind(&mut self.responses, responses)?;
        merge_kind(&mut self.parameters, parameters)?;
        merge_kind(&mut self.examples, examples)?;
        merge_kind(&mut self.request_bodies, request_bodies)?;
        merge_kind(&mut self.headers, headers)?;
        merge_kind(&mut self.security_schemes, security_schemes)?;
        merge_kind(&mut self.links, links)?;
        merge_kind(&mut self.callbacks, callbacks)?;
        merge_kind(&mut self.path_items, path_items)?;
        self.vendor_extensions.merge(vendor_extensions)?;
        self.origins.extend(origins);
        Ok(())
    }

    /// Add a single component with the same always-fatal policy as [`Components::merge`].
    pub fn merge_component<T: Component>(
        &mut self,
        key: ComponentKey,
        component: RefOr<T>,
    ) -> Result<(), DerefError> {
        let map = T::component_map_mut(self);
        if let Some(existing) = map.get(&key) {
            return Err(collision_report(T::KIND, &key, existing, &component).into());
        }
        map.insert(key, component);
        Ok(())
    }

    fn first_collision(&self, other: &Components) -> Option<DerefError> {
        kind_collision::<Schema>(self, other)
            .or_else(|| kind_collision::<Response>(self, other))
            .or_else(|| kind_collision::<Parameter>(self, other))
            .or_else(|| kind_collision::<Example>(self, other))
            .or_else(|| kind_collision::<RequestBody>(self, other))
            .or_else(|| kind_collision::<Header>(self, other))
            .or_else(|| kind_collision::<SecurityScheme>(self, other))
            .or_else(|| kind_collision::<Link>(self, other))
            .or_else(|| kind_collision::<Callbacks>(self, other))
            .or_else(|| kind_collision::<PathItem>(self, other))
            .or_else(|| {
                let key = self.vendor_extensions.0.first_shared_key(&other.vendor_extensions.0)?;
                Some(DerefError::ExtensionCollision {
                    key: key.clone(),
                    existing: self.vendor_extensions.0[key.as_str()].clone(),
                    incoming: other.vendor_extensions.0[key.as_str()].clone(),
                })
            })
    }

    /// Walk every component slot, kind by kind in [`ComponentKind::ALL`] order.
    pub fn visit_component_slots<V: SlotVisitor>(
        &mut self,
        visitor: &mut V,
    ) -> Result<(), DerefError> {
        visit_kind(&mut self.schemas, visitor)?;
        visit_kind(&mut self.responses, visitor)?;
        visit_kind(&mut self.parameters, visitor)?;
        visit_kind(&mut self.examples, visitor)?;
        visit_kind(&mut self.request_bodies, visitor)?;
        visit_kind(&mut self.headers, visitor)?;
        visit_kind(&mut self.security_schemes, visitor)?;
        visit_kind(&mut self.links, visitor)?;
        visit_kind(&mut self.callbacks, visitor)?;
        visit_kind(&mut self.path_items, visitor)
    }
}

impl Dereferenceable for Components {
    fn visit_slots<V: SlotVisitor>(&mut self, visitor: &mut V) -> Result<(), DerefError> {
        self.visit_component_slots(visitor)
    }
}

fn missing<T: Component>(key: &str) -> DerefError {
    DerefError::MissingReference {
        kind: T::KIND,
        key: key.to_string(),
    }
}

fn snapshot<S: Serialize>(value: &S) -> JsonValue {
    serde_json::to_value(value)
        .unwrap_or_else(|err| JsonValue::String(format!("<unserializable component: {err}>")))
}

fn collision_report<T: Component>(
    kind: ComponentKind,
    key: &ComponentKey,
    existing: &RefOr<T>,
    incoming: &RefOr<T>,
) -> ComponentCollision {
    ComponentCollision {
        kind,
        key: key.clone(),
        existing: snapshot(existing),
        incoming: snapshot(incoming),
    }
}

fn kind_collision<T: Component>(local: &Components, other: &Components) -> Option<DerefError> {
    let ours = T::component_map(local);
    let theirs = T::component_map(other);
    let key = ours.first_shared_key(theirs)?;
    Some(collision_report(T::KIND, key, &ours[key.as_str()], &theirs[key.as_str()]).into())
}

fn merge_kind<T: Component>(
    local: &mut ComponentMap<T>,
    incoming: ComponentMap<T>,
) -> Result<(), DerefError> {
    local.merge(incoming, |key, existing, incoming| {
        Err(collision_report(T::KIND, key, existing, &incoming).into())
    })
}

fn visit_kind<T: Component, V: SlotVisitor>(
    map: &mut ComponentMap<T>,
    visitor: &mut V,
) -> Result<(), DerefError> {
    for slot in map.values_mut() {
        visitor.visit(slot)?;
    }
    Ok(())
}
