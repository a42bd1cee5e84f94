//! Local dereferencing.
//!
//! Entities expose their nested [`RefOr`] slots through [`Dereferenceable::visit_slots`]. The
//! [`LocalResolver`] is a [`SlotVisitor`] that replaces every reference slot with a copy of the
//! component it names, recursing into that copy before writing it back. The chain of references
//! currently being expanded is kept in a [`ReferenceChain`] owned by a single resolver, so
//! concurrent resolutions over the same store never share state.

use std::{fmt, ops::Deref};

use serde::{Serialize, Serializer};

use crate::{
    components::{Component, Components},
    config::DereferenceOptions,
    either::{Either, RefOr},
    error::DerefError,
    reference::{ComponentKey, RefIdentity, Reference},
};

/// Receives every nested reference-or-value slot of an entity.
pub trait SlotVisitor {
    fn visit<T: Component>(&mut self, slot: &mut RefOr<T>) -> Result<(), DerefError>;
}

/// Traversal capability implemented by every entity that can appear in a document graph.
///
/// Leaf entities keep the default `visit_slots`, which reports no slots.
pub trait Dereferenceable {
    fn visit_slots<V: SlotVisitor>(&mut self, _visitor: &mut V) -> Result<(), DerefError> {
        Ok(())
    }

    /// Record the component this value was inlined from. Entities without vendor extensions
    /// ignore the annotation.
    fn annotate_component_name(&mut self, _extension: &str, _name: &ComponentKey) {}
}

/// Visit each slot yielded by `slots`, stopping at the first error.
pub fn visit_all<'a, T, V, I>(slots: I, visitor: &mut V) -> Result<(), DerefError>
where
    T: Component,
    V: SlotVisitor,
    I: IntoIterator<Item = &'a mut RefOr<T>>,
{
    for slot in slots {
        visitor.visit(slot)?;
    }
    Ok(())
}

/// References currently being expanded, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceChain(Vec<RefIdentity>);

impl ReferenceChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identity: &RefIdentity) -> bool {
        self.0.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RefIdentity> {
        self.0.iter()
    }

    pub fn push(&mut self, identity: RefIdentity) {
        self.0.push(identity);
    }

    pub fn pop(&mut self) -> Option<RefIdentity> {
        self.0.pop()
    }

    /// The chain extended by `identity`, as reported in a cycle error.
    fn closed_by(&self, identity: RefIdentity) -> Vec<RefIdentity> {
        let mut chain = self.0.clone();
        chain.push(identity);
        chain
    }
}

impl FromIterator<RefIdentity> for ReferenceChain {
    fn from_iter<I: IntoIterator<Item = RefIdentity>>(iter: I) -> Self {
        ReferenceChain(iter.into_iter().collect())
    }
}

/// Replaces reference slots with the components they name.
pub struct LocalResolver<'a> {
    components: &'a Components,
    options: &'a DereferenceOptions,
    chain: ReferenceChain,
}

impl<'a> LocalResolver<'a> {
    pub fn new(components: &'a Components, options: &'a DereferenceOptions) -> Self {
        Self::with_chain(components, options, ReferenceChain::new())
    }

    /// Resume a resolution that is already expanding the references in `chain`.
    pub fn with_chain(
        components: &'a Components,
        options: &'a DereferenceOptions,
        chain: ReferenceChain,
    ) -> Self {
        LocalResolver {
            components,
            options,
            chain,
        }
    }

    /// A dereferenced copy of `root`. The input is left untouched.
    pub fn dereference<T: Dereferenceable + Clone>(&mut self, root: &T) -> Result<T, DerefError> {
        let mut resolved = root.clone();
        resolved.visit_slots(self)?;
        Ok(resolved)
    }

    /// Resolve a single slot into a value.
    pub fn resolve_slot<T: Component>(&mut self, slot: &RefOr<T>) -> Result<T, DerefError> {
        match slot {
            Either::Reference(reference) => self.resolve_reference(reference),
            Either::Value(value) => self.dereference(value),
        }
    }

    fn resolve_reference<T: Component>(
        &mut self,
        reference: &Reference<T>,
    ) -> Result<T, DerefError> {
        let identity = reference.identity();
        if self.chain.contains(&identity) {
            let chain = self.chain.closed_by(identity);
            tracing::debug!(
                "[LocalResolver::resolve_reference] cycle detected after {} links",
                chain.len() - 1
            );
            return Err(DerefError::ReferenceCycle { chain });
        }
        let components = self.components;
        let entry = components.lookup(reference)?;

        self.chain.push(identity);
        let result = match entry {
            Either::Reference(next) => self.resolve_reference(next),
            Either::Value(value) => self.dereference(value),
        };
        self.chain.pop();

        let mut value = result?;
        if self.options.annotate_component_names {
            if let Some(key) = reference.component_key() {
                value.annotate_component_name(&self.options.component_name_extension, key);
            }
        }
        Ok(value)
    }
}

impl SlotVisitor for LocalResolver<'_> {
    fn visit<T: Component>(&mut self, slot: &mut RefOr<T>) -> Result<(), DerefError> {
        match slot {
            Either::Value(value) => value.visit_slots(self),
            Either::Reference(reference) => {
                let value = self.resolve_reference(reference)?;
                *slot = Either::Value(value);
                Ok(())
            }
        }
    }
}

/// A fully dereferenced value. Only shared access is handed out.
#[derive(Clone, PartialEq)]
pub struct Dereferenced<T>(T);

impl<T> Dereferenced<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Dereferenced<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> AsRef<T> for Dereferenced<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Dereferenced<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dereferenced").field(&self.0).finish()
    }
}

impl<T: Serialize> Serialize for Dereferenced<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

pub(crate) fn dereferenced<T>(value: T) -> Dereferenced<T> {
    Dereferenced(value)
}

/// Resolve a slot against `components` with the default options.
pub fn resolve<T: Component>(
    slot: &RefOr<T>,
    components: &Components,
) -> Result<Dereferenced<T>, DerefError> {
    resolve_with(slot, components, &DereferenceOptions::default())
}

pub fn resolve_with<T: Component>(
    slot: &RefOr<T>,
    components: &Components,
    options: &DereferenceOptions,
) -> Result<Dereferenced<T>, DerefError> {
    resolve_following(slot, components, &ReferenceChain::new(), options)
}

/// Resolve a slot while the references in `visiting` are already being expanded. Reaching any of
/// them again is reported as a cycle.
pub fn resolve_following<T: Component>(
    slot: &RefOr<T>,
    components: &Components,
    visiting: &ReferenceChain,
    options: &DereferenceOptions,
) -> Result<Dereferenced<T>, DerefError> {
    options.validate()?;
    let mut resolver = LocalResolver::with_chain(components, options, visiting.clone());
    resolver.resolve_slot(slot).map(Dereferenced)
}

impl Components {
    /// The component stored under `key`, fully dereferenced and annotated with its own name.
    pub fn dereferenced<T: Component>(&self, key: &str) -> Result<Dereferenced<T>, DerefError> {
        let slot = RefOr::<T>::from(self.reference::<T>(key)?);
        resolve(&slot, self)
    }
}
