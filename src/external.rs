//! External resolution.
//!
//! A pass scans the component store (and, for a [`Document`], its paths) for references that
//! point into other documents. Each distinct reference is handed to the caller's
//! [`ExternalLoader`] once, and the slot is rewritten to a local reference under
//! [`ExternalLoader::component_key`]. All loads run concurrently on the calling task. Their
//! results are then merged into the store one by one in scan order, so the outcome never depends
//! on which load finishes first.
//!
//! The store remembers which reference each loaded component came from. A later pass reuses a
//! component only when it was loaded for the very same reference; a key already taken by anything
//! else is loaded anyway and the merge reports the collision.
//!
//! A pass is all-or-nothing: it works on a copy of the store and commits only once every load and
//! every merge has succeeded.

use std::collections::HashSet;

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};
use serde::{Deserialize, Serialize};

use crate::{
    components::{Component, Components},
    deref::{visit_all, SlotVisitor},
    either::{Either, RefOr},
    error::DerefError,
    model::Document,
    reference::{ComponentKey, ExternalReference, RefIdentity, RefTarget, Reference},
};

/// Fetches and decodes entities that live in other documents.
///
/// Transport, caching and relative-URI handling are up to the implementation.
#[async_trait]
pub trait ExternalLoader: Send + Sync {
    /// Load the entity `reference` points at, plus any components discovered along the way.
    async fn load<T: Component>(
        &self,
        reference: &ExternalReference,
    ) -> Result<(T, Components), DerefError>;

    /// Key the loaded entity is stored under in the local component store.
    fn component_key<T: Component>(
        &self,
        reference: &ExternalReference,
    ) -> Result<ComponentKey, DerefError> {
        ComponentKey::sanitized(&reference.to_string())
    }
}

/// What a successful pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalResolution {
    /// Loader calls issued.
    pub loads: usize,
    /// Contributions merged into the store.
    pub merges: usize,
}

type Contribution<'l> = BoxFuture<'l, Result<Components, DerefError>>;

/// Rewrites external reference slots and queues one load per distinct reference.
struct ExternalScan<'l, 's, L> {
    loader: &'l L,
    /// The store as it was before the pass. Components it already loaded for the same reference
    /// are not loaded again.
    known: &'s Components,
    seen: HashSet<RefIdentity>,
    pending: Vec<Contribution<'l>>,
}

impl<'l, 's, L: ExternalLoader> ExternalScan<'l, 's, L> {
    fn new(loader: &'l L, known: &'s Components) -> Self {
        ExternalScan {
            loader,
            known,
            seen: HashSet::new(),
            pending: Vec::new(),
        }
    }

    fn queue<T: Component>(&mut self, external: ExternalReference, key: ComponentKey) {
        let loader = self.loader;
        self.pending.push(Box::pin(async move {
            tracing::debug!("[ExternalScan] loading {external} as {}/{key}", T::KIND);
            let (value, mut contribution) =
                loader
                    .load::<T>(&external)
                    .await
                    .map_err(|source| DerefError::LoaderFailure {
                        reference: external.clone(),
                        source: Box::new(source),
                    })?;
            contribution.merge_component(key.clone(), Either::Value(value))?;
            contribution.record_origin::<T>(key, external);
            Ok::<_, DerefError>(contribution)
        }));
    }
}

impl<L: ExternalLoader> SlotVisitor for ExternalScan<'_, '_, L> {
    fn visit<T: Component>(&mut self, slot: &mut RefOr<T>) -> Result<(), DerefError> {
        let external = match slot {
            Either::Value(value) => return value.visit_slots(self),
            Either::Reference(reference) => match reference.external_reference() {
                Some(external) => external.clone(),
                None => return Ok(()),
            },
        };
        let key = self.loader.component_key::<T>(&external)?;
        *slot = Either::Reference(Reference::component(key.clone()));

        let identity = RefIdentity {
            kind: T::KIND,
            target: RefTarget::External(external.clone()),
        };
        if !self.seen.insert(identity) {
            return Ok(());
        }
        if self.known.origin::<T>(&key) == Some(&external) {
            tracing::debug!("[ExternalScan] {external} already loaded as {}/{key}", T::KIND);
            return Ok(());
        }
        self.queue::<T>(external, key);
        Ok(())
    }
}

/// Await every queued load, then merge the contributions into `store` in queue order.
async fn settle(
    pending: Vec<Contribution<'_>>,
    store: &mut Components,
) -> Result<ExternalResolution, DerefError> {
    let loads = pending.len();
    let mut contributions = Vec::with_capacity(loads);
    for outcome in join_all(pending).await {
        match outcome {
            Ok(contribution) => contributions.push(contribution),
            Err(err) => {
                tracing::warn!("[settle] external pass aborted: {err}");
                return Err(err);
            }
        }
    }

    let mut merges = 0;
    for contribution in contributions {
        if contribution.is_empty() && contribution.vendor_extensions.is_empty() {
            continue;
        }
        store.merge(contribution)?;
        merges += 1;
    }
    Ok(ExternalResolution { loads, merges })
}

impl Components {
    /// Load every external reference in the store and merge the results in.
    ///
    /// On error the store is left as it was.
    #[tracing::instrument(skip_all, fields(components = self.len()))]
    pub async fn externally_dereference<L: ExternalLoader>(
        &mut self,
        loader: &L,
    ) -> Result<ExternalResolution, DerefError> {
        let mut working = self.clone();
        let pending = {
            let mut scan = ExternalScan::new(loader, self);
            working.visit_component_slots(&mut scan)?;
            scan.pending
        };
        let resolution = settle(pending, &mut working).await?;
        tracing::info!(
            "[Components::externally_dereference] {} loads, {} merges",
            resolution.loads,
            resolution.merges
        );
        *self = working;
        Ok(resolution)
    }
}

impl Document {
    /// Load every external reference in the component store, then in `paths`, merging the
    /// results into the document's store.
    ///
    /// On error the document is left as it was.
    #[tracing::instrument(skip_all, fields(paths = self.paths.len()))]
    pub async fn externally_dereference<L: ExternalLoader>(
        &mut self,
        loader: &L,
    ) -> Result<ExternalResolution, DerefError> {
        let mut components = self.components.clone();
        let mut paths = self.paths.clone();
        let pending = {
            let mut scan = ExternalScan::new(loader, &self.components);
            components.visit_component_slots(&mut scan)?;
            visit_all(paths.values_mut(), &mut scan)?;
            scan.pending
        };
        let resolution = settle(pending, &mut components).await?;
        tracing::info!(
            "[Document::externally_dereference] {} loads, {} merges",
            resolution.loads,
            resolution.merges
        );
        self.components = components;
        self.paths = paths;
        Ok(resolution)
    }
}
