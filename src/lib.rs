//! # openapi-deref
//!
//! Reference resolution for API description documents.
//!
//! ## Overview
//!
//! An API document is a graph: operations point at parameters, parameters at schemas, schemas at
//! other schemas, and any of those links may be written as a `$ref` instead of an inline value.
//! This crate turns such a graph into a *dereferenced* one, where every reference has been
//! replaced by a copy of the entity it names.
//!
//! Resolution happens in two stages:
//!
//! 1. **External resolution** ([`external`]): references into other documents are handed to a
//!    caller-supplied [`ExternalLoader`]. Loads run concurrently; their results are merged into the
//!    local [`Components`] store sequentially, in a fixed order, so the outcome never depends on
//!    which load finished first.
//! 2. **Local resolution** ([`deref`]): every remaining reference is replaced by the component it
//!    names, recursively, with cycle detection. Each inlined value is tagged with the component
//!    name it came from (`x-component-name` by default).
//!
//! ## Quick Start
//!
//! ```rust
//! use openapi_deref::model::{Document, Schema};
//! use openapi_deref::components::COMPONENT_NAME_EXTENSION;
//!
//! # fn main() -> Result<(), openapi_deref::DerefError> {
//! let document = Document::from_yaml_str(
//!     r##"
//! openapi: 3.1.0
//! info: { title: Pets, version: "1.0" }
//! paths:
//!   /pets:
//!     get:
//!       responses:
//!         "200":
//!           description: all pets
//!           content:
//!             application/json:
//!               schema: { $ref: "#/components/schemas/Pet" }
//! components:
//!   schemas:
//!     Pet: { type: object }
//! "##,
//! )?;
//!
//! let resolved = document.locally_dereferenced()?;
//! let get = resolved.paths["/pets"].as_value().and_then(|item| item.get.as_ref());
//! let schema: Option<&Schema> = get
//!     .and_then(|op| op.responses["200"].as_value())
//!     .and_then(|response| response.content["application/json"].schema.as_ref())
//!     .and_then(|slot| slot.as_value());
//! assert_eq!(
//!     schema.and_then(|s| s.vendor_extensions.component_name(COMPONENT_NAME_EXTENSION)),
//!     Some("Pet")
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Reference-or-value slots
//!
//! Every place a reference is legal holds a [`RefOr<T>`](either::RefOr). Decoding is
//! discriminator first: an object that is exactly `{"$ref": "..."}` is a reference, anything else
//! is a value.
//!
//! ### Collisions
//!
//! Merging two component stores that both define the same kind/key pair always fails with a
//! [`ComponentCollision`], even when the two definitions are identical. Failed merges leave the
//! store unchanged.
//!
//! ### Traversal
//!
//! Entities expose their nested slots through [`Dereferenceable`](deref::Dereferenceable). Any
//! type implementing it can be resolved with [`LocalResolver`](deref::LocalResolver).
//!
//! ## Module Guide
//!
//! - [`ordered_map`]: insertion-ordered map backing every collection
//! - [`either`]: the reference-or-value sum type
//! - [`reference`]: reference identities and the `$ref` wire format
//! - [`components`]: the component store and its merge policy
//! - [`deref`]: local resolution
//! - [`external`]: external resolution through a loader
//! - [`model`]: a lean catalog of document entities
//! - [`config`]: resolver options, loadable from TOML

pub mod components;
pub mod config;
pub mod deref;
pub mod either;
pub mod error;
pub mod external;
pub mod model;
pub mod ordered_map;
pub mod reference;
#[cfg(test)]
mod tests;

pub use components::{Component, Components};
pub use config::DereferenceOptions;
pub use deref::{resolve, resolve_with, Dereferenced};
pub use either::{Either, RefOr};
pub use error::*;
pub use external::{ExternalLoader, ExternalResolution};
pub use reference::{ComponentKey, ComponentKind, Reference};
