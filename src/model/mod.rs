//! A lean catalog of the entities that make up an API document.
//!
//! Each referenceable kind carries just enough structure to hold its nested reference slots, its
//! `x-*` vendor extensions and a faithful serde round trip. Field-level validation is left to
//! callers.

mod callbacks;
mod document;
mod example;
mod header;
mod link;
mod parameter;
mod path_item;
mod request;
pub(crate) mod response;
mod schema;
mod security;

pub use callbacks::{CallbackUrl, Callbacks};
pub use document::{Document, Info};
pub use example::Example;
pub use header::Header;
pub use link::Link;
pub use parameter::{Parameter, ParameterLocation, ParameterStyle};
pub use path_item::{Operation, PathItem};
pub use request::RequestBody;
pub use response::{MediaType, Response};
pub use schema::{AdditionalProperties, Schema};
pub use security::SecurityScheme;
