//! Shared fixtures for document-level tests

use crate::{
    components::Components,
    model::{
        Document, Info, MediaType, Operation, Parameter, ParameterLocation, PathItem, Response,
        Schema,
    },
    reference::{ComponentKey, Reference},
    RefOr,
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn key(name: &str) -> ComponentKey {
    ComponentKey::new(name).unwrap()
}

pub fn schema_ref(name: &str) -> RefOr<Schema> {
    Reference::named(name).unwrap().into()
}

/// A pet store: `GET /pets/{petId}` returning `Pet`, whose `owner` property points at `Person`.
pub fn create_petstore() -> Document {
    init_logging();

    let mut components = Components::new();
    components.insert(
        key("Person"),
        Schema::object().with_property("name", Schema::typed("string")),
    );
    components.insert(
        key("Pet"),
        Schema::object()
            .with_property("id", Schema::typed("integer"))
            .with_property("owner", schema_ref("Person")),
    );
    components.insert(
        key("PetId"),
        Parameter::new("petId", ParameterLocation::Path).with_schema(Schema::typed("integer")),
    );
    components.insert(
        key("PetFound"),
        Response::new("the pet")
            .with_content("application/json", MediaType::with_schema(schema_ref("Pet"))),
    );

    let get = Operation {
        operation_id: Some("getPet".to_string()),
        ..Default::default()
    }
    .with_parameter(Reference::<Parameter>::named("PetId").unwrap())
    .with_response("200", Reference::<Response>::named("PetFound").unwrap());

    let mut document = Document::new(
        "3.1.0",
        Info {
            title: "Pet Store".to_string(),
            version: "1.0.0".to_string(),
            ..Default::default()
        },
    );
    document.paths.insert(
        "/pets/{petId}".to_string(),
        PathItem {
            get: Some(get),
            ..Default::default()
        }
        .into(),
    );
    document.components = components;
    document
}
