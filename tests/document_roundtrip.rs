//! Whole-document tests against the YAML fixtures in `tests/fixtures`.

mod common;

use std::{fs, path::Path};

use common::StubLoader;
use openapi_deref::{
    components::COMPONENT_NAME_EXTENSION,
    model::{Document, Operation, ParameterStyle, Response, Schema},
    DerefError, Either, ExternalResolution,
};
use serde_json::json;
use test_log::test;

const ERROR_RESPONSE: &str = "common.yaml#/components/responses/Error";
const PERSON: &str = "people.yaml#/Person";

fn load_fixture(name: &str) -> Result<Document, DerefError> {
    let path = Path::new("tests").join("fixtures").join(name);
    tracing::debug!("Loading fixture {:?}", path);
    Document::from_yaml_str(&fs::read_to_string(path)?)
}

fn operation<'a>(document: &'a Document, path: &str) -> &'a Operation {
    document.paths[path]
        .as_value()
        .and_then(|item| item.get.as_ref())
        .expect("GET operation")
}

fn fixture_loader() -> StubLoader {
    let mut discovered = openapi_deref::Components::new();
    discovered.insert(
        openapi_deref::ComponentKey::new("Error").unwrap(),
        Schema::object().with_property("message", Schema::typed("string")),
    );
    StubLoader::new()
        .serve(
            PERSON,
            json!({"type": "object", "properties": {"name": {"type": "string"}}}),
        )
        .delayed(PERSON, 20)
        .serve_with(
            ERROR_RESPONSE,
            json!({
                "description": "unexpected error",
                "content": {
                    "application/json": {"schema": {"$ref": "#/components/schemas/Error"}}
                }
            }),
            discovered,
        )
}

#[test]
fn test_fixture_decodes_and_round_trips() {
    common::init_logging();
    let document = load_fixture("petstore.yaml").unwrap();

    assert_eq!(document.info.title, "Pet Store");
    assert_eq!(
        document.vendor_extensions.get("x-audience"),
        Some(&json!("public"))
    );
    let tags = operation(&document, "/pets").parameters[1]
        .as_value()
        .expect("inline parameter");
    assert_eq!(tags.style, ParameterStyle::Form);
    assert_eq!(tags.warnings().len(), 1);

    let limit = document
        .components
        .get::<openapi_deref::model::Parameter>("Limit")
        .and_then(Either::as_value)
        .expect("Limit parameter");
    assert_eq!(limit.example(), Some(&json!(10)));

    let pet_id = document
        .components
        .get::<Schema>("PetId")
        .and_then(Either::as_value)
        .expect("PetId schema");
    assert_eq!(pet_id.keywords["minimum"], json!(1));

    let reencoded = Document::from_yaml_str(&document.to_yaml_string().unwrap()).unwrap();
    assert_eq!(reencoded, document);
    let tags = operation(&reencoded, "/pets").parameters[1].as_value().unwrap();
    assert!(tags.warnings().is_empty());
}

#[test(tokio::test)]
async fn test_external_then_local_resolution() {
    let loader = fixture_loader();
    let mut document = load_fixture("petstore.yaml").unwrap();

    let resolution = document.externally_dereference(&loader).await.unwrap();
    assert_eq!(resolution, ExternalResolution { loads: 2, merges: 2 });
    assert_eq!(loader.started(), vec![PERSON, ERROR_RESPONSE]);
    assert!(document.components.contains::<Schema>("Error"));
    assert!(document
        .components
        .contains::<Response>("common.yaml_components_responses_Error"));

    let resolved = document.locally_dereferenced().unwrap();
    let rendered = serde_json::to_string(&resolved).unwrap();
    assert!(!rendered.contains("$ref"));

    let error = operation(&resolved, "/pets/{petId}").responses["default"]
        .as_value()
        .expect("inlined error response");
    assert_eq!(error.description, "unexpected error");
    assert_eq!(
        error.vendor_extensions.component_name(COMPONENT_NAME_EXTENSION),
        Some("common.yaml_components_responses_Error")
    );
    let error_schema = error.content["application/json"]
        .schema
        .as_ref()
        .and_then(Either::as_value)
        .unwrap();
    assert_eq!(
        error_schema
            .vendor_extensions
            .component_name(COMPONENT_NAME_EXTENSION),
        Some("Error")
    );

    let page = operation(&resolved, "/pets").responses["200"].as_value().unwrap();
    let pet = page.content["application/json"]
        .schema
        .as_ref()
        .and_then(Either::as_value)
        .and_then(|list| list.items.as_deref())
        .and_then(Either::as_value)
        .unwrap();
    let owner = pet.properties["owner"].as_value().unwrap();
    assert_eq!(owner.properties["name"], Either::Value(Schema::typed("string")));
}

#[test(tokio::test)]
async fn test_failed_document_pass_leaves_document_unchanged() {
    let loader = fixture_loader().failing(PERSON, DerefError::NotFound(PERSON.to_string()));
    let mut document = load_fixture("petstore.yaml").unwrap();
    let before = document.clone();

    let err = document.externally_dereference(&loader).await.unwrap_err();
    assert!(err.is_loader_failure());
    assert_eq!(document, before);
    assert!(matches!(
        document.locally_dereferenced(),
        Err(DerefError::UnloadedExternalReference { .. })
    ));
}
