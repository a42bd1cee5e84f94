//! External resolution integration tests
//!
//! These tests drive `Components::externally_dereference` with an in-memory loader whose
//! per-reference delays shuffle the order in which loads complete.

mod common;

use async_trait::async_trait;
use common::StubLoader;
use openapi_deref::{
    model::{Response, Schema},
    reference::ExternalReference,
    Component, ComponentKey, ComponentKind, Components, DerefError, Either, ExternalLoader,
    ExternalResolution, RefOr, Reference,
};
use serde_json::json;
use test_log::test;

const PET: &str = "https://pets.example/pet.json#/Pet";
const ADDRESS: &str = "https://pets.example/address.json";
const NOT_FOUND: &str = "https://pets.example/errors.yaml#/NotFound";

fn key(name: &str) -> ComponentKey {
    ComponentKey::new(name).unwrap()
}

fn external<T: Component>(reference: &str) -> RefOr<T> {
    RefOr::from(reference.parse::<Reference<T>>().unwrap())
}

fn local<T: Component>(name: &str) -> RefOr<T> {
    RefOr::from(Reference::<T>::named(name).unwrap())
}

/// Three external references: one alias, one nested in a property, one response.
fn external_store() -> Components {
    let mut components = Components::new();
    components.insert::<Schema>(key("Pet"), external::<Schema>(PET));
    components.insert(
        key("Owner"),
        Schema::object().with_property("address", external::<Schema>(ADDRESS)),
    );
    components.insert::<Response>(key("NotFound"), external::<Response>(NOT_FOUND));
    components
}

fn loader_with_delays(pet: u64, address: u64, not_found: u64) -> StubLoader {
    StubLoader::new()
        .serve(PET, json!({"type": "object"}))
        .delayed(PET, pet)
        .serve(ADDRESS, json!({"type": "string"}))
        .delayed(ADDRESS, address)
        .serve(NOT_FOUND, json!({"description": "not found"}))
        .delayed(NOT_FOUND, not_found)
}

#[test(tokio::test)]
async fn test_merge_order_ignores_completion_order() {
    let mut outcomes = Vec::new();
    let mut completion_orders = Vec::new();
    for (pet, address, not_found) in [(10, 20, 30), (30, 20, 10), (20, 30, 10)] {
        let loader = loader_with_delays(pet, address, not_found);
        let mut components = external_store();
        let resolution = components.externally_dereference(&loader).await.unwrap();
        assert_eq!(resolution, ExternalResolution { loads: 3, merges: 3 });
        assert_eq!(loader.started(), vec![PET, ADDRESS, NOT_FOUND]);
        completion_orders.push(loader.finished());
        outcomes.push(components);
    }

    assert_ne!(completion_orders[0], completion_orders[1]);
    assert!(outcomes.windows(2).all(|pair| pair[0] == pair[1]));

    let store = &outcomes[0];
    let schema_keys: Vec<&str> = store.schemas.keys().map(ComponentKey::as_str).collect();
    assert_eq!(
        schema_keys,
        vec![
            "Pet",
            "Owner",
            "https_pets.example_pet.json_Pet",
            "https_pets.example_address.json"
        ]
    );
    assert_eq!(
        store.get::<Schema>("Pet"),
        Some(&local::<Schema>("https_pets.example_pet.json_Pet"))
    );
    assert!(store
        .get::<Response>("https_pets.example_errors.yaml_NotFound")
        .is_some());
}

#[test(tokio::test)]
async fn test_first_collision_is_deterministic() {
    let mut shared_string = Components::new();
    shared_string.insert(key("Shared"), Schema::typed("string"));
    let mut shared_integer = Components::new();
    shared_integer.insert(key("Shared"), Schema::typed("integer"));

    for (pet, address) in [(5, 40), (40, 5)] {
        let loader = loader_with_delays(pet, address, 0)
            .serve_with(PET, json!({"type": "object"}), shared_string.clone())
            .serve_with(ADDRESS, json!({"type": "string"}), shared_integer.clone());
        let mut components = external_store();
        let before = components.clone();

        let err = components.externally_dereference(&loader).await.unwrap_err();
        let collision = err.as_collision().expect("collision error");
        assert_eq!(collision.kind, ComponentKind::Schemas);
        assert_eq!(collision.key.as_str(), "Shared");
        assert_eq!(collision.existing, json!({"type": "string"}));
        assert_eq!(collision.incoming, json!({"type": "integer"}));
        assert_eq!(components, before);
    }
}

#[test(tokio::test)]
async fn test_loader_failure_leaves_store_unchanged() {
    let loader = loader_with_delays(0, 0, 0)
        .failing(NOT_FOUND, DerefError::NotFound("gone".to_string()));
    let mut components = external_store();
    let before = components.clone();

    let err = components.externally_dereference(&loader).await.unwrap_err();
    assert_eq!(
        err,
        DerefError::LoaderFailure {
            reference: ExternalReference::new(
                "https://pets.example/errors.yaml",
                Some("/NotFound".to_string())
            ),
            source: Box::new(DerefError::NotFound("gone".to_string())),
        }
    );
    assert!(err.is_loader_failure());
    assert_eq!(components, before);
}

#[test(tokio::test)]
async fn test_local_store_needs_no_loads() {
    let loader = StubLoader::new();
    let mut components = Components::new();
    components.insert(key("Id"), Schema::typed("integer"));
    components.insert::<Schema>(key("PetId"), local::<Schema>("Id"));
    let before = components.clone();

    let resolution = components.externally_dereference(&loader).await.unwrap();
    assert_eq!(resolution, ExternalResolution::default());
    assert!(loader.started().is_empty());
    assert_eq!(components, before);
}

#[test(tokio::test)]
async fn test_second_pass_is_a_no_op() {
    let loader = loader_with_delays(0, 0, 0);
    let mut components = external_store();
    components.externally_dereference(&loader).await.unwrap();
    let after_first = components.clone();

    let resolution = components.externally_dereference(&loader).await.unwrap();
    assert_eq!(resolution, ExternalResolution { loads: 0, merges: 0 });
    assert_eq!(components, after_first);
    assert_eq!(loader.started().len(), 3);
}

#[test(tokio::test)]
async fn test_identical_references_share_one_load() {
    let loader = StubLoader::new().serve(PET, json!({"type": "object"}));
    let mut components = Components::new();
    components.insert::<Schema>(key("Pet"), external::<Schema>(PET));
    components.insert(key("Pets"), Schema::array_of(external::<Schema>(PET)));

    let resolution = components.externally_dereference(&loader).await.unwrap();
    assert_eq!(resolution, ExternalResolution { loads: 1, merges: 1 });
    assert_eq!(loader.started(), vec![PET]);

    let pets = components.dereferenced::<Schema>("Pets").unwrap();
    let items = pets.items.as_deref().and_then(Either::as_value).unwrap();
    assert_eq!(items.schema_type.as_deref(), Some("object"));
}

#[test(tokio::test)]
async fn test_nested_external_references_resolve_over_passes() {
    let tag = "https://pets.example/tag.json";
    let loader = StubLoader::new()
        .serve(
            PET,
            json!({"type": "object", "properties": {"tag": {"$ref": tag}}}),
        )
        .serve(tag, json!({"type": "string"}));
    let mut components = Components::new();
    components.insert::<Schema>(key("Pet"), external::<Schema>(PET));

    let first = components.externally_dereference(&loader).await.unwrap();
    assert_eq!(first.loads, 1);
    assert!(matches!(
        components.dereferenced::<Schema>("Pet"),
        Err(DerefError::UnloadedExternalReference { .. })
    ));

    let second = components.externally_dereference(&loader).await.unwrap();
    assert_eq!(second.loads, 1);
    let pet = components.dereferenced::<Schema>("Pet").unwrap();
    let tag = pet.properties["tag"].as_value().unwrap();
    assert_eq!(tag.schema_type.as_deref(), Some("string"));
}

/// Stores loaded entities under the last segment of their fragment.
struct FragmentKeys(StubLoader);

#[async_trait]
impl ExternalLoader for FragmentKeys {
    async fn load<T: Component>(
        &self,
        reference: &ExternalReference,
    ) -> Result<(T, Components), DerefError> {
        self.0.load::<T>(reference).await
    }

    fn component_key<T: Component>(
        &self,
        reference: &ExternalReference,
    ) -> Result<ComponentKey, DerefError> {
        let fragment = reference.fragment.as_deref().unwrap_or_default();
        ComponentKey::new(fragment.rsplit('/').next().unwrap_or_default())
    }
}

#[test(tokio::test)]
async fn test_loader_chooses_component_keys() {
    let loader = FragmentKeys(StubLoader::new().serve(NOT_FOUND, json!({"description": "gone"})));
    let mut components = Components::new();
    components.insert::<Response>(key("Missing"), external::<Response>(NOT_FOUND));

    components.externally_dereference(&loader).await.unwrap();
    assert_eq!(
        components.get::<Response>("Missing"),
        Some(&local::<Response>("NotFound"))
    );

    let keys: Vec<&str> = components.responses.keys().map(ComponentKey::as_str).collect();
    assert_eq!(keys, vec!["Missing", "NotFound"]);
}

#[test(tokio::test)]
async fn test_key_taken_by_local_component_collides() {
    let other = "https://pets.example/errors.yaml#/Other";
    let loader = FragmentKeys(StubLoader::new().serve(other, json!({"description": "gone"})));
    let mut components = Components::new();
    components.insert(key("Other"), Response::new("local"));
    components.insert::<Response>(key("Missing"), external::<Response>(other));
    let before = components.clone();

    let err = components.externally_dereference(&loader).await.unwrap_err();
    assert_eq!(loader.0.started(), vec![other]);
    let collision = err.as_collision().expect("collision error");
    assert_eq!(collision.kind, ComponentKind::Responses);
    assert_eq!(collision.key.as_str(), "Other");
    assert_eq!(collision.existing, json!({"description": "local"}));
    assert_eq!(collision.incoming, json!({"description": "gone"}));
    assert_eq!(components, before);
}

#[test(tokio::test)]
async fn test_sanitized_key_clash_across_passes_collides() {
    let nested = "https://x.example/a/b.json";
    let flat = "https://x.example/a_b.json";
    let loader = StubLoader::new()
        .serve(nested, json!({"type": "string"}))
        .serve(flat, json!({"type": "integer"}));
    let mut components = Components::new();
    components.insert::<Schema>(key("A"), external::<Schema>(nested));
    components.externally_dereference(&loader).await.unwrap();
    let loaded = key("https_x.example_a_b.json");
    assert_eq!(
        components.origin::<Schema>(&loaded),
        Some(&ExternalReference::new(nested, None))
    );

    components.insert::<Schema>(key("C"), external::<Schema>(flat));
    let before = components.clone();
    let err = components.externally_dereference(&loader).await.unwrap_err();
    assert_eq!(loader.started(), vec![nested, flat]);
    let collision = err.as_collision().expect("collision error");
    assert_eq!(collision.key, loaded);
    assert_eq!(collision.existing, json!({"type": "string"}));
    assert_eq!(collision.incoming, json!({"type": "integer"}));
    assert_eq!(components, before);
}

#[test(tokio::test)]
async fn test_overwritten_component_forgets_its_origin() {
    let loader = StubLoader::new().serve(PET, json!({"type": "object"}));
    let mut components = Components::new();
    components.insert::<Schema>(key("Pet"), external::<Schema>(PET));
    components.externally_dereference(&loader).await.unwrap();

    let loaded = key("https_pets.example_pet.json_Pet");
    components.insert(loaded.clone(), Schema::typed("string"));
    assert_eq!(components.origin::<Schema>(&loaded), None);

    components.insert::<Schema>(key("Pet"), external::<Schema>(PET));
    let err = components.externally_dereference(&loader).await.unwrap_err();
    assert_eq!(err.as_collision().map(|c| c.key.clone()), Some(loaded));
}
