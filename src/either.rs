//! The reference-or-value sum type.
//!
//! Every place in a document where "a reference OR an inline value" is legal is stored as an
//! [`Either`], almost always through the [`RefOr<T>`] alias.
//!
//! ## Decoding policy
//!
//! Decoding is discriminator first: an object carrying a `$ref` key is always decoded as a
//! reference, and only objects without one are decoded as inline values. A malformed reference
//! (wrong kind, bad component key, sibling keys) is reported as such instead of being retried as a
//! value.

use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::{components::Component, reference::Reference};

const REF_KEY: &str = "$ref";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Either<R, V> {
    Reference(R),
    Value(V),
}

/// A slot holding either a reference to a `T` or an inline `T`.
pub type RefOr<T> = Either<Reference<T>, T>;

impl<R, V> Either<R, V> {
    pub fn reference(reference: R) -> Self {
        Either::Reference(reference)
    }

    pub fn value(value: V) -> Self {
        Either::Value(value)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Either::Reference(_))
    }

    pub fn as_reference(&self) -> Option<&R> {
        match self {
            Either::Reference(reference) => Some(reference),
            Either::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&V> {
        match self {
            Either::Value(value) => Some(value),
            Either::Reference(_) => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            Either::Value(value) => Some(value),
            Either::Reference(_) => None,
        }
    }
}

impl<T> From<T> for RefOr<T> {
    fn from(value: T) -> Self {
        Either::Value(value)
    }
}

impl<T> From<Reference<T>> for RefOr<T> {
    fn from(reference: Reference<T>) -> Self {
        Either::Reference(reference)
    }
}

impl<'de, T: Component> Deserialize<'de> for RefOr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let payload = JsonValue::deserialize(deserializer)?;
        let is_reference = payload
            .as_object()
            .is_some_and(|object| object.contains_key(REF_KEY));
        if is_reference {
            Reference::<T>::deserialize(payload)
                .map(Either::Reference)
                .map_err(|err| D::Error::custom(format!("invalid {} reference: {err}", T::KIND)))
        } else {
            T::deserialize(payload)
                .map(Either::Value)
                .map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Example, Schema};
    use test_log::test;

    #[test]
    fn test_reference_shape_decodes_as_reference() {
        let slot: RefOr<Schema> =
            serde_json::from_str(r##"{"$ref": "#/components/schemas/Pet"}"##).unwrap();
        assert_eq!(slot, Either::reference(Reference::named("Pet").unwrap()));
    }

    #[test]
    fn test_other_shapes_decode_as_value() {
        let slot: RefOr<Schema> =
            serde_json::from_str(r#"{"type": "string", "description": "a name"}"#).unwrap();
        let schema = slot.as_value().expect("inline schema");
        assert_eq!(schema.schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_reference_with_siblings_is_not_a_reference() {
        let err = serde_json::from_str::<RefOr<Schema>>(
            r##"{"$ref": "#/components/schemas/Pet", "title": "Pet"}"##,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown field `title`"), "{err}");
    }

    #[test]
    fn test_wrong_kind_reference_reports_the_reference_error() {
        let err = serde_json::from_str::<RefOr<Schema>>(
            r##"{"$ref": "#/components/responses/Err"}"##,
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("invalid schemas reference"), "{err}");
        assert!(
            err.contains("points at responses, expected a reference to schemas"),
            "{err}"
        );
    }

    #[test]
    fn test_bad_component_key_is_not_decoded_as_value() {
        let slot: Result<RefOr<Example>, _> =
            serde_json::from_str(r##"{"$ref": "#/components/examples/not a key"}"##);
        assert!(slot.is_err());
        let slot: Result<RefOr<Example>, _> =
            serde_json::from_str(r##"{"$ref": "#/paths/~1pets"}"##);
        assert!(slot.unwrap_err().to_string().contains("outside of #/components"));
    }

    #[test]
    fn test_reference_never_equals_value() {
        let reference: RefOr<Example> = Either::reference(Reference::named("Ex").unwrap());
        let value: RefOr<Example> = Either::value(Example::default());
        assert_ne!(reference, value);
        assert!(reference.is_reference());
        assert!(value.as_reference().is_none());
    }

    #[test]
    fn test_encoding_writes_populated_case() {
        let reference: RefOr<Example> = Reference::named("Ex").unwrap().into();
        assert_eq!(
            serde_json::to_string(&reference).unwrap(),
            r##"{"$ref":"#/components/examples/Ex"}"##
        );
    }
}
