#![allow(missing_docs)]

use clinrec_model::{
    FieldType, InMemoryPredicateIndex, InMemorySchemas, LookupError, PathIndex,
    PredicateDefinition, PredicateKind, RecordSchema,
};

const OBSERVATION: &str = r#"{
  "recordType": "Observation",
  "fields": [
    { "name": "status", "kind": "code", "coded": true,
      "binding": "http://hl7.org/fhir/ValueSet/observation-status" },
    { "name": "effectiveDateTime", "kind": "dateTime" },
    { "name": "category", "kind": "composite", "array": true, "fields": [
        { "name": "coding", "kind": "coding", "array": true },
        { "name": "text", "kind": "string" }
    ]}
  ]
}"#;

fn observation() -> RecordSchema {
    serde_json::from_str(OBSERVATION).expect("schema json")
}

#[test]
fn schema_json_uses_flattened_kind_tag() {
    let schema = observation();
    assert_eq!(schema.root_path(), "observation");
    assert_eq!(schema.fields.len(), 3);
    assert!(schema.fields[0].coded);
    assert_eq!(schema.fields[1].field_type, FieldType::DateTime);

    let category = &schema.fields[2];
    assert!(category.array);
    let children = category.field_type.composite_fields().expect("composite");
    assert_eq!(children[0].field_type, FieldType::Coding);

    let mut visited = Vec::new();
    schema.walk(|path, _| visited.push(path.to_string()));
    assert_eq!(
        visited,
        vec![
            "observation.status",
            "observation.effectivedatetime",
            "observation.category",
            "observation.category.coding",
            "observation.category.text",
        ]
    );
}

#[test]
fn builds_path_descriptors_from_providers() {
    let schemas = InMemorySchemas::new().with(observation());
    let predicates = InMemoryPredicateIndex::new(vec![
        PredicateDefinition::new("status", PredicateKind::Token, "Observation", &["Observation.status"]),
        PredicateDefinition::new(
            "date",
            PredicateKind::Date,
            "Observation",
            &["Observation.effectiveDateTime"],
        ),
        PredicateDefinition::new("birthdate", PredicateKind::Date, "Patient", &["Patient.birthDate"]),
    ]);

    let paths = PathIndex::build("observation", &schemas, &predicates).expect("path index");
    assert_eq!(
        paths.vocabulary("Observation.status"),
        Some("http://hl7.org/fhir/ValueSet/observation-status")
    );
    assert_eq!(
        paths.predicate_kind("observation.effectivedatetime", "DATE"),
        Some(PredicateKind::Date)
    );
    assert_eq!(paths.predicate_kind("patient.birthdate", "birthdate"), None);
    assert_eq!(paths.len(), 2);
}

#[test]
fn unknown_record_type_is_a_lookup_error() {
    let schemas = InMemorySchemas::new();
    let predicates = InMemoryPredicateIndex::default();
    let error = PathIndex::build("Encounter", &schemas, &predicates).expect_err("missing schema");
    assert!(matches!(error, LookupError::Unavailable { .. }));
    assert_eq!(error.resource(), "Encounter");
}
