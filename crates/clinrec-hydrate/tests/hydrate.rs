#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::sync::Arc;

use clinrec_hydrate::{DiagnosticKind, HydrationError, Hydrator};
use clinrec_index::build_index;
use clinrec_model::{
    Coding, FieldDef, FieldType, HydrationOptions, PathIndex, Predicate, PredicateKind, RawRow,
    RecordSchema, TranslationEntry, TranslationMode, TranslationTable, Value, VocabularySet,
};
use clinrec_terminology::{InMemoryTranslationTables, InMemoryVocabularySets, TerminologyResolver};
use proptest::prelude::{prop, prop_assert_eq, proptest};

const CATEGORY_VS: &str = "http://example.org/vs/observation-category";
const CATEGORY_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/observation-category";
const GENDER_VS: &str = "http://hl7.org/fhir/ValueSet/administrative-gender";

fn row(record: &str, path: &str, local: &str, parent: &str) -> RawRow {
    RawRow::new()
        .with("_record_id", record)
        .with("_path", path)
        .with("_local_id", local)
        .with("_parent_id", parent)
}

fn patient_schema() -> RecordSchema {
    RecordSchema::new(
        "Patient",
        vec![
            FieldDef::new("gender", FieldType::Code),
            FieldDef::new("birthDate", FieldType::Date),
            FieldDef::composite(
                "contact",
                vec![
                    FieldDef::new("relationship", FieldType::String),
                    FieldDef::composite("name", vec![FieldDef::new("family", FieldType::String)]),
                ],
            )
            .array(),
        ],
    )
}

fn plain_hydrator(paths: PathIndex) -> Hydrator {
    Hydrator::new(Arc::new(paths), TerminologyResolver::empty())
}

#[test]
fn hydrates_a_flat_record_without_predicates() {
    let schema = RecordSchema::new("Patient", vec![FieldDef::new("gender", FieldType::String)]);
    let batch = build_index(vec![row("p1", "Patient", "1", "").with("gender", "male")]);
    let hydration = plain_hydrator(PathIndex::new())
        .hydrate(&schema, batch.record("p1").expect("record"), &[])
        .expect("hydrate");

    assert!(hydration.passed());
    assert!(hydration.diagnostics.is_empty());
    insta::assert_json_snapshot!(hydration.value, @r#"
    {
      "gender": "male"
    }
    "#);
}

#[test]
fn record_without_root_entry_is_empty_and_passes() {
    let batch = build_index(vec![row("p1", "Patient.name", "1", "").with("family", "Smith")]);
    let hydration = plain_hydrator(PathIndex::new())
        .hydrate(&patient_schema(), batch.record("p1").expect("record"), &[])
        .expect("hydrate");
    assert!(hydration.passed());
    assert_eq!(hydration.value, None);
    assert_eq!(hydration.into_document(), None);
}

fn category_hydrator(codes: &[&str]) -> Hydrator {
    let mut paths = PathIndex::new();
    paths.add_predicate("observation.category", "category", PredicateKind::Token);
    paths.bind_vocabulary("observation.category", CATEGORY_VS);

    let mut set = VocabularySet::new(CATEGORY_VS);
    for code in codes {
        set.add_code(CATEGORY_SYSTEM, code);
    }
    let resolver = TerminologyResolver::new(
        Arc::new(InMemoryVocabularySets::new().with(set)),
        Arc::new(InMemoryTranslationTables::default()),
    );
    Hydrator::new(Arc::new(paths), resolver)
}

fn category_rows() -> Vec<RawRow> {
    vec![
        row("o1", "Observation", "1", "").with("status", "final"),
        row("o1", "Observation.category", "1", "")
            .with("system", CATEGORY_SYSTEM)
            .with("code", "vital-signs"),
        row("o1", "Observation.category", "2", "")
            .with("system", CATEGORY_SYSTEM)
            .with("code", "laboratory"),
    ]
}

#[test]
fn array_passes_when_any_element_is_in_the_vocabulary() {
    let schema = RecordSchema::new(
        "Observation",
        vec![
            FieldDef::new("status", FieldType::Code),
            FieldDef::new("category", FieldType::Coding).array(),
        ],
    );
    let batch = build_index(category_rows());
    let index = batch.record("o1").expect("record");
    let predicates = [Predicate::new("category", "any")];

    let hydration = category_hydrator(&["vital-signs"])
        .hydrate(&schema, index, &predicates)
        .expect("hydrate");
    assert!(hydration.passed());
    let value = hydration.value.expect("value");
    let categories = value
        .get("category")
        .and_then(Value::as_array)
        .expect("category array");
    assert_eq!(categories.len(), 2);

    let hydration = category_hydrator(&["social-history"])
        .hydrate(&schema, index, &predicates)
        .expect("hydrate");
    assert!(!hydration.passed());
}

#[test]
fn composite_array_keeps_every_element_and_passes_on_any() {
    let schema = RecordSchema::new(
        "Observation",
        vec![
            FieldDef::composite(
                "category",
                vec![
                    FieldDef::new("code", FieldType::Code),
                    FieldDef::new("text", FieldType::String),
                ],
            )
            .array(),
        ],
    );
    let batch = build_index(vec![
        row("o1", "Observation", "1", ""),
        row("o1", "Observation.category", "1", "")
            .with("code", "vital-signs")
            .with("text", "Vital Signs"),
        row("o1", "Observation.category", "2", "")
            .with("code", "laboratory")
            .with("text", "Laboratory"),
    ]);
    let index = batch.record("o1").expect("record");
    let predicates = [Predicate::new("category", "any")];

    let hydration = category_hydrator(&["vital-signs"])
        .hydrate(&schema, index, &predicates)
        .expect("hydrate");
    assert!(hydration.passed());
    insta::assert_json_snapshot!(hydration.value, @r#"
    {
      "category": [
        {
          "code": "vital-signs",
          "text": "Vital Signs"
        },
        {
          "code": "laboratory",
          "text": "Laboratory"
        }
      ]
    }
    "#);

    let hydration = category_hydrator(&[])
        .hydrate(&schema, index, &predicates)
        .expect("hydrate");
    assert!(!hydration.passed());
    assert!(hydration.outcome.reason.contains("no element passed"));
    let value = hydration.value.expect("value");
    let categories = value.get("category").and_then(Value::as_array).expect("array");
    assert_eq!(categories.len(), 2);
}

fn birthdate_rows() -> Vec<RawRow> {
    vec![
        row("p1", "Patient", "1", "").with("birthDate", "1985-05-01"),
        row("p2", "Patient", "1", "").with("birthDate", "1995-07-12"),
        row("p3", "Patient", "1", "").with("birthDate", "yesterday"),
    ]
}

fn birthdate_paths() -> PathIndex {
    let mut paths = PathIndex::new();
    paths.add_predicate("patient.birthdate", "birthdate", PredicateKind::Date);
    paths
}

#[test]
fn batch_sorts_records_and_isolates_type_errors() {
    let hydrator = plain_hydrator(birthdate_paths());
    let batch = build_index(birthdate_rows());
    let predicates = [Predicate::new("birthdate", "1990-01-01").with_modifier("ge")];

    let report = hydrator
        .hydrate_batch(&patient_schema(), &batch, &predicates)
        .expect("batch");
    assert_eq!(report.total(), 3);
    assert_eq!(
        report.kept.iter().map(|h| h.record_id.as_str()).collect::<Vec<_>>(),
        vec!["p2"]
    );
    assert_eq!(report.discarded[0].record_id, "p1");
    assert!(!report.discarded[0].outcome.passed);

    assert!(report.has_failures());
    let failure = &report.failed[0];
    assert_eq!(failure.record_id, "p3");
    assert!(matches!(failure.error, HydrationError::Type { kind: "date", .. }));
    assert_eq!(failure.error.path(), Some("patient.birthdate"));
    assert_eq!(report.documents().count(), 1);
}

#[test]
fn batch_rejects_unusable_predicates_up_front() {
    let hydrator = plain_hydrator(birthdate_paths());
    let batch = build_index(birthdate_rows());
    let predicates = [Predicate::new("birthdate", "1990-01-01").with_modifier("sa")];
    let error = hydrator
        .hydrate_batch(&patient_schema(), &batch, &predicates)
        .expect_err("config error");
    assert!(matches!(error, HydrationError::Filter(ref e) if e.is_config_error()));
}

#[test]
fn failed_direct_attribute_short_circuits_nested_composites() {
    let mut paths = PathIndex::new();
    paths.add_predicate("patient.gender", "gender", PredicateKind::Token);
    let hydrator = plain_hydrator(paths);
    let rows = |record: &str, gender: &str| {
        vec![
            row(record, "Patient", "1", "").with("gender", gender),
            row(record, "Patient.contact", "c1", "1").with("relationship", "spouse"),
            row(record, "Patient.contact.name", "n1", "c1").with("family", "Jansen"),
        ]
    };
    let predicates = [Predicate::new("gender", "female")];

    let batch = build_index(rows("p1", "female"));
    let kept = hydrator
        .hydrate(&patient_schema(), batch.record("p1").expect("record"), &predicates)
        .expect("hydrate");
    assert!(kept.passed());
    insta::assert_json_snapshot!(kept.value, @r#"
    {
      "contact": [
        {
          "name": {
            "family": "Jansen"
          },
          "relationship": "spouse"
        }
      ],
      "gender": "female"
    }
    "#);

    let batch = build_index(rows("p2", "male"));
    let dropped = hydrator
        .hydrate(&patient_schema(), batch.record("p2").expect("record"), &predicates)
        .expect("hydrate");
    assert!(!dropped.passed());
    let value = dropped.value.expect("partial value");
    assert_eq!(value.get("gender"), Some(&Value::Code("male".to_string())));
    assert_eq!(value.get("contact"), None);
}

#[test]
fn failed_leaf_stops_later_leaves_from_being_coerced() {
    let schema = RecordSchema::new(
        "Patient",
        vec![
            FieldDef::new("gender", FieldType::String),
            FieldDef::new("count", FieldType::Integer),
        ],
    );
    let mut paths = PathIndex::new();
    paths.add_predicate("patient.gender", "gender", PredicateKind::String);
    let batch = build_index(vec![
        row("p1", "Patient", "1", "")
            .with("gender", "male")
            .with("count", "many"),
    ]);

    let hydration = plain_hydrator(paths)
        .hydrate(
            &schema,
            batch.record("p1").expect("record"),
            &[Predicate::new("gender", "female")],
        )
        .expect("filtered out, not failed");
    assert!(!hydration.passed());
    let value = hydration.value.expect("partial value");
    assert_eq!(value.get("count"), None);
}

#[test]
fn sibling_array_elements_keep_their_own_chained_values() {
    let schema = RecordSchema::new(
        "Patient",
        vec![
            FieldDef::composite("name", vec![FieldDef::new("given", FieldType::String).array()])
                .array(),
        ],
    );
    let batch = build_index(vec![
        row("p1", "Patient", "1", ""),
        row("p1", "Patient.name", "1", "1").with("given[0]", "Ann"),
        row("p1", "Patient.name", "2", "1").with("given[0]", "Bob"),
    ]);
    let hydration = plain_hydrator(PathIndex::new())
        .hydrate(&schema, batch.record("p1").expect("record"), &[])
        .expect("hydrate");

    insta::assert_json_snapshot!(hydration.value, @r#"
    {
      "name": [
        {
          "given": [
            "Ann"
          ]
        },
        {
          "given": [
            "Bob"
          ]
        }
      ]
    }
    "#);
}

#[test]
fn composite_predicate_sees_direct_attributes() {
    let mut paths = PathIndex::new();
    paths.add_predicate("patient.contact", "contact-relationship", PredicateKind::String);
    let hydrator = plain_hydrator(paths);
    let batch = build_index(vec![
        row("p1", "Patient", "1", ""),
        row("p1", "Patient.contact", "c1", "1").with("relationship", "spouse"),
        row("p1", "Patient.contact.name", "n1", "c1").with("family", "Jansen"),
        row("p1", "Patient.contact", "c2", "1").with("relationship", "sibling"),
    ]);
    let index = batch.record("p1").expect("record");

    let hydration = hydrator
        .hydrate(&patient_schema(), index, &[Predicate::new("contact-relationship", "sib")])
        .expect("hydrate");
    assert!(hydration.passed());
    let value = hydration.value.expect("value");
    let contacts = value.get("contact").and_then(Value::as_array).expect("contacts");
    assert_eq!(contacts.len(), 2);
    // The first contact failed its own predicate, so its name was never populated.
    assert_eq!(contacts[0].get("name"), None);
    assert_eq!(contacts[1].get("relationship"), Some(&Value::String("sibling".to_string())));
}

fn gender_hydrator(field_type: FieldType, options: HydrationOptions) -> (Hydrator, RecordSchema) {
    let mut paths = PathIndex::new();
    paths.bind_vocabulary("patient.gender", GENDER_VS);
    let table = TranslationTable::new("legacy-gender", GENDER_VS)
        .with_entry(TranslationEntry::new("M", "male"))
        .with_wildcard("unknown");
    let resolver = TerminologyResolver::new(
        Arc::new(InMemoryVocabularySets::new()),
        Arc::new(InMemoryTranslationTables::new(vec![table])),
    );
    let hydrator = Hydrator::new(Arc::new(paths), resolver).with_options(options);
    let schema = RecordSchema::new("Patient", vec![FieldDef::new("gender", field_type).coded()]);
    (hydrator, schema)
}

fn hydrated_gender(hydrator: &Hydrator, schema: &RecordSchema, raw: &str) -> Option<Value> {
    let batch = build_index(vec![row("p1", "Patient", "1", "").with("gender", raw)]);
    hydrator
        .hydrate(schema, batch.record("p1").expect("record"), &[])
        .expect("hydrate")
        .value
        .and_then(|value| value.get("gender").cloned())
}

#[test]
fn coded_leaves_are_translated_into_the_bound_vocabulary() {
    let (hydrator, schema) = gender_hydrator(FieldType::Code, HydrationOptions::default());
    assert_eq!(
        hydrated_gender(&hydrator, &schema, "M"),
        Some(Value::Code("male".to_string()))
    );
    assert_eq!(
        hydrated_gender(&hydrator, &schema, "X"),
        Some(Value::Code("unknown".to_string()))
    );

    let (hydrator, schema) = gender_hydrator(FieldType::String, HydrationOptions::default());
    assert_eq!(
        hydrated_gender(&hydrator, &schema, "M"),
        Some(Value::String("male".to_string()))
    );
    assert_eq!(
        hydrated_gender(&hydrator, &schema, "X"),
        Some(Value::String("X".to_string()))
    );

    let disabled = HydrationOptions::new().with_translation(TranslationMode::Disabled);
    let (hydrator, schema) = gender_hydrator(FieldType::Code, disabled);
    assert_eq!(
        hydrated_gender(&hydrator, &schema, "M"),
        Some(Value::Code("M".to_string()))
    );
}

#[test]
fn extra_entries_for_single_valued_fields_are_reported() {
    let schema = RecordSchema::new(
        "Patient",
        vec![FieldDef::composite(
            "maritalStatus",
            vec![FieldDef::new("text", FieldType::String)],
        )],
    );
    let batch = build_index(vec![
        row("p1", "Patient", "1", ""),
        row("p1", "Patient.maritalStatus", "m1", "1").with("text", "Married"),
        row("p1", "Patient.maritalStatus", "m2", "1").with("text", "Divorced"),
    ]);
    let hydration = plain_hydrator(PathIndex::new())
        .hydrate(&schema, batch.record("p1").expect("record"), &[])
        .expect("hydrate");

    let value = hydration.value.expect("value");
    let status = value.get("maritalStatus").expect("marital status");
    assert_eq!(status.get("text"), Some(&Value::String("Married".to_string())));
    assert_eq!(hydration.diagnostics.len(), 1);
    assert_eq!(hydration.diagnostics[0].kind, DiagnosticKind::ExtraEntries);
    assert_eq!(hydration.diagnostics[0].path, "patient.maritalstatus");
}

#[test]
fn extra_values_for_single_valued_leaves_are_reported() {
    let schema = RecordSchema::new(
        "Patient",
        vec![
            FieldDef::new("count", FieldType::Integer),
            FieldDef::new("maritalStatus", FieldType::Coding),
            FieldDef::new("weight", FieldType::Quantity),
        ],
    );
    let batch = build_index(vec![
        row("p1", "Patient", "1", ""),
        row("p1", "Patient.count", "c1", "1").with("count", "3"),
        row("p1", "Patient.count", "c2", "1").with("count", "many"),
        row("p1", "Patient.maritalStatus", "m1", "1").with("code", "M"),
        row("p1", "Patient.maritalStatus", "m2", "1").with("code", "S"),
        row("p1", "Patient.weight", "w1", "1").with("value", "70").with("unit", "kg"),
        row("p1", "Patient.weight", "w2", "1").with("value", "71").with("unit", "kg"),
    ]);
    let hydration = plain_hydrator(PathIndex::new())
        .hydrate(&schema, batch.record("p1").expect("record"), &[])
        .expect("extra values are dropped before coercion");

    let value = hydration.value.expect("value");
    assert_eq!(value.get("count"), Some(&Value::Integer(3)));
    assert_eq!(
        value.get("maritalStatus"),
        Some(&Value::Coding(Coding::new(None, "M")))
    );
    let paths: Vec<(&str, DiagnosticKind)> = hydration
        .diagnostics
        .iter()
        .map(|diagnostic| (diagnostic.path.as_str(), diagnostic.kind))
        .collect();
    assert_eq!(
        paths,
        vec![
            ("patient.count", DiagnosticKind::ExtraEntries),
            ("patient.maritalstatus", DiagnosticKind::ExtraEntries),
            ("patient.weight", DiagnosticKind::ExtraEntries),
        ]
    );
}

#[test]
fn each_path_and_parent_is_populated_once() {
    let schema = RecordSchema::new(
        "Patient",
        vec![
            FieldDef::new("gender", FieldType::Code),
            FieldDef::new("gender", FieldType::Integer),
        ],
    );
    let batch = build_index(vec![row("p1", "Patient", "1", "").with("gender", "male")]);
    let hydrator = plain_hydrator(PathIndex::new());
    let index = batch.record("p1").expect("record");

    // The duplicate definition would fail coercion if it were visited.
    let first = hydrator.hydrate(&schema, index, &[]).expect("hydrate");
    let second = hydrator.hydrate(&schema, index, &[]).expect("hydrate");
    assert_eq!(first, second);
    assert_eq!(
        first.value.and_then(|value| value.get("gender").cloned()),
        Some(Value::Code("male".to_string()))
    );
}

proptest! {
    #[test]
    fn flat_string_fields_survive_index_and_hydration(
        fields in prop::collection::btree_map("[a-z]{1,8}", "[A-Za-z0-9]{1,12}", 1..6)
    ) {
        let schema = RecordSchema::new(
            "Patient",
            fields
                .keys()
                .map(|name| FieldDef::new(name, FieldType::String))
                .collect(),
        );
        let mut raw = row("p1", "Patient", "1", "");
        for (name, value) in &fields {
            raw = raw.with(name, value);
        }
        let batch = build_index(vec![raw]);
        let hydration = plain_hydrator(PathIndex::new())
            .hydrate(&schema, batch.record("p1").expect("record"), &[])
            .expect("hydrate");

        let expected: BTreeMap<String, Value> = fields
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();
        prop_assert_eq!(hydration.value, Some(Value::Object(expected)));
    }
}
