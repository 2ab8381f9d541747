#![allow(missing_docs)]

use std::sync::Arc;

use clinrec_model::{Coding, Equivalence, TranslationEntry, TranslationTable, VocabularySet};
use clinrec_terminology::{
    CodeTranslator, InMemoryTranslationTables, InMemoryVocabularySets, TerminologyError,
    VocabularyValidator,
};

const GENDER: &str = "http://hl7.org/fhir/ValueSet/administrative-gender";
const GENDER_SYSTEM: &str = "http://hl7.org/fhir/administrative-gender";

fn gender_tables() -> CodeTranslator {
    let table = TranslationTable::new("legacy-gender", GENDER)
        .with_entry(TranslationEntry::new("M", "male"))
        .with_entry(TranslationEntry::new("F", "female"))
        .with_wildcard("unknown");
    CodeTranslator::new(Arc::new(InMemoryTranslationTables::new(vec![table])))
}

#[test]
fn translates_direct_entry_and_wildcard_for_bare_codes() {
    let translator = gender_tables();
    let tables = translator.tables_for(GENDER).expect("tables");
    assert_eq!(tables, vec!["legacy-gender".to_string()]);

    let male = translator
        .translate(&tables, None, "M", true)
        .expect("translate")
        .expect("direct entry");
    assert_eq!(male.target_code, "male");
    assert!(!male.wildcard);

    let unknown = translator
        .translate(&tables, None, "X", true)
        .expect("translate")
        .expect("wildcard entry");
    assert_eq!(unknown.target_code, "unknown");
    assert!(unknown.wildcard);

    let untouched = translator
        .translate(&tables, None, "X", false)
        .expect("translate");
    assert!(untouched.is_none());
}

#[test]
fn first_table_with_a_match_wins() {
    let mut narrow = TranslationTable::new("narrow", GENDER);
    let mut entry = TranslationEntry::new("U", "unknown");
    entry.equivalence = Equivalence::Unmatched;
    narrow.entries.push(entry);
    let mut wide = TranslationTable::new("wide", GENDER).with_entry(TranslationEntry::new("U", "other"));
    wide.source = Some("legacy".to_string());

    let translator = CodeTranslator::new(Arc::new(InMemoryTranslationTables::new(vec![
        narrow, wide,
    ])));
    let result = translator
        .translate_into(GENDER, None, "U", true)
        .expect("translate")
        .expect("second table");
    assert_eq!(result.table, "wide");
    assert_eq!(result.target_code, "other");
}

#[test]
fn source_system_is_respected_when_both_sides_carry_one() {
    let mut entry = TranslationEntry::new("1", "female");
    entry.source_system = Some("urn:legacy:sex".to_string());
    entry.target_system = Some(GENDER_SYSTEM.to_string());
    let table = TranslationTable::new("sex-codes", GENDER).with_entry(entry);
    let translator = CodeTranslator::new(Arc::new(InMemoryTranslationTables::new(vec![table])));

    let hit = translator
        .translate_into(GENDER, Some("urn:legacy:sex"), "1", false)
        .expect("translate");
    assert_eq!(
        hit.and_then(|result| result.target_system),
        Some(GENDER_SYSTEM.to_string())
    );
    let miss = translator
        .translate_into(GENDER, Some("urn:other"), "1", false)
        .expect("translate");
    assert!(miss.is_none());
    let no_system = translator
        .translate_into(GENDER, None, "1", false)
        .expect("translate");
    assert!(no_system.is_some());
}

#[test]
fn unknown_target_vocabulary_has_no_tables() {
    let translator = gender_tables();
    let result = translator
        .translate_into("http://example.org/other", None, "M", true)
        .expect("translate");
    assert!(result.is_none());
}

fn composed_sets() -> VocabularyValidator {
    let sets = InMemoryVocabularySets::new()
        .with(
            VocabularySet::new("http://example.org/vs/category")
                .including("http://example.org/vs/vitals")
                .including("http://example.org/vs/labs"),
        )
        .with(VocabularySet::new("http://example.org/vs/vitals").with_code(
            "http://terminology.hl7.org/CodeSystem/observation-category",
            "vital-signs",
        ))
        .with(
            VocabularySet::new("http://example.org/vs/labs")
                .with_code(
                    "http://terminology.hl7.org/CodeSystem/observation-category",
                    "laboratory",
                )
                .including("http://example.org/vs/missing"),
        );
    VocabularyValidator::new(Arc::new(sets))
}

#[test]
fn validates_direct_and_composed_membership() {
    let validator = composed_sets();
    let system = "http://terminology.hl7.org/CodeSystem/observation-category";

    let direct = validator
        .validate(
            "http://example.org/vs/vitals",
            &Coding::new(Some(system), "vital-signs"),
        )
        .expect("validate");
    assert!(direct.valid);
    assert_eq!(direct.matched_in.as_deref(), Some("http://example.org/vs/vitals"));

    let composed = validator
        .validate(
            "http://example.org/vs/category",
            &Coding::new(Some(system), "laboratory"),
        )
        .expect("validate");
    assert!(composed.valid);
    assert_eq!(composed.matched_in.as_deref(), Some("http://example.org/vs/labs"));

    let any_system = validator
        .validate("http://example.org/vs/category", &Coding::new(None, "vital-signs"))
        .expect("validate");
    assert!(any_system.valid);

    let wrong_system = validator
        .validate(
            "http://example.org/vs/category",
            &Coding::new(Some("http://other"), "vital-signs"),
        )
        .expect("validate");
    assert!(!wrong_system.valid);
}

#[test]
fn absent_code_reports_first_branch_error() {
    let validator = composed_sets();
    let result = validator
        .validate("http://example.org/vs/category", &Coding::new(None, "imaging"))
        .expect("validate");
    assert!(!result.valid);
    assert_eq!(
        result.message.as_deref(),
        Some("unknown vocabulary set 'http://example.org/vs/missing'")
    );
}

#[test]
fn unknown_vocabulary_is_invalid_not_an_error() {
    let validator = composed_sets();
    let result = validator
        .validate("http://example.org/vs/nope", &Coding::new(None, "x"))
        .expect("validate");
    assert!(!result.valid);
    assert!(result.is_error());
}

#[test]
fn circular_composition_is_an_error_for_any_code() {
    let sets = InMemoryVocabularySets::new()
        .with(VocabularySet::new("A").including("B").including("C"))
        .with(VocabularySet::new("B").including("A"))
        .with(VocabularySet::new("C").with_code("http://sys", "present"));
    let validator = VocabularyValidator::new(Arc::new(sets));

    for code in ["present", "absent"] {
        let error = validator
            .validate("A", &Coding::new(Some("http://sys"), code))
            .expect_err("cycle");
        assert!(error.is_cycle());
        assert!(matches!(
            &error,
            TerminologyError::VocabularyCycle { chain, .. } if chain == &["A", "B", "A"]
        ));
    }
}

#[test]
fn validate_any_accepts_first_member() {
    let validator = composed_sets();
    let codings = vec![
        Coding::new(None, "imaging"),
        Coding::new(None, "laboratory"),
    ];
    let result = validator
        .validate_any("http://example.org/vs/category", &codings)
        .expect("validate");
    assert!(result.valid);
}

#[test]
fn vocabulary_sets_load_from_json() {
    let json = r#"[
        {"url": "http://example.org/vs/yn", "codes": {"http://sys/yn": ["Y", "N"]}},
        {"url": "http://example.org/vs/ynu", "includes": ["http://example.org/vs/yn"],
         "codes": {"http://sys/yn": ["U"]}}
    ]"#;
    let sets: Vec<VocabularySet> = serde_json::from_str(json).expect("parse sets");
    let validator = VocabularyValidator::new(Arc::new(sets.into_iter().collect::<InMemoryVocabularySets>()));
    let result = validator
        .validate("http://example.org/vs/ynu", &Coding::new(Some("http://sys/yn"), "N"))
        .expect("validate");
    assert!(result.valid);
}

fn layered_diamonds(layers: usize) -> InMemoryVocabularySets {
    let mut sets = InMemoryVocabularySets::new();
    for layer in 0..layers {
        for side in ["a", "b"] {
            let mut set = VocabularySet::new(&format!("{side}{layer}"));
            if layer + 1 < layers {
                set = set
                    .including(&format!("a{}", layer + 1))
                    .including(&format!("b{}", layer + 1));
            } else if side == "b" {
                set = set.with_code("http://sys", "deep");
            }
            sets = sets.with(set);
        }
    }
    sets
}

#[test]
fn layered_diamonds_check_each_set_once() {
    let validator = VocabularyValidator::new(Arc::new(layered_diamonds(40)));

    let deep = validator
        .validate("a0", &Coding::new(Some("http://sys"), "deep"))
        .expect("acyclic");
    assert!(deep.valid);
    assert_eq!(deep.matched_in.as_deref(), Some("b39"));

    let absent = validator
        .validate("a0", &Coding::new(Some("http://sys"), "absent"))
        .expect("acyclic");
    assert!(!absent.valid);
    assert!(!absent.is_error());
}
