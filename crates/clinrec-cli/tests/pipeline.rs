//! Integration tests for the command pipelines.

use std::fs;
use std::path::Path;

use clinrec_cli::config::{ClinrecConfig, Resources};
use clinrec_cli::pipeline::{check_code, hydrate_rows, parse_predicates, translate_code};
use clinrec_model::TranslationMode;
use tempfile::TempDir;

const GENDER_VS: &str = "http://hl7.org/fhir/ValueSet/administrative-gender";

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write fixture");
}

fn fixture(extra_config: &str) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let root = dir.path();
    write(
        root,
        "schemas.json",
        r#"[{
          "recordType": "Patient",
          "fields": [
            { "name": "gender", "kind": "code", "coded": true,
              "binding": "http://hl7.org/fhir/ValueSet/administrative-gender" },
            { "name": "birthDate", "kind": "date" }
          ]
        }]"#,
    );
    write(
        root,
        "predicates.json",
        r#"[{ "code": "birthdate", "kind": "date", "recordType": "Patient",
              "paths": ["Patient.birthDate"] }]"#,
    );
    write(
        root,
        "vocabularies.json",
        r#"[{ "url": "http://hl7.org/fhir/ValueSet/administrative-gender",
              "codes": { "http://hl7.org/fhir/administrative-gender": ["male", "female", "unknown"] } }]"#,
    );
    write(
        root,
        "translations.json",
        r#"[{ "id": "legacy-gender",
              "target": "http://hl7.org/fhir/ValueSet/administrative-gender",
              "entries": [
                { "sourceCode": "M", "targetCode": "male" },
                { "sourceCode": "F", "targetCode": "female" }
              ],
              "wildcard": { "targetCode": "unknown", "equivalence": "inexact" } }]"#,
    );
    write(
        root,
        "rows.csv",
        "_record_id,_path,_local_id,_parent_id,gender,birthDate\n\
         p1,Patient,1,,M,1985-05-01\n\
         p2,Patient,1,,F,1995-07-12\n\
         p3,Patient,1,,X,not-a-date\n\
         ,Patient,1,,M,1970-01-01\n",
    );
    write(
        root,
        "clinrec.toml",
        &format!(
            "[resources]\n\
             schemas = \"schemas.json\"\n\
             predicates = \"predicates.json\"\n\
             vocabularies = \"vocabularies.json\"\n\
             translations = \"translations.json\"\n\
             {extra_config}"
        ),
    );
    dir
}

fn resources(dir: &TempDir) -> Resources {
    let config = ClinrecConfig::load(&dir.path().join("clinrec.toml")).expect("config");
    Resources::load(&config).expect("resources")
}

#[test]
fn hydrates_filters_and_translates_rows() {
    let dir = fixture("");
    let resources = resources(&dir);
    let predicates =
        parse_predicates(&["birthdate:ge=1990-01-01".to_string()]).expect("predicates");

    let result = hydrate_rows(&resources, &dir.path().join("rows.csv"), "patient", &predicates)
        .expect("hydrate");
    assert_eq!(result.record_type, "Patient");
    assert_eq!(result.report.kept.len(), 1);
    assert_eq!(result.report.discarded[0].record_id, "p1");
    assert_eq!(result.report.failed[0].record_id, "p3");
    assert!(result.has_errors());
    assert_eq!(result.row_errors.len(), 1);

    insta::assert_json_snapshot!(result.documents_json().expect("json"), @r#"
    [
      {
        "birthDate": "1995-07-12",
        "gender": "female"
      }
    ]
    "#);
}

#[test]
fn hydration_options_come_from_the_config() {
    let dir = fixture("[hydration]\ntranslation = \"disabled\"\n");
    let resources = resources(&dir);
    assert_eq!(resources.hydration.translation, TranslationMode::Disabled);

    let result = hydrate_rows(&resources, &dir.path().join("rows.csv"), "Patient", &[])
        .expect("hydrate");
    let documents = result.documents_json().expect("json");
    assert_eq!(documents[0]["gender"], "M");
}

#[test]
fn checks_membership_and_translates_codes() {
    let dir = fixture("");
    let resources = resources(&dir);

    let valid = check_code(
        &resources,
        GENDER_VS,
        "http://hl7.org/fhir/administrative-gender|female",
    )
    .expect("check");
    assert!(valid.valid);
    assert_eq!(valid.matched_in.as_deref(), Some(GENDER_VS));

    let unknown = check_code(&resources, "http://example.org/vs/none", "male").expect("check");
    assert!(!unknown.valid);
    assert!(unknown.is_error());

    let male = translate_code(&resources, GENDER_VS, "M", false)
        .expect("translate")
        .expect("direct entry");
    assert_eq!(male.target_code, "male");

    let wildcard = translate_code(&resources, GENDER_VS, "X", true)
        .expect("translate")
        .expect("wildcard");
    assert!(wildcard.wildcard);
    assert!(
        translate_code(&resources, GENDER_VS, "X", false)
            .expect("translate")
            .is_none()
    );
}

#[test]
fn rejects_malformed_filters_and_unknown_record_types() {
    assert!(parse_predicates(&["=male".to_string()]).is_err());

    let dir = fixture("");
    let resources = resources(&dir);
    let error = hydrate_rows(&resources, &dir.path().join("rows.csv"), "Encounter", &[])
        .expect_err("unknown type");
    assert!(error.to_string().contains("Encounter"));
}
