use releve_core::{Outcome, Reconciler, StatementError, load_statement, write_statement};
use std::fs;
use std::path::PathBuf;

const DECEMBER: &str = r#"{
   "initial_amount": 1000.0,
   "final_amount": 1250.0,
   "transactions": [
      {"date": "2024-12-01", "label": "deposit", "amount": 300.0},
      {"date": "2024-12-05", "label": "fee", "amount": -50.0}
   ]
}"#;

fn write_fixture(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let p = dir.path().join(name);
    fs::write(&p, body).unwrap();
    p
}

#[test]
fn test_balanced_file_prints_success() {
    let dir = tempfile::tempdir().unwrap();
    let p = write_fixture(&dir, "releve.json", DECEMBER);

    let r = Reconciler::exact().reconcile_file(&p).unwrap();
    assert_eq!(r.outcome, Outcome::Balanced);
    assert_eq!(
        r.to_string(),
        "Le montant final est correct.\ncalculé : 1250.0 == observé : 1250.0"
    );
}

#[test]
fn test_unbalanced_file_prints_error_line() {
    let dir = tempfile::tempdir().unwrap();
    let body = DECEMBER.replace("\"final_amount\": 1250.0", "\"final_amount\": 1300.0");
    let p = write_fixture(&dir, "releve.json", &body);

    let r = Reconciler::exact().reconcile_file(&p).unwrap();
    assert_eq!(r.outcome, Outcome::Mismatch);
    assert_eq!(
        r.to_string(),
        "Erreur: le montant calculé est 1250.0, mais le montant final est 1300.0."
    );
}

/// Binary floats would drift here (0.1 + 0.2 != 0.3); decimals must not.
#[test]
fn test_cents_do_not_drift() {
    let dir = tempfile::tempdir().unwrap();
    let p = write_fixture(
        &dir,
        "cents.json",
        r#"{"initial_amount": 0.1, "final_amount": 0.6,
            "transactions": [
               {"date": "a", "label": "b", "amount": 0.2},
               {"date": "a", "label": "c", "amount": 0.3}
            ]}"#,
    );

    let r = Reconciler::exact().reconcile_file(&p).unwrap();
    assert!(r.is_balanced(), "{r}");
}

#[test]
fn test_missing_file_is_input_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = Reconciler::exact()
        .reconcile_file(dir.path().join("absent.json"))
        .unwrap_err();
    assert!(matches!(err, StatementError::InputNotFound(_)));
}

#[test]
fn test_missing_transactions_key_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = write_fixture(
        &dir,
        "partial.json",
        r#"{"initial_amount": 1000.0, "final_amount": 1250.0}"#,
    );

    let err = Reconciler::exact().reconcile_file(&p).unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(err, StatementError::Validation(_)));
}

#[test]
fn test_write_then_load_preserves_statement() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_fixture(&dir, "in.json", DECEMBER);
    let st = load_statement(&src).unwrap();

    let out = dir.path().join("nested").join("out.json");
    write_statement(&out, &st).unwrap();

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("{\n   \"initial_amount\": 1000.0,"));
    assert_eq!(load_statement(&out).unwrap(), st);
}

/// Mixed scales: the sum carries two decimals, the stated balance one.
#[test]
fn test_balanced_mixed_scales_print_final_amount_twice() {
    let dir = tempfile::tempdir().unwrap();
    let p = write_fixture(
        &dir,
        "scales.json",
        r#"{"initial_amount": 1000.25, "final_amount": 1250.5,
            "transactions": [{"date": "03/12", "label": "virement", "amount": 250.25}]}"#,
    );

    let r = Reconciler::exact().reconcile_file(&p).unwrap();
    assert_eq!(
        r.to_string(),
        "Le montant final est correct.\ncalculé : 1250.5 == observé : 1250.5"
    );
}

#[test]
fn test_balanced_integer_amounts_print_final_amount_twice() {
    let dir = tempfile::tempdir().unwrap();
    let p = write_fixture(
        &dir,
        "integers.json",
        r#"{"initial_amount": 1000, "final_amount": 1250.00,
            "transactions": [{"amount": 300}, {"amount": -50.0}]}"#,
    );

    let r = Reconciler::exact().reconcile_file(&p).unwrap();
    assert!(r.is_balanced());
    assert_eq!(
        r.to_string(),
        "Le montant final est correct.\ncalculé : 1250.0 == observé : 1250.0"
    );
}

#[test]
fn test_amount_overflow_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = write_fixture(
        &dir,
        "huge.json",
        r#"{"initial_amount": 79228162514264337593543950335,
            "final_amount": 0,
            "transactions": [{"date": "a", "label": "b", "amount": 1}]}"#,
    );

    let err = Reconciler::exact().reconcile_file(&p).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("amount overflow"));
}
