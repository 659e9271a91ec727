//! Integration tests for `habitual catalog` and config loading.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_builtin_catalog_when_config_has_no_habits() {
    let env = TestEnv::new();
    env.habitual()
        .args(["catalog", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("48 habit(s) from built-in catalog"))
        .stdout(predicate::str::contains("Teeth Brush"));
}

#[test]
fn test_config_habits_replace_builtin_catalog() {
    let env = TestEnv::with_config(
        r#"
habit "Reading" {
    target 7
    glyph "📖"
    unit "Pages"
}
habit "Fasting" {
    target 2
    unit "Days"
}
"#,
    );
    env.habitual()
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""count":2"#))
        .stdout(predicate::str::contains(r#""name":"Reading""#))
        .stdout(predicate::str::contains("Teeth Brush").not());
}

#[test]
fn test_duplicate_habit_names_are_rejected() {
    let env = TestEnv::with_config(
        r#"
habit "Reading" { target 7; }
habit "Reading" { target 3; }
"#,
    );
    env.habitual()
        .arg("catalog")
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate habit name"));
}

#[test]
fn test_negative_target_is_rejected() {
    let env = TestEnv::with_config("habit \"Reading\" { target -1; }\n");
    env.habitual()
        .arg("catalog")
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-negative"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let env = TestEnv::new();
    env.habitual()
        .args(["--config", "/nonexistent/habitual.kdl", "catalog"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
