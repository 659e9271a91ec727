//! Integration tests for `habitual week`.
//!
//! The week command only resolves dates, so these run without any store.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_week_for_midweek_date() {
    let env = TestEnv::new();
    env.habitual()
        .args(["week", "--date", "2024-01-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""start":"2024-01-01""#))
        .stdout(predicate::str::contains(r#""end":"2024-01-07""#));
}

#[test]
fn test_week_for_sunday_belongs_to_previous_monday() {
    let env = TestEnv::new();
    env.habitual()
        .args(["week", "--date", "2024-01-07"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""start":"2024-01-01""#));
}

#[test]
fn test_iso_week_one_of_2021() {
    let env = TestEnv::new();
    env.habitual()
        .args(["week", "--week", "1", "--year", "2021", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ISO 2021-W01"))
        .stdout(predicate::str::contains("2021-01-04 → 2021-01-10"));
}

#[test]
fn test_iso_week_zero_is_rejected() {
    let env = TestEnv::new();
    env.habitual()
        .args(["week", "--week", "0", "--year", "2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_date_and_week_conflict() {
    let env = TestEnv::new();
    env.habitual()
        .args(["week", "--date", "2024-01-03", "--week", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_week_ignores_missing_credentials() {
    let env = TestEnv::with_config("store { database-id \"db\" }\n");
    env.habitual()
        .args(["week", "--date", "2024-02-29"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""start":"2024-02-26""#));
}
