//! Conformance fixtures: modules and the issues the shared catalog reports.

use varlint_kernel::Catalog;
use varlint_testutil::conformance::{parse_conformance_tests, run_conformance_tests};

const CATALOG: &str = include_str!("../../../tests/conformance/catalog.toml");

const FIXTURES: &[(&str, &str)] = &[
    (
        "type.test",
        include_str!("../../../tests/conformance/type.test"),
    ),
    (
        "default.test",
        include_str!("../../../tests/conformance/default.test"),
    ),
    (
        "nullable.test",
        include_str!("../../../tests/conformance/nullable.test"),
    ),
];

#[test]
fn run_conformance_files() {
    let catalog = Catalog::from_toml(CATALOG).unwrap();

    for (file, content) in FIXTURES {
        let cases = parse_conformance_tests(content);
        assert!(!cases.is_empty(), "{file} has no cases");

        let summary = run_conformance_tests(&cases, &catalog);
        println!("{file}:{summary}");
        assert!(summary.all_passed(), "{file} failed\n{summary}");
    }
}
