//! Property-based tests for column resolution and row handling.
//!
//! # Testing Philosophy
//!
//! Property-based tests verify:
//! 1. **No panics**: Parsers never crash on any input
//! 2. **Determinism**: Resolving the same name always yields the same column
//! 3. **Invariants**: Row sets stay rectangular under every operation
//!
//! # Running Property Tests
//!
//! ```bash
//! # Run all property tests
//! cargo test -p cldfkit --test property_tests
//!
//! # Run with more cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p cldfkit --test property_tests
//! ```

use proptest::prelude::*;
use serde_json::Value;

use cldfkit::input::{Record, RowSet};
use cldfkit::resolve::{capitalize, name_variants, resolve_column};
use cldfkit::sources::{citation_key, parse_bibtex};
use cldfkit::SchemaCatalog;

// =============================================================================
// Test Strategies
// =============================================================================

/// Generate loose column names, as users write them
fn column_name_like() -> impl Strategy<Value = String> {
    prop_oneof![
        // Known vocabulary in various casings
        prop::sample::select(vec![
            "id", "ID", "Id", "form", "FORM", "language", "parameter", "name",
            "glottocode", "segments", "source", "primaryText", "latitude",
        ])
        .prop_map(str::to_string),
        // Snake-case words
        "[a-z]{1,10}(_[a-z]{1,8})?",
        // Anything ASCII
        "[a-zA-Z0-9_]{0,20}",
    ]
}

/// Generate records over a small shared key space so rows overlap
fn records() -> impl Strategy<Value = Vec<Record>> {
    let record = prop::collection::vec(("[a-e]", "[a-z]{0,5}"), 0..5).prop_map(|cells| {
        cells
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect::<Record>()
    });
    prop::collection::vec(record, 0..8)
}

// =============================================================================
// Resolution Tests
// =============================================================================

mod resolve_tests {
    use super::*;

    proptest! {
        /// Resolution is a pure function of the name and dictionary
        #[test]
        fn resolve_is_deterministic(raw in column_name_like()) {
            let catalog = SchemaCatalog::bundled().unwrap();
            let first = resolve_column(&raw, catalog.general()).map(|c| c.name.clone());
            let second = resolve_column(&raw, catalog.general()).map(|c| c.name.clone());
            prop_assert_eq!(first, second);
        }

        /// A canonical column name resolves to itself
        #[test]
        fn resolved_name_resolves_to_itself(raw in column_name_like()) {
            let catalog = SchemaCatalog::bundled().unwrap();
            if let Some(column) = resolve_column(&raw, catalog.general()) {
                let again = resolve_column(&column.name, catalog.general()).unwrap();
                prop_assert_eq!(&again.name, &column.name);
            }
        }

        /// Name variants are the verbatim, capitalized and upper-case spellings
        #[test]
        fn variants_in_order(raw in "[a-zA-Z_]{1,12}") {
            let [verbatim, capitalized, upper] = name_variants(&raw);
            prop_assert_eq!(verbatim, raw.clone());
            prop_assert_eq!(capitalized, capitalize(&raw));
            prop_assert_eq!(upper, raw.to_uppercase());
        }

        #[test]
        fn capitalize_shape(raw in "[a-zA-Z][a-zA-Z0-9_]{0,20}") {
            let result = capitalize(&raw);
            prop_assert_eq!(result.len(), raw.len());
            prop_assert!(result.chars().next().unwrap().is_ascii_uppercase());
            prop_assert!(!result.chars().skip(1).any(|c| c.is_ascii_uppercase()));
            prop_assert_eq!(capitalize(&result), result);
        }
    }
}

// =============================================================================
// Row Set Tests
// =============================================================================

mod rowset_tests {
    use super::*;

    proptest! {
        /// Every row holds every column, in column order
        #[test]
        fn rows_are_rectangular(input in records()) {
            let row_count = input.len();
            let rows = RowSet::from_records(input);
            prop_assert_eq!(rows.row_count(), row_count);
            for row in rows.rows() {
                let keys: Vec<&String> = row.keys().collect();
                let columns: Vec<&String> = rows.columns().iter().collect();
                prop_assert_eq!(keys, columns);
            }
        }

        /// Missing cells are filled with empty strings
        #[test]
        fn missing_cells_are_empty(input in records()) {
            let rows = RowSet::from_records(input.clone());
            for (record, row) in input.iter().zip(rows.rows()) {
                for column in rows.columns() {
                    if !record.contains_key(column) {
                        prop_assert_eq!(&row[column], &Value::String(String::new()));
                    }
                }
            }
        }

        /// Renaming never changes the shape of the row set
        #[test]
        fn rename_keeps_shape(input in records(), from in "[a-e]", to in "[a-g]") {
            let mut rows = RowSet::from_records(input);
            let before = rows.column_count();
            let renamed = rows.rename_column(&from, &to);
            prop_assert_eq!(rows.column_count(), before);
            if renamed {
                prop_assert!(rows.has_column(&to));
                for row in rows.rows() {
                    prop_assert!(row.contains_key(&to));
                }
            }
        }
    }
}

// =============================================================================
// Bibliography Tests
// =============================================================================

mod bibtex_tests {
    use super::*;

    proptest! {
        /// The parser returns an error rather than panicking
        #[test]
        fn parse_never_panics(text in "[@{}(),=\"a-z0-9 \n]{0,200}") {
            let _ = parse_bibtex(&text);
        }

        #[test]
        fn citation_key_strips_pages(key in "[a-z]{1,10}[0-9]{4}", pages in "[0-9]{1,3}(-[0-9]{1,3})?") {
            let reference = format!("{}[{}]", key, pages);
            prop_assert_eq!(citation_key(&reference), key.as_str());
            prop_assert_eq!(citation_key(&key), key.as_str());
        }
    }
}
