//! Mapping raw user column names onto catalog columns.
//!
//! User data tends to use loose names (`language`, `Form`, `id`) where the
//! schema has canonical ones (`Language_ID`, `Form`, `ID`). A raw name is
//! tried in three spellings: verbatim, capitalized and upper-cased. A
//! dictionary column matches, in order of precedence:
//!
//! 1. when a spelling is the column's key (`id` -> `ID`),
//! 2. when a spelling equals the column's semantic handle, i.e. the fragment
//!    of its property URL (`primaryText` -> `Primary_Text`),
//! 3. when a spelling equals the semantic handle without its `Reference`
//!    suffix (`language` -> `Language_ID`, handle `languageReference`).
//!
//! Within a level the first spelling wins, then the first column in
//! dictionary order.

use crate::catalog::ColumnDictionary;
use crate::schema::ColumnSpec;

const REFERENCE_SUFFIX: &str = "Reference";

/// Upper-case the first character and lower-case the rest (`lANG` -> `Lang`).
pub fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// The spellings a raw column name is tried in: verbatim, capitalized, upper.
pub fn name_variants(raw: &str) -> [String; 3] {
    [raw.to_string(), capitalize(raw), raw.to_uppercase()]
}

/// Resolve `raw` against `dictionary`, or `None` if no column matches.
pub fn resolve_column<'a>(raw: &str, dictionary: &'a ColumnDictionary) -> Option<&'a ColumnSpec> {
    let variants = name_variants(raw);

    if let Some(column) = variants.iter().find_map(|v| dictionary.get(v)) {
        return Some(column);
    }

    let handle_match = dictionary.values().find(|column| {
        column
            .semantic_handle()
            .is_some_and(|handle| variants.iter().any(|v| v == handle))
    });
    if handle_match.is_some() {
        return handle_match;
    }

    dictionary.values().find(|column| {
        column
            .semantic_handle()
            .and_then(|handle| handle.strip_suffix(REFERENCE_SUFFIX))
            .is_some_and(|stem| !stem.is_empty() && variants.iter().any(|v| v == stem))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaCatalog;
    use crate::schema::CLDF_TERMS;

    fn term(name: &str) -> String {
        format!("{}#{}", CLDF_TERMS, name)
    }

    fn dictionary(columns: Vec<ColumnSpec>) -> ColumnDictionary {
        columns.into_iter().map(|c| (c.name.clone(), c)).collect()
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("language"), "Language");
        assert_eq!(capitalize("lANGUAGE"), "Language");
        assert_eq!(capitalize("parameter_id"), "Parameter_id");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("élan"), "Élan");
    }

    #[test]
    fn test_variants_order() {
        assert_eq!(name_variants("id"), ["id", "Id", "ID"]);
    }

    #[test]
    fn test_direct_key_match() {
        let catalog = SchemaCatalog::bundled().unwrap();
        let forms = catalog.dictionary("forms").unwrap();

        assert_eq!(resolve_column("id", forms).unwrap().name, "ID");
        assert_eq!(resolve_column("form", forms).unwrap().name, "Form");
        assert_eq!(resolve_column("Form", forms).unwrap().name, "Form");
        assert_eq!(resolve_column("segments", forms).unwrap().name, "Segments");
        assert_eq!(resolve_column("value", forms).unwrap().name, "Value");
    }

    #[test]
    fn test_reference_match() {
        let catalog = SchemaCatalog::bundled().unwrap();
        let forms = catalog.dictionary("forms").unwrap();

        assert_eq!(resolve_column("language", forms).unwrap().name, "Language_ID");
        assert_eq!(resolve_column("parameter", forms).unwrap().name, "Parameter_ID");
        assert_eq!(resolve_column("Language", forms).unwrap().name, "Language_ID");
    }

    #[test]
    fn test_handle_match() {
        let catalog = SchemaCatalog::bundled().unwrap();
        let examples = catalog.dictionary("examples").unwrap();

        assert_eq!(
            resolve_column("primaryText", examples).unwrap().name,
            "Primary_Text"
        );
        assert_eq!(
            resolve_column("metaLanguage", examples).unwrap().name,
            "Meta_Language_ID"
        );
    }

    #[test]
    fn test_no_match() {
        let catalog = SchemaCatalog::bundled().unwrap();
        let forms = catalog.dictionary("forms").unwrap();

        assert!(resolve_column("arbitrary", forms).is_none());
        assert!(resolve_column("lang", forms).is_none());
        assert!(resolve_column("", forms).is_none());
        // Matching is on whole spellings only.
        assert!(resolve_column("languagereference", forms).is_none());
    }

    #[test]
    fn test_direct_key_beats_handle() {
        // `Gloss` is a key; another column claims `gloss` as its handle.
        let dict = dictionary(vec![
            ColumnSpec::new("Interlinear").with_property_url(term("gloss")),
            ColumnSpec::new("Gloss").with_property_url(term("comment")),
        ]);
        assert_eq!(resolve_column("gloss", &dict).unwrap().name, "Gloss");
    }

    #[test]
    fn test_handle_beats_reference_stem() {
        let dict = dictionary(vec![
            ColumnSpec::new("Language_ID").with_property_url(term("languageReference")),
            ColumnSpec::new("Lect").with_property_url(term("language")),
        ]);
        assert_eq!(resolve_column("language", &dict).unwrap().name, "Lect");
    }

    #[test]
    fn test_first_column_wins_within_level() {
        let dict = dictionary(vec![
            ColumnSpec::new("Target_Form_ID").with_property_url(term("formReference")),
            ColumnSpec::new("Form_ID").with_property_url(term("formReference")),
        ]);
        assert_eq!(resolve_column("form", &dict).unwrap().name, "Target_Form_ID");
    }

    #[test]
    fn test_verbatim_spelling_wins_over_upper() {
        let dict = dictionary(vec![ColumnSpec::new("ID"), ColumnSpec::new("Id")]);
        assert_eq!(resolve_column("id", &dict).unwrap().name, "Id");
    }

    #[test]
    fn test_columns_without_property_url() {
        let dict = dictionary(vec![
            ColumnSpec::new("Notes"),
            ColumnSpec::new("Broken").with_property_url("no-fragment"),
        ]);
        assert_eq!(resolve_column("notes", &dict).unwrap().name, "Notes");
        assert!(resolve_column("fragment", &dict).is_none());
    }

    #[test]
    fn test_bare_reference_handle_does_not_match_empty_name() {
        let dict = dictionary(vec![ColumnSpec::new("Ref").with_property_url(term("Reference"))]);
        assert!(resolve_column("", &dict).is_none());
    }

    #[test]
    fn test_general_dictionary() {
        let catalog = SchemaCatalog::bundled().unwrap();
        let general = catalog.general();

        assert_eq!(resolve_column("parameter", general).unwrap().name, "Parameter_ID");
        assert_eq!(resolve_column("glottocode", general).unwrap().name, "Glottocode");
        assert_eq!(resolve_column("headword", general).unwrap().name, "Headword");
    }
}
