use bizlookup_core::{classify, QueryKind, VatNumber, MIN_NAME_QUERY_CHARS};

const VAT_DIGITS: [&str; 4] = ["0400378485", "0417497106", "0202239951", "0000000000"];

#[test]
fn whitespace_anywhere_does_not_change_vat_classification() {
    for digits in VAT_DIGITS {
        let expected = QueryKind::VatNumber(VatNumber::parse(digits).unwrap());
        let spaced: String = digits
            .chars()
            .flat_map(|ch| [ch, ' '])
            .collect();
        for input in [
            digits.to_string(),
            format!("BE{digits}"),
            format!("be{digits}"),
            format!(" B E {spaced}"),
            format!("\n{digits}\t"),
        ] {
            assert_eq!(classify(&input), expected, "input {input:?}");
        }
    }
}

#[test]
fn normalized_vat_classifies_to_itself() {
    for digits in VAT_DIGITS {
        let QueryKind::VatNumber(vat) = classify(digits) else {
            panic!("{digits} should be a vat number");
        };
        assert_eq!(classify(vat.as_str()), QueryKind::VatNumber(vat.clone()));
        assert_eq!(vat.as_str().len(), 12);
        assert!(vat.as_str().starts_with("BE"));
    }
}

#[test]
fn near_miss_vat_inputs_become_name_queries() {
    for input in ["040037848", "04003784851", "NL0400378485", "BE04003784a5", "BEBE0400378485"] {
        assert_eq!(
            classify(input),
            QueryKind::NamePrefix(input.to_string()),
            "input {input:?}"
        );
    }
}

#[test]
fn suggestions_start_at_minimum_length() {
    let below: String = "x".repeat(MIN_NAME_QUERY_CHARS - 1);
    let at: String = "x".repeat(MIN_NAME_QUERY_CHARS);

    assert!(!classify(&below).wants_suggestions());
    assert!(classify(&at).wants_suggestions());
    assert!(classify(&format!("  {below}  ")).is_empty());
}
