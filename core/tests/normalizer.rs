use zapcampanhas_core::{
    config::{EngineConfig, NeighborhoodEntry},
    normalizer::{
        clean_phone, extract_first_name, has_campaign_tag, is_placeholder_name,
        normalize_neighborhood, NeighborhoodTable, NEIGHBORHOOD_VARIANTS,
    },
};

// ── Phones ───────────────────────────────────────────────────────────────────

#[test]
fn phone_formats_collapse_to_international_digits() {
    assert_eq!(clean_phone("(11)99999-0001"), "5511999990001");
    assert_eq!(clean_phone("+55 (11) 99999-0001"), "5511999990001");
    assert_eq!(clean_phone("011 99999-0001"), "5511999990001");
    assert_eq!(clean_phone("5511999990001"), "5511999990001");
    // 10-digit landline keeps its shape
    assert_eq!(clean_phone("19 3867-1234"), "1938671234");
}

#[test]
fn unusable_phones_are_rejected() {
    assert_eq!(clean_phone("00000000"), "");
    assert_eq!(clean_phone("0000000000"), "");
    assert_eq!(clean_phone("123"), "");
    assert_eq!(clean_phone(""), "");
    assert_eq!(clean_phone("sem telefone"), "");
    assert_eq!(clean_phone("000123456789"), "");
    assert_eq!(clean_phone("1234567890123456"), "");
}

#[test]
fn phone_cleaning_is_idempotent() {
    let samples = [
        "(11)99999-0001",
        "011999990001",
        "0012345678901",
        "19 3867-1234",
        "5511999990001",
        "+1 415 555 0100",
        "123",
        "0000000000",
        "12345678901234",
        "abc 9 8 7 6 5 4 3 2 1 0 9",
    ];
    for raw in samples {
        let once = clean_phone(raw);
        assert_eq!(clean_phone(&once), once, "not idempotent for {raw:?}");
    }
}

#[test]
fn cleaned_phones_are_empty_or_ten_to_fifteen_digits() {
    for raw in ["(11)99999-0001", "0012345678901", "123456789012345", "99"] {
        let cleaned = clean_phone(raw);
        assert!(
            cleaned.is_empty() || (10..=15).contains(&cleaned.len()),
            "{raw:?} -> {cleaned:?}"
        );
        assert!(cleaned.chars().all(|c| c.is_ascii_digit()));
    }
}

// ── Names ────────────────────────────────────────────────────────────────────

#[test]
fn first_name_skips_campaign_tag() {
    assert_eq!(extract_first_name("LT_01 Maria Silva"), "Maria");
    assert_eq!(extract_first_name("LT_07 João"), "João");
    assert_eq!(extract_first_name("João Souza"), "João");
    assert_eq!(extract_first_name("  Ana  "), "Ana");
}

#[test]
fn placeholder_names_yield_empty() {
    assert_eq!(extract_first_name("-"), "");
    assert_eq!(extract_first_name("???????"), "");
    assert_eq!(extract_first_name("NULL"), "");
    assert_eq!(extract_first_name(""), "");
    assert_eq!(extract_first_name("LT_01"), "");
    assert_eq!(extract_first_name("LT_01 -"), "");
    assert_eq!(extract_first_name("LT_01Maria"), "");
    assert_eq!(extract_first_name("LT_01Maria Silva"), "Silva");
    assert!(is_placeholder_name("nan"));
    assert!(is_placeholder_name("  "));
    assert!(!is_placeholder_name("Nando"));
}

#[test]
fn campaign_tag_detection() {
    assert!(has_campaign_tag("LT_01 Maria"));
    assert!(has_campaign_tag("LT_12"));
    assert!(has_campaign_tag("LT_01Maria"));
    assert!(!has_campaign_tag("LT_Maria"));
    assert!(!has_campaign_tag("Maria LT_01"));
}

// ── Neighborhoods ────────────────────────────────────────────────────────────

#[test]
fn variants_resolve_to_their_canonical() {
    assert_eq!(normalize_neighborhood("Fontanela"), "fontanella");
    assert_eq!(normalize_neighborhood("  JARDIM D. LUIZA "), "jardim dona luiza");
    assert_eq!(normalize_neighborhood("Chacara Primavera"), "chácara primavera");
    assert_eq!(normalize_neighborhood("Tamboré"), "tamboré");
    assert_eq!(normalize_neighborhood("Nova Jaguariúna"), "nova jaguariuna");
    assert_eq!(normalize_neighborhood("nova jaguariuna"), "nova jaguariuna");
}

#[test]
fn unknown_neighborhoods_are_trimmed_and_lowercased() {
    assert_eq!(normalize_neighborhood("  Vila Nova  "), "vila nova");
    assert_eq!(normalize_neighborhood(""), "");
}

#[test]
fn canonicalization_is_a_closure() {
    for (canonical, variants) in NEIGHBORHOOD_VARIANTS {
        for v in *variants {
            assert_eq!(
                normalize_neighborhood(v),
                normalize_neighborhood(canonical),
                "variant {v:?} of {canonical:?}"
            );
        }
    }
    let table = NeighborhoodTable::builtin();
    for (spelling, canonical) in table.pairs() {
        assert_eq!(table.normalize(spelling), table.normalize(canonical));
    }
}

#[test]
fn config_can_extend_the_table() {
    let config = EngineConfig {
        extra_neighborhoods: vec![NeighborhoodEntry {
            canonical: "Jardim Botânico".into(),
            variants:  vec!["jd botanico".into(), "botanico".into()],
        }],
        ..EngineConfig::default()
    };
    let table = config.neighborhood_table();
    assert_eq!(table.normalize("JD Botanico"), "jardim botânico");
    assert_eq!(table.normalize("fontanela"), "fontanella");
    assert!(table.len() > NeighborhoodTable::builtin().len());
}

#[test]
fn existing_spellings_keep_their_first_canonical() {
    let mut table = NeighborhoodTable::builtin();
    table.extend("outro centro", ["centro da cidade"]);
    assert_eq!(table.normalize("centro da cidade"), "centro");
}
