//! End-to-end tests for the extraction engine

use ratesheet_core::{Engine, LayoutOverride};
use ratesheet_model::{CellRange, Orientation, Price, RawWorksheet, Severity};

fn paradise() -> RawWorksheet {
    RawWorksheet::from_strings(
        "Paradise Resort",
        &[
            vec!["", "Jan", "Feb", "Mar"],
            vec!["2N/2pax", "150", "0", ""],
            vec!["2N/4pax", "280", "", ""],
        ],
    )
}

fn signature(sheet: &RawWorksheet) -> Vec<(String, String, Option<u32>, Option<u32>, Price)> {
    Engine::with_defaults()
        .parse(sheet)
        .data
        .pricing
        .into_iter()
        .map(|r| (r.month, r.accommodation_type, r.nights, r.pax, r.price))
        .collect()
}

#[test]
fn test_blank_period_scenario() {
    let outcome = Engine::with_defaults().parse(&paradise());
    let data = &outcome.data;

    assert_eq!(data.resort_name, "Paradise Resort");
    assert_eq!(data.pricing.len(), 4);
    assert!(data.pricing.iter().all(|r| r.month != "March"));

    let feb: Vec<_> = data.pricing.iter().filter(|r| r.month == "February").collect();
    assert_eq!(feb.len(), 2);
    assert_eq!(feb[0].pax, Some(2));
    assert_eq!(feb[0].price, Price::Amount(0.0));
    assert!(feb[0].is_available());
    assert_eq!(feb[1].pax, Some(4));
    assert_eq!(feb[1].price, Price::Unavailable);

    let warning = data
        .issues
        .iter()
        .find(|i| i.code == "PERIOD_NO_DATA")
        .expect("blank March reported");
    assert_eq!(warning.severity, Severity::Warning);
    assert!(data.issues.iter().all(|i| !i.is_critical()));
    assert!(data.is_import_eligible());
}

#[test]
fn test_orientation_does_not_change_records() {
    let sheet = paradise();
    let engine = Engine::with_defaults();
    let across = engine.parse(&sheet);
    let down = engine.parse(&sheet.transposed());

    assert_eq!(signature(&sheet), signature(&sheet.transposed()));
    assert_eq!(across.detection.orientation(), Some(Orientation::MonthsInColumns));
    assert_eq!(down.detection.orientation(), Some(Orientation::MonthsInRows));
    assert_eq!(across.detection.confidence, down.detection.confidence);
}

#[test]
fn test_orientation_invariance_with_types() {
    let sheet = RawWorksheet::from_strings(
        "Coral Bay Resort",
        &[
            vec!["", "Jan", "Feb", "Mar", "Apr"],
            vec!["Deluxe Room", "150", "160", "170", "180"],
            vec!["Family Suite", "250", "260", "", "280"],
            vec!["Overwater Villa", "450", "POA", "470", "480"],
        ],
    );
    assert_eq!(signature(&sheet), signature(&sheet.transposed()));
}

#[test]
fn test_merged_cell_fans_out() {
    let sheet = RawWorksheet::from_strings(
        "Paradise Resort",
        &[
            vec!["", "Jan", "Feb", "Mar", "Apr"],
            vec!["Garden Villa", "400", "", "", "420"],
        ],
    )
    .with_merge(CellRange::from_bounds(1, 1, 1, 3));

    let outcome = Engine::with_defaults().parse(&sheet);
    let records = &outcome.data.pricing;
    assert_eq!(records.len(), 4);
    let fanned: Vec<_> = records
        .iter()
        .filter(|r| r.price == Price::Amount(400.0))
        .map(|r| r.month.as_str())
        .collect();
    assert_eq!(fanned, vec!["January", "February", "March"]);
    assert!(!outcome.data.issues.iter().any(|i| i.code == "DUPLICATE_RECORD"));
}

#[test]
fn test_repeated_parse_is_byte_identical() {
    let sheet = RawWorksheet::from_strings(
        "Paradise Resort",
        &[
            vec!["", "Jan", "Feb", "Easter"],
            vec!["Deluxe Room", "150", "€160", "TBA"],
            vec!["Family Suite", "250", "260", "300"],
            vec!["", "", "", ""],
            vec!["Inclusions:", "", "", ""],
            vec!["• Breakfast\n• Transfers", "", "", ""],
        ],
    );
    let engine = Engine::with_defaults();
    let first = serde_json::to_string(&engine.parse(&sheet)).unwrap();
    let second = serde_json::to_string(&engine.parse(&sheet)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_name_is_single_critical() {
    let sheet = RawWorksheet::from_strings(
        "Sheet1",
        &[vec!["", "Jan", "Feb"], vec!["2N/2pax", "150", "160"]],
    );
    let outcome = Engine::with_defaults().parse(&sheet);
    let data = &outcome.data;

    assert_eq!(data.resort_name, "");
    assert_eq!(data.pricing.len(), 2);
    let critical: Vec<_> = data.issues.iter().filter(|i| i.is_critical()).collect();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].code, "RESORT_NAME_MISSING");
    assert!(!data.is_import_eligible());
}

#[test]
fn test_bullet_inclusions_through_engine() {
    let sheet = RawWorksheet::from_strings(
        "Paradise Resort",
        &[
            vec!["", "Jan", "Feb"],
            vec!["Deluxe Room", "150", "160"],
            vec!["", "", ""],
            vec!["Inclusions:", "", ""],
            vec!["• Breakfast\n• Transfers\n- \nTBC", "", ""],
        ],
    );
    let outcome = Engine::with_defaults().parse(&sheet);
    let data = &outcome.data;

    assert_eq!(data.inclusions, vec!["Breakfast", "Transfers"]);
    assert!(data.exclusions.is_none());
    assert_eq!(data.pricing.len(), 2);
    let infos = data
        .issues
        .iter()
        .filter(|i| i.code.starts_with("INCLUSION_"))
        .inspect(|i| assert_eq!(i.severity, Severity::Info))
        .count();
    assert_eq!(infos, 2);
    assert!(outcome.detection.inclusions_bounds.is_some());
}

#[test]
fn test_override_reparses_with_reviewer_choices() {
    let engine = Engine::with_defaults();
    let sheet = paradise();

    let detected = engine.parse(&sheet);
    assert!(detected
        .data
        .pricing
        .iter()
        .all(|r| r.accommodation_type == "Standard"));

    let overrides = LayoutOverride {
        orientation: Some(Orientation::MonthsInColumns),
        header_index: Some(0),
        default_accommodation_type: Some("Garden Room".to_string()),
    };
    let corrected = engine.parse_with_override(&sheet, &overrides);
    assert_eq!(corrected.data.pricing.len(), detected.data.pricing.len());
    assert!(corrected
        .data
        .pricing
        .iter()
        .all(|r| r.accommodation_type == "Garden Room"));
    assert!(!corrected.data.issues.iter().any(|i| i.code == "OVERRIDE_IGNORED"));
}

#[test]
fn test_no_layout_still_reports() {
    let sheet = RawWorksheet::from_strings(
        "Paradise Resort",
        &[vec!["Room", "Price"], vec!["Deluxe", "150"]],
    );
    let outcome = Engine::with_defaults().parse(&sheet);
    assert!(outcome.detection.primary.is_none());
    assert!(outcome.data.pricing.is_empty());
    let codes: Vec<_> = outcome.data.issues.iter().map(|i| i.code.as_str()).collect();
    assert!(codes.contains(&"LAYOUT_NOT_DETECTED"));
    assert!(codes.contains(&"NO_PRICING"));
    assert!(!outcome.data.is_import_eligible());
}

#[test]
fn test_duplicate_rows_keep_later_cell() {
    let sheet = RawWorksheet::from_strings(
        "Paradise Resort",
        &[
            vec!["", "Jan", "Feb"],
            vec!["Deluxe Room", "150", "160"],
            vec!["Deluxe Room", "155", "165"],
        ],
    );
    let outcome = Engine::with_defaults().parse(&sheet);
    let data = &outcome.data;

    let prices: Vec<_> = data.pricing.iter().map(|r| (r.month.as_str(), r.price)).collect();
    assert_eq!(
        prices,
        vec![("January", Price::Amount(155.0)), ("February", Price::Amount(165.0))]
    );

    let duplicates: Vec<_> = data
        .issues
        .iter()
        .filter(|i| i.code == "DUPLICATE_RECORD")
        .collect();
    assert_eq!(duplicates.len(), 2);
    assert!(duplicates.iter().all(|i| i.severity == Severity::Error));
    assert!(duplicates[0].message.contains("B2"));
    assert!(duplicates[0].message.contains("keeping B3"));
    assert!(data.is_import_eligible());
}

#[test]
fn test_low_confidence_layout_tags_every_record() {
    let sheet = RawWorksheet::from_strings(
        "Paradise Resort",
        &[
            vec!["", "Jan", "Feb", "Paradise", "Sunset", "Notes", "Remarks"],
            vec!["x", "150", "160", "170", "180", "190", "200"],
        ],
    );
    let outcome = Engine::with_defaults().parse(&sheet);
    assert!(outcome.detection.low_confidence);
    assert!(outcome.detection.confidence < 0.5);

    let tagged: Vec<_> = outcome
        .data
        .issues
        .iter()
        .filter(|i| i.code == "LOW_CONFIDENCE_RECORD")
        .collect();
    assert!(!outcome.data.pricing.is_empty());
    assert_eq!(tagged.len(), outcome.data.pricing.len());
    assert!(tagged.iter().all(|i| i.severity == Severity::Warning));
    assert!(tagged.iter().all(|i| i.location.as_ref().is_some_and(|l| l.cell.is_some())));
}

#[test]
fn test_cell_currencies_are_kept_per_cell() {
    let sheet = RawWorksheet::from_strings(
        "Paradise Resort",
        &[vec!["", "Jan", "Feb"], vec!["Deluxe Room", "€150", "$160"]],
    );
    let outcome = Engine::with_defaults().parse(&sheet);
    let data = &outcome.data;

    let currencies: Vec<_> = data
        .pricing
        .iter()
        .map(|r| (r.month.as_str(), r.currency.as_str()))
        .collect();
    assert_eq!(currencies, vec![("January", "EUR"), ("February", "USD")]);

    let mixed = data
        .issues
        .iter()
        .find(|i| i.code == "MIXED_CURRENCY")
        .expect("disagreeing cells reported");
    assert_eq!(mixed.severity, Severity::Warning);
    assert!(mixed.message.contains("EUR, USD"));
}

#[test]
fn test_agreeing_cell_currency_fills_unmarked_cells() {
    let sheet = RawWorksheet::from_strings(
        "Paradise Resort",
        &[vec!["", "Jan", "Feb"], vec!["Deluxe Room", "£150", "160"]],
    );
    let data = Engine::with_defaults().parse(&sheet).data;
    assert_eq!(data.metadata.currency, "GBP");
    assert!(data.pricing.iter().all(|r| r.currency == "GBP"));
    assert!(!data.issues.iter().any(|i| i.code == "MIXED_CURRENCY"));
}

#[test]
fn test_inverted_validity_window_is_unset() {
    let sheet = RawWorksheet::from_strings(
        "Paradise Resort",
        &[
            vec!["Paradise Resort", "", ""],
            vec!["Valid 2026-10-31 to 2025-11-01", "", ""],
            vec!["", "Jan", "Feb"],
            vec!["Deluxe Room", "150", "160"],
        ],
    );
    let data = Engine::with_defaults().parse(&sheet).data;

    assert!(data.metadata.valid_from.is_none());
    assert!(data.metadata.valid_to.is_none());
    let warning = data
        .issues
        .iter()
        .find(|i| i.code == "VALIDITY_UNRESOLVED")
        .expect("inverted window reported");
    assert_eq!(warning.severity, Severity::Warning);
    assert!(!data.issues.iter().any(|i| i.code == "INVALID_DATE_RANGE"));
    assert_eq!(data.pricing.len(), 2);
}
