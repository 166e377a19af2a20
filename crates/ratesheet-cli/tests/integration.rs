//! Integration tests for ratesheet CLI
//!
//! These tests run whole files through the reader and the engine the way
//! the `parse` and `detect` commands do.

use std::fs;
use std::path::PathBuf;

use ratesheet_cli::{exit_status, parse_file, render_detection, render_report, SheetSelection};
use ratesheet_core::{Engine, LayoutOverride};
use ratesheet_model::{Orientation, Price};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_parse_csv_rate_sheet() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "Paradise Resort.csv",
        ",Jan,Feb,Mar\n2N/2pax,150,0,\n2N/4pax,280,,\n",
    );

    let engine = Engine::with_defaults();
    let outcomes = parse_file(
        &engine,
        &path,
        &SheetSelection::Default,
        &LayoutOverride::default(),
    )
    .unwrap();

    assert_eq!(outcomes.len(), 1);
    let data = &outcomes[0].data;
    assert_eq!(data.resort_name, "Paradise Resort");
    assert_eq!(data.pricing.len(), 4);
    assert!(data.pricing.iter().any(|r| r.price == Price::Amount(0.0)));
    assert_eq!(exit_status(&outcomes, true), 0);
}

#[test]
fn test_semicolon_csv_with_decimal_commas() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "Coral Bay Resort.csv",
        ";Jan;Feb\nGarden Villa;1.250,00;1.300,50\nBeach Suite;900,00;950,00\n",
    );

    let outcomes = parse_file(
        &Engine::with_defaults(),
        &path,
        &SheetSelection::All,
        &LayoutOverride::default(),
    )
    .unwrap();

    let prices: Vec<_> = outcomes[0]
        .data
        .pricing
        .iter()
        .map(|r| (r.accommodation_type.as_str(), r.price))
        .collect();
    assert!(prices.contains(&("Garden Villa", Price::Amount(1250.0))));
    assert!(prices.contains(&("Garden Villa", Price::Amount(1300.5))));
    assert!(prices.contains(&("Beach Suite", Price::Amount(900.0))));
}

#[test]
fn test_missing_name_blocks_import() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "Sheet1.csv", ",Jan,Feb\n2N/2pax,150,160\n");

    let outcomes = parse_file(
        &Engine::with_defaults(),
        &path,
        &SheetSelection::Default,
        &LayoutOverride::default(),
    )
    .unwrap();

    assert!(!outcomes[0].data.is_import_eligible());
    assert_eq!(exit_status(&outcomes, false), 2);
    assert!(render_report(&outcomes[0]).contains("critical[RESORT_NAME_MISSING]"));
}

#[test]
fn test_override_applied_to_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "Paradise Resort.csv", ",Jan,Feb\n2N/2pax,150,160\n");

    let overrides = LayoutOverride {
        orientation: Some(Orientation::MonthsInColumns),
        header_index: Some(0),
        default_accommodation_type: Some("Pool Villa".to_string()),
    };
    let outcomes = parse_file(&Engine::with_defaults(), &path, &SheetSelection::Default, &overrides)
        .unwrap();

    assert!(outcomes[0]
        .data
        .pricing
        .iter()
        .all(|r| r.accommodation_type == "Pool Villa"));
}

#[test]
fn test_detection_report() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "Paradise Resort.csv", ",Jan,Feb\nDeluxe Room,150,160\n");

    let outcomes = parse_file(
        &Engine::with_defaults(),
        &path,
        &SheetSelection::Default,
        &LayoutOverride::default(),
    )
    .unwrap();
    let text = render_detection("Paradise Resort", &outcomes[0].detection);

    assert!(text.starts_with("Sheet: Paradise Resort\n"));
    assert!(text.contains("Layout: months-in-columns"));
    assert!(text.contains("Headers: Jan, Feb"));
}

#[test]
fn test_unknown_sheet_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "rates.csv", ",Jan\nVilla,100\n");

    let err = parse_file(
        &Engine::with_defaults(),
        &path,
        &SheetSelection::Named("Summary".to_string()),
        &LayoutOverride::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("Summary"));
}

#[test]
fn test_missing_input_file() {
    let err = parse_file(
        &Engine::with_defaults(),
        std::path::Path::new("does-not-exist.xlsx"),
        &SheetSelection::Default,
        &LayoutOverride::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("Input file not found"));
}
