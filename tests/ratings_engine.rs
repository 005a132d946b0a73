//! Ratings Engine Integration Tests
//!
//! Tests for display ordering, band bucketing, and the summary scores.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use spectrums::catalog::Spectrum;
use spectrums::core::engine::{
    band_rows, join_rows, merge_defaults, sort_rows, sparkline, summarize,
};
use spectrums::core::{
    average_confidence, bucket, confidence_score, sensibility_score, sort_for_display,
    DefaultPolicy, NOT_COMPUTABLE,
};
use spectrums::domain::{Band, Confidence, DisplayRow, Ratings, DIVIDER_ID};

fn c(v: i64) -> Confidence {
    Confidence::clamped(v)
}

fn row(id: &str, text: &str, v: i64) -> DisplayRow {
    DisplayRow::statement(id, text, c(v))
}

fn rows_with(values: &[i64]) -> Vec<DisplayRow> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| row(&format!("s{}", i), &format!("statement {}", i), *v))
        .collect()
}

#[test]
fn test_sort_by_confidence_then_text() {
    let mut rows = vec![row("a", "x", 3), row("b", "y", 3), row("c", "z", 1)];
    sort_rows(&mut rows);

    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn test_sort_for_display_includes_divider() {
    let spectrum = Spectrum::new("demo", "Demo", "")
        .with_statement("a", "Alpha")
        .with_statement("b", "Beta");
    let ratings: Ratings = [("a", c(9)), ("b", c(2)), (DIVIDER_ID, c(7))]
        .into_iter()
        .collect();

    let rows = sort_for_display(&spectrum, &ratings);
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["b", DIVIDER_ID, "a"]);
    assert_eq!(sparkline(&rows), "2/9");
}

#[test]
fn test_scores_without_divider() {
    let rows = rows_with(&[0, 4, 5, 6, 10]);

    assert_eq!(confidence_score(&rows), Some(50));
    assert_eq!(sensibility_score(&rows), Some(80));

    // 5 is excluded: (0 + 4 + 6 + 10) / 4
    let average = average_confidence(&rows).unwrap();
    assert_eq!(average.tenths, 50);
    assert_eq!(average.to_string(), "5");
    assert_eq!(average.as_f64(), 5.0);

    let fractional = average_confidence(&rows_with(&[6, 7])).unwrap();
    assert_eq!(fractional.to_string(), "6.5");
    assert_eq!(fractional.as_f64(), 6.5);
}

#[test]
fn test_divider_excluded_from_confidence() {
    let mut rows = rows_with(&[0, 10]);
    rows.push(DisplayRow::divider(c(10)));

    assert_eq!(confidence_score(&rows), Some(50));
    // Nothing is strictly above a divider at 10
    assert_eq!(sensibility_score(&rows), Some(0));
}

#[test]
fn test_divider_confidence_not_counted() {
    let rows = vec![DisplayRow::divider(c(5)), row("a", "A", 8), row("b", "B", 2)];
    assert_eq!(confidence_score(&rows), Some(50));
    assert_eq!(sensibility_score(&rows), Some(50));
}

#[test]
fn test_sensibility_uses_divider_threshold() {
    let mut rows = rows_with(&[2, 7, 8, 9]);
    rows.push(DisplayRow::divider(c(7)));

    assert_eq!(sensibility_score(&rows), Some(50));
}

#[test]
fn test_empty_aggregates_are_not_computable() {
    let rows: Vec<DisplayRow> = Vec::new();
    assert_eq!(confidence_score(&rows), None);
    assert_eq!(sensibility_score(&rows), None);
    assert_eq!(average_confidence(&rows), None);

    // All "no opinion": the average has nothing to work with
    assert_eq!(average_confidence(&rows_with(&[5, 5])), None);

    let summary = summarize(&[DisplayRow::divider(c(10))]);
    assert_eq!(summary.statements, 0);
    assert!(summary.bands.is_empty());
    assert!(summary.to_string().contains(NOT_COMPUTABLE));
}

#[test]
fn test_buckets_partition_rows() {
    let rows = rows_with(&[0, 1, 4, 5, 6, 9, 10, 3, 7]);

    let total: usize = Band::ALL.iter().map(|b| band_rows(&rows, *b).len()).sum();
    assert_eq!(total, rows.len());

    assert_eq!(bucket(&rows, 0, 0).len(), 1);
    assert_eq!(bucket(&rows, 1, 4).len(), 3);
    assert_eq!(bucket(&rows, 5, 5).len(), 1);
    assert_eq!(bucket(&rows, 6, 9).len(), 3);
    assert_eq!(bucket(&rows, 10, 10).len(), 1);

    // Bucketing keeps the input order
    let likely_false: Vec<&str> = bucket(&rows, 1, 4).into_iter().map(|r| r.id.as_str()).collect();
    assert_eq!(likely_false, vec!["s1", "s2", "s7"]);
}

#[test]
fn test_summary_band_shares() {
    let summary = summarize(&rows_with(&[0, 0, 10]));
    let certainly_false = summary
        .bands
        .iter()
        .find(|s| s.band == Band::CertainlyFalse)
        .unwrap();
    assert_eq!(certainly_false.count, 2);
    assert_eq!(certainly_false.percent, 67);
}

#[test]
fn test_merge_defaults_policies() {
    let spectrum = Spectrum::new("demo", "Demo", "")
        .with_statement("a", "Alpha")
        .with_statement("b", "Beta");
    let partial: HashMap<String, i64> = [("a".to_string(), 3), ("b".to_string(), 42)]
        .into_iter()
        .collect();

    let neutral = merge_defaults(&spectrum, &partial, DefaultPolicy::Neutral);
    assert_eq!(neutral.get("a"), Some(c(3)));
    assert_eq!(neutral.get("b"), Some(Confidence::NEUTRAL));
    assert!(!neutral.has_divider());

    let mut rng = StdRng::seed_from_u64(9);
    let random = merge_defaults(&spectrum, &HashMap::new(), DefaultPolicy::Random(&mut rng));
    let b = random.get("b").unwrap().value();
    assert!((1..=9).contains(&b));
    assert_eq!(random.get(DIVIDER_ID), Some(Confidence::MAX));

    let rows = join_rows(&spectrum, &random);
    assert_eq!(rows.len(), 3);
    assert!(rows[2].is_divider());
}
