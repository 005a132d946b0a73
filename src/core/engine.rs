//! Ratings engine.
//!
//! Pure functions over a spectrum and its ratings: filling in defaults,
//! ordering rows for display, splitting them into bands, and the summary
//! scores. Nothing here mutates its inputs.
//!
//! Aggregates return `None` when there is nothing to aggregate; the view
//! renders that as [`NOT_COMPUTABLE`].

use std::collections::HashMap;
use std::fmt;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::catalog::Spectrum;
use crate::domain::{Band, Confidence, DisplayRow, Ratings, DIVIDER_ID};

/// Marker shown in place of a score that cannot be computed
pub const NOT_COMPUTABLE: &str = "–";

/// How missing or invalid ratings are filled in
pub enum DefaultPolicy<'a> {
    /// Fresh session: each statement gets a uniform 1..=9, and the divider
    /// starts at 10
    Random(&'a mut dyn RngCore),

    /// Decoded link: missing statements get 5, a missing divider stays
    /// missing
    Neutral,
}

/// Build a complete ratings map for a spectrum.
///
/// Values in `partial` are used when they are integers in `0..=10`;
/// anything else falls back to the policy. Ids in `partial` that are not
/// statements of the spectrum (or the divider) are dropped. The result
/// lists statements in catalog order with the divider last.
pub fn merge_defaults(
    spectrum: &Spectrum,
    partial: &HashMap<String, i64>,
    policy: DefaultPolicy<'_>,
) -> Ratings {
    let given = |id: &str| partial.get(id).and_then(|v| Confidence::new(*v));

    let mut ratings = Ratings::new();
    match policy {
        DefaultPolicy::Random(rng) => {
            for statement in spectrum.entries() {
                let confidence = given(&statement.id)
                    .unwrap_or_else(|| Confidence::saturating(rng.gen_range(1..=9)));
                ratings.set(statement.id.as_str(), confidence);
            }
            ratings.set(DIVIDER_ID, given(DIVIDER_ID).unwrap_or(Confidence::MAX));
        }
        DefaultPolicy::Neutral => {
            for statement in spectrum.entries() {
                let confidence = given(&statement.id).unwrap_or(Confidence::NEUTRAL);
                ratings.set(statement.id.as_str(), confidence);
            }
            if let Some(divider) = given(DIVIDER_ID) {
                ratings.set(DIVIDER_ID, divider);
            }
        }
    }
    ratings
}

/// Join statements with ratings, one row per statement plus the divider
/// when rated. Rows are in catalog order.
pub fn join_rows(spectrum: &Spectrum, ratings: &Ratings) -> Vec<DisplayRow> {
    let mut rows: Vec<DisplayRow> = spectrum
        .entries()
        .into_iter()
        .map(|s| {
            let confidence = ratings.get(&s.id).unwrap_or(Confidence::NEUTRAL);
            DisplayRow::statement(s.id.as_str(), s.text.as_str(), confidence)
        })
        .collect();

    if let Some(divider) = ratings.get(DIVIDER_ID) {
        rows.push(DisplayRow::divider(divider));
    }
    rows
}

/// Rows ordered by confidence, then statement text, both ascending.
///
/// Id is a final tie-break so the order is total.
pub fn sort_for_display(spectrum: &Spectrum, ratings: &Ratings) -> Vec<DisplayRow> {
    let mut rows = join_rows(spectrum, ratings);
    sort_rows(&mut rows);
    rows
}

/// Sort rows in place with the display ordering
pub fn sort_rows(rows: &mut [DisplayRow]) {
    rows.sort_by(|a, b| {
        a.confidence
            .cmp(&b.confidence)
            .then_with(|| a.statement.cmp(&b.statement))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Statement rows in random order, for the unsorted layout. The divider is
/// left out since its position means nothing there.
pub fn shuffled(spectrum: &Spectrum, ratings: &Ratings, rng: &mut dyn RngCore) -> Vec<DisplayRow> {
    let mut rows: Vec<DisplayRow> = join_rows(spectrum, ratings)
        .into_iter()
        .filter(|r| !r.is_divider())
        .collect();
    rows.shuffle(rng);
    rows
}

/// Rows with confidence in `low..=high`, in their original order
pub fn bucket(rows: &[DisplayRow], low: u8, high: u8) -> Vec<&DisplayRow> {
    rows.iter()
        .filter(|r| (low..=high).contains(&r.confidence.value()))
        .collect()
}

/// Rows falling in one of the standard bands
pub fn band_rows(rows: &[DisplayRow], band: Band) -> Vec<&DisplayRow> {
    let range = band.range();
    bucket(rows, *range.start(), *range.end())
}

/// Mean confidence of the statement rows as a percentage.
///
/// `round(sum * 10 / count)`, excluding the divider.
pub fn confidence_score(rows: &[DisplayRow]) -> Option<u8> {
    let (sum, count) = statement_rows(rows)
        .fold((0u64, 0u64), |(sum, count), r| {
            (sum + u64::from(r.confidence.value()), count + 1)
        });
    if count == 0 {
        return None;
    }
    Some(round_div(sum * 10, count) as u8)
}

/// Share of statement rows rated strictly above the divider, as a
/// percentage. Without a divider the threshold is 0.
pub fn sensibility_score(rows: &[DisplayRow]) -> Option<u8> {
    let threshold = rows
        .iter()
        .find(|r| r.is_divider())
        .map(|r| r.confidence)
        .unwrap_or(Confidence::MIN);

    let (matching, total) = statement_rows(rows).fold((0u64, 0u64), |(matching, total), r| {
        let above = u64::from(r.confidence > threshold);
        (matching + above, total + 1)
    });
    if total == 0 {
        return None;
    }
    Some(round_div(100 * matching, total) as u8)
}

/// Mean confidence to one decimal place, ignoring "no opinion" (5) rows
/// and the divider.
pub fn average_confidence(rows: &[DisplayRow]) -> Option<Average> {
    let (sum, count) = statement_rows(rows)
        .filter(|r| r.confidence != Confidence::NEUTRAL)
        .fold((0u64, 0u64), |(sum, count), r| {
            (sum + u64::from(r.confidence.value()), count + 1)
        });
    if count == 0 {
        return None;
    }
    Some(Average {
        tenths: round_div(sum * 10, count) as u32,
    })
}

/// Percentage of statement rows in each band
pub fn band_shares(rows: &[DisplayRow]) -> Option<Vec<BandShare>> {
    let total = statement_rows(rows).count() as u64;
    if total == 0 {
        return None;
    }

    let shares = Band::ALL
        .into_iter()
        .map(|band| {
            let count = statement_rows(rows)
                .filter(|r| Band::of(r.confidence) == band)
                .count();
            BandShare {
                band,
                count,
                percent: round_div(100 * count as u64, total) as u8,
            }
        })
        .collect();
    Some(shares)
}

/// One character per row: `0`-`9`, `X` for 10, `/` for the divider
pub fn sparkline(rows: &[DisplayRow]) -> String {
    const GLYPHS: &[u8; 11] = b"0123456789X";
    rows.iter()
        .map(|r| {
            if r.is_divider() {
                '/'
            } else {
                char::from(GLYPHS[usize::from(r.confidence.value())])
            }
        })
        .collect()
}

/// All scores for a set of rows
pub fn summarize(rows: &[DisplayRow]) -> Summary {
    Summary {
        statements: statement_rows(rows).count(),
        confidence: confidence_score(rows),
        sensibility: sensibility_score(rows),
        average: average_confidence(rows),
        bands: band_shares(rows).unwrap_or_default(),
    }
}

fn statement_rows(rows: &[DisplayRow]) -> impl Iterator<Item = &DisplayRow> {
    rows.iter().filter(|r| !r.is_divider())
}

/// `numerator / denominator` rounded half up
fn round_div(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// A confidence mean held in tenths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Average {
    pub tenths: u32,
}

impl Average {
    pub fn as_f64(self) -> f64 {
        f64::from(self.tenths) / 10.0
    }
}

impl fmt::Display for Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tenths % 10 == 0 {
            write!(f, "{}", self.tenths / 10)
        } else {
            write!(f, "{}.{}", self.tenths / 10, self.tenths % 10)
        }
    }
}

/// How many statement rows fall in a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandShare {
    pub band: Band,
    pub count: usize,
    pub percent: u8,
}

/// Summary scores for a rated spectrum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of statement rows (divider excluded)
    pub statements: usize,

    /// Confidence score, 0-100
    pub confidence: Option<u8>,

    /// Sensibility score, 0-100
    pub sensibility: Option<u8>,

    /// Average confidence out of 10, "no opinion" rows excluded
    pub average: Option<Average>,

    /// Share of rows per band (empty when there are no statements)
    pub bands: Vec<BandShare>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_marker<T: fmt::Display>(value: Option<T>, suffix: &str) -> String {
            value
                .map(|v| format!("{}{}", v, suffix))
                .unwrap_or_else(|| NOT_COMPUTABLE.to_string())
        }

        for share in &self.bands {
            writeln!(f, "{:>4}%  {}", share.percent, share.band.label())?;
        }
        writeln!(f, "Average confidence: {} / 10", or_marker(self.average, ""))?;
        writeln!(f, "Confidence: {}", or_marker(self.confidence, "%"))?;
        write!(f, "Sensibility: {}", or_marker(self.sensibility, "%"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn c(v: i64) -> Confidence {
        Confidence::clamped(v)
    }

    fn rows_with(values: &[u8]) -> Vec<DisplayRow> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DisplayRow::statement(format!("s{}", i), format!("text {}", i), c(*v as i64)))
            .collect()
    }

    #[test]
    fn test_round_div_half_up() {
        assert_eq!(round_div(5, 2), 3);
        assert_eq!(round_div(4, 3), 1);
        assert_eq!(round_div(250, 5), 50);
        assert_eq!(round_div(0, 7), 0);
    }

    #[test]
    fn test_random_defaults_stay_in_range() {
        let spectrum = Spectrum::new("s", "S", "")
            .with_statement("a", "A")
            .with_statement("b", "B")
            .with_statement("c", "C");
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let ratings = merge_defaults(&spectrum, &HashMap::new(), DefaultPolicy::Random(&mut rng));
            for id in ["a", "b", "c"] {
                let v = ratings.get(id).unwrap().value();
                assert!((1..=9).contains(&v), "{} out of 1..=9", v);
            }
            assert_eq!(ratings.get(DIVIDER_ID), Some(Confidence::MAX));
        }
    }

    #[test]
    fn test_sparkline() {
        let mut rows = rows_with(&[0, 4, 10]);
        rows.push(DisplayRow::divider(c(6)));
        assert_eq!(sparkline(&rows), "04X/");
    }

    #[test]
    fn test_average_display() {
        assert_eq!(Average { tenths: 65 }.to_string(), "6.5");
        assert_eq!(Average { tenths: 70 }.to_string(), "7");
        assert_eq!(Average { tenths: 3 }.to_string(), "0.3");
    }

    #[test]
    fn test_band_shares() {
        let rows = rows_with(&[0, 4, 5, 6, 10, 10]);
        let shares = band_shares(&rows).unwrap();
        let percents: Vec<u8> = shares.iter().map(|s| s.percent).collect();
        assert_eq!(percents, vec![17, 17, 17, 17, 33]);
        assert_eq!(shares[4].count, 2);
        assert!(band_shares(&[]).is_none());
    }

    #[test]
    fn test_summary_display_marks_empty() {
        let text = summarize(&[]).to_string();
        assert!(text.contains("Average confidence: – / 10"));
        assert!(text.contains("Confidence: –"));
    }
}
