//! The period table: the static partition of the timeline into shards.
//!
//! Periods are ordered by `start_year` and do not overlap, with one
//! exception inherited from the dataset: the first two periods may both claim
//! years −1 and 0, and those years always belong to the second period.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Years that are folded into the second period of the table.
pub const FOLDED_YEARS: RangeInclusive<i32> = -1..=0;

fn default_parts() -> u32 { 1 }

// ─── Period ──────────────────────────────────────────────────────────────────

/// A named, inclusive year range backed by one loadable shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
  pub name:       String,
  pub start_year: i32,
  pub end_year:   i32,
  /// Number of numbered artifacts the shard is split into.
  #[serde(default = "default_parts")]
  pub parts:      u32,
}

impl Period {
  pub fn new(name: impl Into<String>, start_year: i32, end_year: i32) -> Self {
    Self {
      name: name.into(),
      start_year,
      end_year,
      parts: 1,
    }
  }

  /// Split the shard into `parts` numbered artifacts.
  pub fn with_parts(mut self, parts: u32) -> Self {
    self.parts = parts;
    self
  }

  pub fn contains(&self, year: i32) -> bool {
    (self.start_year..=self.end_year).contains(&year)
  }

  /// Artifact file names making up this period's shard, in part order.
  ///
  /// A single-part period is `<name>.json`; a multi-part one is
  /// `<name>_1.json` through `<name>_<parts>.json`.
  pub fn artifact_names(&self) -> Vec<String> {
    if self.parts <= 1 {
      vec![format!("{}.json", self.name)]
    } else {
      (1..=self.parts)
        .map(|part| format!("{}_{part}.json", self.name))
        .collect()
    }
  }
}

// ─── PeriodTable ─────────────────────────────────────────────────────────────

/// An immutable, validated, ordered list of periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PeriodTable {
  periods: Vec<Period>,
}

impl PeriodTable {
  /// Validate and build a table.
  ///
  /// Rejects empty tables, unsorted or overlapping ranges, inverted ranges,
  /// duplicate names, and zero-part periods. Gaps are allowed; years that
  /// fall in a gap have no period.
  pub fn new(periods: Vec<Period>) -> Result<Self> {
    if periods.is_empty() {
      return Err(Error::InvalidPeriodTable("no periods".into()));
    }

    for p in &periods {
      if p.start_year > p.end_year {
        return Err(Error::InvalidPeriodTable(format!(
          "period {:?} starts after it ends ({} > {})",
          p.name, p.start_year, p.end_year
        )));
      }
      if p.parts == 0 {
        return Err(Error::InvalidPeriodTable(format!(
          "period {:?} has zero parts",
          p.name
        )));
      }
    }

    for (i, pair) in periods.windows(2).enumerate() {
      let (prev, cur) = (&pair[0], &pair[1]);
      if cur.start_year <= prev.start_year {
        return Err(Error::InvalidPeriodTable(format!(
          "period {:?} is not ordered after {:?}",
          cur.name, prev.name
        )));
      }
      if cur.start_year <= prev.end_year {
        // Only the first two periods may share the folded years.
        let folded_overlap = i == 0
          && cur.start_year >= *FOLDED_YEARS.start()
          && prev.end_year <= *FOLDED_YEARS.end();
        if !folded_overlap {
          return Err(Error::InvalidPeriodTable(format!(
            "period {:?} overlaps {:?}",
            cur.name, prev.name
          )));
        }
      }
    }

    let mut names: Vec<&str> = periods.iter().map(|p| p.name.as_str()).collect();
    names.sort_unstable();
    if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
      return Err(Error::InvalidPeriodTable(format!(
        "duplicate period name {:?}",
        dup[0]
      )));
    }

    Ok(Self { periods })
  }

  /// The built-in table, covering −123000 through 2100.
  pub fn standard() -> Self {
    Self {
      periods: vec![
        Period::new("ancient", -123_000, 0),
        Period::new("classical", 1, 500),
        Period::new("early_medieval", 501, 1000),
        Period::new("high_medieval", 1001, 1500),
        Period::new("early_modern", 1501, 1800).with_parts(2),
        Period::new("modern", 1801, 2100).with_parts(3),
      ],
    }
  }

  /// Index of the period owning `year`, if any.
  ///
  /// The folded years belong to the second period whatever the first
  /// period's declared range.
  pub fn index_for_year(&self, year: i32) -> Option<usize> {
    if FOLDED_YEARS.contains(&year) && self.periods.len() >= 2 {
      return Some(1);
    }
    let idx = self.periods.partition_point(|p| p.start_year <= year);
    idx.checked_sub(1).filter(|&i| self.periods[i].contains(year))
  }

  /// The period owning `year`, or `None` when the year is outside the table.
  pub fn period_for_year(&self, year: i32) -> Option<&Period> {
    self.index_for_year(year).map(|i| &self.periods[i])
  }

  pub fn get(&self, name: &str) -> Option<&Period> {
    self.periods.iter().find(|p| p.name == name)
  }

  /// The period at `index` together with up to `radius` neighbours on each
  /// side, in table order.
  pub fn window(&self, index: usize, radius: usize) -> &[Period] {
    if index >= self.periods.len() {
      return &[];
    }
    let lo = index.saturating_sub(radius);
    let hi = index.saturating_add(radius).min(self.periods.len() - 1);
    &self.periods[lo..=hi]
  }

  /// First and last covered year.
  pub fn span(&self) -> (i32, i32) {
    let first = self.periods.first().map_or(0, |p| p.start_year);
    let last = self.periods.iter().map(|p| p.end_year).max().unwrap_or(first);
    (first, last)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Period> { self.periods.iter() }

  pub fn len(&self) -> usize { self.periods.len() }

  pub fn is_empty(&self) -> bool { self.periods.is_empty() }
}

impl Default for PeriodTable {
  fn default() -> Self { Self::standard() }
}
