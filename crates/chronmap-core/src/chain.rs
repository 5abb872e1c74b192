//! State chains: every interval a named state appears in, across shards.
//!
//! Used to report a state's overall lifespan rather than the span of the one
//! record that happens to be on screen.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, record::GeoRecord};

/// One appearance of a state in one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
  pub start_date:      i32,
  pub end_date:        i32,
  pub boundaries_file: String,
}

/// Chains keyed by state name.
#[derive(Debug, Clone, Default)]
pub struct ChainIndex {
  chains: HashMap<String, Vec<ChainLink>>,
}

impl ChainIndex {
  /// Parse a `{"<name>": [{start_date, end_date, boundaries_file}]}`
  /// document.
  pub fn parse(artifact: &str, bytes: &[u8]) -> Result<Self> {
    let chains = serde_json::from_slice(bytes).map_err(|e| Error::format(artifact, e))?;
    Ok(Self { chains })
  }

  pub fn chain(&self, name: &str) -> Option<&[ChainLink]> {
    self.chains.get(name).map(Vec::as_slice)
  }

  /// Earliest start and latest end over `name`'s chain.
  pub fn span(&self, name: &str) -> Option<(i32, i32)> {
    let chain = self.chains.get(name)?;
    let start = chain.iter().map(|l| l.start_date).min()?;
    let end = chain.iter().map(|l| l.end_date).max()?;
    Some((start, end))
  }

  /// The lifespan to show for `record`: its chain's span when it has one,
  /// otherwise the record's own years.
  pub fn lifespan(&self, record: &GeoRecord) -> (i32, i32) {
    self
      .span(&record.name)
      .unwrap_or((record.start_year, record.end_year))
  }

  pub fn len(&self) -> usize { self.chains.len() }

  pub fn is_empty(&self) -> bool { self.chains.is_empty() }
}
