//! The chronmap query facade.
//!
//! [`Atlas`] is the single entry point the rendering layer talks to. It owns
//! the period table, the [`TemporalCache`] of loaded shards and the
//! [`LineageResolver`], plus the war and chain annotations used to describe
//! a selected entity. There is no global state: callers hold an `Atlas`
//! (usually behind an `Arc`) and every query goes through it.

pub mod cache;
pub mod lineage;

use std::sync::Arc;

use chronmap_core::{
  Result,
  chain::ChainIndex,
  period::PeriodTable,
  record::GeoRecord,
  relation::RelationQueryResult,
  shard::Shard,
  source::ShardSource,
  war::{War, WarCatalog},
};

pub use cache::{EntryState, TemporalCache};
pub use lineage::LineageResolver;

/// Shards by year, lineage by external id.
pub struct Atlas<S> {
  table:   Arc<PeriodTable>,
  cache:   Arc<TemporalCache<S>>,
  lineage: LineageResolver<S>,
  wars:    WarCatalog,
  chains:  ChainIndex,
}

impl<S: ShardSource + 'static> Atlas<S> {
  pub fn new(table: PeriodTable, source: S) -> Self {
    let table = Arc::new(table);
    let cache = Arc::new(TemporalCache::new(source));
    let lineage = LineageResolver::new(table.clone(), cache.clone());
    Self {
      table,
      cache,
      lineage,
      wars: WarCatalog::default(),
      chains: ChainIndex::default(),
    }
  }

  /// Scan `radius` neighbouring periods on each side during lineage
  /// searches.
  pub fn with_lineage_radius(mut self, radius: usize) -> Self {
    self.lineage = self.lineage.with_radius(radius);
    self
  }

  pub fn with_wars(mut self, wars: WarCatalog) -> Self {
    self.wars = wars;
    self
  }

  pub fn with_chains(mut self, chains: ChainIndex) -> Self {
    self.chains = chains;
    self
  }

  /// Fetch and attach the war catalogue stored as `artifact` in this
  /// atlas's source.
  pub async fn load_wars(self, artifact: &str) -> Result<Self> {
    let bytes = self.cache.source().fetch_artifact(artifact).await?;
    let wars = WarCatalog::parse(artifact, &bytes)?;
    tracing::info!(%artifact, wars = wars.len(), "loaded war catalogue");
    Ok(self.with_wars(wars))
  }

  /// Fetch and attach the chain index stored as `artifact` in this atlas's
  /// source.
  pub async fn load_chains(self, artifact: &str) -> Result<Self> {
    let bytes = self.cache.source().fetch_artifact(artifact).await?;
    let chains = ChainIndex::parse(artifact, &bytes)?;
    tracing::info!(%artifact, chains = chains.len(), "loaded chain index");
    Ok(self.with_chains(chains))
  }

  pub fn periods(&self) -> &PeriodTable { &self.table }

  pub fn cache(&self) -> &TemporalCache<S> { &self.cache }

  pub fn lineage(&self) -> &LineageResolver<S> { &self.lineage }

  // ── Shards ──────────────────────────────────────────────────────────────

  /// The shard of the period owning `year`; `None` when no period does.
  pub async fn shard_for_year(&self, year: i32) -> Result<Option<Shard>> {
    let Some(period) = self.table.period_for_year(year) else {
      tracing::debug!(year, "no period for year");
      return Ok(None);
    };
    self.cache.get(period).await.map(Some)
  }

  /// Records of `year`'s shard that are on the map on 1 January of `year`.
  pub async fn visible_at(&self, year: i32) -> Result<Option<Vec<Arc<GeoRecord>>>> {
    Ok(
      self
        .shard_for_year(year)
        .await?
        .map(|shard| shard.visible_at(year)),
    )
  }

  pub fn clear_cache(&self) { self.cache.clear(); }

  // ── Lineage ─────────────────────────────────────────────────────────────

  /// Predecessors and successors of `id` as of `year`.
  pub async fn relations(&self, id: &str, year: i32) -> RelationQueryResult {
    self.lineage.resolve_relations(id, year).await
  }

  /// The record describing `id` at `year`, if any.
  pub async fn current_record(&self, id: &str, year: i32) -> Result<Option<Arc<GeoRecord>>> {
    self.lineage.current_record(id, year).await
  }

  // ── Annotations ─────────────────────────────────────────────────────────

  /// Wars `record` took part in, in reference order.
  pub fn wars_for<'a>(&'a self, record: &'a GeoRecord) -> Vec<(&'a str, &'a War)> {
    self.wars.for_record(record)
  }

  /// Overall lifespan of the state `record` belongs to.
  pub fn lifespan(&self, record: &GeoRecord) -> (i32, i32) { self.chains.lifespan(record) }
}
