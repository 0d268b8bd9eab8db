use std::sync::Arc;

use arc_swap::ArcSwap;

use super::analyzer::analyze;
use super::engine::{compute, generate};
use super::law::TaxLawTable;
use super::types::{AnalysisSummary, ComputedTaxpayerRecord, RawTaxpayerRecord, ValidationError};

/// Largest population `regenerate` will synthesize in one request.
pub const MAX_SYNTH_RECORDS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetOrigin {
    Empty,
    Synthesized,
    Ingested,
}

/// One immutable (population, summary) pair. The two halves are always
/// derived from each other; the pair is replaced wholesale, never patched.
#[derive(Debug)]
pub struct Dataset {
    pub population: Vec<ComputedTaxpayerRecord>,
    pub summary: AnalysisSummary,
    pub origin: DatasetOrigin,
    pub seed: Option<u64>,
}

/// Owns the law tables and the current dataset behind an atomic handle.
/// Readers clone an `Arc` snapshot; writers build a complete replacement off
/// to the side and publish it with a single swap, so a reader can never
/// observe a population paired with a stale summary.
pub struct DatasetStore {
    tables: TaxLawTable,
    current: ArcSwap<Dataset>,
}

impl DatasetStore {
    /// Starts empty: an empty population is not an error, it is the all-zero
    /// summary.
    pub fn new(tables: TaxLawTable) -> Self {
        let summary = analyze(&[], &tables);
        let empty = Dataset {
            population: Vec::new(),
            summary,
            origin: DatasetOrigin::Empty,
            seed: None,
        };
        Self {
            tables,
            current: ArcSwap::from_pointee(empty),
        }
    }

    pub fn tables(&self) -> &TaxLawTable {
        &self.tables
    }

    pub fn snapshot(&self) -> Arc<Dataset> {
        self.current.load_full()
    }

    /// Replaces the dataset with a synthesized population. Last writer wins.
    pub fn regenerate(&self, count: u32, seed: u64) -> Result<Arc<Dataset>, ValidationError> {
        if !(1..=MAX_SYNTH_RECORDS).contains(&count) {
            return Err(ValidationError::RecordCountOutOfRange {
                count,
                max: MAX_SYNTH_RECORDS,
            });
        }
        let population = generate(count, seed, &self.tables)?;
        Ok(self.publish(population, DatasetOrigin::Synthesized, Some(seed)))
    }

    /// Replaces the dataset with an ingested batch. The first invalid record
    /// aborts the whole batch and leaves the current dataset untouched, so a
    /// published population always matches its declared count.
    pub fn ingest(&self, records: &[RawTaxpayerRecord]) -> Result<Arc<Dataset>, ValidationError> {
        let mut population = Vec::with_capacity(records.len());
        for record in records {
            population.push(compute(record, &self.tables)?);
        }
        Ok(self.publish(population, DatasetOrigin::Ingested, None))
    }

    fn publish(
        &self,
        population: Vec<ComputedTaxpayerRecord>,
        origin: DatasetOrigin,
        seed: Option<u64>,
    ) -> Arc<Dataset> {
        let summary = analyze(&population, &self.tables);
        let dataset = Arc::new(Dataset {
            population,
            summary,
            origin,
            seed,
        });
        self.current.store(Arc::clone(&dataset));
        dataset
    }
}
