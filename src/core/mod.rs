mod analyzer;
mod engine;
mod law;
mod store;
mod types;

pub use analyzer::{analyze, summarize};
pub use engine::{compute, generate};
pub use law::{
    Bracket, FicaConstants, PerStatus, StateRate, StateRates, TaxLawConfig, TaxLawTable,
};
pub use store::{Dataset, DatasetOrigin, DatasetStore, MAX_SYNTH_RECORDS};
pub use types::{
    AnalysisSummary, BucketCount, CapitalGainsAnalysis, ComputedTaxpayerRecord,
    ConfigurationError, CreditsDependentsAnalysis, DeductionAnalysis, DeductionCategoryStats,
    FicaAnalysis, FilingStatus, FilingStatusBreakdown, IncomeAnalysis, IncomeSourceStats,
    MarginalBucket, PopulationSummary, RawTaxpayerRecord, RefundAnalysis, RefundBucket, State,
    StateBreakdown, SummaryStats, TaxRateAnalysis, ValidationError,
};
