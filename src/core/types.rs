use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    Married,
    #[serde(alias = "hoh")]
    HeadOfHousehold,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 3] = [
        FilingStatus::Single,
        FilingStatus::Married,
        FilingStatus::HeadOfHousehold,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::Married => "married",
            FilingStatus::HeadOfHousehold => "head_of_household",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            FilingStatus::Single => 0,
            FilingStatus::Married => 1,
            FilingStatus::HeadOfHousehold => 2,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    Ca,
    Ny,
    Tx,
    Fl,
    Wa,
    Il,
    Oh,
    Ga,
    Nc,
    Va,
}

impl State {
    pub const ALL: [State; 10] = [
        State::Ca,
        State::Ny,
        State::Tx,
        State::Fl,
        State::Wa,
        State::Il,
        State::Oh,
        State::Ga,
        State::Nc,
        State::Va,
    ];

    pub fn code(self) -> &'static str {
        match self {
            State::Ca => "CA",
            State::Ny => "NY",
            State::Tx => "TX",
            State::Fl => "FL",
            State::Wa => "WA",
            State::Il => "IL",
            State::Oh => "OH",
            State::Ga => "GA",
            State::Nc => "NC",
            State::Va => "VA",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            State::Ca => 0,
            State::Ny => 1,
            State::Tx => 2,
            State::Fl => 3,
            State::Wa => 4,
            State::Il => 5,
            State::Oh => 6,
            State::Ga => 7,
            State::Nc => 8,
            State::Va => 9,
        }
    }
}

/// An input record as supplied by the synthesizer or an ingestion batch.
/// `dividends` is the dividend portion of `investment`, not extra income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTaxpayerRecord {
    pub id: u64,
    pub filing_status: FilingStatus,
    pub state: State,
    pub dependents: u32,
    pub wages: f64,
    pub self_employment: f64,
    pub investment: f64,
    #[serde(default)]
    pub dividends: f64,
    pub rental: f64,
    pub retirement: f64,
    pub mortgage_interest: f64,
    pub charitable: f64,
    pub medical: f64,
    pub salt: f64,
    #[serde(default)]
    pub estimated_withholding: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedTaxpayerRecord {
    #[serde(flatten)]
    pub raw: RawTaxpayerRecord,
    pub total_income: f64,
    pub itemized_total: f64,
    pub standard_deduction: f64,
    pub deduction_used: f64,
    pub uses_itemized: bool,
    pub taxable_income: f64,
    pub federal_tax: f64,
    pub state_tax: f64,
    pub social_security_tax: f64,
    pub medicare_tax: f64,
    pub fica_total: f64,
    pub credits: f64,
    pub total_tax_liability: f64,
    pub effective_tax_rate: f64,
    pub marginal_tax_rate: f64,
    pub refund_or_owed: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("record {id}: {field} must be a non-negative amount, got {value}")]
    NegativeAmount {
        id: u64,
        field: &'static str,
        value: f64,
    },
    #[error("record {id}: {field} must be a finite number")]
    NonFiniteAmount { id: u64, field: &'static str },
    #[error("record {id}: dividends ({dividends}) exceed investment income ({investment})")]
    DividendsExceedInvestment {
        id: u64,
        dividends: f64,
        investment: f64,
    },
    #[error("record count {count} must be between 1 and {max}")]
    RecordCountOutOfRange { count: u32, max: u32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{table}: bracket table is empty")]
    EmptyBrackets { table: String },
    #[error("{table}: first bracket must start at 0, got {lower}")]
    FirstBracketNonZero { table: String, lower: f64 },
    #[error("{table}: bracket lower bounds must increase, got {prev} then {next}")]
    UnsortedBrackets { table: String, prev: f64, next: f64 },
    #[error("{table}: bracket rates must not decrease, got {prev} then {next}")]
    DecreasingRates { table: String, prev: f64, next: f64 },
    #[error("{table}: rate {rate} is outside [0, 1]")]
    RateOutOfRange { table: String, rate: f64 },
    #[error("standard deduction for {status} must be positive, got {value}")]
    InvalidStandardDeduction { status: &'static str, value: f64 },
    #[error("{name} must be non-negative, got {value}")]
    NegativeConstant { name: &'static str, value: f64 },
}

/// Descriptive statistics over one dimension of the population. All-zero for
/// an empty dimension rather than an error or NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub total: f64,
    pub stdev: f64,
}

impl SummaryStats {
    pub const ZERO: SummaryStats = SummaryStats {
        count: 0,
        mean: 0.0,
        median: 0.0,
        min: 0.0,
        max: 0.0,
        total: 0.0,
        stdev: 0.0,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationSummary {
    pub total_taxpayers: usize,
    pub total_income_reported: f64,
    pub total_federal_tax: f64,
    pub total_state_tax: f64,
    pub total_fica: f64,
    pub total_tax_collected: f64,
    pub overall_effective_rate: f64,
    pub total_refunds_issued: f64,
    pub total_tax_owed: f64,
    pub avg_income: f64,
    pub avg_total_tax: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCount {
    pub label: &'static str,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeSourceStats {
    pub wages: SummaryStats,
    pub self_employment: SummaryStats,
    pub investment: SummaryStats,
    pub rental: SummaryStats,
    pub retirement: SummaryStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeAnalysis {
    pub overall_stats: SummaryStats,
    pub bracket_distribution: Vec<BucketCount>,
    pub by_income_source: IncomeSourceStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginalBucket {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilingStatusBreakdown {
    pub count: usize,
    pub avg_effective: f64,
    pub avg_federal_tax: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxRateAnalysis {
    pub effective_rate_stats: SummaryStats,
    pub marginal_rate_stats: SummaryStats,
    pub marginal_distribution: Vec<MarginalBucket>,
    pub by_filing_status: BTreeMap<&'static str, FilingStatusBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeductionCategoryStats {
    pub mortgage_interest: SummaryStats,
    pub charitable: SummaryStats,
    pub medical: SummaryStats,
    pub salt: SummaryStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeductionAnalysis {
    pub itemizer_count: usize,
    pub standard_filer_count: usize,
    pub itemizer_pct: f64,
    pub avg_itemized_total: f64,
    pub avg_standard_deduction: f64,
    pub avg_tax_savings_itemize: f64,
    pub category_breakdown: DeductionCategoryStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundBucket {
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundAnalysis {
    pub refund_count: usize,
    pub owed_count: usize,
    pub over_withheld_pct: f64,
    pub refund_stats: SummaryStats,
    pub owed_stats: SummaryStats,
    pub bucket_distribution: Vec<RefundBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateBreakdown {
    pub count: usize,
    pub avg_income: f64,
    pub avg_federal_tax: f64,
    pub avg_state_tax: f64,
    pub avg_total_tax: f64,
    pub avg_effective_rate: f64,
    pub total_state_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapitalGainsAnalysis {
    pub cg_filer_count: usize,
    pub cg_filer_pct: f64,
    pub capital_gains_stats: SummaryStats,
    pub dividend_income_stats: SummaryStats,
    pub avg_cg_pct_of_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditsDependentsAnalysis {
    pub avg_credit: f64,
    pub total_credits_claimed: f64,
    pub credit_stats: SummaryStats,
    pub dependent_distribution: BTreeMap<u32, usize>,
    pub avg_tax_by_dependents: BTreeMap<u32, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FicaAnalysis {
    pub total_fica_collected: f64,
    pub avg_fica_pct_of_income: f64,
    pub social_security_stats: SummaryStats,
    pub medicare_stats: SummaryStats,
    pub fica_total_stats: SummaryStats,
}

/// The full nine-group analysis document. The top-level keys are a stable
/// contract consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub summary: PopulationSummary,
    pub income: IncomeAnalysis,
    pub tax_rates: TaxRateAnalysis,
    pub deductions: DeductionAnalysis,
    pub refunds: RefundAnalysis,
    pub by_state: BTreeMap<&'static str, StateBreakdown>,
    pub capital_gains: CapitalGainsAnalysis,
    pub credits_dependents: CreditsDependentsAnalysis,
    pub fica: FicaAnalysis,
}
