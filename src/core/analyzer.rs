use std::collections::BTreeMap;

use super::engine::liability_with_deduction;
use super::law::TaxLawTable;
use super::types::{
    AnalysisSummary, BucketCount, CapitalGainsAnalysis, ComputedTaxpayerRecord,
    CreditsDependentsAnalysis, DeductionAnalysis, DeductionCategoryStats, FicaAnalysis,
    FilingStatus, FilingStatusBreakdown, IncomeAnalysis, IncomeSourceStats, MarginalBucket,
    PopulationSummary, RefundAnalysis, RefundBucket, State, StateBreakdown, SummaryStats,
    TaxRateAnalysis,
};

/// Descriptive statistics over a value set. Empty input yields the all-zero
/// struct; intermediate values are never rounded.
pub fn summarize(values: &[f64]) -> SummaryStats {
    if values.is_empty() {
        return SummaryStats::ZERO;
    }

    let count = values.len();
    let total: f64 = values.iter().sum();
    let mean = total / count as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = if count % 2 == 1 {
        sorted[count / 2]
    } else {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    };

    let stdev = if count > 1 {
        let variance =
            values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    SummaryStats {
        count,
        mean,
        median,
        min: sorted[0],
        max: sorted[count - 1],
        total,
        stdev,
    }
}

/// Rebuilds the full nine-group summary from a population snapshot. Pure and
/// deterministic; every group depends only on the population and the tables,
/// and every dimension key is emitted even when nothing matches it.
pub fn analyze(population: &[ComputedTaxpayerRecord], tables: &TaxLawTable) -> AnalysisSummary {
    AnalysisSummary {
        summary: population_summary(population),
        income: income_analysis(population),
        tax_rates: tax_rate_analysis(population, tables),
        deductions: deduction_analysis(population, tables),
        refunds: refund_analysis(population),
        by_state: state_analysis(population),
        capital_gains: capital_gains_analysis(population),
        credits_dependents: credits_dependents_analysis(population),
        fica: fica_analysis(population),
    }
}

fn population_summary(population: &[ComputedTaxpayerRecord]) -> PopulationSummary {
    let total_taxpayers = population.len();
    let total_income: f64 = population.iter().map(|r| r.total_income).sum();
    let total_federal: f64 = population.iter().map(|r| r.federal_tax).sum();
    let total_state: f64 = population.iter().map(|r| r.state_tax).sum();
    let total_fica: f64 = population.iter().map(|r| r.fica_total).sum();
    let total_liability: f64 = population.iter().map(|r| r.total_tax_liability).sum();
    let total_refunds: f64 = population
        .iter()
        .filter(|r| r.refund_or_owed > 0.0)
        .map(|r| r.refund_or_owed)
        .sum();
    let total_owed: f64 = population
        .iter()
        .filter(|r| r.refund_or_owed < 0.0)
        .map(|r| -r.refund_or_owed)
        .sum();

    PopulationSummary {
        total_taxpayers,
        total_income_reported: total_income,
        total_federal_tax: total_federal,
        total_state_tax: total_state,
        total_fica,
        total_tax_collected: total_liability,
        overall_effective_rate: if total_income > 0.0 {
            total_liability / total_income
        } else {
            0.0
        },
        total_refunds_issued: total_refunds,
        total_tax_owed: total_owed,
        avg_income: ratio(total_income, total_taxpayers),
        avg_total_tax: ratio(total_liability, total_taxpayers),
    }
}

const TAXABLE_INCOME_BRACKETS: [(&str, f64, f64); 8] = [
    ("< $25k", 0.0, 25_000.0),
    ("$25k – $50k", 25_000.0, 50_000.0),
    ("$50k – $75k", 50_000.0, 75_000.0),
    ("$75k – $100k", 75_000.0, 100_000.0),
    ("$100k – $150k", 100_000.0, 150_000.0),
    ("$150k – $200k", 150_000.0, 200_000.0),
    ("$200k – $500k", 200_000.0, 500_000.0),
    ("> $500k", 500_000.0, f64::INFINITY),
];

fn income_analysis(population: &[ComputedTaxpayerRecord]) -> IncomeAnalysis {
    let incomes: Vec<f64> = population.iter().map(|r| r.total_income).collect();

    let bracket_distribution = TAXABLE_INCOME_BRACKETS
        .iter()
        .map(|&(label, lo, hi)| {
            let count = population
                .iter()
                .filter(|r| lo <= r.taxable_income && r.taxable_income < hi)
                .count();
            BucketCount {
                label,
                count,
                percent: percent(count, population.len()),
            }
        })
        .collect();

    IncomeAnalysis {
        overall_stats: summarize(&incomes),
        bracket_distribution,
        by_income_source: IncomeSourceStats {
            wages: nonzero_stats(population, |r| r.raw.wages),
            self_employment: nonzero_stats(population, |r| r.raw.self_employment),
            investment: nonzero_stats(population, |r| r.raw.investment),
            rental: nonzero_stats(population, |r| r.raw.rental),
            retirement: nonzero_stats(population, |r| r.raw.retirement),
        },
    }
}

fn tax_rate_analysis(
    population: &[ComputedTaxpayerRecord],
    tables: &TaxLawTable,
) -> TaxRateAnalysis {
    let effective: Vec<f64> = population.iter().map(|r| r.effective_tax_rate).collect();
    let marginal: Vec<f64> = population.iter().map(|r| r.marginal_tax_rate).collect();

    let marginal_distribution = tables
        .federal_rates()
        .into_iter()
        .map(|rate| MarginalBucket {
            label: format!("{:.0}%", rate * 100.0),
            count: population
                .iter()
                .filter(|r| (r.marginal_tax_rate - rate).abs() < 1e-9)
                .count(),
        })
        .collect();

    let by_filing_status = FilingStatus::ALL
        .iter()
        .map(|status| {
            let subset: Vec<&ComputedTaxpayerRecord> = population
                .iter()
                .filter(|r| r.raw.filing_status == *status)
                .collect();
            (
                status.label(),
                FilingStatusBreakdown {
                    count: subset.len(),
                    avg_effective: mean_of(subset.iter().map(|r| r.effective_tax_rate)),
                    avg_federal_tax: mean_of(subset.iter().map(|r| r.federal_tax)),
                },
            )
        })
        .collect();

    TaxRateAnalysis {
        effective_rate_stats: summarize(&effective),
        marginal_rate_stats: summarize(&marginal),
        marginal_distribution,
        by_filing_status,
    }
}

fn deduction_analysis(
    population: &[ComputedTaxpayerRecord],
    tables: &TaxLawTable,
) -> DeductionAnalysis {
    let itemizers: Vec<&ComputedTaxpayerRecord> =
        population.iter().filter(|r| r.uses_itemized).collect();
    let standard_filers: Vec<&ComputedTaxpayerRecord> =
        population.iter().filter(|r| !r.uses_itemized).collect();

    // Savings are priced by recomputing the counterfactual liability, not by
    // multiplying the marginal rate into the deduction gap.
    let savings: Vec<f64> = itemizers
        .iter()
        .map(|r| {
            liability_with_deduction(&r.raw, tables, r.standard_deduction) - r.total_tax_liability
        })
        .collect();

    DeductionAnalysis {
        itemizer_count: itemizers.len(),
        standard_filer_count: standard_filers.len(),
        itemizer_pct: percent(itemizers.len(), population.len()),
        avg_itemized_total: mean_of(itemizers.iter().map(|r| r.itemized_total)),
        avg_standard_deduction: mean_of(standard_filers.iter().map(|r| r.standard_deduction)),
        avg_tax_savings_itemize: mean_of(savings.iter().copied()),
        category_breakdown: DeductionCategoryStats {
            mortgage_interest: nonzero_stats_of(&itemizers, |r| r.raw.mortgage_interest),
            charitable: nonzero_stats_of(&itemizers, |r| r.raw.charitable),
            medical: nonzero_stats_of(&itemizers, |r| r.raw.medical),
            salt: nonzero_stats_of(&itemizers, |r| r.raw.salt),
        },
    }
}

const REFUND_BUCKETS: [&str; 7] = [
    "Owe > $5k",
    "Owe $1k–$5k",
    "Owe $1–$1k",
    "Roughly even (±$1)",
    "Refund $1–$2k",
    "Refund $2k–$5k",
    "Refund > $5k",
];

// Non-top buckets are half-open on the high side; only a refund strictly
// above $5k reaches the top bucket, so an exact $5,000 stays in $2k–$5k.
fn refund_bucket_label(refund_or_owed: f64) -> &'static str {
    if refund_or_owed > 5_000.0 {
        "Refund > $5k"
    } else if refund_or_owed >= 2_000.0 {
        "Refund $2k–$5k"
    } else if refund_or_owed >= 1.0 {
        "Refund $1–$2k"
    } else if refund_or_owed >= -1.0 {
        "Roughly even (±$1)"
    } else if refund_or_owed >= -1_000.0 {
        "Owe $1–$1k"
    } else if refund_or_owed >= -5_000.0 {
        "Owe $1k–$5k"
    } else {
        "Owe > $5k"
    }
}

fn refund_analysis(population: &[ComputedTaxpayerRecord]) -> RefundAnalysis {
    let refund_amounts: Vec<f64> = population
        .iter()
        .filter(|r| r.refund_or_owed >= 0.0)
        .map(|r| r.refund_or_owed)
        .collect();
    let owed_amounts: Vec<f64> = population
        .iter()
        .filter(|r| r.refund_or_owed < 0.0)
        .map(|r| -r.refund_or_owed)
        .collect();

    let bucket_distribution = REFUND_BUCKETS
        .iter()
        .map(|&label| RefundBucket {
            label,
            count: population
                .iter()
                .filter(|r| refund_bucket_label(r.refund_or_owed) == label)
                .count(),
        })
        .collect();

    RefundAnalysis {
        refund_count: refund_amounts.len(),
        owed_count: owed_amounts.len(),
        over_withheld_pct: percent(refund_amounts.len(), population.len()),
        refund_stats: summarize(&refund_amounts),
        owed_stats: summarize(&owed_amounts),
        bucket_distribution,
    }
}

fn state_analysis(
    population: &[ComputedTaxpayerRecord],
) -> BTreeMap<&'static str, StateBreakdown> {
    State::ALL
        .iter()
        .map(|state| {
            let subset: Vec<&ComputedTaxpayerRecord> = population
                .iter()
                .filter(|r| r.raw.state == *state)
                .collect();
            (
                state.code(),
                StateBreakdown {
                    count: subset.len(),
                    avg_income: mean_of(subset.iter().map(|r| r.total_income)),
                    avg_federal_tax: mean_of(subset.iter().map(|r| r.federal_tax)),
                    avg_state_tax: mean_of(subset.iter().map(|r| r.state_tax)),
                    avg_total_tax: mean_of(subset.iter().map(|r| r.total_tax_liability)),
                    avg_effective_rate: mean_of(subset.iter().map(|r| r.effective_tax_rate)),
                    total_state_revenue: subset.iter().map(|r| r.state_tax).sum(),
                },
            )
        })
        .collect()
}

fn capital_gains_analysis(population: &[ComputedTaxpayerRecord]) -> CapitalGainsAnalysis {
    let cg_filers: Vec<&ComputedTaxpayerRecord> =
        population.iter().filter(|r| r.raw.investment > 0.0).collect();

    let cg_values: Vec<f64> = cg_filers.iter().map(|r| r.raw.investment).collect();
    let dividend_values: Vec<f64> = population
        .iter()
        .filter(|r| r.raw.dividends > 0.0)
        .map(|r| r.raw.dividends)
        .collect();

    let cg_pct_of_income: Vec<f64> = cg_filers
        .iter()
        .filter(|r| r.total_income > 0.0)
        .map(|r| r.raw.investment / r.total_income * 100.0)
        .collect();

    CapitalGainsAnalysis {
        cg_filer_count: cg_filers.len(),
        cg_filer_pct: percent(cg_filers.len(), population.len()),
        capital_gains_stats: summarize(&cg_values),
        dividend_income_stats: summarize(&dividend_values),
        avg_cg_pct_of_income: mean_of(cg_pct_of_income.iter().copied()),
    }
}

fn credits_dependents_analysis(
    population: &[ComputedTaxpayerRecord],
) -> CreditsDependentsAnalysis {
    let credits: Vec<f64> = population.iter().map(|r| r.credits).collect();

    // 0–4 is the synthesizer's range; ingested populations may exceed it.
    let max_dependents = population
        .iter()
        .map(|r| r.raw.dependents)
        .max()
        .unwrap_or(0)
        .max(4);

    let mut dependent_distribution = BTreeMap::new();
    let mut avg_tax_by_dependents = BTreeMap::new();
    for dependents in 0..=max_dependents {
        let subset: Vec<&ComputedTaxpayerRecord> = population
            .iter()
            .filter(|r| r.raw.dependents == dependents)
            .collect();
        dependent_distribution.insert(dependents, subset.len());
        avg_tax_by_dependents.insert(
            dependents,
            mean_of(subset.iter().map(|r| r.total_tax_liability)),
        );
    }

    CreditsDependentsAnalysis {
        avg_credit: mean_of(credits.iter().copied()),
        total_credits_claimed: credits.iter().sum(),
        credit_stats: summarize(&credits),
        dependent_distribution,
        avg_tax_by_dependents,
    }
}

fn fica_analysis(population: &[ComputedTaxpayerRecord]) -> FicaAnalysis {
    let ss: Vec<f64> = population.iter().map(|r| r.social_security_tax).collect();
    let medicare: Vec<f64> = population.iter().map(|r| r.medicare_tax).collect();
    let fica_totals: Vec<f64> = population.iter().map(|r| r.fica_total).collect();

    let fica_pct_of_income: Vec<f64> = population
        .iter()
        .filter(|r| r.total_income > 0.0)
        .map(|r| r.fica_total / r.total_income * 100.0)
        .collect();

    FicaAnalysis {
        total_fica_collected: fica_totals.iter().sum(),
        avg_fica_pct_of_income: mean_of(fica_pct_of_income.iter().copied()),
        social_security_stats: summarize(&ss),
        medicare_stats: summarize(&medicare),
        fica_total_stats: summarize(&fica_totals),
    }
}

fn nonzero_stats(
    population: &[ComputedTaxpayerRecord],
    value: impl Fn(&ComputedTaxpayerRecord) -> f64,
) -> SummaryStats {
    let values: Vec<f64> = population
        .iter()
        .map(&value)
        .filter(|v| *v > 0.0)
        .collect();
    summarize(&values)
}

fn nonzero_stats_of(
    subset: &[&ComputedTaxpayerRecord],
    value: impl Fn(&ComputedTaxpayerRecord) -> f64,
) -> SummaryStats {
    let values: Vec<f64> = subset
        .iter()
        .map(|r| value(r))
        .filter(|v| *v > 0.0)
        .collect();
    summarize(&values)
}

fn mean_of(values: impl Iterator<Item = f64>) -> f64 {
    let mut total = 0.0;
    let mut count = 0_usize;
    for value in values {
        total += value;
        count += 1;
    }
    ratio(total, count)
}

fn ratio(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
