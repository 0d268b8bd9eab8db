use std::f64::consts::TAU;

use super::law::{Bracket, FicaConstants, StateRate, TaxLawTable};
use super::types::{ComputedTaxpayerRecord, FilingStatus, RawTaxpayerRecord, State, ValidationError};

/// Applies the full per-record pipeline: deduction choice, federal and state
/// bracket integration, FICA, dependent credits, refund. Rejects malformed
/// input before touching any tax math.
pub fn compute(
    record: &RawTaxpayerRecord,
    tables: &TaxLawTable,
) -> Result<ComputedTaxpayerRecord, ValidationError> {
    validate_amounts(record)?;

    let total_income = record.wages
        + record.self_employment
        + record.investment
        + record.rental
        + record.retirement;

    let itemized_total = record.mortgage_interest
        + record.charitable
        + record.medical
        + record.salt.min(tables.salt_cap());
    let standard_deduction = tables.standard_deduction(record.filing_status);

    // Ties favor the standard deduction.
    let uses_itemized = itemized_total > standard_deduction;
    let deduction_used = if uses_itemized {
        itemized_total
    } else {
        standard_deduction
    };

    let parts = liability_parts(record, tables, total_income, deduction_used);

    let effective_tax_rate = if total_income > 0.0 {
        parts.total_tax_liability / total_income
    } else {
        0.0
    };

    Ok(ComputedTaxpayerRecord {
        raw: record.clone(),
        total_income,
        itemized_total,
        standard_deduction,
        deduction_used,
        uses_itemized,
        taxable_income: parts.taxable_income,
        federal_tax: parts.federal_tax,
        state_tax: parts.state_tax,
        social_security_tax: parts.social_security_tax,
        medicare_tax: parts.medicare_tax,
        fica_total: parts.social_security_tax + parts.medicare_tax,
        credits: parts.credits,
        total_tax_liability: parts.total_tax_liability,
        effective_tax_rate,
        marginal_tax_rate: parts.marginal_tax_rate,
        refund_or_owed: record.estimated_withholding - parts.total_tax_liability,
    })
}

/// Liability the record would carry under a forced deduction amount. Used by
/// the aggregation engine to price the itemize-vs-standard decision.
pub(crate) fn liability_with_deduction(
    record: &RawTaxpayerRecord,
    tables: &TaxLawTable,
    deduction_used: f64,
) -> f64 {
    let total_income = record.wages
        + record.self_employment
        + record.investment
        + record.rental
        + record.retirement;
    liability_parts(record, tables, total_income, deduction_used).total_tax_liability
}

struct LiabilityParts {
    taxable_income: f64,
    federal_tax: f64,
    state_tax: f64,
    social_security_tax: f64,
    medicare_tax: f64,
    credits: f64,
    marginal_tax_rate: f64,
    total_tax_liability: f64,
}

fn liability_parts(
    record: &RawTaxpayerRecord,
    tables: &TaxLawTable,
    total_income: f64,
    deduction_used: f64,
) -> LiabilityParts {
    let taxable_income = (total_income - deduction_used).max(0.0);

    let federal_brackets = tables.federal_brackets(record.filing_status);
    let federal_tax = bracket_tax(taxable_income, federal_brackets);
    let marginal_tax_rate = marginal_rate(taxable_income, federal_brackets);

    let state_tax = match tables.state_rate(record.state) {
        StateRate::Flat(rate) => taxable_income * rate,
        StateRate::Bracketed(brackets) => bracket_tax(taxable_income, brackets),
    };

    let earned = record.wages + record.self_employment;
    let (social_security_tax, medicare_tax) = fica_taxes(earned, tables.fica());

    let credits = (record.dependents as f64 * tables.credit_per_dependent())
        .min(total_income * tables.credit_income_cap_fraction());

    let pre_credit = federal_tax + state_tax + social_security_tax + medicare_tax;
    let total_tax_liability = (pre_credit - credits).max(0.0);

    LiabilityParts {
        taxable_income,
        federal_tax,
        state_tax,
        social_security_tax,
        medicare_tax,
        credits,
        marginal_tax_rate,
        total_tax_liability,
    }
}

/// Slice-integrates a progressive schedule: each bracket taxes the portion of
/// income within [lower, next_lower) at its own rate.
fn bracket_tax(taxable_income: f64, brackets: &[Bracket]) -> f64 {
    let mut tax = 0.0;
    for (idx, bracket) in brackets.iter().enumerate() {
        if taxable_income <= bracket.lower {
            break;
        }
        let upper = brackets
            .get(idx + 1)
            .map(|next| next.lower)
            .unwrap_or(f64::INFINITY);
        tax += (taxable_income.min(upper) - bracket.lower) * bracket.rate;
    }
    tax
}

/// Rate of the highest bracket that receives a strictly positive slice; the
/// bottom rate when nothing is taxable.
fn marginal_rate(taxable_income: f64, brackets: &[Bracket]) -> f64 {
    if brackets.is_empty() {
        return 0.0;
    }
    let idx = brackets
        .partition_point(|b| b.lower < taxable_income)
        .saturating_sub(1);
    brackets[idx].rate
}

fn fica_taxes(earned: f64, fica: FicaConstants) -> (f64, f64) {
    let social_security = earned.min(fica.ss_wage_base) * fica.ss_rate;
    let medicare = earned * fica.medicare_rate
        + (earned - fica.additional_medicare_threshold).max(0.0) * fica.additional_medicare_rate;
    (social_security, medicare)
}

fn validate_amounts(record: &RawTaxpayerRecord) -> Result<(), ValidationError> {
    for (field, value) in [
        ("wages", record.wages),
        ("self_employment", record.self_employment),
        ("investment", record.investment),
        ("dividends", record.dividends),
        ("rental", record.rental),
        ("retirement", record.retirement),
        ("mortgage_interest", record.mortgage_interest),
        ("charitable", record.charitable),
        ("medical", record.medical),
        ("salt", record.salt),
        ("estimated_withholding", record.estimated_withholding),
    ] {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteAmount {
                id: record.id,
                field,
            });
        }
        if value < 0.0 {
            return Err(ValidationError::NegativeAmount {
                id: record.id,
                field,
                value,
            });
        }
    }

    if record.dividends > record.investment {
        return Err(ValidationError::DividendsExceedInvestment {
            id: record.id,
            dividends: record.dividends,
            investment: record.investment,
        });
    }

    Ok(())
}

/// Synthesizes `count` fully computed records. Identical (count, seed) pairs
/// yield identical populations; each record draws from its own derived stream
/// so a record's content does not depend on how many precede it.
pub fn generate(
    count: u32,
    seed: u64,
    tables: &TaxLawTable,
) -> Result<Vec<ComputedTaxpayerRecord>, ValidationError> {
    let mut population = Vec::with_capacity(count as usize);
    for id in 1..=count as u64 {
        let mut draws = DrawStream::for_record(seed, id);
        let mut raw = draw_raw_record(id, &mut draws);

        // Learn the true liability first so withholding can straddle it. The
        // synthesizer never prices tax itself.
        let probe = compute(&raw, tables)?;
        raw.estimated_withholding = probe.total_tax_liability * draws.uniform(0.85, 1.15);

        population.push(compute(&raw, tables)?);
    }
    Ok(population)
}

const FILING_STATUS_WEIGHTS: [f64; 3] = [0.50, 0.35, 0.15];

// Roughly filer-population proportioned, indexed in State::ALL order.
const STATE_WEIGHTS: [f64; 10] = [12.0, 6.0, 9.0, 7.0, 2.5, 4.0, 3.6, 3.3, 3.4, 2.7];

fn draw_raw_record(id: u64, draws: &mut DrawStream) -> RawTaxpayerRecord {
    let filing_status = FilingStatus::ALL[draws.weighted_index(&FILING_STATUS_WEIGHTS)];
    let state = State::ALL[draws.weighted_index(&STATE_WEIGHTS)];

    let wage_median = match filing_status {
        FilingStatus::Single => 52_000.0,
        FilingStatus::Married => 86_000.0,
        FilingStatus::HeadOfHousehold => 58_000.0,
    } * state_cost_factor(state);

    let wages = if draws.chance(0.88) {
        draws.lognormal(wage_median, 0.65)
    } else {
        0.0
    };
    let self_employment = if draws.chance(0.18) {
        draws.lognormal(28_000.0, 0.90)
    } else {
        0.0
    };
    let investment = if draws.chance(0.35) {
        draws.lognormal(9_000.0, 1.40)
    } else {
        0.0
    };
    let dividends = if investment > 0.0 && draws.chance(0.55) {
        investment * draws.uniform(0.05, 0.60)
    } else {
        0.0
    };
    let rental = if draws.chance(0.12) {
        draws.lognormal(14_000.0, 0.80)
    } else {
        0.0
    };
    let retirement = if draws.chance(0.15) {
        draws.lognormal(26_000.0, 0.60)
    } else {
        0.0
    };

    let income = wages + self_employment + investment + rental + retirement;

    let mortgage_propensity = if income > 60_000.0 { 0.45 } else { 0.15 };
    let mortgage_interest = if draws.chance(mortgage_propensity) {
        (income * draws.uniform(0.03, 0.09)).min(40_000.0)
    } else {
        0.0
    };
    let charitable = if draws.chance(0.55) {
        income * draws.uniform(0.005, 0.04)
    } else {
        0.0
    };
    let medical = if draws.chance(0.25) {
        draws.lognormal(1_200.0, 1.20).min(60_000.0)
    } else {
        0.0
    };
    let salt = if draws.chance(0.70) {
        income * draws.uniform(0.02, 0.06) * state_expense_factor(state)
    } else {
        0.0
    };

    let dependents = draws.weighted_index(&[0.34, 0.25, 0.24, 0.11, 0.06]) as u32;

    RawTaxpayerRecord {
        id,
        filing_status,
        state,
        dependents,
        wages,
        self_employment,
        investment,
        dividends,
        rental,
        retirement,
        mortgage_interest,
        charitable,
        medical,
        salt,
        estimated_withholding: 0.0,
    }
}

fn state_cost_factor(state: State) -> f64 {
    match state {
        State::Ca => 1.25,
        State::Ny => 1.20,
        State::Wa => 1.15,
        State::Va => 1.05,
        State::Il => 1.00,
        State::Fl | State::Ga | State::Nc => 0.95,
        State::Tx | State::Oh => 0.92,
    }
}

// Expense realism only; the law tables own the actual state rates.
fn state_expense_factor(state: State) -> f64 {
    match state {
        State::Ca => 1.60,
        State::Ny => 1.50,
        State::Il => 1.10,
        State::Va | State::Ga | State::Nc | State::Oh => 1.00,
        State::Tx | State::Fl | State::Wa => 0.50,
    }
}

const STREAM_INCREMENT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic draw source for one synthesized record, keyed by the
/// population seed and the record id. Steps a counter through a 64-bit mix,
/// so record N's draws never shift when the population grows.
struct DrawStream {
    counter: u64,
}

impl DrawStream {
    fn for_record(population_seed: u64, id: u64) -> Self {
        Self {
            counter: mix64(population_seed ^ id.wrapping_mul(STREAM_INCREMENT)),
        }
    }

    fn next_bits(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(STREAM_INCREMENT);
        mix64(self.counter)
    }

    /// Uniform draw in [0, 1) with 53 bits of precision.
    fn unit(&mut self) -> f64 {
        (self.next_bits() >> 11) as f64 / (1_u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.unit()
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.unit() < probability
    }

    fn weighted_index(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut target = self.unit() * total;
        for (idx, weight) in weights.iter().enumerate() {
            target -= weight;
            if target < 0.0 {
                return idx;
            }
        }
        weights.len() - 1
    }

    // Box-Muller, cosine branch only.
    fn gaussian(&mut self) -> f64 {
        let radius = (-2.0 * self.unit().max(f64::MIN_POSITIVE).ln()).sqrt();
        radius * (TAU * self.unit()).cos()
    }

    fn lognormal(&mut self, median: f64, sigma: f64) -> f64 {
        median * (sigma * self.gaussian()).exp()
    }
}

fn mix64(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::law::{PerStatus, StateRates, TaxLawConfig};
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn b(lower: f64, rate: f64) -> Bracket {
        Bracket { lower, rate }
    }

    // Small illustrative table so expected figures stay hand-checkable; the
    // frozen 2024 table is exercised separately.
    fn test_tables() -> TaxLawTable {
        TaxLawTable::new(TaxLawConfig {
            federal: PerStatus {
                single: vec![b(0.0, 0.10), b(11_000.0, 0.12), b(44_725.0, 0.22)],
                married: vec![b(0.0, 0.10), b(22_000.0, 0.12), b(89_450.0, 0.22)],
                head_of_household: vec![b(0.0, 0.10), b(15_700.0, 0.12), b(59_850.0, 0.22)],
            },
            standard_deduction: PerStatus {
                single: 10_000.0,
                married: 20_000.0,
                head_of_household: 15_000.0,
            },
            fica: FicaConstants {
                ss_rate: 0.062,
                ss_wage_base: 168_600.0,
                medicare_rate: 0.0145,
                additional_medicare_rate: 0.009,
                additional_medicare_threshold: 200_000.0,
            },
            state_rates: StateRates {
                ca: StateRate::Bracketed(vec![b(0.0, 0.02), b(50_000.0, 0.08)]),
                ny: StateRate::Flat(0.05),
                tx: StateRate::Flat(0.0),
                fl: StateRate::Flat(0.0),
                wa: StateRate::Flat(0.0),
                il: StateRate::Flat(0.0495),
                oh: StateRate::Flat(0.04),
                ga: StateRate::Flat(0.055),
                nc: StateRate::Flat(0.0525),
                va: StateRate::Flat(0.0575),
            },
            salt_cap: 10_000.0,
            credit_per_dependent: 2_000.0,
            credit_income_cap_fraction: 0.20,
        })
        .expect("test table must be valid")
    }

    fn sample_record() -> RawTaxpayerRecord {
        RawTaxpayerRecord {
            id: 1,
            filing_status: FilingStatus::Single,
            state: State::Tx,
            dependents: 0,
            wages: 60_000.0,
            self_employment: 0.0,
            investment: 0.0,
            dividends: 0.0,
            rental: 0.0,
            retirement: 0.0,
            mortgage_interest: 0.0,
            charitable: 0.0,
            medical: 0.0,
            salt: 0.0,
            estimated_withholding: 0.0,
        }
    }

    #[test]
    fn federal_tax_slice_integrates_brackets() {
        // wages 60k - 10k standard = 50k taxable:
        // 11_000 * 10% + 33_725 * 12% + 5_275 * 22% = 6_307.50
        let computed = compute(&sample_record(), &test_tables()).expect("valid record");
        assert_approx(computed.taxable_income, 50_000.0);
        assert_approx(computed.federal_tax, 6_307.50);
        assert_approx(computed.marginal_tax_rate, 0.22);
    }

    #[test]
    fn marginal_rate_at_exact_boundary_stays_in_lower_bracket() {
        let mut record = sample_record();
        record.wages = 21_000.0; // taxable exactly 11_000
        let computed = compute(&record, &test_tables()).expect("valid record");
        assert_approx(computed.taxable_income, 11_000.0);
        assert_approx(computed.marginal_tax_rate, 0.10);
    }

    #[test]
    fn marginal_rate_at_zero_taxable_is_bottom_rate() {
        let mut record = sample_record();
        record.wages = 5_000.0; // below the standard deduction
        let computed = compute(&record, &test_tables()).expect("valid record");
        assert_approx(computed.taxable_income, 0.0);
        assert_approx(computed.marginal_tax_rate, 0.10);
    }

    #[test]
    fn social_security_stops_at_wage_base() {
        let mut record = sample_record();
        record.wages = 200_000.0;
        let computed = compute(&record, &test_tables()).expect("valid record");
        assert_approx(computed.social_security_tax, 168_600.0 * 0.062);
        assert_approx(computed.social_security_tax, 10_453.20);
        // Exactly at the additional-Medicare threshold: no surtax yet.
        assert_approx(computed.medicare_tax, 200_000.0 * 0.0145);
    }

    #[test]
    fn additional_medicare_applies_above_threshold() {
        let mut record = sample_record();
        record.wages = 180_000.0;
        record.self_employment = 70_000.0;
        let computed = compute(&record, &test_tables()).expect("valid record");
        let earned = 250_000.0;
        assert_approx(
            computed.medicare_tax,
            earned * 0.0145 + 50_000.0 * 0.009,
        );
    }

    #[test]
    fn state_tax_uses_flat_rate() {
        let mut record = sample_record();
        record.state = State::Ny;
        let computed = compute(&record, &test_tables()).expect("valid record");
        assert_approx(computed.state_tax, 50_000.0 * 0.05);
    }

    #[test]
    fn state_tax_slice_integrates_bracketed_states() {
        let mut record = sample_record();
        record.state = State::Ca;
        record.wages = 70_000.0; // taxable 60k: 50k * 2% + 10k * 8%
        let computed = compute(&record, &test_tables()).expect("valid record");
        assert_approx(computed.state_tax, 1_000.0 + 800.0);
    }

    #[test]
    fn zero_rate_state_owes_nothing() {
        let computed = compute(&sample_record(), &test_tables()).expect("valid record");
        assert_approx(computed.state_tax, 0.0);
    }

    #[test]
    fn salt_is_clipped_before_comparing_deductions() {
        let mut record = sample_record();
        record.salt = 25_000.0;
        record.mortgage_interest = 2_000.0;
        let computed = compute(&record, &test_tables()).expect("valid record");
        assert_approx(computed.itemized_total, 12_000.0);
        assert!(computed.uses_itemized);
        assert_approx(computed.deduction_used, 12_000.0);
    }

    #[test]
    fn deduction_tie_favors_standard() {
        let mut record = sample_record();
        record.charitable = 10_000.0; // equals the standard deduction exactly
        let computed = compute(&record, &test_tables()).expect("valid record");
        assert_approx(computed.itemized_total, 10_000.0);
        assert!(!computed.uses_itemized);
        assert_approx(computed.deduction_used, 10_000.0);
    }

    #[test]
    fn dependent_credit_is_capped_by_income_fraction() {
        let mut record = sample_record();
        record.wages = 15_000.0;
        record.dependents = 2;
        let computed = compute(&record, &test_tables()).expect("valid record");
        // 2 * 2_000 = 4_000, capped at 20% of 15_000 = 3_000.
        assert_approx(computed.credits, 3_000.0);
    }

    #[test]
    fn credits_floor_liability_at_zero() {
        let mut record = sample_record();
        record.wages = 18_000.0;
        record.dependents = 4;
        let computed = compute(&record, &test_tables()).expect("valid record");
        assert!(computed.credits > 0.0);
        assert!(computed.total_tax_liability >= 0.0);
        assert_approx(
            computed.refund_or_owed,
            record.estimated_withholding - computed.total_tax_liability,
        );
    }

    #[test]
    fn zero_income_record_derives_all_zero_taxes() {
        let mut record = sample_record();
        record.wages = 0.0;
        record.estimated_withholding = 500.0;
        let computed = compute(&record, &test_tables()).expect("valid record");
        assert_approx(computed.total_income, 0.0);
        assert_approx(computed.taxable_income, 0.0);
        assert_approx(computed.federal_tax, 0.0);
        assert_approx(computed.state_tax, 0.0);
        assert_approx(computed.fica_total, 0.0);
        assert_approx(computed.credits, 0.0);
        assert_approx(computed.total_tax_liability, 0.0);
        assert_approx(computed.effective_tax_rate, 0.0);
        assert!(computed.effective_tax_rate.is_finite());
        assert_approx(computed.refund_or_owed, 500.0);
    }

    #[test]
    fn rejects_negative_amounts() {
        let mut record = sample_record();
        record.rental = -1.0;
        let err = compute(&record, &test_tables()).expect_err("must reject");
        assert!(matches!(
            err,
            ValidationError::NegativeAmount { field: "rental", .. }
        ));
    }

    #[test]
    fn rejects_non_finite_amounts() {
        let mut record = sample_record();
        record.medical = f64::NAN;
        let err = compute(&record, &test_tables()).expect_err("must reject");
        assert!(matches!(
            err,
            ValidationError::NonFiniteAmount { field: "medical", .. }
        ));
    }

    #[test]
    fn rejects_dividends_above_investment() {
        let mut record = sample_record();
        record.investment = 1_000.0;
        record.dividends = 1_500.0;
        let err = compute(&record, &test_tables()).expect_err("must reject");
        assert!(matches!(
            err,
            ValidationError::DividendsExceedInvestment { .. }
        ));
    }

    #[test]
    fn counterfactual_liability_matches_forced_deduction() {
        let tables = test_tables();
        let mut record = sample_record();
        record.salt = 9_000.0;
        record.mortgage_interest = 8_000.0;
        let computed = compute(&record, &tables).expect("valid record");
        assert!(computed.uses_itemized);

        let forced_standard =
            liability_with_deduction(&record, &tables, computed.standard_deduction);
        assert!(forced_standard >= computed.total_tax_liability);

        let forced_itemized = liability_with_deduction(&record, &tables, computed.itemized_total);
        assert_approx(forced_itemized, computed.total_tax_liability);
    }

    #[test]
    fn generate_is_deterministic_for_a_seed() {
        let tables = test_tables();
        let first = generate(500, 42, &tables).expect("generation succeeds");
        let second = generate(500, 42, &tables).expect("generation succeeds");
        assert_eq!(first, second);

        let other_seed = generate(500, 43, &tables).expect("generation succeeds");
        assert_ne!(first, other_seed);
    }

    #[test]
    fn generate_record_content_is_stable_under_population_growth() {
        let tables = test_tables();
        let small = generate(50, 7, &tables).expect("generation succeeds");
        let large = generate(100, 7, &tables).expect("generation succeeds");
        assert_eq!(small.as_slice(), &large[..50]);
    }

    #[test]
    fn generate_produces_sequential_ids_and_requested_count() {
        let tables = test_tables();
        let population = generate(120, 9, &tables).expect("generation succeeds");
        assert_eq!(population.len(), 120);
        for (idx, record) in population.iter().enumerate() {
            assert_eq!(record.raw.id, idx as u64 + 1);
        }
    }

    #[test]
    fn generated_withholding_straddles_the_true_liability() {
        let tables = test_tables();
        let population = generate(300, 11, &tables).expect("generation succeeds");
        let mut refunds = 0_usize;
        let mut owed = 0_usize;
        for record in &population {
            if record.total_tax_liability > 0.0 {
                let factor = record.raw.estimated_withholding / record.total_tax_liability;
                assert!(
                    (0.85 - EPS..=1.15 + EPS).contains(&factor),
                    "withholding factor {factor} out of range"
                );
            }
            if record.refund_or_owed >= 0.0 {
                refunds += 1;
            } else {
                owed += 1;
            }
        }
        // The offset is two-sided, so a 300-record draw shows both outcomes.
        assert!(refunds > 0);
        assert!(owed > 0);
    }

    #[test]
    fn generated_population_covers_every_status_and_state() {
        let tables = test_tables();
        let population = generate(500, 42, &tables).expect("generation succeeds");
        for status in FilingStatus::ALL {
            assert!(
                population.iter().any(|r| r.raw.filing_status == status),
                "missing filing status {status:?}"
            );
        }
        for state in State::ALL {
            assert!(
                population.iter().any(|r| r.raw.state == state),
                "missing state {state:?}"
            );
        }
        assert!(population.iter().any(|r| r.raw.dependents > 0));
        assert!(population.iter().any(|r| r.uses_itemized));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_deduction_and_liability_invariants(
            wages in 0u32..400_000,
            self_employment in 0u32..200_000,
            investment in 0u32..300_000,
            dividend_pct in 0u32..=100,
            rental in 0u32..100_000,
            retirement in 0u32..120_000,
            mortgage in 0u32..40_000,
            charitable in 0u32..30_000,
            medical in 0u32..50_000,
            salt in 0u32..40_000,
            withholding in 0u32..80_000,
            dependents in 0u32..5,
            status_idx in 0usize..3,
            state_idx in 0usize..10,
        ) {
            let tables = test_tables();
            let investment = investment as f64;
            let record = RawTaxpayerRecord {
                id: 1,
                filing_status: FilingStatus::ALL[status_idx],
                state: State::ALL[state_idx],
                dependents,
                wages: wages as f64,
                self_employment: self_employment as f64,
                investment,
                dividends: investment * dividend_pct as f64 / 100.0,
                rental: rental as f64,
                retirement: retirement as f64,
                mortgage_interest: mortgage as f64,
                charitable: charitable as f64,
                medical: medical as f64,
                salt: salt as f64,
                estimated_withholding: withholding as f64,
            };

            let computed = compute(&record, &tables).expect("valid record");

            let expected_taxable =
                (computed.total_income - computed.deduction_used).max(0.0);
            prop_assert!((computed.taxable_income - expected_taxable).abs() <= EPS);
            prop_assert!(computed.taxable_income <= computed.total_income + EPS);
            prop_assert!(computed.total_tax_liability >= 0.0);
            prop_assert!(computed.effective_tax_rate.is_finite());
            prop_assert!(computed.effective_tax_rate >= 0.0);
            prop_assert!(
                computed.uses_itemized
                    == (computed.itemized_total > computed.standard_deduction)
            );
            prop_assert!(computed.deduction_used + EPS
                >= computed.itemized_total.max(computed.standard_deduction));
            prop_assert!(
                (computed.refund_or_owed
                    - (record.estimated_withholding - computed.total_tax_liability))
                    .abs()
                    <= EPS
            );
            prop_assert!(computed.fica_total >= 0.0);
            prop_assert!(computed.marginal_tax_rate >= 0.0);
            prop_assert!(computed.marginal_tax_rate <= 1.0);
        }
    }
}
