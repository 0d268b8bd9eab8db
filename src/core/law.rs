use super::types::{ConfigurationError, FilingStatus, State};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lower: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateRate {
    Flat(f64),
    Bracketed(Vec<Bracket>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FicaConstants {
    pub ss_rate: f64,
    pub ss_wage_base: f64,
    pub medicare_rate: f64,
    pub additional_medicare_rate: f64,
    pub additional_medicare_threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerStatus<T> {
    pub single: T,
    pub married: T,
    pub head_of_household: T,
}

impl<T> PerStatus<T> {
    pub fn get(&self, status: FilingStatus) -> &T {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::Married => &self.married,
            FilingStatus::HeadOfHousehold => &self.head_of_household,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateRates {
    pub ca: StateRate,
    pub ny: StateRate,
    pub tx: StateRate,
    pub fl: StateRate,
    pub wa: StateRate,
    pub il: StateRate,
    pub oh: StateRate,
    pub ga: StateRate,
    pub nc: StateRate,
    pub va: StateRate,
}

impl StateRates {
    fn get(&self, state: State) -> &StateRate {
        match state {
            State::Ca => &self.ca,
            State::Ny => &self.ny,
            State::Tx => &self.tx,
            State::Fl => &self.fl,
            State::Wa => &self.wa,
            State::Il => &self.il,
            State::Oh => &self.oh,
            State::Ga => &self.ga,
            State::Nc => &self.nc,
            State::Va => &self.va,
        }
    }
}

/// Everything `TaxLawTable::new` needs; kept separate so tests can build
/// deliberately malformed tables.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxLawConfig {
    pub federal: PerStatus<Vec<Bracket>>,
    pub standard_deduction: PerStatus<f64>,
    pub fica: FicaConstants,
    pub state_rates: StateRates,
    pub salt_cap: f64,
    pub credit_per_dependent: f64,
    pub credit_income_cap_fraction: f64,
}

/// Frozen tax-law input for one filing year. Constructed once at startup and
/// passed by reference into every computation; never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxLawTable {
    federal: PerStatus<Vec<Bracket>>,
    standard_deduction: PerStatus<f64>,
    fica: FicaConstants,
    state_rates: StateRates,
    salt_cap: f64,
    credit_per_dependent: f64,
    credit_income_cap_fraction: f64,
}

impl TaxLawTable {
    pub fn new(config: TaxLawConfig) -> Result<Self, ConfigurationError> {
        for status in FilingStatus::ALL {
            let table = format!("federal {}", status.label());
            validate_brackets(&table, config.federal.get(status))?;

            let deduction = *config.standard_deduction.get(status);
            if !deduction.is_finite() || deduction <= 0.0 {
                return Err(ConfigurationError::InvalidStandardDeduction {
                    status: status.label(),
                    value: deduction,
                });
            }
        }

        for state in State::ALL {
            let table = format!("state {}", state.code());
            match config.state_rates.get(state) {
                StateRate::Flat(rate) => {
                    if !(0.0..=1.0).contains(rate) {
                        return Err(ConfigurationError::RateOutOfRange { table, rate: *rate });
                    }
                }
                StateRate::Bracketed(brackets) => validate_brackets(&table, brackets)?,
            }
        }

        for (name, value) in [
            ("ss_rate", config.fica.ss_rate),
            ("ss_wage_base", config.fica.ss_wage_base),
            ("medicare_rate", config.fica.medicare_rate),
            ("additional_medicare_rate", config.fica.additional_medicare_rate),
            (
                "additional_medicare_threshold",
                config.fica.additional_medicare_threshold,
            ),
            ("salt_cap", config.salt_cap),
            ("credit_per_dependent", config.credit_per_dependent),
            (
                "credit_income_cap_fraction",
                config.credit_income_cap_fraction,
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::NegativeConstant { name, value });
            }
        }

        Ok(Self {
            federal: config.federal,
            standard_deduction: config.standard_deduction,
            fica: config.fica,
            state_rates: config.state_rates,
            salt_cap: config.salt_cap,
            credit_per_dependent: config.credit_per_dependent,
            credit_income_cap_fraction: config.credit_income_cap_fraction,
        })
    }

    pub fn federal_brackets(&self, status: FilingStatus) -> &[Bracket] {
        self.federal.get(status)
    }

    pub fn standard_deduction(&self, status: FilingStatus) -> f64 {
        *self.standard_deduction.get(status)
    }

    pub fn fica(&self) -> FicaConstants {
        self.fica
    }

    pub fn state_rate(&self, state: State) -> &StateRate {
        self.state_rates.get(state)
    }

    pub fn salt_cap(&self) -> f64 {
        self.salt_cap
    }

    pub fn credit_per_dependent(&self) -> f64 {
        self.credit_per_dependent
    }

    pub fn credit_income_cap_fraction(&self) -> f64 {
        self.credit_income_cap_fraction
    }

    /// Distinct federal rates across all filing statuses, ascending. These
    /// are the marginal-distribution dimension keys.
    pub fn federal_rates(&self) -> Vec<f64> {
        let mut rates: Vec<f64> = FilingStatus::ALL
            .iter()
            .flat_map(|status| self.federal.get(*status).iter().map(|b| b.rate))
            .collect();
        rates.sort_by(|a, b| a.total_cmp(b));
        rates.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
        rates
    }

    /// The frozen 2024 table: IRS federal schedules per filing status, 2024
    /// FICA constants, and the ten supported states (CA and NY bracketed,
    /// TX/FL/WA untaxed, the rest flat).
    pub fn year_2024() -> Result<Self, ConfigurationError> {
        Self::new(TaxLawConfig {
            federal: PerStatus {
                single: vec![
                    b(0.0, 0.10),
                    b(11_600.0, 0.12),
                    b(47_150.0, 0.22),
                    b(100_525.0, 0.24),
                    b(191_950.0, 0.32),
                    b(243_725.0, 0.35),
                    b(609_350.0, 0.37),
                ],
                married: vec![
                    b(0.0, 0.10),
                    b(23_200.0, 0.12),
                    b(94_300.0, 0.22),
                    b(201_050.0, 0.24),
                    b(383_900.0, 0.32),
                    b(487_450.0, 0.35),
                    b(731_200.0, 0.37),
                ],
                head_of_household: vec![
                    b(0.0, 0.10),
                    b(16_550.0, 0.12),
                    b(63_100.0, 0.22),
                    b(100_500.0, 0.24),
                    b(191_950.0, 0.32),
                    b(243_700.0, 0.35),
                    b(609_350.0, 0.37),
                ],
            },
            standard_deduction: PerStatus {
                single: 14_600.0,
                married: 29_200.0,
                head_of_household: 21_900.0,
            },
            fica: FicaConstants {
                ss_rate: 0.062,
                ss_wage_base: 168_600.0,
                medicare_rate: 0.0145,
                additional_medicare_rate: 0.009,
                additional_medicare_threshold: 200_000.0,
            },
            state_rates: StateRates {
                ca: StateRate::Bracketed(vec![
                    b(0.0, 0.01),
                    b(10_412.0, 0.02),
                    b(24_684.0, 0.04),
                    b(38_959.0, 0.06),
                    b(54_081.0, 0.08),
                    b(68_350.0, 0.093),
                    b(349_137.0, 0.103),
                    b(418_961.0, 0.113),
                    b(698_271.0, 0.123),
                ]),
                ny: StateRate::Bracketed(vec![
                    b(0.0, 0.04),
                    b(8_500.0, 0.045),
                    b(11_700.0, 0.0525),
                    b(13_900.0, 0.055),
                    b(80_650.0, 0.06),
                    b(215_400.0, 0.0685),
                    b(1_077_550.0, 0.0965),
                    b(5_000_000.0, 0.103),
                    b(25_000_000.0, 0.109),
                ]),
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
    }
}

fn validate_brackets(table: &str, brackets: &[Bracket]) -> Result<(), ConfigurationError> {
    let Some(first) = brackets.first() else {
        return Err(ConfigurationError::EmptyBrackets {
            table: table.to_string(),
        });
    };

    if first.lower != 0.0 {
        return Err(ConfigurationError::FirstBracketNonZero {
            table: table.to_string(),
            lower: first.lower,
        });
    }

    for bracket in brackets {
        if !(0.0..=1.0).contains(&bracket.rate) {
            return Err(ConfigurationError::RateOutOfRange {
                table: table.to_string(),
                rate: bracket.rate,
            });
        }
    }

    for pair in brackets.windows(2) {
        if pair[1].lower <= pair[0].lower || !pair[1].lower.is_finite() {
            return Err(ConfigurationError::UnsortedBrackets {
                table: table.to_string(),
                prev: pair[0].lower,
                next: pair[1].lower,
            });
        }
        if pair[1].rate < pair[0].rate {
            return Err(ConfigurationError::DecreasingRates {
                table: table.to_string(),
                prev: pair[0].rate,
                next: pair[1].rate,
            });
        }
    }

    Ok(())
}

fn b(lower: f64, rate: f64) -> Bracket {
    Bracket { lower, rate }
}
