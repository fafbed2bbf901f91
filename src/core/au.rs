use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Serialize, Serializer};
use std::path::Path;

/// Taxpayer category, which decides the CGT discount rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityType {
    #[default]
    Individual,
    Trust,
    SuperFund,
    Company,
}

impl EntityType {
    /// Share of a discount-eligible gain that is disregarded
    pub fn discount_rate(&self) -> Decimal {
        match self {
            EntityType::Individual | EntityType::Trust => dec!(0.5),
            // Complying superannuation funds get one third
            EntityType::SuperFund => Decimal::ONE / Decimal::from(3),
            EntityType::Company => Decimal::ZERO,
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            EntityType::Individual => "individual",
            EntityType::Trust => "trust",
            EntityType::SuperFund => "super fund",
            EntityType::Company => "company",
        }
    }
}

/// Australian financial year (runs 1 July to 30 June)
/// The year value represents the end year (e.g., 2023 = 2022/23 financial year)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FinancialYear(pub i32);

impl FinancialYear {
    /// Financial year containing a date. 30 June closes a year, 1 July opens the next.
    pub fn from_date(date: NaiveDate) -> Self {
        if date.month() >= 7 {
            FinancialYear(date.year() + 1)
        } else {
            FinancialYear(date.year())
        }
    }

    /// 1 July of the previous calendar year
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0 - 1, 7, 1).unwrap_or(NaiveDate::MIN)
    }

    /// 30 June
    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 6, 30).unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::from_date(date) == *self
    }

    /// Display as "2022/23" format
    pub fn display(&self) -> String {
        format!("{}/{:02}", self.0 - 1, self.0 % 100)
    }

    /// Broker file-name form, "FY22_23"
    pub fn label(&self) -> String {
        format!("FY{:02}_{:02}", (self.0 - 1) % 100, self.0 % 100)
    }

    /// Parse the year out of a `<broker>_FY22_23.<ext>` style file name.
    ///
    /// Two-digit years are read as 20xx. The second pair must follow the first.
    pub fn from_file_name(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        let (_, rest) = stem.rsplit_once("FY")?;
        let (start, end) = rest.split_once('_')?;
        if start.len() != 2 || end.len() != 2 {
            return None;
        }
        let start: i32 = start.parse().ok()?;
        let end: i32 = end.parse().ok()?;
        if (start + 1) % 100 != end {
            return None;
        }
        Some(FinancialYear(2000 + start + 1))
    }
}

impl std::fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl Serialize for FinancialYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display())
    }
}

/// Parameters of a CGT run
#[derive(Debug, Clone)]
pub struct CgtRules {
    pub entity: EntityType,
    /// Holding periods longer than this many days are discount-eligible
    pub discount_threshold_days: i64,
    /// First date a trade may carry
    pub earliest_date: NaiveDate,
    /// Last financial year a trade may fall in, if bounded
    pub latest_year: Option<FinancialYear>,
}

impl CgtRules {
    pub fn discount_rate(&self) -> Decimal {
        self.entity.discount_rate()
    }

    pub fn is_discount_eligible(&self, holding_days: i64) -> bool {
        holding_days > self.discount_threshold_days
    }

    /// Whether a date falls inside a financial year this run recognises
    pub fn recognises(&self, date: NaiveDate) -> bool {
        date >= self.earliest_date
            && self
                .latest_year
                .is_none_or(|latest| FinancialYear::from_date(date) <= latest)
    }
}

impl Default for CgtRules {
    fn default() -> Self {
        CgtRules {
            entity: EntityType::Individual,
            discount_threshold_days: 365,
            // Assets acquired before 20 September 1985 are outside the CGT regime
            earliest_date: NaiveDate::from_ymd_opt(1985, 9, 20).unwrap_or(NaiveDate::MIN),
            latest_year: None,
        }
    }
}
