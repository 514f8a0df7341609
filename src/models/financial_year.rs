use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// An Indian fiscal year, 1 April to 31 March.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinancialYear {
    pub id: String,
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl FinancialYear {
    pub fn starting(start_year: i32) -> Option<Self> {
        let start_date = NaiveDate::from_ymd_opt(start_year, 4, 1)?;
        let end_date = NaiveDate::from_ymd_opt(start_year + 1, 3, 31)?;
        let short_end = (start_year + 1).rem_euclid(100);

        Some(Self {
            id: format!("FY{start_year}-{short_end:02}"),
            label: format!("FY {start_year}-{short_end:02}"),
            start_date,
            end_date,
        })
    }

    pub fn containing(date: NaiveDate) -> Option<Self> {
        let start_year = if date.month() >= 4 {
            date.year()
        } else {
            date.year() - 1
        };
        Self::starting(start_year)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Most recent first.
pub fn default_financial_years() -> Vec<FinancialYear> {
    [2024, 2023, 2022]
        .into_iter()
        .filter_map(FinancialYear::starting)
        .collect()
}
