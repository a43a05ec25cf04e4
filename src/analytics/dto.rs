use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
pub struct AnalyticsResponse {
    pub summary: Summary,
    pub charts: Charts,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expense: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_expense: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Charts {
    pub monthly: Vec<MonthlyBucket>,
    pub categories: Vec<CategoryBucket>,
}

/// One calendar month of the chart series.
#[derive(Debug, Serialize, PartialEq)]
pub struct MonthlyBucket {
    /// `YYYY-MM`
    pub month: String,
    /// Short label, e.g. `Oct`.
    pub name: &'static str,
    #[serde(with = "rust_decimal::serde::float")]
    pub income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub expense: Decimal,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CategoryBucket {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}
