use std::collections::BTreeMap;

use anyhow::anyhow;
use rust_decimal::Decimal;
use time::{Month, OffsetDateTime, UtcOffset};

use super::dto::{AnalyticsResponse, CategoryBucket, Charts, MonthlyBucket, Summary};
use super::repo::LedgerPoint;
use crate::error::AppResult;
use crate::ledger::UNCATEGORIZED;

/// Number of calendar months in the chart series, current month included.
pub const SERIES_MONTHS: usize = 6;

fn short_name(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

/// Calendar (year, month) of an instant, in UTC.
fn year_month(at: OffsetDateTime) -> (i32, Month) {
    let utc = at.to_offset(UtcOffset::UTC);
    (utc.year(), utc.month())
}

/// The `SERIES_MONTHS` months ending with `now`'s month, oldest first.
pub fn trailing_months(now: OffsetDateTime) -> Vec<(i32, Month)> {
    let (mut year, mut month) = year_month(now);
    let mut out = Vec::with_capacity(SERIES_MONTHS);
    for _ in 0..SERIES_MONTHS {
        out.push((year, month));
        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }
    out.reverse();
    out
}

fn add(acc: Decimal, amount: Decimal) -> AppResult<Decimal> {
    acc.checked_add(amount)
        .ok_or_else(|| anyhow!("amount overflow while aggregating").into())
}

fn sum<'a>(amounts: impl IntoIterator<Item = &'a Decimal>) -> AppResult<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, a| add(acc, *a))
}

fn sum_in_month(points: &[LedgerPoint], ym: (i32, Month)) -> AppResult<Decimal> {
    sum(points
        .iter()
        .filter(|p| year_month(p.occurred_at) == ym)
        .map(|p| &p.amount))
}

/// Computes totals, current-month totals, the category breakdown of
/// expenses and the trailing monthly series, all relative to `now`.
/// Fails only if a sum leaves the decimal range.
pub fn summarize(
    expenses: &[LedgerPoint],
    incomes: &[LedgerPoint],
    now: OffsetDateTime,
) -> AppResult<AnalyticsResponse> {
    let total_expense = sum(expenses.iter().map(|p| &p.amount))?;
    let total_income = sum(incomes.iter().map(|p| &p.amount))?;
    let current = year_month(now);

    let summary = Summary {
        total_expense,
        total_income,
        monthly_expense: sum_in_month(expenses, current)?,
        monthly_income: sum_in_month(incomes, current)?,
        balance: total_income
            .checked_sub(total_expense)
            .ok_or_else(|| anyhow!("balance overflow"))?,
    };

    let mut by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
    for e in expenses {
        let name = e
            .category
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED);
        let slot = by_category.entry(name).or_default();
        *slot = add(*slot, e.amount)?;
    }
    let categories = by_category
        .into_iter()
        .map(|(name, value)| CategoryBucket {
            name: name.to_owned(),
            value,
        })
        .collect();

    let months = trailing_months(now);
    let mut monthly: Vec<MonthlyBucket> = months
        .iter()
        .map(|&(year, month)| MonthlyBucket {
            month: format!("{year:04}-{:02}", month as u8),
            name: short_name(month),
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        })
        .collect();

    for e in expenses {
        if let Some(i) = months.iter().position(|&ym| ym == year_month(e.occurred_at)) {
            monthly[i].expense = add(monthly[i].expense, e.amount)?;
        }
    }
    for inc in incomes {
        if let Some(i) = months.iter().position(|&ym| ym == year_month(inc.occurred_at)) {
            monthly[i].income = add(monthly[i].income, inc.amount)?;
        }
    }

    Ok(AnalyticsResponse {
        summary,
        charts: Charts {
            monthly,
            categories,
        },
    })
}
