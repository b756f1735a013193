//! Linear revenue and expense projection.

use super::aggregate::MonthlyAggregate;
use super::money::{format_eur, round2};
use rust_decimal::Decimal;

/// Number of most recent months the trend is taken over
pub const TREND_WINDOW: usize = 3;

/// Append `horizon_months` projected months to `months`.
///
/// Revenue and expenses continue from the last historical month by the
/// average month-over-month change across the trend window, floored at zero.
/// Profit and cumulative revenue are derived from the projected figures.
/// Months already marked as projected are replaced, so forecasting a
/// forecast extends the same history. Without any historical month there is
/// nothing to extend and the input is returned as is.
pub fn forecast(months: &[MonthlyAggregate], horizon_months: usize) -> Vec<MonthlyAggregate> {
    let history: Vec<&MonthlyAggregate> = months.iter().filter(|m| !m.projected).collect();
    let Some(last) = history.last().copied() else {
        return months.to_vec();
    };
    let mut result: Vec<MonthlyAggregate> = history.iter().map(|m| (*m).clone()).collect();
    let Some(mut month) = last.calendar_month() else {
        return result;
    };

    let window = &history[history.len().saturating_sub(TREND_WINDOW)..];
    let revenue_trend = trend(window.iter().map(|m| m.revenue));
    let expense_trend = trend(window.iter().map(|m| m.expenses));
    log::debug!(
        "Forecasting {} months from {}, revenue trend {}/month, expense trend {}/month",
        horizon_months,
        last.label,
        format_eur(revenue_trend),
        format_eur(expense_trend)
    );

    let mut cumulative = last.cumulative_revenue;
    for step in 1..=horizon_months {
        month = month.next();
        let steps = Decimal::from(step);
        let revenue = project(last.revenue, revenue_trend, steps);
        let expenses = project(last.expenses, expense_trend, steps);

        if month.month() == 1 {
            cumulative = Decimal::ZERO;
        }
        cumulative += revenue;

        let mut entry = MonthlyAggregate::empty(month);
        entry.revenue = revenue;
        entry.expenses = expenses;
        entry.profit = round2(revenue - expenses);
        entry.cumulative_revenue = round2(cumulative);
        entry.projected = true;
        result.push(entry);
    }
    result
}

/// Revenue expected by the end of the calendar year of the last historical month.
///
/// Year-to-date revenue plus the average monthly revenue over the trend
/// window for each month left in that year.
pub fn projected_year_end_revenue(months: &[MonthlyAggregate]) -> Option<Decimal> {
    let history: Vec<&MonthlyAggregate> = months.iter().filter(|m| !m.projected).collect();
    let last = history.last()?;
    let window = &history[history.len().saturating_sub(TREND_WINDOW)..];
    let average = window.iter().map(|m| m.revenue).sum::<Decimal>() / Decimal::from(window.len());
    let remaining = Decimal::from(12 - last.month);
    Some(round2(last.cumulative_revenue + average * remaining))
}

/// Average change between consecutive values
fn trend(values: impl ExactSizeIterator<Item = Decimal>) -> Decimal {
    let count = values.len();
    if count < 2 {
        return Decimal::ZERO;
    }
    let values: Vec<Decimal> = values.collect();
    (values[count - 1] - values[0]) / Decimal::from(count - 1)
}

fn project(last: Decimal, trend: Decimal, steps: Decimal) -> Decimal {
    round2((last + trend * steps).max(Decimal::ZERO))
}
