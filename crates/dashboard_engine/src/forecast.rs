use models::{AggregateResult, Forecast, ForecastSettings};
use tracing::debug;

/// A line needs two distinct x values.
pub const MIN_TRAINING_POINTS: usize = 2;

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearTrend {
    /// Closed-form OLS fit. Zero variance in `xs` gives a flat line through the mean.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        if xs.is_empty() || xs.len() != ys.len() {
            return None;
        }
        let n = xs.len() as f64;
        let x_mean = xs.iter().sum::<f64>() / n;
        let y_mean = ys.iter().sum::<f64>() / n;

        let mut sxy = 0.0;
        let mut sxx = 0.0;
        for (x, y) in xs.iter().zip(ys) {
            sxy += (x - x_mean) * (y - y_mean);
            sxx += (x - x_mean) * (x - x_mean);
        }

        let slope = if sxx.abs() < f64::EPSILON { 0.0 } else { sxy / sxx };
        Some(Self {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Chronological train/test sizes for a series of `n` points.
///
/// The holdout is `max(min_holdout, ceil(n * holdout_ratio))`, shrunk if needed
/// so that at least [`MIN_TRAINING_POINTS`] remain for fitting. Returns None
/// when that leaves no holdout at all.
pub fn holdout_split(n: usize, settings: &ForecastSettings) -> Option<(usize, usize)> {
    let ratio = if settings.holdout_ratio.is_finite() {
        settings.holdout_ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let by_ratio = (n as f64 * ratio).ceil() as usize;
    let max_test = n.saturating_sub(MIN_TRAINING_POINTS);
    let test = by_ratio.max(settings.min_holdout).min(max_test);
    if test == 0 {
        return None;
    }
    Some((n - test, test))
}

/// Expense totals of the calendar buckets. Unparsed buckets sort last and
/// have no place on the timeline, so they are left out of the trend.
fn calendar_expense(agg: &AggregateResult) -> &[f64] {
    let calendar = agg.months.iter().take_while(|m| m.is_calendar()).count();
    &agg.expense[..calendar.min(agg.expense.len())]
}

/// Range of calendar bucket indices from the first to the last expense-bearing month.
pub fn trend_range(agg: &AggregateResult) -> Option<(usize, usize)> {
    let expense = calendar_expense(agg);
    let first = expense.iter().position(|v| *v > 0.0)?;
    let last = expense.iter().rposition(|v| *v > 0.0)?;
    Some((first, last))
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Fits a linear trend over monthly expense totals and predicts the next month.
///
/// Skipped (None) when fewer than `settings.min_points` calendar months carry
/// expenses. Months with zero expense between the first and last expense month
/// still count as trend points.
pub fn forecast_expenses(agg: &AggregateResult, settings: &ForecastSettings) -> Option<Forecast> {
    let bearing = calendar_expense(agg).iter().filter(|v| **v > 0.0).count();
    if bearing < settings.min_points.max(1) {
        debug!(bearing, required = settings.min_points, "not enough expense months to forecast");
        return None;
    }

    let (first, last) = trend_range(agg)?;
    let actual: Vec<f64> = agg.expense[first..=last].to_vec();
    let months: Vec<String> = agg.months[first..=last].iter().map(|m| m.label()).collect();
    let n = actual.len();

    let (train_size, test_size) = holdout_split(n, settings)?;
    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let trend = LinearTrend::fit(&xs[..train_size], &actual[..train_size])?;

    let held_out: Vec<f64> = xs[train_size..].iter().map(|x| trend.predict(*x)).collect();
    let mae = mean_absolute_error(&actual[train_size..], &held_out);

    let next_index = n;
    let predicted = trend.predict(next_index as f64);

    debug!(
        points = n,
        train_size,
        test_size,
        slope = trend.slope,
        mae,
        predicted,
        "fitted expense trend"
    );

    Some(Forecast {
        mean_absolute_error: mae,
        predicted_next_month_expense: predicted,
        slope: trend.slope,
        intercept: trend.intercept,
        months,
        actual,
        train_size,
        test_size,
        next_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::MonthKey;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn agg_from(expense: &[f64], income: &[f64]) -> AggregateResult {
        let months: Vec<MonthKey> = (0..expense.len())
            .map(|i| MonthKey::calendar(2024 + (i / 12) as i32, (i % 12) as u32 + 1).unwrap())
            .collect();
        AggregateResult {
            savings: income.iter().zip(expense).map(|(i, e)| i - e).collect(),
            months,
            income: income.to_vec(),
            expense: expense.to_vec(),
            income_by_category: vec![],
            expense_by_category: vec![],
        }
    }

    #[test]
    fn test_linear_trend_fit_exact_line() {
        let trend = LinearTrend::fit(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!(approx(trend.slope, 2.0));
        assert!(approx(trend.intercept, 1.0));
        assert!(approx(trend.predict(3.0), 7.0));
    }

    #[test]
    fn test_linear_trend_zero_variance() {
        let trend = LinearTrend::fit(&[2.0, 2.0], &[4.0, 8.0]).unwrap();
        assert_eq!(trend.slope, 0.0);
        assert!(approx(trend.intercept, 6.0));
        assert!(LinearTrend::fit(&[], &[]).is_none());
    }

    #[test]
    fn test_holdout_split_sizes() {
        let s = ForecastSettings::default();
        assert_eq!(holdout_split(3, &s), Some((2, 1)));
        assert_eq!(holdout_split(5, &s), Some((4, 1)));
        assert_eq!(holdout_split(6, &s), Some((4, 2)));
        assert_eq!(holdout_split(10, &s), Some((8, 2)));
        assert_eq!(holdout_split(2, &s), None);
    }

    #[test]
    fn test_holdout_split_keeps_two_training_points() {
        let s = ForecastSettings {
            holdout_ratio: 0.9,
            min_points: 3,
            min_holdout: 1,
        };
        assert_eq!(holdout_split(4, &s), Some((2, 2)));

        let s = ForecastSettings {
            holdout_ratio: 0.0,
            min_points: 3,
            min_holdout: 0,
        };
        assert_eq!(holdout_split(5, &s), None);
    }

    #[test]
    fn test_forecast_absent_with_two_expense_months() {
        let agg = agg_from(&[100.0, 50.0], &[500.0, 0.0]);
        assert!(forecast_expenses(&agg, &ForecastSettings::default()).is_none());

        // Income-only months do not count towards the minimum
        let agg = agg_from(&[100.0, 0.0, 50.0, 0.0], &[0.0, 10.0, 0.0, 10.0]);
        assert!(forecast_expenses(&agg, &ForecastSettings::default()).is_none());
    }

    #[test]
    fn test_forecast_three_points() {
        let agg = agg_from(&[100.0, 200.0, 300.0], &[0.0; 3]);
        let f = forecast_expenses(&agg, &ForecastSettings::default()).unwrap();
        assert_eq!(f.train_size, 2);
        assert_eq!(f.test_size, 1);
        assert!(approx(f.slope, 100.0));
        assert!(approx(f.intercept, 100.0));
        assert!(approx(f.mean_absolute_error, 0.0));
        assert_eq!(f.next_index, 3);
        assert!(approx(f.predicted_next_month_expense, 400.0));
        assert_eq!(f.months, vec!["Jan 2024", "Feb 2024", "Mar 2024"]);
    }

    #[test]
    fn test_forecast_five_points_with_error() {
        let agg = agg_from(&[100.0, 50.0, 120.0, 80.0, 100.0], &[0.0; 5]);
        let f = forecast_expenses(&agg, &ForecastSettings::default()).unwrap();
        assert_eq!((f.train_size, f.test_size), (4, 1));
        assert!(approx(f.slope, 1.0));
        assert!(approx(f.intercept, 86.0));
        assert!(approx(f.mean_absolute_error, 10.0));
        assert!(approx(f.predicted_next_month_expense, 91.0));
    }

    #[test]
    fn test_forecast_counts_zero_months_inside_range() {
        // Leading income-only month is outside the trend range; the gap in
        // February stays as a zero point.
        let agg = agg_from(&[0.0, 100.0, 0.0, 300.0, 500.0], &[50.0, 0.0, 10.0, 0.0, 0.0]);
        let f = forecast_expenses(&agg, &ForecastSettings::default()).unwrap();
        assert_eq!(f.actual, vec![100.0, 0.0, 300.0, 500.0]);
        assert_eq!(f.months[0], "Feb 2024");
        assert_eq!((f.train_size, f.test_size), (3, 1));
        assert!(approx(f.slope, 100.0));
        assert!(approx(f.intercept, 100.0 / 3.0));
        assert!(approx(f.mean_absolute_error, 500.0 - (300.0 + 100.0 / 3.0)));
        assert!(approx(f.predicted_next_month_expense, 400.0 + 100.0 / 3.0));
    }

    #[test]
    fn test_forecast_ignores_unparsed_buckets() {
        let mut agg = agg_from(&[100.0, 200.0, 300.0], &[0.0; 3]);
        agg.months.push(MonthKey::Unparsed {
            label: "Smarch 2024".to_string(),
        });
        agg.expense.push(5000.0);
        agg.income.push(0.0);
        agg.savings.push(-5000.0);

        let f = forecast_expenses(&agg, &ForecastSettings::default()).unwrap();
        assert_eq!(f.months, vec!["Jan 2024", "Feb 2024", "Mar 2024"]);
        assert_eq!(f.actual, vec![100.0, 200.0, 300.0]);
        assert_eq!(f.next_index, 3);
        assert!(approx(f.predicted_next_month_expense, 400.0));
    }

    #[test]
    fn test_unparsed_expense_does_not_reach_minimum() {
        let mut agg = agg_from(&[100.0, 200.0], &[0.0; 2]);
        agg.months.push(MonthKey::Unparsed {
            label: "Smarch 2024".to_string(),
        });
        agg.expense.push(50.0);
        agg.income.push(0.0);
        agg.savings.push(-50.0);

        assert_eq!(agg.expense_bearing_months(), 3);
        assert!(trend_range(&agg).is_some());
        assert!(forecast_expenses(&agg, &ForecastSettings::default()).is_none());
    }

    #[test]
    fn test_forecast_prediction_may_be_negative() {
        let agg = agg_from(&[300.0, 200.0, 100.0, 1.0], &[0.0; 4]);
        let f = forecast_expenses(&agg, &ForecastSettings::default()).unwrap();
        // Trained on 300, 200, 100 -> slope -100, next index 4 -> -100
        assert!(approx(f.predicted_next_month_expense, -100.0));
        assert!(approx(f.mean_absolute_error, 1.0));
    }

    #[test]
    fn test_forecast_fitted_values() {
        let agg = agg_from(&[100.0, 200.0, 300.0], &[0.0; 3]);
        let f = forecast_expenses(&agg, &ForecastSettings::default()).unwrap();
        let fitted = f.fitted();
        assert_eq!(fitted.len(), 3);
        assert!(approx(fitted[2], 300.0));
    }

    #[test]
    fn test_mean_absolute_error() {
        assert!(approx(mean_absolute_error(&[1.0, 2.0], &[2.0, 0.0]), 1.5));
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
    }
}
