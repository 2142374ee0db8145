use std::collections::{BTreeMap, HashMap};

use models::{AggregateResult, CategoryTotal, MonthKey, TransactionRecord, TransactionType};

#[derive(Debug, Default, Clone, Copy)]
struct MonthTotals {
    income: f64,
    expense: f64,
}

/// Sums amounts per category, remembering the order categories first appear in.
#[derive(Debug, Default)]
struct CategoryAccumulator {
    totals: Vec<CategoryTotal>,
    index: HashMap<String, usize>,
}

impl CategoryAccumulator {
    fn add(&mut self, category: &str, amount: f64) {
        match self.index.get(category) {
            Some(&idx) => self.totals[idx].total += amount,
            None => {
                self.index.insert(category.to_string(), self.totals.len());
                self.totals.push(CategoryTotal {
                    category: category.to_string(),
                    total: amount,
                });
            }
        }
    }

    /// Descending by total. The sort is stable, so ties keep first-seen order.
    fn into_ranking(self) -> Vec<CategoryTotal> {
        let mut totals = self.totals;
        totals.sort_by(|a, b| b.total.total_cmp(&a.total));
        totals
    }
}

/// Buckets normalized records by month and ranks categories.
///
/// Every month present in either income or expense appears in all three
/// monthly sequences, zero-filled and ordered by [`MonthKey`]. Records with a
/// non-positive amount are ignored.
pub fn aggregate(records: &[TransactionRecord]) -> AggregateResult {
    let mut buckets: BTreeMap<MonthKey, MonthTotals> = BTreeMap::new();
    let mut income_categories = CategoryAccumulator::default();
    let mut expense_categories = CategoryAccumulator::default();

    for record in records.iter().filter(|r| r.is_countable()) {
        let bucket = buckets.entry(record.period.clone()).or_default();
        match record.kind {
            TransactionType::Income => {
                bucket.income += record.amount;
                income_categories.add(&record.category, record.amount);
            }
            TransactionType::Expense => {
                bucket.expense += record.amount;
                expense_categories.add(&record.category, record.amount);
            }
        }
    }

    let mut result = AggregateResult {
        months: Vec::with_capacity(buckets.len()),
        income: Vec::with_capacity(buckets.len()),
        expense: Vec::with_capacity(buckets.len()),
        savings: Vec::with_capacity(buckets.len()),
        income_by_category: income_categories.into_ranking(),
        expense_by_category: expense_categories.into_ranking(),
    };

    for (month, totals) in buckets {
        result.months.push(month);
        result.income.push(totals.income);
        result.expense.push(totals.expense);
        result.savings.push(totals.income - totals.expense);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(kind: TransactionType, amount: f64, category: &str, period: MonthKey) -> TransactionRecord {
        TransactionRecord {
            owner_id: "u1".to_string(),
            amount,
            kind,
            category: category.to_string(),
            period,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn month(year: i32, m: u32) -> MonthKey {
        MonthKey::calendar(year, m).unwrap()
    }

    #[test]
    fn test_aggregate_worked_example() {
        let records = vec![
            record(TransactionType::Expense, 100.0, "Food", month(2024, 1)),
            record(TransactionType::Income, 500.0, "Salary", month(2024, 1)),
            record(TransactionType::Expense, 50.0, "Food", month(2024, 2)),
        ];
        let agg = aggregate(&records);
        assert_eq!(agg.labels(), vec!["Jan 2024", "Feb 2024"]);
        assert_eq!(agg.income, vec![500.0, 0.0]);
        assert_eq!(agg.expense, vec![100.0, 50.0]);
        assert_eq!(agg.savings, vec![400.0, -50.0]);
    }

    #[test]
    fn test_aggregate_orders_chronologically_not_by_insertion() {
        let records = vec![
            record(TransactionType::Expense, 1.0, "A", month(2024, 3)),
            record(TransactionType::Expense, 1.0, "A", month(2023, 12)),
            record(TransactionType::Income, 1.0, "B", month(2024, 1)),
            record(TransactionType::Expense, 1.0, "A", month(2023, 2)),
        ];
        let agg = aggregate(&records);
        assert_eq!(
            agg.labels(),
            vec!["Feb 2023", "Dec 2023", "Jan 2024", "Mar 2024"]
        );
    }

    #[test]
    fn test_aggregate_places_unparsed_months_last() {
        let records = vec![
            record(
                TransactionType::Expense,
                5.0,
                "A",
                MonthKey::Unparsed {
                    label: "Smarch 2024".to_string(),
                },
            ),
            record(TransactionType::Expense, 7.0, "A", month(2030, 1)),
        ];
        let agg = aggregate(&records);
        assert_eq!(agg.labels(), vec!["Jan 2030", "Smarch 2024"]);
        assert_eq!(agg.expense, vec![7.0, 5.0]);
    }

    #[test]
    fn test_aggregate_sums_and_bucket_count() {
        let records = vec![
            record(TransactionType::Expense, 10.0, "A", month(2024, 1)),
            record(TransactionType::Expense, 15.5, "B", month(2024, 1)),
            record(TransactionType::Income, 200.0, "Pay", month(2024, 2)),
            record(TransactionType::Expense, 4.5, "A", month(2024, 3)),
            record(TransactionType::Income, 20.0, "Gift", month(2024, 3)),
        ];
        let agg = aggregate(&records);
        assert_eq!(agg.months.len(), 3);
        assert_eq!(agg.income.iter().sum::<f64>(), 220.0);
        assert_eq!(agg.expense.iter().sum::<f64>(), 30.0);
        for i in 0..agg.months.len() {
            assert_eq!(agg.savings[i], agg.income[i] - agg.expense[i]);
        }
        assert_eq!(agg.expense_bearing_months(), 2);
    }

    #[test]
    fn test_aggregate_ignores_non_positive_amounts() {
        let records = vec![
            record(TransactionType::Expense, 0.0, "A", month(2024, 1)),
            record(TransactionType::Expense, -3.0, "A", month(2024, 2)),
            record(TransactionType::Expense, 3.0, "A", month(2024, 3)),
        ];
        let agg = aggregate(&records);
        assert_eq!(agg.labels(), vec!["Mar 2024"]);
        assert_eq!(agg.expense_by_category.len(), 1);
    }

    #[test]
    fn test_category_ranking_descending_with_stable_ties() {
        let records = vec![
            record(TransactionType::Expense, 10.0, "Travel", month(2024, 1)),
            record(TransactionType::Expense, 30.0, "Rent", month(2024, 1)),
            record(TransactionType::Expense, 10.0, "Books", month(2024, 2)),
            record(TransactionType::Expense, 5.0, "Travel", month(2024, 2)),
            record(TransactionType::Expense, 15.0, "Books", month(2024, 3)),
            record(TransactionType::Income, 99.0, "Salary", month(2024, 1)),
        ];
        let agg = aggregate(&records);
        let ranking: Vec<(&str, f64)> = agg
            .expense_by_category
            .iter()
            .map(|c| (c.category.as_str(), c.total))
            .collect();
        assert_eq!(ranking, vec![("Rent", 30.0), ("Books", 25.0), ("Travel", 15.0)]);
        assert_eq!(agg.income_by_category.len(), 1);
        for pair in agg.expense_by_category.windows(2) {
            assert!(pair[0].total >= pair[1].total);
        }

        let tied = vec![
            record(TransactionType::Expense, 10.0, "First", month(2024, 1)),
            record(TransactionType::Expense, 10.0, "Second", month(2024, 1)),
            record(TransactionType::Expense, 20.0, "Third", month(2024, 1)),
        ];
        let agg = aggregate(&tied);
        let names: Vec<&str> = agg
            .expense_by_category
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(names, vec!["Third", "First", "Second"]);
    }

    #[test]
    fn test_aggregate_empty() {
        let agg = aggregate(&[]);
        assert!(agg.is_empty());
        assert!(agg.expense_by_category.is_empty());
    }
}
