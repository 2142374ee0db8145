use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
	"Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// Settings models
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForecastSettings {
	/// Share of the trend series held out for the error estimate
	pub holdout_ratio: f64,
	/// Distinct expense-bearing months required before a forecast is attempted
	pub min_points: usize,
	pub min_holdout: usize,
}

impl Default for ForecastSettings {
	fn default() -> Self {
		Self {
			holdout_ratio: 0.2,
			min_points: 3,
			min_holdout: 1,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
	pub host: String,
	pub port: u16,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 3000,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
	pub settings_version: u32,
	pub currency_symbol: String,
	pub database_path: PathBuf,
	pub charts_dir: PathBuf,
	pub forecast: ForecastSettings,
	pub server: ServerSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			settings_version: 1,
			currency_symbol: "₹".to_string(),
			database_path: PathBuf::from("database/database.json"),
			charts_dir: PathBuf::from("static"),
			forecast: ForecastSettings::default(),
			server: ServerSettings::default(),
		}
	}
}

// Raw input records (schema-on-read, every field may be missing)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawRecord {
	#[serde(default, alias = "_id", deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default, alias = "email", deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub owner_id: Option<String>,
	#[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub section_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub amount: Option<Value>,
	#[serde(default, rename = "type", deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
	#[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, alias = "month_label", deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub month: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub year: Option<Value>,
	#[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
	pub date: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<Value>,
}

/// Reads a string or a number as text; any other JSON value counts as missing.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Ok(match Option::<Value>::deserialize(deserializer)? {
		Some(Value::String(s)) => Some(s),
		Some(Value::Number(n)) => Some(n.to_string()),
		_ => None,
	})
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
	#[serde(alias = "_id")]
	pub id: String,
	#[serde(alias = "email")]
	pub owner_id: String,
	pub name: String,
	pub created_at: DateTime<Utc>,
}

// Normalized records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
	Income,
	Expense,
}

impl TransactionType {
	pub fn as_str(&self) -> &'static str {
		match self {
			TransactionType::Income => "income",
			TransactionType::Expense => "expense",
		}
	}
}

/// Month bucket key. Calendar keys order chronologically; every unparsed key
/// orders after every calendar key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MonthKey {
	Calendar { year: i32, month: u32 },
	Unparsed { label: String },
}

impl MonthKey {
	/// Returns None unless `month` is in 1..=12.
	pub fn calendar(year: i32, month: u32) -> Option<Self> {
		(1..=12)
			.contains(&month)
			.then_some(MonthKey::Calendar { year, month })
	}

	pub fn is_calendar(&self) -> bool {
		matches!(self, MonthKey::Calendar { .. })
	}

	/// Display label, e.g. `Jan 2024`.
	pub fn label(&self) -> String {
		match self {
			MonthKey::Calendar { year, month } => {
				let name = MONTH_ABBREVIATIONS[(*month as usize).clamp(1, 12) - 1];
				format!("{} {}", name, year)
			}
			MonthKey::Unparsed { label } => label.clone(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
	pub owner_id: String,
	pub amount: f64,
	#[serde(rename = "type")]
	pub kind: TransactionType,
	pub category: String,
	pub period: MonthKey,
	pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
	/// Only strictly positive, finite amounts take part in aggregation.
	pub fn is_countable(&self) -> bool {
		self.amount.is_finite() && self.amount > 0.0
	}
}

// Aggregation output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTotal {
	pub category: String,
	pub total: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregateResult {
	pub months: Vec<MonthKey>,
	pub income: Vec<f64>,
	pub expense: Vec<f64>,
	pub savings: Vec<f64>,
	pub income_by_category: Vec<CategoryTotal>,
	pub expense_by_category: Vec<CategoryTotal>,
}

impl AggregateResult {
	pub fn is_empty(&self) -> bool {
		self.months.is_empty()
	}

	pub fn labels(&self) -> Vec<String> {
		self.months.iter().map(MonthKey::label).collect()
	}

	/// Number of buckets with any expense activity
	pub fn expense_bearing_months(&self) -> usize {
		self.expense.iter().filter(|v| **v > 0.0).count()
	}
}

/// One-step-ahead linear trend forecast over monthly expense totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Forecast {
	pub mean_absolute_error: f64,
	pub predicted_next_month_expense: f64,
	pub slope: f64,
	pub intercept: f64,
	pub months: Vec<String>,
	pub actual: Vec<f64>,
	pub train_size: usize,
	pub test_size: usize,
	pub next_index: usize,
}

impl Forecast {
	pub fn predict(&self, index: f64) -> f64 {
		self.slope * index + self.intercept
	}

	/// Values of the fitted line at every trend index
	pub fn fitted(&self) -> Vec<f64> {
		(0..self.actual.len())
			.map(|i| self.predict(i as f64))
			.collect()
	}
}

// Chart data consumed by the frontend
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategorySeries {
	pub categories: Vec<String>,
	pub amounts: Vec<f64>,
}

impl From<&[CategoryTotal]> for CategorySeries {
	fn from(totals: &[CategoryTotal]) -> Self {
		Self {
			categories: totals.iter().map(|c| c.category.clone()).collect(),
			amounts: totals.iter().map(|c| c.total).collect(),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChartData {
	pub months: Vec<String>,
	pub income: Vec<f64>,
	pub expense: Vec<f64>,
	pub savings: Vec<f64>,
	pub income_by_category: CategorySeries,
	pub expense_by_category: CategorySeries,
}

impl From<&AggregateResult> for ChartData {
	fn from(agg: &AggregateResult) -> Self {
		Self {
			months: agg.labels(),
			income: agg.income.clone(),
			expense: agg.expense.clone(),
			savings: agg.savings.clone(),
			income_by_category: CategorySeries::from(agg.income_by_category.as_slice()),
			expense_by_category: CategorySeries::from(agg.expense_by_category.as_slice()),
		}
	}
}

// Summary output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmptySummary {
	pub generated_at: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub owner_id: Option<String>,
	#[serde(default)]
	pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryReport {
	pub generated_at: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub owner_id: Option<String>,
	pub record_count: usize,
	#[serde(flatten)]
	pub chart_data: ChartData,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub forecast: Option<Forecast>,
	#[serde(default)]
	pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary {
	NoData(EmptySummary),
	#[serde(rename = "ok")]
	Available(SummaryReport),
}

impl Summary {
	pub fn report(&self) -> Option<&SummaryReport> {
		match self {
			Summary::Available(report) => Some(report),
			Summary::NoData(_) => None,
		}
	}

	pub fn has_data(&self) -> bool {
		matches!(self, Summary::Available(_))
	}
}
