use chrono::{DateTime, NaiveDate, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FuelRecord {
    pub id: Uuid,
    pub car_id: Uuid,
    pub date: NaiveDate,
    pub mileage: i64,
    pub liters: f64,
    pub price_paid: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Validate, JsonSchema)]
pub struct FuelRecordRequest {
    pub date: NaiveDate,
    #[validate(range(min = 0))]
    pub mileage: i64,
    #[validate(range(exclusive_min = 0.0))]
    pub liters: f64,
    #[validate(range(min = 0.0))]
    pub price_paid: f64,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Increase,
    Decrease,
    Unchanged,
}

/// Unit price movement relative to the next older fill-up.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, JsonSchema)]
pub struct PriceChange {
    pub trend: PriceTrend,
    pub delta: f64,
}

/// Economy over the distance driven since the previous fill-up.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, JsonSchema)]
pub struct FuelEconomy {
    pub distance_km: i64,
    /// Liters per 100 km.
    pub avg_consumption: f64,
    pub avg_cost_per_km: f64,
    pub avg_cost_per_100km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FuelRecordStats {
    pub price_per_liter: Option<f64>,
    pub economy: Option<FuelEconomy>,
    pub price_change: Option<PriceChange>,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct FuelRecordResponse {
    pub id: Uuid,
    pub car_id: Uuid,
    pub date: NaiveDate,
    pub mileage: i64,
    pub liters: f64,
    pub price_paid: f64,
    pub created_at: DateTime<Utc>,
    pub price_per_liter: Option<f64>,
    /// `null` for the earliest record or when the odometer did not advance.
    pub economy: Option<FuelEconomy>,
    pub price_change: Option<PriceChange>,
}

impl FuelRecordResponse {
    pub fn with_stats(record: &FuelRecord, stats: FuelRecordStats) -> Self {
        Self {
            id: record.id,
            car_id: record.car_id,
            date: record.date,
            mileage: record.mileage,
            liters: record.liters,
            price_paid: record.price_paid,
            created_at: record.created_at,
            price_per_liter: stats.price_per_liter,
            economy: stats.economy,
            price_change: stats.price_change,
        }
    }
}

impl From<&FuelRecord> for FuelRecordResponse {
    fn from(record: &FuelRecord) -> Self {
        let price_per_liter = (record.liters > 0.0).then(|| record.price_paid / record.liters);
        Self::with_stats(
            record,
            FuelRecordStats {
                price_per_liter,
                ..FuelRecordStats::default()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_requires_positive_liters() {
        let request: FuelRecordRequest = serde_json::from_str(r#"{"date":"2026-01-10","mileage":10000,"liters":0,"price_paid":0}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn request_rejects_missing_fields() {
        let parsed = serde_json::from_str::<FuelRecordRequest>(r#"{"date":"2026-01-10","mileage":10000}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn trend_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PriceTrend::Increase).unwrap(), r#""increase""#);
    }
}
