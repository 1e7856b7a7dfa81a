use crate::service::insurance::insurance_status;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_CAR_COLOR: &str = "#000000";

#[derive(Serialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Car {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub vin: String,
    pub license_plate: Option<String>,
    pub current_mileage: i64,
    pub insurance_expiry: Option<NaiveDate>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The writable columns of a car row, used for both inserts and full rewrites.
#[derive(Debug, Clone, PartialEq)]
pub struct CarFields {
    pub brand: String,
    pub model: String,
    pub vin: String,
    pub license_plate: Option<String>,
    pub current_mileage: i64,
    pub insurance_expiry: Option<NaiveDate>,
    pub color: String,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum InsuranceStatus {
    Expired,
    ExpiringSoon,
    Active,
}

fn default_color() -> String {
    DEFAULT_CAR_COLOR.to_string()
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct CarRequest {
    #[validate(length(min = 1))]
    pub brand: String,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(length(min = 1))]
    pub vin: String,
    pub license_plate: Option<String>,
    #[validate(range(min = 0))]
    pub current_mileage: i64,
    pub insurance_expiry: Option<NaiveDate>,
    #[serde(default = "default_color")]
    #[validate(length(min = 1))]
    pub color: String,
}

impl From<&CarRequest> for CarFields {
    fn from(request: &CarRequest) -> Self {
        Self {
            brand: request.brand.clone(),
            model: request.model.clone(),
            vin: request.vin.clone(),
            license_plate: request.license_plate.clone(),
            current_mileage: request.current_mileage,
            insurance_expiry: request.insurance_expiry,
            color: request.color.clone(),
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update: omitted fields keep their stored values.
#[derive(Deserialize, Debug, Default, Validate, JsonSchema)]
pub struct CarUpdateRequest {
    #[validate(length(min = 1))]
    pub brand: Option<String>,
    #[validate(length(min = 1))]
    pub model: Option<String>,
    #[validate(length(min = 1))]
    pub vin: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<String>")]
    pub license_plate: Option<Option<String>>,
    #[validate(range(min = 0))]
    pub current_mileage: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    #[schemars(with = "Option<NaiveDate>")]
    pub insurance_expiry: Option<Option<NaiveDate>>,
    #[validate(length(min = 1))]
    pub color: Option<String>,
}

impl CarUpdateRequest {
    pub fn merge_into(&self, car: &Car) -> CarFields {
        CarFields {
            brand: self.brand.clone().unwrap_or_else(|| car.brand.clone()),
            model: self.model.clone().unwrap_or_else(|| car.model.clone()),
            vin: self.vin.clone().unwrap_or_else(|| car.vin.clone()),
            license_plate: self.license_plate.clone().unwrap_or_else(|| car.license_plate.clone()),
            current_mileage: self.current_mileage.unwrap_or(car.current_mileage),
            insurance_expiry: self.insurance_expiry.unwrap_or(car.insurance_expiry),
            color: self.color.clone().unwrap_or_else(|| car.color.clone()),
        }
    }
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct CarResponse {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub vin: String,
    pub license_plate: Option<String>,
    pub current_mileage: i64,
    pub insurance_expiry: Option<NaiveDate>,
    pub insurance_status: InsuranceStatus,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CarResponse {
    pub fn from_car(car: &Car, today: NaiveDate) -> Self {
        Self {
            id: car.id,
            brand: car.brand.clone(),
            model: car.model.clone(),
            vin: car.vin.clone(),
            license_plate: car.license_plate.clone(),
            current_mileage: car.current_mileage,
            insurance_expiry: car.insurance_expiry,
            insurance_status: insurance_status(car.insurance_expiry, today),
            color: car.color.clone(),
            created_at: car.created_at,
            updated_at: car.updated_at,
        }
    }
}

impl From<&Car> for CarResponse {
    fn from(car: &Car) -> Self {
        Self::from_car(car, Utc::now().date_naive())
    }
}
