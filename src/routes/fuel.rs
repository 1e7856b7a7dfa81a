use crate::auth::Authenticated;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::fuel::{FuelRecordRequest, FuelRecordResponse};
use crate::service::fuel::FuelService;
use rocket::http::Status;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post, put};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;

/// List fuel records of a car by mileage, highest first, with derived statistics
#[openapi(tag = "Fuel")]
#[get("/<id>/fuel")]
pub async fn list_fuel_records(pool: &State<PgPool>, _session: Authenticated, id: String) -> Result<Json<Vec<FuelRecordResponse>>, AppError> {
    let car_id = Uuid::parse_str(&id).map_err(|e| AppError::uuid("Invalid car id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let records = FuelService::new(&repo).list_records(&car_id).await?;
    Ok(Json(records))
}

/// Add a fuel record to a car
#[openapi(tag = "Fuel")]
#[post("/<id>/fuel", data = "<payload>")]
pub async fn create_fuel_record(
    pool: &State<PgPool>,
    _session: Authenticated,
    id: String,
    payload: JsonBody<FuelRecordRequest>,
) -> Result<Created<Json<FuelRecordResponse>>, AppError> {
    let car_id = Uuid::parse_str(&id).map_err(|e| AppError::uuid("Invalid car id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let record = FuelService::new(&repo).create_record(&car_id, &payload).await?;
    Ok(Created::new(format!("/fuel/{}", record.id)).body(Json(FuelRecordResponse::from(&record))))
}

/// Replace a fuel record
#[openapi(tag = "Fuel")]
#[put("/<id>", data = "<payload>")]
pub async fn update_fuel_record(
    pool: &State<PgPool>,
    _session: Authenticated,
    id: String,
    payload: JsonBody<FuelRecordRequest>,
) -> Result<Json<FuelRecordResponse>, AppError> {
    let record_id = Uuid::parse_str(&id).map_err(|e| AppError::uuid("Invalid fuel record id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let record = FuelService::new(&repo).update_record(&record_id, &payload).await?;
    Ok(Json(FuelRecordResponse::from(&record)))
}

/// Delete a fuel record
#[openapi(tag = "Fuel")]
#[delete("/<id>")]
pub async fn delete_fuel_record(pool: &State<PgPool>, _session: Authenticated, id: String) -> Result<Status, AppError> {
    let record_id = Uuid::parse_str(&id).map_err(|e| AppError::uuid("Invalid fuel record id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    FuelService::new(&repo).delete_record(&record_id).await?;
    Ok(Status::NoContent)
}

/// Routes nested under `/cars`.
pub fn car_routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_fuel_records, create_fuel_record]
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![update_fuel_record, delete_fuel_record]
}
