use crate::auth::Authenticated;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::car::{CarRequest, CarResponse, CarUpdateRequest};
use crate::service::car::CarService;
use crate::service::media::MediaStore;
use rocket::http::Status;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post, put};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;

/// List all cars, newest first
#[openapi(tag = "Cars")]
#[get("/")]
pub async fn list_cars(pool: &State<PgPool>, media: &State<MediaStore>, _session: Authenticated) -> Result<Json<Vec<CarResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let cars = CarService::new(&repo, media.inner()).list_cars().await?;
    Ok(Json(cars.iter().map(CarResponse::from).collect()))
}

/// Create a car
#[openapi(tag = "Cars")]
#[post("/", data = "<payload>")]
pub async fn create_car(
    pool: &State<PgPool>,
    media: &State<MediaStore>,
    _session: Authenticated,
    payload: JsonBody<CarRequest>,
) -> Result<Created<Json<CarResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let car = CarService::new(&repo, media.inner()).create_car(&payload).await?;
    Ok(Created::new(format!("/cars/{}", car.id)).body(Json(CarResponse::from(&car))))
}

/// Get a car by ID
#[openapi(tag = "Cars")]
#[get("/<id>")]
pub async fn get_car(pool: &State<PgPool>, media: &State<MediaStore>, _session: Authenticated, id: String) -> Result<Json<CarResponse>, AppError> {
    let car_id = Uuid::parse_str(&id).map_err(|e| AppError::uuid("Invalid car id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let car = CarService::new(&repo, media.inner()).get_car(&car_id).await?;
    Ok(Json(CarResponse::from(&car)))
}

/// Update a car
///
/// Omitted fields keep their stored values; `null` clears the license plate or insurance expiry.
#[openapi(tag = "Cars")]
#[put("/<id>", data = "<payload>")]
pub async fn update_car(
    pool: &State<PgPool>,
    media: &State<MediaStore>,
    _session: Authenticated,
    id: String,
    payload: JsonBody<CarUpdateRequest>,
) -> Result<Json<CarResponse>, AppError> {
    let car_id = Uuid::parse_str(&id).map_err(|e| AppError::uuid("Invalid car id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let car = CarService::new(&repo, media.inner()).update_car(&car_id, &payload).await?;
    Ok(Json(CarResponse::from(&car)))
}

/// Delete a car with its fuel records and parts
#[openapi(tag = "Cars")]
#[delete("/<id>")]
pub async fn delete_car(pool: &State<PgPool>, media: &State<MediaStore>, _session: Authenticated, id: String) -> Result<Status, AppError> {
    let car_id = Uuid::parse_str(&id).map_err(|e| AppError::uuid("Invalid car id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    CarService::new(&repo, media.inner()).delete_car(&car_id).await?;
    Ok(Status::NoContent)
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_cars, create_car, get_car, update_car, delete_car]
}
