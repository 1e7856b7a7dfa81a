use crate::database::postgres_repository::PostgresRepository;
use crate::models::health::HealthResponse;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;
use sqlx::PgPool;
use tracing::error;

/// Liveness check including database connectivity
#[openapi(tag = "Health")]
#[get("/")]
pub async fn healthcheck(pool: &State<PgPool>) -> Custom<Json<HealthResponse>> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    match repo.ping().await {
        Ok(()) => Custom(Status::Ok, Json(HealthResponse { status: "ok", database: "up" })),
        Err(e) => {
            error!(error = %e, "health check could not reach the database");
            Custom(
                Status::ServiceUnavailable,
                Json(HealthResponse {
                    status: "degraded",
                    database: "down",
                }),
            )
        }
    }
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![healthcheck]
}
