use crate::auth::Authenticated;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::part::{PartForm, PartResponse};
use crate::service::media::{ImageUpload, MediaStore};
use crate::service::part::PartService;
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{State, delete, get, post, put};
use rocket_okapi::openapi;
use sqlx::PgPool;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

async fn read_upload(file: &TempFile<'_>) -> Result<ImageUpload, AppError> {
    let mut bytes = Vec::with_capacity(usize::try_from(file.len()).unwrap_or_default());
    let reader = file.open().await.map_err(|e| AppError::media("Failed to open uploaded image", e))?;
    tokio::pin!(reader);
    reader
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| AppError::media("Failed to read uploaded image", e))?;

    Ok(ImageUpload {
        content_type: file.content_type().map(ToString::to_string),
        bytes,
    })
}

async fn picture_of(form: &PartForm<'_>) -> Result<Option<ImageUpload>, AppError> {
    match form.picture() {
        Some(file) => Ok(Some(read_upload(file).await?)),
        None => Ok(None),
    }
}

/// List parts of a car, newest first
#[openapi(tag = "Parts")]
#[get("/<id>/parts")]
pub async fn list_parts(pool: &State<PgPool>, media: &State<MediaStore>, _session: Authenticated, id: String) -> Result<Json<Vec<PartResponse>>, AppError> {
    let car_id = Uuid::parse_str(&id).map_err(|e| AppError::uuid("Invalid car id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let parts = PartService::new(&repo, media.inner()).list_parts(&car_id).await?;
    Ok(Json(parts.iter().map(PartResponse::from).collect()))
}

/// Add a part to a car (multipart form, optional `picture` file)
#[openapi(skip)]
#[post("/<id>/parts", data = "<form>")]
pub async fn create_part(
    pool: &State<PgPool>,
    media: &State<MediaStore>,
    _session: Authenticated,
    id: String,
    form: Form<PartForm<'_>>,
) -> Result<Created<Json<PartResponse>>, AppError> {
    let car_id = Uuid::parse_str(&id).map_err(|e| AppError::uuid("Invalid car id", e))?;
    let changes = form.changes()?;
    let picture = picture_of(&form).await?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let part = PartService::new(&repo, media.inner()).create_part(&car_id, changes, picture).await?;
    Ok(Created::new(format!("/parts/{}", part.id)).body(Json(PartResponse::from(&part))))
}

/// Update a part (multipart form); a new `picture` replaces the stored one
#[openapi(skip)]
#[put("/<id>", data = "<form>")]
pub async fn update_part(
    pool: &State<PgPool>,
    media: &State<MediaStore>,
    _session: Authenticated,
    id: String,
    form: Form<PartForm<'_>>,
) -> Result<Json<PartResponse>, AppError> {
    let part_id = Uuid::parse_str(&id).map_err(|e| AppError::uuid("Invalid part id", e))?;
    let changes = form.changes()?;
    let picture = picture_of(&form).await?;

    let repo = PostgresRepository { pool: pool.inner().clone() };
    let part = PartService::new(&repo, media.inner()).update_part(&part_id, changes, picture).await?;
    Ok(Json(PartResponse::from(&part)))
}

/// Delete a part and its picture
#[openapi(tag = "Parts")]
#[delete("/<id>")]
pub async fn delete_part(pool: &State<PgPool>, media: &State<MediaStore>, _session: Authenticated, id: String) -> Result<Status, AppError> {
    let part_id = Uuid::parse_str(&id).map_err(|e| AppError::uuid("Invalid part id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    PartService::new(&repo, media.inner()).delete_part(&part_id).await?;
    Ok(Status::NoContent)
}

/// Routes nested under `/cars`.
pub fn car_routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_parts, create_part]
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![update_part, delete_part]
}
