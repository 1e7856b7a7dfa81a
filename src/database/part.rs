use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::part::{Part, PartFields};
use uuid::Uuid;

const PART_COLUMNS: &str = "id, car_id, main_component, detailed_component, model, picture_path, price, purchase_date, created_at";

#[async_trait::async_trait]
pub trait PartRepository {
    async fn create_part(&self, car_id: &Uuid, fields: &PartFields, picture_path: Option<&str>) -> Result<Part, AppError>;
    async fn get_part_by_id(&self, id: &Uuid) -> Result<Option<Part>, AppError>;
    /// Parts of one car, newest first.
    async fn list_parts(&self, car_id: &Uuid) -> Result<Vec<Part>, AppError>;
    async fn update_part(&self, id: &Uuid, fields: &PartFields, picture_path: Option<&str>) -> Result<Part, AppError>;
    async fn delete_part(&self, id: &Uuid) -> Result<(), AppError>;
    async fn list_part_pictures(&self, car_id: &Uuid) -> Result<Vec<String>, AppError>;
}

#[async_trait::async_trait]
impl PartRepository for PostgresRepository {
    async fn create_part(&self, car_id: &Uuid, fields: &PartFields, picture_path: Option<&str>) -> Result<Part, AppError> {
        let query = format!(
            r#"
            INSERT INTO part (car_id, main_component, detailed_component, model, picture_path, price, purchase_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PART_COLUMNS}
            "#
        );

        let part = sqlx::query_as::<_, Part>(&query)
            .bind(car_id)
            .bind(&fields.main_component)
            .bind(&fields.detailed_component)
            .bind(&fields.model)
            .bind(picture_path)
            .bind(fields.price)
            .bind(fields.purchase_date)
            .fetch_one(&self.pool)
            .await?;

        Ok(part)
    }

    async fn get_part_by_id(&self, id: &Uuid) -> Result<Option<Part>, AppError> {
        let query = format!("SELECT {PART_COLUMNS} FROM part WHERE id = $1");

        let part = sqlx::query_as::<_, Part>(&query).bind(id).fetch_optional(&self.pool).await?;

        Ok(part)
    }

    async fn list_parts(&self, car_id: &Uuid) -> Result<Vec<Part>, AppError> {
        let query = format!("SELECT {PART_COLUMNS} FROM part WHERE car_id = $1 ORDER BY created_at DESC");

        let parts = sqlx::query_as::<_, Part>(&query).bind(car_id).fetch_all(&self.pool).await?;

        Ok(parts)
    }

    async fn update_part(&self, id: &Uuid, fields: &PartFields, picture_path: Option<&str>) -> Result<Part, AppError> {
        let query = format!(
            r#"
            UPDATE part
            SET main_component = $1,
                detailed_component = $2,
                model = $3,
                picture_path = $4,
                price = $5,
                purchase_date = $6
            WHERE id = $7
            RETURNING {PART_COLUMNS}
            "#
        );

        let part = sqlx::query_as::<_, Part>(&query)
            .bind(&fields.main_component)
            .bind(&fields.detailed_component)
            .bind(&fields.model)
            .bind(picture_path)
            .bind(fields.price)
            .bind(fields.purchase_date)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(part)
    }

    async fn delete_part(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM part WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn list_part_pictures(&self, car_id: &Uuid) -> Result<Vec<String>, AppError> {
        let paths = sqlx::query_scalar::<_, String>("SELECT picture_path FROM part WHERE car_id = $1 AND picture_path IS NOT NULL")
            .bind(car_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(paths)
    }
}
