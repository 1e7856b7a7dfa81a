use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::car::{Car, CarFields};
use uuid::Uuid;

const CAR_COLUMNS: &str = "id, brand, model, vin, license_plate, current_mileage, insurance_expiry, color, created_at, updated_at";

#[async_trait::async_trait]
pub trait CarRepository {
    async fn create_car(&self, fields: &CarFields) -> Result<Car, AppError>;
    async fn get_car_by_id(&self, id: &Uuid) -> Result<Option<Car>, AppError>;
    async fn list_cars(&self) -> Result<Vec<Car>, AppError>;
    async fn update_car(&self, id: &Uuid, fields: &CarFields) -> Result<Car, AppError>;
    async fn update_car_mileage(&self, id: &Uuid, mileage: i64) -> Result<(), AppError>;
    /// Removes the car; its fuel records and parts go with it.
    async fn delete_car(&self, id: &Uuid) -> Result<(), AppError>;
}

#[async_trait::async_trait]
impl CarRepository for PostgresRepository {
    async fn create_car(&self, fields: &CarFields) -> Result<Car, AppError> {
        let query = format!(
            r#"
            INSERT INTO car (brand, model, vin, license_plate, current_mileage, insurance_expiry, color)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CAR_COLUMNS}
            "#
        );

        let car = sqlx::query_as::<_, Car>(&query)
            .bind(&fields.brand)
            .bind(&fields.model)
            .bind(&fields.vin)
            .bind(&fields.license_plate)
            .bind(fields.current_mileage)
            .bind(fields.insurance_expiry)
            .bind(&fields.color)
            .fetch_one(&self.pool)
            .await?;

        Ok(car)
    }

    async fn get_car_by_id(&self, id: &Uuid) -> Result<Option<Car>, AppError> {
        let query = format!("SELECT {CAR_COLUMNS} FROM car WHERE id = $1");

        let car = sqlx::query_as::<_, Car>(&query).bind(id).fetch_optional(&self.pool).await?;

        Ok(car)
    }

    async fn list_cars(&self) -> Result<Vec<Car>, AppError> {
        let query = format!("SELECT {CAR_COLUMNS} FROM car ORDER BY created_at DESC");

        let cars = sqlx::query_as::<_, Car>(&query).fetch_all(&self.pool).await?;

        Ok(cars)
    }

    async fn update_car(&self, id: &Uuid, fields: &CarFields) -> Result<Car, AppError> {
        let query = format!(
            r#"
            UPDATE car
            SET brand = $1,
                model = $2,
                vin = $3,
                license_plate = $4,
                current_mileage = $5,
                insurance_expiry = $6,
                color = $7,
                updated_at = now()
            WHERE id = $8
            RETURNING {CAR_COLUMNS}
            "#
        );

        let car = sqlx::query_as::<_, Car>(&query)
            .bind(&fields.brand)
            .bind(&fields.model)
            .bind(&fields.vin)
            .bind(&fields.license_plate)
            .bind(fields.current_mileage)
            .bind(fields.insurance_expiry)
            .bind(&fields.color)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(car)
    }

    async fn update_car_mileage(&self, id: &Uuid, mileage: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE car SET current_mileage = $1, updated_at = now() WHERE id = $2")
            .bind(mileage)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_car(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM car WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }
}
