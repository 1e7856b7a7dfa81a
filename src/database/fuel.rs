use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::fuel::{FuelRecord, FuelRecordRequest};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait FuelRecordRepository {
    async fn create_fuel_record(&self, car_id: &Uuid, request: &FuelRecordRequest) -> Result<FuelRecord, AppError>;
    async fn get_fuel_record_by_id(&self, id: &Uuid) -> Result<Option<FuelRecord>, AppError>;
    /// Records of one car, highest mileage first.
    async fn list_fuel_records(&self, car_id: &Uuid) -> Result<Vec<FuelRecord>, AppError>;
    async fn update_fuel_record(&self, id: &Uuid, request: &FuelRecordRequest) -> Result<FuelRecord, AppError>;
    async fn delete_fuel_record(&self, id: &Uuid) -> Result<(), AppError>;
    async fn max_fuel_mileage(&self, car_id: &Uuid) -> Result<Option<i64>, AppError>;
}

#[async_trait::async_trait]
impl FuelRecordRepository for PostgresRepository {
    async fn create_fuel_record(&self, car_id: &Uuid, request: &FuelRecordRequest) -> Result<FuelRecord, AppError> {
        let record = sqlx::query_as::<_, FuelRecord>(
            r#"
            INSERT INTO fuel_record (car_id, date, mileage, liters, price_paid)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, car_id, date, mileage, liters, price_paid, created_at
            "#,
        )
        .bind(car_id)
        .bind(request.date)
        .bind(request.mileage)
        .bind(request.liters)
        .bind(request.price_paid)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_fuel_record_by_id(&self, id: &Uuid) -> Result<Option<FuelRecord>, AppError> {
        let record = sqlx::query_as::<_, FuelRecord>(
            r#"
            SELECT id, car_id, date, mileage, liters, price_paid, created_at
            FROM fuel_record
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_fuel_records(&self, car_id: &Uuid) -> Result<Vec<FuelRecord>, AppError> {
        let records = sqlx::query_as::<_, FuelRecord>(
            r#"
            SELECT id, car_id, date, mileage, liters, price_paid, created_at
            FROM fuel_record
            WHERE car_id = $1
            ORDER BY mileage DESC, created_at DESC
            "#,
        )
        .bind(car_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn update_fuel_record(&self, id: &Uuid, request: &FuelRecordRequest) -> Result<FuelRecord, AppError> {
        let record = sqlx::query_as::<_, FuelRecord>(
            r#"
            UPDATE fuel_record
            SET date = $1, mileage = $2, liters = $3, price_paid = $4
            WHERE id = $5
            RETURNING id, car_id, date, mileage, liters, price_paid, created_at
            "#,
        )
        .bind(request.date)
        .bind(request.mileage)
        .bind(request.liters)
        .bind(request.price_paid)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete_fuel_record(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM fuel_record WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn max_fuel_mileage(&self, car_id: &Uuid) -> Result<Option<i64>, AppError> {
        let max = sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(mileage) FROM fuel_record WHERE car_id = $1")
            .bind(car_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(max)
    }
}
