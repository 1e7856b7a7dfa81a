use crate::database::car::CarRepository;
use crate::database::fuel::FuelRecordRepository;
use crate::error::app_error::AppError;
use crate::models::fuel::{FuelRecord, FuelRecordRequest, FuelRecordResponse};
use crate::service::fuel_stats::derive_stats;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

pub struct FuelService<'a, R> {
    repository: &'a R,
}

impl<'a, R> FuelService<'a, R>
where
    R: CarRepository + FuelRecordRepository + Sync,
{
    pub fn new(repository: &'a R) -> Self {
        FuelService { repository }
    }

    async fn ensure_car(&self, car_id: &Uuid) -> Result<(), AppError> {
        match self.repository.get_car_by_id(car_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Car not found".to_string())),
        }
    }

    async fn get_record(&self, id: &Uuid) -> Result<FuelRecord, AppError> {
        self.repository
            .get_fuel_record_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Fuel record not found".to_string()))
    }

    /// Keeps the car odometer at the highest fuel reading. Leaves it alone when no records remain.
    pub async fn reconcile_mileage(&self, car_id: &Uuid) -> Result<(), AppError> {
        if let Some(mileage) = self.repository.max_fuel_mileage(car_id).await? {
            self.repository.update_car_mileage(car_id, mileage).await?;
            debug!(car_id = %car_id, mileage, "car mileage reconciled");
        }
        Ok(())
    }

    pub async fn list_records(&self, car_id: &Uuid) -> Result<Vec<FuelRecordResponse>, AppError> {
        self.ensure_car(car_id).await?;
        let records = self.repository.list_fuel_records(car_id).await?;
        let stats = derive_stats(&records);

        Ok(records
            .iter()
            .zip(stats)
            .map(|(record, stats)| FuelRecordResponse::with_stats(record, stats))
            .collect())
    }

    pub async fn create_record(&self, car_id: &Uuid, request: &FuelRecordRequest) -> Result<FuelRecord, AppError> {
        request.validate()?;
        self.ensure_car(car_id).await?;

        let record = self.repository.create_fuel_record(car_id, request).await?;
        self.reconcile_mileage(car_id).await?;

        info!(car_id = %car_id, fuel_record_id = %record.id, "fuel record created");
        Ok(record)
    }

    pub async fn update_record(&self, id: &Uuid, request: &FuelRecordRequest) -> Result<FuelRecord, AppError> {
        request.validate()?;
        let existing = self.get_record(id).await?;

        let record = self.repository.update_fuel_record(id, request).await?;
        self.reconcile_mileage(&existing.car_id).await?;

        Ok(record)
    }

    pub async fn delete_record(&self, id: &Uuid) -> Result<(), AppError> {
        let existing = self.get_record(id).await?;

        self.repository.delete_fuel_record(id).await?;
        self.reconcile_mileage(&existing.car_id).await?;

        info!(car_id = %existing.car_id, fuel_record_id = %id, "fuel record deleted");
        Ok(())
    }
}
