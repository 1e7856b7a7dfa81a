use crate::database::car::CarRepository;
use crate::database::part::PartRepository;
use crate::error::app_error::AppError;
use crate::models::car::{Car, CarFields, CarRequest, CarUpdateRequest};
use crate::service::media::MediaStore;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

pub struct CarService<'a, R> {
    repository: &'a R,
    media: &'a MediaStore,
}

impl<'a, R> CarService<'a, R>
where
    R: CarRepository + PartRepository + Sync,
{
    pub fn new(repository: &'a R, media: &'a MediaStore) -> Self {
        CarService { repository, media }
    }

    pub async fn create_car(&self, request: &CarRequest) -> Result<Car, AppError> {
        request.validate()?;
        let car = self.repository.create_car(&CarFields::from(request)).await?;
        info!(car_id = %car.id, "car created");
        Ok(car)
    }

    pub async fn list_cars(&self) -> Result<Vec<Car>, AppError> {
        self.repository.list_cars().await
    }

    pub async fn get_car(&self, id: &Uuid) -> Result<Car, AppError> {
        self.repository
            .get_car_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Car not found".to_string()))
    }

    pub async fn update_car(&self, id: &Uuid, request: &CarUpdateRequest) -> Result<Car, AppError> {
        request.validate()?;
        let existing = self.get_car(id).await?;
        let fields = request.merge_into(&existing);
        self.repository.update_car(id, &fields).await
    }

    /// Deletes the car together with its fuel records, parts and part images.
    pub async fn delete_car(&self, id: &Uuid) -> Result<(), AppError> {
        self.get_car(id).await?;
        let pictures = self.repository.list_part_pictures(id).await?;

        self.repository.delete_car(id).await?;
        info!(car_id = %id, images = pictures.len(), "car deleted");

        for picture in &pictures {
            self.media.remove(picture).await;
        }

        Ok(())
    }
}
