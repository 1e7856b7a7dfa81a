use crate::database::car::CarRepository;
use crate::database::part::PartRepository;
use crate::error::app_error::AppError;
use crate::models::part::{Part, PartChanges};
use crate::service::media::{ImageUpload, MediaStore, StagedImage};
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

pub struct PartService<'a, R> {
    repository: &'a R,
    media: &'a MediaStore,
}

impl<'a, R> PartService<'a, R>
where
    R: CarRepository + PartRepository + Sync,
{
    pub fn new(repository: &'a R, media: &'a MediaStore) -> Self {
        PartService { repository, media }
    }

    async fn ensure_car(&self, car_id: &Uuid) -> Result<(), AppError> {
        match self.repository.get_car_by_id(car_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Car not found".to_string())),
        }
    }

    async fn get_part(&self, id: &Uuid) -> Result<Part, AppError> {
        self.repository
            .get_part_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Part not found".to_string()))
    }

    async fn publish(&self, staged: StagedImage) -> Result<String, AppError> {
        self.media.promote(staged).await.inspect_err(|e| {
            error!(error = ?e, "uploaded image could not be published");
        })
    }

    pub async fn list_parts(&self, car_id: &Uuid) -> Result<Vec<Part>, AppError> {
        self.ensure_car(car_id).await?;
        self.repository.list_parts(car_id).await
    }

    pub async fn create_part(&self, car_id: &Uuid, changes: PartChanges, picture: Option<ImageUpload>) -> Result<Part, AppError> {
        let fields = changes.into_fields()?;
        fields.validate()?;
        if let Some(upload) = &picture {
            self.media.validate(upload)?;
        }
        self.ensure_car(car_id).await?;

        let Some(upload) = picture else {
            let part = self.repository.create_part(car_id, &fields, None).await?;
            info!(car_id = %car_id, part_id = %part.id, "part created");
            return Ok(part);
        };

        let staged = self.media.stage(upload).await?;
        let created = self.repository.create_part(car_id, &fields, Some(staged.public_path())).await;
        let part = match created {
            Ok(part) => part,
            Err(e) => {
                self.media.discard(staged).await;
                return Err(e);
            }
        };

        // The row must not point at a file that never got published.
        if let Err(e) = self.publish(staged).await {
            if let Err(rollback) = self.repository.delete_part(&part.id).await {
                error!(part_id = %part.id, error = ?rollback, "failed to remove part after image publish failure");
            }
            return Err(e);
        }

        info!(car_id = %car_id, part_id = %part.id, "part created with image");
        Ok(part)
    }

    /// Merges the given fields into the stored part. A new image replaces the
    /// old one, which is removed only after the row points at the new file.
    pub async fn update_part(&self, id: &Uuid, changes: PartChanges, picture: Option<ImageUpload>) -> Result<Part, AppError> {
        let existing = self.get_part(id).await?;
        let fields = changes.merge_into(&existing);
        fields.validate()?;
        if let Some(upload) = &picture {
            self.media.validate(upload)?;
        }

        let Some(upload) = picture else {
            return self.repository.update_part(id, &fields, existing.picture_path.as_deref()).await;
        };

        let staged = self.media.stage(upload).await?;
        let updated = self.repository.update_part(id, &fields, Some(staged.public_path())).await;
        let part = match updated {
            Ok(part) => part,
            Err(e) => {
                self.media.discard(staged).await;
                return Err(e);
            }
        };

        if let Err(e) = self.publish(staged).await {
            if let Err(rollback) = self.repository.update_part(id, &fields, existing.picture_path.as_deref()).await {
                error!(part_id = %id, error = ?rollback, "failed to restore previous part image");
            }
            return Err(e);
        }

        if let Some(old) = existing.picture_path.as_deref() {
            self.media.remove(old).await;
        }

        info!(part_id = %id, "part image replaced");
        Ok(part)
    }

    pub async fn delete_part(&self, id: &Uuid) -> Result<(), AppError> {
        let existing = self.get_part(id).await?;

        self.repository.delete_part(id).await?;
        if let Some(picture) = existing.picture_path.as_deref() {
            self.media.remove(picture).await;
        }

        info!(part_id = %id, "part deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::media::tests::{png, temp_store};
    use crate::test_utils::{MockRepository, sample_part_changes, seed_car};
    use std::path::PathBuf;

    fn file_of(media: &MediaStore, public_path: &str) -> PathBuf {
        media.root().join(public_path.rsplit('/').next().unwrap())
    }

    fn staging_is_empty(media: &MediaStore) -> bool {
        std::fs::read_dir(media.root().join(".staging")).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn create_with_image_stores_and_references_file() {
        let repo = MockRepository::default();
        let media = temp_store().await;
        let car = seed_car(&repo, 0);
        let service = PartService::new(&repo, &media);

        let part = service.create_part(&car.id, sample_part_changes(), Some(png(b"brake"))).await.unwrap();

        let picture = part.picture_path.clone().unwrap();
        assert!(picture.starts_with("/media/part_"));
        assert_eq!(std::fs::read(file_of(&media, &picture)).unwrap(), b"brake");
        assert!(staging_is_empty(&media));
    }

    #[tokio::test]
    async fn create_requires_all_fields() {
        let repo = MockRepository::default();
        let media = temp_store().await;
        let car = seed_car(&repo, 0);
        let service = PartService::new(&repo, &media);
        let changes = PartChanges {
            model: None,
            ..sample_part_changes()
        };

        let result = service.create_part(&car.id, changes, Some(png(b"x"))).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(staging_is_empty(&media));
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected_before_any_write() {
        let repo = MockRepository::default();
        let media = temp_store().await;
        let car = seed_car(&repo, 0);
        let service = PartService::new(&repo, &media);
        let upload = ImageUpload {
            content_type: Some("application/pdf".to_string()),
            bytes: b"%PDF".to_vec(),
        };

        let result = service.create_part(&car.id, sample_part_changes(), Some(upload)).await;

        assert!(matches!(result, Err(AppError::InvalidUpload(_))));
        assert!(repo.parts.lock().unwrap().is_empty());
        assert!(staging_is_empty(&media));
    }

    #[tokio::test]
    async fn create_for_unknown_car_writes_nothing() {
        let repo = MockRepository::default();
        let media = temp_store().await;
        let service = PartService::new(&repo, &media);

        let result = service.create_part(&Uuid::new_v4(), sample_part_changes(), Some(png(b"x"))).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(staging_is_empty(&media));
    }

    #[tokio::test]
    async fn failed_row_write_discards_staged_image() {
        let repo = MockRepository::default();
        let media = temp_store().await;
        let car = seed_car(&repo, 0);
        let service = PartService::new(&repo, &media);
        repo.fail_part_writes();

        let result = service.create_part(&car.id, sample_part_changes(), Some(png(b"x"))).await;

        assert!(matches!(result, Err(AppError::Db { .. })));
        assert!(staging_is_empty(&media));
        assert_eq!(std::fs::read_dir(media.root()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn update_with_new_image_replaces_old_file() {
        let repo = MockRepository::default();
        let media = temp_store().await;
        let car = seed_car(&repo, 0);
        let service = PartService::new(&repo, &media);
        let part = service.create_part(&car.id, sample_part_changes(), Some(png(b"old"))).await.unwrap();
        let old_picture = part.picture_path.clone().unwrap();

        let changes = PartChanges {
            price: Some(310.0),
            ..PartChanges::default()
        };
        let updated = service.update_part(&part.id, changes, Some(png(b"new"))).await.unwrap();

        let new_picture = updated.picture_path.clone().unwrap();
        assert_ne!(new_picture, old_picture);
        assert!(!file_of(&media, &old_picture).exists());
        assert_eq!(std::fs::read(file_of(&media, &new_picture)).unwrap(), b"new");
        assert_eq!(updated.price, 310.0);
        assert_eq!(updated.model, part.model);
    }

    #[tokio::test]
    async fn update_without_image_keeps_existing_file() {
        let repo = MockRepository::default();
        let media = temp_store().await;
        let car = seed_car(&repo, 0);
        let service = PartService::new(&repo, &media);
        let part = service.create_part(&car.id, sample_part_changes(), Some(png(b"keep"))).await.unwrap();

        let changes = PartChanges {
            model: Some("https://www.autodoc.pl/ate/13.0460".to_string()),
            ..PartChanges::default()
        };
        let updated = service.update_part(&part.id, changes, None).await.unwrap();

        assert_eq!(updated.picture_path, part.picture_path);
        assert!(file_of(&media, part.picture_path.as_deref().unwrap()).exists());
    }

    #[tokio::test]
    async fn delete_removes_image() {
        let repo = MockRepository::default();
        let media = temp_store().await;
        let car = seed_car(&repo, 0);
        let service = PartService::new(&repo, &media);
        let part = service.create_part(&car.id, sample_part_changes(), Some(png(b"x"))).await.unwrap();
        let picture = part.picture_path.clone().unwrap();

        service.delete_part(&part.id).await.unwrap();

        assert!(!file_of(&media, &picture).exists());
        assert!(service.list_parts(&car.id).await.unwrap().is_empty());
        assert!(matches!(service.delete_part(&part.id).await, Err(AppError::NotFound(_))));
    }
}
