use crate::error::app_error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use rocket::FromForm;
use rocket::fs::TempFile;
use rocket::serde::Serialize;
use schemars::JsonSchema;
use std::sync::LazyLock;
use uuid::Uuid;
use validator::Validate;

/// Loose "looks like a web address" check for the model field, e.g.
/// `https://shop.example.com/p/123` or `allegro.pl/oferta/1`.
static URL_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(https?://)?(?P<host>([\w-]+\.)+\w{2,})(/\S*)?$").expect("URL pattern is valid"));

#[derive(Serialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Part {
    pub id: Uuid,
    pub car_id: Uuid,
    pub main_component: String,
    pub detailed_component: String,
    pub model: String,
    pub picture_path: Option<String>,
    pub price: f64,
    pub purchase_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// The writable columns of a part row other than its picture.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct PartFields {
    #[validate(length(min = 1))]
    pub main_component: String,
    #[validate(length(min = 1))]
    pub detailed_component: String,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    pub purchase_date: NaiveDate,
}

/// Parsed text fields of a part form. Blank fields are treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartChanges {
    pub main_component: Option<String>,
    pub detailed_component: Option<String>,
    pub model: Option<String>,
    pub price: Option<f64>,
    pub purchase_date: Option<NaiveDate>,
}

impl PartChanges {
    /// All fields are mandatory when creating a part.
    pub fn into_fields(self) -> Result<PartFields, AppError> {
        match self {
            PartChanges {
                main_component: Some(main_component),
                detailed_component: Some(detailed_component),
                model: Some(model),
                price: Some(price),
                purchase_date: Some(purchase_date),
            } => Ok(PartFields {
                main_component,
                detailed_component,
                model,
                price,
                purchase_date,
            }),
            _ => Err(AppError::BadRequest("Missing required fields".to_string())),
        }
    }

    pub fn merge_into(self, part: &Part) -> PartFields {
        PartFields {
            main_component: self.main_component.unwrap_or_else(|| part.main_component.clone()),
            detailed_component: self.detailed_component.unwrap_or_else(|| part.detailed_component.clone()),
            model: self.model.unwrap_or_else(|| part.model.clone()),
            price: self.price.unwrap_or(part.price),
            purchase_date: self.purchase_date.unwrap_or(part.purchase_date),
        }
    }
}

/// Multipart body accepted by the part create and update routes.
#[derive(FromForm, Debug)]
pub struct PartForm<'r> {
    pub main_component: Option<String>,
    pub detailed_component: Option<String>,
    pub model: Option<String>,
    pub price: Option<String>,
    pub purchase_date: Option<String>,
    pub picture: Option<TempFile<'r>>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

impl PartForm<'_> {
    pub fn changes(&self) -> Result<PartChanges, AppError> {
        let price = non_blank(&self.price)
            .map(|raw| raw.parse::<f64>().map_err(|_| AppError::BadRequest(format!("Invalid price: {raw}"))))
            .transpose()?;
        if price.is_some_and(|p| !p.is_finite()) {
            return Err(AppError::BadRequest("Invalid price".to_string()));
        }

        let purchase_date = non_blank(&self.purchase_date)
            .map(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| AppError::BadRequest(format!("Invalid purchase date: {raw}"))))
            .transpose()?;

        Ok(PartChanges {
            main_component: non_blank(&self.main_component),
            detailed_component: non_blank(&self.detailed_component),
            model: non_blank(&self.model),
            price,
            purchase_date,
        })
    }

    /// The uploaded picture, if the client actually attached a file.
    pub fn picture(&self) -> Option<&TempFile<'_>> {
        self.picture.as_ref().filter(|file| file.len() > 0)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct ModelLink {
    pub url: String,
    pub host: String,
}

/// Best-effort detection of a shop link typed into the model field.
pub fn model_link(model: &str) -> Option<ModelLink> {
    let text = model.trim();
    let captures = URL_LIKE.captures(text)?;
    let host = captures.name("host")?.as_str().to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    let lowered = text.to_ascii_lowercase();
    let url = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        text.to_string()
    } else {
        format!("https://{text}")
    };

    Some(ModelLink { url, host })
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct PartResponse {
    pub id: Uuid,
    pub car_id: Uuid,
    pub main_component: String,
    pub detailed_component: String,
    pub model: String,
    pub model_link: Option<ModelLink>,
    pub picture_path: Option<String>,
    pub price: f64,
    pub purchase_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<&Part> for PartResponse {
    fn from(part: &Part) -> Self {
        Self {
            id: part.id,
            car_id: part.car_id,
            main_component: part.main_component.clone(),
            detailed_component: part.detailed_component.clone(),
            model: part.model.clone(),
            model_link: model_link(&part.model),
            picture_path: part.picture_path.clone(),
            price: part.price,
            purchase_date: part.purchase_date,
            created_at: part.created_at,
        }
    }
}
