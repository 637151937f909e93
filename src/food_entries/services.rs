use std::sync::Arc;

use thiserror::Error;
use time::{macros::format_description, PrimitiveDateTime};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{EditView, FoodEntryForm, ReferenceData};
use super::repo::{FoodEntryRepo, StoreError};
use super::repo_types::{FoodEntry, FoodEntryFields, MEALS, UNITS};
use super::resolver::Resolver;

const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("food entry {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::Missing { field }),
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ValidationError {
    ValidationError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Accepts `datetime-local` input (`2024-05-01T08:30`), optional seconds, and a
/// space instead of the `T`.
pub(crate) fn parse_date_time(raw: &str) -> Option<PrimitiveDateTime> {
    let mut normalized = raw.trim().replacen(' ', "T", 1);
    if normalized.len() == 16 {
        normalized.push_str(":00");
    }
    PrimitiveDateTime::parse(
        &normalized,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .ok()
}

fn one_of(raw: &str, allowed: &[&str], field: &'static str) -> Result<String, ValidationError> {
    let value = raw.to_lowercase();
    if allowed.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(invalid(field, format!("must be one of: {}", allowed.join(", "))))
    }
}

pub fn validate(form: &FoodEntryForm) -> Result<FoodEntryFields, ValidationError> {
    let date_time = parse_date_time(required(&form.date_time, "dateTime")?)
        .ok_or_else(|| invalid("dateTime", "must look like YYYY-MM-DDTHH:MM"))?;

    let food_name = required(&form.food_name, "foodName")?;
    if food_name.chars().count() > MAX_NAME_LEN {
        return Err(invalid(
            "foodName",
            format!("must be at most {MAX_NAME_LEN} characters"),
        ));
    }

    let calories = required(&form.calories, "calories")?
        .parse::<i32>()
        .map_err(|_| invalid("calories", "must be a whole number"))?;
    if calories < 0 {
        return Err(invalid("calories", "must not be negative"));
    }

    let serving_size = required(&form.serving_size, "servingSize")?
        .parse::<f64>()
        .map_err(|_| invalid("servingSize", "must be a number"))?;
    if !serving_size.is_finite() || serving_size <= 0.0 {
        return Err(invalid("servingSize", "must be greater than zero"));
    }

    let unit = one_of(required(&form.unit, "unit")?, UNITS, "unit")?;
    let meal = one_of(required(&form.meal, "meal")?, MEALS, "meal")?;

    Ok(FoodEntryFields {
        date_time,
        food_name: food_name.to_string(),
        calories,
        serving_size,
        unit,
        meal,
        description: form.description.clone().unwrap_or_default(),
    })
}

/// Create/read/update/delete for food entries and their tag/category links.
pub struct FoodEntryManager {
    repo: Arc<dyn FoodEntryRepo>,
}

impl FoodEntryManager {
    pub fn new(repo: Arc<dyn FoodEntryRepo>) -> Self {
        Self { repo }
    }

    /// A blank search term lists everything.
    #[instrument(skip(self))]
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<FoodEntry>, EntryError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        Ok(self.repo.list(search).await?)
    }

    pub async fn reference_data(&self) -> Result<ReferenceData, EntryError> {
        Ok(ReferenceData {
            tags: self.repo.all_tags().await?,
            categories: self.repo.all_categories().await?,
            units: UNITS,
            meals: MEALS,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<FoodEntry, EntryError> {
        self.repo.get(id).await?.ok_or(EntryError::NotFound(id))
    }

    pub async fn get_for_edit(&self, id: Uuid) -> Result<EditView, EntryError> {
        let food_entry = self.get(id).await?;
        let reference = self.reference_data().await?;
        Ok(EditView {
            food_entry,
            reference,
        })
    }

    #[instrument(skip(self, form))]
    pub async fn create(&self, form: &FoodEntryForm) -> Result<Uuid, EntryError> {
        let fields = validate(form)?;
        let links = Resolver::load(self.repo.as_ref())
            .await?
            .links(&form.tags, &form.categories);

        let id = Uuid::new_v4();
        self.repo.insert(id, &fields, &links).await?;
        info!(
            %id,
            tags = links.tag_ids.len(),
            categories = links.category_ids.len(),
            "food entry created"
        );
        Ok(id)
    }

    /// Full replace: every field and the whole tag/category set come from `form`.
    #[instrument(skip(self, form))]
    pub async fn update(&self, id: Uuid, form: &FoodEntryForm) -> Result<(), EntryError> {
        let fields = validate(form)?;
        let links = Resolver::load(self.repo.as_ref())
            .await?
            .links(&form.tags, &form.categories);

        if !self.repo.update(id, &fields, &links).await? {
            return Err(EntryError::NotFound(id));
        }
        info!(
            %id,
            tags = links.tag_ids.len(),
            categories = links.category_ids.len(),
            "food entry updated"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), EntryError> {
        if !self.repo.delete(id).await? {
            return Err(EntryError::NotFound(id));
        }
        info!(%id, "food entry deleted");
        Ok(())
    }
}
