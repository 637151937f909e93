use serde::Serialize;
use sqlx::FromRow;
use time::PrimitiveDateTime;
use uuid::Uuid;

time::serde::format_description!(
    entry_time,
    PrimitiveDateTime,
    "[year]-[month]-[day]T[hour]:[minute]:[second]"
);

pub const UNITS: &[&str] = &[
    "g", "kg", "ml", "l", "oz", "cup", "tbsp", "tsp", "piece", "slice", "serving",
];

pub const MEALS: &[&str] = &["breakfast", "lunch", "dinner", "snack"];

/// Column values of a food entry, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodEntryFields {
    pub date_time: PrimitiveDateTime,
    pub food_name: String,
    pub calories: i32,
    pub serving_size: f64,
    pub unit: String,
    pub meal: String,
    pub description: String,
}

/// Joined row: the entry plus aggregated tag and category names.
#[derive(Debug, FromRow)]
pub struct FoodEntryRow {
    pub id: Uuid,
    pub date_time: PrimitiveDateTime,
    pub food_name: String,
    pub calories: i32,
    pub serving_size: f64,
    pub unit: String,
    pub meal: String,
    pub description: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: Uuid,
    #[serde(with = "entry_time")]
    pub date_time: PrimitiveDateTime,
    pub food_name: String,
    pub calories: i32,
    pub serving_size: f64,
    pub unit: String,
    pub meal: String,
    pub description: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

impl From<FoodEntryRow> for FoodEntry {
    fn from(r: FoodEntryRow) -> Self {
        Self {
            id: r.id,
            date_time: r.date_time,
            food_name: r.food_name,
            calories: r.calories,
            serving_size: r.serving_size,
            unit: r.unit,
            meal: r.meal,
            description: r.description,
            tags: r.tags,
            categories: r.categories,
        }
    }
}

/// Ids to write into the junction tables for one entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryLinks {
    pub tag_ids: Vec<Uuid>,
    pub category_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}
