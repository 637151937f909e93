use serde::{Deserialize, Serialize};

use super::repo_types::{Category, FoodEntry, Tag};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Submitted create/edit form after normalization.
///
/// Scalar fields stay as raw text until validation. `tags` and `categories`
/// are always sequences, whether the browser sent one value, repeated keys or
/// the `tags[]` spelling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodEntryForm {
    pub date_time: Option<String>,
    pub food_name: Option<String>,
    pub calories: Option<String>,
    pub serving_size: Option<String>,
    pub unit: Option<String>,
    pub meal: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

impl FoodEntryForm {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut form = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "tags" | "tags[]" => {
                    push_name(&mut form.tags, value);
                    continue;
                }
                "categories" | "categories[]" => {
                    push_name(&mut form.categories, value);
                    continue;
                }
                "dateTime" => &mut form.date_time,
                "foodName" => &mut form.food_name,
                "calories" => &mut form.calories,
                "servingSize" => &mut form.serving_size,
                "unit" => &mut form.unit,
                "meal" => &mut form.meal,
                "description" => &mut form.description,
                _ => continue,
            };
            // first occurrence wins for scalar fields
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        form
    }
}

fn push_name(names: &mut Vec<String>, value: String) {
    if !value.trim().is_empty() {
        names.push(value);
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceData {
    pub tags: Vec<Tag>,
    pub categories: Vec<Category>,
    pub units: &'static [&'static str],
    pub meals: &'static [&'static str],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub food_entries: Vec<FoodEntry>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditView {
    pub food_entry: FoodEntry,
    #[serde(flatten)]
    pub reference: ReferenceData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteView {
    pub food_entry: FoodEntry,
}
