use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::repo::{FoodEntryRepo, StoreError};
use super::repo_types::{Category, EntryLinks, Tag};

/// Snapshot of the tag and category reference tables, keyed by exact name.
///
/// Loaded once per request so resolving N names costs two queries rather than N.
#[derive(Debug, Default)]
pub struct Resolver {
    tags: HashMap<String, Uuid>,
    categories: HashMap<String, Uuid>,
}

impl Resolver {
    pub async fn load(repo: &dyn FoodEntryRepo) -> Result<Self, StoreError> {
        let tags = repo.all_tags().await?;
        let categories = repo.all_categories().await?;
        Ok(Self::from_reference(&tags, &categories))
    }

    pub fn from_reference(tags: &[Tag], categories: &[Category]) -> Self {
        Self {
            tags: tags.iter().map(|t| (t.name.clone(), t.id)).collect(),
            categories: categories.iter().map(|c| (c.name.clone(), c.id)).collect(),
        }
    }

    pub fn resolve_tag_id(&self, name: &str) -> Option<Uuid> {
        self.tags.get(name).copied()
    }

    pub fn resolve_category_id(&self, name: &str) -> Option<Uuid> {
        self.categories.get(name).copied()
    }

    /// Resolves submitted names into junction ids. Unknown names are skipped and
    /// repeated names collapse to one id; submission order is kept otherwise.
    pub fn links(&self, tag_names: &[String], category_names: &[String]) -> EntryLinks {
        EntryLinks {
            tag_ids: resolve_all(tag_names, |n| self.resolve_tag_id(n)),
            category_ids: resolve_all(category_names, |n| self.resolve_category_id(n)),
        }
    }
}

fn resolve_all<F>(names: &[String], resolve: F) -> Vec<Uuid>
where
    F: Fn(&str) -> Option<Uuid>,
{
    let mut seen = HashSet::new();
    names
        .iter()
        .filter_map(|name| {
            let id = resolve(name);
            if id.is_none() {
                tracing::debug!(%name, "skipping unknown reference name");
            }
            id
        })
        .filter(|id| seen.insert(*id))
        .collect()
}
