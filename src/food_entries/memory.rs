use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::repo::{FoodEntryRepo, StoreError};
use super::repo_types::{Category, EntryLinks, FoodEntry, FoodEntryFields, Tag};

/// In-process stand-in for the Postgres repository.
#[derive(Default)]
pub struct MemoryRepo {
    inner: Mutex<Inner>,
    unavailable: bool,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<Uuid, FoodEntryFields>,
    entry_tags: BTreeSet<(Uuid, Uuid)>,
    entry_categories: BTreeSet<(Uuid, Uuid)>,
    tags: Vec<Tag>,
    categories: Vec<Category>,
}

impl MemoryRepo {
    pub fn with_reference(tags: &[&str], categories: &[&str]) -> Self {
        let inner = Inner {
            tags: tags
                .iter()
                .map(|n| Tag {
                    id: Uuid::new_v4(),
                    name: n.to_string(),
                })
                .collect(),
            categories: categories
                .iter()
                .map(|n| Category {
                    id: Uuid::new_v4(),
                    name: n.to_string(),
                })
                .collect(),
            ..Inner::default()
        };
        Self {
            inner: Mutex::new(inner),
            unavailable: false,
        }
    }

    /// Every call fails as if the pool had timed out.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn link_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.entry_tags.len() + inner.entry_categories.len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

impl Inner {
    fn assemble(&self, id: Uuid, f: &FoodEntryFields) -> FoodEntry {
        let tags = self
            .tags
            .iter()
            .filter(|t| self.entry_tags.contains(&(id, t.id)))
            .map(|t| t.name.clone())
            .collect();
        let categories = self
            .categories
            .iter()
            .filter(|c| self.entry_categories.contains(&(id, c.id)))
            .map(|c| c.name.clone())
            .collect();
        FoodEntry {
            id,
            date_time: f.date_time,
            food_name: f.food_name.clone(),
            calories: f.calories,
            serving_size: f.serving_size,
            unit: f.unit.clone(),
            meal: f.meal.clone(),
            description: f.description.clone(),
            tags,
            categories,
        }
    }

    fn write_links(&mut self, id: Uuid, links: &EntryLinks) {
        for tag_id in &links.tag_ids {
            self.entry_tags.insert((id, *tag_id));
        }
        for category_id in &links.category_ids {
            self.entry_categories.insert((id, *category_id));
        }
    }

    fn clear_links(&mut self, id: Uuid) {
        self.entry_tags.retain(|(entry, _)| *entry != id);
        self.entry_categories.retain(|(entry, _)| *entry != id);
    }
}

#[async_trait]
impl FoodEntryRepo for MemoryRepo {
    async fn list(&self, search: Option<&str>) -> Result<Vec<FoodEntry>, StoreError> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        let needle = search.map(str::to_lowercase);
        let mut out: Vec<FoodEntry> = inner
            .entries
            .iter()
            .filter(|(_, f)| match &needle {
                Some(n) => {
                    f.food_name.to_lowercase().contains(n)
                        || f.description.to_lowercase().contains(n)
                }
                None => true,
            })
            .map(|(id, f)| inner.assemble(*id, f))
            .collect();
        out.sort_by(|a, b| b.date_time.cmp(&a.date_time).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn get(&self, id: Uuid) -> Result<Option<FoodEntry>, StoreError> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.entries.get(&id).map(|f| inner.assemble(id, f)))
    }

    async fn all_tags(&self) -> Result<Vec<Tag>, StoreError> {
        self.check()?;
        let mut tags = self.inner.lock().unwrap().tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn all_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.check()?;
        let mut categories = self.inner.lock().unwrap().categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert(
        &self,
        id: Uuid,
        fields: &FoodEntryFields,
        links: &EntryLinks,
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.entries.insert(id, fields.clone());
        inner.write_links(id, links);
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        fields: &FoodEntryFields,
        links: &EntryLinks,
    ) -> Result<bool, StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        match inner.entries.get_mut(&id) {
            Some(existing) => *existing = fields.clone(),
            None => return Ok(false),
        }
        inner.clear_links(id);
        inner.write_links(id, links);
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.clear_links(id);
        Ok(inner.entries.remove(&id).is_some())
    }
}
