use std::sync::Arc;

use sqlx::PgPool;

use crate::food_entries::{
    repo::{FoodEntryRepo, PgFoodEntryRepo},
    services::FoodEntryManager,
};

#[derive(Clone)]
pub struct AppState {
    pub entries: Arc<FoodEntryManager>,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        Self::from_repo(Arc::new(PgFoodEntryRepo::new(db)))
    }

    pub fn from_repo(repo: Arc<dyn FoodEntryRepo>) -> Self {
        Self {
            entries: Arc::new(FoodEntryManager::new(repo)),
        }
    }
}
