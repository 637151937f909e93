use axum::{
    extract::{NestedPath, Path, Query, State},
    response::Redirect,
    routing::get,
    Form, Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

use super::dto::{DeleteView, EditView, FoodEntryForm, ListView, ReferenceData, SearchQuery};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_entries))
        .route("/create", get(create_form).post(create_entry))
        .route("/edit/:id", get(edit_form).post(update_entry))
        .route("/delete/:id", get(confirm_delete).post(delete_entry))
}

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<ListView>, AppError> {
    let food_entries = state.entries.list(q.search.as_deref()).await?;
    Ok(Json(ListView {
        food_entries,
        search: q.search,
    }))
}

#[instrument(skip(state))]
pub async fn create_form(State(state): State<AppState>) -> Result<Json<ReferenceData>, AppError> {
    Ok(Json(state.entries.reference_data().await?))
}

/// Form fields are taken as raw pairs so repeated `tags`/`categories` keys survive.
#[instrument(skip(state, nested, pairs))]
pub async fn create_entry(
    nested: NestedPath,
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    let form = FoodEntryForm::from_pairs(pairs);
    state.entries.create(&form).await?;
    Ok(Redirect::to(nested.as_str()))
}

#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditView>, AppError> {
    Ok(Json(state.entries.get_for_edit(id).await?))
}

#[instrument(skip(state, nested, pairs))]
pub async fn update_entry(
    nested: NestedPath,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    let form = FoodEntryForm::from_pairs(pairs);
    state.entries.update(id, &form).await?;
    Ok(Redirect::to(nested.as_str()))
}

#[instrument(skip(state))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteView>, AppError> {
    let food_entry = state.entries.get(id).await?;
    Ok(Json(DeleteView { food_entry }))
}

#[instrument(skip(state, nested))]
pub async fn delete_entry(
    nested: NestedPath,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    state.entries.delete(id).await?;
    Ok(Redirect::to(nested.as_str()))
}
