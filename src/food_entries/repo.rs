use async_trait::async_trait;
use sqlx::{error::ErrorKind, PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use super::repo_types::{Category, EntryLinks, FoodEntry, FoodEntryFields, FoodEntryRow, Tag};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    #[error("constraint violation: {0}")]
    Constraint(#[source] sqlx::Error),

    #[error("database error: {0}")]
    Other(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(e),
            sqlx::Error::Database(db)
                if matches!(
                    db.kind(),
                    ErrorKind::UniqueViolation
                        | ErrorKind::ForeignKeyViolation
                        | ErrorKind::NotNullViolation
                        | ErrorKind::CheckViolation
                ) =>
            {
                StoreError::Constraint(e)
            }
            _ => StoreError::Other(e),
        }
    }
}

#[async_trait]
pub trait FoodEntryRepo: Send + Sync {
    /// Entries with aggregated tag/category names, newest first. `search` matches
    /// name or description case-insensitively.
    async fn list(&self, search: Option<&str>) -> Result<Vec<FoodEntry>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<FoodEntry>, StoreError>;
    async fn all_tags(&self) -> Result<Vec<Tag>, StoreError>;
    async fn all_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn insert(
        &self,
        id: Uuid,
        fields: &FoodEntryFields,
        links: &EntryLinks,
    ) -> Result<(), StoreError>;
    /// Returns `false` when no entry has this id; nothing is written in that case.
    async fn update(
        &self,
        id: Uuid,
        fields: &FoodEntryFields,
        links: &EntryLinks,
    ) -> Result<bool, StoreError>;
    /// Returns `false` when no entry has this id.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgFoodEntryRepo {
    db: PgPool,
}

impl PgFoodEntryRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const ENTRY_SELECT: &str = r#"
    SELECT fe.id, fe.date_time, fe.food_name, fe.calories, fe.serving_size,
           fe.unit, fe.meal, fe.description,
           COALESCE(ARRAY_AGG(DISTINCT t.name) FILTER (WHERE t.name IS NOT NULL), '{}') AS tags,
           COALESCE(ARRAY_AGG(DISTINCT c.name) FILTER (WHERE c.name IS NOT NULL), '{}') AS categories
      FROM food_entries fe
      LEFT JOIN food_entries_tags fet ON fet.food_entry_id = fe.id
      LEFT JOIN tags t ON t.id = fet.tag_id
      LEFT JOIN food_entries_categories fec ON fec.food_entry_id = fe.id
      LEFT JOIN categories c ON c.id = fec.category_id
"#;

/// `%term%` with LIKE metacharacters escaped so they match literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[async_trait]
impl FoodEntryRepo for PgFoodEntryRepo {
    async fn list(&self, search: Option<&str>) -> Result<Vec<FoodEntry>, StoreError> {
        let sql = format!(
            r#"{ENTRY_SELECT}
             WHERE $1::text IS NULL
                OR fe.food_name ILIKE $1 ESCAPE '\'
                OR fe.description ILIKE $1 ESCAPE '\'
             GROUP BY fe.id
             ORDER BY fe.date_time DESC, fe.id"#
        );
        let rows = sqlx::query_as::<_, FoodEntryRow>(&sql)
            .bind(search.map(like_pattern))
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(FoodEntry::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<FoodEntry>, StoreError> {
        let sql = format!("{ENTRY_SELECT} WHERE fe.id = $1 GROUP BY fe.id");
        let row = sqlx::query_as::<_, FoodEntryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(FoodEntry::from))
    }

    async fn all_tags(&self) -> Result<Vec<Tag>, StoreError> {
        let rows = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name")
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn all_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
                .fetch_all(&self.db)
                .await?;
        Ok(rows)
    }

    async fn insert(
        &self,
        id: Uuid,
        fields: &FoodEntryFields,
        links: &EntryLinks,
    ) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO food_entries
                (id, date_time, food_name, calories, serving_size, unit, meal, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(fields.date_time)
        .bind(&fields.food_name)
        .bind(fields.calories)
        .bind(fields.serving_size)
        .bind(&fields.unit)
        .bind(&fields.meal)
        .bind(&fields.description)
        .execute(&mut *tx)
        .await?;

        insert_links_tx(&mut tx, id, links).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        fields: &FoodEntryFields,
        links: &EntryLinks,
    ) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE food_entries
               SET date_time = $2, food_name = $3, calories = $4, serving_size = $5,
                   unit = $6, meal = $7, description = $8
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(fields.date_time)
        .bind(&fields.food_name)
        .bind(fields.calories)
        .bind(fields.serving_size)
        .bind(&fields.unit)
        .bind(&fields.meal)
        .bind(&fields.description)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        delete_links_tx(&mut tx, id).await?;
        insert_links_tx(&mut tx, id, links).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await?;

        // Junction rows go first so nothing depends on the schema cascading.
        delete_links_tx(&mut tx, id).await?;
        let deleted = sqlx::query("DELETE FROM food_entries WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }
}

async fn delete_links_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM food_entries_tags WHERE food_entry_id = $1")
        .bind(entry_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM food_entries_categories WHERE food_entry_id = $1")
        .bind(entry_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_links_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
    links: &EntryLinks,
) -> Result<(), sqlx::Error> {
    if !links.tag_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO food_entries_tags (food_entry_id, tag_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(entry_id)
        .bind(&links.tag_ids)
        .execute(&mut **tx)
        .await?;
    }
    if !links.category_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO food_entries_categories (food_entry_id, category_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(entry_id)
        .bind(&links.category_ids)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
