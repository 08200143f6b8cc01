use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::sync::Mutex;
use uuid::Uuid;

use super::RepositoryError;
use crate::models::{Category, ImageRef, Item, ItemStatus, ItemType};

/// Input data for creating a new listing. Poster identity is stamped from
/// the authenticated session, never taken from the form.
#[derive(Debug, Clone)]
pub struct CreateItemData {
    pub item_type: ItemType,
    pub title: String,
    pub category: Category,
    pub description: String,
    pub location: String,
    pub date: NaiveDate,
    pub contact: Option<String>,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub user_photo: Option<String>,
    pub image: Option<ImageRef>,
}

/// Fields the owner may change after creation. Image and ownership are
/// immutable once posted.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct UpdateItemData {
    pub title: String,
    pub category: Category,
    pub description: String,
    pub location: String,
    pub date: NaiveDate,
    pub contact: Option<String>,
}

/// Narrow persistence interface for listings: one read path ordered by
/// creation time, plus id-addressed writes. Filtering happens in the
/// application, never here.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Item>, RepositoryError>;
    async fn get(&self, id: Uuid) -> Result<Option<Item>, RepositoryError>;
    async fn add(&self, data: CreateItemData) -> Result<Item, RepositoryError>;
    async fn update(&self, id: Uuid, data: UpdateItemData) -> Result<Option<Item>, RepositoryError>;
    /// Returns true when a row was actually removed.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

// --- Postgres implementation ---

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    item_type: String,
    title: String,
    category: String,
    description: String,
    location: String,
    date: NaiveDate,
    contact: Option<String>,
    user_id: Uuid,
    user_email: String,
    user_name: String,
    user_photo: Option<String>,
    image_url: Option<String>,
    image: Option<Json<ImageRef>>,
    created_at: chrono::DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            // The column carries a CHECK constraint; anything else is treated
            // as lost rather than failing the whole read.
            item_type: ItemType::parse(&row.item_type).unwrap_or(ItemType::Lost),
            title: row.title,
            category: Category::from_name(&row.category),
            description: row.description,
            location: row.location,
            date: row.date,
            contact: row.contact,
            user_id: row.user_id,
            user_email: row.user_email,
            user_name: row.user_name,
            user_photo: row.user_photo,
            image_url: row.image_url,
            image: row.image.map(|json| json.0),
            created_at: row.created_at,
            // Only one status exists today.
            status: ItemStatus::Active,
        }
    }
}

const ITEM_COLUMNS: &str = "id, item_type, title, category, description, location, date, contact, \
     user_id, user_email, user_name, user_photo, image_url, image, created_at";

pub struct PostgresItemRepository {
    pool: PgPool,
}

impl PostgresItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository for PostgresItemRepository {
    async fn get_all(&self) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Item::from))
    }

    async fn add(&self, data: CreateItemData) -> Result<Item, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "INSERT INTO items (item_type, title, category, description, location, date, contact, \
                 user_id, user_email, user_name, user_photo, image, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(data.item_type.as_str())
        .bind(&data.title)
        .bind(data.category.as_str())
        .bind(&data.description)
        .bind(&data.location)
        .bind(data.date)
        .bind(&data.contact)
        .bind(data.user_id)
        .bind(&data.user_email)
        .bind(&data.user_name)
        .bind(&data.user_photo)
        .bind(data.image.as_ref().map(Json))
        .bind(ItemStatus::Active.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, data: UpdateItemData) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "UPDATE items \
             SET title = $1, category = $2, description = $3, location = $4, date = $5, contact = $6 \
             WHERE id = $7 \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(&data.title)
        .bind(data.category.as_str())
        .bind(&data.description)
        .bind(&data.location)
        .bind(data.date)
        .bind(&data.contact)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Item::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// --- In-memory implementation ---

/// Backing store for tests and local development: same contract, no database.
#[derive(Default)]
pub struct InMemoryItemRepository {
    items: Mutex<Vec<Item>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store, e.g. with the demo set.
    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn get_all(&self) -> Result<Vec<Item>, RepositoryError> {
        let mut items = self.items.lock().expect("item store poisoned").clone();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Item>, RepositoryError> {
        let items = self.items.lock().expect("item store poisoned");
        Ok(items.iter().find(|i| i.id == id).cloned())
    }

    async fn add(&self, data: CreateItemData) -> Result<Item, RepositoryError> {
        let item = Item {
            id: Uuid::new_v4(),
            item_type: data.item_type,
            title: data.title,
            category: data.category,
            description: data.description,
            location: data.location,
            date: data.date,
            contact: data.contact,
            user_id: data.user_id,
            user_email: data.user_email,
            user_name: data.user_name,
            user_photo: data.user_photo,
            image_url: None,
            image: data.image,
            created_at: Utc::now(),
            status: ItemStatus::Active,
        };
        self.items
            .lock()
            .expect("item store poisoned")
            .push(item.clone());
        Ok(item)
    }

    async fn update(&self, id: Uuid, data: UpdateItemData) -> Result<Option<Item>, RepositoryError> {
        let mut items = self.items.lock().expect("item store poisoned");
        match items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.title = data.title;
                item.category = data.category;
                item.description = data.description;
                item.location = data.location;
                item.date = data.date;
                item.contact = data.contact;
                Ok(Some(item.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut items = self.items.lock().expect("item store poisoned");
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() < before)
    }
}
