use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Mutex;
use uuid::Uuid;

use super::RepositoryError;
use crate::models::Feedback;

/// Input data for a feedback entry. Identity fields come from the session.
#[derive(Debug, Clone)]
pub struct CreateFeedbackData {
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub user_photo: Option<String>,
    pub message: String,
    pub rating: i16,
}

#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn add(&self, data: CreateFeedbackData) -> Result<Feedback, RepositoryError>;
    async fn get_all(&self) -> Result<Vec<Feedback>, RepositoryError>;
}

// --- Postgres implementation ---

#[derive(sqlx::FromRow)]
struct FeedbackRow {
    id: Uuid,
    user_id: Uuid,
    user_email: String,
    user_name: String,
    user_photo: Option<String>,
    message: String,
    rating: i16,
    created_at: chrono::DateTime<Utc>,
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Feedback {
            id: row.id,
            user_id: row.user_id,
            user_email: row.user_email,
            user_name: row.user_name,
            user_photo: row.user_photo,
            message: row.message,
            rating: row.rating,
            created_at: row.created_at,
        }
    }
}

pub struct PostgresFeedbackRepository {
    pool: PgPool,
}

impl PostgresFeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedbackRepository for PostgresFeedbackRepository {
    async fn add(&self, data: CreateFeedbackData) -> Result<Feedback, RepositoryError> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            "INSERT INTO feedback (user_id, user_email, user_name, user_photo, message, rating) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, user_id, user_email, user_name, user_photo, message, rating, created_at",
        )
        .bind(data.user_id)
        .bind(&data.user_email)
        .bind(&data.user_name)
        .bind(&data.user_photo)
        .bind(&data.message)
        .bind(data.rating)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get_all(&self) -> Result<Vec<Feedback>, RepositoryError> {
        let rows = sqlx::query_as::<_, FeedbackRow>(
            "SELECT id, user_id, user_email, user_name, user_photo, message, rating, created_at \
             FROM feedback ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Feedback::from).collect())
    }
}

// --- In-memory implementation ---

#[derive(Default)]
pub struct InMemoryFeedbackRepository {
    entries: Mutex<Vec<Feedback>>,
}

impl InMemoryFeedbackRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackRepository for InMemoryFeedbackRepository {
    async fn add(&self, data: CreateFeedbackData) -> Result<Feedback, RepositoryError> {
        let entry = Feedback {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            user_email: data.user_email,
            user_name: data.user_name,
            user_photo: data.user_photo,
            message: data.message,
            rating: data.rating,
            created_at: Utc::now(),
        };
        self.entries
            .lock()
            .expect("feedback store poisoned")
            .push(entry.clone());
        Ok(entry)
    }

    async fn get_all(&self) -> Result<Vec<Feedback>, RepositoryError> {
        let mut entries = self.entries.lock().expect("feedback store poisoned").clone();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}
