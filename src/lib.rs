use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

// Declare the modules (public for the library)
pub mod auth;
pub mod config;
pub mod filter;
pub mod handlers;
pub mod models;
pub mod render;
pub mod repositories;
pub mod seeder;
pub mod storage;
pub mod store;
pub mod validation;

use auth::{
    login_handler, logout_handler, me_handler, register_handler, reset_confirm_handler,
    reset_request_handler, SessionStore,
};
use handlers::{
    feedback_handlers::{list_feedback_handler, submit_feedback_handler},
    item_handlers::{
        create_item_handler, delete_item_handler, get_item_handler, items_grid_handler,
        list_items_handler, update_item_handler,
    },
};
use repositories::{account_repository::AccountRepository, feedback_repository::FeedbackRepository};
use storage::ImageStorage;
use store::ItemStore;

// Define the application state (public for the library)
#[derive(Clone)]
pub struct AppState {
    pub items: ItemStore,
    pub feedback: Arc<dyn FeedbackRepository>,
    pub accounts: Arc<dyn AccountRepository>,
    pub sessions: SessionStore,
    pub image_storage: Arc<dyn ImageStorage>,
}

// Request body ceiling: the 5 MB image plus form-field overhead.
const MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

// Function to create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/items", post(create_item_handler).get(list_items_handler))
        .route("/items/grid", get(items_grid_handler))
        .route(
            "/items/:id",
            get(get_item_handler)
                .put(update_item_handler)
                .delete(delete_item_handler),
        )
        .route(
            "/feedback",
            post(submit_feedback_handler).get(list_feedback_handler),
        )
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/me", get(me_handler))
        .route("/auth/reset-request", post(reset_request_handler))
        .route("/auth/reset-confirm", post(reset_confirm_handler))
        .with_state(state)
        // Apply the body limit layer to all routes
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
}

// Basic handler
async fn root() -> &'static str {
    "Community Lost & Found Portal"
}
