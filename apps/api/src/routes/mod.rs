pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::store::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Draft
        .route(
            "/api/v1/draft",
            get(handlers::handle_get_draft)
                .post(handlers::handle_new_draft)
                .patch(handlers::handle_update_draft),
        )
        .route(
            "/api/v1/draft/preview",
            get(handlers::handle_preview_draft),
        )
        .route(
            "/api/v1/draft/basics",
            patch(handlers::handle_update_basics),
        )
        .route("/api/v1/draft/save", post(handlers::handle_save_draft))
        .route("/api/v1/draft/:section", post(handlers::handle_add_item))
        .route(
            "/api/v1/draft/:section/:item",
            patch(handlers::handle_update_item).delete(handlers::handle_remove_item),
        )
        // Saved resumes
        .route("/api/v1/resumes", get(handlers::handle_list_resumes))
        .route(
            "/api/v1/resumes/:id",
            get(handlers::handle_get_resume).delete(handlers::handle_delete_resume),
        )
        .route(
            "/api/v1/resumes/:id/edit",
            post(handlers::handle_edit_resume),
        )
        .route(
            "/api/v1/resumes/:id/export",
            get(handlers::handle_export_resume),
        )
        .with_state(state)
}
