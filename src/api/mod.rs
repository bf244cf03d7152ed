pub mod handlers;

pub use handlers::*;

use crate::config::AppConfig;
use crate::service::SessionStore;
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// 共享状态: 编辑会话 + 数据库 + 配置
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let sessions = SessionStore::new(config.editor.palette.clone(), config.currency_rates());
        Self {
            sessions: Arc::new(sessions),
            pool,
            config: Arc::new(config),
        }
    }

    pub fn db_timeout(&self) -> Duration {
        self.config.database.statement_timeout()
    }
}

pub fn router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(close_session))
        .route("/api/sessions/:id/reorder", post(reorder_items))
        .route("/api/sessions/:id/ungroup", post(ungroup_item))
        .route("/api/sessions/:id/products", post(add_product))
        .route("/api/sessions/:id/options", post(add_option))
        .route("/api/sessions/:id/custom-items", post(add_custom_item))
        .route("/api/sessions/:id/template", put(set_template))
        .route(
            "/api/sessions/:id/items/:item_id",
            patch(update_item).delete(remove_item),
        )
        .route("/api/sessions/:id/draft", post(save_draft));

    let draft_routes = Router::new()
        .route("/api/drafts", get(list_drafts))
        .route("/api/drafts/:id", get(get_draft).delete(delete_draft))
        .route("/api/drafts/:id/session", post(open_draft))
        .route("/api/drafts/:id/export", get(export_draft));

    let catalog_routes = Router::new()
        .route("/api/catalog/products", get(search_products))
        .route("/api/catalog/options", get(search_options));

    Router::new()
        .route("/health", get(health_check))
        .merge(session_routes)
        .merge(draft_routes)
        .merge(catalog_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
