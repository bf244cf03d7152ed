use crate::api::AppState;
use crate::db;
use crate::error::AppError;
use crate::models::{CatalogOption, ChildProduct, DraftPayload, InvoiceDraft, ParentProduct, TemplateId};
use crate::service::catalog::{filter_options, filter_products, OptionCategory, ProductListing};
use crate::service::export::export_items_csv;
use crate::service::{ItemPatch, SessionView};
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 会话响应体
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub message: String,
    /// 拖放/解组是否被接受
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
    pub session: SessionView,
}

impl SessionResponse {
    fn ok(message: impl Into<String>, session: SessionView) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            accepted: None,
            session,
        })
    }

    fn decided(accepted: bool, session: SessionView) -> Json<Self> {
        let message = if accepted { "Applied" } else { "Ignored" };
        Json(Self {
            success: true,
            message: message.to_string(),
            accepted: Some(accepted),
            session,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub success: bool,
    pub message: String,
    pub draft: InvoiceDraft,
}

#[derive(Debug, Serialize)]
pub struct DraftListResponse {
    pub success: bool,
    pub message: String,
    pub drafts: Vec<InvoiceDraft>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub success: bool,
    pub message: String,
    pub products: ProductListing,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub success: bool,
    pub message: String,
    pub categories: Vec<OptionCategory>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub template_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub source: usize,
    pub destination: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UngroupRequest {
    pub item_id: String,
}

/// 从商品选择器加入的一组父子商品
#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    pub parent: ParentProduct,
    pub child: ChildProduct,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOptionRequest {
    pub option: CatalogOption,
    #[serde(default)]
    pub attach_to: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCustomItemRequest {
    pub title: String,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest {
    pub template_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("session {}", id))
}

fn draft_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("draft {}", id))
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 新建编辑会话
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> (StatusCode, Json<SessionResponse>) {
    let template = request
        .template_id
        .as_deref()
        .map(TemplateId::parse_or_default)
        .unwrap_or_default();
    let view = state.sessions.create(template);
    (StatusCode::CREATED, SessionResponse::ok("Session created", view))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let (_, view) = state
        .sessions
        .with_session(id, |_| ())
        .ok_or_else(|| session_not_found(id))?;
    Ok(SessionResponse::ok("OK", view))
}

pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.sessions.close(id) {
        return Err(session_not_found(id));
    }
    tracing::info!("关闭编辑会话 {}", id);
    Ok(Json(MessageResponse {
        success: true,
        message: format!("Session {} closed", id),
    }))
}

/// 拖放排序, 非法拖放原样返回并标记 accepted=false
pub async fn reorder_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let (accepted, view) = state
        .sessions
        .with_session(id, |session| session.reorder(req.source, req.destination))
        .ok_or_else(|| session_not_found(id))?;
    if !accepted {
        tracing::debug!(
            "会话 {} 拖放 {} -> {} 被忽略",
            id,
            req.source,
            req.destination
        );
    }
    Ok(SessionResponse::decided(accepted, view))
}

pub async fn ungroup_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UngroupRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let (accepted, view) = state
        .sessions
        .with_session(id, |session| session.ungroup(&req.item_id))
        .ok_or_else(|| session_not_found(id))?;
    if !accepted {
        tracing::debug!("会话 {} 解组 {} 被忽略", id, req.item_id);
    }
    Ok(SessionResponse::decided(accepted, view))
}

pub async fn add_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddProductRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    if req.child.parent_id != req.parent.id {
        return Err(AppError::BadRequest(format!(
            "child {} does not belong to parent {}",
            req.child.id, req.parent.id
        )));
    }
    let (result, view) = state
        .sessions
        .with_session(id, |session| session.add_product(&req.parent, &req.child))
        .ok_or_else(|| session_not_found(id))?;
    result?;
    Ok(SessionResponse::ok(format!("Added {}", req.child.name), view))
}

pub async fn add_option(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddOptionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let (result, view) = state
        .sessions
        .with_session(id, |session| {
            session.add_option(&req.option, req.attach_to.as_deref())
        })
        .ok_or_else(|| session_not_found(id))?;
    result?;
    Ok(SessionResponse::ok(format!("Added {}", req.option.name), view))
}

pub async fn add_custom_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddCustomItemRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }
    let (result, view) = state
        .sessions
        .with_session(id, |session| {
            session.add_custom_item(req.title.trim(), req.unit_price.clone())
        })
        .ok_or_else(|| session_not_found(id))?;
    result?;
    Ok(SessionResponse::ok(format!("Added {}", req.title.trim()), view))
}

/// 切换模板 (只影响合计与列布局)
pub async fn set_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let template = TemplateId::parse_or_default(&req.template_id);
    let (_, view) = state
        .sessions
        .with_session(id, |session| session.set_template(template))
        .ok_or_else(|| session_not_found(id))?;
    Ok(SessionResponse::ok(format!("Template {}", template), view))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, String)>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<SessionResponse>, AppError> {
    let (result, view) = state
        .sessions
        .with_session(id, |session| session.update_item(&item_id, &patch))
        .ok_or_else(|| session_not_found(id))?;
    result?;
    Ok(SessionResponse::ok(format!("Updated {}", item_id), view))
}

/// 删除明细; item_id 为 "all" 时清空
pub async fn remove_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, String)>,
) -> Result<Json<SessionResponse>, AppError> {
    let (_, view) = state
        .sessions
        .with_session(id, |session| session.remove_item(&item_id))
        .ok_or_else(|| session_not_found(id))?;
    Ok(SessionResponse::ok(format!("Removed {}", item_id), view))
}

/// 保存会话为草稿
///
/// 草稿ID在读取会话的同一次加锁内分配并关联, 之后的保存 (包括并发的)
/// 都覆盖同一条草稿。
pub async fn save_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<DraftPayload>,
) -> Result<Json<DraftResponse>, AppError> {
    let ((draft_id, items, template), _) = state
        .sessions
        .with_session(id, |session| {
            (
                session.reserve_draft_id(),
                session.items().to_vec(),
                session.template(),
            )
        })
        .ok_or_else(|| session_not_found(id))?;

    payload.items = items;
    payload.template_id = template;
    let draft = db::upsert_draft(&state.pool, draft_id, &payload, state.db_timeout()).await?;

    Ok(Json(DraftResponse {
        success: true,
        message: format!("Draft {} saved", draft_id),
        draft,
    }))
}

pub async fn list_drafts(State(state): State<AppState>) -> Result<Json<DraftListResponse>, AppError> {
    let drafts = db::list_drafts(&state.pool, state.db_timeout()).await?;
    Ok(Json(DraftListResponse {
        success: true,
        message: format!("{} drafts", drafts.len()),
        drafts,
    }))
}

pub async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftResponse>, AppError> {
    let draft = db::get_draft(&state.pool, id, state.db_timeout())
        .await?
        .ok_or_else(|| draft_not_found(id))?;
    Ok(Json(DraftResponse {
        success: true,
        message: "OK".to_string(),
        draft,
    }))
}

pub async fn delete_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if !db::delete_draft(&state.pool, id, state.db_timeout()).await? {
        return Err(draft_not_found(id));
    }
    tracing::info!("草稿 {} 已删除", id);
    Ok(Json(MessageResponse {
        success: true,
        message: format!("Draft {} deleted", id),
    }))
}

/// 打开草稿为新的编辑会话
pub async fn open_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let draft = db::get_draft(&state.pool, id, state.db_timeout())
        .await?
        .ok_or_else(|| draft_not_found(id))?;
    let view = state.sessions.open_draft(&draft);
    Ok((StatusCode::CREATED, SessionResponse::ok(draft.title, view)))
}

/// 导出草稿明细为 CSV
pub async fn export_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let draft = db::get_draft(&state.pool, id, state.db_timeout())
        .await?
        .ok_or_else(|| draft_not_found(id))?;
    let bytes = export_items_csv(&draft.items, draft.template_id)?;
    let disposition = format!("attachment; filename=\"invoice-{}.csv\"", id);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// 商品选择器: 关键字 + 客户筛选
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<ProductsResponse>, AppError> {
    let limit = state.db_timeout();
    let parents = db::list_parent_products(&state.pool, limit).await?;
    let children = db::list_child_products(&state.pool, limit).await?;
    let products = filter_products(
        &parents,
        &children,
        query.q.as_deref().unwrap_or_default(),
        query.customer_id.as_deref(),
    );
    Ok(Json(ProductsResponse {
        success: true,
        message: format!(
            "{} customer / {} general products",
            products.customer_products.len(),
            products.general_products.len()
        ),
        products,
    }))
}

/// 选项选择器: 关键字筛选并按分类分组
pub async fn search_options(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<OptionsResponse>, AppError> {
    let options = db::list_catalog_options(&state.pool, state.db_timeout()).await?;
    let categories = filter_options(&options, query.q.as_deref().unwrap_or_default());
    Ok(Json(OptionsResponse {
        success: true,
        message: format!("{} categories", categories.len()),
        categories,
    }))
}
