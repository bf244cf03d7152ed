use crate::error::AppError;
use crate::models::{
    CatalogOption, ChildProduct, DraftPayload, InvoiceDraft, InvoiceDraftRow, ParentProduct,
};
use sqlx::types::Json;
use sqlx::PgPool;
use std::future::Future;
use std::time::{Duration, Instant};
use uuid::Uuid;

const DRAFT_COLUMNS: &str = "id, title, items, template_id, sender_id, recipient_id, \
     payment_method_id, issue_date, payment_deadline, created_at, updated_at";

/// 带超时控制地执行一次数据库操作
async fn timed<T>(
    label: &str,
    limit: Duration,
    operation: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, AppError> {
    let start = Instant::now();
    match tokio::time::timeout(limit, operation).await {
        Ok(Ok(value)) => {
            tracing::debug!("✓ {} 完成, 耗时: {:?}", label, start.elapsed());
            Ok(value)
        }
        Ok(Err(e)) => {
            tracing::error!("✗ {} 失败, 耗时: {:?}, 错误: {:?}", label, start.elapsed(), e);
            Err(AppError::Database(e))
        }
        Err(_) => {
            tracing::error!("✗ {} 超时 (>{:?})!", label, limit);
            Err(AppError::Timeout(limit))
        }
    }
}

/// 草稿列表 (最近更新的在前)
pub async fn list_drafts(pool: &PgPool, limit: Duration) -> Result<Vec<InvoiceDraft>, AppError> {
    let sql = format!(
        "SELECT {} FROM invoice_drafts ORDER BY updated_at DESC",
        DRAFT_COLUMNS
    );
    let rows = timed(
        "查询草稿列表",
        limit,
        sqlx::query_as::<_, InvoiceDraftRow>(&sql).fetch_all(pool),
    )
    .await?;
    Ok(rows.into_iter().map(InvoiceDraft::from).collect())
}

/// 查询单个草稿
pub async fn get_draft(
    pool: &PgPool,
    id: Uuid,
    limit: Duration,
) -> Result<Option<InvoiceDraft>, AppError> {
    let sql = format!("SELECT {} FROM invoice_drafts WHERE id = $1", DRAFT_COLUMNS);
    let row = timed(
        "查询草稿",
        limit,
        sqlx::query_as::<_, InvoiceDraftRow>(&sql)
            .bind(id)
            .fetch_optional(pool),
    )
    .await?;
    Ok(row.map(InvoiceDraft::from))
}

/// 保存草稿: 不存在则新建, 已存在则覆盖 (按 ID upsert, 保留 created_at)
///
/// 未给标题时使用默认标题。同一会话的并发保存使用同一个 ID, 只会落到一条记录上。
pub async fn upsert_draft(
    pool: &PgPool,
    id: Uuid,
    payload: &DraftPayload,
    limit: Duration,
) -> Result<InvoiceDraft, AppError> {
    let sql = format!(
        r#"
        INSERT INTO invoice_drafts
            (id, title, items, template_id, sender_id, recipient_id,
             payment_method_id, issue_date, payment_deadline, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now())
        ON CONFLICT (id) DO UPDATE
        SET title = EXCLUDED.title,
            items = EXCLUDED.items,
            template_id = EXCLUDED.template_id,
            sender_id = EXCLUDED.sender_id,
            recipient_id = EXCLUDED.recipient_id,
            payment_method_id = EXCLUDED.payment_method_id,
            issue_date = EXCLUDED.issue_date,
            payment_deadline = EXCLUDED.payment_deadline,
            updated_at = now()
        RETURNING {}
        "#,
        DRAFT_COLUMNS
    );
    let row = timed(
        "保存草稿",
        limit,
        sqlx::query_as::<_, InvoiceDraftRow>(&sql)
            .bind(id)
            .bind(payload.title_or_default())
            .bind(Json(&payload.items))
            .bind(payload.template_id.as_str())
            .bind(payload.sender_id.as_deref())
            .bind(payload.recipient_id.as_deref())
            .bind(payload.payment_method_id.as_deref())
            .bind(payload.issue_date)
            .bind(payload.payment_deadline)
            .fetch_one(pool),
    )
    .await?;
    tracing::info!("草稿 {} 已保存 ({} 条明细)", row.id, payload.items.len());
    Ok(row.into())
}

/// 删除草稿, 返回是否删除了记录
pub async fn delete_draft(pool: &PgPool, id: Uuid, limit: Duration) -> Result<bool, AppError> {
    let result = timed(
        "删除草稿",
        limit,
        sqlx::query("DELETE FROM invoice_drafts WHERE id = $1")
            .bind(id)
            .execute(pool),
    )
    .await?;
    Ok(result.rows_affected() > 0)
}

/// 查询全部父商品
pub async fn list_parent_products(
    pool: &PgPool,
    limit: Duration,
) -> Result<Vec<ParentProduct>, AppError> {
    timed(
        "查询父商品",
        limit,
        sqlx::query_as::<_, ParentProduct>(
            r#"
            SELECT id, name, customer_id
            FROM parent_products
            ORDER BY name
            "#,
        )
        .fetch_all(pool),
    )
    .await
}

/// 查询全部子商品
pub async fn list_child_products(
    pool: &PgPool,
    limit: Duration,
) -> Result<Vec<ChildProduct>, AppError> {
    timed(
        "查询子商品",
        limit,
        sqlx::query_as::<_, ChildProduct>(
            r#"
            SELECT id, parent_id, name, price
            FROM child_products
            ORDER BY parent_id, name
            "#,
        )
        .fetch_all(pool),
    )
    .await
}

/// 查询全部选项
pub async fn list_catalog_options(
    pool: &PgPool,
    limit: Duration,
) -> Result<Vec<CatalogOption>, AppError> {
    timed(
        "查询选项",
        limit,
        sqlx::query_as::<_, CatalogOption>(
            r#"
            SELECT id, name, price, category
            FROM catalog_options
            ORDER BY category, name
            "#,
        )
        .fetch_all(pool),
    )
    .await
}
