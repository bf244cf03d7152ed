use crate::models::{LineItem, TemplateId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const UNTITLED_DRAFT: &str = "無題の請求書";

/// 草稿表 invoice_drafts
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceDraftRow {
    pub id: Uuid,
    pub title: String,
    pub items: Json<Vec<LineItem>>,
    pub template_id: String,
    pub sender_id: Option<String>,
    pub recipient_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub payment_deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 草稿 (对外形态)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub id: Uuid,
    pub title: String,
    pub items: Vec<LineItem>,
    pub template_id: TemplateId,
    pub sender_id: Option<String>,
    pub recipient_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub payment_deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InvoiceDraftRow> for InvoiceDraft {
    fn from(row: InvoiceDraftRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            items: row.items.0,
            template_id: TemplateId::parse_or_default(&row.template_id),
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            payment_method_id: row.payment_method_id,
            issue_date: row.issue_date,
            payment_deadline: row.payment_deadline,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// 保存草稿的请求体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub template_id: TemplateId,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_deadline: Option<NaiveDate>,
}

impl DraftPayload {
    pub fn title_or_default(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => UNTITLED_DRAFT,
        }
    }
}
