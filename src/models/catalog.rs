use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 父商品 (商品组)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentProduct {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

/// 子商品
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProduct {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub price: BigDecimal,
}

/// 选项 (检品/包装/作业/运送)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CatalogOption {
    pub id: String,
    pub name: String,
    pub price: BigDecimal,
    pub category: String,
}
