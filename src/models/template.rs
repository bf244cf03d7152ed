use serde::{Deserialize, Serialize};
use std::fmt;

/// 模板ID, 决定列布局以及合计公式读取哪些字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TemplateId {
    #[default]
    #[serde(rename = "basic")]
    Basic,
    #[serde(rename = "tax-inclusive", alias = "tax-included", alias = "with-tax")]
    TaxInclusive,
    #[serde(rename = "split-payment", alias = "split-billing")]
    SplitPayment,
}

impl TemplateId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Basic => "basic",
            TemplateId::TaxInclusive => "tax-inclusive",
            TemplateId::SplitPayment => "split-payment",
        }
    }

    /// 解析存储的模板ID, 未知值回退到基本模板
    pub fn parse_or_default(raw: &str) -> Self {
        match raw {
            "tax-inclusive" | "tax-included" | "with-tax" => TemplateId::TaxInclusive,
            "split-payment" | "split-billing" => TemplateId::SplitPayment,
            _ => TemplateId::Basic,
        }
    }

    pub fn reads_tax_rate(&self) -> bool {
        matches!(self, TemplateId::TaxInclusive)
    }

    pub fn reads_split_ratio(&self) -> bool {
        matches!(self, TemplateId::SplitPayment)
    }

    pub fn columns(&self) -> Vec<Column> {
        use ColumnType::*;
        match self {
            TemplateId::Basic => vec![
                Column::required(Title, "名目", 4),
                Column::required(Quantity, "数量", 2),
                Column::required(UnitPrice, "単価", 2),
                Column::required(Subtotal, "小計", 2),
                Column::required(Operation, "操作", 2),
            ],
            TemplateId::TaxInclusive => vec![
                Column::required(Title, "名目", 3),
                Column::required(Quantity, "数量", 1),
                Column::required(UnitPrice, "単価", 2),
                Column::required(TaxRate, "税率", 1),
                Column::required(TaxAmount, "税額", 1),
                Column::required(Subtotal, "小計", 2),
                Column::required(Operation, "操作", 2),
            ],
            TemplateId::SplitPayment => vec![
                Column::required(Title, "名目", 3),
                Column::required(Quantity, "数量", 1),
                Column::required(UnitPrice, "単価", 2),
                Column::required(SplitRatio, "分割比率", 1),
                Column::required(Subtotal, "小計", 2),
                Column::optional(Note, "備考", 1),
                Column::required(Operation, "操作", 2),
            ],
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    Title,
    Quantity,
    UnitPrice,
    Subtotal,
    TaxRate,
    TaxAmount,
    SplitRatio,
    Note,
    Operation,
}

/// 列定义 (宽度为12栅格中的份数)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub label: &'static str,
    pub width: u8,
    pub required: bool,
}

impl Column {
    fn required(column_type: ColumnType, label: &'static str, width: u8) -> Self {
        Self { column_type, label, width, required: true }
    }

    fn optional(column_type: ColumnType, label: &'static str, width: u8) -> Self {
        Self { column_type, label, width, required: false }
    }
}
