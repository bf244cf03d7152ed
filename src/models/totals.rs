use crate::models::TemplateId;
use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

/// 合计结果 (每次从明细列表整体重算, 不做增量修补)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub template: TemplateId,
    pub product: BigDecimal,
    pub inspection: BigDecimal,
    pub work: BigDecimal,
    pub packaging: BigDecimal,
    pub shipping: BigDecimal,
    pub subtotal: BigDecimal,
    pub tax_amount: BigDecimal,
    pub total_with_tax: BigDecimal,
    pub split_total: BigDecimal,
    /// 界面展示的总额: 分割请求模板取 split_total, 其余取 total_with_tax
    pub grand_total: BigDecimal,
}

impl InvoiceTotals {
    pub fn empty(template: TemplateId) -> Self {
        Self {
            template,
            product: BigDecimal::zero(),
            inspection: BigDecimal::zero(),
            work: BigDecimal::zero(),
            packaging: BigDecimal::zero(),
            shipping: BigDecimal::zero(),
            subtotal: BigDecimal::zero(),
            tax_amount: BigDecimal::zero(),
            total_with_tax: BigDecimal::zero(),
            split_total: BigDecimal::zero(),
            grand_total: BigDecimal::zero(),
        }
    }
}

/// 单行金额 (小计列 / 分割后的剩余金额)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAmounts {
    pub base: BigDecimal,
    pub tax_amount: BigDecimal,
    pub with_tax: BigDecimal,
    pub split_amount: BigDecimal,
    pub remaining_amount: BigDecimal,
}

/// 按币种换算后的总额
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyAmount {
    pub code: String,
    pub amount: BigDecimal,
    pub formatted: String,
    pub is_main: bool,
}
