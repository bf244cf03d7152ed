use crate::error::AppError;
use crate::models::{LineItem, TemplateId};
use crate::service::totals::{compute_totals, line_amounts};

/// 导出明细为 CSV (列表顺序即打印顺序), 末行为总额
pub fn export_items_csv(items: &[LineItem], template: TemplateId) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "order", "id", "type", "parent_id", "title", "quantity", "unit_price", "amount", "notes",
    ])?;

    for (index, item) in items.iter().enumerate() {
        let amounts = line_amounts(item, template);
        writer.write_record(&[
            index.to_string(),
            item.id.clone(),
            item.kind_name().to_string(),
            item.parent_id().unwrap_or_default().to_string(),
            item.title.clone(),
            item.quantity.to_string(),
            item.unit_price.to_string(),
            amounts.split_amount.to_string(),
            item.notes.clone().unwrap_or_default(),
        ])?;
    }

    let totals = compute_totals(items, template);
    writer.write_record(&[
        String::new(),
        String::new(),
        "total".to_string(),
        String::new(),
        template.to_string(),
        String::new(),
        String::new(),
        totals.grand_total.to_string(),
        String::new(),
    ])?;

    writer
        .into_inner()
        .map_err(|e| AppError::Export(e.to_string()))
}
