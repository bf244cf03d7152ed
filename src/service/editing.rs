use crate::error::EditorError;
use crate::models::{renumber, CatalogOption, ChildProduct, ItemKind, LineItem, ParentProduct};
use crate::service::grouping::{group_end, parent_index};
use bigdecimal::{BigDecimal, Zero};
use serde::Deserialize;
use uuid::Uuid;

/// 一次清空全部明细的删除ID
pub const REMOVE_ALL: &str = "all";

/// 分割比例下拉选项 (10% 步进)
pub fn split_ratio_choices() -> Vec<BigDecimal> {
    (1..=10).map(|step| BigDecimal::from(step * 10)).collect()
}

/// 单价不得为负
fn check_price(price: &BigDecimal) -> Result<(), EditorError> {
    if *price < BigDecimal::zero() {
        return Err(EditorError::NegativePrice(price.clone()));
    }
    Ok(())
}

/// 从商品选择器加入父商品 + 子商品
///
/// 父商品不在列表中时依次追加父、子; 已存在时把子商品插到该组末尾。
/// 子商品已在列表中则数量加一, 不重复加入。
pub fn add_product(
    items: &[LineItem],
    parent: &ParentProduct,
    child: &ChildProduct,
) -> Result<Vec<LineItem>, EditorError> {
    check_price(&child.price)?;
    let mut next = items.to_vec();

    if let Some(existing) = next
        .iter_mut()
        .find(|item| item.is_child() && item.id == child.id)
    {
        existing.quantity += BigDecimal::from(1);
        tracing::debug!("子商品 {} 已存在, 数量 +1 -> {}", child.id, existing.quantity);
        return Ok(next);
    }

    let child_item = LineItem::new(
        child.id.clone(),
        child.name.clone(),
        ItemKind::ChildProduct { parent_id: parent.id.clone() },
    )
    .with_amount(BigDecimal::from(1), child.price.clone());

    match parent_index(&next, &parent.id) {
        Some(parent_at) => {
            let at = group_end(&next, parent_at);
            next.insert(at, child_item);
        }
        None => {
            next.push(LineItem::new(parent.id.clone(), parent.name.clone(), ItemKind::ParentProduct));
            next.push(child_item);
        }
    }

    renumber(&mut next);
    Ok(next)
}

/// 从选项列表加入选项 (每次生成新ID)
///
/// 指定的父商品存在时挂到该组末尾, 否则作为独立项追加到列表末尾。
pub fn add_option(
    items: &[LineItem],
    option: &CatalogOption,
    attach_to: Option<&str>,
) -> Result<Vec<LineItem>, EditorError> {
    check_price(&option.price)?;
    let mut next = items.to_vec();
    let target = attach_to.and_then(|parent_id| parent_index(&next, parent_id));

    let item = LineItem::new(
        Uuid::new_v4().to_string(),
        option.name.clone(),
        ItemKind::OptionItem {
            parent_id: target.map(|at| next[at].id.clone()),
        },
    )
    .with_amount(BigDecimal::from(1), option.price.clone());

    match target {
        Some(parent_at) => {
            let at = group_end(&next, parent_at);
            next.insert(at, item);
        }
        None => next.push(item),
    }

    renumber(&mut next);
    Ok(next)
}

/// 手动添加的明细行 (独立选项)
pub fn add_custom_item(
    items: &[LineItem],
    title: &str,
    unit_price: BigDecimal,
) -> Result<Vec<LineItem>, EditorError> {
    check_price(&unit_price)?;
    let mut next = items.to_vec();
    next.push(
        LineItem::new(Uuid::new_v4().to_string(), title, ItemKind::OptionItem { parent_id: None })
            .with_amount(BigDecimal::from(1), unit_price),
    );
    renumber(&mut next);
    Ok(next)
}

/// 删除明细
///
/// `"all"` 清空列表; 删除父商品时一并删除 parentId 指向它的所有项。
pub fn remove_item(items: &[LineItem], id: &str) -> Vec<LineItem> {
    if id == REMOVE_ALL {
        return Vec::new();
    }

    let removing_parent = items.iter().any(|item| item.is_parent() && item.id == id);
    let mut next: Vec<LineItem> = items
        .iter()
        .filter(|item| item.id != id && !(removing_parent && item.parent_id() == Some(id)))
        .cloned()
        .collect();

    renumber(&mut next);
    next
}

/// 字段编辑 (PATCH 语义, 未给出的字段保持不变)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub title: Option<String>,
    pub quantity: Option<BigDecimal>,
    pub unit_price: Option<BigDecimal>,
    pub notes: Option<String>,
    pub tax_rate: Option<BigDecimal>,
    pub split_ratio: Option<BigDecimal>,
}

impl ItemPatch {
    fn validate(&self) -> Result<(), EditorError> {
        if let Some(quantity) = &self.quantity {
            if *quantity <= BigDecimal::zero() {
                return Err(EditorError::NonPositiveQuantity(quantity.clone()));
            }
        }
        if let Some(price) = &self.unit_price {
            check_price(price)?;
        }
        if let Some(rate) = &self.tax_rate {
            if *rate < BigDecimal::zero() {
                return Err(EditorError::NegativeTaxRate(rate.clone()));
            }
        }
        if let Some(ratio) = &self.split_ratio {
            if *ratio < BigDecimal::zero() || *ratio > BigDecimal::from(100) {
                return Err(EditorError::SplitRatioOutOfRange(ratio.clone()));
            }
        }
        Ok(())
    }
}

pub fn update_item(items: &[LineItem], id: &str, patch: &ItemPatch) -> Result<Vec<LineItem>, EditorError> {
    patch.validate()?;

    let mut next = items.to_vec();
    let item = next
        .iter_mut()
        .find(|item| item.id == id)
        .ok_or_else(|| EditorError::ItemNotFound(id.to_string()))?;

    if let Some(title) = &patch.title {
        item.title = title.clone();
    }
    if let Some(quantity) = &patch.quantity {
        item.quantity = quantity.clone();
    }
    if let Some(price) = &patch.unit_price {
        item.unit_price = price.clone();
    }
    if let Some(notes) = &patch.notes {
        item.notes = if notes.is_empty() { None } else { Some(notes.clone()) };
    }
    if let Some(rate) = &patch.tax_rate {
        item.tax_rate = rate.clone();
    }
    if let Some(ratio) = &patch.split_ratio {
        item.split_ratio = ratio.clone();
    }

    Ok(next)
}
