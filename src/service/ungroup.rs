use crate::models::{renumber, ItemKind, LineItem};

/// 解除选项与父商品的挂靠, 并移到列表末尾
///
/// 仅对已挂靠的选项有效, 其它情况返回原列表的副本。
pub fn ungroup(items: &[LineItem], item_id: &str) -> Vec<LineItem> {
    try_ungroup(items, item_id).unwrap_or_else(|| items.to_vec())
}

pub fn try_ungroup(items: &[LineItem], item_id: &str) -> Option<Vec<LineItem>> {
    let position = items.iter().position(|item| item.id == item_id)?;
    match &items[position].kind {
        ItemKind::OptionItem { parent_id: Some(parent_id) } => {
            tracing::debug!("选项 {} 脱离父商品 {}", item_id, parent_id);
        }
        _ => return None,
    }

    let mut next = items.to_vec();
    let mut option = next.remove(position);
    option.kind = ItemKind::OptionItem { parent_id: None };
    next.push(option);
    renumber(&mut next);
    Some(next)
}
