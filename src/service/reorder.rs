use crate::models::{renumber, ItemKind, LineItem};
use crate::service::grouping::{next_parent_index, parent_index, previous_parent_index};

/// 拖放结束时调用: 返回新列表; 非法移动返回原列表的副本 (拖动回弹)
pub fn reorder(items: &[LineItem], source: usize, destination: usize) -> Vec<LineItem> {
    try_reorder(items, source, destination).unwrap_or_else(|| items.to_vec())
}

/// 同 [`reorder`], 但非法移动返回 `None`, 便于调用方区分
///
/// 按被拖动项的类型分派:
/// - 子商品只能在自己父商品的连续范围内移动
/// - 父商品连同其成员整体移动, 不能落入其它父商品的成员范围内部
/// - 选项可移动到任意位置, 落点决定其挂靠或脱离
pub fn try_reorder(items: &[LineItem], source: usize, destination: usize) -> Option<Vec<LineItem>> {
    if source >= items.len() || destination >= items.len() || source == destination {
        return None;
    }

    let mut moved = match &items[source].kind {
        ItemKind::ChildProduct { parent_id } => move_child(items, source, destination, parent_id),
        ItemKind::ParentProduct => move_parent(items, source, destination),
        ItemKind::OptionItem { .. } => Some(move_option(items, source, destination)),
    };

    match moved.as_mut() {
        Some(list) => renumber(list),
        None => tracing::debug!(
            "拒绝移动: {} ({}) {} -> {}",
            items[source].id,
            items[source].kind_name(),
            source,
            destination
        ),
    }
    moved
}

fn move_child(
    items: &[LineItem],
    source: usize,
    destination: usize,
    parent_id: &str,
) -> Option<Vec<LineItem>> {
    let parent_at = parent_index(items, parent_id)?;
    let next_parent = next_parent_index(items, parent_at);

    // 父商品之前、下一个父商品之后、以及其它组的位置都不允许
    if destination <= parent_at || destination >= next_parent {
        return None;
    }
    if items[destination].parent_id() != Some(parent_id) {
        return None;
    }

    let mut next = items.to_vec();
    let child = next.remove(source);
    next.insert(destination, child);
    Some(next)
}

fn move_parent(items: &[LineItem], source: usize, destination: usize) -> Option<Vec<LineItem>> {
    let parent_id = items[source].id.as_str();
    let range_end = next_parent_index(items, source);
    let in_block =
        |index: usize| index == source || (index < range_end && items[index].belongs_to(parent_id));

    // 落在自己组内等于没动
    if in_block(destination) {
        return None;
    }

    let mut block = Vec::new();
    let mut rest = Vec::with_capacity(items.len());
    let mut anchor = None;
    for (index, item) in items.iter().enumerate() {
        if index > source && in_block(index) {
            block.push(item.clone());
        } else if index == source {
            block.insert(0, item.clone());
        } else {
            if index == destination {
                anchor = Some(rest.len());
            }
            rest.push(item.clone());
        }
    }

    // 向下拖放到锚点之后, 向上拖放到锚点之前
    let anchor = anchor?;
    let at = if destination > source { anchor + 1 } else { anchor };

    if splits_foreign_group(&rest, at) {
        return None;
    }

    rest.splice(at..at, block);
    Some(rest)
}

/// 在 `at` 插入是否会把某个父商品与其后续成员拆开
fn splits_foreign_group(rest: &[LineItem], at: usize) -> bool {
    let Some(prev) = previous_parent_index(rest, at) else {
        return false;
    };
    let parent_id = rest[prev].id.as_str();
    let end = next_parent_index(rest, prev);
    rest[at..end].iter().any(|item| item.belongs_to(parent_id))
}

fn move_option(items: &[LineItem], source: usize, destination: usize) -> Vec<LineItem> {
    let mut rest = items.to_vec();
    let mut option = rest.remove(source);
    let destination = destination.min(rest.len());

    // 向前找最近的父商品, 落点在其范围内则挂靠, 否则脱离
    let target = previous_parent_index(&rest, destination).and_then(|prev| {
        let end = next_parent_index(&rest, prev);
        (destination <= end).then(|| rest[prev].id.clone())
    });

    if option.parent_id() != target.as_deref() {
        tracing::debug!("选项 {} 挂靠变更: {:?} -> {:?}", option.id, option.parent_id(), target);
    }
    option.kind = ItemKind::OptionItem { parent_id: target };
    rest.insert(destination, option);
    rest
}
