use crate::models::LineItem;
use serde::Serialize;

/// 分组: 父商品 + 其后连续的成员, 或单独一项
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "group", rename_all = "snake_case")]
pub enum ItemGroup {
    Grouped {
        parent: LineItem,
        members: Vec<LineItem>,
    },
    Standalone {
        item: LineItem,
    },
}

impl ItemGroup {
    pub fn item_count(&self) -> usize {
        match self {
            ItemGroup::Grouped { members, .. } => members.len() + 1,
            ItemGroup::Standalone { .. } => 1,
        }
    }

    pub fn head(&self) -> &LineItem {
        match self {
            ItemGroup::Grouped { parent, .. } => parent,
            ItemGroup::Standalone { item } => item,
        }
    }
}

/// 从扁平列表推导分组 (单次扫描)
///
/// 父商品之后的项只要不是父商品且 parentId 指向它, 就归入该组;
/// 遇到第一个不匹配的项即结束该组。parentId 与正在构建的组不符的项
/// (例如加载了损坏的草稿) 视为独立项, 不会被丢弃。
pub fn build_groups(items: &[LineItem]) -> Vec<ItemGroup> {
    let mut groups = Vec::new();
    let mut index = 0;

    while index < items.len() {
        let item = &items[index];
        index += 1;

        if !item.is_parent() {
            if item.parent_id().is_some() {
                tracing::debug!(
                    "明细 {} 的父商品 {:?} 不在当前分组中, 作为独立项处理",
                    item.id,
                    item.parent_id()
                );
            }
            groups.push(ItemGroup::Standalone { item: item.clone() });
            continue;
        }

        let mut members = Vec::new();
        while index < items.len() && items[index].belongs_to(&item.id) {
            members.push(items[index].clone());
            index += 1;
        }

        if members.is_empty() {
            groups.push(ItemGroup::Standalone { item: item.clone() });
        } else {
            groups.push(ItemGroup::Grouped {
                parent: item.clone(),
                members,
            });
        }
    }

    groups
}

/// 分组还原为扁平列表
pub fn flatten_groups(groups: &[ItemGroup]) -> Vec<LineItem> {
    let mut items = Vec::with_capacity(groups.iter().map(ItemGroup::item_count).sum());
    for group in groups {
        match group {
            ItemGroup::Grouped { parent, members } => {
                items.push(parent.clone());
                items.extend(members.iter().cloned());
            }
            ItemGroup::Standalone { item } => items.push(item.clone()),
        }
    }
    items
}

/// 父商品所在下标
pub fn parent_index(items: &[LineItem], parent_id: &str) -> Option<usize> {
    items
        .iter()
        .position(|item| item.is_parent() && item.id == parent_id)
}

/// `from` 之后 (不含) 第一个父商品的下标, 没有则返回列表长度
pub fn next_parent_index(items: &[LineItem], from: usize) -> usize {
    items
        .iter()
        .enumerate()
        .skip(from + 1)
        .find(|(_, item)| item.is_parent())
        .map(|(index, _)| index)
        .unwrap_or(items.len())
}

/// `before` 之前 (不含) 最近的父商品下标
pub fn previous_parent_index(items: &[LineItem], before: usize) -> Option<usize> {
    items[..before.min(items.len())]
        .iter()
        .rposition(|item| item.is_parent())
}

/// 父商品组的末尾 (组内最后一个成员之后的位置)
pub fn group_end(items: &[LineItem], parent_at: usize) -> usize {
    let parent_id = &items[parent_at].id;
    let mut end = parent_at + 1;
    while end < items.len() && items[end].belongs_to(parent_id) {
        end += 1;
    }
    end
}
