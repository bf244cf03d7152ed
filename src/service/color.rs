use crate::models::LineItem;
use indexmap::IndexMap;

/// 默认调色板 (10色)
pub const DEFAULT_PALETTE: [&str; 10] = [
    "blue", "green", "yellow", "red", "purple", "pink", "indigo", "orange", "teal", "cyan",
];

/// 父商品ID -> 颜色 的会话级缓存
///
/// 每个编辑会话持有一个实例, 列表重排/过滤/重建都不会重置映射,
/// 只有会话结束时才随之销毁。颜色只是展示辅助, 色板用尽后允许重复。
#[derive(Debug, Clone)]
pub struct ColorAssigner {
    palette: Vec<String>,
    assigned: IndexMap<String, usize>,
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

impl ColorAssigner {
    pub fn new(palette: Vec<String>) -> Self {
        let palette = if palette.is_empty() {
            DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
        } else {
            palette
        };
        Self {
            palette,
            assigned: IndexMap::new(),
        }
    }

    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    /// 已登记的父商品数量
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// 父商品返回自身颜色 (首次遇到时登记), 挂靠项返回其父商品颜色, 其余返回 None
    pub fn color_for(&mut self, item: &LineItem) -> Option<&str> {
        if item.is_parent() {
            let slot = self.register(&item.id);
            return Some(self.palette[slot].as_str());
        }
        let parent_id = item.parent_id()?;
        self.assigned
            .get(parent_id)
            .map(|&slot| self.palette[slot].as_str())
    }

    /// 不登记, 仅查询
    pub fn peek(&self, parent_id: &str) -> Option<&str> {
        self.assigned
            .get(parent_id)
            .map(|&slot| self.palette[slot].as_str())
    }

    /// 按列表顺序登记所有父商品
    pub fn register_parents(&mut self, items: &[LineItem]) {
        for item in items.iter().filter(|i| i.is_parent()) {
            self.register(&item.id);
        }
    }

    /// 列表中每一项的颜色, 与 `items` 按下标一一对应
    ///
    /// 父商品与子商品的ID来自不同的表, 可能相同, 所以不按ID建索引。
    pub fn colors_for(&mut self, items: &[LineItem]) -> Vec<Option<String>> {
        self.register_parents(items);
        items
            .iter()
            .map(|item| self.color_for(item).map(str::to_string))
            .collect()
    }

    fn register(&mut self, parent_id: &str) -> usize {
        if let Some(&slot) = self.assigned.get(parent_id) {
            return slot;
        }
        let slot = self.next_slot();
        tracing::debug!("父商品 {} 分配颜色 {}", parent_id, self.palette[slot]);
        self.assigned.insert(parent_id.to_string(), slot);
        slot
    }

    /// 第一个未使用的颜色; 全部用过时取使用次数最少的最靠前颜色 (即循环复用)
    fn next_slot(&self) -> usize {
        let mut usage = vec![0usize; self.palette.len()];
        for &slot in self.assigned.values() {
            usage[slot] += 1;
        }
        usage
            .iter()
            .enumerate()
            .min_by_key(|&(index, count)| (*count, index))
            .map(|(index, _)| index)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemKind;

    fn parent(id: &str) -> LineItem {
        LineItem::new(id, id, ItemKind::ParentProduct)
    }

    fn child(id: &str, parent_id: &str) -> LineItem {
        LineItem::new(id, id, ItemKind::ChildProduct { parent_id: parent_id.to_string() })
    }

    #[test]
    fn same_parent_keeps_color_across_reorders() {
        let mut colors = ColorAssigner::default();
        let list = vec![parent("P1"), parent("P2"), parent("P3")];
        let first: Vec<String> = list
            .iter()
            .map(|p| colors.color_for(p).unwrap().to_string())
            .collect();
        assert_eq!(first, vec!["blue", "green", "yellow"]);

        let reordered = vec![parent("P3"), parent("P1"), parent("P2")];
        let again: Vec<String> = reordered
            .iter()
            .map(|p| colors.color_for(p).unwrap().to_string())
            .collect();
        assert_eq!(again, vec!["yellow", "blue", "green"]);
    }

    #[test]
    fn members_follow_parent_color() {
        let mut colors = ColorAssigner::default();
        colors.color_for(&parent("P1"));
        assert_eq!(colors.color_for(&child("c1", "P1")), Some("blue"));

        let attached = LineItem::new("o1", "検品", ItemKind::OptionItem { parent_id: Some("P1".into()) });
        assert_eq!(colors.color_for(&attached), Some("blue"));

        let free = LineItem::new("o2", "検品", ItemKind::OptionItem { parent_id: None });
        assert_eq!(colors.color_for(&free), None);

        // 未登记的父商品不会经由子项登记
        assert_eq!(colors.color_for(&child("c9", "P9")), None);
        assert_eq!(colors.len(), 1);
    }

    #[test]
    fn wraps_when_palette_exhausted() {
        let mut colors = ColorAssigner::new(vec!["a".into(), "b".into()]);
        assert_eq!(colors.color_for(&parent("P1")), Some("a"));
        assert_eq!(colors.color_for(&parent("P2")), Some("b"));
        assert_eq!(colors.color_for(&parent("P3")), Some("a"));
        assert_eq!(colors.color_for(&parent("P4")), Some("b"));
        assert_eq!(colors.peek("P1"), Some("a"));
    }

    #[test]
    fn colors_for_registers_in_list_order() {
        let mut colors = ColorAssigner::default();
        let list = vec![child("c1", "P2"), parent("P2"), parent("P1")];
        let row_colors = colors.colors_for(&list);
        assert_eq!(
            row_colors,
            vec![Some("blue".to_string()), Some("blue".to_string()), Some("green".to_string())]
        );
    }

    #[test]
    fn parent_and_child_sharing_an_id_keep_their_own_colors() {
        let mut colors = ColorAssigner::default();
        let list = vec![parent("X"), parent("P2"), child("X", "P2")];
        let row_colors = colors.colors_for(&list);
        assert_eq!(row_colors[0].as_deref(), Some("blue"));
        assert_eq!(row_colors[1].as_deref(), Some("green"));
        assert_eq!(row_colors[2].as_deref(), Some("green"));
    }

    #[test]
    fn detached_option_has_no_color() {
        let mut colors = ColorAssigner::default();
        let detached = LineItem::new("o1", "国内配送", ItemKind::OptionItem { parent_id: None });
        assert_eq!(colors.colors_for(&[parent("P1"), detached]), vec![Some("blue".to_string()), None]);
    }
}
