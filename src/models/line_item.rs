use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

/// 明细类型 (`type` 字段)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    /// 父商品: 分组行, 自身一般不带价格
    ParentProduct,
    /// 子商品: 永远挂在某个父商品下
    ChildProduct {
        #[serde(rename = "parentId")]
        parent_id: String,
    },
    /// 选项: 可自由浮动, 也可挂到父商品组内
    #[serde(rename = "option")]
    OptionItem {
        #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<String>,
    },
}

/// 明细行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub title: String,
    pub quantity: BigDecimal,
    pub unit_price: BigDecimal,
    #[serde(flatten)]
    pub kind: ItemKind,
    #[serde(default)]
    pub group_order: usize,
    #[serde(default)]
    pub item_order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 分割比例, 百分比 (0-100), 仅分割请求模板读取
    #[serde(default = "default_split_ratio")]
    pub split_ratio: BigDecimal,
    /// 税率, 百分比, 仅含税模板读取
    #[serde(default = "BigDecimal::zero")]
    pub tax_rate: BigDecimal,
}

pub fn default_split_ratio() -> BigDecimal {
    BigDecimal::from(100)
}

impl LineItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            quantity: BigDecimal::from(1),
            unit_price: BigDecimal::zero(),
            kind,
            group_order: 0,
            item_order: 0,
            notes: None,
            split_ratio: default_split_ratio(),
            tax_rate: BigDecimal::zero(),
        }
    }

    pub fn with_amount(mut self, quantity: BigDecimal, unit_price: BigDecimal) -> Self {
        self.quantity = quantity;
        self.unit_price = unit_price;
        self
    }

    pub fn is_parent(&self) -> bool {
        matches!(self.kind, ItemKind::ParentProduct)
    }

    pub fn is_child(&self) -> bool {
        matches!(self.kind, ItemKind::ChildProduct { .. })
    }

    pub fn is_option(&self) -> bool {
        matches!(self.kind, ItemKind::OptionItem { .. })
    }

    /// 所属父商品ID (子商品 / 已挂靠的选项)
    pub fn parent_id(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::ParentProduct => None,
            ItemKind::ChildProduct { parent_id } => Some(parent_id.as_str()),
            ItemKind::OptionItem { parent_id } => parent_id.as_deref(),
        }
    }

    pub fn belongs_to(&self, parent_id: &str) -> bool {
        !self.is_parent() && self.parent_id() == Some(parent_id)
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ItemKind::ParentProduct => "parent_product",
            ItemKind::ChildProduct { .. } => "child_product",
            ItemKind::OptionItem { .. } => "option",
        }
    }
}

/// 结构变更后重写 groupOrder / itemOrder 为数组下标
pub fn renumber(items: &mut [LineItem]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.group_order = index;
        item.item_order = index;
    }
}

/// 按 (groupOrder, itemOrder) 稳定排序后重新编号, 用于加载可能乱序的草稿
pub fn normalize_order(items: &[LineItem]) -> Vec<LineItem> {
    let mut sorted = items.to_vec();
    sorted.sort_by_key(|item| (item.group_order, item.item_order));
    renumber(&mut sorted);
    sorted
}
