use crate::models::{CatalogOption, ChildProduct, ParentProduct};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

/// 选项分类的固定展示顺序
pub const OPTION_CATEGORY_ORDER: [&str; 4] = ["検品", "包装", "作業", "運送"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductGroup {
    pub parent: ParentProduct,
    pub children: Vec<ChildProduct>,
}

/// 商品选择器的列表: 客户专用商品 + 通用商品
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    pub customer_products: Vec<ProductGroup>,
    pub general_products: Vec<ProductGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionCategory {
    pub category: String,
    pub options: Vec<CatalogOption>,
}

/// 按关键字与客户筛选商品
///
/// 父商品名或任一子商品名包含关键字 (不区分大小写) 即命中, 空关键字全部命中;
/// 只保留无客户限定或属于指定客户的父商品。
pub fn filter_products(
    parents: &[ParentProduct],
    children: &[ChildProduct],
    query: &str,
    customer_id: Option<&str>,
) -> ProductListing {
    let query = query.trim().to_lowercase();

    let matching: HashSet<&str> = parents
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&query))
        .map(|p| p.id.as_str())
        .chain(
            children
                .iter()
                .filter(|c| c.name.to_lowercase().contains(&query))
                .map(|c| c.parent_id.as_str()),
        )
        .collect();

    let mut listing = ProductListing::default();
    for parent in parents {
        if !(query.is_empty() || matching.contains(parent.id.as_str())) {
            continue;
        }
        let group = ProductGroup {
            parent: parent.clone(),
            children: children
                .iter()
                .filter(|c| c.parent_id == parent.id)
                .cloned()
                .collect(),
        };
        match (parent.customer_id.as_deref(), customer_id) {
            (None, _) => listing.general_products.push(group),
            (Some(owner), Some(customer)) if owner == customer => {
                listing.customer_products.push(group)
            }
            _ => {}
        }
    }
    listing
}

/// 按关键字筛选选项并按分类分组 (固定分类在前, 其余按首次出现顺序)
pub fn filter_options(options: &[CatalogOption], query: &str) -> Vec<OptionCategory> {
    let query = query.trim().to_lowercase();

    let mut grouped: IndexMap<&str, Vec<CatalogOption>> = OPTION_CATEGORY_ORDER
        .iter()
        .map(|category| (*category, Vec::new()))
        .collect();

    for option in options.iter().filter(|o| {
        o.name.to_lowercase().contains(&query) || o.category.to_lowercase().contains(&query)
    }) {
        grouped
            .entry(option.category.as_str())
            .or_default()
            .push(option.clone());
    }

    grouped
        .into_iter()
        .filter(|(_, options)| !options.is_empty())
        .map(|(category, options)| OptionCategory {
            category: category.to_string(),
            options,
        })
        .collect()
}
