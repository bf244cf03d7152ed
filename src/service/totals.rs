use crate::models::{CurrencyAmount, InvoiceTotals, ItemKind, LineAmounts, LineItem, TemplateId};
use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

/// 合计分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Product,
    Inspection,
    Work,
    Packaging,
    Shipping,
}

/// 选项名称关键字 -> 分类, 按顺序匹配 (区分大小写的子串匹配)
const OPTION_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Inspection, &["検品"]),
    (Category::Work, &["作業"]),
    (Category::Packaging, &["OPP袋", "PE袋", "ラッピング", "包装"]),
    (Category::Shipping, &["配送", "運送"]),
];

/// 明细所属分类; 父商品与未命中关键字的选项只计入总额
pub fn categorize(item: &LineItem) -> Option<Category> {
    match item.kind {
        ItemKind::ChildProduct { .. } => Some(Category::Product),
        ItemKind::ParentProduct => None,
        ItemKind::OptionItem { .. } => OPTION_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| item.title.contains(k)))
            .map(|(category, _)| *category),
    }
}

/// 百分比 -> 比例 (精确的十进制移位, 不做除法)
fn percent(rate: &BigDecimal) -> BigDecimal {
    let (digits, scale) = rate.as_bigint_and_exponent();
    BigDecimal::new(digits, scale + 2)
}

/// 单行金额
///
/// 税率只在含税模板下生效, 分割比例只在分割请求模板下生效;
/// 模板切换不会修改明细上的字段, 只改变是否读取。
pub fn line_amounts(item: &LineItem, template: TemplateId) -> LineAmounts {
    let base = &item.quantity * &item.unit_price;

    let tax_amount = if template.reads_tax_rate() {
        &base * percent(&item.tax_rate)
    } else {
        BigDecimal::zero()
    };
    let with_tax = &base + &tax_amount;

    let split_amount = if template.reads_split_ratio() {
        // 未设置 (0) 按 100% 计
        if item.split_ratio.is_zero() {
            with_tax.clone()
        } else {
            &with_tax * percent(&item.split_ratio)
        }
    } else {
        with_tax.clone()
    };
    let remaining_amount = &with_tax - &split_amount;

    LineAmounts {
        base,
        tax_amount,
        with_tax,
        split_amount,
        remaining_amount,
    }
}

/// 从当前列表整体计算合计 (纯函数, 无隐藏状态)
pub fn compute_totals(items: &[LineItem], template: TemplateId) -> InvoiceTotals {
    let mut totals = InvoiceTotals::empty(template);

    for item in items {
        let amounts = line_amounts(item, template);

        match categorize(item) {
            Some(Category::Product) => totals.product += &amounts.split_amount,
            Some(Category::Inspection) => totals.inspection += &amounts.split_amount,
            Some(Category::Work) => totals.work += &amounts.split_amount,
            Some(Category::Packaging) => totals.packaging += &amounts.split_amount,
            Some(Category::Shipping) => totals.shipping += &amounts.split_amount,
            None => {}
        }

        totals.subtotal += &amounts.base;
        totals.tax_amount += &amounts.tax_amount;
        totals.total_with_tax += &amounts.with_tax;
        totals.split_total += &amounts.split_amount;
    }

    totals.grand_total = if template.reads_split_ratio() {
        totals.split_total.clone()
    } else {
        totals.total_with_tax.clone()
    };
    totals
}

/// 币种换算规则
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyRate {
    pub code: String,
    pub symbol: String,
    /// 1 单位主币种折合该币种的数量
    pub rate: BigDecimal,
    pub decimals: i64,
}

/// 金额格式化, 如 `¥1234.50`
pub fn format_amount(symbol: &str, amount: &BigDecimal, decimals: i64) -> String {
    format!("{}{}", symbol, amount.round(decimals).with_scale(decimals))
}

/// 把总额换算为各币种; 第一个币种为主币种
pub fn convert_currencies(amount: &BigDecimal, currencies: &[CurrencyRate]) -> Vec<CurrencyAmount> {
    currencies
        .iter()
        .enumerate()
        .map(|(index, currency)| {
            let converted = (amount * &currency.rate).round(currency.decimals);
            CurrencyAmount {
                code: currency.code.clone(),
                formatted: format_amount(&currency.symbol, &converted, currency.decimals),
                amount: converted,
                is_main: index == 0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn product(qty: i64, price: i64) -> LineItem {
        LineItem::new("c1", "商品A-1", ItemKind::ChildProduct { parent_id: "P1".into() })
            .with_amount(BigDecimal::from(qty), BigDecimal::from(price))
    }

    fn option(title: &str, price: i64) -> LineItem {
        LineItem::new(title, title, ItemKind::OptionItem { parent_id: None })
            .with_amount(BigDecimal::from(1), BigDecimal::from(price))
    }

    #[test]
    fn basic_template_is_a_plain_sum() {
        let totals = compute_totals(&[product(2, 1000)], TemplateId::Basic);
        assert_eq!(totals.subtotal, BigDecimal::from(2000));
        assert_eq!(totals.total_with_tax, BigDecimal::from(2000));
        assert_eq!(totals.product, BigDecimal::from(2000));
        assert_eq!(totals.grand_total, BigDecimal::from(2000));
    }

    #[test]
    fn tax_rate_only_applies_under_tax_template() {
        let mut item = product(2, 1000);
        item.tax_rate = BigDecimal::from(10);

        let taxed = compute_totals(&[item.clone()], TemplateId::TaxInclusive);
        assert_eq!(taxed.tax_amount, BigDecimal::from(200));
        assert_eq!(taxed.total_with_tax, BigDecimal::from(2200));
        assert_eq!(taxed.grand_total, BigDecimal::from(2200));

        let basic = compute_totals(&[item.clone()], TemplateId::Basic);
        assert_eq!(basic.tax_amount, BigDecimal::zero());
        assert_eq!(basic.total_with_tax, BigDecimal::from(2000));
        // 字段本身不受模板切换影响
        assert_eq!(item.tax_rate, BigDecimal::from(10));
    }

    #[test]
    fn split_ratio_only_applies_under_split_template() {
        let mut item = product(2, 1000);
        item.split_ratio = BigDecimal::from(50);
        item.tax_rate = BigDecimal::from(10);

        let split = compute_totals(&[item.clone()], TemplateId::SplitPayment);
        assert_eq!(split.split_total, BigDecimal::from(1000));
        assert_eq!(split.total_with_tax, BigDecimal::from(2000));
        assert_eq!(split.grand_total, BigDecimal::from(1000));
        assert_eq!(split.product, BigDecimal::from(1000));

        let basic = compute_totals(&[item], TemplateId::Basic);
        assert_eq!(basic.split_total, BigDecimal::from(2000));
    }

    #[test]
    fn zero_split_ratio_counts_as_full_amount() {
        let mut item = product(2, 1000);
        item.split_ratio = BigDecimal::zero();

        let amounts = line_amounts(&item, TemplateId::SplitPayment);
        assert_eq!(amounts.split_amount, BigDecimal::from(2000));
        assert_eq!(amounts.remaining_amount, BigDecimal::zero());

        let totals = compute_totals(&[item], TemplateId::SplitPayment);
        assert_eq!(totals.split_total, BigDecimal::from(2000));
        assert_eq!(totals.product, BigDecimal::from(2000));
        assert_eq!(totals.grand_total, BigDecimal::from(2000));
    }

    #[test]
    fn options_bucket_by_title_keyword() {
        let totals = compute_totals(&[option("通常検品", 500)], TemplateId::Basic);
        assert_eq!(totals.inspection, BigDecimal::from(500));
        assert_eq!(totals.product, BigDecimal::zero());
        assert_eq!(totals.work, BigDecimal::zero());
        assert_eq!(totals.packaging, BigDecimal::zero());
        assert_eq!(totals.shipping, BigDecimal::zero());
        assert_eq!(totals.grand_total, BigDecimal::from(500));

        let items = vec![
            option("セット組作業", 300),
            option("OPP袋詰め", 200),
            option("ギフトラッピング（高級）", 800),
            option("国際配送（冷蔵）", 4000),
            option("opp袋", 10),
            option("特急料金", 1000),
        ];
        let totals = compute_totals(&items, TemplateId::Basic);
        assert_eq!(totals.work, BigDecimal::from(300));
        assert_eq!(totals.packaging, BigDecimal::from(1000));
        assert_eq!(totals.shipping, BigDecimal::from(4000));
        // 小写 opp 与未命中的选项只计入总额
        assert_eq!(totals.grand_total, BigDecimal::from(6310));
    }

    #[test]
    fn first_matching_keyword_wins() {
        let item = option("検品作業", 100);
        assert_eq!(categorize(&item), Some(Category::Inspection));
        let parent = LineItem::new("P1", "包装グループ", ItemKind::ParentProduct);
        assert_eq!(categorize(&parent), None);
    }

    #[test]
    fn line_amounts_report_remaining_split() {
        let mut item = product(3, 1000);
        item.split_ratio = BigDecimal::from(30);
        let amounts = line_amounts(&item, TemplateId::SplitPayment);
        assert_eq!(amounts.base, BigDecimal::from(3000));
        assert_eq!(amounts.split_amount, BigDecimal::from(900));
        assert_eq!(amounts.remaining_amount, BigDecimal::from(2100));
    }

    #[test]
    fn fractional_rates_stay_exact() {
        let mut item = product(1, 999);
        item.tax_rate = dec("8.5");
        let amounts = line_amounts(&item, TemplateId::TaxInclusive);
        assert_eq!(amounts.tax_amount, dec("84.915"));
        assert_eq!(amounts.with_tax, dec("1083.915"));
    }

    #[test]
    fn converts_grand_total_into_each_currency() {
        let currencies = vec![
            CurrencyRate { code: "CNY".into(), symbol: "¥".into(), rate: BigDecimal::from(1), decimals: 2 },
            CurrencyRate { code: "USD".into(), symbol: "$".into(), rate: dec("0.14"), decimals: 2 },
            CurrencyRate { code: "JPY".into(), symbol: "￥".into(), rate: dec("20.27"), decimals: 0 },
        ];
        let amounts = convert_currencies(&BigDecimal::from(1000), &currencies);
        assert_eq!(amounts[0].formatted, "¥1000.00");
        assert!(amounts[0].is_main);
        assert_eq!(amounts[1].amount, BigDecimal::from(140));
        assert_eq!(amounts[1].formatted, "$140.00");
        assert_eq!(amounts[2].formatted, "￥20270");
    }
}
