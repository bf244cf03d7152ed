use crate::error::EditorError;
use crate::models::{
    normalize_order, CatalogOption, ChildProduct, Column, CurrencyAmount, InvoiceDraft,
    InvoiceTotals, LineAmounts, LineItem, ParentProduct, TemplateId,
};
use crate::service::color::ColorAssigner;
use crate::service::editing::{self, ItemPatch};
use crate::service::grouping::{build_groups, ItemGroup};
use crate::service::totals::{compute_totals, convert_currencies, line_amounts, CurrencyRate};
use crate::service::{reorder, ungroup};
use bigdecimal::BigDecimal;
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

/// 一个编辑会话: 唯一持有明细列表与颜色缓存的所有者
///
/// 所有变更都通过纯函数计算出新列表后整体替换, 下层组件只读。
#[derive(Debug, Clone)]
pub struct EditorSession {
    id: Uuid,
    template: TemplateId,
    items: Vec<LineItem>,
    colors: ColorAssigner,
    draft_id: Option<Uuid>,
}

impl EditorSession {
    pub fn new(template: TemplateId, colors: ColorAssigner) -> Self {
        Self {
            id: Uuid::new_v4(),
            template,
            items: Vec::new(),
            colors,
            draft_id: None,
        }
    }

    /// 从草稿恢复 (按 groupOrder/itemOrder 兜底排序)
    pub fn from_draft(draft: &InvoiceDraft, colors: ColorAssigner) -> Self {
        let mut session = Self::new(draft.template_id, colors);
        session.replace_items(normalize_order(&draft.items));
        session.draft_id = Some(draft.id);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn draft_id(&self) -> Option<Uuid> {
        self.draft_id
    }

    /// 关联的草稿ID; 尚未保存过时先分配一个, 之后的保存都写同一条草稿
    pub fn reserve_draft_id(&mut self) -> Uuid {
        *self.draft_id.get_or_insert_with(Uuid::new_v4)
    }

    /// 切换模板只改变合计读取哪些字段, 不修改明细
    pub fn set_template(&mut self, template: TemplateId) {
        self.template = template;
    }

    fn replace_items(&mut self, items: Vec<LineItem>) {
        self.colors.register_parents(&items);
        self.items = items;
    }

    /// 返回是否接受了这次拖放
    pub fn reorder(&mut self, source: usize, destination: usize) -> bool {
        match reorder::try_reorder(&self.items, source, destination) {
            Some(items) => {
                self.replace_items(items);
                true
            }
            None => false,
        }
    }

    pub fn ungroup(&mut self, item_id: &str) -> bool {
        match ungroup::try_ungroup(&self.items, item_id) {
            Some(items) => {
                self.replace_items(items);
                true
            }
            None => false,
        }
    }

    pub fn add_product(&mut self, parent: &ParentProduct, child: &ChildProduct) -> Result<(), EditorError> {
        let items = editing::add_product(&self.items, parent, child)?;
        self.replace_items(items);
        Ok(())
    }

    pub fn add_option(&mut self, option: &CatalogOption, attach_to: Option<&str>) -> Result<(), EditorError> {
        let items = editing::add_option(&self.items, option, attach_to)?;
        self.replace_items(items);
        Ok(())
    }

    pub fn add_custom_item(&mut self, title: &str, unit_price: BigDecimal) -> Result<(), EditorError> {
        let items = editing::add_custom_item(&self.items, title, unit_price)?;
        self.replace_items(items);
        Ok(())
    }

    pub fn remove_item(&mut self, item_id: &str) {
        let items = editing::remove_item(&self.items, item_id);
        self.replace_items(items);
    }

    pub fn update_item(&mut self, item_id: &str, patch: &ItemPatch) -> Result<(), EditorError> {
        let items = editing::update_item(&self.items, item_id, patch)?;
        self.replace_items(items);
        Ok(())
    }

    /// 当前快照: 分组、颜色、合计均从列表即时推导
    pub fn view(&mut self, currencies: &[CurrencyRate]) -> SessionView {
        let totals = compute_totals(&self.items, self.template);
        let line_amounts = self
            .items
            .iter()
            .map(|item| line_amounts(item, self.template))
            .collect();

        SessionView {
            id: self.id,
            template: self.template,
            draft_id: self.draft_id,
            columns: self.template.columns(),
            split_ratio_choices: if self.template.reads_split_ratio() {
                editing::split_ratio_choices()
            } else {
                Vec::new()
            },
            groups: build_groups(&self.items),
            colors: self.colors.colors_for(&self.items),
            currencies: convert_currencies(&totals.grand_total, currencies),
            line_amounts,
            totals,
            items: self.items.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub template: TemplateId,
    pub draft_id: Option<Uuid>,
    pub items: Vec<LineItem>,
    pub groups: Vec<ItemGroup>,
    /// 与 `items` 按下标对应
    pub colors: Vec<Option<String>>,
    /// 与 `items` 按下标对应
    pub line_amounts: Vec<LineAmounts>,
    pub totals: InvoiceTotals,
    pub currencies: Vec<CurrencyAmount>,
    pub columns: Vec<Column>,
    /// 分割比例下拉选项, 仅分割请求模板非空
    pub split_ratio_choices: Vec<BigDecimal>,
}

/// 同时打开的编辑会话, 彼此之间不共享任何状态
pub struct SessionStore {
    sessions: DashMap<Uuid, EditorSession>,
    palette: Vec<String>,
    currencies: Vec<CurrencyRate>,
}

impl SessionStore {
    pub fn new(palette: Vec<String>, currencies: Vec<CurrencyRate>) -> Self {
        Self {
            sessions: DashMap::new(),
            palette,
            currencies,
        }
    }

    pub fn currencies(&self) -> &[CurrencyRate] {
        &self.currencies
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn new_colors(&self) -> ColorAssigner {
        ColorAssigner::new(self.palette.clone())
    }

    pub fn create(&self, template: TemplateId) -> SessionView {
        let mut session = EditorSession::new(template, self.new_colors());
        let view = session.view(&self.currencies);
        tracing::info!("创建编辑会话 {} (模板 {})", session.id(), template);
        self.sessions.insert(session.id(), session);
        view
    }

    pub fn open_draft(&self, draft: &InvoiceDraft) -> SessionView {
        let mut session = EditorSession::from_draft(draft, self.new_colors());
        let view = session.view(&self.currencies);
        tracing::info!(
            "从草稿 {} 打开编辑会话 {} ({} 条明细)",
            draft.id,
            session.id(),
            session.items().len()
        );
        self.sessions.insert(session.id(), session);
        view
    }

    pub fn close(&self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// 在会话上执行一次同步变更并返回变更后的快照
    ///
    /// 分片锁只在闭包执行期间持有, 闭包内不得 await。
    pub fn with_session<T>(
        &self,
        id: Uuid,
        mutate: impl FnOnce(&mut EditorSession) -> T,
    ) -> Option<(T, SessionView)> {
        let mut entry = self.sessions.get_mut(&id)?;
        let outcome = mutate(entry.value_mut());
        let view = entry.value_mut().view(&self.currencies);
        Some((outcome, view))
    }
}
