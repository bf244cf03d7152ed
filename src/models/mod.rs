pub mod catalog;
pub mod draft;
pub mod line_item;
pub mod template;
pub mod totals;

pub use catalog::{CatalogOption, ChildProduct, ParentProduct};
pub use draft::{DraftPayload, InvoiceDraft, InvoiceDraftRow, UNTITLED_DRAFT};
pub use line_item::{normalize_order, renumber, ItemKind, LineItem};
pub use template::{Column, ColumnType, TemplateId};
pub use totals::{CurrencyAmount, InvoiceTotals, LineAmounts};
