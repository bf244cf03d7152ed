pub mod catalog;
pub mod color;
pub mod editing;
pub mod export;
pub mod grouping;
pub mod reorder;
pub mod session;
pub mod totals;
pub mod ungroup;

pub use color::ColorAssigner;
pub use editing::ItemPatch;
pub use grouping::{build_groups, flatten_groups, ItemGroup};
pub use reorder::{reorder, try_reorder};
pub use session::{EditorSession, SessionStore, SessionView};
pub use totals::{compute_totals, line_amounts, CurrencyRate};
pub use ungroup::{try_ungroup, ungroup};
