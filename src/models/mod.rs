pub mod category;
pub mod loaders;
pub mod work_item;

pub use category::Category;
pub use loaders::load_work_items;
pub use work_item::{ResultRow, WorkItem, ERROR_LABEL};
