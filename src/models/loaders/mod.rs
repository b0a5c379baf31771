pub mod csv_loader;

pub use csv_loader::{load_work_items, parse_work_items, ID_COLUMN, PAYLOAD_COLUMN};
