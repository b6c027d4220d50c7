// src/theses/mod.rs
pub mod order;
pub mod record;

pub use order::SortPolicy;
pub use record::load_records;
