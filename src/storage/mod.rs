pub mod memory;
pub mod table;

pub use memory::MemoryStore;
pub use table::{Record, Table};
