pub mod store;
pub mod memory;
pub mod dbnotes;

pub use store::*;
pub use memory::MemoryNoteStore;
pub use dbnotes::PgNoteStore;
