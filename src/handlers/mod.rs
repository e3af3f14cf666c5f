pub mod health;
pub mod notes;
pub mod diagnostics;

pub use health::*;
pub use notes::*;
pub use diagnostics::*;
