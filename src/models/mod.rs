pub mod note;
pub mod messages;
pub mod notes_api;
pub mod health;
pub mod diagnostics;
pub mod error;

pub use note::*;
pub use messages::*;
pub use notes_api::*;
pub use health::*;
pub use diagnostics::*;
pub use error::*;
