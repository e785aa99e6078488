pub mod error;
pub mod events;
pub mod id;
pub mod kind;

pub use error::{CoreError, ErrorCategory};
pub use id::generate_id;
pub use kind::EntityKind;
