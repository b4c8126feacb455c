//! Domain models with validation at construction
//!
//! Request input is validated when these types are built.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod role;
pub mod title;
pub mod email;
pub mod message;
pub mod pagination;

pub use validation::ValidationError;
pub use role::Role;
pub use title::Title;
pub use email::Email;
pub use message::MessageText;
pub use pagination::{Pagination, PaginationParams};
