//! Commands Layer
//!
//! Entry points the inventory screen calls to change the collection.

mod form;
mod item_cmd;

pub use form::{ItemForm, ValidationError};
pub use item_cmd::{EchoStrategy, MutationGateway};
