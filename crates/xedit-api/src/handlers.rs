//! Request handlers.

pub mod files;
pub mod health;
pub mod predict;
pub mod schema;
pub mod upload;

pub use files::*;
pub use health::*;
pub use predict::*;
pub use schema::*;
pub use upload::*;
