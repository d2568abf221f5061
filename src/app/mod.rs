pub mod context;
pub mod error;
pub mod lifecycle;

pub use context::AppContext;
pub use error::{AppError, Result};
pub use lifecycle::{FatalReceiver, Lifecycle};
