pub mod error;
pub mod types;

pub mod config;
pub mod emitter;
pub mod metrics;
pub mod mirror;
pub mod mutation;
pub mod query;
pub mod seed;
pub mod session;
pub mod store;

pub use error::{DossierError, Result};
pub use session::{Dashboard, Session};
