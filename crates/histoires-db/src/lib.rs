//! Histoires DB - Database abstractions
//!
//! SQLx-based database layer for the Histoires services.
//!
//! # Example
//!
//! ```rust,ignore
//! use histoires_db::{create_pool, Repositories, Stores};
//!
//! let pool = create_pool("postgres://localhost/histoires", 10).await?;
//! let stores: Stores = Repositories::new(pool).into();
//!
//! let story = stores.stories.find_by_id(story_id).await?;
//! ```

pub mod error;
#[cfg(feature = "memory")]
pub mod memory;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, run_migrations, DbPool};
pub use repo::*;
