//! Infrastructure Database Layer
//!
//! PostgreSQL storage for the checkout service, using SQLx.
//!
//! # Architecture
//!
//! Repositories own the SQL and the row types. Adapters implement the
//! checkout domain's store ports on top of them and translate errors into
//! `PortError`.
//!
//! ```text
//! PolicyRecordStore ── PostgresPolicyRecordStore ── PolicyRecordRepository ── policy_records
//! EnquiryStore      ── PostgresEnquiryStore      ── EnquiryRepository      ── contact_messages, inquiries
//! ```
//!
//! Policy record inserts are idempotent on `order_id`
//! (`INSERT ... ON CONFLICT (order_id) DO NOTHING`).
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresPolicyRecordStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/travel_checkout")).await?;
//! run_migrations(&pool).await?;
//! let records = PostgresPolicyRecordStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::{PostgresEnquiryStore, PostgresPolicyRecordStore};
