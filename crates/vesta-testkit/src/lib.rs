//! Vesta Testing Infrastructure
//!
//! Fixtures, fault-injecting handlers, and a ready-wired test database.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! vesta-testkit = { path = "../vesta-testkit" }
//! ```
//!
//! ```rust,no_run
//! use vesta_testkit::*;
//!
//! # async fn demo() {
//! let db = TestDatabase::builder().node("B").build();
//! seed_document(&db.store, "users/1", revision(5, "A"), b"alice").await;
//! db.delete("users/1").await.unwrap();
//! # }
//! ```

pub mod audit;
pub mod database;
pub mod faults;
pub mod fixtures;

pub use audit::{AuditedAccess, StoreAccess, TriggerAuditStore};
pub use database::{TestDatabase, TestDatabaseBuilder};
pub use faults::{FlakyCounterStore, FlakyDocumentStore};
pub use fixtures::*;
