//! Core effect trait definitions
//!
//! Pure trait definitions for every side effect the virtual-delete machinery
//! performs. This module defines **what** effects exist; handlers in
//! `vesta-effects` define **how**.
//!
//! - **Store**: document get/put/remove, transactions, trigger suppression
//! - **Counter**: batch reservation against the persistent version counter
//! - **Hooks**: the delete-time hook contract the host pipeline dispatches

pub mod counter;
pub mod hooks;
pub mod store;
pub mod supertraits;

pub use counter::CounterEffects;
pub use hooks::DeleteHook;
pub use store::{
    DocumentStoreEffects, TransactionEffects, TriggerEffects, TriggerGuard, TriggerSuppression,
};
pub use supertraits::DatabaseEffects;
