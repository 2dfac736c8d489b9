//! Composite effect traits

use super::store::{DocumentStoreEffects, TransactionEffects, TriggerEffects};

/// Everything a delete pipeline needs from its database
pub trait DatabaseEffects: DocumentStoreEffects + TransactionEffects + TriggerEffects {}

impl<T> DatabaseEffects for T where T: DocumentStoreEffects + TransactionEffects + TriggerEffects {}
