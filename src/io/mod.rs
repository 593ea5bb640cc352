//! Low-level file helpers shared by the storage and watermark modules.

pub(crate) mod atomic;
pub(crate) mod column;
