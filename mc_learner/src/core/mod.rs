//! Shared plumbing: channels, control cells, the target slot and the
//! episode record types.

pub mod channel;
pub mod control;
pub mod shutdown;
pub mod target_slot;
pub mod transition;
