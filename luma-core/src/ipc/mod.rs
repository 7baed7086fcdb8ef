//! Event types shared with embedding hosts.

pub mod events;
