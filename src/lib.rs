//! Purpose: Library crate for reading snapshots of bus-exposed shared models.
//! Exports: `api` (public surface) and `core` (addressing, wire shapes, decoding, errors).
//! Role: Backs the `remote-model` CLI and downstream consumers.
//! Invariants: Core modules are pure; the only I/O is the `Clone` call behind `api::Bus`.
pub mod api;
pub mod core;
