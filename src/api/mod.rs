//! Purpose: Define the public Rust API boundary for remote model access.
//! Exports: The accessor, bus capability traits, bus implementations, and decoded types.
//! Role: Stable, additive-only surface over the `core` decoding stages.
//! Invariants: Callers depend on `Bus`/`ModelProxy`, never on a concrete transport.

mod accessor;
mod bus;
#[cfg(feature = "dbus")]
mod dbus;
mod memory;

pub use crate::core::address::{MODEL_INTERFACE, MODEL_OBJECT_ROOT, resolve_object_path};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::rows::Record;
pub use crate::core::schema::Schema;
pub use crate::core::value::FieldValue;
pub use crate::core::wire::{RawRow, RawSnapshot, WireValue};
pub use accessor::{AccessorBuilder, AccessorOptions, ModelAccessor, Snapshot};
pub use bus::{Bus, ModelProxy};
#[cfg(feature = "dbus")]
pub use dbus::DbusBus;
pub use memory::{MemoryBus, MemoryModel};
