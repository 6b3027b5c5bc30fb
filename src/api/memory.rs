//! Purpose: In-process bus hosting shared models for tests and embedding.
//! Exports: `MemoryBus`, `MemoryModel`.
//! Role: `Bus` implementation without a daemon; models are looked up per call.
//! Invariants: Models are addressed by resolved object path, like a real bus.
//! Invariants: Every mutation advances the model seqnum by one.
//! Invariants: Rows are stored as given so malformed shapes can be served.

use super::bus::{Bus, ModelProxy};
use crate::core::address::{MODEL_INTERFACE, resolve_object_path};
use crate::core::error::{Error, ErrorKind};
use crate::core::wire::{RawRow, RawSnapshot};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const CHANGE_ADDED: u8 = 0;
const CHANGE_REMOVED: u8 = 1;

#[derive(Clone, Default)]
pub struct MemoryBus {
    inner: Arc<MemoryBusInner>,
}

#[derive(Default)]
struct MemoryBusInner {
    models: Mutex<HashMap<String, MemoryModel>>,
    clone_calls: AtomicUsize,
}

#[derive(Clone)]
pub struct MemoryModel {
    state: Arc<Mutex<ModelState>>,
}

struct ModelState {
    dataset_name: String,
    column_types: Vec<String>,
    rows: Vec<RawRow>,
    seqnum: u64,
    fail_next: Option<String>,
}

struct MemoryProxy {
    bus: Arc<MemoryBusInner>,
    object_path: String,
    interface: String,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `model` at the object path derived from `service`.
    pub fn publish(&self, service: &str, model: MemoryModel) {
        let object_path = resolve_object_path(service);
        debug!(service, object_path = %object_path, "published memory model");
        lock(&self.inner.models).insert(object_path, model);
    }

    pub fn unpublish(&self, service: &str) -> Option<MemoryModel> {
        lock(&self.inner.models).remove(&resolve_object_path(service))
    }

    /// Number of `Clone` calls served, including failed ones.
    pub fn clone_calls(&self) -> usize {
        self.inner.clone_calls.load(Ordering::SeqCst)
    }
}

impl Bus for MemoryBus {
    fn bind_model(
        &self,
        _service: &str,
        object_path: &str,
        interface: &str,
    ) -> Result<Arc<dyn ModelProxy>, Error> {
        Ok(Arc::new(MemoryProxy {
            bus: Arc::clone(&self.inner),
            object_path: object_path.to_string(),
            interface: interface.to_string(),
        }))
    }
}

#[async_trait]
impl ModelProxy for MemoryProxy {
    async fn clone_model(&self) -> Result<RawSnapshot, Error> {
        self.bus.clone_calls.fetch_add(1, Ordering::SeqCst);
        if self.interface != MODEL_INTERFACE {
            return Err(Error::new(ErrorKind::Transport)
                .with_message(format!("unknown interface {}", self.interface)));
        }
        let model = lock(&self.bus.models).get(&self.object_path).cloned();
        let Some(model) = model else {
            return Err(Error::new(ErrorKind::Transport)
                .with_message(format!("no model published at {}", self.object_path)));
        };
        model.clone_snapshot()
    }
}

impl MemoryModel {
    pub fn new<I, S>(dataset_name: impl Into<String>, column_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: Arc::new(Mutex::new(ModelState {
                dataset_name: dataset_name.into(),
                column_types: column_types.into_iter().map(Into::into).collect(),
                rows: Vec::new(),
                seqnum: 0,
                fail_next: None,
            })),
        }
    }

    pub fn with_seqnum(self, seqnum: u64) -> Self {
        lock(&self.state).seqnum = seqnum;
        self
    }

    pub fn seqnum(&self) -> u64 {
        lock(&self.state).seqnum
    }

    /// Appends a row and returns the new seqnum.
    pub fn append_row(&self, row: RawRow) -> u64 {
        let mut state = lock(&self.state);
        state.rows.push(row);
        state.seqnum += 1;
        state.seqnum
    }

    /// Replaces the row at `position` with a tombstone; `None` if out of range.
    pub fn remove_row(&self, position: usize) -> Option<u64> {
        let mut state = lock(&self.state);
        let slot = state.rows.get_mut(position)?;
        slot.clear();
        state.seqnum += 1;
        Some(state.seqnum)
    }

    pub fn set_rows(&self, rows: Vec<RawRow>) -> u64 {
        let mut state = lock(&self.state);
        state.rows = rows;
        state.seqnum += 1;
        state.seqnum
    }

    /// Makes the next `Clone` call fail with a transport error.
    pub fn fail_next_call(&self, message: impl Into<String>) {
        lock(&self.state).fail_next = Some(message.into());
    }

    fn clone_snapshot(&self) -> Result<RawSnapshot, Error> {
        let mut state = lock(&self.state);
        if let Some(message) = state.fail_next.take() {
            return Err(Error::new(ErrorKind::Transport).with_message(message));
        }
        let row_count = state.rows.len() as u64;
        Ok(RawSnapshot {
            dataset_name: state.dataset_name.clone(),
            column_types: state.column_types.clone(),
            rows: state.rows.clone(),
            positions: (0..row_count).collect(),
            change_types: state
                .rows
                .iter()
                .map(|row| {
                    if row.is_empty() {
                        CHANGE_REMOVED
                    } else {
                        CHANGE_ADDED
                    }
                })
                .collect(),
            seqnum_before: state.seqnum.saturating_sub(row_count),
            seqnum_after: state.seqnum,
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poison| poison.into_inner())
}
