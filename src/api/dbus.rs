//! Purpose: D-Bus transport for shared models, backed by an established zbus connection.
//! Exports: `DbusBus`.
//! Role: Converts `Clone` replies of signature `(sasaavauay(tt))` into `RawSnapshot`.
//! Invariants: The service identifier doubles as the destination bus name.
//! Invariants: Strings, object paths, and signatures keep their bytes.
//! Invariants: Scalars travel in their textual form.
//! Invariants: Every zbus failure surfaces as `ErrorKind::Transport`.

use super::bus::{Bus, ModelProxy};
use crate::core::address::CLONE_METHOD;
use crate::core::error::{Error, ErrorKind};
use crate::core::wire::{RawRow, RawSnapshot, WireValue};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::trace;
use zbus::Connection;
use zbus::zvariant::{OwnedValue, Value};

type CloneReply = (
    String,
    Vec<String>,
    Vec<Vec<OwnedValue>>,
    Vec<u32>,
    Vec<u8>,
    (u64, u64),
);

#[derive(Clone)]
pub struct DbusBus {
    connection: Connection,
}

struct DbusModelProxy {
    connection: Connection,
    destination: String,
    object_path: String,
    interface: String,
}

impl DbusBus {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    pub async fn session() -> Result<Self, Error> {
        let connection = Connection::session()
            .await
            .map_err(|err| transport_error("failed to connect to session bus", err))?;
        Ok(Self::new(connection))
    }

    pub async fn system() -> Result<Self, Error> {
        let connection = Connection::system()
            .await
            .map_err(|err| transport_error("failed to connect to system bus", err))?;
        Ok(Self::new(connection))
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl Bus for DbusBus {
    fn bind_model(
        &self,
        service: &str,
        object_path: &str,
        interface: &str,
    ) -> Result<Arc<dyn ModelProxy>, Error> {
        Ok(Arc::new(DbusModelProxy {
            connection: self.connection.clone(),
            destination: service.to_string(),
            object_path: object_path.to_string(),
            interface: interface.to_string(),
        }))
    }
}

#[async_trait]
impl ModelProxy for DbusModelProxy {
    async fn clone_model(&self) -> Result<RawSnapshot, Error> {
        trace!(
            destination = %self.destination,
            object_path = %self.object_path,
            "calling Clone"
        );
        let reply = self
            .connection
            .call_method(
                Some(self.destination.as_str()),
                self.object_path.as_str(),
                Some(self.interface.as_str()),
                CLONE_METHOD,
                &(),
            )
            .await
            .map_err(|err| transport_error("Clone call failed", err))?;
        let body = reply.body();
        let decoded: CloneReply = body
            .deserialize()
            .map_err(|err| transport_error("invalid Clone reply", err))?;
        let (dataset_name, column_types, rows, positions, change_types, (before, after)) = decoded;

        Ok(RawSnapshot {
            dataset_name,
            column_types,
            rows: rows.iter().map(|row| raw_row(row)).collect(),
            positions: positions.into_iter().map(u64::from).collect(),
            change_types,
            seqnum_before: before,
            seqnum_after: after,
        })
    }
}

fn raw_row(row: &[OwnedValue]) -> RawRow {
    row.iter().map(|value| wire_value(value)).collect()
}

fn wire_value(value: &Value<'_>) -> WireValue {
    match value {
        Value::Str(text) => WireValue::from(text.as_str()),
        Value::ObjectPath(path) => WireValue::from(path.as_str()),
        Value::Signature(signature) => WireValue::from(signature.as_str()),
        Value::Bool(flag) => WireValue::from(flag.to_string()),
        Value::U8(number) => WireValue::from(number.to_string()),
        Value::I16(number) => WireValue::from(number.to_string()),
        Value::U16(number) => WireValue::from(number.to_string()),
        Value::I32(number) => WireValue::from(number.to_string()),
        Value::U32(number) => WireValue::from(number.to_string()),
        Value::I64(number) => WireValue::from(number.to_string()),
        Value::U64(number) => WireValue::from(number.to_string()),
        Value::F64(number) => WireValue::from(number.to_string()),
        Value::Value(inner) => wire_value(inner),
        _ => WireValue::Null,
    }
}

fn transport_error(message: &str, err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::new(ErrorKind::Transport)
        .with_message(message)
        .with_source(err)
}
