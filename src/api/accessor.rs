//! Purpose: Fetch, check, and decode snapshots of a remote shared model.
//! Exports: `ModelAccessor`, `AccessorBuilder`, `AccessorOptions`, `Snapshot`.
//! Role: Public entry point; runs fetch -> seqnum check -> row filter -> decode.
//! Invariants: Construction fails before any bus traffic when a parameter is missing.
//! Invariants: Every `get` issues exactly one `Clone` call; nothing is cached.
//! Invariants: Dropping a pending `get` drops the in-flight remote call.
#![allow(clippy::result_large_err)]

use super::bus::{Bus, ModelProxy};
use crate::core::address::{MODEL_INTERFACE, resolve_object_path};
use crate::core::error::{Error, ErrorKind};
use crate::core::rows::{Record, decode_row, filter_rows};
use crate::core::schema::Schema;
use crate::core::seqnum::validate_seqnum;
use crate::core::wire::RawSnapshot;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

type ApiResult<T> = Result<T, Error>;

#[derive(Clone, Debug, Default)]
pub struct AccessorOptions {
    /// Upper bound on a single `Clone` call; `None` waits for the bus.
    pub timeout: Option<Duration>,
}

impl AccessorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Decoded snapshot plus the metadata the model reported alongside it.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub dataset_name: String,
    pub column_types: Vec<String>,
    pub seqnum_before: u64,
    pub seqnum_after: u64,
    pub records: Vec<Record>,
}

#[derive(Clone)]
pub struct ModelAccessor {
    inner: Arc<AccessorInner>,
}

struct AccessorInner {
    service: String,
    object_path: String,
    schema: Schema,
    options: AccessorOptions,
    proxy: Arc<dyn ModelProxy>,
}

#[derive(Default)]
pub struct AccessorBuilder<'a> {
    bus: Option<&'a dyn Bus>,
    service: Option<String>,
    schema: Option<Schema>,
    options: AccessorOptions,
}

impl<'a> AccessorBuilder<'a> {
    pub fn bus(mut self, bus: &'a dyn Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn options(mut self, options: AccessorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ApiResult<ModelAccessor> {
        let Some(bus) = self.bus else {
            return Err(missing("bus"));
        };
        let service = match self.service {
            Some(service) if !service.is_empty() => service,
            _ => return Err(missing("service")),
        };
        let Some(schema) = self.schema else {
            return Err(missing("schema").with_service(service));
        };

        let object_path = resolve_object_path(&service);
        let proxy = bus
            .bind_model(&service, &object_path, MODEL_INTERFACE)
            .map_err(|err| err.with_service(service.clone()))?;
        debug!(
            service = %service,
            object_path = %object_path,
            columns = schema.len(),
            "bound remote model"
        );

        Ok(ModelAccessor {
            inner: Arc::new(AccessorInner {
                service,
                object_path,
                schema,
                options: self.options,
                proxy,
            }),
        })
    }
}

impl ModelAccessor {
    pub fn builder<'a>() -> AccessorBuilder<'a> {
        AccessorBuilder::default()
    }

    /// Binds an accessor; each argument is mandatory.
    pub fn create(
        bus: Option<&dyn Bus>,
        service: Option<&str>,
        schema: Option<Schema>,
    ) -> ApiResult<Self> {
        let mut builder = Self::builder();
        if let Some(bus) = bus {
            builder = builder.bus(bus);
        }
        if let Some(service) = service {
            builder = builder.service(service);
        }
        if let Some(schema) = schema {
            builder = builder.schema(schema);
        }
        builder.build()
    }

    pub fn service(&self) -> &str {
        &self.inner.service
    }

    pub fn object_path(&self) -> &str {
        &self.inner.object_path
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// Fetches the current rows, optionally requiring the model to be at `expected_seqnum`.
    pub async fn get(&self, expected_seqnum: Option<u64>) -> ApiResult<Vec<Record>> {
        Ok(self.fetch_snapshot(expected_seqnum).await?.records)
    }

    pub async fn fetch_snapshot(&self, expected_seqnum: Option<u64>) -> ApiResult<Snapshot> {
        let raw = self.fetch().await?;
        debug!(
            service = %self.inner.service,
            dataset = %raw.dataset_name,
            seqnum_before = raw.seqnum_before,
            seqnum_after = raw.seqnum_after,
            rows = raw.rows.len(),
            "fetched model snapshot"
        );

        let raw = validate_seqnum(expected_seqnum, raw).map_err(|err| {
            warn!(
                service = %self.inner.service,
                expected = ?err.expected_seqnum(),
                actual = ?err.actual_seqnum(),
                "stale model snapshot"
            );
            err.with_service(self.inner.service.clone())
        })?;

        let RawSnapshot {
            dataset_name,
            column_types,
            rows,
            seqnum_before,
            seqnum_after,
            ..
        } = raw;
        let total = rows.len();
        let rows = filter_rows(column_types.len(), rows);
        if rows.len() != total {
            trace!(
                service = %self.inner.service,
                dropped = total - rows.len(),
                "dropped malformed rows"
            );
        }

        let schema = &self.inner.schema;
        let records = rows.iter().map(|row| decode_row(schema, row)).collect();
        Ok(Snapshot {
            dataset_name,
            column_types,
            seqnum_before,
            seqnum_after,
            records,
        })
    }

    async fn fetch(&self) -> ApiResult<RawSnapshot> {
        let call = self.inner.proxy.clone_model();
        let result = match self.inner.options.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|elapsed| {
                    Error::new(ErrorKind::Transport)
                        .with_message(format!(
                            "Clone call timed out after {}ms",
                            timeout.as_millis()
                        ))
                        .with_source(elapsed)
                })
                .and_then(|result| result),
            None => call.await,
        };
        result.map_err(|err| err.with_service(self.inner.service.clone()))
    }
}

impl fmt::Debug for ModelAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAccessor")
            .field("service", &self.inner.service)
            .field("object_path", &self.inner.object_path)
            .field("schema", &self.inner.schema)
            .field("options", &self.inner.options)
            .finish()
    }
}

fn missing(parameter: &str) -> Error {
    Error::new(ErrorKind::Configuration).with_message(format!("missing {parameter}"))
}

#[cfg(test)]
mod tests {
    use super::{AccessorOptions, ModelAccessor};
    use crate::api::bus::{Bus, ModelProxy};
    use crate::core::error::{Error, ErrorKind};
    use crate::core::schema::Schema;
    use crate::core::value::FieldValue;
    use crate::core::wire::{RawRow, RawSnapshot, WireValue};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CannedProxy {
        snapshot: RawSnapshot,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl ModelProxy for CannedProxy {
        async fn clone_model(&self) -> Result<RawSnapshot, Error> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.snapshot.clone())
        }
    }

    #[derive(Default)]
    struct CannedBus {
        snapshot: RawSnapshot,
        delay: Option<Duration>,
        binds: AtomicUsize,
        bound: std::sync::Mutex<Vec<(String, String, String)>>,
    }

    impl Bus for CannedBus {
        fn bind_model(
            &self,
            service: &str,
            object_path: &str,
            interface: &str,
        ) -> Result<Arc<dyn ModelProxy>, Error> {
            self.binds.fetch_add(1, Ordering::SeqCst);
            self.bound.lock().expect("lock").push((
                service.to_string(),
                object_path.to_string(),
                interface.to_string(),
            ));
            Ok(Arc::new(CannedProxy {
                snapshot: self.snapshot.clone(),
                delay: self.delay,
            }))
        }
    }

    fn people_snapshot(seqnum: u64) -> RawSnapshot {
        let row = |values: &[&str]| -> RawRow { values.iter().map(|v| WireValue::from(*v)).collect() };
        RawSnapshot {
            dataset_name: "swarm".to_string(),
            column_types: vec!["s".to_string(), "s".to_string(), "s".to_string()],
            rows: vec![
                row(&["1", "Alice", "x"]),
                row(&[]),
                row(&["bad"]),
                row(&["2", "Bob", "y"]),
            ],
            positions: vec![0, 1, 2, 3],
            change_types: vec![0, 0, 0, 0],
            seqnum_before: seqnum - 4,
            seqnum_after: seqnum,
        }
    }

    fn people_schema() -> Schema {
        Schema::new([(0, "id"), (2, "tag")])
    }

    #[test]
    fn create_requires_every_parameter() {
        let bus = CannedBus::default();
        let handle: &dyn Bus = &bus;
        let cases = [
            ModelAccessor::create(None, Some("com.example.Foo"), Some(people_schema())),
            ModelAccessor::create(Some(handle), None, Some(people_schema())),
            ModelAccessor::create(Some(handle), Some("com.example.Foo"), None),
            ModelAccessor::create(Some(handle), Some(""), Some(people_schema())),
        ];
        for result in cases {
            let err = result.expect_err("configuration error");
            assert_eq!(err.kind(), ErrorKind::Configuration);
        }
        assert_eq!(bus.binds.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn create_binds_resolved_path_and_interface() {
        let bus = CannedBus::default();
        let handle: &dyn Bus = &bus;
        let accessor =
            ModelAccessor::create(Some(handle), Some("com.example.Foo"), Some(people_schema()))
                .expect("accessor");
        assert_eq!(accessor.object_path(), "/com/canonical/dee/model/com/example/Foo");
        let bound = bus.bound.lock().expect("lock");
        assert_eq!(
            bound.as_slice(),
            &[(
                "com.example.Foo".to_string(),
                "/com/canonical/dee/model/com/example/Foo".to_string(),
                "com.canonical.Dee.Model".to_string(),
            )]
        );
    }

    #[tokio::test]
    async fn get_filters_and_decodes_rows() {
        let bus = CannedBus {
            snapshot: people_snapshot(7),
            ..CannedBus::default()
        };
        let accessor = ModelAccessor::builder()
            .bus(&bus)
            .service("com.example.People")
            .schema(people_schema())
            .build()
            .expect("accessor");

        let records = accessor.get(Some(7)).await.expect("records");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("id"), Some(&FieldValue::Number(1.0)));
        assert_eq!(
            records[0].get("tag"),
            Some(&FieldValue::Text("x".to_string()))
        );
        assert_eq!(records[1].get("id"), Some(&FieldValue::Number(2.0)));
        assert_eq!(
            records[1].get("tag"),
            Some(&FieldValue::Text("y".to_string()))
        );
    }

    #[tokio::test]
    async fn stale_seqnum_is_rejected() {
        let bus = CannedBus {
            snapshot: people_snapshot(7),
            ..CannedBus::default()
        };
        let handle: &dyn Bus = &bus;
        let accessor =
            ModelAccessor::create(Some(handle), Some("com.example.People"), Some(people_schema()))
                .expect("accessor");

        let err = accessor.get(Some(8)).await.expect_err("stale");
        assert_eq!(err.kind(), ErrorKind::StaleSnapshot);
        assert_eq!(err.service(), Some("com.example.People"));
        assert!(accessor.get(None).await.is_ok());
    }

    #[tokio::test]
    async fn snapshot_keeps_metadata() {
        let bus = CannedBus {
            snapshot: people_snapshot(9),
            ..CannedBus::default()
        };
        let handle: &dyn Bus = &bus;
        let accessor =
            ModelAccessor::create(Some(handle), Some("com.example.People"), Some(people_schema()))
                .expect("accessor");

        let snapshot = accessor.fetch_snapshot(None).await.expect("snapshot");
        assert_eq!(snapshot.dataset_name, "swarm");
        assert_eq!(snapshot.seqnum_before, 5);
        assert_eq!(snapshot.seqnum_after, 9);
        assert_eq!(snapshot.column_types.len(), 3);
        assert_eq!(snapshot.records.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_clone_times_out_as_transport_error() {
        let bus = CannedBus {
            snapshot: people_snapshot(7),
            delay: Some(Duration::from_secs(30)),
            ..CannedBus::default()
        };
        let accessor = ModelAccessor::builder()
            .bus(&bus)
            .service("com.example.People")
            .schema(people_schema())
            .options(AccessorOptions::new().with_timeout(Duration::from_secs(1)))
            .build()
            .expect("accessor");

        let err = accessor.get(None).await.expect_err("timeout");
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
