//! Record access boundary
//!
//! The bridge reads and writes remote records only through
//! [`RecordGateway`]. It never retries; timeouts belong to the
//! implementation.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use snowsync_artifact::RecordData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Remote record store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Current field values of a record, `None` when it does not exist
    ///
    /// # Errors
    /// Returns error when the remote could not be asked.
    async fn fetch(&self, table: &str, sys_id: &str) -> Result<Option<RecordData>, GatewayError>;

    /// Persist a field update; `Ok(false)` when the remote refused it
    ///
    /// # Errors
    /// Returns error when the remote could not be reached.
    async fn update(
        &self,
        table: &str,
        sys_id: &str,
        fields: &RecordData,
    ) -> Result<bool, GatewayError>;
}

#[async_trait]
impl<G: RecordGateway + ?Sized> RecordGateway for Arc<G> {
    async fn fetch(&self, table: &str, sys_id: &str) -> Result<Option<RecordData>, GatewayError> {
        (**self).fetch(table, sys_id).await
    }

    async fn update(
        &self,
        table: &str,
        sys_id: &str,
        fields: &RecordData,
    ) -> Result<bool, GatewayError> {
        (**self).update(table, sys_id, fields).await
    }
}

/// Gateway failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Network or client failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Unexpected HTTP status
    #[error("remote returned status {code}: {body}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Response body could not be interpreted
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Credentials rejected or missing
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl GatewayError {
    /// Create transport error
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

/// One update received by [`InMemoryGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpdate {
    /// Target table
    pub table: String,
    /// Target record
    pub sys_id: String,
    /// Payload as sent
    pub fields: RecordData,
    /// Whether the update was applied
    pub accepted: bool,
}

/// Gateway backed by process memory
///
/// Serves tests and offline sessions. Updates merge into the stored record
/// and every attempt is logged.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    records: DashMap<(String, String), RecordData>,
    updates: Mutex<Vec<RecordedUpdate>>,
    reject_updates: AtomicBool,
    unavailable: AtomicBool,
}

impl InMemoryGateway {
    /// Create empty gateway
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, filling in `sys_id` when absent
    pub fn insert(&self, table: &str, sys_id: &str, mut record: RecordData) {
        record
            .entry("sys_id".to_string())
            .or_insert_with(|| sys_id.to_string());
        self.records
            .insert((table.to_string(), sys_id.to_string()), record);
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with_record(self, table: &str, sys_id: &str, record: RecordData) -> Self {
        self.insert(table, sys_id, record);
        self
    }

    /// Stored record
    #[must_use]
    pub fn record(&self, table: &str, sys_id: &str) -> Option<RecordData> {
        self.records
            .get(&(table.to_string(), sys_id.to_string()))
            .map(|r| r.value().clone())
    }

    /// Every update attempt, oldest first
    #[must_use]
    pub fn updates(&self) -> Vec<RecordedUpdate> {
        self.updates.lock().clone()
    }

    /// Most recent update attempt
    #[must_use]
    pub fn last_update(&self) -> Option<RecordedUpdate> {
        self.updates.lock().last().cloned()
    }

    /// Number of update attempts
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates.lock().len()
    }

    /// Make `update` answer `Ok(false)`
    pub fn set_reject_updates(&self, reject: bool) {
        self.reject_updates.store(reject, Ordering::SeqCst);
    }

    /// Make every call fail with a transport error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(GatewayError::transport("in-memory gateway marked unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordGateway for InMemoryGateway {
    async fn fetch(&self, table: &str, sys_id: &str) -> Result<Option<RecordData>, GatewayError> {
        self.check_available()?;
        Ok(self.record(table, sys_id))
    }

    async fn update(
        &self,
        table: &str,
        sys_id: &str,
        fields: &RecordData,
    ) -> Result<bool, GatewayError> {
        self.check_available()?;

        let accepted = !self.reject_updates.load(Ordering::SeqCst)
            && match self
                .records
                .get_mut(&(table.to_string(), sys_id.to_string()))
            {
                Some(mut record) => {
                    for (field, value) in fields {
                        record.insert(field.clone(), value.clone());
                    }
                    true
                }
                None => false,
            };

        self.updates.lock().push(RecordedUpdate {
            table: table.to_string(),
            sys_id: sys_id.to_string(),
            fields: fields.clone(),
            accepted,
        });
        Ok(accepted)
    }
}
