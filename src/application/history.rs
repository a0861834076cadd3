//! History store: session-lifetime prediction history.
//!
//! Append/clear-only. Records are kept newest-first; nothing edits or removes
//! a single record. Observers are notified after every change.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::domain::{ClinicalInput, PredictionRecord, PredictionResult, RecordId};

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryEvent {
    /// A record was prepended
    Added(RecordId),
    /// The history was emptied
    Cleared { removed: usize },
}

/// Handle returned by [`HistoryStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&HistoryEvent) + Send + Sync>;

/// Ordered, in-memory prediction history.
///
/// Created by the composition root and shared as `Arc<HistoryStore>`.
#[derive(Default)]
pub struct HistoryStore {
    records: RwLock<Vec<PredictionRecord>>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("records", &self.records.read().len())
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}

impl HistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a service result and prepend it.
    ///
    /// Returns a copy of the stored record.
    pub fn add_prediction(
        &self,
        result: impl Into<PredictionResult>,
        input: ClinicalInput,
    ) -> PredictionRecord {
        let record = PredictionRecord::create(result, input);
        self.add_record(record.clone());
        record
    }

    /// Prepend an already-built record.
    pub fn add_record(&self, record: PredictionRecord) {
        let id = record.id();
        let total = {
            let mut records = self.records.write();
            records.insert(0, record);
            records.len()
        };

        tracing::info!("Prediction {} added to history ({} total)", id, total);
        self.notify(&HistoryEvent::Added(id));
    }

    /// Remove every record. Returns how many were removed.
    pub fn clear_predictions(&self) -> usize {
        let removed = {
            let mut records = self.records.write();
            let n = records.len();
            records.clear();
            n
        };

        tracing::info!("Prediction history cleared ({} removed)", removed);
        self.notify(&HistoryEvent::Cleared { removed });
        removed
    }

    /// Snapshot of all records, newest first.
    #[must_use]
    pub fn get_all(&self) -> Vec<PredictionRecord> {
        self.records.read().clone()
    }

    /// Most recent record, if any.
    #[must_use]
    pub fn latest(&self) -> Option<PredictionRecord> {
        self.records.read().first().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Register a callback invoked after every change.
    ///
    /// Callbacks run on the mutating thread with no store lock held, so they
    /// may read or mutate the store. A callback registered or removed during
    /// a notification takes effect from the next one.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&HistoryEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    fn notify(&self, event: &HistoryEvent) {
        let callbacks: Vec<Subscriber> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }
}
