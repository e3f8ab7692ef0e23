//! # Reactive Record Store
//!
//! [`RecordStore`] is the single source of truth for consumers. It owns the
//! persistence adapter and an in-memory [`RecordState`], and every mutating
//! action goes through it rather than through the table directly.
//!
//! ## Publishing
//!
//! Each state change replaces the current `Rc<RecordState>` with a new
//! snapshot and hands it to every subscriber, synchronously and in
//! subscription order. Nothing is batched: three quick edits mean three
//! callbacks per subscriber. Subscribing does not replay the current state;
//! read [`RecordStore::snapshot`] for that.
//!
//! ## Outcomes
//!
//! Operations that can fail return `bool` instead of an error, and emit
//! exactly one notification (success or failure) through the injected
//! [`Notifier`]. State is only replaced after the table write succeeded, so
//! a failed operation leaves both storage and state as they were.
//!
//! ## Lifecycle
//!
//! `loading` starts `true` and flips to `false` on the first [`load`]
//! (successful or not). It never goes back.
//!
//! [`load`]: RecordStore::load

use crate::error::Result;
use crate::model::{RecordState, StudentForm, StudentRecord};
use crate::notify::{Notifier, ToastSpec};
use crate::store::{RecordTable, StorageBackend};
use std::rc::Rc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Rc<RecordState>)>;

pub struct RecordStore<B: StorageBackend> {
    table: RecordTable<B>,
    notifier: Box<dyn Notifier>,
    state: Rc<RecordState>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl<B: StorageBackend> RecordStore<B> {
    /// Creates a store in the `loading` state. Call [`load`](Self::load) to populate it.
    pub fn new(table: RecordTable<B>, notifier: impl Notifier + 'static) -> Self {
        Self {
            table,
            notifier: Box::new(notifier),
            state: Rc::new(RecordState::default()),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    // --- Observation ---

    pub fn subscribe(&mut self, callback: impl FnMut(&Rc<RecordState>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Subscribes to one derived value, e.g. `|s| s.loading`.
    /// The callback runs on every state change, like [`subscribe`](Self::subscribe).
    pub fn subscribe_map<T, S, F>(&mut self, selector: S, mut callback: F) -> SubscriptionId
    where
        S: Fn(&RecordState) -> T + 'static,
        F: FnMut(T) + 'static,
    {
        self.subscribe(move |state| callback(selector(state)))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // --- Reads ---

    pub fn snapshot(&self) -> Rc<RecordState> {
        Rc::clone(&self.state)
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.state.records
    }

    pub fn filtered_records(&self) -> &[StudentRecord] {
        &self.state.filtered_records
    }

    pub fn loading(&self) -> bool {
        self.state.loading
    }

    pub fn search_query(&self) -> &str {
        &self.state.search_query
    }

    pub fn table(&self) -> &RecordTable<B> {
        &self.table
    }

    /// Reads straight from storage, not from the in-memory state.
    pub fn get_by_id(&self, id: &str) -> Option<StudentRecord> {
        self.table.get_by_id(id)
    }

    // --- Commands ---

    pub fn load(&mut self) {
        match self.reload() {
            Ok(count) => info!(count, "Loaded student records"),
            Err(e) => {
                warn!(error = %e, "Failed to load student records");
                self.notify_error("Failed to load student records");
                let mut next = (*self.state).clone();
                next.loading = false;
                self.set_state(next);
            }
        }
    }

    /// Replaces the state with the persisted collection. Unlike [`load`](Self::load)
    /// it leaves reporting a failure to the caller.
    pub fn reload(&mut self) -> Result<usize> {
        let records = self.table.try_get_all()?;
        let count = records.len();
        self.set_state(RecordState::ready(records));
        Ok(count)
    }

    pub fn add(&mut self, form: StudentForm) -> bool {
        if self.table.ensure_roll_no_unique(form.roll_no, None).is_err() {
            self.notify_error("Roll number must be unique");
            return false;
        }

        let record = StudentRecord::new(form);
        if let Err(e) = self.table.add(&record) {
            warn!(error = %e, "Failed to add student");
            self.notify_error("Failed to add student");
            return false;
        }

        debug!(id = %record.id, roll_no = record.roll_no, "Added student");
        let mut records = self.state.records.clone();
        records.push(record);
        self.replace_records(records);
        self.notify_success("Student added successfully");
        true
    }

    pub fn update(&mut self, id: &str, form: StudentForm) -> bool {
        if self
            .table
            .ensure_roll_no_unique(form.roll_no, Some(id))
            .is_err()
        {
            self.notify_error("Roll number must be unique");
            return false;
        }

        let Some(existing) = self.state.records.iter().find(|r| r.id == id) else {
            self.notify_error("Student not found");
            return false;
        };
        let revised = existing.revised(form);

        match self.table.update(&revised) {
            Ok(true) => {}
            Ok(false) => {
                warn!(id, "Student vanished from storage before update");
                self.notify_error("Failed to update student");
                return false;
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to update student");
                self.notify_error("Failed to update student");
                return false;
            }
        }

        debug!(id, "Updated student");
        let records = self
            .state
            .records
            .iter()
            .map(|r| if r.id == id { revised.clone() } else { r.clone() })
            .collect();
        self.replace_records(records);
        self.notify_success("Student updated successfully");
        true
    }

    pub fn delete(&mut self, id: &str) -> bool {
        match self.table.delete(id) {
            Ok(true) => {}
            Ok(false) => {
                self.notify_error("Student not found");
                return false;
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to delete student");
                self.notify_error("Failed to delete student");
                return false;
            }
        }

        debug!(id, "Deleted student");
        let records = self
            .state
            .records
            .iter()
            .filter(|r| r.id != id)
            .cloned()
            .collect();
        self.replace_records(records);
        self.notify_success("Student deleted successfully");
        true
    }

    /// Filters the persisted collection and remembers `query`. Always publishes.
    pub fn search(&mut self, query: &str) {
        let filtered_records = self.table.search(query);
        let mut next = (*self.state).clone();
        next.filtered_records = filtered_records;
        next.search_query = query.to_string();
        self.set_state(next);
    }

    /// Wipes storage and resets to an empty, ready state.
    pub fn clear_all(&mut self) -> bool {
        if let Err(e) = self.table.clear() {
            warn!(error = %e, "Failed to clear student data");
            self.notify_error("Failed to clear student data");
            return false;
        }
        info!("Cleared all student data");
        self.set_state(RecordState::ready(Vec::new()));
        self.notify_success("All student data has been cleared");
        true
    }

    // --- Internals ---

    /// Installs `records` and recomputes the filtered view for the active query.
    fn replace_records(&mut self, records: Vec<StudentRecord>) {
        let mut next = (*self.state).clone();
        next.filtered_records = if next.search_query.is_empty() {
            records.clone()
        } else {
            self.table.search(&next.search_query)
        };
        next.records = records;
        self.set_state(next);
    }

    fn set_state(&mut self, next: RecordState) {
        self.state = Rc::new(next);
        debug!(subscribers = self.subscribers.len(), "Publishing record state");
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&self.state);
        }
    }

    fn notify_success(&self, description: &str) {
        self.notifier.show(ToastSpec::success("Success", description));
    }

    fn notify_error(&self, description: &str) {
        self.notifier.show(ToastSpec::error("Error", description));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToastQueue;
    use crate::store::memory::fixtures::{form, TableFixture};
    use crate::store::memory::InMemoryTable;
    use std::cell::RefCell;

    fn store_with(table: InMemoryTable) -> (RecordStore<crate::store::mem_backend::MemBackend>, ToastQueue) {
        let toasts = ToastQueue::default();
        let mut store = RecordStore::new(table, toasts.clone());
        store.load();
        (store, toasts)
    }

    fn empty_store() -> (RecordStore<crate::store::mem_backend::MemBackend>, ToastQueue) {
        store_with(InMemoryTable::in_memory())
    }

    fn last_description(toasts: &ToastQueue) -> String {
        toasts.last().and_then(|t| t.description).unwrap_or_default()
    }

    #[test]
    fn starts_loading_until_first_load() {
        let store = RecordStore::new(InMemoryTable::in_memory(), ToastQueue::default());
        assert!(store.loading());

        let (store, toasts) = empty_store();
        assert!(!store.loading());
        assert!(toasts.is_empty());
    }

    #[test]
    fn load_populates_records_and_filtered() {
        let (store, _) = store_with(TableFixture::new().with_sample().table);
        assert_eq!(store.records().len(), 2);
        assert_eq!(store.filtered_records(), store.records());
        assert_eq!(store.search_query(), "");
    }

    #[test]
    fn load_is_idempotent() {
        let (mut store, _) = store_with(TableFixture::new().with_sample().table);
        let first = store.snapshot();
        store.load();
        assert_eq!(*first, *store.snapshot());
    }

    #[test]
    fn undecodable_stored_record_does_not_erase_the_rest() {
        use crate::store::memory::fixtures::{jane, john};
        use crate::store::DEFAULT_RECORDS_KEY;

        let table = InMemoryTable::in_memory();
        let mut odd = serde_json::to_value(jane()).unwrap();
        odd["createdAt"] = serde_json::Value::from("2023-01-02");
        let blob = serde_json::Value::Array(vec![serde_json::to_value(john()).unwrap(), odd]);
        table.backend().put_raw(DEFAULT_RECORDS_KEY, &blob.to_string());

        let (mut store, _) = store_with(table);
        assert_eq!(store.records().len(), 1);
        assert!(store.add(form("New Kid", 500)));

        let names: Vec<String> = store.table().get_all().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["John Doe".to_string(), "New Kid".to_string()]);
    }

    #[test]
    fn load_failure_notifies_and_keeps_records() {
        let (mut store, toasts) = store_with(TableFixture::new().with_sample().table);
        store.table().backend().set_simulate_read_error(true);

        store.load();
        assert_eq!(store.records().len(), 2);
        assert!(!store.loading());
        assert!(toasts.last().unwrap().is_error());
        assert_eq!(last_description(&toasts), "Failed to load student records");
    }

    #[test]
    fn add_then_duplicate_roll_number_scenario() {
        let (mut store, toasts) = empty_store();

        assert!(store.add(form("Test", 105)));
        assert_eq!(store.records().len(), 1);
        assert_eq!(last_description(&toasts), "Student added successfully");

        assert!(!store.add(form("Someone Else", 105)));
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.table().get_all().len(), 1);
        assert_eq!(last_description(&toasts), "Roll number must be unique");
        assert_eq!(toasts.len(), 2);
    }

    #[test]
    fn add_persists_and_stamps_record() {
        let (mut store, _) = empty_store();
        assert!(store.add(form("Test", 105)));

        let added = &store.records()[0];
        assert_eq!(added.created_at, added.updated_at);
        assert_eq!(store.get_by_id(&added.id).as_ref(), Some(added));
    }

    #[test]
    fn add_with_write_failure_changes_nothing() {
        let (mut store, toasts) = store_with(TableFixture::new().with_sample().table);
        store.table().backend().set_simulate_write_error(true);

        assert!(!store.add(form("Test", 105)));
        assert_eq!(store.records().len(), 2);
        assert_eq!(last_description(&toasts), "Failed to add student");
    }

    #[test]
    fn add_reruns_active_search() {
        let (mut store, _) = store_with(TableFixture::new().with_sample().table);
        store.search("john");
        assert_eq!(store.filtered_records().len(), 1);

        assert!(store.add(form("Johnny Test", 300)));
        assert_eq!(store.records().len(), 3);
        assert_eq!(store.filtered_records().len(), 2);

        assert!(store.add(form("Unrelated", 301)));
        assert_eq!(store.filtered_records().len(), 2);
        assert_eq!(store.search_query(), "john");
    }

    #[test]
    fn update_preserves_identity() {
        let (mut store, toasts) = store_with(TableFixture::new().with_sample().table);
        let before = store.records()[0].clone();

        let mut changed = before.to_form();
        changed.name = "John Updated".into();
        assert!(store.update(&before.id, changed));

        let after = store.get_by_id(&before.id).unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
        assert_eq!(after.name, "John Updated");
        assert_eq!(store.records()[0], after);
        assert_eq!(last_description(&toasts), "Student updated successfully");
    }

    #[test]
    fn update_may_keep_own_roll_number_but_not_take_another() {
        let (mut store, toasts) = store_with(TableFixture::new().with_sample().table);

        let john = store.records()[0].clone();
        assert!(store.update(&john.id, john.to_form()));

        let mut stolen = john.to_form();
        stolen.roll_no = 102;
        assert!(!store.update(&john.id, stolen));
        assert_eq!(last_description(&toasts), "Roll number must be unique");
        assert_eq!(store.get_by_id(&john.id).unwrap().roll_no, 101);
    }

    #[test]
    fn update_of_unknown_id_fails() {
        let (mut store, toasts) = store_with(TableFixture::new().with_sample().table);
        assert!(!store.update("ghost", form("Ghost", 999)));
        assert_eq!(last_description(&toasts), "Student not found");
    }

    #[test]
    fn update_of_record_removed_behind_our_back_fails() {
        let (mut store, toasts) = store_with(TableFixture::new().with_sample().table);
        store.table().delete("1").unwrap();

        assert!(!store.update("1", form("John Again", 101)));
        assert_eq!(last_description(&toasts), "Failed to update student");
        assert_eq!(store.records().len(), 2);
    }

    #[test]
    fn delete_removes_record() {
        let (mut store, toasts) = store_with(TableFixture::new().with_sample().table);
        assert!(store.delete("1"));
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.filtered_records().len(), 1);
        assert!(store.get_by_id("1").is_none());
        assert_eq!(last_description(&toasts), "Student deleted successfully");
    }

    #[test]
    fn delete_of_nonexistent_id_leaves_records_unchanged() {
        let (mut store, toasts) = store_with(TableFixture::new().with_sample().table);
        let before = store.snapshot();

        assert!(!store.delete("nonexistent-id"));
        assert_eq!(store.records(), before.records.as_slice());
        assert_eq!(last_description(&toasts), "Student not found");
    }

    #[test]
    fn search_filters_persisted_data_and_always_publishes() {
        let (mut store, _) = store_with(TableFixture::new().with_sample().table);
        let published = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&published);
        store.subscribe(move |_| *counter.borrow_mut() += 1);

        store.search("John");
        assert_eq!(store.filtered_records().len(), 1);
        assert_eq!(store.filtered_records()[0].name, "John Doe");
        assert_eq!(store.records().len(), 2);

        store.search("");
        assert_eq!(store.filtered_records().len(), 2);
        store.search("");
        assert_eq!(*published.borrow(), 3);
    }

    #[test]
    fn search_sees_records_written_outside_the_store() {
        let (mut store, _) = empty_store();
        store
            .table()
            .add(&crate::store::memory::fixtures::jane())
            .unwrap();

        store.search("jane");
        assert_eq!(store.filtered_records().len(), 1);
        assert!(store.records().is_empty());
    }

    #[test]
    fn clear_all_resets_state_and_storage() {
        let (mut store, _) = store_with(TableFixture::new().with_sample().table);
        store.search("john");

        assert!(store.clear_all());
        assert!(store.records().is_empty());
        assert!(store.filtered_records().is_empty());
        assert_eq!(store.search_query(), "");
        assert!(!store.loading());
        assert!(store.table().get_all().is_empty());
    }

    #[test]
    fn subscribers_get_every_change_in_order() {
        let (mut store, _) = empty_store();
        let log = Rc::new(RefCell::new(Vec::<String>::new()));

        let first = Rc::clone(&log);
        store.subscribe(move |s| first.borrow_mut().push(format!("a{}", s.records.len())));
        let second = Rc::clone(&log);
        store.subscribe(move |s| second.borrow_mut().push(format!("b{}", s.records.len())));

        store.add(form("One", 1));
        store.add(form("Two", 2));

        assert_eq!(*log.borrow(), vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn failed_commands_do_not_publish() {
        let (mut store, _) = store_with(TableFixture::new().with_sample().table);
        let published = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&published);
        store.subscribe(move |_| *counter.borrow_mut() += 1);

        store.add(form("Dup", 101));
        store.delete("nope");
        store.update("nope", form("Nope", 900));
        assert_eq!(*published.borrow(), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let (mut store, _) = empty_store();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        let id = store.subscribe(move |_| *counter.borrow_mut() += 1);

        store.search("x");
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.search("y");

        assert_eq!(*seen.borrow(), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn subscribe_map_selects_a_single_field() {
        let mut store = RecordStore::new(
            TableFixture::new().with_sample().table,
            ToastQueue::default(),
        );
        let loading = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&loading);
        store.subscribe_map(|s| s.loading, move |l| sink.borrow_mut().push(l));

        let queries = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&queries);
        store.subscribe_map(|s| s.search_query.clone(), move |q| sink.borrow_mut().push(q));

        store.load();
        store.search("jane");

        assert_eq!(*loading.borrow(), vec![false, false]);
        assert_eq!(*queries.borrow(), vec!["".to_string(), "jane".to_string()]);
    }

    #[test]
    fn snapshots_handed_out_stay_frozen() {
        let (mut store, _) = empty_store();
        let before = store.snapshot();
        store.add(form("One", 1));
        assert!(before.records.is_empty());
        assert_eq!(store.snapshot().records.len(), 1);
    }

    #[test]
    fn roll_numbers_stay_unique_across_many_operations() {
        let (mut store, _) = empty_store();
        for roll in [5, 6, 5, 7, 6] {
            store.add(form(&format!("S{}", roll), roll));
        }
        let ids: Vec<String> = store.records().iter().map(|r| r.id.clone()).collect();
        for id in &ids {
            store.update(id, form("Collide", 5));
        }

        let mut rolls: Vec<u32> = store.table().get_all().iter().map(|r| r.roll_no).collect();
        rolls.sort();
        let len = rolls.len();
        rolls.dedup();
        assert_eq!(rolls.len(), len);
        assert_eq!(len, 3);
    }
}
