// In-memory store for tests
//
// Implements every store port over one shared state with failure injection,
// so sweep tests can exercise per-item error isolation and fatal read errors
// without a database.

use crate::domain::{
    HistoryFilter, HistoryId, HistoryRecord, Item, ItemId, ItemStatus, MiteScore, Order, OrderId,
    OrderStatus, UserId,
};
use crate::error::{AppError, Result};
use crate::port::{
    DryingTransaction, HistoryLedger, ItemStore, OrderStore, TimeProvider, Transaction,
    TransactionalDryingStore,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    items: HashMap<ItemId, Item>,
    orders: HashMap<OrderId, Order>,
    histories: Vec<HistoryRecord>, // insertion order
}

#[derive(Default)]
struct Failures {
    reads: AtomicBool,
    item_writes: Mutex<HashSet<ItemId>>,
    score_writes: Mutex<HashSet<ItemId>>,
    history_writes: Mutex<HashSet<HistoryId>>,
}

impl Failures {
    fn check_read(&self) -> Result<()> {
        if self.reads.load(Ordering::SeqCst) {
            return Err(AppError::Database("store unreachable".to_string()));
        }
        Ok(())
    }

    fn check_item_write(&self, id: &ItemId) -> Result<()> {
        if self.item_writes.lock().unwrap().contains(id) {
            return Err(AppError::Database(format!("write rejected for item {}", id)));
        }
        Ok(())
    }

    fn check_score_write(&self, id: &ItemId) -> Result<()> {
        if self.score_writes.lock().unwrap().contains(id) {
            return Err(AppError::Database(format!("score write rejected for item {}", id)));
        }
        Ok(())
    }

    fn check_history_write(&self, id: &HistoryId) -> Result<()> {
        if self.history_writes.lock().unwrap().contains(id) {
            return Err(AppError::Database(format!("write rejected for history {}", id)));
        }
        Ok(())
    }
}

/// In-memory implementation of all store ports
#[derive(Clone)]
pub struct InMemoryDryingStore {
    state: Arc<Mutex<MemoryState>>,
    failures: Arc<Failures>,
    time_provider: Arc<dyn TimeProvider>,
}

impl InMemoryDryingStore {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            failures: Arc::new(Failures::default()),
            time_provider,
        }
    }

    /// Every select fails with a database error
    pub fn fail_reads(&self, fail: bool) {
        self.failures.reads.store(fail, Ordering::SeqCst);
    }

    /// Status transitions of this item fail
    pub fn fail_item_writes(&self, id: &str) {
        self.failures.item_writes.lock().unwrap().insert(id.to_string());
    }

    /// Score writes of this item fail
    pub fn fail_score_writes(&self, id: &str) {
        self.failures.score_writes.lock().unwrap().insert(id.to_string());
    }

    /// Completing this history record fails
    pub fn fail_history_writes(&self, id: &str) {
        self.failures.history_writes.lock().unwrap().insert(id.to_string());
    }

    /// Lift every injected failure
    pub fn clear_failures(&self) {
        self.fail_reads(false);
        self.failures.item_writes.lock().unwrap().clear();
        self.failures.score_writes.lock().unwrap().clear();
        self.failures.history_writes.lock().unwrap().clear();
    }

    pub fn item(&self, id: &str) -> Option<Item> {
        self.state.lock().unwrap().items.get(id).cloned()
    }

    pub fn order(&self, id: &str) -> Option<Order> {
        self.state.lock().unwrap().orders.get(id).cloned()
    }

    pub fn history(&self, id: &str) -> Option<HistoryRecord> {
        let state = self.state.lock().unwrap();
        state.histories.iter().find(|r| r.id == id).cloned()
    }

    pub fn histories_for(&self, item_id: &str) -> Vec<HistoryRecord> {
        let state = self.state.lock().unwrap();
        state
            .histories
            .iter()
            .filter(|r| r.item_id == item_id)
            .cloned()
            .collect()
    }
}

// State-level operations shared by the store and its transactions

fn transition_item(
    state: &mut MemoryState,
    id: &ItemId,
    expected: ItemStatus,
    next: ItemStatus,
    now: i64,
) -> bool {
    match state.items.get_mut(id) {
        Some(item) if item.status == expected => {
            item.status = next;
            item.updated_at = now;
            true
        }
        _ => false,
    }
}

fn set_score(state: &mut MemoryState, id: &ItemId, score: MiteScore, now: i64) -> Result<()> {
    let item = state
        .items
        .get_mut(id)
        .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))?;
    item.mite_score = score;
    item.updated_at = now;
    Ok(())
}

fn transition_order(
    state: &mut MemoryState,
    id: &OrderId,
    expected: OrderStatus,
    next: OrderStatus,
    now: i64,
) -> bool {
    match state.orders.get_mut(id) {
        Some(order) if order.status == expected && !expected.is_terminal() => {
            order.status = next;
            order.updated_at = now;
            true
        }
        _ => false,
    }
}

fn delete_incomplete(state: &mut MemoryState, item_id: &ItemId) -> u64 {
    let before = state.histories.len();
    state
        .histories
        .retain(|r| !(&r.item_id == item_id && !r.completed));
    (before - state.histories.len()) as u64
}

fn complete_history(state: &mut MemoryState, id: &HistoryId) -> bool {
    match state.histories.iter_mut().find(|r| &r.id == id) {
        Some(record) if !record.completed => {
            record.completed = true;
            true
        }
        _ => false,
    }
}

fn active_order(state: &MemoryState, item_id: &ItemId) -> Option<Order> {
    state
        .orders
        .values()
        .find(|o| &o.item_id == item_id && o.is_active())
        .cloned()
}

#[async_trait]
impl ItemStore for InMemoryDryingStore {
    async fn insert(&self, item: &Item) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.items.contains_key(&item.id) {
            return Err(AppError::Conflict(format!("Item {} exists", item.id)));
        }
        state.items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>> {
        self.failures.check_read()?;
        Ok(self.state.lock().unwrap().items.get(id).cloned())
    }

    async fn select_by_status(&self, statuses: &[ItemStatus]) -> Result<Vec<Item>> {
        self.failures.check_read()?;
        let state = self.state.lock().unwrap();
        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|item| statuses.contains(&item.status))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn transition_status(
        &self,
        id: &ItemId,
        expected: ItemStatus,
        next: ItemStatus,
    ) -> Result<bool> {
        self.failures.check_item_write(id)?;
        let now = self.time_provider.now_millis();
        let mut state = self.state.lock().unwrap();
        Ok(transition_item(&mut state, id, expected, next, now))
    }

    async fn update_mite_score(&self, id: &ItemId, score: MiteScore) -> Result<()> {
        self.failures.check_score_write(id)?;
        let now = self.time_provider.now_millis();
        let mut state = self.state.lock().unwrap();
        set_score(&mut state, id, score, now)
    }

    async fn count_by_status(&self, status: ItemStatus) -> Result<i64> {
        self.failures.check_read()?;
        let state = self.state.lock().unwrap();
        Ok(state.items.values().filter(|i| i.status == status).count() as i64)
    }
}

#[async_trait]
impl OrderStore for InMemoryDryingStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>> {
        self.failures.check_read()?;
        Ok(self.state.lock().unwrap().orders.get(id).cloned())
    }

    async fn select_pending_for_items(&self, item_ids: &[ItemId]) -> Result<Vec<Order>> {
        self.failures.check_read()?;
        let state = self.state.lock().unwrap();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::Pending && item_ids.contains(&o.item_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    async fn find_active_for_item(&self, item_id: &ItemId) -> Result<Option<Order>> {
        self.failures.check_read()?;
        Ok(active_order(&self.state.lock().unwrap(), item_id))
    }

    async fn transition_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool> {
        let now = self.time_provider.now_millis();
        let mut state = self.state.lock().unwrap();
        Ok(transition_order(&mut state, id, expected, next, now))
    }

    async fn accept(&self, id: &OrderId, service_user_id: &UserId) -> Result<bool> {
        let now = self.time_provider.now_millis();
        let mut state = self.state.lock().unwrap();
        match state.orders.get_mut(id) {
            Some(order) if order.status == OrderStatus::Pending => {
                order.status = OrderStatus::Accepted;
                order.service_user_id = Some(service_user_id.clone());
                order.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn count_active(&self) -> Result<i64> {
        self.failures.check_read()?;
        let state = self.state.lock().unwrap();
        Ok(state.orders.values().filter(|o| o.is_active()).count() as i64)
    }
}

#[async_trait]
impl HistoryLedger for InMemoryDryingStore {
    async fn insert(&self, record: &HistoryRecord) -> Result<()> {
        self.state.lock().unwrap().histories.push(record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &HistoryId) -> Result<Option<HistoryRecord>> {
        self.failures.check_read()?;
        Ok(self.history(id))
    }

    async fn select_latest_for_items(
        &self,
        item_ids: &[ItemId],
        filter: HistoryFilter,
    ) -> Result<Vec<HistoryRecord>> {
        self.failures.check_read()?;
        let state = self.state.lock().unwrap();
        // Newest insertion first on equal timestamps, like `ORDER BY created_at DESC, rowid DESC`
        let mut records: Vec<HistoryRecord> = state
            .histories
            .iter()
            .rev()
            .filter(|r| item_ids.contains(&r.item_id) && filter.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn mark_completed(&self, id: &HistoryId) -> Result<bool> {
        self.failures.check_history_write(id)?;
        Ok(complete_history(&mut self.state.lock().unwrap(), id))
    }

    async fn delete_incomplete_for_item(&self, item_id: &ItemId) -> Result<u64> {
        Ok(delete_incomplete(&mut self.state.lock().unwrap(), item_id))
    }
}

#[async_trait]
impl TransactionalDryingStore for InMemoryDryingStore {
    async fn begin_transaction(&self) -> Result<Box<dyn DryingTransaction>> {
        let working = self.state.lock().unwrap().clone();
        Ok(Box::new(InMemoryTransaction {
            shared: Arc::clone(&self.state),
            failures: Arc::clone(&self.failures),
            time_provider: Arc::clone(&self.time_provider),
            working,
        }))
    }
}

/// Copy-on-begin transaction; commit replaces the shared state
pub struct InMemoryTransaction {
    shared: Arc<Mutex<MemoryState>>,
    failures: Arc<Failures>,
    time_provider: Arc<dyn TimeProvider>,
    working: MemoryState,
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        *self.shared.lock().unwrap() = self.working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl DryingTransaction for InMemoryTransaction {
    async fn find_item(&mut self, id: &ItemId) -> Result<Option<Item>> {
        self.failures.check_read()?;
        Ok(self.working.items.get(id).cloned())
    }

    async fn find_order(&mut self, id: &OrderId) -> Result<Option<Order>> {
        self.failures.check_read()?;
        Ok(self.working.orders.get(id).cloned())
    }

    async fn find_active_order_for_item(&mut self, item_id: &ItemId) -> Result<Option<Order>> {
        self.failures.check_read()?;
        Ok(active_order(&self.working, item_id))
    }

    async fn find_history(&mut self, id: &HistoryId) -> Result<Option<HistoryRecord>> {
        self.failures.check_read()?;
        Ok(self.working.histories.iter().find(|r| &r.id == id).cloned())
    }

    async fn insert_history(&mut self, record: &HistoryRecord) -> Result<()> {
        self.working.histories.push(record.clone());
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.working.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn transition_item(
        &mut self,
        id: &ItemId,
        expected: ItemStatus,
        next: ItemStatus,
    ) -> Result<bool> {
        self.failures.check_item_write(id)?;
        let now = self.time_provider.now_millis();
        Ok(transition_item(&mut self.working, id, expected, next, now))
    }

    async fn transition_order(
        &mut self,
        id: &OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool> {
        let now = self.time_provider.now_millis();
        Ok(transition_order(&mut self.working, id, expected, next, now))
    }

    async fn update_mite_score(&mut self, id: &ItemId, score: MiteScore) -> Result<()> {
        self.failures.check_score_write(id)?;
        let now = self.time_provider.now_millis();
        set_score(&mut self.working, id, score, now)
    }

    async fn complete_order(&mut self, id: &OrderId) -> Result<bool> {
        let now = self.time_provider.now_millis();
        match self.working.orders.get_mut(id) {
            Some(order) if order.is_active() => {
                order.status = OrderStatus::Completed;
                order.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_history_completed(&mut self, id: &HistoryId) -> Result<bool> {
        self.failures.check_history_write(id)?;
        Ok(complete_history(&mut self.working, id))
    }

    async fn delete_incomplete_histories(&mut self, item_id: &ItemId) -> Result<u64> {
        Ok(delete_incomplete(&mut self.working, item_id))
    }
}
