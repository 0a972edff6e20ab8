use std::cell::Cell;
use std::sync::{Mutex, Weak};

use uuid::Uuid;

use crate::models::category::Category;
use crate::models::holding::Holding;
use crate::models::portfolio::Portfolio;
use crate::models::settings::Settings;
use crate::models::ticker_memory::TickerMemory;

use super::records::{Collection, CollectionSet, RecordStore, StoreData, StoreInner};

/// Read-only view handed to a live query function.
///
/// Every accessor records the collection it reads, so the store knows
/// which mutations can affect the query's result. A query that
/// branches may touch different collections on different runs; the
/// dependency set is refreshed on every evaluation.
pub struct QueryCtx<'a> {
    data: &'a StoreData,
    touched: Cell<CollectionSet>,
}

impl<'a> QueryCtx<'a> {
    pub(crate) fn new(data: &'a StoreData) -> Self {
        Self {
            data,
            touched: Cell::new(CollectionSet::new()),
        }
    }

    pub(crate) fn touched(&self) -> CollectionSet {
        self.touched.get()
    }

    fn touch(&self, collection: Collection) {
        let mut set = self.touched.get();
        set.insert(collection);
        self.touched.set(set);
    }

    pub fn portfolios(&self) -> &[Portfolio] {
        self.touch(Collection::Portfolios);
        &self.data.portfolios
    }

    pub fn holdings(&self) -> &[Holding] {
        self.touch(Collection::Holdings);
        &self.data.holdings
    }

    pub fn categories(&self) -> &[Category] {
        self.touch(Collection::Categories);
        &self.data.categories
    }

    pub fn ticker_memories(&self) -> &[TickerMemory] {
        self.touch(Collection::TickerMemory);
        &self.data.ticker_memory
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.touch(Collection::Settings);
        self.data.settings.as_ref()
    }

    /// Equality lookup over the `portfolio_id` index, cloned out.
    pub fn holdings_for_portfolio(&self, portfolio_id: Uuid) -> Vec<Holding> {
        self.holdings()
            .iter()
            .filter(|h| h.portfolio_id == portfolio_id)
            .cloned()
            .collect()
    }

    /// Any-of-set lookup over the `portfolio_id` index, cloned out.
    pub fn holdings_for_portfolios(&self, portfolio_ids: &[Uuid]) -> Vec<Holding> {
        self.holdings()
            .iter()
            .filter(|h| portfolio_ids.contains(&h.portfolio_id))
            .cloned()
            .collect()
    }
}

/// A registered live query. Each subscriber keeps the query, change
/// callback, and previous result inside `rerun`; running it returns
/// the query's refreshed dependency set.
pub(crate) struct Subscriber {
    pub(crate) id: u64,
    pub(crate) deps: CollectionSet,
    pub(crate) rerun: Box<dyn FnMut(&StoreData) -> CollectionSet + Send>,
}

/// Handle for an active subscription. Dropping it (or calling
/// [`unsubscribe`](LiveQuery::unsubscribe)) detaches the query
/// synchronously; no delivery can happen afterwards.
///
/// Must not be dropped from inside a notification callback — the
/// store lock is held during delivery.
pub struct LiveQuery {
    id: u64,
    store: Weak<Mutex<StoreInner>>,
}

impl LiveQuery {
    /// Explicitly end the subscription. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    fn detach(&self) {
        if let Some(inner) = self.store.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.subscribers.retain(|s| s.id != self.id);
        }
    }
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        self.detach();
    }
}

impl RecordStore {
    /// Register a live query.
    ///
    /// `query` runs immediately against the current snapshot and its
    /// result is returned. After every committed mutation touching a
    /// collection the query reads, it re-runs; `on_change` fires with
    /// the new result whenever it differs from the previous one.
    /// Unrelated mutations may recompute the query but never notify.
    ///
    /// Delivery order is commit order. `query` and `on_change` must
    /// not call back into the store.
    pub fn subscribe<T, Q, F>(&self, query: Q, mut on_change: F) -> (T, LiveQuery)
    where
        T: Clone + PartialEq + Send + 'static,
        Q: Fn(&QueryCtx<'_>) -> T + Send + 'static,
        F: FnMut(&T) + Send + 'static,
    {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let ctx = QueryCtx::new(&inner.data);
        let initial = query(&ctx);
        let deps = ctx.touched();

        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;

        let mut last = initial.clone();
        inner.subscribers.push(Subscriber {
            id,
            deps,
            rerun: Box::new(move |data| {
                let ctx = QueryCtx::new(data);
                let value = query(&ctx);
                let deps = ctx.touched();
                if value != last {
                    on_change(&value);
                    last = value;
                }
                deps
            }),
        });

        (
            initial,
            LiveQuery {
                id,
                store: std::sync::Arc::downgrade(&self.inner),
            },
        )
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}
