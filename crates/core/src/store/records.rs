use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CoreError, RecordKind};
use crate::models::category::{Category, DEFAULT_CATEGORIES};
use crate::models::holding::{Holding, HoldingChanges};
use crate::models::portfolio::Portfolio;
use crate::models::settings::Settings;
use crate::models::ticker_memory::TickerMemory;

use super::live::Subscriber;

/// One of the five persisted collections. Mutations report which
/// collections they touched; live queries record which they read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Portfolios,
    Holdings,
    Categories,
    TickerMemory,
    Settings,
}

impl Collection {
    fn bit(self) -> u8 {
        match self {
            Collection::Portfolios => 1 << 0,
            Collection::Holdings => 1 << 1,
            Collection::Categories => 1 << 2,
            Collection::TickerMemory => 1 << 3,
            Collection::Settings => 1 << 4,
        }
    }
}

/// A small set of collections, used for dependency tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CollectionSet(u8);

impl CollectionSet {
    pub(crate) fn new() -> Self {
        Self(0)
    }

    pub(crate) fn of(collections: &[Collection]) -> Self {
        let mut set = Self::new();
        for c in collections {
            set.insert(*c);
        }
        set
    }

    pub(crate) fn insert(&mut self, collection: Collection) {
        self.0 |= collection.bit();
    }

    pub(crate) fn intersects(&self, other: CollectionSet) -> bool {
        self.0 & other.0 != 0
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// The serialized state of the store: the five collections from the
/// schema. Everything in here gets bincode-encoded, encrypted, and
/// written out as the portable .ptrk file.
///
/// Collections are Vecs so queries come back in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    pub(crate) portfolios: Vec<Portfolio>,
    pub(crate) holdings: Vec<Holding>,
    pub(crate) categories: Vec<Category>,
    pub(crate) ticker_memory: Vec<TickerMemory>,
    /// Singleton — `None` only before first-run seeding
    pub(crate) settings: Option<Settings>,
}

pub(crate) struct StoreInner {
    pub(crate) data: StoreData,
    pub(crate) subscribers: Vec<Subscriber>,
    pub(crate) next_subscriber_id: u64,
    pub(crate) dirty: bool,
}

/// Durable, schema-enforced storage for the five entity kinds.
///
/// Cloneable handle over shared state. A single mutex serializes all
/// mutations, so composite operations (cascade portfolio delete,
/// category delete with reassignment) are indivisible to every reader
/// and subscriber. Reads take the same lock and copy out, so a read
/// never observes a half-applied composite.
#[derive(Clone)]
pub struct RecordStore {
    pub(crate) inner: Arc<Mutex<StoreInner>>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("RecordStore")
            .field("portfolios", &inner.data.portfolios.len())
            .field("holdings", &inner.data.holdings.len())
            .field("categories", &inner.data.categories.len())
            .field("ticker_memory", &inner.data.ticker_memory.len())
            .field("initialized", &inner.data.settings.is_some())
            .field("subscribers", &inner.subscribers.len())
            .field("dirty", &inner.dirty)
            .finish()
    }
}

impl RecordStore {
    /// Create an empty, unseeded store. Call [`initialize`](Self::initialize)
    /// to seed settings and default categories.
    #[must_use]
    pub fn new() -> Self {
        Self::from_data(StoreData::default())
    }

    /// Wrap existing data (e.g., loaded from disk) in a store handle.
    pub(crate) fn from_data(data: StoreData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                data,
                subscribers: Vec::new(),
                next_subscriber_id: 0,
                dirty: false,
            })),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // A panic mid-commit leaves data consistent (composite ops swap
        // a fully-built clone in), so a poisoned lock is recoverable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run a read against the current snapshot.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&StoreData) -> R) -> R {
        f(&self.lock().data)
    }

    /// Commit a mutation that cannot fail. Marks the store dirty and
    /// re-runs affected live queries before returning.
    pub(crate) fn commit<R>(
        &self,
        op: impl FnOnce(&mut StoreData) -> (R, CollectionSet),
    ) -> R {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let (out, touched) = op(&mut inner.data);
        Self::after_commit(inner, touched);
        out
    }

    /// Commit a fallible mutation. On error nothing is applied, the
    /// dirty flag is untouched, and no subscriber is notified.
    pub(crate) fn try_commit<R>(
        &self,
        op: impl FnOnce(&mut StoreData) -> Result<(R, CollectionSet), CoreError>,
    ) -> Result<R, CoreError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let (out, touched) = op(&mut inner.data)?;
        Self::after_commit(inner, touched);
        Ok(out)
    }

    fn after_commit(inner: &mut StoreInner, touched: CollectionSet) {
        if touched.is_empty() {
            return;
        }
        inner.dirty = true;
        // Deliver synchronously, in commit order, while the lock is
        // held. Callbacks receive the computed value only and must not
        // re-enter the store.
        let data = &inner.data;
        for sub in &mut inner.subscribers {
            if sub.deps.intersects(touched) {
                sub.deps = (sub.rerun)(data);
            }
        }
    }

    // ── Initialization ──────────────────────────────────────────────

    /// Seed the store on first run: exactly one settings record and
    /// the fixed default-category list. Idempotent — a seeded store is
    /// left untouched, with no duplicate categories and no overwritten
    /// settings.
    pub fn initialize(&self) {
        self.commit(|data| {
            let mut touched = CollectionSet::new();
            if data.settings.is_none() {
                data.settings = Some(Settings::default());
                touched.insert(Collection::Settings);
            }
            if data.categories.is_empty() {
                for (name, color) in DEFAULT_CATEGORIES {
                    data.categories.push(Category::new(name, color, true));
                }
                touched.insert(Collection::Categories);
            }
            ((), touched)
        });
    }

    // ── Portfolios ──────────────────────────────────────────────────

    pub fn get_portfolio(&self, id: Uuid) -> Option<Portfolio> {
        self.read(|d| d.portfolios.iter().find(|p| p.id == id).cloned())
    }

    pub fn portfolios(&self) -> Vec<Portfolio> {
        self.read(|d| d.portfolios.clone())
    }

    pub fn insert_portfolio(&self, portfolio: Portfolio) {
        self.commit(|data| {
            data.portfolios.push(portfolio);
            ((), CollectionSet::of(&[Collection::Portfolios]))
        });
    }

    /// Rename a portfolio. The name is taken as given — the entry
    /// point has already trimmed and checked it.
    pub fn rename_portfolio(&self, id: Uuid, name: String) -> Result<Portfolio, CoreError> {
        self.try_commit(|data| {
            let portfolio = data
                .portfolios
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| CoreError::NotFound {
                    kind: RecordKind::Portfolio,
                    id: id.to_string(),
                })?;
            portfolio.name = name;
            portfolio.updated_at = Utc::now();
            Ok((
                portfolio.clone(),
                CollectionSet::of(&[Collection::Portfolios]),
            ))
        })
    }

    /// Atomic composite: delete every holding owned by the portfolio,
    /// then the portfolio itself. Either everything applies or nothing
    /// does; readers never see the half-deleted state.
    pub fn delete_portfolio(&self, id: Uuid) -> Result<(), CoreError> {
        self.try_commit(|data| {
            if !data.portfolios.iter().any(|p| p.id == id) {
                return Err(CoreError::NotFound {
                    kind: RecordKind::Portfolio,
                    id: id.to_string(),
                });
            }

            // Build the post-delete state on a clone, then swap it in.
            let mut next = data.clone();
            let before = next.holdings.len();
            next.holdings.retain(|h| h.portfolio_id != id);
            next.portfolios.retain(|p| p.id != id);

            let mut touched = CollectionSet::of(&[Collection::Portfolios]);
            if next.holdings.len() != before {
                touched.insert(Collection::Holdings);
            }
            *data = next;
            Ok(((), touched))
        })
    }

    // ── Holdings ────────────────────────────────────────────────────

    pub fn get_holding(&self, id: Uuid) -> Option<Holding> {
        self.read(|d| d.holdings.iter().find(|h| h.id == id).cloned())
    }

    pub fn holdings(&self) -> Vec<Holding> {
        self.read(|d| d.holdings.clone())
    }

    pub fn holdings_for_portfolio(&self, portfolio_id: Uuid) -> Vec<Holding> {
        self.read(|d| {
            d.holdings
                .iter()
                .filter(|h| h.portfolio_id == portfolio_id)
                .cloned()
                .collect()
        })
    }

    /// Any-of-set lookup over the `portfolio_id` index.
    pub fn holdings_for_portfolios(&self, portfolio_ids: &[Uuid]) -> Vec<Holding> {
        self.read(|d| {
            d.holdings
                .iter()
                .filter(|h| portfolio_ids.contains(&h.portfolio_id))
                .cloned()
                .collect()
        })
    }

    pub fn holdings_for_category(&self, category_id: Uuid) -> Vec<Holding> {
        self.read(|d| {
            d.holdings
                .iter()
                .filter(|h| h.category_id == category_id)
                .cloned()
                .collect()
        })
    }

    pub fn holdings_for_ticker(&self, ticker: &str) -> Vec<Holding> {
        let ticker = ticker.trim().to_uppercase();
        self.read(|d| {
            d.holdings
                .iter()
                .filter(|h| h.ticker == ticker)
                .cloned()
                .collect()
        })
    }

    /// Insert a holding. Both references are checked against live rows
    /// before anything is written; the ticker-category memory is
    /// updated in the same commit.
    pub fn insert_holding(&self, holding: Holding) -> Result<(), CoreError> {
        self.try_commit(|data| {
            Self::check_references(data, holding.portfolio_id, holding.category_id)?;
            upsert_memory(data, &holding.ticker, holding.category_id);
            data.holdings.push(holding);
            Ok((
                (),
                CollectionSet::of(&[Collection::Holdings, Collection::TickerMemory]),
            ))
        })
    }

    /// Apply partial changes to a holding. A category change is
    /// validated against live rows first and recorded in ticker memory
    /// within the same commit.
    pub fn update_holding(&self, id: Uuid, changes: HoldingChanges) -> Result<Holding, CoreError> {
        self.try_commit(|data| {
            let idx = data
                .holdings
                .iter()
                .position(|h| h.id == id)
                .ok_or_else(|| CoreError::NotFound {
                    kind: RecordKind::Holding,
                    id: id.to_string(),
                })?;

            if let Some(category_id) = changes.category_id {
                if !data.categories.iter().any(|c| c.id == category_id) {
                    return Err(CoreError::DanglingReference {
                        field: "category_id",
                        id: category_id.to_string(),
                    });
                }
            }

            let mut touched = CollectionSet::of(&[Collection::Holdings]);
            let holding = &mut data.holdings[idx];
            if let Some(ticker) = changes.ticker {
                holding.ticker = ticker;
            }
            if let Some(quantity) = changes.quantity {
                holding.quantity = quantity;
            }
            if let Some(avg_cost) = changes.avg_cost {
                holding.avg_cost = avg_cost;
            }
            if let Some(currency) = changes.currency {
                holding.currency = currency;
            }
            if let Some(category_id) = changes.category_id {
                holding.category_id = category_id;
            }
            holding.updated_at = Utc::now();
            let updated = holding.clone();

            if changes.category_id.is_some() {
                upsert_memory(data, &updated.ticker, updated.category_id);
                touched.insert(Collection::TickerMemory);
            }

            Ok((updated, touched))
        })
    }

    pub fn delete_holding(&self, id: Uuid) -> Result<(), CoreError> {
        self.try_commit(|data| {
            let idx = data
                .holdings
                .iter()
                .position(|h| h.id == id)
                .ok_or_else(|| CoreError::NotFound {
                    kind: RecordKind::Holding,
                    id: id.to_string(),
                })?;
            data.holdings.remove(idx);
            Ok(((), CollectionSet::of(&[Collection::Holdings])))
        })
    }

    fn check_references(
        data: &StoreData,
        portfolio_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), CoreError> {
        if !data.portfolios.iter().any(|p| p.id == portfolio_id) {
            return Err(CoreError::DanglingReference {
                field: "portfolio_id",
                id: portfolio_id.to_string(),
            });
        }
        if !data.categories.iter().any(|c| c.id == category_id) {
            return Err(CoreError::DanglingReference {
                field: "category_id",
                id: category_id.to_string(),
            });
        }
        Ok(())
    }

    // ── Categories ──────────────────────────────────────────────────

    pub fn get_category(&self, id: Uuid) -> Option<Category> {
        self.read(|d| d.categories.iter().find(|c| c.id == id).cloned())
    }

    pub fn categories(&self) -> Vec<Category> {
        self.read(|d| d.categories.clone())
    }

    /// Equality lookup over the `is_default` index.
    pub fn categories_by_default(&self, is_default: bool) -> Vec<Category> {
        self.read(|d| {
            d.categories
                .iter()
                .filter(|c| c.is_default == is_default)
                .cloned()
                .collect()
        })
    }

    /// Case-insensitive lookup over the `name` index.
    pub fn category_by_name(&self, name: &str) -> Option<Category> {
        let needle = name.trim().to_lowercase();
        self.read(|d| {
            d.categories
                .iter()
                .find(|c| c.name.to_lowercase() == needle)
                .cloned()
        })
    }

    pub fn insert_category(&self, category: Category) {
        self.commit(|data| {
            data.categories.push(category);
            ((), CollectionSet::of(&[Collection::Categories]))
        });
    }

    pub fn update_category(
        &self,
        id: Uuid,
        name: Option<String>,
        color: Option<String>,
    ) -> Result<Category, CoreError> {
        self.try_commit(|data| {
            let category = data
                .categories
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| CoreError::NotFound {
                    kind: RecordKind::Category,
                    id: id.to_string(),
                })?;
            if let Some(name) = name {
                category.name = name;
            }
            if let Some(color) = color {
                category.color = color;
            }
            Ok((
                category.clone(),
                CollectionSet::of(&[Collection::Categories]),
            ))
        })
    }

    /// Atomic composite: refuse to delete a default category; otherwise
    /// reassign every holding referencing it to the fallback default
    /// (lowest name, ties broken by id) and delete it, as one unit.
    pub fn delete_category(&self, id: Uuid) -> Result<(), CoreError> {
        self.try_commit(|data| {
            let category = data
                .categories
                .iter()
                .find(|c| c.id == id)
                .ok_or_else(|| CoreError::NotFound {
                    kind: RecordKind::Category,
                    id: id.to_string(),
                })?;
            if category.is_default {
                return Err(CoreError::ProtectedEntity(format!(
                    "default category '{}'",
                    category.name
                )));
            }

            let fallback = data
                .categories
                .iter()
                .filter(|c| c.is_default)
                .min_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)))
                .map(|c| c.id)
                .ok_or_else(|| {
                    CoreError::InvariantViolation(
                        "no default category available to reassign holdings to".into(),
                    )
                })?;

            let mut next = data.clone();
            let mut touched = CollectionSet::of(&[Collection::Categories]);
            let now = Utc::now();
            for holding in next.holdings.iter_mut().filter(|h| h.category_id == id) {
                holding.category_id = fallback;
                holding.updated_at = now;
                touched.insert(Collection::Holdings);
            }
            next.categories.retain(|c| c.id != id);
            *data = next;
            Ok(((), touched))
        })
    }

    // ── Ticker-Category Memory ──────────────────────────────────────

    pub fn ticker_memory(&self, ticker: &str) -> Option<TickerMemory> {
        let ticker = ticker.trim().to_uppercase();
        self.read(|d| d.ticker_memory.iter().find(|m| m.ticker == ticker).cloned())
    }

    pub fn ticker_memories(&self) -> Vec<TickerMemory> {
        self.read(|d| d.ticker_memory.clone())
    }

    /// Upsert; always overwrites a prior entry for the same ticker.
    pub fn remember_ticker(&self, ticker: &str, category_id: Uuid) {
        let ticker = ticker.trim().to_uppercase();
        self.commit(|data| {
            upsert_memory(data, &ticker, category_id);
            ((), CollectionSet::of(&[Collection::TickerMemory]))
        });
    }

    /// Drop the memory entry for a ticker. Returns whether one existed.
    pub fn forget_ticker(&self, ticker: &str) -> bool {
        let ticker = ticker.trim().to_uppercase();
        self.commit(|data| {
            let before = data.ticker_memory.len();
            data.ticker_memory.retain(|m| m.ticker != ticker);
            let removed = data.ticker_memory.len() != before;
            let touched = if removed {
                CollectionSet::of(&[Collection::TickerMemory])
            } else {
                CollectionSet::new()
            };
            (removed, touched)
        })
    }

    pub fn clear_ticker_memory(&self) {
        self.commit(|data| {
            let touched = if data.ticker_memory.is_empty() {
                CollectionSet::new()
            } else {
                CollectionSet::of(&[Collection::TickerMemory])
            };
            data.ticker_memory.clear();
            ((), touched)
        });
    }

    // ── Settings ────────────────────────────────────────────────────

    /// The singleton settings record. Absent only on an unseeded store.
    pub fn settings(&self) -> Result<Settings, CoreError> {
        self.read(|d| {
            d.settings.clone().ok_or_else(|| CoreError::NotFound {
                kind: RecordKind::Settings,
                id: "settings".into(),
            })
        })
    }

    pub fn update_settings(
        &self,
        f: impl FnOnce(&mut Settings),
    ) -> Result<Settings, CoreError> {
        self.try_commit(|data| {
            let settings = data.settings.as_mut().ok_or_else(|| CoreError::NotFound {
                kind: RecordKind::Settings,
                id: "settings".into(),
            })?;
            f(settings);
            Ok((settings.clone(), CollectionSet::of(&[Collection::Settings])))
        })
    }

    // ── Persistence hooks ───────────────────────────────────────────

    /// Snapshot of the full state, for serialization.
    pub(crate) fn data_snapshot(&self) -> StoreData {
        self.read(Clone::clone)
    }

    /// `true` if any mutation committed since the last save or load.
    pub fn has_unsaved_changes(&self) -> bool {
        self.lock().dirty
    }

    pub fn mark_saved(&self) {
        self.lock().dirty = false;
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Last-write-wins upsert into the ticker-memory collection.
/// The ticker is assumed normalized by the caller.
fn upsert_memory(data: &mut StoreData, ticker: &str, category_id: Uuid) {
    if let Some(entry) = data.ticker_memory.iter_mut().find(|m| m.ticker == ticker) {
        entry.category_id = category_id;
    } else {
        data.ticker_memory.push(TickerMemory {
            ticker: ticker.to_string(),
            category_id,
        });
    }
}
