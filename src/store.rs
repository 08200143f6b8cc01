//! Listing store: one repository read per cache lifetime, filtered in memory.
//!
//! Filtering by type is a plain equality predicate over the cached array.
//! The single `get_all` read path is deliberate: pushing a type filter plus
//! ordering into the backend would demand a compound index there, and the
//! data set is small enough to narrow on this side.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Category, Item, ItemStatus, ItemType};
use crate::repositories::item_repository::ItemRepository;

/// Cache slot holding the most recent full listing set. Explicit state
/// passed into the store rather than a hidden module-level variable, so
/// tests can run against independent caches.
#[derive(Clone, Debug, Default)]
pub struct ItemCache {
    slot: Arc<Mutex<Option<Arc<Vec<Item>>>>>,
}

impl ItemCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self) -> Option<Arc<Vec<Item>>> {
        self.slot.lock().expect("item cache poisoned").clone()
    }

    fn fill(&self, items: Vec<Item>) -> Arc<Vec<Item>> {
        let items = Arc::new(items);
        *self.slot.lock().expect("item cache poisoned") = Some(items.clone());
        items
    }

    /// Empty the slot so the next read goes back to the repository.
    pub fn clear(&self) {
        *self.slot.lock().expect("item cache poisoned") = None;
    }
}

/// Read-through accessor over the listing repository.
#[derive(Clone)]
pub struct ItemStore {
    repo: Arc<dyn ItemRepository>,
    cache: ItemCache,
    degraded: Arc<AtomicBool>,
}

impl ItemStore {
    pub fn new(repo: Arc<dyn ItemRepository>) -> Self {
        Self {
            repo,
            cache: ItemCache::new(),
            degraded: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn repository(&self) -> &Arc<dyn ItemRepository> {
        &self.repo
    }

    /// Full ordered listing set, optionally restricted to one type. Serves
    /// the cache when filled; otherwise performs one repository read. A
    /// failed read degrades to the built-in demo set instead of surfacing an
    /// error, so the board is never empty.
    pub async fn fetch_items(&self, type_filter: Option<ItemType>) -> Vec<Item> {
        let all = self.all_items().await;
        match type_filter {
            Some(wanted) => all
                .iter()
                .filter(|item| item.item_type == wanted)
                .cloned()
                .collect(),
            None => all.as_ref().clone(),
        }
    }

    async fn all_items(&self) -> Arc<Vec<Item>> {
        if let Some(cached) = self.cache.get() {
            return cached;
        }
        match self.repo.get_all().await {
            Ok(items) => {
                info!(count = items.len(), "loaded items from repository");
                self.degraded.store(false, Ordering::Relaxed);
                self.cache.fill(items)
            }
            Err(error) => {
                warn!(error = %error, "item fetch failed, serving demo data");
                self.degraded.store(true, Ordering::Relaxed);
                self.cache.fill(demo_items())
            }
        }
    }

    /// Invalidate the cache. Must be called after any successful
    /// create/update/delete so the next read observes fresh data.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    /// True when the last fill came from the demo fallback rather than the
    /// repository. A genuinely empty result set is not degraded.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }
}

fn demo_item(
    n: u128,
    item_type: ItemType,
    title: &str,
    category: Category,
    description: &str,
    location: &str,
    date: NaiveDate,
    email: &str,
    name: &str,
) -> Item {
    Item {
        id: Uuid::from_u128(n),
        item_type,
        title: title.to_string(),
        category,
        description: description.to_string(),
        location: location.to_string(),
        date,
        contact: Some(email.to_string()),
        // Demo posters have no real account, so owner affordances never
        // appear on demo cards.
        user_id: Uuid::nil(),
        user_email: email.to_string(),
        user_name: name.to_string(),
        user_photo: None,
        image_url: None,
        image: None,
        created_at: date.and_time(NaiveTime::MIN).and_utc(),
        status: ItemStatus::Active,
    }
}

fn demo_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("demo date literal")
}

/// The fixed demo set shown when the backend cannot be reached: three lost
/// and three found listings.
pub fn demo_items() -> Vec<Item> {
    vec![
        demo_item(
            1,
            ItemType::Lost,
            "Blue Backpack",
            Category::Bags,
            "Navy blue Jansport backpack with laptop sleeve and a small red car keychain.",
            "Central Park, NYC",
            demo_date(2025, 1, 15),
            "alex@example.com",
            "Alex Johnson",
        ),
        demo_item(
            2,
            ItemType::Lost,
            "iPhone 15 Pro",
            Category::Electronics,
            "Space gray iPhone 15 Pro with cracked screen protector and a clear case.",
            "Downtown Library",
            demo_date(2025, 1, 18),
            "sarah@example.com",
            "Sarah M.",
        ),
        demo_item(
            3,
            ItemType::Lost,
            "Golden Retriever",
            Category::Pets,
            "Female golden retriever, 3 years old, wearing a red collar with name tags.",
            "Riverside Park",
            demo_date(2025, 1, 20),
            "mike@example.com",
            "Mike Chen",
        ),
        demo_item(
            4,
            ItemType::Found,
            "Silver Keys",
            Category::Keys,
            "A set of silver keys with a Toyota fob and one apartment key, near the bus stop.",
            "Oak Street Bus Stop",
            demo_date(2025, 1, 16),
            "emma@example.com",
            "Emma Davis",
        ),
        demo_item(
            5,
            ItemType::Found,
            "Black Leather Wallet",
            Category::Wallets,
            "Black leather wallet with cards (no cash). Found near the city square fountain.",
            "City Square Fountain",
            demo_date(2025, 1, 19),
            "james@example.com",
            "James Wilson",
        ),
        demo_item(
            6,
            ItemType::Found,
            "Prescription Glasses",
            Category::Accessories,
            "Brown tortoiseshell prescription glasses inside a black hard case.",
            "Coffee House Café",
            demo_date(2025, 1, 21),
            "priya@example.com",
            "Priya Patel",
        ),
    ]
}
