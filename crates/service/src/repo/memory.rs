//! Simple in-memory store for tests and doc examples.
//!
//! [`MemoryCatalog`] wires the four tables together with the same
//! referential rules the SQL schema enforces: saved links must point at
//! existing rows, and a category/role that is still referenced cannot be
//! deleted.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use async_trait::async_trait;

use crate::domain::{Category, Product, Role, User};
use crate::repository::{EntityStore, Page, PageRequest, Record, StoreError};

type LinkCheck = Arc<dyn Fn(i64) -> bool + Send + Sync>;
type DeleteGuard = Arc<dyn Fn(i64) -> bool + Send + Sync>;
type Hydrate<E> = Arc<dyn Fn(&mut E) + Send + Sync>;

pub struct MemoryStore<E: Record> {
    rows: Mutex<BTreeMap<i64, E>>,
    seq: AtomicI64,
    /// true when the association id exists in the linked table
    link_check: RwLock<Option<LinkCheck>>,
    /// fills association member display fields at read time
    hydrate: RwLock<Option<Hydrate<E>>>,
    /// true when a dependent row elsewhere still references the given id
    guards: RwLock<Vec<DeleteGuard>>,
    /// optional uniqueness key, e.g. the user email
    unique_key: Option<fn(&E) -> String>,
}

impl<E: Record> MemoryStore<E> {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            seq: AtomicI64::new(1),
            link_check: RwLock::new(None),
            hydrate: RwLock::new(None),
            guards: RwLock::new(Vec::new()),
            unique_key: None,
        }
    }

    pub fn with_unique_key(key: fn(&E) -> String) -> Self {
        let mut store = Self::new();
        store.unique_key = Some(key);
        store
    }

    pub fn set_link_check(&self, check: LinkCheck) {
        *self.link_check.write().unwrap() = Some(check);
    }

    pub fn set_hydrate(&self, hydrate: Hydrate<E>) {
        *self.hydrate.write().unwrap() = Some(hydrate);
    }

    pub fn add_delete_guard(&self, guard: DeleteGuard) {
        self.guards.write().unwrap().push(guard);
    }

    pub fn contains(&self, id: i64) -> bool {
        self.rows.lock().unwrap().contains_key(&id)
    }

    pub fn snapshot(&self, id: i64) -> Option<E> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    /// true when any row in this table links to the given foreign id
    pub fn any_links_to(&self, id: i64) -> bool {
        self.rows.lock().unwrap().values().any(|e| e.link_ids().contains(&id))
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn hydrated(&self, mut entity: E) -> E {
        if let Some(hydrate) = self.hydrate.read().unwrap().as_ref() {
            hydrate(&mut entity);
        }
        entity
    }
}

impl<E: Record> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Record> EntityStore<E> for MemoryStore<E> {
    async fn find_page(&self, req: &PageRequest) -> Result<Page<E>, StoreError> {
        let size = req.normalized_size();
        let mut all: Vec<E> = self.rows.lock().unwrap().values().cloned().collect();
        if let Some(sort) = &req.sort {
            // stable sort; rows without a sortable value keep id order
            all.sort_by(|a, b| a.sort_value(&sort.field).cmp(&b.sort_value(&sort.field)));
            if !sort.ascending {
                all.reverse();
            }
        }
        let total = all.len() as u64;
        let start = (req.page * size).min(total) as usize;
        let end = ((req.page + 1) * size).min(total) as usize;
        let content = all[start..end].iter().cloned().map(|e| self.hydrated(e)).collect();
        Ok(Page { content, page: req.page, size, total_elements: total })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<E>, StoreError> {
        let row = self.rows.lock().unwrap().get(&id).cloned();
        Ok(row.map(|e| self.hydrated(e)))
    }

    async fn save(&self, mut entity: E) -> Result<E, StoreError> {
        // integrity checks happen here, at the commit boundary
        if let Some(check) = self.link_check.read().unwrap().as_ref() {
            for link in entity.link_ids() {
                if !check(link) {
                    return Err(StoreError::Integrity(format!("unknown association id {link}")));
                }
            }
        }
        let mut rows = self.rows.lock().unwrap();
        if let Some(key) = self.unique_key {
            let candidate = key(&entity);
            let clash = rows
                .values()
                .any(|other| other.id() != entity.id() && key(other) == candidate);
            if clash {
                return Err(StoreError::Integrity(format!("duplicate key: {candidate}")));
            }
        }
        match entity.id() {
            None => {
                let id = self.seq.fetch_add(1, Ordering::SeqCst);
                entity.set_id(id);
                rows.insert(id, entity.clone());
                Ok(entity)
            }
            Some(id) => {
                if !rows.contains_key(&id) {
                    return Err(StoreError::NoSuchRow(id));
                }
                rows.insert(id, entity.clone());
                Ok(entity)
            }
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        if !self.contains(id) {
            return Err(StoreError::NoSuchRow(id));
        }
        // guards consult other stores; evaluate before re-taking our lock
        let blocked = self.guards.read().unwrap().iter().any(|guard| guard(id));
        if blocked {
            return Err(StoreError::Integrity(format!(
                "row {id} is referenced by dependent records"
            )));
        }
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }
}

/// The four catalog tables with referential wiring between them.
pub struct MemoryCatalog {
    pub products: Arc<MemoryStore<Product>>,
    pub categories: Arc<MemoryStore<Category>>,
    pub users: Arc<MemoryStore<User>>,
    pub roles: Arc<MemoryStore<Role>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        let categories = Arc::new(MemoryStore::<Category>::new());
        let roles = Arc::new(MemoryStore::<Role>::new());
        let products = Arc::new(MemoryStore::<Product>::new());
        let users = Arc::new(MemoryStore::with_unique_key((|u: &User| u.email.clone()) as fn(&User) -> String));

        let cats: Weak<MemoryStore<Category>> = Arc::downgrade(&categories);
        products.set_link_check(Arc::new(move |id| {
            cats.upgrade().map_or(false, |store| store.contains(id))
        }));
        let cats = Arc::downgrade(&categories);
        products.set_hydrate(Arc::new(move |product: &mut Product| {
            if let Some(store) = cats.upgrade() {
                for member in &mut product.categories {
                    if let Some(id) = member.id {
                        if let Some(row) = store.snapshot(id) {
                            member.name = row.name;
                        }
                    }
                }
            }
        }));
        let prods = Arc::downgrade(&products);
        categories.add_delete_guard(Arc::new(move |id| {
            prods.upgrade().map_or(false, |store| store.any_links_to(id))
        }));

        let role_store = Arc::downgrade(&roles);
        users.set_link_check(Arc::new(move |id| {
            role_store.upgrade().map_or(false, |store| store.contains(id))
        }));
        let role_store = Arc::downgrade(&roles);
        users.set_hydrate(Arc::new(move |user: &mut User| {
            if let Some(store) = role_store.upgrade() {
                for member in &mut user.roles {
                    if let Some(id) = member.id {
                        if let Some(row) = store.snapshot(id) {
                            member.authority = row.authority;
                        }
                    }
                }
            }
        }));
        let user_store = Arc::downgrade(&users);
        roles.add_delete_guard(Arc::new(move |id| {
            user_store.upgrade().map_or(false, |store| store.any_links_to(id))
        }));

        Self { products, categories, users, roles }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}
