//! The client entity store: an observable in-memory collection that is
//! seeded from the local cache or the remote gateway and persisted back to
//! the cache on every change.
//!
//! One [Store] exists per entity type. It is created once at start-up and
//! shared by reference with everything that displays or edits the collection.

use std::{
    num::NonZeroUsize,
    sync::{
        Arc, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use time::OffsetDateTime;
use tokio::sync::{Mutex, watch};

use crate::{
    entity::{Entity, EntityId},
    error::{CacheError, StoreAction, StoreError, ValidationError},
    gateway::Gateway,
    list_state::{ListState, Sort, SortDirection},
    pagination::{PaginationConfig, PaginationIndicator, create_pagination_indicators},
    storage::LocalCache,
};

/// Where a store is in its load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// [Store::load] has not been called yet.
    Idle,
    /// The first network fetch is in flight.
    Fetching,
    /// The collection has been loaded.
    Ready,
    /// The last load attempt failed.
    Failed,
}

/// How a store assigns IDs to entities added without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    /// The current Unix time in milliseconds, bumped past the largest
    /// existing integer ID so IDs stay unique within the collection.
    #[default]
    Timestamp,
    /// One more than the largest existing integer ID, starting at 1.
    Sequential,
}

impl IdStrategy {
    /// The ID for a new entity added to `entities` at time `now`.
    pub fn next_id<E: Entity>(self, entities: &[E], now: OffsetDateTime) -> EntityId {
        let next_free = entities
            .iter()
            .filter_map(|entity| entity.id().and_then(EntityId::as_i64))
            .max()
            .map_or(1, |max| max.saturating_add(1));

        let id = match self {
            IdStrategy::Timestamp => {
                let millis = (now.unix_timestamp_nanos() / 1_000_000) as i64;
                millis.max(next_free)
            }
            IdStrategy::Sequential => next_free,
        };

        EntityId::Int(id)
    }
}

/// A change made to the collection while a fetch was in flight.
#[derive(Debug)]
enum Mutation<E> {
    Add(E),
    Update(E),
    Delete(EntityId),
}

impl<E: Entity> Mutation<E> {
    /// Apply the change to a freshly fetched collection.
    fn replay(self, entities: &mut Vec<E>) {
        let position = |entities: &[E], id: Option<&EntityId>| {
            id.and_then(|id| entities.iter().position(|entity| entity.id() == Some(id)))
        };

        match self {
            Mutation::Add(entity) => match position(entities, entity.id()) {
                Some(index) => entities[index] = entity,
                None => entities.push(entity),
            },
            Mutation::Update(entity) => {
                if let Some(index) = position(entities, entity.id()) {
                    entities[index] = entity;
                }
            }
            Mutation::Delete(id) => {
                if let Some(index) = position(entities, Some(&id)) {
                    entities.remove(index);
                }
            }
        }
    }
}

/// A snapshot of a store's state.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState<E> {
    /// The full collection in stored order.
    pub entities: Vec<E>,
    /// The load lifecycle state.
    pub status: LoadStatus,
    /// The message for the last failed action, if it has not been cleared.
    pub error: Option<String>,
    /// The search, sort and paging state of the list view.
    pub list: ListState,
}

impl<E: Entity> StoreState<E> {
    fn new(pagination: &PaginationConfig) -> Self {
        let mut list = ListState::new(pagination.default_page_size);
        list.current_page = pagination.default_page.max(1);

        Self {
            entities: Vec::new(),
            status: LoadStatus::Idle,
            error: None,
            list,
        }
    }

    /// Whether the collection has been loaded.
    pub fn initialized(&self) -> bool {
        self.status == LoadStatus::Ready
    }

    /// Whether the collection is still being loaded.
    ///
    /// This is true before the first load and while the first fetch is in
    /// flight, and false once a load has succeeded or failed. Refreshing a
    /// loaded collection does not count as loading.
    pub fn is_loading(&self) -> bool {
        matches!(self.status, LoadStatus::Idle | LoadStatus::Fetching)
    }

    /// The entities matching the search query, in sorted order.
    pub fn filtered(&self) -> Vec<&E> {
        self.list.filtered(&self.entities)
    }

    /// The entities on the current page.
    pub fn paginated(&self) -> Vec<&E> {
        self.list.paginated(&self.entities)
    }

    /// The number of pages of matching entities.
    pub fn total_pages(&self) -> usize {
        self.list.total_pages(&self.entities)
    }

    fn clamp_page(&mut self) {
        let total_pages = self.total_pages();
        self.list.clamp_page(total_pages);
    }

    fn position(&self, id: &EntityId) -> Option<usize> {
        self.entities
            .iter()
            .position(|entity| entity.id() == Some(id))
    }
}

/// The reactive state container and mutation coordinator for one entity type.
pub struct Store<E: Entity> {
    gateway: Arc<dyn Gateway<E>>,
    cache: LocalCache,
    state: watch::Sender<StoreState<E>>,
    /// Serialises load attempts and remembers how the last one failed.
    load_gate: Mutex<Option<StoreError>>,
    settled_loads: AtomicU64,
    /// Mutations made since the in-flight fetch started, if there is one.
    /// Only locked while the `state` sender is borrowed mutably.
    in_flight: std::sync::Mutex<Option<Vec<Mutation<E>>>>,
    id_strategy: IdStrategy,
    max_pages: usize,
}

impl<E: Entity> Store<E> {
    /// Create an empty, unloaded store.
    pub fn new(
        gateway: Arc<dyn Gateway<E>>,
        cache: LocalCache,
        pagination: &PaginationConfig,
    ) -> Self {
        Self {
            gateway,
            cache,
            state: watch::Sender::new(StoreState::new(pagination)),
            load_gate: Mutex::new(None),
            settled_loads: AtomicU64::new(0),
            in_flight: std::sync::Mutex::new(None),
            id_strategy: IdStrategy::default(),
            max_pages: pagination.max_pages,
        }
    }

    /// Use `id_strategy` for entities added without an ID.
    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// Subscribe to state changes.
    ///
    /// The receiver is notified after every change and always holds the
    /// latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<StoreState<E>> {
        self.state.subscribe()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> StoreState<E> {
        self.state.borrow().clone()
    }

    /// The full collection in stored order.
    pub fn entities(&self) -> Vec<E> {
        self.state.borrow().entities.clone()
    }

    /// The entity with `id`, if it is in the collection.
    pub fn get(&self, id: &EntityId) -> Option<E> {
        let state = self.state.borrow();

        state.position(id).map(|index| state.entities[index].clone())
    }

    /// The entities matching the search query, in sorted order.
    pub fn filtered(&self) -> Vec<E> {
        self.state.borrow().filtered().into_iter().cloned().collect()
    }

    /// The entities on the current page of [Store::filtered].
    pub fn paginated(&self) -> Vec<E> {
        self.state.borrow().paginated().into_iter().cloned().collect()
    }

    /// The number of pages in [Store::filtered], or 0 if nothing matches.
    pub fn total_pages(&self) -> usize {
        self.state.borrow().total_pages()
    }

    /// The page being shown, starting from 1.
    pub fn current_page(&self) -> usize {
        self.state.borrow().list.current_page
    }

    /// The number of entities per page.
    pub fn page_size(&self) -> NonZeroUsize {
        self.state.borrow().list.page_size
    }

    /// The current search query.
    pub fn search_query(&self) -> String {
        self.state.borrow().list.search_query.clone()
    }

    /// The column the list is sorted by.
    pub fn sort(&self) -> Option<Sort> {
        self.state.borrow().list.sort.clone()
    }

    /// Whether the collection is still being loaded, see [StoreState::is_loading].
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Whether the collection has been loaded.
    pub fn initialized(&self) -> bool {
        self.state.borrow().initialized()
    }

    /// The message for the last failed action.
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// The page buttons for the current page.
    pub fn page_indicators(&self) -> Vec<PaginationIndicator> {
        let state = self.state.borrow();

        create_pagination_indicators(state.list.current_page, state.total_pages(), self.max_pages)
    }

    /// Load the collection, from the local cache if it holds a snapshot and
    /// from the remote gateway otherwise. Does nothing once loaded.
    ///
    /// Concurrent calls share a single attempt: callers that arrive while a
    /// fetch is in flight wait for it and receive its outcome instead of
    /// starting another fetch.
    ///
    /// # Errors
    ///
    /// Returns a [StoreError] with the message "Failed to load <entities>" if
    /// the cache misses and the gateway fails. The same message is put in the
    /// error cell.
    pub async fn load(&self) -> Result<(), StoreError> {
        if self.initialized() {
            return Ok(());
        }

        let seen = self.settled_loads.load(Ordering::Acquire);
        let mut last_failure = self.load_gate.lock().await;

        if self.initialized() {
            return Ok(());
        }

        if self.settled_loads.load(Ordering::Acquire) != seen {
            if let Some(error) = last_failure.as_ref() {
                return Err(error.clone());
            }
        }

        let result = self.load_from_cache_or_gateway().await;
        *last_failure = result.as_ref().err().cloned();
        self.settled_loads.fetch_add(1, Ordering::Release);

        result
    }

    /// Fetch the collection from the remote gateway even if it is loaded,
    /// replacing the in-memory collection and the cached snapshot.
    ///
    /// A loaded store stays [LoadStatus::Ready] during the fetch. Mutations
    /// made while the fetch is in flight are applied again on top of the
    /// fetched collection.
    ///
    /// # Errors
    ///
    /// Returns a [StoreError] if the gateway fails. The loaded collection is
    /// kept in that case.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let mut last_failure = self.load_gate.lock().await;

        let result = self.fetch_from_gateway().await;
        *last_failure = result.as_ref().err().cloned();
        self.settled_loads.fetch_add(1, Ordering::Release);

        result
    }

    async fn load_from_cache_or_gateway(&self) -> Result<(), StoreError> {
        // Mutations must not interleave the cache read and the apply.
        let from_cache = self.state.send_if_modified(|state| {
            let Some(entities) = self.cache.read::<E>(E::STORAGE_KEY) else {
                return false;
            };

            tracing::debug!(
                "Loaded {} {} from local storage",
                entities.len(),
                E::PLURAL_NAME
            );

            state.entities = entities;
            state.status = LoadStatus::Ready;
            state.error = None;
            state.clamp_page();

            true
        });

        if from_cache {
            return Ok(());
        }

        self.fetch_from_gateway().await
    }

    async fn fetch_from_gateway(&self) -> Result<(), StoreError> {
        self.state.send_if_modified(|state| {
            *self.lock_in_flight() = Some(Vec::new());

            if state.initialized() {
                return false;
            }

            state.status = LoadStatus::Fetching;
            true
        });

        match self.gateway.fetch_all().await {
            Ok(mut entities) => {
                tracing::info!("Loaded {} {} from the API", entities.len(), E::PLURAL_NAME);

                self.state.send_modify(|state| {
                    let pending = self.lock_in_flight().take().unwrap_or_default();
                    if !pending.is_empty() {
                        tracing::debug!(
                            "Replaying {} change(s) to {} made during the fetch",
                            pending.len(),
                            E::PLURAL_NAME
                        );
                    }
                    for mutation in pending {
                        mutation.replay(&mut entities);
                    }

                    if let Err(error) = self.cache.write(E::STORAGE_KEY, &entities) {
                        tracing::warn!("Could not cache {}: {error}", E::PLURAL_NAME);
                    }

                    state.entities = entities;
                    state.status = LoadStatus::Ready;
                    state.error = None;
                    state.clamp_page();
                });

                Ok(())
            }
            Err(error) => {
                let error = StoreError::new(StoreAction::Load, E::PLURAL_NAME, error);
                tracing::error!("{error}");

                self.state.send_modify(|state| {
                    self.lock_in_flight().take();

                    if !state.initialized() {
                        state.status = LoadStatus::Failed;
                    }
                    state.error = Some(error.message.clone());
                });

                Err(error)
            }
        }
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, Option<Vec<Mutation<E>>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remember `mutation` if a fetch is in flight.
    fn record_in_flight(&self, mutation: impl FnOnce() -> Mutation<E>) {
        if let Some(pending) = self.lock_in_flight().as_mut() {
            pending.push(mutation());
        }
    }

    /// Append `entity` to the collection and persist the collection.
    ///
    /// An ID is assigned if the entity has none. Returns the entity as stored.
    ///
    /// # Errors
    ///
    /// Returns a validation [StoreError] without touching any state if the
    /// entity fails validation or its ID is already taken.
    ///
    /// If the collection cannot be persisted the entity is still added in
    /// memory, the error cell is set to "Failed to add <entities>" and the
    /// error is returned.
    pub fn add(&self, mut entity: E) -> Result<E, StoreError> {
        let fail =
            |error: ValidationError| StoreError::new(StoreAction::Add, E::PLURAL_NAME, error);

        entity.validate().map_err(fail)?;

        let now = OffsetDateTime::now_utc();
        entity.stamp_created(now);
        entity.stamp_modified(now);

        let mut outcome = Ok(());
        self.state.send_if_modified(|state| {
            match entity.id() {
                Some(id) if state.position(id).is_some() => {
                    outcome = Err(fail(ValidationError::DuplicateId(id.to_string())));
                    return false;
                }
                Some(_) => {}
                None => entity.set_id(self.id_strategy.next_id(&state.entities, now)),
            }

            state.entities.push(entity.clone());
            self.record_in_flight(|| Mutation::Add(entity.clone()));
            outcome = self.persist(state, StoreAction::Add);

            true
        });

        outcome.map(|_| entity)
    }

    /// Replace the entity that has the same ID as `entity`.
    ///
    /// The creation time of the entity being replaced is kept if `entity`
    /// has none. Returns `Ok(false)` and changes nothing if no entity has that ID.
    ///
    /// # Errors
    ///
    /// Returns a validation [StoreError] without touching any state if the
    /// entity fails validation.
    ///
    /// If the collection cannot be persisted the entity is still replaced in
    /// memory, the error cell is set to "Failed to update <entities>" and the
    /// error is returned.
    pub fn update(&self, mut entity: E) -> Result<bool, StoreError> {
        entity
            .validate()
            .map_err(|error| StoreError::new(StoreAction::Update, E::PLURAL_NAME, error))?;

        let Some(id) = entity.id().cloned() else {
            tracing::debug!("Ignoring update of {} without an ID", E::PLURAL_NAME);
            return Ok(false);
        };

        entity.stamp_modified(OffsetDateTime::now_utc());

        let mut outcome = Ok(false);
        self.state.send_if_modified(|state| {
            let Some(index) = state.position(&id) else {
                tracing::debug!("Ignoring update of missing {} {id}", E::PLURAL_NAME);
                return false;
            };

            if let Some(created_at) = state.entities[index].created_at() {
                entity.stamp_created(created_at);
            }

            self.record_in_flight(|| Mutation::Update(entity.clone()));
            state.entities[index] = entity;
            outcome = self.persist(state, StoreAction::Update).map(|_| true);

            true
        });

        outcome
    }

    /// Remove the entity with `id`.
    ///
    /// Returns `Ok(false)` and changes nothing if no entity has that ID.
    ///
    /// # Errors
    ///
    /// If the collection cannot be persisted the entity is still removed from
    /// memory, the error cell is set to "Failed to delete <entities>" and the
    /// error is returned.
    pub fn delete(&self, id: &EntityId) -> Result<bool, StoreError> {
        let mut outcome = Ok(false);
        self.state.send_if_modified(|state| {
            let Some(index) = state.position(id) else {
                tracing::debug!("Ignoring delete of missing {} {id}", E::PLURAL_NAME);
                return false;
            };

            state.entities.remove(index);
            state.clamp_page();
            self.record_in_flight(|| Mutation::Delete(id.clone()));
            outcome = self.persist(state, StoreAction::Delete).map(|_| true);

            true
        });

        outcome
    }

    /// Write the collection to the cache and update the error cell to match.
    fn persist(&self, state: &mut StoreState<E>, action: StoreAction) -> Result<(), StoreError> {
        match self.cache.write(E::STORAGE_KEY, &state.entities) {
            Ok(()) => {
                state.error = None;
                Ok(())
            }
            Err(error) => Err(self.record_persist_failure(state, action, error)),
        }
    }

    fn record_persist_failure(
        &self,
        state: &mut StoreState<E>,
        action: StoreAction,
        error: CacheError,
    ) -> StoreError {
        let error = StoreError::new(action, E::PLURAL_NAME, error);
        tracing::warn!("{error}");
        state.error = Some(error.message.clone());

        error
    }

    /// Search for `query` and go back to the first page.
    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();

        self.state.send_modify(|state| {
            state.list.search_query = query;
            state.list.current_page = 1;
        });
    }

    /// Show page `page`, clamped to the pages that exist.
    pub fn set_page(&self, page: usize) {
        self.state.send_modify(|state| {
            state.list.current_page = page;
            state.clamp_page();
        });
    }

    /// Show `page_size` entities per page and go back to the first page.
    pub fn set_page_size(&self, page_size: NonZeroUsize) {
        self.state.send_modify(|state| {
            state.list.page_size = page_size;
            state.list.current_page = 1;
        });
    }

    /// Sort the list by the field named `field`.
    pub fn sort_column(&self, field: impl Into<String>, direction: SortDirection) {
        let field = field.into();

        self.state.send_modify(|state| {
            state.list.sort = Some(Sort { field, direction });
        });
    }

    /// Go back to the stored order.
    pub fn clear_sort(&self) {
        self.state.send_modify(|state| state.list.sort = None);
    }

    /// Dismiss the error message.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }
}
