//! Implements a struct that holds every store the console works with.

use std::sync::Arc;

use crate::{
    auth::{AuthStore, HttpAuthGateway},
    config::AppConfig,
    endpoints,
    entity::Entity,
    error::{NetworkError, StoreError},
    gateway::{HttpGateway, build_client},
    models::{Category, Pincode, ServiceProvider, Subcategory, User},
    pagination::PaginationConfig,
    preferences::Preferences,
    storage::{KeyValueStorage, LocalCache},
    store::Store,
};

/// The state of the console.
///
/// Built once at start-up and passed by reference to whatever needs a store.
pub struct AppState {
    /// The users listed in the console.
    pub users: Store<User>,

    /// The post offices and their pincodes.
    pub pincodes: Store<Pincode>,

    /// The service categories.
    pub categories: Store<Category>,

    /// The service subcategories.
    pub subcategories: Store<Subcategory>,

    /// The businesses offering services.
    pub service_providers: Store<ServiceProvider>,

    /// The logged in user's session.
    pub auth: AuthStore,

    /// The display preferences.
    pub preferences: Preferences,

    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,
}

impl AppState {
    /// Create the stores for the API and storage backend in `config`.
    ///
    /// The stores start empty. Call [Store::load] on a store before reading
    /// it and [AuthStore::restore] to pick up a persisted session.
    ///
    /// # Errors
    ///
    /// Returns a [NetworkError] if the HTTP client cannot be built.
    pub fn new(
        config: &AppConfig,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Result<Self, NetworkError> {
        let client = build_client(config.request_timeout)?;
        let cache = LocalCache::new(storage.clone());

        Ok(Self {
            users: http_store(config, &client, &cache, endpoints::USERS),
            pincodes: http_store(config, &client, &cache, endpoints::PINCODES),
            categories: http_store(config, &client, &cache, endpoints::CATEGORIES),
            subcategories: http_store(config, &client, &cache, endpoints::SUBCATEGORIES),
            service_providers: http_store(config, &client, &cache, endpoints::SERVICE_PROVIDERS),
            auth: AuthStore::new(
                Arc::new(HttpAuthGateway::new(client.clone(), &config.api_base_url)),
                cache,
            ),
            preferences: Preferences::new(storage),
            pagination_config: config.pagination.clone(),
        })
    }

    /// Add `subcategory` after copying its category's name into it.
    ///
    /// The categories are loaded first if they have not been.
    ///
    /// # Errors
    ///
    /// Returns the [StoreError] from loading the categories or adding the
    /// subcategory.
    pub async fn add_subcategory(
        &self,
        mut subcategory: Subcategory,
    ) -> Result<Subcategory, StoreError> {
        self.fill_category_name(&mut subcategory).await?;

        self.subcategories.add(subcategory)
    }

    /// Update `subcategory` after copying its category's name into it.
    ///
    /// # Errors
    ///
    /// Returns the [StoreError] from loading the categories or updating the
    /// subcategory.
    pub async fn update_subcategory(
        &self,
        mut subcategory: Subcategory,
    ) -> Result<bool, StoreError> {
        self.fill_category_name(&mut subcategory).await?;

        self.subcategories.update(subcategory)
    }

    async fn fill_category_name(&self, subcategory: &mut Subcategory) -> Result<(), StoreError> {
        self.categories.load().await?;

        if !subcategory.fill_category_name(&self.categories.entities()) {
            tracing::warn!(
                "No category with ID {:?} for subcategory \"{}\"",
                subcategory.category_id,
                subcategory.name
            );
        }

        Ok(())
    }
}

fn http_store<E: Entity>(
    config: &AppConfig,
    client: &reqwest::Client,
    cache: &LocalCache,
    path: &str,
) -> Store<E> {
    let gateway = HttpGateway::<E>::new(client.clone(), &config.api_base_url, path);

    Store::new(Arc::new(gateway), cache.clone(), &config.pagination)
        .with_id_strategy(config.id_strategy)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::AppState;
    use crate::{
        config::AppConfig,
        entity::EntityId,
        error::{Error, ValidationError},
        mock_api::{MockApi, build_mock_router},
        models::Subcategory,
        storage::MemoryStorage,
        test_utils::serve,
    };

    async fn get_state() -> AppState {
        let config = AppConfig {
            api_base_url: serve(build_mock_router(MockApi::with_fixtures())).await,
            ..AppConfig::default()
        };

        AppState::new(&config, Arc::new(MemoryStorage::new())).unwrap()
    }

    fn tiling(category_id: Option<EntityId>) -> Subcategory {
        Subcategory {
            id: None,
            name: "Tiling".to_owned(),
            icon: String::new(),
            image_url: String::new(),
            comments: String::new(),
            created_at: None,
            modified_at: None,
            category_id,
            category_name: String::new(),
        }
    }

    #[tokio::test]
    async fn stores_load_from_api() {
        let state = get_state().await;
        let fixtures = MockApi::with_fixtures();

        state.pincodes.load().await.unwrap();
        state.service_providers.load().await.unwrap();
        state.users.load().await.unwrap();

        assert_eq!(state.pincodes.entities(), fixtures.pincodes);
        assert_eq!(state.service_providers.entities(), fixtures.service_providers);
        assert_eq!(state.users.entities()[0].name, "Leanne Graham");
    }

    #[tokio::test]
    async fn add_subcategory_fills_category_name() {
        let state = get_state().await;

        let added = state
            .add_subcategory(tiling(Some(EntityId::Int(1))))
            .await
            .unwrap();

        assert_eq!(added.category_name, "Plumbing");
        assert!(state.categories.initialized());
        assert_eq!(state.subcategories.entities(), vec![added]);
    }

    #[tokio::test]
    async fn add_subcategory_requires_category() {
        let state = get_state().await;

        let error = state.add_subcategory(tiling(None)).await.unwrap_err();

        assert_eq!(
            error.source,
            Error::Validation(ValidationError::MissingCategory)
        );
        assert!(state.subcategories.entities().is_empty());
    }

    #[tokio::test]
    async fn update_subcategory_refreshes_category_name() {
        let state = get_state().await;
        state.subcategories.load().await.unwrap();
        let mut subcategory = state.subcategories.entities()[0].clone();
        subcategory.category_id = Some(EntityId::Int(2));

        let updated = state.update_subcategory(subcategory).await.unwrap();

        assert!(updated);
        assert_eq!(state.subcategories.entities()[0].category_name, "Electrical");
    }
}
