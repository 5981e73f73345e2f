//! Store selection and the service bundle handlers share.

use std::sync::Arc;

use atelier_infra::{
    InMemoryStockStore, PostgresStockStore, StockEngine, StockStore,
    services::{CutSyncService, OrderService, ProductionService, ReturnService, StockService},
};

/// Every lifecycle service, wired over one engine and one store.
///
/// Handlers receive this behind an `Arc` via `Extension`. The store handle
/// stays public so integration tests can seed documents the API only reads;
/// cut batches arrive through the external workshop workflow, not through
/// an endpoint.
pub struct AppServices {
    pub store: Arc<dyn StockStore>,
    pub stock: StockService<Arc<dyn StockStore>>,
    pub orders: OrderService<Arc<dyn StockStore>>,
    pub production: ProductionService<Arc<dyn StockStore>>,
    pub returns: ReturnService<Arc<dyn StockStore>>,
    pub cuts: CutSyncService<Arc<dyn StockStore>>,
}

impl AppServices {
    /// Wire the full service set over one store. All services share a single
    /// engine, which keeps the per-SKU write serialization global.
    pub fn over(store: Arc<dyn StockStore>) -> Self {
        let engine = Arc::new(StockEngine::new(store.clone()));
        Self {
            store,
            stock: StockService::new(engine.clone()),
            orders: OrderService::new(engine.clone()),
            production: ProductionService::new(engine.clone()),
            returns: ReturnService::new(engine.clone()),
            cuts: CutSyncService::new(engine),
        }
    }
}

/// Pick the backing store from the environment: `DATABASE_URL` selects
/// Postgres, anything else falls back to the in-memory store.
pub async fn build_services() -> AppServices {
    let store: Arc<dyn StockStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let store = PostgresStockStore::connect(&url)
                .await
                .expect("failed to connect to Postgres");
            store
                .ensure_schema()
                .await
                .expect("failed to prepare the stock schema");
            tracing::info!("using the Postgres stock store");
            Arc::new(store)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; stock state is in-memory only");
            Arc::new(InMemoryStockStore::new())
        }
    };

    AppServices::over(store)
}
