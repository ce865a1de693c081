//! HTTP API server with observability for the loyalty redemption platform.
//!
//! Provides REST endpoints for order management, fulfillment actions, and
//! inventory, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use common::Points;
use domain::{AccountManager, Company, Product, ProductType};
use ledger_client::{PointsLedger, SimulatedPointsLedger};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{Catalog, InMemoryStore, InventoryLedger, OrderStore, TransactionStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Storage backend bounds shared by every handler.
pub trait Backend:
    OrderStore + InventoryLedger + TransactionStore + Catalog + Clone + 'static
{
}
impl<T> Backend for T where
    T: OrderStore + InventoryLedger + TransactionStore + Catalog + Clone + 'static
{
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, L>(state: Arc<AppState<S, L>>, metrics_handle: PrometheusHandle) -> Router
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S, L>))
        .route("/orders", post(routes::orders::create::<S, L>))
        .route("/orders/{id}", get(routes::orders::get::<S, L>))
        .route("/orders/{id}/process", post(routes::orders::process::<S, L>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S, L>))
        .route("/items/{id}/ship", post(routes::orders::ship::<S, L>))
        .route("/items/{id}/deliver", post(routes::orders::deliver::<S, L>))
        .route(
            "/companies/{id}/balance",
            get(routes::companies::balance::<S, L>),
        )
        .route(
            "/inventory/low-stock",
            get(routes::inventory::low_stock::<S, L>),
        )
        .route("/inventory/{id}", get(routes::inventory::get::<S, L>))
        .route(
            "/inventory/{id}/stock",
            post(routes::inventory::add_stock::<S, L>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given backend and ledger.
pub fn create_state<S, L>(store: S, ledger: L) -> Arc<AppState<S, L>>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    Arc::new(AppState::new(store, ledger))
}

/// Creates in-memory application state seeded with a demo catalog.
///
/// The fixture companies match the accounts the simulated ledger knows
/// about, so balances and debits line up out of the box.
pub async fn create_default_state() -> Arc<AppState<InMemoryStore, SimulatedPointsLedger>> {
    let store = InMemoryStore::new();
    let ledger = SimulatedPointsLedger::new();

    seed_demo_catalog(&store).await;

    create_state(store, ledger)
}

async fn seed_demo_catalog(store: &InMemoryStore) {
    let companies = [
        ("Acme Corp", "ACME001", "Jordan Smith", "jordan@acme.example"),
        ("Globex International", "GLOBAL002", "Sam Lee", "sam@globex.example"),
        ("Tech Industries", "TECH003", "Ada Ortiz", "ada@tech.example"),
        ("Startup Labs", "STARTUP004", "Kim Novak", "kim@startuplabs.example"),
    ];
    for (name, account, manager_name, email) in companies {
        let company = Company::new(name, account);
        let manager = AccountManager::new(company.id, manager_name, email);
        // Seeding an empty in-memory store cannot fail
        let _ = store.upsert_company(&company).await;
        let _ = store.upsert_account_manager(&manager).await;
    }

    let physical = [
        ("MUG-001", "Branded Mug", 500, 100_u32, Some(20_u32)),
        ("TSHIRT-001", "Company T-Shirt", 1_200, 50, Some(10)),
        ("BACKPACK-001", "Laptop Backpack", 4_500, 25, Some(5)),
    ];
    for (sku, name, cost, stock, reorder) in physical {
        let product = Product::new(sku, name, Points::new(cost), ProductType::Physical);
        let _ = store.upsert_product(&product).await;
        let _ = store.initialize(product.id, stock, reorder).await;
    }

    let virtual_products = [
        ("GIFT-025", "$25 Gift Card", 2_500),
        ("GIFT-050", "$50 Gift Card", 5_000),
        ("COURSE-001", "Online Course Voucher", 7_500),
    ];
    for (sku, name, cost) in virtual_products {
        let product = Product::new(sku, name, Points::new(cost), ProductType::Virtual);
        let _ = store.upsert_product(&product).await;
    }

    tracing::info!("Seeded demo catalog");
}
