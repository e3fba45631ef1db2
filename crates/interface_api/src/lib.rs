//! HTTP API Layer
//!
//! This crate provides the REST API for the lodging core using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: request handlers per domain, role-scoped
//! - **Middleware**: authentication (identity gate consumption) and audit
//!   logging
//! - **DTOs**: request/response objects with the uniform
//!   `{success, message, data}` envelope
//! - **Error Handling**: the operation error taxonomy mapped onto HTTP
//!   statuses, with transient failures marked retryable
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{AppState, create_router, config::ApiConfig};
//!
//! let state = AppState::new(pool, config);
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::notification::{LoggingNotifier, NotifierPort};
use domain_billing::{
    DueService, PaymentLedgerService, ReceiptNumbers, SettlementService,
};
use domain_occupancy::ports::{ResidentPort, RoomPort, TransferPort};
use domain_occupancy::{RoomDirectoryService, TransferService};
use infra_db::{
    PaymentRepository, ResidentRepository, RoomRepository, SequenceRepository,
    SettlementRepository, TransferRepository,
};

use crate::config::ApiConfig;
use crate::handlers::{dues, health, payments, rooms, settlements, transfers};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: ApiConfig,
    pub rooms: Arc<RoomDirectoryService>,
    pub transfers: Arc<TransferService>,
    pub payments: Arc<PaymentLedgerService>,
    pub dues: Arc<DueService>,
    pub settlements: Arc<SettlementService>,
}

impl AppState {
    /// Wires the services over the PostgreSQL repositories
    pub fn new(pool: PgPool, config: ApiConfig) -> Self {
        let room_port: Arc<dyn RoomPort> = Arc::new(RoomRepository::new(pool.clone()));
        let resident_port: Arc<dyn ResidentPort> =
            Arc::new(ResidentRepository::new(pool.clone()));
        let transfer_port: Arc<dyn TransferPort> =
            Arc::new(TransferRepository::new(pool.clone()));
        let payment_port = Arc::new(PaymentRepository::new(pool.clone()));
        let settlement_port = Arc::new(SettlementRepository::new(pool.clone()));
        let sequence_port = Arc::new(SequenceRepository::new(pool.clone()));
        let notifier: Arc<dyn NotifierPort> = Arc::new(LoggingNotifier);

        let rooms = Arc::new(RoomDirectoryService::new(
            room_port.clone(),
            resident_port.clone(),
        ));
        let transfers = Arc::new(TransferService::new(
            room_port.clone(),
            resident_port.clone(),
            transfer_port,
            notifier,
        ));
        let payments = Arc::new(PaymentLedgerService::new(
            payment_port.clone(),
            resident_port.clone(),
            ReceiptNumbers::new(sequence_port),
        ));
        let dues = Arc::new(DueService::new(
            payment_port,
            settlement_port.clone(),
            room_port.clone(),
            resident_port.clone(),
        ));
        let settlements = Arc::new(SettlementService::new(
            settlement_port,
            room_port,
            resident_port,
            dues.clone(),
        ));

        Self {
            pool,
            config,
            rooms,
            transfers,
            payments,
            dues,
            settlements,
        }
    }
}

/// Creates the main API router
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Room routes
    let room_routes = Router::new()
        .route("/", post(rooms::create_room))
        .route("/", get(rooms::list_rooms))
        .route("/:id", put(rooms::update_room))
        .route("/:id", delete(rooms::delete_room));

    // Payment routes
    let payment_routes = Router::new()
        .route("/", post(payments::create_payment))
        .route("/", get(payments::list_payments))
        .route("/:id", put(payments::update_payment))
        .route("/:id", delete(payments::deactivate_payment));

    // Due routes
    let due_routes = Router::new()
        .route("/batch", post(dues::batch_dues))
        .route("/:resident_id", get(dues::get_due));

    // Settlement routes
    let settlement_routes = Router::new()
        .route("/", post(settlements::create_settlement))
        .route("/:resident_id", get(settlements::list_settlements));

    // Transfer routes
    let transfer_routes = Router::new()
        .route("/", post(transfers::execute_transfer))
        .route("/:resident_id", get(transfers::transfer_history));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/rooms", room_routes)
        .nest("/payments", payment_routes)
        .nest("/dues", due_routes)
        .nest("/settlements", settlement_routes)
        .nest("/transfers", transfer_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            audit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
