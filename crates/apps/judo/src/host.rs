//! Host server registry
//!
//! The host owns the outer router and remembers which server instance and
//! subscription server are currently installed. Re-initialization swaps them
//! under one lock and closes the replaced subscription server first.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::watch;
use tower::ServiceExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::judo::Judo;

/// Handle to the WebSocket subscription endpoint of one server instance
///
/// Closing it ends every live connection it accepted.
#[derive(Debug)]
pub struct SubscriptionServer {
    id: Uuid,
    closed: watch::Sender<bool>,
}

impl SubscriptionServer {
    pub fn new() -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            id: Uuid::new_v4(),
            closed,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn close(&self) {
        if !self.closed.send_replace(true) {
            info!(subscription_server = %self.id, "Subscription server closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the server is closed
    pub fn closed(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.closed.subscribe();
        async move {
            // A dropped sender also ends the wait
            let _ = receiver.wait_for(|closed| *closed).await;
        }
    }
}

impl Default for SubscriptionServer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct HostState {
    judo: Option<Arc<Judo>>,
    router: Option<Router>,
    subscriptions: Option<Arc<SubscriptionServer>>,
    generation: u64,
}

/// Registry of the installed server instance
#[derive(Clone, Default)]
pub struct HostServer {
    state: Arc<RwLock<HostState>>,
    init: Arc<Mutex<()>>,
}

impl HostServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a server instance, closing the previous subscription server
    ///
    /// Returns the new generation.
    pub fn install(
        &self,
        judo: Arc<Judo>,
        router: Router,
        subscriptions: Arc<SubscriptionServer>,
    ) -> u64 {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = state.subscriptions.take() {
            debug!(subscription_server = %previous.id(), "Replacing subscription server");
            previous.close();
        }
        state.judo = Some(judo);
        state.router = Some(router);
        state.subscriptions = Some(subscriptions);
        state.generation += 1;
        info!(generation = state.generation, "Server instance installed");
        state.generation
    }

    pub fn judo(&self) -> Option<Arc<Judo>> {
        self.read().judo.clone()
    }

    pub fn subscription_server(&self) -> Option<Arc<SubscriptionServer>> {
        self.read().subscriptions.clone()
    }

    /// Number of installs so far
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Serializes initialization so two callers never build side by side
    pub(crate) fn init_guard(&self) -> MutexGuard<'_, ()> {
        self.init.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Outer router: `/health` plus delegation to the installed instance
    pub fn router(&self) -> Router {
        let host = self.clone();
        Router::new()
            .route("/health", get(health))
            .fallback(move |request: Request| {
                let host = host.clone();
                async move { host.dispatch(request).await }
            })
    }

    async fn dispatch(&self, request: Request) -> Response {
        let router = self.read().router.clone();
        match router {
            Some(router) => match router.oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            },
            None => (StatusCode::SERVICE_UNAVAILABLE, "Server not initialized").into_response(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HostState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Health check handler
async fn health() -> &'static str {
    "OK"
}
