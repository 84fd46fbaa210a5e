//! HTTP API for the chat session
//!
//! One session per process. The UI drives it through these routes and
//! follows its progress over the SSE stream.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::catalog::ChatCatalog;
use crate::runtime::SessionHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub catalog: Arc<dyn ChatCatalog>,
}

impl AppState {
    pub fn new(session: SessionHandle, catalog: Arc<dyn ChatCatalog>) -> Self {
        Self { session, catalog }
    }
}
