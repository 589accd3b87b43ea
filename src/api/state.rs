use std::sync::Arc;

use crate::engine::Engine;
use crate::storage::Pool;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub engine: Arc<Engine>,
}
