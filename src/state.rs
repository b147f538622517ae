use std::sync::Arc;

use crate::config::AppConfig;
use crate::gate::FixedWindowLimiter;
use crate::store::TempStore;

/// Shared router state. The limiter's counters and the temp store namespace
/// are the only state shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub limiter: Arc<FixedWindowLimiter>,
    pub store: Arc<TempStore>,
}
