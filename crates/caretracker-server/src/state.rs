use std::sync::Arc;

use jiff::Zoned;
use jiff::civil::{Date, DateTime};

use caretracker_storage::store::Store;

use crate::config::ServerConfig;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Arc<ServerConfig>,
    pub clock: Clock,
}

impl AppState {
    pub fn new(store: Store, config: ServerConfig) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            clock: Clock::System,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn today(&self) -> Date {
        self.clock.now().date()
    }
}

/// Source of "now". Wards work in local time, so the system clock is read in
/// the server's time zone.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(DateTime),
}

impl Clock {
    pub fn now(self) -> DateTime {
        match self {
            Clock::System => Zoned::now().datetime(),
            Clock::Fixed(at) => at,
        }
    }
}
