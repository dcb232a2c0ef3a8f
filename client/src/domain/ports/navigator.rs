//! Port abstraction for the app's navigation stack.
//!
//! The route guard observes session state and drives this port; it never
//! touches routing configuration directly.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::route::ScreenPath;

/// Navigation operations the route guard needs.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Screen the user is currently on.
    async fn current_location(&self) -> ScreenPath;

    /// Replace the current screen with the target.
    async fn redirect(&self, target: ScreenPath);
}

/// In-memory navigator for tests: holds a location and records redirects.
#[derive(Debug)]
pub struct FixtureNavigator {
    location: Mutex<ScreenPath>,
    redirects: Mutex<Vec<ScreenPath>>,
}

impl FixtureNavigator {
    /// Start at the given location.
    #[must_use]
    pub fn starting_at(location: ScreenPath) -> Self {
        Self {
            location: Mutex::new(location),
            redirects: Mutex::new(Vec::new()),
        }
    }

    /// Redirects performed so far, in order.
    pub async fn redirects(&self) -> Vec<ScreenPath> {
        self.redirects.lock().await.clone()
    }
}

#[async_trait]
impl Navigator for FixtureNavigator {
    async fn current_location(&self) -> ScreenPath {
        self.location.lock().await.clone()
    }

    async fn redirect(&self, target: ScreenPath) {
        *self.location.lock().await = target.clone();
        self.redirects.lock().await.push(target);
    }
}
