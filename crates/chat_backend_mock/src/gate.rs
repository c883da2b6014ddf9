use std::sync::Arc;

use tokio::sync::Semaphore;

/// Holds matching backend calls until the test lets them through.
///
/// A fresh gate is shut. `release_one` admits one call in arrival order;
/// `open` admits every current and future call.
#[derive(Debug, Clone)]
pub struct Gate {
    semaphore: Arc<Semaphore>,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(0)),
        }
    }

    pub fn release_one(&self) {
        self.semaphore.add_permits(1);
    }

    pub fn open(&self) {
        self.semaphore.close();
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.semaphore.is_closed()
    }

    pub(crate) async fn pass(&self) {
        // A closed semaphore means the gate is open for good.
        if let Ok(permit) = self.semaphore.acquire().await {
            permit.forget();
        }
    }
}
