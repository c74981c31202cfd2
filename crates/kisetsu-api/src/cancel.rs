use std::future::Future;

use tokio::sync::watch;

use crate::error::ApiError;

/// Keeps at most one search alive: every [`begin`](Self::begin) supersedes
/// the tickets handed out before it.
#[derive(Debug)]
pub struct SearchSupersession {
    latest: watch::Sender<u64>,
}

/// Claim on the "current search" slot, tagged with its generation.
#[derive(Debug)]
pub struct SearchTicket {
    generation: u64,
    latest: watch::Receiver<u64>,
}

impl SearchSupersession {
    pub fn new() -> Self {
        let (latest, _) = watch::channel(0);
        Self { latest }
    }

    /// Start a new search, cancelling whichever one is still pending.
    pub fn begin(&self) -> SearchTicket {
        let mut generation = 0;
        self.latest.send_modify(|g| {
            *g += 1;
            generation = *g;
        });
        SearchTicket {
            generation,
            latest: self.latest.subscribe(),
        }
    }

    /// Cancel the pending search without starting another.
    pub fn cancel(&self) {
        self.latest.send_modify(|g| *g += 1);
    }
}

impl Default for SearchSupersession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        *self.latest.borrow() == self.generation
    }

    /// Drive `work` until it finishes or a newer search supersedes this one.
    /// A ticket that is already stale never polls `work`, and superseding
    /// drops it mid-flight, which aborts any request it has open.
    pub async fn run<T, F>(mut self, work: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let generation = self.generation;
        tokio::select! {
            biased;
            _ = superseded(&mut self.latest, generation) => Err(ApiError::RequestCancelled),
            result = work => result,
        }
    }
}

async fn superseded(latest: &mut watch::Receiver<u64>, generation: u64) {
    loop {
        let current = *latest.borrow_and_update();
        if current != generation {
            return;
        }
        if latest.changed().await.is_err() {
            // Sender gone: nothing can supersede us any more.
            std::future::pending::<()>().await;
        }
    }
}
