use crate::provider::{DescriptionProvider, REQUEST_TIMEOUT};
use crate::registry::{ElementId, ElementRegistry};
use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Why a description attempt failed. Surfaced to the overlay as a retry
/// affordance, never propagated to break page interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescribeError {
    NoCredential,
    NetworkError(String),
    ProviderError(String),
    Timeout,
}

impl fmt::Display for DescribeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescribeError::NoCredential => write!(f, "no credential configured"),
            DescribeError::NetworkError(e) => write!(f, "network error: {e}"),
            DescribeError::ProviderError(e) => write!(f, "provider error: {e}"),
            DescribeError::Timeout => write!(f, "provider did not respond in time"),
        }
    }
}

/// Per-element request state. `Done` text is retained for the lifetime of
/// the tracked element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DescribeStatus {
    #[default]
    Idle,
    Processing,
    Done(String),
    Failed(DescribeError),
}

/// Completion signal from a worker thread. The generation token ties the
/// result to the exact attempt that produced it; anything stale is dropped.
#[derive(Debug)]
pub struct Completion {
    element: ElementId,
    generation: u64,
    result: Result<String, DescribeError>,
}

/// One in-flight attempt: its generation token and the instant after which
/// the wait is abandoned.
#[derive(Debug, Clone, Copy)]
struct Attempt {
    generation: u64,
    deadline: Instant,
}

/// Turns describe triggers into at-most-one in-flight provider call per
/// element, with result caching. Requests for different elements are
/// independent and may be in flight concurrently; completions come back over
/// an mpsc channel and are applied on the engine tick.
///
/// Every attempt carries a wait budget. The coordinator enforces it itself
/// so a hung provider implementation cannot pin an element at Processing.
pub struct DescribeCoordinator {
    statuses: HashMap<ElementId, DescribeStatus>,
    inflight: HashMap<ElementId, Attempt>,
    next_generation: u64,
    budget: Duration,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    shut_down: bool,
}

impl Default for DescribeCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl DescribeCoordinator {
    pub fn new() -> Self {
        Self::with_budget(REQUEST_TIMEOUT)
    }

    /// Coordinator with a custom per-attempt wait budget.
    pub fn with_budget(budget: Duration) -> Self {
        let (tx, rx) = channel();
        Self {
            statuses: HashMap::new(),
            inflight: HashMap::new(),
            next_generation: 0,
            budget,
            tx,
            rx,
            shut_down: false,
        }
    }

    pub fn status(&self, element: ElementId) -> &DescribeStatus {
        self.statuses.get(&element).unwrap_or(&DescribeStatus::Idle)
    }

    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }

    /// Trigger a description request for `element`.
    ///
    /// A second trigger while Processing is a no-op; a trigger after Done is
    /// a cache hit with zero network calls. Idle or Failed issues a fresh
    /// attempt. A missing credential fails synchronously without touching
    /// the network; there is no automatic retry.
    pub fn request(
        &mut self,
        element: ElementId,
        image: Option<Vec<u8>>,
        credential: Option<String>,
        provider: Arc<dyn DescriptionProvider>,
    ) {
        if self.shut_down {
            return;
        }
        match self.status(element) {
            DescribeStatus::Processing => {
                tracing::debug!(?element, "describe already in flight, ignoring trigger");
                return;
            }
            DescribeStatus::Done(_) => {
                tracing::debug!(?element, "describe already cached, ignoring trigger");
                return;
            }
            DescribeStatus::Idle | DescribeStatus::Failed(_) => {}
        }

        let Some(credential) = credential.filter(|c| !c.trim().is_empty()) else {
            tracing::warn!(?element, "describe requested without a credential");
            self.statuses
                .insert(element, DescribeStatus::Failed(DescribeError::NoCredential));
            return;
        };
        let Some(image) = image.filter(|i| !i.is_empty()) else {
            self.statuses.insert(
                element,
                DescribeStatus::Failed(DescribeError::ProviderError(
                    "image data unavailable".into(),
                )),
            );
            return;
        };

        self.next_generation += 1;
        let generation = self.next_generation;
        self.inflight.insert(
            element,
            Attempt {
                generation,
                deadline: Instant::now() + self.budget,
            },
        );
        self.statuses.insert(element, DescribeStatus::Processing);

        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = provider.describe(&image, &credential);
            // The engine may already be gone; a dead receiver is fine.
            let _ = tx.send(Completion {
                element,
                generation,
                result,
            });
        });
    }

    /// Apply any completions that have arrived since the last tick, then
    /// fail attempts whose wait budget elapsed.
    ///
    /// A completion is dropped when its generation no longer matches the
    /// in-flight attempt or its element has been retired from the registry:
    /// no cache write, no status change, no overlay for the stale id. An
    /// attempt past its deadline becomes `Failed(Timeout)`; the worker's
    /// eventual answer then fails the generation check and is dropped too.
    /// Returns the elements whose status changed.
    pub fn drain(&mut self, registry: &ElementRegistry, now: Instant) -> Vec<ElementId> {
        let mut applied = Vec::new();
        while let Ok(done) = self.rx.try_recv() {
            if self.shut_down {
                continue;
            }
            if self.inflight.get(&done.element).map(|a| a.generation) != Some(done.generation) {
                tracing::debug!(element = ?done.element, "dropping stale describe completion");
                continue;
            }
            self.inflight.remove(&done.element);
            if !registry.contains(done.element) {
                tracing::debug!(element = ?done.element, "element retired mid-request, discarding result");
                self.statuses.remove(&done.element);
                continue;
            }
            let status = match done.result {
                Ok(text) => DescribeStatus::Done(text),
                Err(err) => {
                    tracing::warn!(element = ?done.element, error = %err, "describe attempt failed");
                    DescribeStatus::Failed(err)
                }
            };
            self.statuses.insert(done.element, status);
            applied.push(done.element);
        }

        if !self.shut_down {
            let expired: Vec<ElementId> = self
                .inflight
                .iter()
                .filter(|(_, attempt)| now >= attempt.deadline)
                .map(|(&id, _)| id)
                .collect();
            for id in expired {
                self.inflight.remove(&id);
                if !registry.contains(id) {
                    self.statuses.remove(&id);
                    continue;
                }
                tracing::warn!(element = ?id, "describe attempt exceeded its wait budget");
                self.statuses
                    .insert(id, DescribeStatus::Failed(DescribeError::Timeout));
                applied.push(id);
            }
        }
        applied
    }

    /// Forget all request state for retired ids. Late completions for them
    /// fail the generation check and are dropped.
    pub fn invalidate(&mut self, ids: &[ElementId]) {
        for id in ids {
            self.statuses.remove(id);
            self.inflight.remove(id);
        }
    }

    /// Stop applying results. Worker threads already in flight run to their
    /// own (bounded) timeout and their sends land in a drained-but-ignored
    /// channel.
    pub fn shutdown(&mut self) {
        self.shut_down = true;
        self.inflight.clear();
        self.statuses.clear();
    }
}
