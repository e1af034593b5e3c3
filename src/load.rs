//! Visibility-driven lazy loading.
//!
//! One [`ImageSlot`] manages one rendered image. It waits until the render
//! target actually becomes visible, asks the [`Negotiator`] for the best
//! variant of the photo, fetches it, and falls back to the original encoding
//! (once) if the negotiated variant fails. Consumers watch a [`LoadState`]
//! stream and render a blur/placeholder until it reaches `Loaded`, or a
//! fixed placeholder graphic on `Failed`. Asset problems never surface as
//! errors; the page degrades, it does not halt.
//!
//! ## Driving
//!
//! [`ImageSlot::bind`] wires the slot up and returns the slot plus a
//! [`SlotHandle`]. Nothing is spawned internally: the caller owns scheduling
//! and drives [`ImageSlot::run`] on whatever executor it already has. Within
//! one slot at most one fetch is in flight at a time; slots across a page
//! are fully independent.
//!
//! ## Teardown
//!
//! [`SlotHandle::unbind`] is safe in any state: it cancels a still-pending
//! visibility observation and flips an alive flag checked before every state
//! commit, so an in-flight fetch may complete but its result is discarded
//! rather than applied to a render target that no longer exists.

use crate::negotiate::Negotiator;
use crate::store::AssetStore;
use crate::types::LogicalPhoto;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, watch};
use tracing::debug;

/// Loading lifecycle of one bound image.
///
/// `Loading` appears at most twice (negotiated attempt, then fallback);
/// `Loaded` and `Failed` are terminal. Observed through a `watch` channel,
/// which conflates intermediate values: consumers render from the current
/// state, they do not replay transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Bound, render target not yet visible. No network activity.
    Pending,
    /// The render target entered the viewport; a fetch is imminent.
    InView,
    /// A fetch for `src` is in flight. `fallback` is true on the second
    /// attempt (original encoding after the negotiated variant failed).
    Loading { src: String, fallback: bool },
    /// Terminal success: `src` is ready to display at full clarity.
    Loaded { src: String },
    /// Terminal failure: both attempts failed; show the placeholder graphic.
    Failed,
}

impl LoadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Loaded { .. } | LoadState::Failed)
    }
}

/// Callback invoked when a render target first becomes visible.
pub type VisibilityCallback = Box<dyn FnOnce() + Send>;

/// Edge-triggered visibility source for one render target.
///
/// Implementations deliver each callback at most once. The returned
/// [`Subscription`] cancels the observation when dropped, so holders get
/// single-fire semantics by dropping it on first delivery.
pub trait VisibilitySignal {
    fn on_became_visible(&self, callback: VisibilityCallback) -> Subscription;
}

/// Handle to an active visibility observation; dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Manually driven visibility source.
///
/// Embedders bridge their own intersection machinery by calling
/// [`fire`](ManualVisibility::fire) when the observed region enters the
/// viewport. Doubles as the test implementation.
#[derive(Default)]
pub struct ManualVisibility {
    inner: Arc<Mutex<ManualInner>>,
}

#[derive(Default)]
struct ManualInner {
    next_id: u64,
    pending: Vec<(u64, VisibilityCallback)>,
}

impl ManualVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver the visibility edge to every pending callback, once each.
    /// Later calls are no-ops for callbacks already delivered.
    pub fn fire(&self) {
        let drained: Vec<(u64, VisibilityCallback)> = {
            let mut inner = self.inner.lock().unwrap();
            inner.pending.drain(..).collect()
        };
        for (_, callback) in drained {
            callback();
        }
    }

    /// Number of callbacks still waiting for the edge.
    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }
}

impl VisibilitySignal for ManualVisibility {
    fn on_became_visible(&self, callback: VisibilityCallback) -> Subscription {
        let id = {
            let mut inner = self.inner.lock().unwrap();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.pending.push((id, callback));
            id
        };
        let registry = Arc::clone(&self.inner);
        Subscription::new(move || {
            registry
                .lock()
                .unwrap()
                .pending
                .retain(|(pending_id, _)| *pending_id != id);
        })
    }
}

/// Per-binding knobs.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Skip visibility tracking and fetch immediately. For above-the-fold
    /// images that are visible at mount.
    pub eager: bool,
}

/// Consumer side of a binding: the state stream plus teardown.
pub struct SlotHandle {
    states: watch::Receiver<LoadState>,
    alive: Arc<AtomicBool>,
    subscription: Arc<Mutex<Option<Subscription>>>,
}

impl SlotHandle {
    /// Stream of state changes. Clone freely; `borrow()` reads the current
    /// value without waiting.
    pub fn states(&self) -> watch::Receiver<LoadState> {
        self.states.clone()
    }

    /// Current state.
    pub fn state(&self) -> LoadState {
        self.states.borrow().clone()
    }

    /// Tear the binding down. Cancels any pending visibility observation
    /// and suppresses every state update in-flight work would still commit.
    /// Safe in any state; idempotent.
    pub fn unbind(&self) {
        self.alive.store(false, Ordering::Release);
        self.subscription.lock().unwrap().take();
    }
}

/// One bound image: drives [`LoadState`] from `Pending` to a terminal state.
pub struct ImageSlot<S: AssetStore + ?Sized> {
    photo: LogicalPhoto,
    store: Arc<S>,
    negotiator: Arc<Negotiator>,
    state: watch::Sender<LoadState>,
    visible: Arc<Notify>,
    alive: Arc<AtomicBool>,
    subscription: Arc<Mutex<Option<Subscription>>>,
    eager: bool,
}

impl<S: AssetStore + ?Sized> ImageSlot<S> {
    /// Bind `photo` to a render target.
    ///
    /// Subscribes to `viewport` unless `options.eager` is set. The returned
    /// slot must be driven with [`run`](ImageSlot::run); the handle observes
    /// and tears down.
    pub fn bind(
        photo: LogicalPhoto,
        store: Arc<S>,
        negotiator: Arc<Negotiator>,
        viewport: &dyn VisibilitySignal,
        options: LoadOptions,
    ) -> (Self, SlotHandle) {
        let (state, states) = watch::channel(LoadState::Pending);
        let visible = Arc::new(Notify::new());
        let alive = Arc::new(AtomicBool::new(true));
        let subscription = Arc::new(Mutex::new(None));

        if !options.eager {
            let edge = Arc::clone(&visible);
            *subscription.lock().unwrap() =
                Some(viewport.on_became_visible(Box::new(move || edge.notify_one())));
        }

        let handle = SlotHandle {
            states,
            alive: Arc::clone(&alive),
            subscription: Arc::clone(&subscription),
        };
        let slot = Self {
            photo,
            store,
            negotiator,
            state,
            visible,
            alive,
            subscription,
            eager: options.eager,
        };
        (slot, handle)
    }

    /// Drive the binding to a terminal state.
    ///
    /// Suspends until the visibility edge (unless eager), then performs at
    /// most two fetches: the negotiated variant, and on its failure the
    /// original `base_source`, but only when the two differ. Every state
    /// commit is skipped once the handle has unbound.
    pub async fn run(self) {
        if !self.eager {
            self.visible.notified().await;
            // single-fire: tracking ends the moment the edge arrives
            self.subscription.lock().unwrap().take();
        }
        if !self.commit(LoadState::InView) {
            return;
        }

        let negotiated = self.negotiator.negotiate(&self.photo.base_source);
        if !self.commit(LoadState::Loading {
            src: negotiated.clone(),
            fallback: false,
        }) {
            return;
        }

        if self.store.fetch(&negotiated).await.is_ok() {
            self.commit(LoadState::Loaded { src: negotiated });
            return;
        }

        if negotiated != self.photo.base_source {
            debug!(src = %self.photo.base_source, "negotiated variant failed, retrying original");
            if !self.commit(LoadState::Loading {
                src: self.photo.base_source.clone(),
                fallback: true,
            }) {
                return;
            }
            if self.store.fetch(&self.photo.base_source).await.is_ok() {
                self.commit(LoadState::Loaded {
                    src: self.photo.base_source.clone(),
                });
                return;
            }
        }

        self.commit(LoadState::Failed);
    }

    /// Publish `next` unless the binding was torn down. Returns whether the
    /// update was committed.
    fn commit(&self, next: LoadState) -> bool {
        if !self.alive.load(Ordering::Acquire) {
            return false;
        }
        self.state.send_replace(next);
        true
    }
}
