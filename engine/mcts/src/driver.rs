//! Threaded search driver.
//!
//! Wraps one [`SearchTree`] and one random generator behind a mutex, spawns
//! a single worker that runs simulations toward an atomic target counter,
//! and exposes blocking operations that can query and advance the tree while
//! the worker keeps simulating.
//!
//! The tree itself is strictly single-threaded; the driver serializes every
//! engine call, including each individual simulation, under one coarse lock.
//! Host threads may call driver methods concurrently and are ordered by lock
//! acquisition. `target_sims` and the stop flag are atomics read outside the
//! mutex; writers notify the condition variable after setting them so the
//! worker cannot miss a wake-up.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{error, warn};

use crate::config::SearchConfig;
use crate::game::GamePosition;
use crate::search::SearchError;
use crate::tree::SearchTree;

/// How long `ensure_sims` waits for the worker before giving up.
const ENSURE_SIMS_TIMEOUT: Duration = Duration::from_secs(10);

/// Granularity of the sleep-poll loops.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Consecutive worker failures tolerated before outstanding work is
/// abandoned. A persistently failing position would otherwise spin the
/// worker forever, since failed iterations do not decrement the target.
const CIRCUIT_BREAKER_LIMIT: usize = 16;

struct Inner<G> {
    tree: SearchTree<G>,
    rng: ChaCha20Rng,
}

struct Shared<G> {
    inner: Mutex<Inner<G>>,
    work_ready: Condvar,
    stop: AtomicBool,
    target_sims: AtomicUsize,
    config: SearchConfig,
}

impl<G> Shared<G> {
    fn lock(&self) -> MutexGuard<'_, Inner<G>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Background-searching wrapper around a [`SearchTree`].
///
/// Construction roots the tree at the game's default position and spawns the
/// worker; dropping the driver stops and joins it. All randomness flows
/// through a single generator seeded from
/// [`SearchConfig::seed`](crate::SearchConfig), so two drivers with the same
/// configuration and call sequence produce identical trees.
pub struct ThreadedSearch<G: GamePosition + Default> {
    shared: Arc<Shared<G>>,
    worker: Option<JoinHandle<()>>,
}

impl<G: GamePosition + Default> ThreadedSearch<G> {
    /// Spawn a driver rooted at `G::default()`.
    pub fn new(config: SearchConfig) -> Self {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                tree: SearchTree::new(G::default()),
                rng: ChaCha20Rng::seed_from_u64(config.seed),
            }),
            work_ready: Condvar::new(),
            stop: AtomicBool::new(false),
            target_sims: AtomicUsize::new(0),
            config,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || worker_loop(&worker_shared));

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// The driver's configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.shared.config
    }

    /// Render the root position, optionally from the other player's
    /// perspective.
    pub fn display(&self, flip: bool) -> String {
        let inner = self.shared.lock();
        let state = inner.tree.root_state();
        if flip {
            state.flipped().render()
        } else {
            state.render()
        }
    }

    /// Advance the root to the child matching `action_text`.
    pub fn make_move(&self, action_text: &str, flip: bool) -> Result<(), SearchError> {
        self.shared.lock().tree.make_move_by_text(action_text, flip)
    }

    /// Sorted `(visit_count, equity, action_text)` report for the root's
    /// children; equity is from the root mover's perspective.
    pub fn sorted_actions(&self, flip: bool) -> Result<Vec<(usize, f64, String)>, SearchError> {
        self.shared.lock().tree.sorted_actions(flip)
    }

    /// Visit count of the current root.
    pub fn visit_count(&self) -> usize {
        self.shared.lock().tree.visit_count()
    }

    /// Whether the root position is terminal.
    pub fn is_terminal(&self) -> bool {
        self.shared.lock().tree.root_state().is_terminal()
    }

    /// Root equity, masked for confidence.
    ///
    /// Returns `None` when the root was never evaluated, and also when the
    /// equity is exactly +/-1.0 while more legal moves remain than
    /// [`SearchConfig::false_terminal_move_threshold`] — an early-game
    /// "false terminal" that a handful of lucky rollouts can produce.
    pub fn evaluation(&self) -> Option<f64> {
        let mut inner = self.shared.lock();
        let equity = inner.tree.equity().ok()?;
        if equity.abs() == 1.0
            && inner.tree.child_count() > self.shared.config.false_terminal_move_threshold
        {
            return None;
        }
        Some(equity)
    }

    /// Best-effort: run simulations until the root has at least `sims`
    /// visits, or a timeout window passes without the worker finishing.
    /// Callers needing a guarantee should re-check `visit_count`.
    pub fn ensure_sims(&self, sims: usize) {
        if self.shared.config.sim_increment == 0 {
            return;
        }
        let current = self.visit_count();
        if current >= sims {
            return;
        }
        self.shared
            .target_sims
            .store(sims - current, Ordering::Release);
        self.shared.work_ready.notify_one();
        self.wait_for_target(Some(ENSURE_SIMS_TIMEOUT));

        // the worker may have been cut off by the timeout; grant one more
        // increment before returning regardless
        let still_short = self.shared.lock().tree.visit_count() < sims;
        if still_short {
            self.shared.target_sims.store(1, Ordering::Release);
            self.shared.work_ready.notify_one();
            self.wait_for_target(Some(ENSURE_SIMS_TIMEOUT));
        }
    }

    /// Run the epsilon-greedy action choice on the current statistics,
    /// advance the root, and return the chosen move's text from the mover's
    /// perspective.
    pub fn choose_best_action(&self, epsilon: f64) -> Result<String, SearchError> {
        let mut inner = self.shared.lock();
        let Inner { tree, rng } = &mut *inner;
        tree.choose_best_action(rng, epsilon, self.shared.config.decide_using_visits)?;
        Ok(tree.root_state().action_text(true))
    }

    /// Replace the tree with a fresh one rooted at `state`, drive
    /// `min_simulations`, then greedily choose and play the best move,
    /// returning its action text rendered with `flip`.
    pub fn set_state_and_make_best_move(
        &self,
        state: G,
        flip: bool,
    ) -> Result<String, SearchError> {
        {
            let mut inner = self.shared.lock();
            inner.tree = SearchTree::new(state);
        }

        let min_sims = self.shared.config.min_simulations;
        if min_sims > 0 && self.shared.config.sim_increment > 0 {
            self.shared.target_sims.store(min_sims, Ordering::Release);
            self.shared.work_ready.notify_one();
            self.wait_for_target(None);
        }

        let mut inner = self.shared.lock();
        let Inner { tree, rng } = &mut *inner;
        tree.choose_best_action(rng, 0.0, self.shared.config.decide_using_visits)?;
        Ok(tree.root_state().action_text(flip))
    }

    /// Sleep-poll until the worker drains `target_sims`, the stop flag is
    /// raised, or (when given) the timeout elapses; on timeout the remaining
    /// target is abandoned.
    fn wait_for_target(&self, timeout: Option<Duration>) {
        let start = Instant::now();
        while self.shared.target_sims.load(Ordering::Acquire) > 0
            && !self.shared.stop.load(Ordering::Acquire)
        {
            if let Some(limit) = timeout {
                if start.elapsed() > limit {
                    self.shared.target_sims.store(0, Ordering::Release);
                    return;
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl<G: GamePosition + Default> Drop for ThreadedSearch<G> {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.work_ready.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Worker thread body: park on the condition variable while there is no
/// work, otherwise run up to `sim_increment` simulations — each one
/// individually under the lock — re-checking the stop flag and the target
/// between iterations.
fn worker_loop<G: GamePosition + Default>(shared: &Shared<G>) {
    let mut consecutive_failures = 0usize;
    let mut guard = shared.lock();

    loop {
        if shared.stop.load(Ordering::Acquire) {
            return;
        }
        let target = shared.target_sims.load(Ordering::Acquire);
        if target == 0 {
            guard = shared
                .work_ready
                .wait(guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            continue;
        }
        if shared.config.sim_increment == 0 {
            // an increment of zero can never make progress
            shared.target_sims.store(0, Ordering::Release);
            continue;
        }

        drop(guard);
        let burst = shared.config.sim_increment.min(target);
        for _ in 0..burst {
            if shared.stop.load(Ordering::Acquire)
                || shared.target_sims.load(Ordering::Acquire) == 0
            {
                break;
            }

            let mut inner = shared.lock();
            let Inner { tree, rng } = &mut *inner;
            match tree.simulate(1, rng, &shared.config) {
                Ok(()) => {
                    consecutive_failures = 0;
                    // a concurrent writer may have zeroed the target already
                    let _ = shared.target_sims.fetch_update(
                        Ordering::AcqRel,
                        Ordering::Acquire,
                        |t| t.checked_sub(1),
                    );
                }
                Err(err) => {
                    // nobody can receive this synchronously; log and keep
                    // the target so a transient cause can be retried
                    warn!(error = %err, "simulation failed in worker");
                    consecutive_failures += 1;
                    if consecutive_failures >= CIRCUIT_BREAKER_LIMIT {
                        error!(
                            failures = consecutive_failures,
                            "simulations failing persistently; abandoning outstanding work"
                        );
                        shared.target_sims.store(0, Ordering::Release);
                        consecutive_failures = 0;
                        break;
                    }
                }
            }
        }
        guard = shared.lock();
    }
}
