//! Keeps one surface's in-memory state in step with edits other surfaces
//! make to the shared files.
//!
//! Each surface watches the category file (and the application
//! directories). A change moves its [`SyncCoordinator`] from `Idle` to
//! `Debouncing`; when the quiet period ends it reloads and notifies the
//! rebuild listeners, then returns to `Idle`. Notifications caused by the
//! surface's own saves are recognised by content fingerprint and ignored.

use crate::context::MenuContext;
use crate::store::Fingerprint;
use crate::subscription::{Disposer, Listeners, Subscription};
use crate::watch::{ChangeKind, Debounce, FileChangeNotifier};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Debouncing,
    Reloading,
}

/// Debounced reload state machine for one watched resource.
#[derive(Debug)]
pub struct SyncCoordinator {
    state: SyncState,
    debounce: Debounce,
    accepts: fn(ChangeKind) -> bool,
    torn_down: bool,
}

impl SyncCoordinator {
    /// Coordinator for a store file: only content changes and creations
    /// count.
    pub fn for_file(delay: Duration) -> Self {
        Self::with_filter(delay, ChangeKind::touches_content)
    }

    /// Coordinator for watched directories: removals count too.
    pub fn for_directories(delay: Duration) -> Self {
        Self::with_filter(delay, ChangeKind::touches_listing)
    }

    fn with_filter(delay: Duration, accepts: fn(ChangeKind) -> bool) -> Self {
        Self {
            state: SyncState::Idle,
            debounce: Debounce::new(delay),
            accepts,
            torn_down: false,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Feed one change event. `echo` marks an event caused by this surface's
    /// own write. Returns whether the event was taken into account.
    ///
    /// Events arriving while a reload is in flight re-arm the timer; the
    /// reload is not interrupted.
    pub fn on_change(&mut self, kind: ChangeKind, echo: bool, now: Instant) -> bool {
        if self.torn_down || !(self.accepts)(kind) {
            return false;
        }
        if echo {
            tracing::trace!(?kind, "ignoring own write");
            return false;
        }
        self.debounce.arm(now);
        if self.state == SyncState::Idle {
            self.state = SyncState::Debouncing;
        }
        true
    }

    /// Returns `true` when the quiet period is over and the caller should
    /// reload now. The coordinator is then in `Reloading` until
    /// [`finish_reload`](Self::finish_reload).
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.state == SyncState::Debouncing && self.debounce.fire(now) {
            self.state = SyncState::Reloading;
            return true;
        }
        false
    }

    pub fn finish_reload(&mut self) {
        if self.state != SyncState::Reloading {
            return;
        }
        self.state = if self.debounce.is_armed() {
            SyncState::Debouncing
        } else {
            SyncState::Idle
        };
    }

    /// Cancel any pending reload for good. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.debounce.close();
        self.state = SyncState::Idle;
    }
}

/// Which process a surface belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Editor,
    Popup,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpOutcome {
    pub reloaded_categories: bool,
    pub refreshed_applications: bool,
}

/// A running view over a [`MenuContext`] that follows external edits.
pub struct Surface {
    role: Role,
    ctx: MenuContext,
    categories_watch: FileChangeNotifier,
    apps_watch: FileChangeNotifier,
    categories_sync: SyncCoordinator,
    apps_sync: SyncCoordinator,
    rebuild: Listeners<MenuContext>,
    disposer: Disposer,
    pending: Vec<ChangeKind>,
    torn_down: bool,
}

impl Surface {
    /// Watch the category file and the registry's application
    /// directories. A watch that cannot be set up leaves the surface
    /// working without live reload.
    pub fn new(ctx: MenuContext, role: Role) -> Self {
        let categories_watch = FileChangeNotifier::watch_file(ctx.categories().path())
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "live reload of categories disabled");
                FileChangeNotifier::detached()
            });
        let app_dirs = ctx.registry().watch_dirs();
        let apps_watch = if app_dirs.is_empty() {
            FileChangeNotifier::detached()
        } else {
            FileChangeNotifier::watch_dirs(&app_dirs).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "application list will not refresh");
                FileChangeNotifier::detached()
            })
        };
        tracing::debug!(dirs = ?apps_watch.watched(), "watching application directories");
        Self::with_notifiers(ctx, role, categories_watch, apps_watch)
    }

    /// Build a surface around caller-provided notifiers.
    pub fn with_notifiers(
        ctx: MenuContext,
        role: Role,
        categories_watch: FileChangeNotifier,
        apps_watch: FileChangeNotifier,
    ) -> Self {
        let delay = ctx.settings().debounce();
        tracing::debug!(?role, "surface started");
        Self {
            role,
            ctx,
            categories_watch,
            apps_watch,
            categories_sync: SyncCoordinator::for_file(delay),
            apps_sync: SyncCoordinator::for_directories(delay),
            rebuild: Listeners::new(),
            disposer: Disposer::new(),
            pending: Vec::new(),
            torn_down: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn context(&self) -> &MenuContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut MenuContext {
        &mut self.ctx
    }

    pub fn state(&self) -> SyncState {
        self.categories_sync.state()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Register a callback run after every reload. Dropping the returned
    /// handle unregisters it.
    pub fn on_rebuild(&mut self, callback: impl FnMut(&MenuContext) + 'static) -> Subscription {
        self.rebuild.subscribe(callback)
    }

    /// Keep `subscription` alive until teardown.
    pub fn keep(&mut self, subscription: Subscription) {
        self.disposer.add(subscription);
    }

    /// Earliest pending debounce deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.categories_sync.deadline(), self.apps_sync.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Block until a category change arrives, the next deadline passes or
    /// `max` elapses, whichever comes first. Events are left for
    /// [`pump`](Self::pump).
    pub fn wait(&mut self, max: Duration) {
        if self.torn_down {
            return;
        }
        let timeout = self
            .next_deadline()
            .map(|d| d.saturating_duration_since(Instant::now()).min(max))
            .unwrap_or(max);
        if self.categories_watch.is_live() {
            if let Some(kind) = self.categories_watch.wait(timeout) {
                self.pending.push(kind);
            }
        } else {
            std::thread::sleep(timeout);
        }
    }

    /// Process pending change events and run any reload that is due.
    pub fn pump(&mut self, now: Instant) -> PumpOutcome {
        let mut outcome = PumpOutcome::default();
        if self.torn_down {
            return outcome;
        }

        self.feed_category_events(now);
        if self.categories_sync.poll(now) {
            let report = self.ctx.reload();
            tracing::info!(
                role = ?self.role,
                categories = self.ctx.categories().len(),
                skipped = report.skipped.len(),
                "reloaded categories"
            );
            self.rebuild.emit(&self.ctx);
            // Edits that landed while reloading wait for another quiet period.
            self.feed_category_events(now);
            self.categories_sync.finish_reload();
            outcome.reloaded_categories = true;
        }

        for kind in self.apps_watch.drain() {
            self.apps_sync.on_change(kind, false, now);
        }
        if self.apps_sync.poll(now) {
            match self.ctx.refresh_registry() {
                Ok(()) => tracing::info!(role = ?self.role, "refreshed applications"),
                Err(e) => self.ctx.notices().report("refreshing applications", &e),
            }
            self.rebuild.emit(&self.ctx);
            self.apps_sync.finish_reload();
            outcome.refreshed_applications = true;
        }
        outcome
    }

    fn feed_category_events(&mut self, now: Instant) {
        let mut events = std::mem::take(&mut self.pending);
        events.extend(self.categories_watch.drain());
        if events.is_empty() {
            return;
        }
        let echo = self.is_own_write();
        for kind in events {
            self.categories_sync.on_change(kind, echo, now);
        }
    }

    /// Whether the category file holds exactly what this surface last
    /// loaded or saved.
    fn is_own_write(&self) -> bool {
        let store = self.ctx.categories();
        Fingerprint::of_file(store.path()).as_ref() == store.fingerprint()
    }

    /// Pump until `stop` is set, waking at most every `tick`.
    pub fn run(&mut self, stop: &AtomicBool, tick: Duration) {
        while !stop.load(Ordering::Relaxed) && !self.torn_down {
            self.wait(tick);
            self.pump(Instant::now());
        }
    }

    /// Stop watching, cancel pending reloads and release every
    /// subscription. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.categories_sync.teardown();
        self.apps_sync.teardown();
        self.categories_watch.close();
        self.apps_watch.close();
        self.disposer.dispose();
        self.pending.clear();
        tracing::debug!(role = ?self.role, "surface torn down");
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn burst_of_events_reloads_once() {
        let t0 = Instant::now();
        let mut sync = SyncCoordinator::for_file(DELAY);
        assert!(sync.on_change(ChangeKind::Content, false, t0));
        assert!(sync.on_change(ChangeKind::Created, false, t0 + Duration::from_millis(200)));
        assert_eq!(sync.state(), SyncState::Debouncing);
        assert!(!sync.poll(t0 + Duration::from_millis(600)));
        assert!(sync.poll(t0 + Duration::from_millis(700)));
        assert_eq!(sync.state(), SyncState::Reloading);
        assert!(!sync.poll(t0 + Duration::from_millis(800)));
        sync.finish_reload();
        assert_eq!(sync.state(), SyncState::Idle);
    }

    #[test]
    fn attribute_changes_and_echoes_stay_idle() {
        let t0 = Instant::now();
        let mut sync = SyncCoordinator::for_file(DELAY);
        assert!(!sync.on_change(ChangeKind::Attribute, false, t0));
        assert!(!sync.on_change(ChangeKind::Removed, false, t0));
        assert!(!sync.on_change(ChangeKind::Content, true, t0));
        assert_eq!(sync.state(), SyncState::Idle);
        assert_eq!(sync.deadline(), None);
    }

    #[test]
    fn change_during_reload_is_deferred() {
        let t0 = Instant::now();
        let mut sync = SyncCoordinator::for_file(DELAY);
        sync.on_change(ChangeKind::Content, false, t0);
        let t1 = t0 + DELAY;
        assert!(sync.poll(t1));
        assert!(sync.on_change(ChangeKind::Content, false, t1));
        assert_eq!(sync.state(), SyncState::Reloading);
        sync.finish_reload();
        assert_eq!(sync.state(), SyncState::Debouncing);
        assert!(sync.poll(t1 + DELAY));
    }

    #[test]
    fn directory_coordinator_accepts_removals() {
        let t0 = Instant::now();
        let mut sync = SyncCoordinator::for_directories(DELAY);
        assert!(sync.on_change(ChangeKind::Removed, false, t0));
        assert!(!sync.on_change(ChangeKind::Attribute, false, t0));
    }

    #[test]
    fn teardown_cancels_pending_reload() {
        let t0 = Instant::now();
        let mut sync = SyncCoordinator::for_file(DELAY);
        sync.on_change(ChangeKind::Content, false, t0);
        sync.teardown();
        sync.teardown();
        assert!(!sync.on_change(ChangeKind::Content, false, t0));
        assert!(!sync.poll(t0 + Duration::from_secs(10)));
        assert_eq!(sync.state(), SyncState::Idle);
    }
}
