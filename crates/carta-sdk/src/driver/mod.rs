// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The frame driver: one rendering pass per call from the windowing layer.
//!
//! The first `display` call initialises the pipeline on the render thread:
//! it probes the device, runs the renderer viability harness, sizes the GPU
//! cache budget and opens the initialisation barrier. Every later call drains
//! the task queue, runs an optional PICK pass, the DRAW pass, and then frees
//! device resources released by the cache.
//!
//! A renderer error or a panic escaping a pass is fatal: the driver enters the
//! faulted state and invokes its [`FaultPolicy`].

mod builder;
mod frame;

pub use builder::FrameDriverBuilder;
pub use frame::{FrameOutcome, FrameStats, PickPoint};

use crate::barrier::{Begin, InitBarrier, InitState};
use crate::capabilities::RenderCapabilities;
use crate::capture::{CaptureId, CaptureListener, CaptureRequests};
use crate::fault::{FaultPolicy, FaultReport};
use crate::memory::MemoryPressureWatcher;
use crate::pacing::{FramePacer, PickThrottle, RepaintCoalescer};
use crate::task_queue::{LoadSensitiveTaskQueue, RenderTaskQueue, TaskRoute};
use carta_agents::{
    DisposalHelpers, GeometryDistributor, PickManager, RendererSet, RendererSetFactory,
    ViabilityReport,
};
use carta_core::config::PipelineConfig;
use carta_core::event::{ListenerId, ListenerList, NotificationSeverity, UserNotification};
use carta_core::geometry::{Geometry, GeometryId};
use carta_core::render::{ProjectionSnapshot, RenderContext, RenderMode, Rgba8, TimeBudget};
use carta_core::renderer::{DeviceInfo, GraphicsDevice, RenderError};
use carta_core::{FrameRateMode, Stopwatch};
use carta_data::{BudgetClass, RenderDataCache};
use carta_telemetry::{CacheUsage, FrameRateSampler, RendererStatistics, StatisticsPublisher, TelemetryService};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::{Duration, Instant};

/// Suppression key of the fatal-fault notification.
pub const FAULT_NOTIFICATION_KEY: &str = "carta.fatal-fault";

const BACKGROUND: Rgba8 = Rgba8::BLACK;

/// Render-thread state, only touched inside `display` and `shutdown`.
struct RenderState {
    harness: RendererSetFactory,
    renderers: Option<RendererSet>,
    helpers: DisposalHelpers,
    pick_throttle: PickThrottle,
    sampler: FrameRateSampler,
    telemetry: TelemetryService,
    pressure: Option<MemoryPressureWatcher>,
    device_info: DeviceInfo,
    shut_down: bool,
}

/// Orchestrates the rendering pipeline of one graphics context.
pub struct FrameDriver {
    config: PipelineConfig,
    device: Arc<dyn GraphicsDevice>,
    cache: RenderDataCache,
    distributor: GeometryDistributor,
    picks: PickManager,
    queue: Arc<RenderTaskQueue>,
    tasks: Mutex<LoadSensitiveTaskQueue>,
    repaint: Arc<RepaintCoalescer>,
    pacer: Mutex<FramePacer>,
    barrier: InitBarrier,
    capabilities: Mutex<Option<RenderCapabilities>>,
    viability: Mutex<Option<ViabilityReport>>,
    notifications: ListenerList<UserNotification>,
    suppressed: Mutex<HashSet<String>>,
    captures: CaptureRequests,
    statistics: StatisticsPublisher,
    fault_policy: FaultPolicy,
    faulted: AtomicBool,
    frames_skipped: AtomicU64,
    pick_point: Mutex<Option<PickPoint>>,
    render: Mutex<RenderState>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {message}")
    } else {
        "panic".to_string()
    }
}

impl FrameDriver {
    /// Starts configuring a driver for `device`.
    pub fn builder(device: Arc<dyn GraphicsDevice>) -> FrameDriverBuilder {
        FrameDriverBuilder::new(device)
    }

    /// The configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The render-data cache.
    pub fn cache(&self) -> &RenderDataCache {
        &self.cache
    }

    /// The geometry distributor.
    pub fn distributor(&self) -> &GeometryDistributor {
        &self.distributor
    }

    /// The pick manager.
    pub fn pick_manager(&self) -> &PickManager {
        &self.picks
    }

    /// Runs one frame. Must be called on the render thread.
    pub fn display(&self, projection: &ProjectionSnapshot) -> FrameOutcome {
        if self.faulted.load(Ordering::Acquire) {
            return FrameOutcome::Faulted;
        }
        let mut render = match self.render.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return self.skip("a frame is already running"),
        };
        if render.shut_down {
            return FrameOutcome::Closed;
        }
        let initialize = match self.barrier.begin() {
            Begin::Initialize => true,
            Begin::Ready => false,
            Begin::Busy => return self.skip("initialisation in progress"),
            Begin::Failed => return FrameOutcome::Faulted,
        };

        let state = &mut *render;
        let result = panic::catch_unwind(AssertUnwindSafe(|| -> Result<FrameStats, RenderError> {
            if initialize {
                self.initialize(state)?;
            }
            self.render_frame(state, projection)
        }));
        match result {
            Ok(Ok(stats)) => FrameOutcome::Rendered(stats),
            Ok(Err(e)) => {
                self.fault(state, e.to_string());
                FrameOutcome::Faulted
            }
            Err(payload) => {
                self.fault(state, panic_message(payload));
                FrameOutcome::Faulted
            }
        }
    }

    fn skip(&self, reason: &str) -> FrameOutcome {
        self.frames_skipped.fetch_add(1, Ordering::Relaxed);
        log::debug!("FrameDriver: Frame skipped, {reason}.");
        FrameOutcome::Skipped
    }

    fn initialize(&self, state: &mut RenderState) -> Result<(), RenderError> {
        let device = self.device.as_ref();
        device.clear(BACKGROUND);
        let info = device.info();
        log::info!("FrameDriver: Initializing on {}.", info.identifier());

        let (renderers, report) = state.harness.build(device);

        match device.dedicated_memory_bytes() {
            Some(memory) => {
                let max = (memory as f64 * self.config.gpu_budget_fraction) as u64;
                self.cache
                    .set_budget(BudgetClass::Gpu, max, self.config.gpu_low_water_fraction)
                    .map_err(|e| RenderError::InitializationFailed(e.to_string()))?;
            }
            None => log::warn!(
                "FrameDriver: Device memory is unknown, keeping the default GPU cache budget."
            ),
        }

        state
            .helpers
            .open(&self.cache)
            .map_err(|e| RenderError::InitializationFailed(e.to_string()))?;
        state.renderers = Some(renderers);

        *lock(&self.capabilities) = Some(RenderCapabilities::from_device(&info, &device.capabilities()));
        state.device_info = info;

        if let Some(notification) = report.to_notification() {
            self.notify(&notification);
        }
        *lock(&self.viability) = Some(report);

        self.barrier.complete();
        log::info!("FrameDriver: Initialized.");
        Ok(())
    }

    fn render_frame(
        &self,
        state: &mut RenderState,
        projection: &ProjectionSnapshot,
    ) -> Result<FrameStats, RenderError> {
        let watch = Stopwatch::new();
        let now = Instant::now();
        let device = self.device.as_ref();
        self.repaint.frame_started();
        let budget = TimeBudget::new(self.config.frame_budget());
        let mut stats = FrameStats {
            tasks_run: self
                .queue
                .drain(device, &budget.sub_budget(self.config.task_queue_budget())),
            ..FrameStats::default()
        };
        if !self.queue.is_empty() {
            // Tasks left over by the queue budget need another frame.
            self.repaint.request_repaint();
        }

        if let Some(watcher) = state.pressure.as_mut() {
            watcher.poll(now, &self.cache);
        }
        if state.telemetry.tick() {
            state.telemetry.monitor_registry().update_all();
        }

        let renderers = state.renderers.as_mut().ok_or(RenderError::NotInitialized)?;

        let pick_point = *lock(&self.pick_point);
        if let Some(point) = pick_point {
            if state.pick_throttle.try_acquire(now) {
                device.clear(BACKGROUND);
                let ctx = RenderContext::new(device, RenderMode::Pick, projection)
                    .with_budget(budget)
                    .with_pick_colors(&self.picks);
                let outcome = self.distributor.render_geometries(&ctx, &self.cache, renderers)?;
                let (width, height) = device.framebuffer_size();
                let buffer = device.read_pixels(0, 0, width, height)?;
                self.picks
                    .determine_picks(&buffer, width, height, point.x, point.y, point.radius);
                stats.picked = true;
                stats.purged += outcome.purged;
            }
        }

        device.clear(BACKGROUND);
        let highlighted = self.picks.picked();
        let ctx = RenderContext::new(device, RenderMode::Draw, projection)
            .with_budget(budget)
            .with_highlighted(&highlighted);
        let outcome = self.distributor.render_geometries(&ctx, &self.cache, renderers)?;
        stats.rendered = outcome.totals.rendered;
        stats.rejected = outcome.totals.rejected.len();
        stats.draw_calls = outcome.totals.draw_calls;
        stats.unsupported = outcome.unsupported;
        stats.purged += outcome.purged;
        if stats.rejected > 0 {
            // Rejected geometries are retried on the next frame.
            self.repaint.request_repaint();
        }

        stats.freed = state
            .helpers
            .clean_oncard_memory(device)
            .map_err(|e| RenderError::Internal(e.to_string()))?;
        state
            .helpers
            .prune(&self.cache)
            .map_err(|e| RenderError::Internal(e.to_string()))?;

        if let Err(e) = self.captures.deliver(device, now) {
            log::warn!("FrameDriver: Frame capture failed: {e}");
        }

        lock(&self.pacer).frame_rendered(now);
        state.sampler.record_frame(now);
        stats.frame_time = watch.elapsed();
        self.publish_statistics(state, &stats, now);
        log::trace!("FrameDriver: {stats:?}");
        Ok(stats)
    }

    fn publish_statistics(&self, state: &mut RenderState, stats: &FrameStats, now: Instant) {
        if !self.statistics.is_due(now) {
            return;
        }
        state.sampler.sample();
        let sampler = &state.sampler;
        let info = &state.device_info;
        self.statistics.publish_if_due(now, || RendererStatistics {
            frames_per_second: sampler.frames_per_second(),
            frame_rate_samples: sampler.samples(),
            frames_rendered: sampler.total_frames(),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            rejected_geometries: stats.rejected,
            draw_calls: stats.draw_calls,
            cache: CacheUsage::from(&self.cache.stats()),
            ..RendererStatistics::for_device(info)
        });
    }

    fn fault(&self, state: &RenderState, message: String) {
        if self.faulted.swap(true, Ordering::AcqRel) {
            return;
        }
        log::error!("FrameDriver: Fatal rendering fault: {message}");
        self.barrier.fail();
        self.notify(&UserNotification {
            severity: NotificationSeverity::Fatal,
            title: "Rendering stopped after a graphics driver fault".to_string(),
            details: vec![message.clone()],
            suppression_key: FAULT_NOTIFICATION_KEY.to_string(),
        });
        self.fault_policy.invoke(&FaultReport {
            message,
            frames_rendered: state.sampler.total_frames(),
        });
    }

    fn notify(&self, notification: &UserNotification) {
        if lock(&self.suppressed).contains(&notification.suppression_key) {
            log::debug!(
                "FrameDriver: Notification '{}' is suppressed.",
                notification.suppression_key
            );
            return;
        }
        self.notifications.notify(notification);
    }

    /// Adds and removes geometries. Safe from any thread.
    pub fn update_geometries(&self, added: &[Arc<Geometry>], removed: &[GeometryId]) {
        self.distributor.update(added, removed);
        for id in removed {
            self.picks.release(*id);
        }
        self.repaint.request_repaint();
    }

    /// Sets or clears the point probed by PICK passes.
    pub fn set_pick_point(&self, point: Option<PickPoint>) {
        *lock(&self.pick_point) = point;
        if point.is_none() {
            self.picks.clear_picks();
        }
        self.repaint.request_repaint();
    }

    /// Geometries found under the pick point by the last PICK pass.
    pub fn picked(&self) -> HashSet<GeometryId> {
        self.picks.picked()
    }

    /// Queues a task for the render thread and asks for a frame to run it.
    /// Safe from any thread.
    pub fn submit_task(&self, task: impl FnOnce(&dyn GraphicsDevice) + Send + 'static) {
        self.queue.submit(task);
        self.repaint.request_repaint();
    }

    /// Queues a device-free task, on a background thread when the render
    /// queue is congested.
    pub fn submit_device_free(&self, task: impl FnOnce() + Send + 'static) -> TaskRoute {
        let route = lock(&self.tasks).submit(task);
        if route == TaskRoute::RenderThread {
            self.repaint.request_repaint();
        }
        route
    }

    /// Number of tasks waiting for the render thread.
    pub fn queued_tasks(&self) -> usize {
        self.queue.len()
    }

    /// Requests a frame. Returns whether this request reached the repaint listeners.
    pub fn request_repaint(&self) -> bool {
        self.repaint.request_repaint()
    }

    /// Adds a listener told when a frame should be scheduled.
    pub fn subscribe_repaint(&self, listener: impl Fn(&()) + Send + Sync + 'static) -> ListenerId {
        self.repaint.subscribe(listener)
    }

    /// Whether the windowing layer should render a frame at `now`.
    ///
    /// A single or scheduled capture falling due counts as a repaint request.
    pub fn is_frame_due(&self, now: Instant) -> bool {
        if self.captures.time_until_due(now) == Some(Duration::ZERO) {
            self.repaint.request_repaint();
        }
        lock(&self.pacer).is_due(now, self.repaint.is_pending())
    }

    /// Time until the next frame should be considered.
    ///
    /// On demand, this is the wait for the next scheduled capture, or zero
    /// when no capture is pending.
    pub fn time_until_next_frame(&self, now: Instant) -> Duration {
        let capture = self.captures.time_until_due(now);
        let pacer = lock(&self.pacer);
        match capture {
            Some(wait) if pacer.mode() == FrameRateMode::OnDemand => wait,
            _ => pacer.time_until_next(now),
        }
    }

    /// Initialisation progress.
    pub fn init_state(&self) -> InitState {
        self.barrier.state()
    }

    /// Blocks until initialisation settles. Returns `true` if it succeeded.
    pub fn wait_for_init_complete(&self) -> bool {
        self.barrier.wait()
    }

    /// Like [`wait_for_init_complete`](Self::wait_for_init_complete) with a timeout.
    pub fn wait_for_init_complete_timeout(&self, timeout: Duration) -> bool {
        self.barrier.wait_timeout(timeout)
    }

    /// The pipeline capabilities, blocking until initialisation settles.
    /// `None` if initialisation failed.
    pub fn capabilities(&self) -> Option<RenderCapabilities> {
        if !self.barrier.wait() {
            return None;
        }
        lock(&self.capabilities).clone()
    }

    /// The report of the renderer viability harness, once initialised.
    pub fn viability_report(&self) -> Option<ViabilityReport> {
        lock(&self.viability).clone()
    }

    /// Adds a listener for operator-facing notifications.
    pub fn subscribe_notifications(
        &self,
        listener: impl Fn(&UserNotification) + Send + Sync + 'static,
    ) -> ListenerId {
        self.notifications.subscribe(listener)
    }

    /// Stops delivering notifications with `key` ("don't show again").
    pub fn suppress_notification(&self, key: impl Into<String>) {
        lock(&self.suppressed).insert(key.into());
    }

    /// Adds a statistics listener, invoked at the configured interval.
    pub fn subscribe_statistics(
        &self,
        listener: impl Fn(&RendererStatistics) + Send + Sync + 'static,
    ) -> ListenerId {
        self.statistics.subscribe(listener)
    }

    /// Removes a statistics listener.
    pub fn unsubscribe_statistics(&self, id: ListenerId) -> bool {
        self.statistics.unsubscribe(id)
    }

    /// Captures the next rendered frame.
    pub fn capture_single_frame(&self, listener: CaptureListener) -> CaptureId {
        let id = self.captures.single(listener);
        self.repaint.request_repaint();
        id
    }

    /// Captures every rendered frame until cancelled.
    pub fn capture_stream(&self, listener: CaptureListener) -> CaptureId {
        let id = self.captures.stream(listener);
        self.repaint.request_repaint();
        id
    }

    /// Captures a rendered frame at most once per `interval` until cancelled.
    ///
    /// In on-demand mode the driver asks for a frame whenever the interval
    /// falls due, see [`is_frame_due`](Self::is_frame_due).
    pub fn capture_scheduled(&self, listener: CaptureListener, interval: Duration) -> CaptureId {
        let id = self.captures.scheduled(listener, interval);
        self.repaint.request_repaint();
        id
    }

    /// Cancels a capture request.
    pub fn cancel_capture(&self, id: CaptureId) -> bool {
        self.captures.cancel(id)
    }

    /// Whether a fatal fault stopped the pipeline.
    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Acquire)
    }

    /// Frames skipped so far.
    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped.load(Ordering::Relaxed)
    }

    /// Releases every geometry and device resource.
    ///
    /// Safe whether or not initialisation ran; later calls are no-ops. Must be
    /// called on the render thread.
    pub fn shutdown(&self) {
        let mut render = lock(&self.render);
        if render.shut_down {
            log::debug!("FrameDriver: Already shut down.");
            return;
        }
        render.shut_down = true;
        let state = &mut *render;

        self.distributor.close(&self.cache, state.renderers.as_mut());
        if state.helpers.is_open() {
            match state.helpers.force_dispose(self.device.as_ref(), &self.cache) {
                Ok(freed) => log::info!("FrameDriver: Released {freed} device resources."),
                Err(e) => log::error!("FrameDriver: Releasing device resources failed: {e}"),
            }
        } else {
            self.cache.clear();
        }
        if let Err(e) = state.helpers.close() {
            log::error!("FrameDriver: {e}");
        }
        state.renderers = None;
        lock(&self.tasks).shutdown();
        // Nobody may wait on an initialisation that will never run.
        self.barrier.fail();
        log::info!("FrameDriver: Shut down.");
    }
}

impl std::fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("init_state", &self.barrier.state())
            .field("faulted", &self.is_faulted())
            .field("distributor", &self.distributor)
            .field("cache", &self.cache)
            .finish()
    }
}
