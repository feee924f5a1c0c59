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

use carta_core::config::PipelineConfig;
use carta_core::event::{NotificationSeverity, UserNotification};
use carta_core::geometry::{
    GeoPosition, Geometry, GeometryId, GeometryKind, GeometryShape, RenderProperties,
};
use carta_core::render::{ProjectionSnapshot, RenderContext, Rgba8};
use carta_core::renderer::{GraphicsDevice, RenderError};
use carta_data::RenderDataCache;
use carta_infra::HeadlessDevice;
use carta_lanes::{GeometryRenderer, RenderItem, RenderOutcome, RendererFactory};
use carta_sdk::{
    FaultPolicy, FaultReport, FrameDriver, FrameOutcome, InitState, PickPoint, TaskRoute,
    FAULT_NOTIFICATION_KEY,
};
use carta_telemetry::RendererStatistics;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;
use std::time::{Duration, Instant};

const SIZE: u32 = 64;
const TEAL: Rgba8 = Rgba8::new(20, 160, 160, 255);

fn projection() -> ProjectionSnapshot {
    ProjectionSnapshot::new(SIZE, SIZE, GeoPosition::new(0.0, 0.0), SIZE as f64 / 100_000.0)
}

fn polygon() -> Arc<Geometry> {
    let p = GeoPosition::new;
    Arc::new(Geometry::with_properties(
        GeometryShape::Polygon {
            ring: vec![p(-0.2, -0.2), p(-0.2, 0.2), p(0.2, 0.2), p(0.2, -0.2)],
        },
        RenderProperties {
            color: TEAL,
            ..RenderProperties::default()
        },
    ))
}

fn driver(device: &Arc<HeadlessDevice>) -> FrameDriver {
    FrameDriver::builder(device.clone())
        .with_fault_policy(FaultPolicy::LogOnly)
        .build()
        .unwrap()
}

fn recording_policy() -> (FaultPolicy, Arc<Mutex<Vec<FaultReport>>>) {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    let policy = FaultPolicy::Callback(Arc::new(move |report: &FaultReport| {
        sink.lock().unwrap().push(report.clone());
    }));
    (policy, reports)
}

fn recorded_notifications(driver: &FrameDriver) -> Arc<Mutex<Vec<UserNotification>>> {
    let notifications = Arc::new(Mutex::new(Vec::new()));
    let sink = notifications.clone();
    driver.subscribe_notifications(move |notification| {
        sink.lock().unwrap().push(notification.clone());
    });
    notifications
}

/// A polygon renderer that panics once armed.
struct TrapFactory {
    armed: Arc<AtomicBool>,
}

struct TrapRenderer {
    armed: Arc<AtomicBool>,
}

impl GeometryRenderer for TrapRenderer {
    fn name(&self) -> &str {
        "Trap"
    }

    fn kind(&self) -> GeometryKind {
        GeometryKind::Polygon
    }

    fn render(
        &mut self,
        items: &[RenderItem],
        _ctx: &RenderContext<'_>,
        _cache: &RenderDataCache,
    ) -> Result<RenderOutcome, RenderError> {
        if self.armed.load(Ordering::SeqCst) {
            panic!("trap sprung");
        }
        Ok(RenderOutcome {
            rendered: items.len(),
            ..RenderOutcome::default()
        })
    }
}

impl RendererFactory for TrapFactory {
    fn name(&self) -> &str {
        "Trap"
    }

    fn kind(&self) -> GeometryKind {
        GeometryKind::Polygon
    }

    fn is_viable(&self, _device: &dyn GraphicsDevice, _warnings: &mut Vec<String>) -> bool {
        true
    }

    fn create(&self) -> Box<dyn GeometryRenderer> {
        Box::new(TrapRenderer {
            armed: self.armed.clone(),
        })
    }
}

/// A polygon factory whose viability check re-enters the driver.
struct ReentrantViabilityFactory {
    driver: Arc<OnceLock<Weak<FrameDriver>>>,
    seen: Arc<Mutex<Option<(InitState, FrameOutcome)>>>,
}

impl RendererFactory for ReentrantViabilityFactory {
    fn name(&self) -> &str {
        "Reentrant"
    }

    fn kind(&self) -> GeometryKind {
        GeometryKind::Polygon
    }

    fn is_viable(&self, _device: &dyn GraphicsDevice, _warnings: &mut Vec<String>) -> bool {
        if let Some(driver) = self.driver.get().and_then(Weak::upgrade) {
            let outcome = driver.display(&projection());
            *self.seen.lock().unwrap() = Some((driver.init_state(), outcome));
        }
        true
    }

    fn create(&self) -> Box<dyn GeometryRenderer> {
        Box::new(TrapRenderer {
            armed: Arc::new(AtomicBool::new(false)),
        })
    }
}

/// A polygon renderer that removes `target` from the driver while drawing it.
struct MutatingFactory {
    driver: Arc<OnceLock<Weak<FrameDriver>>>,
    target: GeometryId,
    retained: Arc<Mutex<Option<usize>>>,
}

struct MutatingRenderer {
    driver: Arc<OnceLock<Weak<FrameDriver>>>,
    target: GeometryId,
    retained: Arc<Mutex<Option<usize>>>,
}

impl GeometryRenderer for MutatingRenderer {
    fn name(&self) -> &str {
        "Mutating"
    }

    fn kind(&self) -> GeometryKind {
        GeometryKind::Polygon
    }

    fn render(
        &mut self,
        items: &[RenderItem],
        _ctx: &RenderContext<'_>,
        _cache: &RenderDataCache,
    ) -> Result<RenderOutcome, RenderError> {
        let drawing_target = items.iter().any(|item| item.geometry.id() == self.target);
        if let Some(driver) = self.driver.get().and_then(Weak::upgrade) {
            if drawing_target {
                driver.update_geometries(&[], &[self.target]);
                *self.retained.lock().unwrap() = Some(driver.distributor().geometry_count());
            }
        }
        Ok(RenderOutcome {
            rendered: items.len(),
            ..RenderOutcome::default()
        })
    }
}

impl RendererFactory for MutatingFactory {
    fn name(&self) -> &str {
        "Mutating"
    }

    fn kind(&self) -> GeometryKind {
        GeometryKind::Polygon
    }

    fn is_viable(&self, _device: &dyn GraphicsDevice, _warnings: &mut Vec<String>) -> bool {
        true
    }

    fn create(&self) -> Box<dyn GeometryRenderer> {
        Box::new(MutatingRenderer {
            driver: self.driver.clone(),
            target: self.target,
            retained: self.retained.clone(),
        })
    }
}

#[test]
fn test_driver_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FrameDriver>();
}

#[test]
fn test_first_frame_initializes_pipeline() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = driver(&device);
    assert_eq!(driver.init_state(), InitState::Uninitialized);
    assert!(driver.viability_report().is_none());

    driver.update_geometries(&[polygon()], &[]);
    let outcome = driver.display(&projection());

    let stats = outcome.stats().expect("frame should render");
    assert_eq!(stats.rendered, 1);
    assert!(!stats.picked);
    assert_eq!(driver.init_state(), InitState::Ready);
    assert!(driver.viability_report().is_some());
    assert_eq!(device.pixel(SIZE / 2, SIZE / 2), Some(TEAL));

    let capabilities = driver.capabilities().expect("initialized");
    assert_eq!(capabilities.renderer_identifier, device.info().identifier());
    assert!(capabilities.is_capability_supported("DRAW_LISTS"));
}

#[test]
fn test_waiters_are_released_by_initialization() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = Arc::new(driver(&device));

    let waiter = {
        let driver = driver.clone();
        thread::spawn(move || driver.capabilities())
    };
    assert!(!driver.wait_for_init_complete_timeout(Duration::from_millis(10)));

    assert!(matches!(driver.display(&projection()), FrameOutcome::Rendered(_)));
    let capabilities = waiter.join().unwrap();
    assert!(capabilities.is_some());
    assert!(driver.wait_for_init_complete());
}

#[test]
fn test_reentrant_frame_is_skipped() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = Arc::new(driver(&device));
    assert!(driver.display(&projection()).stats().is_some());

    let nested = Arc::new(Mutex::new(None));
    let inner = driver.clone();
    let sink = nested.clone();
    driver.submit_task(move |_| {
        *sink.lock().unwrap() = Some(inner.display(&projection()));
    });
    let outcome = driver.display(&projection());

    assert_eq!(outcome.stats().map(|stats| stats.tasks_run), Some(1));
    assert_eq!(*nested.lock().unwrap(), Some(FrameOutcome::Skipped));
    assert_eq!(driver.frames_skipped(), 1);
}

#[test]
fn test_frame_during_initialization_is_skipped() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let cell = Arc::new(OnceLock::new());
    let seen = Arc::new(Mutex::new(None));
    let driver = Arc::new(
        FrameDriver::builder(device.clone())
            .with_factories(vec![Arc::new(ReentrantViabilityFactory {
                driver: cell.clone(),
                seen: seen.clone(),
            })])
            .with_fault_policy(FaultPolicy::LogOnly)
            .build()
            .unwrap(),
    );
    cell.set(Arc::downgrade(&driver)).unwrap();

    assert!(driver.display(&projection()).stats().is_some());

    assert_eq!(
        *seen.lock().unwrap(),
        Some((InitState::Initializing, FrameOutcome::Skipped))
    );
    assert_eq!(driver.frames_skipped(), 1);
    assert_eq!(driver.init_state(), InitState::Ready);
}

#[test]
fn test_renderer_error_is_fatal() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let (policy, reports) = recording_policy();
    let driver = FrameDriver::builder(device.clone())
        .with_fault_policy(policy)
        .build()
        .unwrap();
    let notifications = recorded_notifications(&driver);

    driver.update_geometries(&[polygon()], &[]);
    assert!(driver.display(&projection()).stats().is_some());

    device.set_lost(true);
    assert_eq!(driver.display(&projection()), FrameOutcome::Faulted);
    assert!(driver.is_faulted());

    let reports = reports.lock().unwrap().clone();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].frames_rendered, 1);
    let fatal: Vec<UserNotification> = notifications
        .lock()
        .unwrap()
        .iter()
        .filter(|n| n.severity == NotificationSeverity::Fatal)
        .cloned()
        .collect();
    assert_eq!(fatal.len(), 1);
    assert_eq!(fatal[0].suppression_key, FAULT_NOTIFICATION_KEY);

    // Every later frame is refused, even once the device recovers.
    device.set_lost(false);
    assert_eq!(driver.display(&projection()), FrameOutcome::Faulted);
    assert_eq!(reports.len(), 1);
}

#[test]
fn test_panicking_renderer_is_fatal() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let armed = Arc::new(AtomicBool::new(false));
    let (policy, reports) = recording_policy();
    let driver = FrameDriver::builder(device.clone())
        .with_config(PipelineConfig {
            use_compiled_draw_lists: false,
            ..PipelineConfig::default()
        })
        .with_factories(vec![Arc::new(TrapFactory {
            armed: armed.clone(),
        })])
        .with_fault_policy(policy)
        .build()
        .unwrap();

    driver.update_geometries(&[polygon()], &[]);
    assert_eq!(driver.display(&projection()).stats().map(|s| s.rendered), Some(1));

    armed.store(true, Ordering::SeqCst);
    assert_eq!(driver.display(&projection()), FrameOutcome::Faulted);

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].message.contains("trap sprung"));
}

#[test]
fn test_suppressed_fault_notification_still_invokes_policy() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let (policy, reports) = recording_policy();
    let driver = FrameDriver::builder(device.clone())
        .with_fault_policy(policy)
        .build()
        .unwrap();
    let notifications = recorded_notifications(&driver);
    driver.suppress_notification(FAULT_NOTIFICATION_KEY);

    driver.update_geometries(&[polygon()], &[]);
    driver.display(&projection());
    device.set_lost(true);
    assert_eq!(driver.display(&projection()), FrameOutcome::Faulted);

    assert_eq!(reports.lock().unwrap().len(), 1);
    assert!(notifications
        .lock()
        .unwrap()
        .iter()
        .all(|n| n.severity != NotificationSeverity::Fatal));
}

#[test]
fn test_pick_point_highlights_geometry() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = driver(&device);
    let polygon = polygon();
    driver.update_geometries(&[polygon.clone()], &[]);
    driver.set_pick_point(Some(PickPoint::new(SIZE / 2, SIZE / 2)));

    let outcome = driver.display(&projection());

    assert!(outcome.stats().is_some_and(|stats| stats.picked));
    assert!(driver.picked().contains(&polygon.id()));
    assert_eq!(
        device.pixel(SIZE / 2, SIZE / 2),
        Some(polygon.properties().highlight_color)
    );

    driver.set_pick_point(None);
    assert!(driver.picked().is_empty());
    driver.display(&projection());
    assert_eq!(device.pixel(SIZE / 2, SIZE / 2), Some(TEAL));
}

#[test]
fn test_removed_geometry_frees_device_resources() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = driver(&device);
    let polygon = polygon();
    driver.update_geometries(&[polygon.clone()], &[]);
    driver.display(&projection());
    assert!(device.live_resources() > 0);

    driver.update_geometries(&[], &[polygon.id()]);
    let stats = driver.display(&projection()).stats().cloned().unwrap();

    assert!(stats.purged > 0);
    assert!(stats.freed > 0);
    assert_eq!(stats.rendered, 0);
    assert_eq!(device.live_resources(), 0);
    assert_eq!(device.pixel(SIZE / 2, SIZE / 2), Some(Rgba8::BLACK));
}

#[test]
fn test_shutdown_releases_everything() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = driver(&device);
    driver.update_geometries(&[polygon()], &[]);
    driver.display(&projection());
    assert!(device.live_resources() > 0);

    driver.shutdown();

    assert_eq!(device.live_resources(), 0);
    assert!(driver.cache().is_empty());
    assert_eq!(driver.distributor().geometry_count(), 0);
    assert_eq!(driver.display(&projection()), FrameOutcome::Closed);
    driver.shutdown();
}

#[test]
fn test_shutdown_before_initialization_is_safe() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = driver(&device);
    driver.update_geometries(&[polygon()], &[]);

    driver.shutdown();

    assert_eq!(driver.init_state(), InitState::Failed);
    assert!(!driver.wait_for_init_complete());
    assert!(driver.capabilities().is_none());
    assert_eq!(driver.display(&projection()), FrameOutcome::Closed);
    assert_eq!(device.live_resources(), 0);
}

#[test]
fn test_tasks_run_on_next_frame() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = driver(&device);
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    driver.submit_task(move |device| {
        *sink.lock().unwrap() = Some(device.framebuffer_size());
    });
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    assert_eq!(
        driver.submit_device_free(move || flag.store(true, Ordering::SeqCst)),
        TaskRoute::RenderThread
    );
    assert_eq!(driver.queued_tasks(), 2);

    let stats = driver.display(&projection()).stats().cloned().unwrap();

    assert_eq!(stats.tasks_run, 2);
    assert_eq!(*seen.lock().unwrap(), Some((SIZE, SIZE)));
    assert!(ran.load(Ordering::SeqCst));
    assert_eq!(driver.queued_tasks(), 0);
}

#[test]
fn test_repaint_requests_coalesce_until_next_frame() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = driver(&device);
    let requests = Arc::new(AtomicUsize::new(0));
    let counter = requests.clone();
    driver.subscribe_repaint(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(driver.request_repaint());
    assert!(!driver.request_repaint());
    assert_eq!(requests.load(Ordering::SeqCst), 1);

    driver.display(&projection());
    assert!(driver.request_repaint());
    assert_eq!(requests.load(Ordering::SeqCst), 2);
}

#[test]
fn test_single_capture_sees_one_frame() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = driver(&device);
    driver.update_geometries(&[polygon()], &[]);
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    driver.capture_single_frame(Box::new(move |width, height, pixels| {
        sink.lock().unwrap().push((width, height, pixels.len()));
    }));

    driver.display(&projection());
    driver.display(&projection());

    assert_eq!(
        *captured.lock().unwrap(),
        vec![(SIZE, SIZE, (SIZE * SIZE * 4) as usize)]
    );
}

#[test]
fn test_statistics_are_published() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = driver(&device);
    let published: Arc<Mutex<Vec<RendererStatistics>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = published.clone();
    driver.subscribe_statistics(move |stats| sink.lock().unwrap().push(stats.clone()));

    driver.update_geometries(&[polygon()], &[]);
    driver.display(&projection());

    let published = published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].renderer, device.info().renderer);
    assert_eq!(published[0].frames_rendered, 1);
    assert!(published[0].cache.entries > 0);
}

#[test]
fn test_leftover_tasks_request_another_frame() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = FrameDriver::builder(device.clone())
        .with_config(PipelineConfig {
            task_queue_budget_ms: 20,
            ..PipelineConfig::default()
        })
        .with_fault_policy(FaultPolicy::LogOnly)
        .build()
        .unwrap();
    let requests = Arc::new(AtomicUsize::new(0));
    let counter = requests.clone();
    driver.subscribe_repaint(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(driver.display(&projection()).stats().is_some());
    assert!(!driver.is_frame_due(Instant::now()));

    for _ in 0..3 {
        driver.submit_task(|_| thread::sleep(Duration::from_millis(30)));
    }
    assert!(driver.is_frame_due(Instant::now()));
    let before = requests.load(Ordering::SeqCst);
    let stats = driver.display(&projection()).stats().cloned().unwrap();

    assert_eq!(stats.tasks_run, 1);
    assert!(stats.frame_time >= Duration::from_millis(30));
    assert_eq!(driver.queued_tasks(), 2);
    assert!(driver.is_frame_due(Instant::now()));
    assert_eq!(requests.load(Ordering::SeqCst), before + 1);

    driver.display(&projection());
    driver.display(&projection());
    assert_eq!(driver.queued_tasks(), 0);
    assert!(!driver.is_frame_due(Instant::now()));
}

#[test]
fn test_scheduled_capture_fires_without_repaints() {
    const INTERVAL: Duration = Duration::from_millis(100);
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = driver(&device);
    assert!(driver.display(&projection()).stats().is_some());
    assert!(!driver.is_frame_due(Instant::now()));

    let deliveries = Arc::new(AtomicUsize::new(0));
    let counter = deliveries.clone();
    driver.capture_scheduled(
        Box::new(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
        INTERVAL,
    );
    assert!(driver.is_frame_due(Instant::now()));
    driver.display(&projection());
    assert_eq!(deliveries.load(Ordering::SeqCst), 1);

    let now = Instant::now();
    assert!(!driver.is_frame_due(now));
    let wait = driver.time_until_next_frame(now);
    assert!(wait > Duration::ZERO && wait <= INTERVAL);

    thread::sleep(INTERVAL + Duration::from_millis(20));
    assert!(driver.is_frame_due(Instant::now()));
    driver.display(&projection());
    assert_eq!(deliveries.load(Ordering::SeqCst), 2);
}

#[test]
fn test_capture_stream_requests_a_frame() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let driver = driver(&device);
    assert!(driver.display(&projection()).stats().is_some());
    assert!(!driver.is_frame_due(Instant::now()));

    let id = driver.capture_stream(Box::new(|_, _, _| {}));
    assert!(driver.is_frame_due(Instant::now()));
    assert!(driver.cancel_capture(id));
}

#[test]
fn test_geometry_updates_while_rendering_do_not_block() {
    let device = Arc::new(HeadlessDevice::new(SIZE, SIZE));
    let target = polygon();
    let cell = Arc::new(OnceLock::new());
    let retained = Arc::new(Mutex::new(None));
    let driver = Arc::new(
        FrameDriver::builder(device.clone())
            .with_config(PipelineConfig {
                use_compiled_draw_lists: false,
                ..PipelineConfig::default()
            })
            .with_factories(vec![Arc::new(MutatingFactory {
                driver: cell.clone(),
                target: target.id(),
                retained: retained.clone(),
            })])
            .with_fault_policy(FaultPolicy::LogOnly)
            .build()
            .unwrap(),
    );
    cell.set(Arc::downgrade(&driver)).unwrap();

    driver.update_geometries(&[target], &[]);
    let stats = driver.display(&projection()).stats().cloned().unwrap();

    // The frame draws its snapshot; the removal lands while it renders.
    assert_eq!(stats.rendered, 1);
    assert_eq!(*retained.lock().unwrap(), Some(0));
    assert_eq!(driver.distributor().pending_removals(), 1);

    let stats = driver.display(&projection()).stats().cloned().unwrap();
    assert_eq!(stats.rendered, 0);
    assert_eq!(driver.distributor().pending_removals(), 0);
}
