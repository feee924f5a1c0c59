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

use super::{FrameDriver, RenderState};
use crate::fault::FaultPolicy;
use crate::memory::MemoryPressureWatcher;
use crate::pacing::{FramePacer, PickThrottle, RepaintCoalescer};
use crate::task_queue::{LoadSensitiveTaskQueue, RenderTaskQueue};
use anyhow::{Context, Result};
use carta_agents::{DisposalHelpers, GeometryDistributor, PickManager, ProcessorRegistry, RendererSetFactory};
use carta_core::config::PipelineConfig;
use carta_core::geometry::ImageSource;
use carta_core::renderer::GraphicsDevice;
use carta_core::telemetry::{PressureSource, ResourceMonitor};
use carta_data::{CacheBudgets, RenderDataCache};
use carta_infra::HostMemoryMonitor;
use carta_lanes::{default_factories, RendererFactory};
use carta_telemetry::{FrameRateSampler, StatisticsPublisher, TelemetryService};
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Host cache ceiling when host memory cannot be probed.
const FALLBACK_HOST_BUDGET_BYTES: u64 = 512 * 1024 * 1024;

/// Configures and creates a [`FrameDriver`].
pub struct FrameDriverBuilder {
    device: Arc<dyn GraphicsDevice>,
    config: PipelineConfig,
    factories: Option<Vec<Arc<dyn RendererFactory>>>,
    images: Option<Arc<dyn ImageSource>>,
    processors: ProcessorRegistry,
    fault_policy: Option<FaultPolicy>,
    pressure_source: Option<Arc<dyn PressureSource>>,
    monitors: Vec<Arc<dyn ResourceMonitor>>,
    host_memory_bytes: Option<u64>,
}

impl FrameDriverBuilder {
    pub(super) fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            config: PipelineConfig::default(),
            factories: None,
            images: None,
            processors: ProcessorRegistry::with_defaults(),
            fault_policy: None,
            pressure_source: None,
            monitors: Vec::new(),
            host_memory_bytes: None,
        }
    }

    /// Uses `config` instead of the defaults.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the stock renderer factories.
    pub fn with_factories(mut self, factories: Vec<Arc<dyn RendererFactory>>) -> Self {
        self.factories = Some(factories);
        self
    }

    /// Resolves keyed tile and sprite images through `images`.
    pub fn with_image_source(mut self, images: Arc<dyn ImageSource>) -> Self {
        self.images = Some(images);
        self
    }

    /// Replaces the processor registry.
    pub fn with_processors(mut self, processors: ProcessorRegistry) -> Self {
        self.processors = processors;
        self
    }

    /// Overrides the fault policy derived from the configuration.
    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = Some(policy);
        self
    }

    /// Scales the host cache budget with the pressure reported by `source`.
    pub fn with_pressure_source(mut self, source: Arc<dyn PressureSource>) -> Self {
        self.pressure_source = Some(source);
        self
    }

    /// Registers a monitor with the driver's telemetry service.
    pub fn with_monitor(mut self, monitor: Arc<dyn ResourceMonitor>) -> Self {
        self.monitors.push(monitor);
        self
    }

    /// Sizes the host budget from system memory and follows its pressure.
    pub fn with_host_memory_monitor(mut self, monitor: Arc<HostMemoryMonitor>) -> Self {
        self.host_memory_bytes = monitor.get_usage_report().total_capacity_bytes;
        self.pressure_source = Some(monitor.clone());
        self.monitors.push(monitor);
        self
    }

    /// Validates the configuration and creates the driver.
    pub fn build(self) -> Result<FrameDriver> {
        self.config
            .validate()
            .context("Invalid pipeline configuration")?;
        let config = self.config;

        let host_max = self
            .host_memory_bytes
            .map(|total| (total as f64 * config.host_budget_fraction) as u64)
            .unwrap_or(FALLBACK_HOST_BUDGET_BYTES);
        let cache = RenderDataCache::new(CacheBudgets {
            gpu_low_water_fraction: config.gpu_low_water_fraction,
            host_max_bytes: host_max,
            host_low_water_fraction: config.host_low_water_fraction,
            ..CacheBudgets::default()
        });

        let repaint = Arc::new(RepaintCoalescer::new());
        let queue = Arc::new(RenderTaskQueue::with_repaint(Arc::clone(&repaint)));
        let tasks = LoadSensitiveTaskQueue::new(Arc::clone(&queue), config.load_sensitive_threshold)
            .context("Failed to start the background task executor")?;

        let factories = self
            .factories
            .unwrap_or_else(|| default_factories(self.images.clone()));
        let harness = RendererSetFactory::from_config(factories, &config);

        let telemetry = TelemetryService::new(Duration::from_secs(1));
        for monitor in self.monitors {
            telemetry.monitor_registry().register(monitor);
        }

        let mode = config.frame_rate_mode();
        let render = RenderState {
            harness,
            renderers: None,
            helpers: DisposalHelpers::new(),
            pick_throttle: PickThrottle::new(config.pick_throttle(), mode),
            sampler: FrameRateSampler::default(),
            telemetry,
            pressure: self
                .pressure_source
                .map(|source| MemoryPressureWatcher::new(source, Duration::from_millis(500))),
            device_info: Default::default(),
            shut_down: false,
        };

        log::info!(
            "FrameDriver: Created ({mode:?}, compiled draw lists {}, safe mode {}).",
            config.use_compiled_draw_lists,
            config.safe_mode
        );

        Ok(FrameDriver {
            fault_policy: self.fault_policy.unwrap_or(FaultPolicy::TerminateProcess {
                delay: config.fatal_exit_delay(),
            }),
            statistics: StatisticsPublisher::new(config.statistics_interval()),
            pacer: Mutex::new(FramePacer::new(mode)),
            device: self.device,
            cache,
            distributor: GeometryDistributor::new(self.processors),
            picks: PickManager::new(),
            queue,
            tasks: Mutex::new(tasks),
            repaint,
            barrier: Default::default(),
            capabilities: Mutex::new(None),
            viability: Mutex::new(None),
            notifications: Default::default(),
            suppressed: Default::default(),
            captures: Default::default(),
            faulted: AtomicBool::new(false),
            frames_skipped: AtomicU64::new(0),
            pick_point: Mutex::new(None),
            render: Mutex::new(render),
            config,
        })
    }
}
