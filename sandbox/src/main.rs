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

//! Drives the pipeline against a headless device for a handful of frames.
//!
//! Usage: `sandbox [config.json]`

use anyhow::{Context, Result};
use carta_core::geometry::GeoPosition;
use carta_infra::{init_logging, HeadlessDevice, HostMemoryMonitor, LoggingConfig};
use carta_sdk::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

const WIDTH: u32 = 256;
const HEIGHT: u32 = 256;
const FRAMES: usize = 10;

fn load_config() -> Result<PipelineConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(PipelineConfig::default());
    };
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read configuration '{path}'"))?;
    PipelineConfig::from_json_str(&json).with_context(|| format!("Invalid configuration '{path}'"))
}

fn scene() -> Vec<Arc<Geometry>> {
    let p = GeoPosition::new;
    let styled = |shape, color| {
        Arc::new(Geometry::with_properties(
            shape,
            RenderProperties {
                color,
                ..RenderProperties::default()
            },
        ))
    };
    vec![
        styled(
            GeometryShape::Polygon {
                ring: vec![p(-0.3, -0.3), p(-0.3, 0.3), p(0.3, 0.3), p(0.3, -0.3)],
            },
            Rgba8::new(30, 120, 200, 255),
        ),
        styled(
            GeometryShape::Polyline {
                vertices: vec![p(-0.8, -0.6), p(0.0, 0.6), p(0.8, -0.6)],
                closed: false,
            },
            Rgba8::new(220, 80, 40, 255),
        ),
        styled(
            GeometryShape::Point {
                position: p(0.6, 0.6),
            },
            Rgba8::WHITE,
        ),
        styled(
            GeometryShape::Label {
                position: p(-0.6, 0.6),
                text: "Carta".to_string(),
                font_size: 12.0,
            },
            Rgba8::WHITE,
        ),
    ]
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    let config = load_config()?;

    let device = Arc::new(HeadlessDevice::new(WIDTH, HEIGHT));
    let driver = FrameDriver::builder(device.clone())
        .with_config(config)
        .with_host_memory_monitor(Arc::new(HostMemoryMonitor::new("host_memory")))
        .with_fault_policy(FaultPolicy::LogOnly)
        .build()?;

    driver.subscribe_notifications(|notification| {
        log::warn!("Sandbox: {} {:?}", notification.title, notification.details);
    });
    driver.subscribe_statistics(|stats| match stats.to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Sandbox: Failed to serialise statistics: {e}"),
    });
    driver.capture_single_frame(Box::new(|width, height, pixels| {
        let lit = pixels.chunks_exact(4).filter(|px| px[..3] != [0, 0, 0]).count();
        log::info!("Sandbox: Captured {width}x{height} frame, {lit} lit pixels.");
    }));

    let geometries = scene();
    driver.update_geometries(&geometries, &[]);
    driver.set_pick_point(Some(PickPoint::new(WIDTH / 2, HEIGHT / 2)));

    let projection = ProjectionSnapshot::new(
        WIDTH,
        HEIGHT,
        GeoPosition::new(0.0, 0.0),
        WIDTH as f64 / 200_000.0,
    );
    let mut rendered = 0;
    let started = Instant::now();
    while rendered < FRAMES && started.elapsed() < Duration::from_secs(5) {
        let now = Instant::now();
        if !driver.is_frame_due(now) {
            driver.request_repaint();
            std::thread::sleep(driver.time_until_next_frame(now).min(Duration::from_millis(16)));
            continue;
        }
        match driver.display(&projection) {
            FrameOutcome::Rendered(stats) => {
                rendered += 1;
                log::debug!("Sandbox: {stats:?}");
            }
            FrameOutcome::Skipped => {}
            FrameOutcome::Faulted | FrameOutcome::Closed => break,
        }
    }

    if let Some(capabilities) = driver.capabilities() {
        println!("{}", capabilities.to_json()?);
    }
    let picked = driver.picked();
    log::info!(
        "Sandbox: {rendered} frames, {} geometries under the cursor.",
        picked.len()
    );

    // Removing the polygon releases its device resources on the next frame.
    driver.update_geometries(&[], &[geometries[0].id()]);
    driver.display(&projection);
    driver.shutdown();
    log::info!("Sandbox: {} device resources left.", device.live_resources());
    Ok(())
}
