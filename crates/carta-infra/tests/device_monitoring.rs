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

use carta_core::renderer::{GraphicsDevice, TextureDescriptor};
use carta_core::telemetry::monitoring::{ResourceMonitor, VramProvider};
use carta_infra::{HeadlessDevice, VramMonitor};
use std::sync::Arc;

#[test]
fn test_vram_monitor_follows_device_allocations() {
    let device = Arc::new(HeadlessDevice::new(8, 8).with_dedicated_memory(Some(1024)));
    let provider: Arc<dyn VramProvider> = device.clone();
    let monitor = VramMonitor::new(Arc::downgrade(&provider), "headless");
    drop(provider);

    let texture = device
        .create_texture(&TextureDescriptor::rgba8("tile", 4, 4), &[0; 64])
        .unwrap();
    let report = monitor.get_usage_report();
    assert_eq!(report.current_bytes, 64);
    assert_eq!(report.total_capacity_bytes, Some(1024));
    assert_eq!(report.available_fraction(), Some(960.0 / 1024.0));

    device.destroy(&texture).unwrap();
    let report = monitor.get_usage_report();
    assert_eq!(report.current_bytes, 0);
    assert_eq!(report.peak_bytes, Some(64));

    drop(device);
    assert_eq!(monitor.get_usage_report().current_bytes, 0);
    assert_eq!(monitor.get_usage_report().total_capacity_bytes, None);
}
