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

use carta_data::{CacheBudgets, Footprint, GeometryKey, RenderDataCache};
use carta_telemetry::{CacheUsage, FrameRateSampler, RendererStatistics, StatisticsPublisher};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[test]
fn test_statistics_carry_cache_usage_to_subscribers() {
    let cache = RenderDataCache::new(CacheBudgets::default());
    cache
        .insert(GeometryKey::from_raw_parts(0, 0), 7u32, Footprint::host(128))
        .unwrap();
    cache.get_cache_association::<u32>(GeometryKey::from_raw_parts(0, 0), None);

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let publisher = StatisticsPublisher::new(Duration::from_secs(1));
    publisher.subscribe(move |stats: &RendererStatistics| {
        sink.lock().unwrap().push(stats.clone());
    });

    let mut sampler = FrameRateSampler::default();
    let start = Instant::now();
    sampler.record_frame(start);
    sampler.record_frame(start + Duration::from_millis(20));

    publisher.publish_if_due(start, || RendererStatistics {
        frames_per_second: sampler.sample(),
        frame_rate_samples: sampler.samples(),
        cache: CacheUsage::from(&cache.stats()),
        ..RendererStatistics::default()
    });

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].cache.entries, 1);
    assert_eq!(received[0].cache.host_used, 128);
    assert_eq!(received[0].cache.hits, 1);
    assert!((received[0].frames_per_second - 50.0).abs() < 1e-6);
}
