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

//! A headless software graphics device.
//!
//! [`HeadlessDevice`] implements the full [`GraphicsDevice`] contract on the CPU:
//! it keeps an RGBA8 framebuffer, tracks every allocation with its size, and
//! rejects use of destroyed handles. It backs the sandbox and the pipeline tests.

mod raster;

use carta_core::render::{Rgba8, ScreenPoint};
use carta_core::renderer::{
    DeviceCapabilities, DeviceInfo, DrawCommand, GraphicsDevice, RenderError, ResourceError,
    ResourceHandle, ResourceId, ResourceKind, TextureDescriptor, TextureFormat, Topology,
};
use carta_core::telemetry::monitoring::VramProvider;
use raster::{Surface, Texels};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

const DEFAULT_DEDICATED_MEMORY: u64 = 512 * 1024 * 1024;

/// Cumulative operation counters of a [`HeadlessDevice`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCounters {
    /// Commands rasterised, including those replayed from draw lists.
    pub draw_calls: u64,
    /// Draw lists replayed.
    pub list_executions: u64,
    /// Textures created.
    pub textures_created: u64,
    /// Buffers created.
    pub buffers_created: u64,
    /// Draw lists compiled.
    pub lists_compiled: u64,
    /// Allocations destroyed.
    pub destroyed: u64,
}

#[derive(Default)]
struct DeviceState {
    width: u32,
    height: u32,
    framebuffer: Vec<Rgba8>,
    next_id: u64,
    textures: HashMap<ResourceId, Texels>,
    buffers: HashMap<ResourceId, Vec<u8>>,
    lists: HashMap<ResourceId, Vec<DrawCommand>>,
    sizes: HashMap<ResourceId, u64>,
    destroyed: HashSet<ResourceId>,
    allocated_bytes: u64,
    peak_bytes: u64,
    counters: DeviceCounters,
}

impl DeviceState {
    fn allocate(&mut self, size: u64, limit: Option<u64>) -> Result<ResourceId, ResourceError> {
        if let Some(limit) = limit {
            if self.allocated_bytes.saturating_add(size) > limit {
                return Err(ResourceError::OutOfMemory {
                    requested_bytes: size,
                });
            }
        }
        self.next_id += 1;
        let id = ResourceId(self.next_id);
        self.allocated_bytes += size;
        self.peak_bytes = self.peak_bytes.max(self.allocated_bytes);
        self.sizes.insert(id, size);
        Ok(id)
    }

    fn missing(&self, id: ResourceId) -> ResourceError {
        if self.destroyed.contains(&id) {
            ResourceError::AlreadyDisposed(id)
        } else {
            ResourceError::InvalidHandle(id)
        }
    }

    fn rasterize(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
        let buffered;
        let vertices: &[ScreenPoint] = match command.buffer {
            Some(handle) => {
                let data = self
                    .buffers
                    .get(&handle.id)
                    .ok_or_else(|| self.missing(handle.id))?;
                buffered = bytemuck::pod_collect_to_vec::<u8, ScreenPoint>(data);
                &buffered
            }
            None => &command.vertices,
        };

        let order: Vec<usize> = if command.indices.is_empty() {
            (0..vertices.len()).collect()
        } else {
            command.indices.iter().map(|&i| i as usize).collect()
        };
        if let Some(bad) = order.iter().find(|&&i| i >= vertices.len()) {
            return Err(RenderError::RenderingFailed(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }

        let texels = match command.texture {
            Some(handle) => {
                if command.tex_coords.len() < vertices.len() {
                    return Err(RenderError::RenderingFailed(format!(
                        "{} texture coordinates for {} vertices",
                        command.tex_coords.len(),
                        vertices.len()
                    )));
                }
                Some(
                    self.textures
                        .get(&handle.id)
                        .ok_or_else(|| self.missing(handle.id))?,
                )
            }
            None => None,
        };

        let mut surface = Surface {
            pixels: &mut self.framebuffer,
            width: self.width,
            height: self.height,
        };
        match command.topology {
            Topology::Points => {
                let mut coverage = Vec::new();
                for &i in &order {
                    raster::square(vertices[i], command.point_size, &mut coverage);
                }
                surface.fill(coverage, command.color);
            }
            Topology::LineList | Topology::LineStrip => {
                let mut coverage = Vec::new();
                let segments: Vec<&[usize]> = if command.topology == Topology::LineList {
                    order.chunks_exact(2).collect()
                } else {
                    order.windows(2).collect()
                };
                for pair in segments {
                    raster::segment(
                        vertices[pair[0]],
                        vertices[pair[1]],
                        command.line_width,
                        &mut coverage,
                    );
                }
                surface.fill(coverage, command.color);
            }
            Topology::TriangleList => {
                for tri in order.chunks_exact(3) {
                    let corners = [vertices[tri[0]], vertices[tri[1]], vertices[tri[2]]];
                    let textured = texels.map(|texels| {
                        let uv = [
                            command.tex_coords[tri[0]],
                            command.tex_coords[tri[1]],
                            command.tex_coords[tri[2]],
                        ];
                        (texels, uv)
                    });
                    surface.triangle(corners, command.color, textured);
                }
            }
        }
        self.counters.draw_calls += 1;
        Ok(())
    }
}

/// A CPU-only [`GraphicsDevice`].
pub struct HeadlessDevice {
    state: Mutex<DeviceState>,
    info: DeviceInfo,
    capabilities: DeviceCapabilities,
    dedicated_memory: Option<u64>,
    lost: AtomicBool,
}

impl HeadlessDevice {
    /// Creates a device with a cleared `width` x `height` framebuffer.
    pub fn new(width: u32, height: u32) -> Self {
        let capabilities = DeviceCapabilities::default();
        Self {
            state: Mutex::new(DeviceState {
                width,
                height,
                framebuffer: vec![Rgba8::BLACK; width as usize * height as usize],
                ..DeviceState::default()
            }),
            info: DeviceInfo {
                vendor: "Carta".to_string(),
                renderer: "Headless Rasteriser".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                extensions: extension_names(&capabilities),
            },
            capabilities,
            dedicated_memory: Some(DEFAULT_DEDICATED_MEMORY),
            lost: AtomicBool::new(false),
        }
    }

    /// Replaces the advertised capabilities and the matching extension list.
    pub fn with_capabilities(mut self, capabilities: DeviceCapabilities) -> Self {
        self.info.extensions = extension_names(&capabilities);
        self.capabilities = capabilities;
        self
    }

    /// Sets the dedicated memory; `None` models a driver that reports nothing.
    pub fn with_dedicated_memory(mut self, bytes: Option<u64>) -> Self {
        self.dedicated_memory = bytes;
        self
    }

    /// Replaces the reported driver identity.
    pub fn with_info(mut self, info: DeviceInfo) -> Self {
        self.info = info;
        self
    }

    /// Resizes and clears the framebuffer.
    pub fn resize(&self, width: u32, height: u32) {
        let mut state = self.state();
        state.width = width;
        state.height = height;
        state.framebuffer = vec![Rgba8::BLACK; width as usize * height as usize];
    }

    /// Reads one framebuffer pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        let state = self.state();
        if x >= state.width || y >= state.height {
            return None;
        }
        state
            .framebuffer
            .get((y * state.width + x) as usize)
            .copied()
    }

    /// Number of live allocations.
    pub fn live_resources(&self) -> usize {
        self.state().sizes.len()
    }

    /// Number of live allocations of one class.
    pub fn live_resources_of(&self, kind: ResourceKind) -> usize {
        let state = self.state();
        match kind {
            ResourceKind::Texture => state.textures.len(),
            ResourceKind::DrawList => state.lists.len(),
            ResourceKind::Buffer => state.buffers.len(),
        }
    }

    /// Whether `id` was allocated and then destroyed.
    pub fn is_destroyed(&self, id: ResourceId) -> bool {
        self.state().destroyed.contains(&id)
    }

    /// Cumulative counters.
    pub fn counters(&self) -> DeviceCounters {
        self.state().counters
    }

    /// Simulates (or recovers from) a lost device.
    pub fn set_lost(&self, lost: bool) {
        if lost {
            log::warn!("HeadlessDevice: Simulating device loss.");
        }
        self.lost.store(lost, Ordering::SeqCst);
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_alive(&self) -> Result<(), ResourceError> {
        if self.lost.load(Ordering::SeqCst) {
            Err(ResourceError::BackendError("device lost".to_string()))
        } else {
            Ok(())
        }
    }
}

fn extension_names(capabilities: &DeviceCapabilities) -> Vec<String> {
    capabilities
        .supported_names()
        .into_iter()
        .map(|name| format!("CARTA_{}", name.to_uppercase()))
        .collect()
}

impl fmt::Debug for HeadlessDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("HeadlessDevice")
            .field("size", &(state.width, state.height))
            .field("live_resources", &state.sizes.len())
            .field("allocated_bytes", &state.allocated_bytes)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn info(&self) -> DeviceInfo {
        self.info.clone()
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn dedicated_memory_bytes(&self) -> Option<u64> {
        self.dedicated_memory
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let state = self.state();
        (state.width, state.height)
    }

    fn clear(&self, color: Rgba8) {
        self.state().framebuffer.fill(color);
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        pixels: &[u8],
    ) -> Result<ResourceHandle, ResourceError> {
        self.ensure_alive()?;
        if descriptor.format == TextureFormat::CompressedRgba
            && !self.capabilities.compressed_textures
        {
            return Err(ResourceError::Unsupported(
                "compressed textures are not supported".to_string(),
            ));
        }
        let max = self.capabilities.max_texture_size;
        if descriptor.width == 0
            || descriptor.height == 0
            || descriptor.width > max
            || descriptor.height > max
        {
            return Err(ResourceError::Unsupported(format!(
                "texture '{}' is {}x{}, limit is {max}",
                descriptor.label, descriptor.width, descriptor.height
            )));
        }
        let size = descriptor.byte_len();
        if pixels.len() as u64 != size {
            return Err(ResourceError::BackendError(format!(
                "texture '{}' expects {size} bytes, got {}",
                descriptor.label,
                pixels.len()
            )));
        }

        let mut state = self.state();
        let id = state.allocate(size, self.dedicated_memory)?;
        state.textures.insert(
            id,
            Texels {
                width: descriptor.width,
                height: descriptor.height,
                texels: bytemuck::pod_collect_to_vec::<u8, Rgba8>(pixels),
            },
        );
        state.counters.textures_created += 1;
        log::trace!("HeadlessDevice: Created texture '{}' ({id:?}).", descriptor.label);
        Ok(ResourceHandle::new(id, ResourceKind::Texture, size))
    }

    fn create_buffer(&self, label: &str, data: &[u8]) -> Result<ResourceHandle, ResourceError> {
        self.ensure_alive()?;
        if !self.capabilities.vertex_buffers {
            return Err(ResourceError::Unsupported(
                "vertex buffers are not supported".to_string(),
            ));
        }
        let size = data.len() as u64;
        let mut state = self.state();
        let id = state.allocate(size, self.dedicated_memory)?;
        state.buffers.insert(id, data.to_vec());
        state.counters.buffers_created += 1;
        log::trace!("HeadlessDevice: Created buffer '{label}' ({id:?}).");
        Ok(ResourceHandle::new(id, ResourceKind::Buffer, size))
    }

    fn draw(&self, command: &DrawCommand) -> Result<(), RenderError> {
        if self.lost.load(Ordering::SeqCst) {
            return Err(RenderError::DeviceLost);
        }
        self.state().rasterize(command)
    }

    fn compile_draw_list(&self, commands: &[DrawCommand]) -> Result<ResourceHandle, ResourceError> {
        self.ensure_alive()?;
        if !self.capabilities.draw_lists {
            return Err(ResourceError::Unsupported(
                "draw lists are not supported".to_string(),
            ));
        }
        let size = commands.iter().map(DrawCommand::host_bytes).sum();
        let mut state = self.state();
        let id = state.allocate(size, self.dedicated_memory)?;
        state.lists.insert(id, commands.to_vec());
        state.counters.lists_compiled += 1;
        Ok(ResourceHandle::new(id, ResourceKind::DrawList, size))
    }

    fn execute_draw_list(&self, list: &ResourceHandle) -> Result<(), RenderError> {
        if self.lost.load(Ordering::SeqCst) {
            return Err(RenderError::DeviceLost);
        }
        let mut state = self.state();
        let commands = match state.lists.get(&list.id) {
            Some(commands) => commands.clone(),
            None => return Err(state.missing(list.id).into()),
        };
        for command in &commands {
            state.rasterize(command)?;
        }
        state.counters.list_executions += 1;
        Ok(())
    }

    fn destroy(&self, handle: &ResourceHandle) -> Result<(), ResourceError> {
        let mut state = self.state();
        let removed = match handle.kind {
            ResourceKind::Texture => state.textures.remove(&handle.id).is_some(),
            ResourceKind::DrawList => state.lists.remove(&handle.id).is_some(),
            ResourceKind::Buffer => state.buffers.remove(&handle.id).is_some(),
        };
        if !removed {
            return Err(state.missing(handle.id));
        }
        let size = state.sizes.remove(&handle.id).unwrap_or(0);
        state.allocated_bytes = state.allocated_bytes.saturating_sub(size);
        state.destroyed.insert(handle.id);
        state.counters.destroyed += 1;
        log::trace!("HeadlessDevice: Destroyed {} {:?}.", handle.kind, handle.id);
        Ok(())
    }

    fn read_pixels(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let state = self.state();
        let fits = x.checked_add(width).is_some_and(|right| right <= state.width)
            && y.checked_add(height).is_some_and(|bottom| bottom <= state.height);
        if !fits {
            return Err(RenderError::RenderingFailed(format!(
                "read of {width}x{height} at ({x}, {y}) exceeds the {}x{} framebuffer",
                state.width, state.height
            )));
        }
        let mut bytes = Vec::with_capacity(width as usize * height as usize * 4);
        for row in y..y + height {
            let start = (row * state.width + x) as usize;
            let end = start + width as usize;
            bytes.extend_from_slice(bytemuck::cast_slice(&state.framebuffer[start..end]));
        }
        Ok(bytes)
    }
}

impl VramProvider for HeadlessDevice {
    fn vram_usage_bytes(&self) -> u64 {
        self.state().allocated_bytes
    }

    fn vram_peak_bytes(&self) -> u64 {
        self.state().peak_bytes
    }

    fn vram_capacity_bytes(&self) -> Option<u64> {
        self.dedicated_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);

    fn quad(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<ScreenPoint> {
        vec![
            ScreenPoint::new(x0, y0),
            ScreenPoint::new(x1, y0),
            ScreenPoint::new(x1, y1),
            ScreenPoint::new(x0, y1),
        ]
    }

    #[test]
    fn test_draw_triangles_and_read_back() {
        let device = HeadlessDevice::new(16, 16);
        let command = DrawCommand::new(Topology::TriangleList, quad(2.0, 2.0, 10.0, 10.0), RED)
            .with_indices(vec![0, 1, 2, 0, 2, 3]);
        device.draw(&command).unwrap();

        assert_eq!(device.pixel(5, 5), Some(RED));
        assert_eq!(device.pixel(12, 12), Some(Rgba8::BLACK));
        let bytes = device.read_pixels(5, 5, 1, 1).unwrap();
        assert_eq!(bytes, vec![255, 0, 0, 255]);
        assert_eq!(device.counters().draw_calls, 1);
    }

    #[test]
    fn test_points_and_lines() {
        let device = HeadlessDevice::new(16, 16);
        let points = DrawCommand::new(Topology::Points, vec![ScreenPoint::new(3.5, 3.5)], RED)
            .with_point_size(3.0);
        device.draw(&points).unwrap();
        assert_eq!(device.pixel(2, 2), Some(RED));
        assert_eq!(device.pixel(4, 4), Some(RED));
        assert_eq!(device.pixel(6, 6), Some(Rgba8::BLACK));

        let line = DrawCommand::new(
            Topology::LineStrip,
            vec![ScreenPoint::new(0.5, 10.5), ScreenPoint::new(15.5, 10.5)],
            Rgba8::WHITE,
        );
        device.draw(&line).unwrap();
        assert_eq!(device.pixel(0, 10), Some(Rgba8::WHITE));
        assert_eq!(device.pixel(15, 10), Some(Rgba8::WHITE));
        assert_eq!(device.pixel(7, 11), Some(Rgba8::BLACK));
    }

    #[test]
    fn test_destroy_twice_is_already_disposed() {
        let device = HeadlessDevice::new(4, 4);
        let texture = device
            .create_texture(&TextureDescriptor::rgba8("t", 1, 1), &[1, 2, 3, 4])
            .unwrap();
        assert_eq!(device.live_resources(), 1);
        assert_eq!(device.vram_usage_bytes(), 4);

        device.destroy(&texture).unwrap();
        assert_eq!(
            device.destroy(&texture),
            Err(ResourceError::AlreadyDisposed(texture.id))
        );
        assert_eq!(device.live_resources(), 0);
        assert_eq!(device.vram_usage_bytes(), 0);
        assert_eq!(device.vram_peak_bytes(), 4);
        assert!(device.is_destroyed(texture.id));
    }

    #[test]
    fn test_unknown_handle_is_invalid() {
        let device = HeadlessDevice::new(4, 4);
        let bogus = ResourceHandle::new(ResourceId(99), ResourceKind::Buffer, 0);
        assert_eq!(
            device.destroy(&bogus),
            Err(ResourceError::InvalidHandle(ResourceId(99)))
        );
    }

    #[test]
    fn test_out_of_memory() {
        let device = HeadlessDevice::new(4, 4).with_dedicated_memory(Some(8));
        device.create_buffer("a", &[0; 8]).unwrap();
        assert_eq!(
            device.create_buffer("b", &[0; 1]),
            Err(ResourceError::OutOfMemory { requested_bytes: 1 })
        );
    }

    #[test]
    fn test_draw_with_destroyed_texture_fails() {
        let device = HeadlessDevice::new(8, 8);
        let texture = device
            .create_texture(&TextureDescriptor::rgba8("t", 1, 1), &[0, 255, 0, 255])
            .unwrap();
        let command = DrawCommand::new(Topology::TriangleList, quad(0.0, 0.0, 8.0, 8.0), RED)
            .with_indices(vec![0, 1, 2])
            .with_texture(texture, vec![[0.0, 0.0]; 4]);
        device.draw(&command).unwrap();
        assert_eq!(device.pixel(6, 1), Some(Rgba8::new(0, 255, 0, 255)));

        device.destroy(&texture).unwrap();
        assert_eq!(
            device.draw(&command),
            Err(RenderError::ResourceError(ResourceError::AlreadyDisposed(
                texture.id
            )))
        );
    }

    #[test]
    fn test_draw_lists_replay_and_require_capability() {
        let device = HeadlessDevice::new(8, 8);
        let command = DrawCommand::new(Topology::TriangleList, quad(0.0, 0.0, 8.0, 8.0), RED)
            .with_indices(vec![0, 1, 2, 0, 2, 3]);
        let list = device.compile_draw_list(&[command]).unwrap();
        device.execute_draw_list(&list).unwrap();
        assert_eq!(device.pixel(4, 4), Some(RED));
        assert_eq!(device.counters().list_executions, 1);

        let limited = HeadlessDevice::new(8, 8).with_capabilities(DeviceCapabilities {
            draw_lists: false,
            ..DeviceCapabilities::default()
        });
        assert!(matches!(
            limited.compile_draw_list(&[]),
            Err(ResourceError::Unsupported(_))
        ));
        assert!(!limited
            .info()
            .extensions
            .iter()
            .any(|ext| ext == "CARTA_DRAW_LISTS"));
    }

    #[test]
    fn test_buffered_vertices() {
        let device = HeadlessDevice::new(8, 8);
        let vertices = quad(0.0, 0.0, 8.0, 8.0);
        let buffer = device
            .create_buffer("quad", bytemuck::cast_slice(&vertices))
            .unwrap();
        let command = DrawCommand::new(Topology::TriangleList, Vec::new(), RED)
            .with_indices(vec![0, 1, 2, 0, 2, 3])
            .with_buffer(buffer);
        device.draw(&command).unwrap();
        assert_eq!(device.pixel(1, 6), Some(RED));
    }

    #[test]
    fn test_read_pixels_bounds() {
        let device = HeadlessDevice::new(4, 4);
        assert!(device.read_pixels(0, 0, 4, 4).is_ok());
        assert!(device.read_pixels(1, 0, 4, 4).is_err());
        assert!(device.read_pixels(0, u32::MAX, 1, 1).is_err());
    }

    #[test]
    fn test_lost_device_refuses_work() {
        let device = HeadlessDevice::new(4, 4);
        device.set_lost(true);
        let command = DrawCommand::new(Topology::Points, vec![ScreenPoint::new(1.0, 1.0)], RED);
        assert_eq!(device.draw(&command), Err(RenderError::DeviceLost));
        assert!(device.create_buffer("b", &[0; 4]).is_err());
        device.set_lost(false);
        assert!(device.draw(&command).is_ok());
    }

    #[test]
    fn test_out_of_range_index_is_an_error() {
        let device = HeadlessDevice::new(4, 4);
        let command = DrawCommand::new(Topology::Points, vec![ScreenPoint::new(1.0, 1.0)], RED)
            .with_indices(vec![3]);
        assert!(matches!(
            device.draw(&command),
            Err(RenderError::RenderingFailed(_))
        ));
    }
}
