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

//! The abstract graphics device.

use super::{DrawCommand, RenderError, ResourceError, ResourceHandle, TextureDescriptor};
use crate::render::Rgba8;
use std::fmt::Debug;

/// Identity strings reported by the graphics driver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    /// Driver vendor.
    pub vendor: String,
    /// Renderer (GPU) name.
    pub renderer: String,
    /// Driver version string.
    pub version: String,
    /// Advertised extensions.
    pub extensions: Vec<String>,
}

impl DeviceInfo {
    /// A compact "vendor / renderer / version" identifier.
    pub fn identifier(&self) -> String {
        format!("{} / {} / {}", self.vendor, self.renderer, self.version)
    }
}

/// Optional features of a device, probed once at initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Block-compressed textures can be created.
    pub compressed_textures: bool,
    /// Draw commands can be compiled into draw lists.
    pub draw_lists: bool,
    /// Vertex buffers can be allocated on the device.
    pub vertex_buffers: bool,
    /// Largest texture edge in texels.
    pub max_texture_size: u32,
}

impl DeviceCapabilities {
    /// Names of the supported optional features.
    pub fn supported_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.compressed_textures {
            names.push("compressed_textures");
        }
        if self.draw_lists {
            names.push("draw_lists");
        }
        if self.vertex_buffers {
            names.push("vertex_buffers");
        }
        names
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            compressed_textures: true,
            draw_lists: true,
            vertex_buffers: true,
            max_texture_size: 4096,
        }
    }
}

/// A graphics device, used exclusively from the render thread.
///
/// The trait is `Send + Sync` so the device can be shared as `Arc<dyn GraphicsDevice>`
/// between the frame driver and its collaborators, but implementations may assume
/// that every method is called from a single thread.
pub trait GraphicsDevice: Send + Sync + Debug {
    /// Returns the driver identity.
    fn info(&self) -> DeviceInfo;

    /// Returns the optional features of the device.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Probed dedicated device memory in bytes, if the driver reports it.
    fn dedicated_memory_bytes(&self) -> Option<u64>;

    /// Current framebuffer size in pixels.
    fn framebuffer_size(&self) -> (u32, u32);

    /// Clears the framebuffer.
    fn clear(&self, color: Rgba8);

    /// Uploads a texture.
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        pixels: &[u8],
    ) -> Result<ResourceHandle, ResourceError>;

    /// Uploads raw vertex data into a device buffer.
    fn create_buffer(&self, label: &str, data: &[u8]) -> Result<ResourceHandle, ResourceError>;

    /// Executes one draw command immediately.
    fn draw(&self, command: &DrawCommand) -> Result<(), RenderError>;

    /// Compiles commands into a reusable draw list.
    fn compile_draw_list(&self, commands: &[DrawCommand]) -> Result<ResourceHandle, ResourceError>;

    /// Replays a compiled draw list.
    fn execute_draw_list(&self, list: &ResourceHandle) -> Result<(), RenderError>;

    /// Frees a device allocation. Freeing a handle twice is an error.
    fn destroy(&self, handle: &ResourceHandle) -> Result<(), ResourceError>;

    /// Reads back an RGBA8 rectangle of the framebuffer, top row first.
    fn read_pixels(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>, RenderError>;
}
