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

//! Opaque handles to device allocations.

use std::fmt;

/// The class of a device allocation; each class has its own disposal helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// A sampled image.
    Texture,
    /// A pre-compiled list of draw commands.
    DrawList,
    /// A vertex buffer.
    Buffer,
}

impl ResourceKind {
    /// Every resource class.
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Texture,
        ResourceKind::DrawList,
        ResourceKind::Buffer,
    ];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Texture => f.write_str("texture"),
            ResourceKind::DrawList => f.write_str("draw list"),
            ResourceKind::Buffer => f.write_str("buffer"),
        }
    }
}

/// Device-assigned identity of an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

/// An opaque handle to a device allocation.
///
/// Handles are plain values; freeing one is an explicit [`GraphicsDevice::destroy`]
/// call, performed exactly once by the disposal helpers.
///
/// [`GraphicsDevice::destroy`]: super::GraphicsDevice::destroy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    /// Device-assigned identity.
    pub id: ResourceId,
    /// Allocation class.
    pub kind: ResourceKind,
    /// Size of the allocation in bytes.
    pub size_bytes: u64,
}

impl ResourceHandle {
    /// Creates a handle.
    pub const fn new(id: ResourceId, kind: ResourceKind, size_bytes: u64) -> Self {
        Self {
            id,
            kind,
            size_bytes,
        }
    }
}

/// Pixel formats accepted by [`GraphicsDevice::create_texture`].
///
/// [`GraphicsDevice::create_texture`]: super::GraphicsDevice::create_texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Uncompressed RGBA, 8 bits per channel.
    Rgba8,
    /// Block-compressed RGBA; requires `DeviceCapabilities::compressed_textures`.
    CompressedRgba,
}

/// Describes a texture to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor {
    /// Debug label.
    pub label: String,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Pixel format.
    pub format: TextureFormat,
}

impl TextureDescriptor {
    /// Describes an uncompressed RGBA8 texture.
    pub fn rgba8(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            format: TextureFormat::Rgba8,
        }
    }

    /// Size of the texel payload in bytes.
    pub fn byte_len(&self) -> u64 {
        self.width as u64 * self.height as u64 * 4
    }
}
