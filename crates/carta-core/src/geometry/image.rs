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

//! Raster imagery referenced by tiles and point sprites.
//!
//! Images are either carried inline or referenced by key and resolved through an
//! [`ImageSource`]. A source must never block: an image that is still loading is
//! reported as [`ImageFetch::Pending`] and the geometry is retried on a later frame.

use std::fmt;
use std::sync::Arc;

/// Identifies an image held by an [`ImageSource`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageKey(pub String);

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded RGBA8 pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 rows, top row first.
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// Creates an image filled with a single RGBA color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = (width as usize) * (height as usize);
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Size of the pixel payload in bytes.
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns `true` when the payload length matches the dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.pixels.len() == (self.width as usize) * (self.height as usize) * 4
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// The imagery of a tile or sprite.
#[derive(Debug, Clone, PartialEq)]
pub enum TileImage {
    /// Pixels carried with the geometry.
    Inline(Arc<ImageData>),
    /// Pixels resolved at render time from an [`ImageSource`].
    Keyed(ImageKey),
}

/// Result of a non-blocking image lookup.
#[derive(Debug, Clone)]
pub enum ImageFetch {
    /// The image is decoded and available.
    Ready(Arc<ImageData>),
    /// The image is still loading; try again on a later frame.
    Pending,
    /// The image cannot be loaded.
    Failed(String),
}

/// A non-blocking provider of keyed imagery.
pub trait ImageSource: Send + Sync {
    /// Looks up an image without blocking the caller.
    fn fetch(&self, key: &ImageKey) -> ImageFetch;
}

impl TileImage {
    /// Resolves the image, consulting `source` for keyed imagery.
    pub fn resolve(&self, source: Option<&dyn ImageSource>) -> ImageFetch {
        match self {
            TileImage::Inline(data) => ImageFetch::Ready(Arc::clone(data)),
            TileImage::Keyed(key) => match source {
                Some(source) => source.fetch(key),
                None => ImageFetch::Failed(format!("no image source for '{key}'")),
            },
        }
    }
}
