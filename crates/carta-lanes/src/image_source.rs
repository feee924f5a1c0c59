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

//! An in-memory [`ImageSource`].

use carta_core::geometry::{ImageData, ImageFetch, ImageKey, ImageSource};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone)]
enum Slot {
    Ready(Arc<ImageData>),
    Pending,
    Failed(String),
}

/// Imagery held in memory, with explicit pending and failed states.
///
/// Keys that were never registered are reported as failed.
#[derive(Debug, Default)]
pub struct MemoryImageSource {
    images: RwLock<HashMap<ImageKey, Slot>>,
}

impl MemoryImageSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes an image available.
    pub fn insert(&self, key: ImageKey, image: ImageData) {
        self.set(key, Slot::Ready(Arc::new(image)));
    }

    /// Marks an image as still loading.
    pub fn mark_pending(&self, key: ImageKey) {
        self.set(key, Slot::Pending);
    }

    /// Marks an image as unloadable.
    pub fn mark_failed(&self, key: ImageKey, reason: impl Into<String>) {
        self.set(key, Slot::Failed(reason.into()));
    }

    fn set(&self, key: ImageKey, slot: Slot) {
        self.images
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, slot);
    }
}

impl ImageSource for MemoryImageSource {
    fn fetch(&self, key: &ImageKey) -> ImageFetch {
        let images = self.images.read().unwrap_or_else(PoisonError::into_inner);
        match images.get(key) {
            Some(Slot::Ready(data)) => ImageFetch::Ready(Arc::clone(data)),
            Some(Slot::Pending) => ImageFetch::Pending,
            Some(Slot::Failed(reason)) => ImageFetch::Failed(reason.clone()),
            None => ImageFetch::Failed(format!("unknown image '{key}'")),
        }
    }
}
