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

//! Defines the error types of the device layer.

use super::ResourceId;
use std::fmt;

/// An error related to the creation, use or release of a device allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The device has no memory left for the allocation.
    OutOfMemory {
        /// The requested size in bytes.
        requested_bytes: u64,
    },
    /// The handle does not reference a live allocation.
    InvalidHandle(ResourceId),
    /// The allocation was already freed.
    AlreadyDisposed(ResourceId),
    /// The requested feature is not supported by the device.
    Unsupported(String),
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::OutOfMemory { requested_bytes } => {
                write!(f, "Out of device memory allocating {requested_bytes} bytes.")
            }
            ResourceError::InvalidHandle(id) => {
                write!(f, "Invalid resource handle: {id:?}")
            }
            ResourceError::AlreadyDisposed(id) => {
                write!(f, "Resource {id:?} was already disposed.")
            }
            ResourceError::Unsupported(msg) => write!(f, "Feature not supported: {msg}"),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// A high-level error raised while rendering a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// An operation was attempted before the pipeline was initialized.
    NotInitialized,
    /// The pipeline failed to initialize.
    InitializationFailed(String),
    /// A rendering operation failed.
    RenderingFailed(String),
    /// An error occurred while managing a device resource.
    ResourceError(ResourceError),
    /// The graphics device was lost.
    DeviceLost,
    /// An unexpected or internal error occurred.
    Internal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NotInitialized => {
                write!(f, "The rendering pipeline is not initialized.")
            }
            RenderError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize the rendering pipeline: {msg}")
            }
            RenderError::RenderingFailed(msg) => {
                write!(f, "A rendering operation failed: {msg}")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::DeviceLost => write!(f, "The graphics device was lost."),
            RenderError::Internal(msg) => {
                write!(f, "An internal or unexpected error occurred: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}
