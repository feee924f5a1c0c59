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

use carta_core::renderer::ResourceKind;
use thiserror::Error;

/// Lifecycle violations of a disposal helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DisposalError {
    /// `open` was called on a helper that is already open.
    #[error("the {kind} disposal helper is already open")]
    AlreadyOpen {
        /// Resource class of the helper.
        kind: ResourceKind,
    },
    /// The helper was used before `open`.
    #[error("the {kind} disposal helper was used before being opened")]
    NotOpened {
        /// Resource class of the helper.
        kind: ResourceKind,
    },
    /// The helper was used or closed after `close`.
    #[error("the {kind} disposal helper is already closed")]
    Closed {
        /// Resource class of the helper.
        kind: ResourceKind,
    },
}
