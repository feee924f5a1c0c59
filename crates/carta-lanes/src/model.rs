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

//! Model data stored in the render-data cache by the builders.

use carta_core::geometry::RenderProperties;
use carta_core::render::{RenderMode, Rgba8};
use carta_core::renderer::{DrawCommand, ResourceHandle};

/// Screen-space commands of one geometry under one projection, without color.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenModel {
    /// Commands with placeholder colors.
    pub commands: Vec<DrawCommand>,
}

impl ScreenModel {
    /// Approximate host memory held by the model.
    pub fn host_bytes(&self) -> u64 {
        self.commands.iter().map(DrawCommand::host_bytes).sum()
    }

    /// Instantiates the commands for one pass.
    ///
    /// Textured commands sample `texture` in DRAW mode. PICK passes never sample
    /// textures: every primitive is filled with the pick color.
    pub fn paint(
        &self,
        mode: RenderMode,
        color: Rgba8,
        properties: &RenderProperties,
        texture: Option<ResourceHandle>,
    ) -> Vec<DrawCommand> {
        self.commands
            .iter()
            .map(|template| {
                let mut command = template.clone();
                command.color = color;
                command.point_size = properties.point_size;
                command.line_width = properties.line_width;
                let textured = !command.tex_coords.is_empty();
                match (mode, textured, texture) {
                    (RenderMode::Draw, true, Some(texture)) => command.texture = Some(texture),
                    _ => {
                        command.texture = None;
                        command.tex_coords.clear();
                    }
                }
                command
            })
            .collect()
    }
}

/// A texture uploaded for a tile or sprite image. Valid under any projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureModel {
    /// The device texture.
    pub handle: ResourceHandle,
}

/// A mesh whose screen-space vertices live in a device buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshBufferModel {
    /// The vertex buffer.
    pub buffer: ResourceHandle,
    /// Triangle list indices into the buffer.
    pub indices: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use carta_core::render::ScreenPoint;
    use carta_core::renderer::{ResourceId, ResourceKind, Topology};

    fn textured_model() -> ScreenModel {
        let mut command = DrawCommand::new(
            Topology::TriangleList,
            vec![ScreenPoint::new(0.0, 0.0); 3],
            Rgba8::WHITE,
        );
        command.tex_coords = vec![[0.0, 0.0]; 3];
        ScreenModel {
            commands: vec![command],
        }
    }

    #[test]
    fn test_pick_paint_drops_texture() {
        let texture = ResourceHandle::new(ResourceId(3), ResourceKind::Texture, 64);
        let pick = Rgba8::from_rgb_u24(7);
        let painted = textured_model().paint(
            RenderMode::Pick,
            pick,
            &RenderProperties::default(),
            Some(texture),
        );
        assert_eq!(painted[0].texture, None);
        assert!(painted[0].tex_coords.is_empty());
        assert_eq!(painted[0].color, pick);
    }

    #[test]
    fn test_draw_paint_binds_texture() {
        let texture = ResourceHandle::new(ResourceId(3), ResourceKind::Texture, 64);
        let painted = textured_model().paint(
            RenderMode::Draw,
            Rgba8::WHITE,
            &RenderProperties::default(),
            Some(texture),
        );
        assert_eq!(painted[0].texture, Some(texture));
    }
}
