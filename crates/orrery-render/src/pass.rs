//! Render pass configuration and per-frame command encoding.
//!
//! [`RenderPassBuilder`] describes the clear colour and depth attachment of
//! a pass; [`FrameEncoder`] owns the frame's command encoder and surface
//! texture and presents them on [`FrameEncoder::submit`].

use std::sync::Arc;

/// Dark grey behind everything the background sphere does not cover.
pub const DEFAULT_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

#[derive(Debug)]
struct DepthAttachmentConfig {
    view: wgpu::TextureView,
    clear_value: f32,
}

/// Fluent description of a colour (+ optional depth) pass.
#[derive(Debug)]
pub struct RenderPassBuilder {
    clear_color: wgpu::Color,
    depth_attachment: Option<DepthAttachmentConfig>,
    label: Option<&'static str>,
}

impl Default for RenderPassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPassBuilder {
    pub fn new() -> Self {
        Self {
            clear_color: DEFAULT_CLEAR,
            depth_attachment: None,
            label: None,
        }
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Attach a depth buffer, cleared to `clear_value` at the start of the pass.
    pub fn depth(mut self, view: wgpu::TextureView, clear_value: f32) -> Self {
        self.depth_attachment = Some(DepthAttachmentConfig { view, clear_value });
        self
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    fn create_render_pass<'encoder>(
        &'encoder self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        color_view: &'encoder wgpu::TextureView,
    ) -> wgpu::RenderPass<'encoder> {
        let color_attachment = wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(self.clear_color),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        };

        let depth_stencil_attachment =
            self.depth_attachment
                .as_ref()
                .map(|depth| wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(depth.clear_value),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// One frame's encoder and surface texture.
pub struct FrameEncoder {
    encoder: Option<wgpu::CommandEncoder>,
    queue: Arc<wgpu::Queue>,
    surface_texture: Option<wgpu::SurfaceTexture>,
    surface_view: wgpu::TextureView,
}

impl FrameEncoder {
    pub fn new(
        device: &wgpu::Device,
        queue: Arc<wgpu::Queue>,
        surface_texture: wgpu::SurfaceTexture,
    ) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame-encoder"),
        });
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            encoder: Some(encoder),
            queue,
            surface_texture: Some(surface_texture),
            surface_view,
        }
    }

    /// Begin a pass targeting the surface. `None` once the frame was submitted.
    pub fn begin_render_pass<'a>(
        &'a mut self,
        builder: &'a RenderPassBuilder,
    ) -> Option<wgpu::RenderPass<'a>> {
        let encoder = self.encoder.as_mut()?;
        Some(builder.create_render_pass(encoder, &self.surface_view))
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Submit the recorded commands and present the surface texture.
    pub fn submit(mut self) {
        self.finish();
    }

    fn finish(&mut self) -> bool {
        let (Some(encoder), Some(surface_texture)) =
            (self.encoder.take(), self.surface_texture.take())
        else {
            return false;
        };
        self.queue.submit([encoder.finish()]);
        surface_texture.present();
        true
    }
}

impl Drop for FrameEncoder {
    fn drop(&mut self) {
        if self.finish() {
            log::warn!("FrameEncoder dropped without explicit submit() - auto-submitted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_clear_is_dark_grey() {
        let builder = RenderPassBuilder::new();
        assert_eq!(builder.clear_color, DEFAULT_CLEAR);
        assert_eq!((DEFAULT_CLEAR.r, DEFAULT_CLEAR.g, DEFAULT_CLEAR.b), (0.1, 0.1, 0.1));
    }

    #[test]
    fn test_builder_sets_clear_color() {
        let builder = RenderPassBuilder::new().clear_color(wgpu::Color::RED);
        assert_eq!(builder.clear_color, wgpu::Color::RED);
    }

    #[test]
    fn test_depth_attachment_is_optional() {
        assert!(RenderPassBuilder::new().depth_attachment.is_none());
    }

    #[test]
    fn test_label_is_stored() {
        let builder = RenderPassBuilder::new().label("scene-pass");
        assert_eq!(builder.label, Some("scene-pass"));
    }
}
