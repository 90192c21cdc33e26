use crate::extract::FrameSnapshot;
use crate::viewport::SurfaceSize;
use haunted_scene::Scene;
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer consumes a [`FrameSnapshot`] and produces output. It never
/// mutates the scene; the snapshot is rebuilt every frame from live state.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Apply a new drawing-buffer size. Called after every viewport resize,
    /// before the next frame.
    fn resize(&mut self, size: SurfaceSize);

    /// Render one frame.
    fn render(&mut self, scene: &Scene, frame: &FrameSnapshot) -> Self::Output;
}

/// Text renderer for headless runs.
///
/// Produces a human-readable report of what a frame would draw. Useful for
/// CLI output, logging, and testing the render interface without a GPU.
#[derive(Debug)]
pub struct DebugTextRenderer {
    size: SurfaceSize,
    frames: u64,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self::new(SurfaceSize {
            width: 1,
            height: 1,
        })
    }
}

impl DebugTextRenderer {
    pub fn new(size: SurfaceSize) -> Self {
        Self { size, frames: 0 }
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn render(&mut self, scene: &Scene, frame: &FrameSnapshot) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}) ===",
            self.frames, self.size.width, self.size.height
        );
        let eye = frame.camera_position;
        let _ = writeln!(out, "Camera: eye=({:.2}, {:.2}, {:.2})", eye.x, eye.y, eye.z);
        let [r, g, b] = frame.ambient;
        let _ = writeln!(out, "Ambient: ({r:.3}, {g:.3}, {b:.3})");
        for light in &frame.directional {
            let d = light.direction;
            let [r, g, b] = light.radiance;
            let _ = writeln!(
                out,
                "Directional: dir=({:.2}, {:.2}, {:.2}) radiance=({r:.3}, {g:.3}, {b:.3})",
                d.x, d.y, d.z
            );
        }
        let _ = writeln!(
            out,
            "Draws: {} ({} opaque)",
            frame.draws.len(),
            frame.opaque_count()
        );
        for draw in &frame.draws {
            let name = scene.get(draw.node).map(|n| n.name.as_str()).unwrap_or("?");
            let material = scene
                .material(draw.material)
                .map(|m| m.name.as_str())
                .unwrap_or("?");
            let p = draw.model.transform_point3(glam::Vec3::ZERO);
            let _ = writeln!(
                out,
                "  [{}] {:<12} material={:<8} pos=({:.2}, {:.2}, {:.2}) depth={:.2}{}",
                draw.node.short(),
                name,
                material,
                p.x,
                p.y,
                p.z,
                draw.depth,
                if draw.transparent { " blend" } else { "" }
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haunted_house::{HouseOptions, build_haunted_house};

    fn frame(options: &HouseOptions) -> (Scene, FrameSnapshot) {
        let mut scene = Scene::new();
        let house = build_haunted_house(&mut scene, None, 1.0, options).unwrap();
        let snapshot = FrameSnapshot::extract(&scene, house.camera).unwrap();
        (scene, snapshot)
    }

    #[test]
    fn debug_renderer_empty_scene() {
        let mut scene = Scene::new();
        let root = scene.root();
        let camera = scene
            .insert(
                root,
                "camera",
                haunted_scene::NodeKind::Camera(Default::default()),
                Default::default(),
            )
            .unwrap();
        let snapshot = FrameSnapshot::extract(&scene, camera).unwrap();
        let mut renderer = DebugTextRenderer::default();
        let output = renderer.render(&scene, &snapshot);

        assert!(output.contains("Frame 1"));
        assert!(output.contains("Draws: 0 (0 opaque)"));
    }

    #[test]
    fn debug_renderer_lists_house_meshes() {
        let (scene, snapshot) = frame(&HouseOptions::default());
        let mut renderer = DebugTextRenderer::default();
        let output = renderer.render(&scene, &snapshot);

        assert!(output.contains("Draws: 8 (8 opaque)"));
        for name in ["walls", "roof", "door", "bush1", "bush4", "floor"] {
            assert!(output.contains(name), "missing {name}");
        }
        assert!(output.contains("Directional:"));
    }

    #[test]
    fn resize_is_reported() {
        let (scene, snapshot) = frame(&HouseOptions::default());
        let mut renderer = DebugTextRenderer::default();
        renderer.resize(SurfaceSize {
            width: 2560,
            height: 1440,
        });
        let output = renderer.render(&scene, &snapshot);
        assert!(output.starts_with("=== Frame 1 (2560x1440) ==="));
        renderer.render(&scene, &snapshot);
        assert_eq!(renderer.frames(), 2);
    }
}
