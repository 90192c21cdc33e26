use haunted_common::NodeId;
use haunted_scene::{NodeKind, Scene};
use serde::Serialize;
use std::fmt::Write;

/// Scene inspector for developer tooling.
///
/// Read-only queries against the scene graph for debugging and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    /// Count nodes by kind and shared resources.
    pub fn summary(scene: &Scene) -> SceneSummary {
        let mut summary = SceneSummary {
            node_count: scene.node_count(),
            geometries: scene.geometries().len(),
            materials: scene.materials().len(),
            textured_materials: scene
                .materials()
                .values()
                .filter(|m| !m.maps.is_empty())
                .count(),
            ..SceneSummary::default()
        };
        for node in scene.nodes().values() {
            match node.kind {
                NodeKind::Root => {}
                NodeKind::Group => summary.groups += 1,
                NodeKind::Mesh(_) => summary.meshes += 1,
                NodeKind::Light(_) => summary.lights += 1,
                NodeKind::Camera(_) => summary.cameras += 1,
            }
        }
        summary
    }

    /// Describe a single node, with its local transform.
    pub fn inspect_node(scene: &Scene, id: NodeId) -> Option<NodeInfo> {
        let depth = Self::depth_of(scene, id)?;
        scene.get(id).map(|node| NodeInfo::new(id, node, depth, scene))
    }

    /// Every node in depth-first pre-order, each tagged with its depth.
    pub fn tree(scene: &Scene) -> Vec<NodeInfo> {
        let mut out = Vec::with_capacity(scene.node_count());
        let mut stack = vec![(scene.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = scene.get(id) else {
                continue;
            };
            out.push(NodeInfo::new(id, node, depth, scene));
            for child in node.children().iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }

    /// Indented text listing of [`tree`](Self::tree).
    pub fn tree_text(scene: &Scene) -> String {
        let mut out = String::new();
        for info in Self::tree(scene) {
            let _ = writeln!(out, "{}{info}", "  ".repeat(info.depth));
        }
        out
    }

    fn depth_of(scene: &Scene, id: NodeId) -> Option<usize> {
        let mut depth = 0;
        let mut cursor = scene.get(id)?.parent();
        while let Some(parent) = cursor {
            depth += 1;
            cursor = scene.get(parent)?.parent();
        }
        Some(depth)
    }
}

/// Summary of scene contents for the inspector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    /// Including the root.
    pub node_count: usize,
    pub groups: usize,
    pub meshes: usize,
    pub lights: usize,
    pub cameras: usize,
    pub geometries: usize,
    pub materials: usize,
    pub textured_materials: usize,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: nodes={} groups={} meshes={} lights={} cameras={} geometries={} materials={} (textured={})",
            self.node_count,
            self.groups,
            self.meshes,
            self.lights,
            self.cameras,
            self.geometries,
            self.materials,
            self.textured_materials
        )
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: &'static str,
    pub depth: usize,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub children: usize,
    /// Material name for meshes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Intensity for lights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f32>,
}

impl NodeInfo {
    fn new(id: NodeId, node: &haunted_scene::Node, depth: usize, scene: &Scene) -> Self {
        let t = &node.transform;
        let (material, intensity) = match &node.kind {
            NodeKind::Mesh(mesh) => (scene.material(mesh.material).map(|m| m.name.clone()), None),
            NodeKind::Light(light) => (None, Some(light.intensity)),
            _ => (None, None),
        };
        Self {
            id,
            name: node.name.clone(),
            kind: node.kind.name(),
            depth,
            position: t.position.to_array(),
            rotation: t.rotation.to_array(),
            scale: t.scale.to_array(),
            children: node.children().len(),
            material,
            intensity,
        }
    }
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} '{}' [{}] pos=({:.2}, {:.2}, {:.2})",
            self.kind,
            self.name,
            self.id.short(),
            self.position[0],
            self.position[1],
            self.position[2],
        )?;
        if self.scale != [1.0; 3] {
            write!(
                f,
                " scale=({:.2}, {:.2}, {:.2})",
                self.scale[0], self.scale[1], self.scale[2]
            )?;
        }
        if let Some(material) = &self.material {
            write!(f, " material={material}")?;
        }
        if let Some(intensity) = self.intensity {
            write!(f, " intensity={intensity:.3}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haunted_house::{GraveOptions, HouseOptions, build_haunted_house};

    #[test]
    fn summary_empty_scene() {
        let scene = Scene::new();
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.node_count, 1);
        assert_eq!(summary.meshes, 0);
    }

    #[test]
    fn summary_of_house() {
        let mut scene = Scene::new();
        build_haunted_house(&mut scene, None, 1.0, &HouseOptions::default()).unwrap();
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.groups, 2);
        assert_eq!(summary.meshes, 8);
        assert_eq!(summary.lights, 2);
        assert_eq!(summary.cameras, 1);
        assert_eq!(summary.node_count, 14);
        assert_eq!(summary.textured_materials, 0);
    }

    #[test]
    fn summary_counts_graves() {
        let mut scene = Scene::new();
        let options = HouseOptions {
            graves: Some(GraveOptions::default()),
            ..HouseOptions::default()
        };
        build_haunted_house(&mut scene, None, 1.0, &options).unwrap();
        assert_eq!(SceneInspector::summary(&scene).meshes, 58);
    }

    #[test]
    fn tree_is_preorder_with_depth() {
        let mut scene = Scene::new();
        let house = build_haunted_house(&mut scene, None, 1.0, &HouseOptions::default()).unwrap();
        let tree = SceneInspector::tree(&scene);
        assert_eq!(tree.len(), scene.node_count());
        assert_eq!(tree[0].kind, "root");
        assert_eq!(tree[1].id, house.house);
        assert_eq!(tree[1].children, 7);
        assert_eq!(tree[2].name, "walls");
        assert_eq!(tree[2].depth, 2);
        assert_eq!(tree[2].material.as_deref(), Some("walls"));
    }

    #[test]
    fn inspect_node_found_and_missing() {
        let mut scene = Scene::new();
        let house = build_haunted_house(&mut scene, None, 1.0, &HouseOptions::default()).unwrap();
        let info = SceneInspector::inspect_node(&scene, house.moon_light).unwrap();
        assert_eq!(info.position, [4.0, 5.0, -2.0]);
        assert_eq!(info.intensity, Some(0.5));
        assert_eq!(info.depth, 1);
        assert!(SceneInspector::inspect_node(&scene, NodeId::new()).is_none());
    }

    #[test]
    fn tree_text_indents_children() {
        let mut scene = Scene::new();
        build_haunted_house(&mut scene, None, 1.0, &HouseOptions::default()).unwrap();
        let text = SceneInspector::tree_text(&scene);
        assert!(text.starts_with("root 'scene'"));
        assert!(text.contains("\n    mesh 'bush1'"));
        assert!(text.contains("scale=(0.50, 0.50, 0.50)"));
    }

    #[test]
    fn summary_display() {
        let summary = SceneInspector::summary(&Scene::new());
        assert!(format!("{summary}").contains("nodes=1"));
    }
}
