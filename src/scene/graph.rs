use super::{
    eval,
    types::{AnimStack, Pose, SceneNode},
};
use crate::transform::Transform;
use log::trace;

/// Name of the implicit root node that every scene has
pub const ROOT_NODE_NAME: &str = "RootNode";

/// Read access to a loaded scene: the node graph, its poses and the single
/// animation clip. Node handles are indices handed out by the provider.
pub trait SceneProvider {
    fn root(&self) -> usize;
    fn node_name(&self, node: usize) -> &str;
    fn children(&self, node: usize) -> &[usize];
    fn parent(&self, node: usize) -> Option<usize>;
    fn poses(&self) -> &[Pose];
    fn anim_stack(&self) -> Option<AnimStack>;

    /// Local transform of `node` at `time` seconds into the clip
    fn local_transform(&self, node: usize, time: f64) -> Transform;
}

/// In-memory scene. Node 0 is always the implicit root.
#[derive(Clone, Debug)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    poses: Vec<Pose>,
    animation: Option<String>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![SceneNode::new(ROOT_NODE_NAME, None)],
            poses: Vec::new(),
            animation: None,
        }
    }

    /// Appends a node as the last child of `parent` and returns its index.
    /// An unknown parent attaches the node to the root.
    pub fn add_node(&mut self, parent: usize, name: &str) -> usize {
        let parent = if parent < self.nodes.len() { parent } else { 0 };
        let index = self.nodes.len();
        self.nodes.push(SceneNode::new(name, Some(parent)));
        self.nodes[parent].children.push(index);
        trace!("node {index} {name:?} parent={parent}");
        index
    }

    #[must_use]
    pub fn node(&self, node: usize) -> Option<&SceneNode> {
        self.nodes.get(node)
    }

    pub fn node_mut(&mut self, node: usize) -> Option<&mut SceneNode> {
        self.nodes.get_mut(node)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_pose(&mut self, pose: Pose) {
        self.poses.push(pose);
    }

    /// Names the animation clip. A scene without a name has no animation.
    pub fn set_animation(&mut self, name: &str) {
        self.animation = Some(name.to_string());
    }
}

impl SceneProvider for Scene {
    fn root(&self) -> usize {
        0
    }

    fn node_name(&self, node: usize) -> &str {
        self.nodes.get(node).map_or("", |n| n.name.as_str())
    }

    fn children(&self, node: usize) -> &[usize] {
        self.nodes
            .get(node)
            .map_or(&[][..], |n| n.children.as_slice())
    }

    fn parent(&self, node: usize) -> Option<usize> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    fn poses(&self) -> &[Pose] {
        &self.poses
    }

    fn anim_stack(&self) -> Option<AnimStack> {
        let name = self.animation.as_ref()?;
        let duration = self
            .nodes
            .iter()
            .map(SceneNode::max_time)
            .fold(0.0_f64, f64::max);
        Some(AnimStack {
            name: name.clone(),
            duration,
        })
    }

    fn local_transform(&self, node: usize, time: f64) -> Transform {
        let Some(n) = self.nodes.get(node) else {
            return Transform::default();
        };
        let rest = n.rest;
        Transform {
            rotation: n
                .rotation
                .as_ref()
                .and_then(|c| eval::sample(c, time))
                .unwrap_or(rest.rotation),
            translation: n
                .translation
                .as_ref()
                .and_then(|c| eval::sample(c, time))
                .unwrap_or(rest.translation),
            scale: n
                .scale
                .as_ref()
                .and_then(|c| eval::sample(c, time))
                .unwrap_or(rest.scale),
        }
    }
}
