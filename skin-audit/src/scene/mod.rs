mod description;
mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use description::{
    NodeDescription, NodeType, SceneDescription, SkinClusterDescription,
};
pub use memory::{MemoryScene, SceneError, SceneNode, SceneNodeKind, SkinCluster};

macro_rules! scene_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(path: impl Into<String>) -> Self {
                Self(path.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(path: &str) -> Self {
                Self(path.to_owned())
            }
        }
    };
}

scene_id!(
    /// Full path of a joint, e.g. `|root|spine|neck`.
    JointId
);
scene_id!(
    /// Full path of a mesh shape node.
    ShapeId
);
scene_id!(
    /// Name of a skin deformer.
    DeformerId
);

/// Read-only view of the host scene graph.
///
/// Everything the analysis knows about a scene comes through this trait, so it
/// can run against a live host application or an in-memory [MemoryScene].
/// Implementations must return the same answers for the same scene state;
/// the analysis does not cache anything between calls.
pub trait SceneAccessor {
    /// Whether a node with this name or path exists.
    fn exists(&self, name: &str) -> bool;

    /// Resolves a transform to its first mesh shape.
    fn find_mesh_shape(&self, transform: &str) -> Option<ShapeId>;

    /// The skin deformer driving `shape`, if it is skinned.
    fn find_skin_deformer(&self, shape: &ShapeId) -> Option<DeformerId>;

    /// Influences of `deformer` in the order its weight rows use.
    fn influences_of(&self, deformer: &DeformerId) -> Vec<JointId>;

    /// Direct parent of `joint` if that parent is itself a joint.
    fn parent_joint(&self, joint: &JointId) -> Option<JointId>;

    /// Every joint below `joint`, excluding `joint` itself, in a stable order.
    fn descendant_joints(&self, joint: &JointId) -> Vec<JointId>;

    fn vertex_count(&self, shape: &ShapeId) -> usize;

    /// Normalized weights of one vertex, aligned with [SceneAccessor::influences_of].
    fn normalized_weights(&self, deformer: &DeformerId, vertex: usize) -> Vec<f32>;
}
