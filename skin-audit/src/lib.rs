use scene::{DeformerId, JointId};
use thiserror::Error;

mod analysis;
pub mod classify;
pub mod deformer;
pub mod scene;
pub mod skeleton;

pub use analysis::{analyze, AnalysisOptions, DEFAULT_THRESHOLD};
pub use classify::ZeroWeightJoint;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("object not found: {0}")]
    ObjectNotFound(String),
    #[error("{0} is not a valid mesh object")]
    NotAMesh(String),
    #[error("no skin deformer found on {0}, bind the mesh to a skeleton first")]
    NoSkinDeformer(String),
    #[error("skin deformer {0} has no influences")]
    NoInfluences(DeformerId),
    #[error("ancestry of {joint} loops back to {revisited}")]
    MalformedHierarchy { joint: JointId, revisited: JointId },
    #[error("influence {joint} is not part of the skeleton rooted at {root}")]
    DisconnectedInfluences { root: JointId, joint: JointId },
    #[error("{deformer} has {expected} influences but vertex {vertex} has {found} weights")]
    WeightRowMismatch {
        deformer: DeformerId,
        vertex: usize,
        expected: usize,
        found: usize,
    },
    #[error("weight threshold must be a non-negative number, got {0}")]
    InvalidThreshold(f32),
}
