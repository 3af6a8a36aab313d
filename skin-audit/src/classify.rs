use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{scene::JointId, skeleton::JointHierarchy};

/// A joint that can likely be pruned without changing how the mesh deforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroWeightJoint {
    pub name: JointId,
    pub parent: Option<JointId>,
    /// `true` when the joint is an influence of the skin deformer but never carries
    /// weight above the threshold, `false` when it is not an influence at all.
    pub has_skin_cluster: bool,
}

impl ZeroWeightJoint {
    pub fn is_zero_weight(&self) -> bool {
        self.has_skin_cluster
    }

    pub fn is_unbound(&self) -> bool {
        !self.has_skin_cluster
    }
}

/// Emits a record for every joint in `hierarchy` that is either an unused
/// influence or not an influence at all, keeping the hierarchy's order.
pub fn classify(
    hierarchy: &JointHierarchy,
    influences: &HashSet<JointId>,
    in_use: &HashSet<JointId>,
) -> Vec<ZeroWeightJoint> {
    hierarchy
        .joints
        .iter()
        .filter_map(|joint| {
            let has_skin_cluster = match (influences.contains(joint), in_use.contains(joint)) {
                (true, true) => return None,
                (true, false) => true,
                (false, _) => false,
            };
            Some(ZeroWeightJoint {
                name: joint.clone(),
                parent: hierarchy.parent_of(joint).cloned(),
                has_skin_cluster,
            })
        })
        .collect()
}
