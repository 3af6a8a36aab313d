use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    classify::{classify, ZeroWeightJoint},
    deformer::aggregate,
    scene::{JointId, SceneAccessor},
    skeleton::collect_hierarchy,
    AnalysisError,
};

/// Weights at or below this count as zero. Large enough to absorb normalization noise.
pub const DEFAULT_THRESHOLD: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub threshold: f32,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Finds the joints of `mesh`'s skeleton that do not contribute to its deformation.
///
/// The mesh must resolve to a mesh shape driven by a skin deformer with at least one
/// influence; otherwise nothing is analysed and the failing object is reported.
/// The whole joint subtree above and below the influences is checked, so joints that
/// were never bound show up alongside influences that carry no weight.
pub fn analyze<S: SceneAccessor + ?Sized>(
    scene: &S,
    mesh: &str,
    options: &AnalysisOptions,
) -> Result<Vec<ZeroWeightJoint>, AnalysisError> {
    let threshold = options.threshold;
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(AnalysisError::InvalidThreshold(threshold));
    }

    if !scene.exists(mesh) {
        return Err(AnalysisError::ObjectNotFound(mesh.to_owned()));
    }
    let shape = scene
        .find_mesh_shape(mesh)
        .ok_or_else(|| AnalysisError::NotAMesh(mesh.to_owned()))?;
    let deformer = scene
        .find_skin_deformer(&shape)
        .ok_or_else(|| AnalysisError::NoSkinDeformer(mesh.to_owned()))?;
    let influences = scene.influences_of(&deformer);
    let Some(seed) = influences.first() else {
        return Err(AnalysisError::NoInfluences(deformer));
    };

    debug!(
        "analysing {shape} through {deformer} ({} influences, threshold {threshold})",
        influences.len()
    );

    let hierarchy = collect_hierarchy(scene, seed)?;
    if let Some(stray) = influences.iter().find(|i| !hierarchy.contains(i)) {
        return Err(AnalysisError::DisconnectedInfluences {
            root: hierarchy.root.clone(),
            joint: stray.clone(),
        });
    }

    let in_use = aggregate(scene, &shape, &deformer, &influences, threshold)?;
    let influences: HashSet<JointId> = influences.into_iter().collect();

    let results = classify(&hierarchy, &influences, &in_use);
    debug!(
        "{} of {} joints in use, {} reported",
        in_use.len(),
        hierarchy.len(),
        results.len()
    );

    Ok(results)
}
