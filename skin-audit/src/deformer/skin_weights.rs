use std::collections::HashSet;

use log::{debug, trace, warn};

use crate::{
    scene::{DeformerId, JointId, SceneAccessor, ShapeId},
    AnalysisError,
};

/// Largest normalized weight each influence reaches on any vertex of a mesh.
#[derive(Debug, Clone)]
pub struct InfluenceWeights {
    /// Influences in the order the deformer lays out its weight rows.
    pub influences: Vec<JointId>,
    pub max_weights: Vec<f32>,
    pub vertex_count: usize,
}

impl InfluenceWeights {
    /// Reads every vertex's normalized row once and keeps the per-influence maximum.
    pub fn scan<S: SceneAccessor + ?Sized>(
        scene: &S,
        shape: &ShapeId,
        deformer: &DeformerId,
        influences: &[JointId],
    ) -> Result<Self, AnalysisError> {
        let vertex_count = scene.vertex_count(shape);
        if vertex_count == 0 {
            warn!("{shape} has no vertices, every influence of {deformer} will read as unused");
        }

        let mut max_weights = vec![0.0f32; influences.len()];

        for vertex in 0..vertex_count {
            let row = scene.normalized_weights(deformer, vertex);
            if row.len() != influences.len() {
                return Err(AnalysisError::WeightRowMismatch {
                    deformer: deformer.clone(),
                    vertex,
                    expected: influences.len(),
                    found: row.len(),
                });
            }

            for (max, weight) in max_weights.iter_mut().zip(row) {
                *max = max.max(weight);
            }
        }

        debug!(
            "scanned {vertex_count} vertices x {} influences of {deformer}",
            influences.len()
        );

        Ok(InfluenceWeights {
            influences: influences.to_vec(),
            max_weights,
            vertex_count,
        })
    }

    pub fn max_weight(&self, joint: &JointId) -> Option<f32> {
        self.influences
            .iter()
            .position(|i| i == joint)
            .map(|index| self.max_weights[index])
    }

    /// Influences with at least one vertex weighted strictly above `threshold`.
    pub fn in_use(&self, threshold: f32) -> HashSet<JointId> {
        self.influences
            .iter()
            .zip(&self.max_weights)
            .filter(|(joint, max)| {
                trace!("{joint}: max weight {max}");
                **max > threshold
            })
            .map(|(joint, _)| joint.clone())
            .collect()
    }
}

/// Returns the influences that carry any weight above `threshold` on `shape`.
pub fn aggregate<S: SceneAccessor + ?Sized>(
    scene: &S,
    shape: &ShapeId,
    deformer: &DeformerId,
    influences: &[JointId],
    threshold: f32,
) -> Result<HashSet<JointId>, AnalysisError> {
    Ok(InfluenceWeights::scan(scene, shape, deformer, influences)?.in_use(threshold))
}
