use serde::{Deserialize, Serialize};

use super::{MemoryScene, SceneError};

/// Serialized form of a [MemoryScene].
///
/// ```json
/// {
///   "nodes": [
///     { "name": "root", "type": "joint" },
///     { "name": "spine", "type": "joint", "parent": "root" },
///     { "name": "body", "type": "transform" },
///     { "name": "bodyShape", "type": "mesh", "parent": "body", "vertex_count": 2 }
///   ],
///   "skin_clusters": [
///     { "name": "skinCluster1", "shape": "bodyShape", "influences": ["spine"],
///       "weights": [[1.0], [1.0]] }
///   ],
///   "selection": ["body"]
/// }
/// ```
///
/// Parents must be listed before their children.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDescription {
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
    #[serde(default)]
    pub skin_clusters: Vec<SkinClusterDescription>,
    #[serde(default)]
    pub selection: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Transform,
    Joint,
    Mesh,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(rename = "type")]
    pub ty: NodeType,
    // Only meaningful for meshes.
    #[serde(default)]
    pub vertex_count: usize,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SkinClusterDescription {
    pub name: String,
    pub shape: String,
    pub influences: Vec<String>,
    /// Raw weight rows, one per vertex starting at vertex 0.
    #[serde(default)]
    pub weights: Vec<Vec<f32>>,
}

impl SceneDescription {
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn build(&self) -> Result<MemoryScene, SceneError> {
        let mut scene = MemoryScene::new();

        for node in &self.nodes {
            let parent = node.parent.as_deref();
            match node.ty {
                NodeType::Transform => {
                    scene.add_transform(&node.name, parent)?;
                }
                NodeType::Joint => {
                    scene.add_joint(&node.name, parent)?;
                }
                NodeType::Mesh => {
                    scene.add_mesh(&node.name, parent, node.vertex_count)?;
                }
            }
        }

        for cluster in &self.skin_clusters {
            let influences: Vec<&str> = cluster.influences.iter().map(String::as_str).collect();
            scene.add_skin_cluster(&cluster.name, &cluster.shape, &influences)?;
            for (vertex, row) in cluster.weights.iter().enumerate() {
                scene.set_weights(&cluster.name, vertex, row)?;
            }
        }

        for name in &self.selection {
            scene.select(name)?;
        }

        Ok(scene)
    }
}

impl MemoryScene {
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        SceneDescription::from_json(json)?.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{DeformerId, JointId, SceneAccessor, ShapeId};

    const LEG: &str = r#"{
        "nodes": [
            { "name": "hip", "type": "joint" },
            { "name": "knee", "type": "joint", "parent": "hip" },
            { "name": "ankle", "type": "joint", "parent": "knee" },
            { "name": "leg", "type": "transform" },
            { "name": "legShape", "type": "mesh", "parent": "leg", "vertex_count": 3 }
        ],
        "skin_clusters": [
            {
                "name": "skinCluster1",
                "shape": "legShape",
                "influences": ["hip", "knee"],
                "weights": [[1.0, 0.0], [0.5, 0.5]]
            }
        ],
        "selection": ["leg"]
    }"#;

    #[test]
    fn test_build_from_json() {
        let scene = MemoryScene::from_json(LEG).unwrap();
        let skin = DeformerId::new("skinCluster1");

        assert_eq!(scene.selection(), &["|leg".to_owned()]);
        assert_eq!(
            scene.find_skin_deformer(&ShapeId::new("|leg|legShape")),
            Some(skin.clone())
        );
        assert_eq!(
            scene.influences_of(&skin),
            vec![JointId::new("|hip"), JointId::new("|hip|knee")]
        );
        assert_eq!(scene.normalized_weights(&skin, 1), vec![0.5, 0.5]);
        assert_eq!(scene.normalized_weights(&skin, 2), vec![0.0, 0.0]);
    }

    #[test]
    fn test_children_before_parents_is_rejected() {
        let json = r#"{
            "nodes": [
                { "name": "knee", "type": "joint", "parent": "hip" },
                { "name": "hip", "type": "joint" }
            ]
        }"#;

        assert!(matches!(
            MemoryScene::from_json(json),
            Err(SceneError::UnknownNode(name)) if name == "hip"
        ));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let json = r#"{ "nodes": [], "meshes": [] }"#;

        assert!(matches!(
            SceneDescription::from_json(json),
            Err(SceneError::Json(_))
        ));
    }
}
