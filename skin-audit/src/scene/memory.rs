use std::collections::HashMap;

use indextree::{Arena, NodeId};
use thiserror::Error;

use crate::deformer::normalize_weights;

use super::{DeformerId, JointId, SceneAccessor, ShapeId};

const PATH_SEPARATOR: char = '|';

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("invalid node name {0:?}")]
    InvalidName(String),
    #[error("no node named {0}")]
    UnknownNode(String),
    #[error("more than one node matches {0}")]
    AmbiguousName(String),
    #[error("{parent} already has a child named {name}")]
    DuplicateName { parent: String, name: String },
    #[error("{0} is a shape and cannot have children")]
    ParentIsShape(String),
    #[error("{0} is not a mesh shape")]
    NotAShape(String),
    #[error("{0} is not a joint")]
    NotAJoint(String),
    #[error("a deformer named {0} already exists")]
    DuplicateDeformer(String),
    #[error("no skin deformer named {0}")]
    UnknownDeformer(String),
    #[error("{joint} is listed twice as an influence of {deformer}")]
    DuplicateInfluence { deformer: String, joint: String },
    #[error("vertex {vertex} is out of range for {deformer} ({count} vertices)")]
    VertexOutOfRange {
        deformer: String,
        vertex: usize,
        count: usize,
    },
    #[error("{deformer} has {expected} influences but a weight row has {found} values")]
    WeightRowLength {
        deformer: String,
        expected: usize,
        found: usize,
    },
    #[error("invalid weight {weight} on vertex {vertex} of {deformer}")]
    InvalidWeight {
        deformer: String,
        vertex: usize,
        weight: f32,
    },
    #[error("could not parse scene description")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneNodeKind {
    Transform,
    Joint,
    Mesh { vertex_count: usize },
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub path: String,
    pub kind: SceneNodeKind,
}

#[derive(Debug, Clone)]
pub struct SkinCluster {
    pub name: String,
    pub shape: NodeId,
    pub influences: Vec<NodeId>,
    // Raw, unnormalized rows indexed by vertex. Missing rows read as zero.
    weights: Vec<Vec<f32>>,
}

/// A scene graph held entirely in memory.
///
/// Nodes live in an [Arena] and are addressed either by their full path
/// (`|root|spine`) or by any path suffix that matches exactly one node
/// (`spine`, `root|spine`).
#[derive(Debug, Clone)]
pub struct MemoryScene {
    nodes: Arena<SceneNode>,
    paths: HashMap<String, NodeId>,
    // Leaf name to every node carrying it, in creation order.
    names: HashMap<String, Vec<NodeId>>,
    roots: Vec<NodeId>,
    skin_clusters: Vec<SkinCluster>,
    selection: Vec<String>,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        MemoryScene {
            nodes: Arena::new(),
            paths: HashMap::new(),
            names: HashMap::new(),
            roots: Vec::new(),
            skin_clusters: Vec::new(),
            selection: Vec::new(),
        }
    }

    pub fn add_transform(
        &mut self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<String, SceneError> {
        let id = self.insert(name, SceneNodeKind::Transform, parent)?;
        Ok(self.nodes[id].get().path.clone())
    }

    pub fn add_joint(&mut self, name: &str, parent: Option<&str>) -> Result<JointId, SceneError> {
        let id = self.insert(name, SceneNodeKind::Joint, parent)?;
        Ok(JointId::new(self.nodes[id].get().path.clone()))
    }

    pub fn add_mesh(
        &mut self,
        name: &str,
        parent: Option<&str>,
        vertex_count: usize,
    ) -> Result<ShapeId, SceneError> {
        let id = self.insert(name, SceneNodeKind::Mesh { vertex_count }, parent)?;
        Ok(ShapeId::new(self.nodes[id].get().path.clone()))
    }

    fn insert(
        &mut self,
        name: &str,
        kind: SceneNodeKind,
        parent: Option<&str>,
    ) -> Result<NodeId, SceneError> {
        if name.is_empty() || name.contains(PATH_SEPARATOR) {
            return Err(SceneError::InvalidName(name.to_owned()));
        }

        let parent_id = parent.map(|p| self.lookup(p)).transpose()?;

        let siblings: Vec<NodeId> = match parent_id {
            Some(parent_id) => {
                let parent_node = self.nodes[parent_id].get();
                if let SceneNodeKind::Mesh { .. } = parent_node.kind {
                    return Err(SceneError::ParentIsShape(parent_node.path.clone()));
                }
                parent_id.children(&self.nodes).collect()
            }
            None => self.roots.clone(),
        };
        if siblings.iter().any(|s| self.nodes[*s].get().name == name) {
            let parent = parent_id
                .map(|p| self.nodes[p].get().path.clone())
                .unwrap_or_else(|| PATH_SEPARATOR.to_string());
            return Err(SceneError::DuplicateName {
                parent,
                name: name.to_owned(),
            });
        }

        let path = match parent_id {
            Some(parent_id) => format!(
                "{}{PATH_SEPARATOR}{name}",
                self.nodes[parent_id].get().path
            ),
            None => format!("{PATH_SEPARATOR}{name}"),
        };

        let id = self.nodes.new_node(SceneNode {
            name: name.to_owned(),
            path: path.clone(),
            kind,
        });
        match parent_id {
            Some(parent_id) => parent_id.append(id, &mut self.nodes),
            None => self.roots.push(id),
        }
        self.paths.insert(path, id);
        self.names.entry(name.to_owned()).or_default().push(id);

        Ok(id)
    }

    pub fn add_skin_cluster(
        &mut self,
        name: &str,
        shape: &str,
        influences: &[&str],
    ) -> Result<DeformerId, SceneError> {
        if name.is_empty() || name.contains(PATH_SEPARATOR) {
            return Err(SceneError::InvalidName(name.to_owned()));
        }
        if self.skin_clusters.iter().any(|c| c.name == name) {
            return Err(SceneError::DuplicateDeformer(name.to_owned()));
        }

        let shape_id = self.lookup(shape)?;
        if !matches!(self.nodes[shape_id].get().kind, SceneNodeKind::Mesh { .. }) {
            return Err(SceneError::NotAShape(self.nodes[shape_id].get().path.clone()));
        }

        let mut influence_ids = Vec::with_capacity(influences.len());
        for influence in influences {
            let id = self.lookup(influence)?;
            let node = self.nodes[id].get();
            if node.kind != SceneNodeKind::Joint {
                return Err(SceneError::NotAJoint(node.path.clone()));
            }
            if influence_ids.contains(&id) {
                return Err(SceneError::DuplicateInfluence {
                    deformer: name.to_owned(),
                    joint: node.path.clone(),
                });
            }
            influence_ids.push(id);
        }

        self.skin_clusters.push(SkinCluster {
            name: name.to_owned(),
            shape: shape_id,
            influences: influence_ids,
            weights: Vec::new(),
        });

        Ok(DeformerId::new(name))
    }

    /// Stores the raw weights of one vertex. Rows are normalized on read.
    pub fn set_weights(
        &mut self,
        deformer: &str,
        vertex: usize,
        weights: &[f32],
    ) -> Result<(), SceneError> {
        let index = self
            .skin_clusters
            .iter()
            .position(|c| c.name == deformer)
            .ok_or_else(|| SceneError::UnknownDeformer(deformer.to_owned()))?;

        let vertex_count = match self.nodes[self.skin_clusters[index].shape].get().kind {
            SceneNodeKind::Mesh { vertex_count } => vertex_count,
            _ => 0,
        };
        let cluster = &mut self.skin_clusters[index];

        if vertex >= vertex_count {
            return Err(SceneError::VertexOutOfRange {
                deformer: deformer.to_owned(),
                vertex,
                count: vertex_count,
            });
        }
        if weights.len() != cluster.influences.len() {
            return Err(SceneError::WeightRowLength {
                deformer: deformer.to_owned(),
                expected: cluster.influences.len(),
                found: weights.len(),
            });
        }
        if let Some(weight) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(SceneError::InvalidWeight {
                deformer: deformer.to_owned(),
                vertex,
                weight: *weight,
            });
        }

        if cluster.weights.len() <= vertex {
            cluster.weights.resize(vertex + 1, Vec::new());
        }
        cluster.weights[vertex] = weights.to_vec();

        Ok(())
    }

    pub fn select(&mut self, name: &str) -> Result<(), SceneError> {
        let id = self.lookup(name)?;
        self.selection.push(self.nodes[id].get().path.clone());
        Ok(())
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn node(&self, name: &str) -> Option<&SceneNode> {
        self.lookup(name).ok().map(|id| self.nodes[id].get())
    }

    pub fn skin_clusters(&self) -> &[SkinCluster] {
        &self.skin_clusters
    }

    fn lookup(&self, name: &str) -> Result<NodeId, SceneError> {
        if name.starts_with(PATH_SEPARATOR) {
            return self
                .paths
                .get(name)
                .copied()
                .ok_or_else(|| SceneError::UnknownNode(name.to_owned()));
        }

        let leaf = name.rsplit(PATH_SEPARATOR).next().unwrap_or(name);
        let candidates = self.names.get(leaf).map(Vec::as_slice).unwrap_or_default();
        let mut found = candidates.iter().copied().filter(|id| {
            self.nodes[*id]
                .get()
                .path
                .strip_suffix(name)
                .is_some_and(|rest| rest.ends_with(PATH_SEPARATOR))
        });

        match (found.next(), found.next()) {
            (Some(id), None) => Ok(id),
            (Some(_), Some(_)) => Err(SceneError::AmbiguousName(name.to_owned())),
            (None, _) => Err(SceneError::UnknownNode(name.to_owned())),
        }
    }

    fn cluster(&self, deformer: &DeformerId) -> Option<&SkinCluster> {
        self.skin_clusters.iter().find(|c| c.name == deformer.as_str())
    }

    fn path_of(&self, id: NodeId) -> &str {
        &self.nodes[id].get().path
    }
}

impl SceneAccessor for MemoryScene {
    /// An ambiguous short name still exists; resolving it to a shape is what fails.
    fn exists(&self, name: &str) -> bool {
        matches!(
            self.lookup(name),
            Ok(_) | Err(SceneError::AmbiguousName(_))
        ) || self.skin_clusters.iter().any(|c| c.name == name)
    }

    fn find_mesh_shape(&self, transform: &str) -> Option<ShapeId> {
        let id = self.lookup(transform).ok()?;
        id.children(&self.nodes)
            .find(|child| matches!(self.nodes[*child].get().kind, SceneNodeKind::Mesh { .. }))
            .map(|child| ShapeId::new(self.path_of(child)))
    }

    fn find_skin_deformer(&self, shape: &ShapeId) -> Option<DeformerId> {
        let shape_id = self.lookup(shape.as_str()).ok()?;
        self.skin_clusters
            .iter()
            .find(|c| c.shape == shape_id)
            .map(|c| DeformerId::new(c.name.as_str()))
    }

    fn influences_of(&self, deformer: &DeformerId) -> Vec<JointId> {
        self.cluster(deformer)
            .map(|c| {
                c.influences
                    .iter()
                    .map(|id| JointId::new(self.path_of(*id)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parent_joint(&self, joint: &JointId) -> Option<JointId> {
        let id = self.lookup(joint.as_str()).ok()?;
        let parent = self.nodes[id].parent()?;
        match self.nodes[parent].get().kind {
            SceneNodeKind::Joint => Some(JointId::new(self.path_of(parent))),
            _ => None,
        }
    }

    fn descendant_joints(&self, joint: &JointId) -> Vec<JointId> {
        let Ok(id) = self.lookup(joint.as_str()) else {
            return Vec::new();
        };
        id.descendants(&self.nodes)
            .skip(1)
            .filter(|d| self.nodes[*d].get().kind == SceneNodeKind::Joint)
            .map(|d| JointId::new(self.path_of(d)))
            .collect()
    }

    fn vertex_count(&self, shape: &ShapeId) -> usize {
        match self.node(shape.as_str()).map(|n| n.kind) {
            Some(SceneNodeKind::Mesh { vertex_count }) => vertex_count,
            _ => 0,
        }
    }

    fn normalized_weights(&self, deformer: &DeformerId, vertex: usize) -> Vec<f32> {
        let Some(cluster) = self.cluster(deformer) else {
            return Vec::new();
        };
        match cluster.weights.get(vertex) {
            Some(row) if !row.is_empty() => normalize_weights(row),
            _ => vec![0.0; cluster.influences.len()],
        }
    }
}
