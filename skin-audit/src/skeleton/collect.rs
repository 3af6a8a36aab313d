use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::{
    scene::{JointId, SceneAccessor},
    AnalysisError,
};

/// Every joint below a skeleton root, with the parent of each.
#[derive(Debug, Clone)]
pub struct JointHierarchy {
    pub root: JointId,
    /// The root first, then its descendants in the order the scene reports them.
    pub joints: Vec<JointId>,
    parents: HashMap<JointId, Option<JointId>>,
}

impl JointHierarchy {
    pub fn parent_of(&self, joint: &JointId) -> Option<&JointId> {
        self.parents.get(joint).and_then(Option::as_ref)
    }

    pub fn contains(&self, joint: &JointId) -> bool {
        self.parents.contains_key(joint)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// Walks up from `seed` until reaching a joint whose parent is not a joint.
///
/// Fails instead of looping when the ancestry revisits a joint.
pub fn find_root<S: SceneAccessor + ?Sized>(
    scene: &S,
    seed: &JointId,
) -> Result<JointId, AnalysisError> {
    let mut visited = HashSet::from([seed.clone()]);
    let mut current = seed.clone();

    while let Some(parent) = scene.parent_joint(&current) {
        if !visited.insert(parent.clone()) {
            return Err(AnalysisError::MalformedHierarchy {
                joint: seed.clone(),
                revisited: parent,
            });
        }
        trace!("{current} -> {parent}");
        current = parent;
    }

    Ok(current)
}

pub fn collect_hierarchy<S: SceneAccessor + ?Sized>(
    scene: &S,
    seed: &JointId,
) -> Result<JointHierarchy, AnalysisError> {
    let root = find_root(scene, seed)?;

    let mut parents = HashMap::new();
    let mut joints = Vec::new();

    for joint in std::iter::once(root.clone()).chain(scene.descendant_joints(&root)) {
        if parents.contains_key(&joint) {
            continue;
        }
        let parent = scene.parent_joint(&joint);
        parents.insert(joint.clone(), parent);
        joints.push(joint);
    }

    debug!("skeleton rooted at {root} has {} joints", joints.len());

    Ok(JointHierarchy {
        root,
        joints,
        parents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{DeformerId, MemoryScene, ShapeId};

    // root -> spine -> (neck -> head, clavicle), with a transform between spine and clavicle.
    fn skeleton() -> MemoryScene {
        let mut scene = MemoryScene::new();
        scene.add_joint("root", None).unwrap();
        scene.add_joint("spine", Some("root")).unwrap();
        scene.add_joint("neck", Some("spine")).unwrap();
        scene.add_joint("head", Some("neck")).unwrap();
        scene.add_transform("group", Some("spine")).unwrap();
        scene.add_joint("clavicle", Some("group")).unwrap();
        scene
    }

    #[test]
    fn test_root_is_independent_of_seed() {
        let scene = skeleton();

        let from_head = collect_hierarchy(&scene, &"head".into()).unwrap();
        let from_spine = collect_hierarchy(&scene, &"|root|spine".into()).unwrap();

        assert_eq!(from_head.root, JointId::new("|root"));
        assert_eq!(from_head.root, from_spine.root);
        assert_eq!(from_head.joints, from_spine.joints);
    }

    #[test]
    fn test_root_first_with_parents() {
        let scene = skeleton();
        let hierarchy = collect_hierarchy(&scene, &"neck".into()).unwrap();

        assert_eq!(
            hierarchy.joints,
            vec![
                JointId::new("|root"),
                JointId::new("|root|spine"),
                JointId::new("|root|spine|neck"),
                JointId::new("|root|spine|neck|head"),
                JointId::new("|root|spine|group|clavicle"),
            ]
        );
        assert_eq!(hierarchy.parent_of(&"|root".into()), None);
        assert_eq!(
            hierarchy.parent_of(&"|root|spine|neck|head".into()),
            Some(&JointId::new("|root|spine|neck"))
        );
        // Joints under a plain transform have no joint parent.
        assert_eq!(hierarchy.parent_of(&"|root|spine|group|clavicle".into()), None);
        assert!(hierarchy.contains(&"|root|spine|group|clavicle".into()));
    }

    #[test]
    fn test_root_stops_at_transform() {
        let scene = skeleton();

        assert_eq!(
            find_root(&scene, &"|root|spine|group|clavicle".into()).unwrap(),
            JointId::new("|root|spine|group|clavicle")
        );
    }

    struct LoopingSkeleton {
        parents: HashMap<JointId, JointId>,
    }

    impl SceneAccessor for LoopingSkeleton {
        fn exists(&self, _: &str) -> bool {
            true
        }

        fn find_mesh_shape(&self, _: &str) -> Option<ShapeId> {
            None
        }

        fn find_skin_deformer(&self, _: &ShapeId) -> Option<DeformerId> {
            None
        }

        fn influences_of(&self, _: &DeformerId) -> Vec<JointId> {
            Vec::new()
        }

        fn parent_joint(&self, joint: &JointId) -> Option<JointId> {
            self.parents.get(joint).cloned()
        }

        fn descendant_joints(&self, _: &JointId) -> Vec<JointId> {
            Vec::new()
        }

        fn vertex_count(&self, _: &ShapeId) -> usize {
            0
        }

        fn normalized_weights(&self, _: &DeformerId, _: usize) -> Vec<f32> {
            Vec::new()
        }
    }

    #[test]
    fn test_parent_cycle_is_malformed() {
        let scene = LoopingSkeleton {
            parents: HashMap::from([
                ("a".into(), "b".into()),
                ("b".into(), "c".into()),
                ("c".into(), "a".into()),
            ]),
        };

        match collect_hierarchy(&scene, &"a".into()) {
            Err(AnalysisError::MalformedHierarchy { joint, revisited }) => {
                assert_eq!(joint, JointId::new("a"));
                assert_eq!(revisited, JointId::new("a"));
            }
            other => panic!("expected a malformed hierarchy, got {other:?}"),
        }
    }
}
