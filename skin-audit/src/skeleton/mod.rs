mod collect;

pub use collect::{collect_hierarchy, find_root, JointHierarchy};
