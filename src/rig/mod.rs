//! 骨骼实例与归属判定

mod context;
mod reference;

pub use context::{ContextDetector, RigContext, BASE_LABEL};
pub use reference::RigReference;

use std::collections::HashMap;

use crate::humanoid::CanonicalJoint;
use crate::scene::NodeId;

/// 原生关节映射能力（权威映射，优先于名称启发式）
pub trait NativeRigMap: std::fmt::Debug {
    fn joint(&self, joint: CanonicalJoint) -> Option<NodeId>;
}

/// 人形映射表，挂在角色根节点上
#[derive(Clone, Debug, Default)]
pub struct HumanoidMap {
    joints: HashMap<CanonicalJoint, NodeId>,
}

impl HumanoidMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, joint: CanonicalJoint, node: NodeId) {
        self.joints.insert(joint, node);
    }

    pub fn with(mut self, joint: CanonicalJoint, node: NodeId) -> Self {
        self.insert(joint, node);
        self
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

impl NativeRigMap for HumanoidMap {
    fn joint(&self, joint: CanonicalJoint) -> Option<NodeId> {
        self.joints.get(&joint).copied()
    }
}
