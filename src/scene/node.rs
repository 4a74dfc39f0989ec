//! 场景节点

use super::{NodeId, SkinnedMesh, Transform};
use crate::rig::HumanoidMap;

/// 物理骨骼组件（头发、裙摆等弹簧链的标记）
#[derive(Clone, Debug, Default)]
pub struct PhysBone {
    /// 物理链的根节点，为空时使用组件所在节点
    pub root: Option<NodeId>,
    pub colliders: Vec<NodeId>,
    /// 不参与模拟的节点
    pub ignores: Vec<NodeId>,
}

/// 场景节点
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,

    /// 相对于父节点的变换
    pub local: Transform,

    // 组件
    pub skinned_mesh: Option<SkinnedMesh>,
    pub phys_bone: Option<PhysBone>,
    /// 原生人形映射（通常挂在角色根节点上）
    pub humanoid: Option<HumanoidMap>,
    /// 是否为主角色（基础人形）的描述符
    pub avatar_descriptor: bool,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            local: Transform::default(),
            skinned_mesh: None,
            phys_bone: None,
            humanoid: None,
            avatar_descriptor: false,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}
