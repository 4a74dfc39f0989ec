//! 物理链组件能力

use crate::scene::{NodeId, Scene};

/// 一条物理链的配置
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsChain {
    /// 组件所在节点
    pub owner: NodeId,
    /// 配置的链根，为空时使用 owner
    pub root: Option<NodeId>,
    pub colliders: Vec<NodeId>,
    pub ignores: Vec<NodeId>,
}

impl PhysicsChain {
    pub fn effective_root(&self) -> NodeId {
        self.root.unwrap_or(self.owner)
    }
}

/// 物理链能力（宿主环境可能不提供）
pub trait PhysicsChainProvider {
    /// 枚举 root 子树中所有物理链组件
    fn chains(&self, scene: &Scene, root: NodeId) -> Vec<PhysicsChain>;
}

/// 从节点上的 PhysBone 组件读取物理链
#[derive(Clone, Copy, Debug, Default)]
pub struct PhysBoneComponents;

impl PhysicsChainProvider for PhysBoneComponents {
    fn chains(&self, scene: &Scene, root: NodeId) -> Vec<PhysicsChain> {
        scene
            .descendants(root)
            .into_iter()
            .filter_map(|id| {
                let phys = scene.node(id)?.phys_bone.as_ref()?;
                Some(PhysicsChain {
                    owner: id,
                    // 链根已被删除时退回组件所在节点
                    root: phys.root.filter(|&r| scene.contains(r)),
                    colliders: phys.colliders.clone(),
                    ignores: phys.ignores.clone(),
                })
            })
            .collect()
    }
}
