//! 节点归属判定（基础角色 / 附加服装）

use crate::config::StitchConfig;
use crate::scene::{NodeId, Scene};

/// 基础角色的标签
pub const BASE_LABEL: &str = "Base";

/// 节点所属的骨骼上下文
#[derive(Clone, Debug, PartialEq)]
pub struct RigContext {
    /// 拥有该骨骼的对象（角色根或服装根）
    pub root_object: NodeId,
    pub rig_root: Option<NodeId>,
    pub label: String,
    pub is_base: bool,
}

/// 归属判定器
#[derive(Clone, Debug)]
pub struct ContextDetector {
    rig_root_names: Vec<String>,
}

impl ContextDetector {
    pub fn new(config: &StitchConfig) -> Self {
        Self {
            rig_root_names: config.rig_root_names.clone(),
        }
    }

    fn is_rig_root_name(&self, scene: &Scene, node: NodeId) -> bool {
        scene
            .name(node)
            .is_some_and(|name| self.rig_root_names.iter().any(|n| n == name))
    }

    /// 从 node 向上查找拥有骨骼根的对象
    ///
    /// 对象等于 base_root 或带有主角色描述符时归为基础角色，否则为附加物并以其名称作标签。
    /// 一直走到 base_root 都没有找到时归为基础角色。
    pub fn detect_context(&self, scene: &Scene, node: NodeId, base_root: NodeId) -> RigContext {
        let mut current = Some(node);
        while let Some(cur) = current {
            if let Some((owner, rig_root)) = self.owner_of(scene, cur) {
                return self.classify(scene, owner, rig_root, base_root);
            }
            if cur == base_root {
                break;
            }
            current = scene.parent(cur);
        }

        let rig_root = scene
            .children(base_root)
            .iter()
            .copied()
            .find(|&c| self.is_rig_root_name(scene, c));
        RigContext {
            root_object: base_root,
            rig_root,
            label: BASE_LABEL.to_string(),
            is_base: true,
        }
    }

    /// cur 本身是骨骼根容器、有骨骼根容器子节点或带有人形组件时，返回 (拥有者, 骨骼根)
    fn owner_of(&self, scene: &Scene, cur: NodeId) -> Option<(NodeId, Option<NodeId>)> {
        if self.is_rig_root_name(scene, cur) {
            return Some((scene.parent(cur).unwrap_or(cur), Some(cur)));
        }
        if let Some(child) = scene
            .children(cur)
            .iter()
            .copied()
            .find(|&c| self.is_rig_root_name(scene, c))
        {
            return Some((cur, Some(child)));
        }
        let node = scene.node(cur)?;
        if node.humanoid.is_some() || node.avatar_descriptor {
            return Some((cur, None));
        }
        None
    }

    fn classify(&self, scene: &Scene, owner: NodeId, rig_root: Option<NodeId>, base_root: NodeId) -> RigContext {
        let is_base = owner == base_root || scene.node(owner).is_some_and(|n| n.avatar_descriptor);
        let label = if is_base {
            BASE_LABEL.to_string()
        } else {
            scene.name(owner).unwrap_or_default().to_string()
        };
        RigContext {
            root_object: owner,
            rig_root,
            label,
            is_base,
        }
    }
}
