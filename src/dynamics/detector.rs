//! 物理链检测器

use std::collections::HashSet;

use super::{PhysBoneComponents, PhysicsChainProvider};
use crate::config::StitchConfig;
use crate::scene::{NodeId, Scene};

/// 物理链成员集合（只保留，不删除，不映射）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DynamicChainSet {
    nodes: HashSet<NodeId>,
}

impl DynamicChainSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入整棵子树
    pub fn insert_subtree(&mut self, scene: &Scene, root: NodeId) {
        self.nodes.extend(scene.descendants(root));
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// 节点本身或任一祖先属于物理链
    pub fn is_chain_member(&self, scene: &Scene, node: NodeId) -> bool {
        self.contains(node) || scene.ancestors(node).into_iter().any(|a| self.contains(a))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }
}

/// 物理链检测器
///
/// 物理能力在构造时注入一次；为 None 时使用名称匹配。
/// 对带物理组件的节点不允许漏检，多检（过度保留）可以接受。
pub struct DynamicChainDetector {
    provider: Option<Box<dyn PhysicsChainProvider>>,
    name_terms: Vec<String>,
}

impl DynamicChainDetector {
    pub fn new(provider: Option<Box<dyn PhysicsChainProvider>>, config: &StitchConfig) -> Self {
        Self {
            provider,
            name_terms: config.physics_name_terms.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    /// 使用节点上的 PhysBone 组件
    pub fn with_components(config: &StitchConfig) -> Self {
        Self::new(Some(Box::new(PhysBoneComponents)), config)
    }

    /// 只使用名称匹配
    pub fn name_heuristic(config: &StitchConfig) -> Self {
        Self::new(None, config)
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn detect_chains(&self, scene: &Scene, root: NodeId) -> DynamicChainSet {
        let mut set = DynamicChainSet::new();
        match &self.provider {
            Some(provider) => {
                let chains = provider.chains(scene, root);
                for chain in &chains {
                    set.insert_subtree(scene, chain.effective_root());
                }
                log::debug!("物理组件检测: {} 条链, {} 个节点", chains.len(), set.len());
            }
            None => {
                for id in scene.descendants(root) {
                    if set.contains(id) {
                        continue;
                    }
                    if self.matches_name(scene.name(id).unwrap_or_default()) {
                        set.insert_subtree(scene, id);
                    }
                }
                log::debug!("名称匹配检测: {} 个物理链节点", set.len());
            }
        }
        set
    }

    fn matches_name(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.name_terms.iter().any(|term| lowered.contains(term.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::PhysBone;

    fn hair_scene() -> (Scene, NodeId, NodeId, NodeId, NodeId) {
        let mut scene = Scene::new();
        let root = scene.add_root("Outfit");
        let head = scene.add_child(root, "Head").unwrap();
        let strand = scene.add_child(head, "Strand").unwrap();
        let tip = scene.add_child(strand, "Strand_end").unwrap();
        (scene, root, head, strand, tip)
    }

    #[test]
    fn test_component_chain_covers_whole_subtree() {
        let (mut scene, root, head, strand, tip) = hair_scene();
        scene.node_mut(head).unwrap().phys_bone = Some(PhysBone {
            root: Some(strand),
            ..PhysBone::default()
        });

        let detector = DynamicChainDetector::with_components(&StitchConfig::default());
        let set = detector.detect_chains(&scene, root);
        assert!(set.contains(strand));
        assert!(set.contains(tip));
        assert!(!set.contains(head));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_component_without_root_uses_owner() {
        let (mut scene, root, _head, strand, tip) = hair_scene();
        scene.node_mut(strand).unwrap().phys_bone = Some(PhysBone::default());

        let detector = DynamicChainDetector::with_components(&StitchConfig::default());
        let set = detector.detect_chains(&scene, root);
        assert!(set.contains(strand));
        assert!(set.contains(tip));
    }

    #[test]
    fn test_name_fallback() {
        let mut scene = Scene::new();
        let root = scene.add_root("Outfit");
        let head = scene.add_child(root, "Head").unwrap();
        let hair = scene.add_child(head, "Hair_Front").unwrap();
        let hair_tip = scene.add_child(hair, "Front_01").unwrap();
        let skirt = scene.add_child(root, "スカート前").unwrap();
        let forearm = scene.add_child(root, "LeftForeArm").unwrap();

        let detector = DynamicChainDetector::name_heuristic(&StitchConfig::default());
        assert!(!detector.has_provider());
        let set = detector.detect_chains(&scene, root);
        assert!(set.contains(hair));
        assert!(set.contains(hair_tip));
        assert!(set.contains(skirt));
        assert!(!set.contains(head));
        assert!(!set.contains(forearm));
    }

    #[test]
    fn test_chain_membership_through_ancestor() {
        let (scene, _root, head, strand, tip) = hair_scene();
        let mut set = DynamicChainSet::new();
        set.nodes.insert(strand);
        assert!(set.is_chain_member(&scene, tip));
        assert!(!set.is_chain_member(&scene, head));
    }
}
