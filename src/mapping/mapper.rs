//! 骨骼映射器

use std::collections::HashSet;

use super::{JointMapping, MappingMethod, MappingSummary, NameCache};
use crate::config::StitchConfig;
use crate::humanoid::{normalize, normalized_variants, similarity_normalized, CanonicalJoint};
use crate::rig::RigReference;
use crate::scene::{NodeId, Scene};

/// 骨骼映射器
///
/// 按分类顺序处理每个标准关节：
/// 1. 在源骨骼中解析（有原生映射时只用原生映射，否则名称启发式），解析不到则跳过该关节；
/// 2. 在目标骨骼中三级查找：原生映射 -> 源节点名精确匹配 -> 启发式（命名变体，再相似度）；
/// 3. 目标找不到时仍输出 target 为空的一行，便于审计。
#[derive(Clone, Debug)]
pub struct BoneMapper {
    threshold: f32,
    denied: Vec<CanonicalJoint>,
}

impl BoneMapper {
    pub fn new(config: &StitchConfig) -> Self {
        Self {
            threshold: config.similarity_threshold,
            denied: config.denied_joints.clone(),
        }
    }

    pub fn detect_mapping(
        &self,
        scene: &Scene,
        source: &RigReference,
        target: &RigReference,
        prefix: Option<&str>,
        suffix: Option<&str>,
    ) -> Vec<JointMapping> {
        let source_cache = NameCache::build(scene, source.search_root(), None, None);
        let target_cache = NameCache::build(scene, target.search_root(), prefix, suffix);

        let mut claimed_sources: HashSet<NodeId> = HashSet::new();
        let mut claimed_targets: HashSet<NodeId> = HashSet::new();
        let mut mappings = Vec::new();

        for joint in CanonicalJoint::ALL {
            if self.denied.contains(&joint) {
                continue;
            }

            // 源骨骼有原生映射时以其为准，不再做名称猜测
            let source_node = if source.has_native_mapping() {
                source.native_joint(scene, joint)
            } else {
                self.heuristic(&source_cache, joint, None, &claimed_sources).map(|(n, _)| n)
            };
            let Some(source_node) = source_node else {
                continue;
            };
            claimed_sources.insert(source_node);

            let source_name = scene.name(source_node).unwrap_or_default();
            let resolved = self.resolve_target(scene, target, &target_cache, joint, source_name, &claimed_targets);

            let mapping = match resolved {
                Some((target_node, method)) => {
                    claimed_targets.insert(target_node);
                    log::debug!(
                        "{joint}: {} -> {} ({method:?})",
                        source_name,
                        scene.name(target_node).unwrap_or_default()
                    );
                    JointMapping::new(joint, Some(source_node), Some(target_node), method)
                }
                None => {
                    log::debug!("{joint}: {source_name} 在目标骨骼中没有匹配");
                    JointMapping::new(joint, Some(source_node), None, MappingMethod::None)
                }
            };
            mappings.push(mapping);
        }

        let summary = MappingSummary::of(&mappings);
        log::info!(
            "骨骼映射完成: {}/{} 有效 (原生 {}, 精确 {}, 启发式 {})",
            summary.valid,
            summary.total,
            summary.native,
            summary.exact,
            summary.heuristic
        );
        mappings
    }

    fn resolve_target(
        &self,
        scene: &Scene,
        target: &RigReference,
        cache: &NameCache,
        joint: CanonicalJoint,
        source_name: &str,
        claimed: &HashSet<NodeId>,
    ) -> Option<(NodeId, MappingMethod)> {
        if let Some(node) = target.native_joint(scene, joint).filter(|n| !claimed.contains(n)) {
            return Some((node, MappingMethod::NativeMapping));
        }

        if let Some(node) = cache.lookup_exact(source_name).filter(|n| !claimed.contains(n)) {
            return Some((node, MappingMethod::ExactName));
        }

        self.heuristic(cache, joint, Some(&normalize(source_name)), claimed)
            .map(|(node, _)| (node, MappingMethod::HeuristicName))
    }

    /// 启发式查找：先按命名变体精确查，再取相似度最高且过阈值的节点
    ///
    /// 相似度同分时保留缓存登记顺序中靠前的节点（子树前序遍历顺序）。
    fn heuristic(
        &self,
        cache: &NameCache,
        joint: CanonicalJoint,
        extra_name: Option<&str>,
        claimed: &HashSet<NodeId>,
    ) -> Option<(NodeId, f32)> {
        let variants = normalized_variants(joint);
        if let Some(node) = variants
            .iter()
            .filter_map(|v| cache.lookup_normalized(v))
            .find(|n| !claimed.contains(n))
        {
            return Some((node, 1.0));
        }

        let mut best: Option<(NodeId, f32)> = None;
        for entry in cache.entries() {
            // 左右侧不一致的节点不参与
            if entry.side != joint.side() || claimed.contains(&entry.node) {
                continue;
            }
            let mut score = variants
                .iter()
                .map(|v| similarity_normalized(&entry.normalized, v))
                .fold(0.0_f32, f32::max);
            if let Some(name) = extra_name {
                score = score.max(similarity_normalized(&entry.normalized, name));
            }
            if score >= self.threshold && best.map_or(true, |(_, s)| score > s) {
                best = Some((entry.node, score));
            }
        }
        best
    }

    /// 手动指定映射：已有该关节的行则覆盖，否则追加
    pub fn apply_manual(mappings: &mut Vec<JointMapping>, joint: CanonicalJoint, source: Option<NodeId>, target: NodeId) {
        match mappings.iter_mut().find(|m| m.joint == joint) {
            Some(existing) => {
                if source.is_some() {
                    existing.source = source;
                }
                existing.target = Some(target);
                existing.method = MappingMethod::Manual;
            }
            None => mappings.push(JointMapping::new(joint, source, Some(target), MappingMethod::Manual)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::HumanoidMap;
    use CanonicalJoint::*;

    /// 基础角色：原生映射 Hips/Spine/Chest + 左手
    struct Base {
        root: NodeId,
        hips: NodeId,
        spine: NodeId,
        chest: NodeId,
        left_hand: NodeId,
    }

    fn base(scene: &mut Scene) -> Base {
        let root = scene.add_root("Avatar");
        let armature = scene.add_child(root, "Armature").unwrap();
        let hips = scene.add_child(armature, "Hips").unwrap();
        let spine = scene.add_child(hips, "Spine").unwrap();
        let chest = scene.add_child(spine, "Chest").unwrap();
        let left_hand = scene.add_child(chest, "Hand_L").unwrap();
        let eye = scene.add_child(chest, "LeftEye").unwrap();
        scene.node_mut(root).unwrap().humanoid = Some(
            HumanoidMap::new()
                .with(Hips, hips)
                .with(Spine, spine)
                .with(Chest, chest)
                .with(LeftHand, left_hand)
                .with(LeftEye, eye),
        );
        Base {
            root,
            hips,
            spine,
            chest,
            left_hand,
        }
    }

    fn outfit(scene: &mut Scene, names: &[&str]) -> (NodeId, Vec<NodeId>) {
        let root = scene.add_root("Outfit");
        let mut parent = scene.add_child(root, "Armature").unwrap();
        let mut nodes = Vec::new();
        for name in names {
            parent = scene.add_child(parent, *name).unwrap();
            nodes.push(parent);
        }
        (root, nodes)
    }

    fn find(mappings: &[JointMapping], joint: CanonicalJoint) -> &JointMapping {
        mappings.iter().find(|m| m.joint == joint).unwrap()
    }

    #[test]
    fn test_exact_name_beats_heuristic() {
        let mut scene = Scene::new();
        let b = base(&mut scene);
        let (outfit_root, nodes) = outfit(&mut scene, &["Hips", "Spine", "Chest", "Hand_L"]);
        let config = StitchConfig::default();
        let source = RigReference::new(&scene, b.root, &config);
        let target = RigReference::new(&scene, outfit_root, &config);

        let mappings = BoneMapper::new(&config).detect_mapping(&scene, &source, &target, None, None);
        for (joint, node) in [(Hips, nodes[0]), (Spine, nodes[1]), (Chest, nodes[2]), (LeftHand, nodes[3])] {
            let m = find(&mappings, joint);
            assert_eq!(m.target, Some(node));
            assert_eq!(m.method, MappingMethod::ExactName, "{joint}");
        }
        assert_eq!(find(&mappings, Hips).source, Some(b.hips));
        assert_eq!(find(&mappings, LeftHand).source, Some(b.left_hand));
    }

    #[test]
    fn test_denied_and_unresolved_joints_are_skipped() {
        let mut scene = Scene::new();
        let b = base(&mut scene);
        let (outfit_root, _) = outfit(&mut scene, &["Hips", "LeftEye"]);
        let config = StitchConfig::default();
        let source = RigReference::new(&scene, b.root, &config);
        let target = RigReference::new(&scene, outfit_root, &config);

        let mappings = BoneMapper::new(&config).detect_mapping(&scene, &source, &target, None, None);
        assert!(mappings.iter().all(|m| m.joint != LeftEye));
        // 源骨骼中不存在的关节不产生行
        assert!(mappings.iter().all(|m| m.joint != Neck));
        assert!(mappings.iter().all(|m| m.source.is_some()));
    }

    #[test]
    fn test_missing_target_produces_null_row() {
        let mut scene = Scene::new();
        let b = base(&mut scene);
        let (outfit_root, _) = outfit(&mut scene, &["Hips"]);
        let config = StitchConfig::default();
        let source = RigReference::new(&scene, b.root, &config);
        let target = RigReference::new(&scene, outfit_root, &config);

        let mappings = BoneMapper::new(&config).detect_mapping(&scene, &source, &target, None, None);
        let chest = find(&mappings, Chest);
        assert_eq!(chest.source, Some(b.chest));
        assert_eq!(chest.target, None);
        assert_eq!(chest.method, MappingMethod::None);
        assert!(!chest.is_valid());
        assert_eq!(MappingSummary::of(&mappings).unmatched, vec![Spine, Chest, LeftHand]);
    }

    #[test]
    fn test_heuristic_variants_and_similarity() {
        let mut scene = Scene::new();
        let b = base(&mut scene);
        let (outfit_root, nodes) = outfit(&mut scene, &["J_Bip_C_Hips", "J_Bip_C_Spine", "Chestt", "J_Bip_L_Hand"]);
        let config = StitchConfig::default();
        let source = RigReference::new(&scene, b.root, &config);
        let target = RigReference::new(&scene, outfit_root, &config);

        let mappings = BoneMapper::new(&config).detect_mapping(&scene, &source, &target, None, None);
        assert_eq!(find(&mappings, Hips).target, Some(nodes[0]));
        assert_eq!(find(&mappings, Spine).target, Some(nodes[1]));
        assert_eq!(find(&mappings, Chest).target, Some(nodes[2]));
        assert_eq!(find(&mappings, LeftHand).target, Some(nodes[3]));
        assert!(mappings.iter().all(|m| m.method == MappingMethod::HeuristicName));
    }

    #[test]
    fn test_similarity_never_crosses_sides() {
        let mut scene = Scene::new();
        let b = base(&mut scene);
        let (outfit_root, _) = outfit(&mut scene, &["Hips", "Hand_R"]);
        let config = StitchConfig::default();
        let source = RigReference::new(&scene, b.root, &config);
        let target = RigReference::new(&scene, outfit_root, &config);

        let mappings = BoneMapper::new(&config).detect_mapping(&scene, &source, &target, None, None);
        assert_eq!(find(&mappings, LeftHand).target, None);
    }

    #[test]
    fn test_prefix_stripping() {
        let mut scene = Scene::new();
        let b = base(&mut scene);
        let (outfit_root, nodes) = outfit(&mut scene, &["Jacket_Hips", "Jacket_Spine", "Jacket_Chest"]);
        let config = StitchConfig::default();
        let source = RigReference::new(&scene, b.root, &config);
        let target = RigReference::new(&scene, outfit_root, &config);

        let mappings = BoneMapper::new(&config).detect_mapping(&scene, &source, &target, Some("Jacket_"), None);
        assert_eq!(find(&mappings, Hips).target, Some(nodes[0]));
        assert_eq!(find(&mappings, Hips).method, MappingMethod::ExactName);
        assert_eq!(find(&mappings, Chest).target, Some(nodes[2]));
    }

    #[test]
    fn test_native_target_mapping_preferred() {
        let mut scene = Scene::new();
        let b = base(&mut scene);
        let (outfit_root, nodes) = outfit(&mut scene, &["Pelvis", "Hips"]);
        scene.node_mut(outfit_root).unwrap().humanoid = Some(HumanoidMap::new().with(Hips, nodes[0]));
        let config = StitchConfig::default();
        let source = RigReference::new(&scene, b.root, &config);
        let target = RigReference::new(&scene, outfit_root, &config);

        let mappings = BoneMapper::new(&config).detect_mapping(&scene, &source, &target, None, None);
        let hips = find(&mappings, Hips);
        assert_eq!(hips.target, Some(nodes[0]));
        assert_eq!(hips.method, MappingMethod::NativeMapping);
    }

    #[test]
    fn test_tie_break_is_repeatable() {
        let mut scene = Scene::new();
        let b = base(&mut scene);
        // Chest1 与 Chest2 与 "Chest" 的相似度相同
        let (outfit_root, _) = outfit(&mut scene, &["Hips", "Chest1", "Chest2"]);
        let config = StitchConfig::default();
        let source = RigReference::new(&scene, b.root, &config);
        let target = RigReference::new(&scene, outfit_root, &config);
        let mapper = BoneMapper::new(&config);

        let first = mapper.detect_mapping(&scene, &source, &target, None, None);
        for _ in 0..5 {
            assert_eq!(mapper.detect_mapping(&scene, &source, &target, None, None), first);
        }
    }

    #[test]
    fn test_apply_manual() {
        let mut scene = Scene::new();
        let b = base(&mut scene);
        let (_, nodes) = outfit(&mut scene, &["Whatever"]);
        let mut mappings = vec![JointMapping::new(Chest, Some(b.chest), None, MappingMethod::None)];
        BoneMapper::apply_manual(&mut mappings, Chest, None, nodes[0]);
        BoneMapper::apply_manual(&mut mappings, Spine, Some(b.spine), nodes[0]);
        assert_eq!(mappings[0].target, Some(nodes[0]));
        assert_eq!(mappings[0].source, Some(b.chest));
        assert_eq!(mappings[0].method, MappingMethod::Manual);
        assert_eq!(mappings.len(), 2);
        assert!(mappings[1].is_valid());
    }
}
