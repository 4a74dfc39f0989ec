//! 融合控制器

use std::collections::{HashMap, HashSet};

use super::undo::{UndoLog, UndoRecord};
use super::{MergeMode, MergeResult, StitchRequest, StitchState};
use crate::config::StitchConfig;
use crate::dynamics::{DynamicChainDetector, DynamicChainSet};
use crate::mapping::JointMapping;
use crate::retarget::{skinned_mesh_nodes, MeshRetargeter};
use crate::rig::{ContextDetector, RigReference};
use crate::scene::{NodeId, Scene};
use crate::{Result, RigError};

/// 构建 Merge 映射表：附加骨骼 -> 基础骨骼
///
/// 属于物理链的附加骨骼永远不会成为键。同一附加骨骼出现多次时保留第一次。
pub fn build_merge_map(
    scene: &Scene,
    pairs: impl IntoIterator<Item = (NodeId, NodeId)>,
    chains: &DynamicChainSet,
) -> HashMap<NodeId, NodeId> {
    let mut map = HashMap::new();
    for (source, target) in pairs {
        if !scene.contains(source) || !scene.contains(target) {
            continue;
        }
        if chains.is_chain_member(scene, target) {
            log::debug!("'{}' 属于物理链，不参与合并", scene.name(target).unwrap_or_default());
            continue;
        }
        map.entry(target).or_insert(source);
    }
    map
}

/// 保留节点的去向
enum Placement {
    /// 重挂到基础骨骼下
    Reparent(NodeId),
    /// 祖先也被保留，随祖先一起移动
    FollowAncestor,
    /// 没有可用的合并祖先
    Orphan,
}

/// 骨骼融合控制器
///
/// 每次调用只处理一个附加物；撤销日志不可跨线程共享。
pub struct StitchingController {
    config: StitchConfig,
    state: StitchState,
    undo_log: UndoLog,
    chains: DynamicChainDetector,
    retargeter: MeshRetargeter,
    context: ContextDetector,
}

impl StitchingController {
    /// 使用 PhysBone 组件检测物理链
    pub fn new(config: StitchConfig) -> Self {
        let chains = DynamicChainDetector::with_components(&config);
        Self::with_chain_detector(config, chains)
    }

    pub fn with_chain_detector(config: StitchConfig, chains: DynamicChainDetector) -> Self {
        Self {
            retargeter: MeshRetargeter::new(&config),
            context: ContextDetector::new(&config),
            config,
            state: StitchState::Idle,
            undo_log: UndoLog::default(),
            chains,
        }
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    pub fn state(&self) -> StitchState {
        self.state
    }

    pub fn undo_log(&self) -> &UndoLog {
        &self.undo_log
    }

    /// 执行一次融合
    ///
    /// 输入错误时返回失败结果且不修改场景；单根骨骼的失败只记为警告。
    pub fn execute(&mut self, scene: &mut Scene, mappings: &mut [JointMapping], request: &StitchRequest) -> MergeResult {
        self.undo_log.clear();
        self.state = StitchState::Validating;

        let mut result = MergeResult::new(request.mode);
        let valid = match self.validate(scene, mappings, request, &mut result) {
            Ok(valid) => valid,
            Err(e) => {
                self.state = StitchState::Failed;
                return MergeResult::failed(request.mode, e);
            }
        };

        match (request.mode, request.attachment_root) {
            (MergeMode::Stitch, _) => {
                self.state = StitchState::Stitching;
                self.stitch(scene, mappings, &valid, &mut result);
            }
            (MergeMode::Merge, Some(attachment_root)) => {
                self.state = StitchState::Merging;
                self.merge(scene, mappings, &valid, attachment_root, request.base_root, &mut result);
            }
            (MergeMode::Merge, None) => {
                self.state = StitchState::Failed;
                return MergeResult::failed(request.mode, RigError::MissingAttachmentRoot);
            }
        }

        self.state = StitchState::Completed;
        result.success = true;
        log::info!(
            "骨骼融合完成 ({:?}): 合并 {}, 重挂 {}, 跳过 {}, 保留 {}+{}, 删除 {}, 警告 {}",
            request.mode,
            result.bones_merged,
            result.bones_stitched,
            result.bones_skipped,
            result.non_humanoid_bones_preserved,
            result.dynamic_bones_preserved,
            result.bones_deleted,
            result.warnings.len()
        );
        result
    }

    /// 撤销最近一次 Stitch，返回恢复的节点数
    pub fn undo(&mut self, scene: &mut Scene) -> usize {
        let restored = self.undo_log.rollback(scene);
        if restored > 0 {
            log::info!("已撤销 {restored} 个骨骼的重挂");
        }
        self.state = StitchState::Idle;
        restored
    }

    /// 返回有效映射的下标
    fn validate(
        &self,
        scene: &Scene,
        mappings: &[JointMapping],
        request: &StitchRequest,
        result: &mut MergeResult,
    ) -> Result<Vec<usize>> {
        if mappings.is_empty() {
            return Err(RigError::EmptyMapping);
        }
        if request.mode == MergeMode::Merge {
            match request.attachment_root {
                Some(root) if scene.contains(root) => {}
                Some(root) => return Err(RigError::NodeNotFound(root)),
                None => return Err(RigError::MissingAttachmentRoot),
            }
        }

        let mut valid = Vec::new();
        for (index, mapping) in mappings.iter().enumerate() {
            let Some((source, target)) = mapping.pair() else {
                continue;
            };
            if !scene.contains(source) || !scene.contains(target) {
                result.warn(format!("{}: mapped node no longer exists", mapping.joint));
                continue;
            }
            if source == target {
                result.warn(format!("{}: source and target are the same node", mapping.joint));
                continue;
            }
            if let Some(base_root) = request.base_root {
                let context = self.context.detect_context(scene, target, base_root);
                if context.is_base {
                    result.warn(format!(
                        "{}: target '{}' belongs to the base rig",
                        mapping.joint,
                        scene.name(target).unwrap_or_default()
                    ));
                    continue;
                }
            }
            valid.push(index);
        }

        if valid.is_empty() {
            return Err(RigError::NoValidMapping(mappings.len()));
        }
        if valid.len() < self.config.min_expected_mappings {
            result.warn(format!(
                "only {} valid mappings, expected at least {}",
                valid.len(),
                self.config.min_expected_mappings
            ));
        }
        Ok(valid)
    }

    fn stitch(&mut self, scene: &mut Scene, mappings: &mut [JointMapping], valid: &[usize], result: &mut MergeResult) {
        // 父骨骼先于子骨骼处理（稳定排序）
        let mut order = valid.to_vec();
        order.sort_by_key(|&i| mappings[i].target.map_or(0, |t| scene.depth(t)));

        for index in order {
            let Some((source, target)) = mappings[index].pair() else {
                continue;
            };
            if scene.parent(target) == Some(source) {
                result.bones_skipped += 1;
                mappings[index].was_merged = true;
                continue;
            }
            match self.stitch_one(scene, source, target) {
                Ok(()) => {
                    result.bones_stitched += 1;
                    mappings[index].was_merged = true;
                }
                Err(e) => result.warn(format!("{}: stitch failed: {e}", mappings[index].joint)),
            }
        }
    }

    fn stitch_one(&mut self, scene: &mut Scene, source: NodeId, target: NodeId) -> Result<()> {
        let record = UndoRecord::capture(scene, target)?;
        scene.set_parent(target, Some(source), true)?;

        let marker = &self.config.stitch_marker;
        if !marker.is_empty() && !record.previous_name.ends_with(marker.as_str()) {
            scene.rename(target, format!("{}{marker}", record.previous_name))?;
        }
        self.undo_log.push(record);
        Ok(())
    }

    fn merge(
        &mut self,
        scene: &mut Scene,
        mappings: &mut [JointMapping],
        valid: &[usize],
        attachment_root: NodeId,
        base_root: Option<NodeId>,
        result: &mut MergeResult,
    ) {
        // 1. 合并映射表
        let chains = self.chains.detect_chains(scene, attachment_root);
        let pairs = valid.iter().filter_map(|&i| mappings[i].pair());
        let merge_map = build_merge_map(scene, pairs, &chains);
        for &index in valid {
            if mappings[index].target.is_some_and(|t| merge_map.contains_key(&t)) {
                mappings[index].was_merged = true;
            }
        }
        result.bones_merged = merge_map.len();
        if merge_map.is_empty() {
            result.warn("no mapped joints left to merge after excluding dynamic chains");
        }

        // 2. 需要保留的骨骼（先收集网格，保留节点移动后可能离开附加物子树）
        let mesh_nodes = skinned_mesh_nodes(scene, attachment_root);
        let preserved = self.preserved_nodes(scene, &mesh_nodes, attachment_root, &merge_map, &chains);
        let preserved_set: HashSet<NodeId> = preserved.iter().copied().collect();

        // 3. 重挂保留骨骼
        for &node in &preserved {
            if chains.is_chain_member(scene, node) {
                result.dynamic_bones_preserved += 1;
            } else {
                result.non_humanoid_bones_preserved += 1;
            }
            match placement(scene, node, attachment_root, &merge_map, &preserved_set) {
                Placement::Reparent(base) => {
                    if let Err(e) = scene.set_parent(node, Some(base), true) {
                        result.warn(format!(
                            "failed to preserve '{}': {e}",
                            scene.name(node).unwrap_or_default()
                        ));
                    }
                }
                Placement::FollowAncestor => {}
                Placement::Orphan => {
                    let context = self
                        .context
                        .detect_context(scene, node, base_root.unwrap_or(attachment_root));
                    result.warn(format!(
                        "'{}' in '{}' has no merged ancestor, left in place",
                        scene.name(node).unwrap_or_default(),
                        context.label
                    ));
                }
            }
        }

        // 4. 网格重定向
        let report = self.retargeter.retarget_nodes(scene, &mesh_nodes, &merge_map);
        result.meshes_retargeted = report.meshes_retargeted;
        for warning in report.warnings {
            result.warnings.push(warning);
        }

        // 5. 清理
        if self.config.delete_unused_bones {
            result.bones_deleted = self.delete_unused(scene, attachment_root, &merge_map, &chains);
        }
    }

    /// 被网格引用的非键骨骼，以及挂在键骨骼下的附件
    fn preserved_nodes(
        &self,
        scene: &Scene,
        mesh_nodes: &[NodeId],
        attachment_root: NodeId,
        merge_map: &HashMap<NodeId, NodeId>,
        chains: &DynamicChainSet,
    ) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut preserved = Vec::new();

        for &mesh_node in mesh_nodes {
            let Some(skinned) = scene.node(mesh_node).and_then(|n| n.skinned_mesh.as_ref()) else {
                continue;
            };
            for joint in skinned.referenced_joints() {
                if merge_map.contains_key(&joint) || !scene.is_ancestor_of(attachment_root, joint) {
                    continue;
                }
                if seen.insert(joint) {
                    preserved.push(joint);
                }
            }
        }

        for id in scene.descendants(attachment_root) {
            if !merge_map.contains_key(&id) {
                continue;
            }
            for &child in scene.children(id) {
                if merge_map.contains_key(&child) {
                    continue;
                }
                let is_accessory = chains.is_chain_member(scene, child)
                    || scene
                        .node(child)
                        .is_some_and(|n| n.skinned_mesh.is_some() || n.phys_bone.is_some());
                if is_accessory && seen.insert(child) {
                    preserved.push(child);
                }
            }
        }
        preserved
    }

    /// 删除不再被引用的附加骨骼，返回删除数量
    fn delete_unused(
        &self,
        scene: &mut Scene,
        attachment_root: NodeId,
        merge_map: &HashMap<NodeId, NodeId>,
        chains: &DynamicChainSet,
    ) -> usize {
        let referenced: HashSet<NodeId> = scene
            .iter()
            .filter_map(|(_, n)| n.skinned_mesh.as_ref())
            .flat_map(|s| s.referenced_joints())
            .collect();

        let rig_root = RigReference::new(scene, attachment_root, &self.config)
            .rig_root()
            .filter(|&r| r != attachment_root && scene.is_ancestor_of(attachment_root, r));

        // 键骨骼可能随保留骨骼一起离开骨骼根，所以两处都要收集；子节点先于父节点
        let mut candidates: Vec<NodeId> = rig_root
            .map(|root| scene.descendants(root).into_iter().skip(1).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
            .chain(merge_map.keys().flat_map(|&k| scene.descendants(k)))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        candidates.sort_by_key(|&n| std::cmp::Reverse(scene.depth(n)));

        let mut deleted = 0;
        for node in candidates {
            if !is_deletable(scene, node, &referenced, chains) {
                continue;
            }
            match scene.remove_node(node) {
                Ok(_) => deleted += 1,
                Err(e) => log::warn!("删除骨骼失败: {e}"),
            }
        }

        if let Some(root) = rig_root {
            if scene.children(root).is_empty() && !referenced.contains(&root) && scene.remove_node(root).is_ok() {
                log::debug!("已删除空的骨骼根");
            }
        }
        log::debug!("删除了 {deleted} 个未使用的附加骨骼");
        deleted
    }
}

fn is_deletable(scene: &Scene, node: NodeId, referenced: &HashSet<NodeId>, chains: &DynamicChainSet) -> bool {
    let Some(n) = scene.node(node) else {
        return false;
    };
    n.children().is_empty()
        && !referenced.contains(&node)
        && !chains.contains(node)
        && n.skinned_mesh.is_none()
        && n.phys_bone.is_none()
        && n.humanoid.is_none()
}

/// 向上查找：先遇到保留的祖先则随之移动，先遇到键则重挂到对应基础骨骼
fn placement(
    scene: &Scene,
    node: NodeId,
    attachment_root: NodeId,
    merge_map: &HashMap<NodeId, NodeId>,
    preserved: &HashSet<NodeId>,
) -> Placement {
    for ancestor in scene.ancestors(node) {
        if ancestor == attachment_root {
            break;
        }
        if preserved.contains(&ancestor) {
            return Placement::FollowAncestor;
        }
        if let Some(&base) = merge_map.get(&ancestor) {
            return Placement::Reparent(base);
        }
    }
    Placement::Orphan
}
