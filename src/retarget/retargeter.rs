//! 网格重定向器

use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;

use super::{MeshRetarget, RetargetReport};
use crate::config::{BindPoseFallback, BoundsStrategy, StitchConfig};
use crate::scene::{uniform_scale, Aabb, NodeId, Scene};
use crate::{Result, RigError};

/// 把绑定姿势改为相对新关节表达
///
/// newBind = inverse(newJointWorld) * oldJointWorld * oldBind，
/// 于是 newJointWorld * newBind == oldJointWorld * oldBind，蒙皮矩阵不变。
pub fn rebind_pose(old_joint_world: Mat4, new_joint_world: Mat4, old_bind: Mat4) -> Mat4 {
    new_joint_world.inverse() * old_joint_world * old_bind
}

/// 单个网格的计算结果，写回前先全部算好
struct RetargetPlan {
    joints: Vec<Option<NodeId>>,
    bind_poses: Vec<Mat4>,
    root_joint: Option<NodeId>,
    bounds: Aabb,
    slots: usize,
    reconstructed: bool,
}

/// root 子树下所有带蒙皮网格的节点（先序）
pub fn skinned_mesh_nodes(scene: &Scene, root: NodeId) -> Vec<NodeId> {
    scene
        .descendants(root)
        .into_iter()
        .filter(|&id| scene.node(id).is_some_and(|n| n.skinned_mesh.is_some()))
        .collect()
}

/// 网格重定向器
#[derive(Clone, Debug)]
pub struct MeshRetargeter {
    bind_pose_fallback: BindPoseFallback,
    bounds_strategy: BoundsStrategy,
}

impl MeshRetargeter {
    pub fn new(config: &StitchConfig) -> Self {
        Self {
            bind_pose_fallback: config.bind_pose_fallback,
            bounds_strategy: config.bounds_strategy,
        }
    }

    /// 重定向 root 子树下所有引用了 joint_map 键的蒙皮网格
    ///
    /// 单个网格失败只记为警告，不影响其他网格。
    pub fn retarget_meshes(
        &self,
        scene: &mut Scene,
        attachment_root: NodeId,
        joint_map: &HashMap<NodeId, NodeId>,
    ) -> RetargetReport {
        let mesh_nodes = skinned_mesh_nodes(scene, attachment_root);
        self.retarget_nodes(scene, &mesh_nodes, joint_map)
    }

    /// 重定向给定的网格节点（调用方已提前收集，节点可能已被移出附加物子树）
    pub fn retarget_nodes(
        &self,
        scene: &mut Scene,
        mesh_nodes: &[NodeId],
        joint_map: &HashMap<NodeId, NodeId>,
    ) -> RetargetReport {
        let mut report = RetargetReport::default();
        for &mesh_node in mesh_nodes {
            match self.retarget_mesh(scene, mesh_node, joint_map) {
                Ok(outcome) => {
                    if outcome.reconstructed_bind_poses {
                        let name = scene.name(mesh_node).unwrap_or_default();
                        report
                            .warnings
                            .push(format!("mesh '{name}': bind poses reconstructed from current pose"));
                    }
                    if outcome.slots > 0 {
                        report.meshes_retargeted += 1;
                        report.slots_remapped += outcome.slots;
                    }
                    if outcome.cloned {
                        report.meshes_cloned += 1;
                    }
                }
                Err(e) => {
                    let name = scene.name(mesh_node).unwrap_or_default();
                    log::warn!("网格 '{name}' 重定向失败: {e}");
                    report.warnings.push(format!("failed to retarget mesh '{name}': {e}"));
                }
            }
        }

        log::info!(
            "网格重定向完成: {} 个网格, {} 个关节槽位",
            report.meshes_retargeted,
            report.slots_remapped
        );
        report
    }

    /// 重定向单个网格
    pub fn retarget_mesh(
        &self,
        scene: &mut Scene,
        mesh_node: NodeId,
        joint_map: &HashMap<NodeId, NodeId>,
    ) -> Result<MeshRetarget> {
        let Some(plan) = self.plan(scene, mesh_node, joint_map)? else {
            return Ok(MeshRetarget::default());
        };

        let node = scene.node_mut(mesh_node).ok_or(RigError::NodeNotFound(mesh_node))?;
        let skinned = node
            .skinned_mesh
            .as_mut()
            .ok_or(RigError::NodeNotFound(mesh_node))?;

        // 共享资源先复制再修改
        let cloned = skinned.is_shared();
        let mesh = Arc::make_mut(&mut skinned.mesh);
        if cloned {
            mesh.name = format!("{} (retargeted)", mesh.name);
            log::debug!("网格资源 '{}' 被共享，已复制", mesh.name);
        }
        mesh.bind_poses = plan.bind_poses;
        skinned.joints = plan.joints;
        skinned.root_joint = plan.root_joint;
        skinned.local_bounds = plan.bounds;

        Ok(MeshRetarget {
            slots: plan.slots,
            cloned,
            reconstructed_bind_poses: plan.reconstructed,
        })
    }

    fn plan(
        &self,
        scene: &Scene,
        mesh_node: NodeId,
        joint_map: &HashMap<NodeId, NodeId>,
    ) -> Result<Option<RetargetPlan>> {
        let node = scene.node(mesh_node).ok_or(RigError::NodeNotFound(mesh_node))?;
        let Some(skinned) = node.skinned_mesh.as_ref() else {
            return Ok(None);
        };
        let touches_map = skinned
            .referenced_joints()
            .iter()
            .any(|j| joint_map.contains_key(j));
        if !touches_map {
            return Ok(None);
        }

        let reconstructed = !skinned.bind_poses_valid();
        let old_binds = if !reconstructed {
            skinned.mesh.bind_poses.clone()
        } else {
            self.fallback_bind_poses(scene, mesh_node, &node.name, &skinned.joints, skinned.mesh.bind_poses.len())?
        };

        let mut joints = skinned.joints.clone();
        let mut bind_poses = old_binds;
        let mut slots = 0;
        let mut scale_sum = 0.0_f32;
        for (slot, joint) in joints.iter_mut().enumerate() {
            let Some(old) = *joint else { continue };
            let Some(&new) = joint_map.get(&old) else { continue };
            let old_world = scene.world_matrix(old);
            let new_world = scene.world_matrix(new);
            bind_poses[slot] = rebind_pose(old_world, new_world, bind_poses[slot]);
            *joint = Some(new);
            slots += 1;

            let old_scale = uniform_scale(&old_world);
            scale_sum += if old_scale > f32::EPSILON {
                uniform_scale(&new_world) / old_scale
            } else {
                1.0
            };
        }

        let root_joint = skinned
            .root_joint
            .map(|r| joint_map.get(&r).copied().unwrap_or(r));

        let scale_ratio = if slots > 0 { scale_sum / slots as f32 } else { 1.0 };
        let bounds = match self.bounds_strategy {
            BoundsStrategy::FromVertices => {
                Aabb::from_points(&skinned.mesh.vertices).unwrap_or_else(|| skinned.local_bounds.scaled(scale_ratio))
            }
            BoundsStrategy::UniformScale => skinned.local_bounds.scaled(scale_ratio),
        };

        Ok(Some(RetargetPlan {
            joints,
            bind_poses,
            root_joint,
            bounds,
            // 只换了根关节时也算作重定向
            slots: slots.max(usize::from(root_joint != skinned.root_joint)),
            reconstructed,
        }))
    }

    /// 绑定姿势缺失或数量不符时的处理
    ///
    /// Reconstruct 假设当前姿势就是绑定姿势：bind = inverse(jointWorld) * meshWorld。
    fn fallback_bind_poses(
        &self,
        scene: &Scene,
        mesh_node: NodeId,
        mesh_name: &str,
        joints: &[Option<NodeId>],
        actual: usize,
    ) -> Result<Vec<Mat4>> {
        match self.bind_pose_fallback {
            BindPoseFallback::Fail => Err(RigError::MissingBindPoses {
                mesh: mesh_name.to_string(),
                expected: joints.len(),
                actual,
            }),
            BindPoseFallback::Reconstruct => {
                log::warn!(
                    "网格 '{mesh_name}' 绑定姿势数量 {actual} 与关节数 {} 不符，按当前姿势重建",
                    joints.len()
                );
                let mesh_world = scene.world_matrix(mesh_node);
                Ok(joints
                    .iter()
                    .map(|j| match j {
                        Some(id) => scene.world_matrix(*id).inverse() * mesh_world,
                        None => Mat4::IDENTITY,
                    })
                    .collect())
            }
        }
    }
}
