//! 测试用场景：带原生映射的基础角色 + 穿在身上的外套

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::config::StitchConfig;
use crate::humanoid::CanonicalJoint;
use crate::mapping::{BoneMapper, JointMapping};
use crate::rig::{HumanoidMap, RigReference};
use crate::scene::{Mesh, NodeId, Scene, SkinnedMesh, Transform};

pub(crate) struct AvatarScene {
    pub scene: Scene,
    pub avatar: NodeId,
    pub base_hips: NodeId,
    pub base_spine: NodeId,
    pub base_chest: NodeId,
    pub outfit: NodeId,
    pub outfit_armature: NodeId,
    pub hips: NodeId,
    pub spine: NodeId,
    pub chest: NodeId,
    /// 外套自带的非人形骨骼
    pub tail: NodeId,
    /// 引用 hips/spine/chest/tail 的蒙皮网格
    pub jacket: NodeId,
}

fn transform(t: [f32; 3], angle: f32) -> Transform {
    Transform {
        translation: Vec3::from(t),
        rotation: Quat::from_rotation_y(angle),
        scale: Vec3::ONE,
    }
}

/// Avatar(Armature/Hips/Spine/Chest) 下挂 Outfit(Armature/Hips/Spine/Chest/Tail + Jacket)
pub(crate) fn avatar_with_outfit() -> AvatarScene {
    let mut scene = Scene::new();
    let avatar = scene.add_root("Avatar");
    let armature = scene.add_child(avatar, "Armature").unwrap();
    let base_hips = scene.add_child_with(armature, "Hips", transform([0.0, 1.0, 0.0], 0.1)).unwrap();
    let base_spine = scene.add_child_with(base_hips, "Spine", transform([0.0, 0.15, 0.0], -0.1)).unwrap();
    let base_chest = scene.add_child_with(base_spine, "Chest", transform([0.0, 0.2, 0.02], 0.05)).unwrap();
    {
        let node = scene.node_mut(avatar).unwrap();
        node.avatar_descriptor = true;
        node.humanoid = Some(
            HumanoidMap::new()
                .with(CanonicalJoint::Hips, base_hips)
                .with(CanonicalJoint::Spine, base_spine)
                .with(CanonicalJoint::Chest, base_chest),
        );
    }

    let outfit = scene.add_child(avatar, "Outfit").unwrap();
    let outfit_armature = scene.add_child(outfit, "Armature").unwrap();
    let hips = scene.add_child_with(outfit_armature, "Hips", transform([0.0, 0.98, 0.01], 0.0)).unwrap();
    let spine = scene.add_child_with(hips, "Spine", transform([0.0, 0.16, 0.0], 0.2)).unwrap();
    let chest = scene.add_child_with(spine, "Chest", transform([0.0, 0.21, 0.0], -0.15)).unwrap();
    let tail = scene.add_child_with(chest, "Tail", transform([0.0, -0.3, -0.1], 0.0)).unwrap();
    let jacket = scene.add_child(outfit, "Jacket").unwrap();

    let joints = [hips, spine, chest, tail];
    let mesh = Arc::new(Mesh {
        name: "Jacket".to_string(),
        vertices: vec![Vec3::new(-0.3, 0.8, -0.2), Vec3::new(0.3, 1.5, 0.2)],
        bind_poses: joints.iter().map(|&j| scene.world_matrix(j).inverse()).collect(),
    });
    scene.node_mut(jacket).unwrap().skinned_mesh =
        Some(SkinnedMesh::new(mesh, joints.iter().map(|&j| Some(j)).collect()));

    AvatarScene {
        scene,
        avatar,
        base_hips,
        base_spine,
        base_chest,
        outfit,
        outfit_armature,
        hips,
        spine,
        chest,
        tail,
        jacket,
    }
}

/// 用默认配置检测 Avatar -> Outfit 的映射
pub(crate) fn detect_mappings(f: &AvatarScene) -> Vec<JointMapping> {
    let config = StitchConfig::default();
    let source = RigReference::new(&f.scene, f.avatar, &config);
    let target = RigReference::new(&f.scene, f.outfit, &config);
    BoneMapper::new(&config).detect_mapping(&f.scene, &source, &target, None, None)
}

/// 每个关节槽位的 world * bind
pub(crate) fn skinning_matrices(scene: &Scene, mesh_node: NodeId) -> Vec<Mat4> {
    let skinned = scene.node(mesh_node).unwrap().skinned_mesh.as_ref().unwrap();
    skinned
        .joints
        .iter()
        .zip(&skinned.mesh.bind_poses)
        .map(|(j, bind)| scene.world_matrix(j.unwrap()) * *bind)
        .collect()
}
