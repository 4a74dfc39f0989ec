//! 蒙皮网格组件

use std::sync::Arc;

use glam::{Mat4, Vec3};

use super::NodeId;

/// 轴对齐包围盒（中心 + 半尺寸）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            extents: Vec3::ZERO,
        }
    }
}

impl Aabb {
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        })
    }

    /// 以中心为基准缩放
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            center: self.center,
            extents: self.extents * factor,
        }
    }
}

/// 网格资源（可能被多个场景实例共享）
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: String,
    /// 网格空间的顶点位置
    pub vertices: Vec<Vec3>,
    /// 与关节槽位一一对应的绑定姿势矩阵（网格空间 -> 关节空间）
    pub bind_poses: Vec<Mat4>,
}

/// 蒙皮网格组件
#[derive(Clone, Debug)]
pub struct SkinnedMesh {
    pub mesh: Arc<Mesh>,
    /// 有序关节槽位，槽位可以为空
    pub joints: Vec<Option<NodeId>>,
    pub root_joint: Option<NodeId>,
    pub local_bounds: Aabb,
}

impl SkinnedMesh {
    pub fn new(mesh: Arc<Mesh>, joints: Vec<Option<NodeId>>) -> Self {
        let root_joint = joints.first().copied().flatten();
        let local_bounds = Aabb::from_points(&mesh.vertices).unwrap_or_default();
        Self {
            mesh,
            joints,
            root_joint,
            local_bounds,
        }
    }

    /// 网格引用的所有关节（含根关节，去重保序）
    pub fn referenced_joints(&self) -> Vec<NodeId> {
        let mut result: Vec<NodeId> = Vec::with_capacity(self.joints.len() + 1);
        for id in self.joints.iter().flatten().chain(self.root_joint.iter()) {
            if !result.contains(id) {
                result.push(*id);
            }
        }
        result
    }

    /// 网格资源是否被其他实例共享
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.mesh) > 1
    }

    pub fn bind_poses_valid(&self) -> bool {
        self.mesh.bind_poses.len() == self.joints.len()
    }
}
