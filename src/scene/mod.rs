//! 场景图
//!
//! 骨骼合并所依赖的场景能力：
//! - Node: 场景节点（名称、父子关系、局部变换、组件）
//! - Scene: 节点竞技场，负责层级操作与世界变换
//! - SkinnedMesh / Mesh: 蒙皮网格组件与可共享的网格资源

mod graph;
mod mesh;
mod node;

pub use graph::Scene;
pub use mesh::{Aabb, Mesh, SkinnedMesh};
pub use node::{Node, PhysBone};

use glam::{Mat4, Quat, Vec3};
use slotmap::new_key_type;

new_key_type! {
    /// 节点句柄（带代际检查，已删除节点的句柄不会指向新节点）
    pub struct NodeId;
}

/// 局部变换数据
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// 从矩阵分解（含切变的矩阵会丢失切变分量）
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }
}

/// 矩阵的统一缩放因子（三个轴缩放绝对值的平均）
pub fn uniform_scale(matrix: &Mat4) -> f32 {
    let (scale, _, _) = matrix.to_scale_rotation_translation();
    let s = scale.abs();
    (s.x + s.y + s.z) / 3.0
}
