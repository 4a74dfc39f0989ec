//! 蒙皮网格重定向
//!
//! 把网格的关节引用从附加骨骼换到基础骨骼，并重算绑定姿势与包围盒，
//! 使合并瞬间的蒙皮结果保持不变。

mod retargeter;

pub use retargeter::{rebind_pose, skinned_mesh_nodes, MeshRetargeter};

/// 重定向结果
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RetargetReport {
    /// 至少替换了一个关节引用的网格数
    pub meshes_retargeted: usize,
    /// 替换的关节槽位总数
    pub slots_remapped: usize,
    /// 因共享而复制的网格资源数
    pub meshes_cloned: usize,
    pub warnings: Vec<String>,
}

/// 单个网格的重定向结果
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshRetarget {
    /// 替换的关节槽位数（只换了根关节时为 1）
    pub slots: usize,
    /// 是否因共享而复制了网格资源
    pub cloned: bool,
    /// 绑定姿势是否按当前姿势重建
    pub reconstructed_bind_poses: bool,
}
