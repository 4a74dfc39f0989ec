//! Rig Stitch - 附加网格骨骼合并引擎
//!
//! 把服装等附加资源的骨骼合并到基础人形角色的骨骼上：
//! - 人形关节分类与命名变体数据库
//! - 骨骼映射（原生映射 / 精确名称 / 启发式名称）
//! - 物理链检测（头发、裙摆等不可合并的骨骼）
//! - Stitch / Merge 两种融合模式（带撤销日志）
//! - 蒙皮网格重定向（绑定姿势与包围盒重算）

pub mod config;
pub mod dynamics;
pub mod humanoid;
pub mod mapping;
pub mod retarget;
pub mod rig;
pub mod scene;
pub mod stitch;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{BindPoseFallback, BoundsStrategy, StitchConfig};
pub use dynamics::{DynamicChainDetector, DynamicChainSet, PhysicsChain, PhysicsChainProvider};
pub use humanoid::CanonicalJoint;
pub use mapping::{BoneMapper, JointMapping, MappingMethod, MappingSummary};
pub use retarget::{MeshRetarget, MeshRetargeter, RetargetReport};
pub use rig::{ContextDetector, HumanoidMap, NativeRigMap, RigContext, RigReference};
pub use scene::{Aabb, Mesh, NodeId, PhysBone, Scene, SkinnedMesh, Transform};
pub use stitch::{MergeMode, MergeResult, StitchRequest, StitchState, StitchingController};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RigError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("cannot parent {node:?} under its own descendant {parent:?}")]
    CyclicParent { node: NodeId, parent: NodeId },

    #[error("parent of {0:?} has a degenerate world transform")]
    DegenerateTransform(NodeId),

    #[error("node {0:?} still has children")]
    NodeHasChildren(NodeId),

    #[error("mapping list is empty")]
    EmptyMapping,

    #[error("no valid mapping among {0} entries")]
    NoValidMapping(usize),

    #[error("merge mode requires an attachment root")]
    MissingAttachmentRoot,

    #[error("mesh '{mesh}' has {actual} bind poses for {expected} joints")]
    MissingBindPoses { mesh: String, expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, RigError>;
