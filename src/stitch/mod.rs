//! 骨骼融合控制器
//!
//! 状态机：Idle -> Validating -> {Stitching | Merging} -> Completed | Failed
//!
//! ## 两种融合模式
//! | 模式   | 做法                                   | 可撤销 |
//! |--------|----------------------------------------|--------|
//! | Stitch | 附加骨骼重挂到基础骨骼下，两套骨骼共存 | 是     |
//! | Merge  | 网格直接改绑基础骨骼，删除无用附加骨骼 | 否     |
//!
//! Merge 是破坏性的，只能在可丢弃的工作副本上执行。

mod controller;
mod result;
mod undo;

pub use controller::{build_merge_map, StitchingController};
pub use result::MergeResult;
pub use undo::{UndoLog, UndoRecord};

use crate::scene::NodeId;

/// 融合模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MergeMode {
    #[default]
    Stitch,
    Merge,
}

/// 控制器状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StitchState {
    #[default]
    Idle,
    Validating,
    Stitching,
    Merging,
    Completed,
    Failed,
}

/// 一次融合调用的参数
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StitchRequest {
    pub mode: MergeMode,
    /// 附加物根节点（Merge 模式必须提供）
    pub attachment_root: Option<NodeId>,
    /// 基础角色根节点，提供时用于归属校验
    pub base_root: Option<NodeId>,
}

impl StitchRequest {
    pub fn stitch() -> Self {
        Self::default()
    }

    pub fn merge(attachment_root: NodeId) -> Self {
        Self {
            mode: MergeMode::Merge,
            attachment_root: Some(attachment_root),
            base_root: None,
        }
    }

    pub fn with_base_root(mut self, base_root: NodeId) -> Self {
        self.base_root = Some(base_root);
        self
    }
}
