//! 融合结果

use super::MergeMode;
use crate::RigError;

/// 一次融合调用的结果
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeResult {
    pub mode: MergeMode,
    pub success: bool,
    /// Merge 模式下被基础骨骼取代的附加骨骼数
    pub bones_merged: usize,
    /// Stitch 模式下重挂的骨骼数
    pub bones_stitched: usize,
    /// 已经处于目标状态而跳过的骨骼数
    pub bones_skipped: usize,
    /// 被保留并重挂的非人形骨骼数
    pub non_humanoid_bones_preserved: usize,
    /// 被保留的物理链骨骼数
    pub dynamic_bones_preserved: usize,
    pub bones_deleted: usize,
    pub meshes_retargeted: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl MergeResult {
    pub fn new(mode: MergeMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// 输入错误：立即失败，场景未被修改
    pub fn failed(mode: MergeMode, error: RigError) -> Self {
        log::error!("骨骼融合失败: {error}");
        Self {
            mode,
            success: false,
            errors: vec![error.to_string()],
            ..Self::default()
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.warnings.push(message);
    }
}
