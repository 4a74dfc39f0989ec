//! 骨骼合并配置
//!
//! 所有参数扁平化，由调用方构造后显式传入各组件，不使用全局可变状态。

use crate::humanoid::{CanonicalJoint, MATCH_THRESHOLD};

/// Stitch 模式下给被重挂骨骼追加的名称标记
pub const DEFAULT_STITCH_MARKER: &str = " [stitched]";

/// 原始绑定姿势缺失或数量不符时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindPoseFallback {
    /// 用 inverse(关节当前世界变换) 重建（假设当前姿势即绑定姿势，近似）
    #[default]
    Reconstruct,
    /// 直接报错，跳过该网格
    Fail,
}

/// 重定向后包围盒的重算方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsStrategy {
    /// 按新旧关节平均统一缩放比缩放原包围盒（近似）
    #[default]
    UniformScale,
    /// 从网格顶点重新计算，无顶点时退回 UniformScale
    FromVertices,
}

/// 合并配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct StitchConfig {
    // ========== 名称匹配 ==========
    /// 相似度判定阈值，默认 0.7
    pub similarity_threshold: f32,
    /// 不参与映射的关节（眼睛、下巴：改动会破坏表情绑定）
    pub denied_joints: Vec<CanonicalJoint>,
    /// 有效映射少于此值时给出数据质量警告，默认 10
    pub min_expected_mappings: usize,

    // ========== 骨骼根识别 ==========
    /// 约定俗成的骨骼根容器名称，按优先级排列
    pub rig_root_names: Vec<String>,

    // ========== 物理链 ==========
    /// 物理组件不可用时，用于识别物理骨骼的名称片段
    pub physics_name_terms: Vec<String>,

    // ========== 融合 ==========
    /// Stitch 模式的名称标记后缀
    pub stitch_marker: String,
    /// Merge 模式下是否删除不再被引用的附加骨骼，默认 true
    pub delete_unused_bones: bool,

    // ========== 重定向 ==========
    pub bind_pose_fallback: BindPoseFallback,
    pub bounds_strategy: BoundsStrategy,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: MATCH_THRESHOLD,
            denied_joints: vec![
                CanonicalJoint::LeftEye,
                CanonicalJoint::RightEye,
                CanonicalJoint::Jaw,
            ],
            min_expected_mappings: 10,

            rig_root_names: ["Armature", "armature", "Skeleton", "skeleton", "Root", "root", "Rig", "rig", "metarig"]
                .iter()
                .map(|s| s.to_string())
                .collect(),

            // 头发、尾巴、裙摆、胸部等常见的物理骨骼
            physics_name_terms: [
                "hair", "tail", "skirt", "breast", "bust", "jiggle", "ribbon", "cape",
                "physbone", "dynamic", "spring", "髪", "毛", "尻尾", "スカート", "おっぱ", "乳",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),

            stitch_marker: DEFAULT_STITCH_MARKER.to_string(),
            delete_unused_bones: true,

            bind_pose_fallback: BindPoseFallback::default(),
            bounds_strategy: BoundsStrategy::default(),
        }
    }
}

impl StitchConfig {
    pub fn is_denied(&self, joint: CanonicalJoint) -> bool {
        self.denied_joints.contains(&joint)
    }

    pub fn is_rig_root_name(&self, name: &str) -> bool {
        self.rig_root_names.iter().any(|n| n == name)
    }
}
