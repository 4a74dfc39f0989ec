//! 骨骼映射
//!
//! 对每个标准关节，在源骨骼（基础角色）和目标骨骼（附加服装）中分别找到对应节点。

mod affix;
mod mapper;
mod name_cache;

pub use affix::detect_affixes;
pub use mapper::BoneMapper;
pub(crate) use name_cache::NameCache;

use crate::humanoid::CanonicalJoint;
use crate::scene::NodeId;

/// 目标节点的匹配方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MappingMethod {
    #[default]
    None,
    NativeMapping,
    ExactName,
    HeuristicName,
    Manual,
}

/// 映射表的一行
#[derive(Clone, Debug, PartialEq)]
pub struct JointMapping {
    pub joint: CanonicalJoint,
    /// 基础骨骼中的节点
    pub source: Option<NodeId>,
    /// 附加骨骼中的节点
    pub target: Option<NodeId>,
    pub method: MappingMethod,
    /// 由融合流程设置
    pub was_merged: bool,
}

impl JointMapping {
    pub fn new(joint: CanonicalJoint, source: Option<NodeId>, target: Option<NodeId>, method: MappingMethod) -> Self {
        Self {
            joint,
            source,
            target,
            method,
            was_merged: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.source.is_some() && self.target.is_some()
    }

    /// 有效映射的 (源, 目标)
    pub fn pair(&self) -> Option<(NodeId, NodeId)> {
        Some((self.source?, self.target?))
    }
}

/// 映射结果统计
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MappingSummary {
    pub total: usize,
    pub valid: usize,
    pub native: usize,
    pub exact: usize,
    pub heuristic: usize,
    pub manual: usize,
    /// 源骨骼中存在但目标骨骼中没有找到的关节
    pub unmatched: Vec<CanonicalJoint>,
}

impl MappingSummary {
    pub fn of(mappings: &[JointMapping]) -> Self {
        let mut summary = Self {
            total: mappings.len(),
            ..Self::default()
        };
        for m in mappings {
            if !m.is_valid() {
                summary.unmatched.push(m.joint);
                continue;
            }
            summary.valid += 1;
            match m.method {
                MappingMethod::NativeMapping => summary.native += 1,
                MappingMethod::ExactName => summary.exact += 1,
                MappingMethod::HeuristicName => summary.heuristic += 1,
                MappingMethod::Manual => summary.manual += 1,
                MappingMethod::None => {}
            }
        }
        summary
    }
}
