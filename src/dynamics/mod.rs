//! 物理链检测
//!
//! 头发、尾巴、裙摆等由弹簧/物理驱动的骨骼链不能被合并（合并后模拟失效），
//! 只能保留。检测优先使用物理组件能力，不可用时退回名称匹配。

mod detector;
mod provider;

pub use detector::{DynamicChainDetector, DynamicChainSet};
pub use provider::{PhysBoneComponents, PhysicsChain, PhysicsChainProvider};
