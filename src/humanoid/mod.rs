//! 人形关节分类与命名数据库
//!
//! 纯函数 + 静态表，没有副作用。

mod joint;
mod names;
mod similarity;

pub use joint::{CanonicalJoint, Side};
pub use names::{identify_with_threshold, name_variants, normalized_variants, side_matches, try_identify};
pub use similarity::{detect_side, normalize, similarity, similarity_normalized, tokenize};

/// 名称相似度判定阈值
pub const MATCH_THRESHOLD: f32 = 0.7;
