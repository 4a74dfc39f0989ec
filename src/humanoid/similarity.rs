//! 名称规范化与相似度

use super::Side;

/// 名称分隔符
const SEPARATORS: [char; 6] = [' ', '_', '-', '.', ':', '|'];

/// 规范化名称：去掉命名空间前缀（mixamorig:Hips）、Blender 重复后缀（.001），
/// 转小写并去掉分隔符
pub fn normalize(name: &str) -> String {
    let name = name.rsplit([':', '|']).next().unwrap_or(name);
    let name = strip_duplicate_suffix(name);
    name.chars()
        .filter(|c| !SEPARATORS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// 去掉形如 ".001" 的复制后缀
fn strip_duplicate_suffix(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((head, tail)) if !head.is_empty() && tail.len() == 3 && tail.chars().all(|c| c.is_ascii_digit()) => head,
        _ => name,
    }
}

/// 名称相似度，范围 [0, 1]
///
/// 基于规范化后的编辑距离：1 - distance / max(len)。对称，且规范化后相同的名称为 1.0。
pub fn similarity(a: &str, b: &str) -> f32 {
    let a: Vec<char> = normalize(a).chars().collect();
    let b: Vec<char> = normalize(b).chars().collect();
    similarity_chars(&a, &b)
}

/// 已规范化名称的相似度
pub fn similarity_normalized(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    similarity_chars(&a, &b)
}

fn similarity_chars(a: &[char], b: &[char]) -> f32 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f32 / max_len as f32
}

/// 编辑距离（单行滚动数组）
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = if ca == cb { 0 } else { 1 };
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }
    row[b.len()]
}

/// 按分隔符和驼峰边界切分名称，返回小写词元
pub fn tokenize(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for part in name.split(SEPARATORS) {
        let chars: Vec<char> = part.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            let boundary = i > 0
                && c.is_uppercase()
                && (chars[i - 1].is_lowercase()
                    || chars[i - 1].is_ascii_digit()
                    || (chars[i - 1].is_uppercase() && chars.get(i + 1).is_some_and(|n| n.is_lowercase())));
            if boundary && !current.is_empty() {
                tokens.push(current.to_lowercase());
                current.clear();
            }
            current.push(c);
        }
        if !current.is_empty() {
            tokens.push(current.to_lowercase());
        }
    }
    tokens
}

/// 从原始名称推断左右侧，无法判断或两侧都有时返回 None
pub fn detect_side(name: &str) -> Option<Side> {
    let tokens = tokenize(name);
    // left/right 只认词首，避免 Cleft、Bright 之类的误判
    let has = |short: &[&str], word: &str, kanji: char| {
        tokens.iter().any(|t| short.contains(&t.as_str()) || t.starts_with(word)) || name.contains(kanji)
    };
    let left = has(&["l", "lf", "lft"], "left", '左');
    let right = has(&["r", "rt", "rgt"], "right", '右');
    match (left, right) {
        (true, false) => Some(Side::Left),
        (false, true) => Some(Side::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("mixamorig:LeftUpLeg"), "leftupleg");
        assert_eq!(normalize("J_Bip_C_Hips"), "jbipchips");
        assert_eq!(normalize("upper_arm.L"), "upperarml");
        assert_eq!(normalize("Spine.001"), "spine");
        assert_eq!(normalize("Armature|Hips"), "hips");
    }

    #[test]
    fn test_similarity_reflexive_and_symmetric() {
        let names = ["Hips", "hips", "LeftUpperArm", "upperarm_l", "Spine1", "J_Bip_C_Chest", "尻尾", ""];
        for a in names {
            assert_eq!(similarity(a, a), 1.0);
            assert_eq!(similarity(a, &a.to_uppercase()), 1.0);
            for b in names {
                assert_eq!(similarity(a, b), similarity(b, a), "{a} / {b}");
                let s = similarity(a, b);
                assert!((0.0..=1.0).contains(&s));
            }
        }
    }

    #[test]
    fn test_similarity_values() {
        assert_eq!(similarity("Hips", "HIPS"), 1.0);
        assert!((similarity("Spine", "Spine1") - 5.0 / 6.0).abs() < 1e-6);
        assert!(similarity("LeftHand", "RightHand") < 0.7);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("J_Bip_L_UpperArm"), vec!["j", "bip", "l", "upper", "arm"]);
        assert_eq!(tokenize("LHand"), vec!["l", "hand"]);
        assert_eq!(tokenize("hand.R"), vec!["hand", "r"]);
    }

    #[test]
    fn test_detect_side() {
        assert_eq!(detect_side("LeftUpperArm"), Some(Side::Left));
        assert_eq!(detect_side("upperarm_r"), Some(Side::Right));
        assert_eq!(detect_side("J_Bip_L_Hand"), Some(Side::Left));
        assert_eq!(detect_side("右腕"), Some(Side::Right));
        assert_eq!(detect_side("LowerArm"), None);
        assert_eq!(detect_side("Hips"), None);
        assert_eq!(detect_side("leftupleg"), Some(Side::Left));
        assert_eq!(detect_side("Hand_Right"), Some(Side::Right));
    }

    #[test]
    fn test_detect_side_ignores_embedded_words() {
        assert_eq!(detect_side("Cleft_Ribbon"), None);
        assert_eq!(detect_side("Bright_Tip"), None);
        assert_eq!(detect_side("Cleft_Ribbon_L"), Some(Side::Left));
    }
}
