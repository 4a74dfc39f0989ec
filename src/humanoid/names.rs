//! 关节命名变体数据库
//!
//! 覆盖常见的命名约定：Unity Humanoid、Mixamo、VRoid (J_Bip_*)、UE (spine_01 / thigh_l)、
//! Blender Rigify (upper_arm.L)、3ds Max Biped (Bip01 L Thigh) 以及 MMD 日文骨骼名。
//! 左右侧关节的变体由部位词干与左右侧写法组合生成。

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use super::similarity::{detect_side, normalize, similarity_normalized};
use super::{CanonicalJoint, Side, MATCH_THRESHOLD};

/// 关节 -> 变体列表（按 CanonicalJoint::index 索引，保持登记顺序）
static NAME_VARIANTS: Lazy<Vec<Vec<String>>> =
    Lazy::new(|| CanonicalJoint::ALL.iter().map(|&joint| build_variants(joint)).collect());

/// 规范化变体 -> 关节（同名时先登记者优先）
static NAME_INDEX: Lazy<HashMap<String, CanonicalJoint>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for joint in CanonicalJoint::ALL {
        for variant in name_variants(joint) {
            index.entry(normalize(variant)).or_insert(joint);
        }
    }
    index
});

/// 规范化后的变体（与 NAME_VARIANTS 平行），用于相似度扫描
static NORMALIZED_VARIANTS: Lazy<Vec<Vec<String>>> = Lazy::new(|| {
    NAME_VARIANTS
        .iter()
        .map(|variants| variants.iter().map(|v| normalize(v)).collect())
        .collect()
});

/// 关节的全部命名变体，第一个为标准名
pub fn name_variants(joint: CanonicalJoint) -> &'static [String] {
    &NAME_VARIANTS[joint.index()]
}

/// 关节的规范化变体
pub fn normalized_variants(joint: CanonicalJoint) -> &'static [String] {
    &NORMALIZED_VARIANTS[joint.index()]
}

/// 识别名称对应的关节：先精确匹配规范化变体，再按默认阈值做相似度匹配
pub fn try_identify(name: &str) -> Option<CanonicalJoint> {
    identify_with_threshold(name, MATCH_THRESHOLD)
}

/// 识别名称对应的关节
///
/// 相似度并列时按分类顺序、变体登记顺序取第一个。
pub fn identify_with_threshold(name: &str, threshold: f32) -> Option<CanonicalJoint> {
    let normalized = normalize(name);
    if let Some(&joint) = NAME_INDEX.get(&normalized) {
        return Some(joint);
    }

    let side = detect_side(name);
    let mut best: Option<(CanonicalJoint, f32)> = None;
    for joint in CanonicalJoint::ALL {
        if joint.side() != side {
            continue;
        }
        for variant in normalized_variants(joint) {
            let score = similarity_normalized(&normalized, variant);
            if score >= threshold && best.map_or(true, |(_, s)| score > s) {
                best = Some((joint, score));
            }
        }
    }
    best.map(|(joint, _)| joint)
}

/// 名称所指的左右侧是否与关节一致
pub fn side_matches(joint: CanonicalJoint, name: &str) -> bool {
    joint.side() == detect_side(name)
}

fn build_variants(joint: CanonicalJoint) -> Vec<String> {
    let mut raw: Vec<String> = vec![joint.as_str().to_string()];
    match joint.side() {
        None => raw.extend(center_variants(joint).iter().map(|s| s.to_string())),
        Some(side) => raw.extend(sided_variants(joint, side)),
    }

    // 按规范化结果去重，保留第一次出现的写法
    let mut seen = HashSet::new();
    raw.into_iter().filter(|v| seen.insert(normalize(v))).collect()
}

fn center_variants(joint: CanonicalJoint) -> &'static [&'static str] {
    use CanonicalJoint::*;
    match joint {
        Hips => &["Hip", "Pelvis", "J_Bip_C_Hips", "Bip01 Pelvis", "Bip001 Pelvis", "下半身", "腰"],
        Spine => &["Spine0", "spine_01", "Abdomen", "J_Bip_C_Spine", "Bip01 Spine", "上半身"],
        Chest => &["Spine1", "spine_02", "Torso", "J_Bip_C_Chest", "Bip01 Spine1", "上半身2"],
        UpperChest => &["Upper_Chest", "Spine2", "spine_03", "J_Bip_C_UpperChest", "Bip01 Spine2", "上半身3"],
        Neck => &["neck_01", "J_Bip_C_Neck", "Bip01 Neck", "首"],
        Head => &["J_Bip_C_Head", "Bip01 Head", "頭"],
        Jaw => &["J_Adj_C_Jaw", "Chin", "あご"],
        _ => &[],
    }
}

/// 不带左右侧的部位词干
fn stems(joint: CanonicalJoint) -> Vec<String> {
    let words: &[&str] = match joint.stem() {
        "UpperLeg" => &["UpperLeg", "UpLeg", "Thigh", "LegUpper"],
        "LowerLeg" => &["LowerLeg", "Leg", "Knee", "Calf", "Shin", "LegLower"],
        "Foot" => &["Foot", "Ankle"],
        "Toes" => &["Toes", "Toe", "ToeBase", "Toe0"],
        "Shoulder" => &["Shoulder", "Clavicle", "Collar", "Collarbone"],
        "UpperArm" => &["UpperArm", "Arm", "ArmUpper"],
        "LowerArm" => &["LowerArm", "ForeArm", "Elbow", "ArmLower"],
        "Hand" => &["Hand", "Wrist"],
        "Eye" => &["Eye"],
        stem => return finger_stems(stem),
    };
    words.iter().map(|w| w.to_string()).collect()
}

/// 手指词干：手指名 x 指节写法，例如 IndexProximal / Index1 / Pointer01
fn finger_stems(stem: &str) -> Vec<String> {
    const SEGMENTS: [(&str, [&str; 2]); 3] = [
        ("Proximal", ["1", "01"]),
        ("Intermediate", ["2", "02"]),
        ("Distal", ["3", "03"]),
    ];
    let Some((segment, numbers)) = SEGMENTS.iter().find(|(s, _)| stem.ends_with(s)) else {
        return vec![stem.to_string()];
    };
    let finger = &stem[..stem.len() - segment.len()];
    let aliases: &[&str] = match finger {
        "Index" => &["Index", "IndexFinger", "Pointer"],
        "Middle" => &["Middle", "MiddleFinger"],
        "Ring" => &["Ring", "RingFinger"],
        "Little" => &["Little", "Pinky", "Pinkie", "Small"],
        _ => &["Thumb"],
    };

    let mut result = Vec::new();
    for alias in aliases {
        result.push(format!("{alias}{segment}"));
        for number in numbers {
            result.push(format!("{alias}{number}"));
        }
    }
    result
}

fn sided_variants(joint: CanonicalJoint, side: Side) -> Vec<String> {
    let (full, short, kanji) = match side {
        Side::Left => ("Left", "L", "左"),
        Side::Right => ("Right", "R", "右"),
    };

    let mut result = Vec::new();
    for stem in stems(joint) {
        result.push(format!("{full}{stem}"));
        result.push(format!("{stem}_{short}"));
        result.push(format!("{stem}.{short}"));
        result.push(format!("{short}_{stem}"));
        result.push(format!("{stem}_{full}"));
        result.push(format!("{stem}{short}"));
        result.push(format!("{short}{stem}"));
    }

    // 特定工具链的完整写法
    let stem = joint.stem();
    result.push(format!("J_Bip_{short}_{}", vroid_stem(stem)));
    result.push(format!("Bip01 {short} {}", biped_stem(stem)));
    if joint.is_finger() {
        // Mixamo: LeftHandIndex1
        let finger = finger_stems(stem);
        if let Some(numbered) = finger.get(1) {
            result.push(format!("{full}Hand{numbered}"));
        }
    }
    if let Some(mmd) = mmd_stem(stem) {
        result.push(format!("{kanji}{mmd}"));
    }
    result
}

fn vroid_stem(stem: &str) -> String {
    match stem {
        "Toes" => "ToeBase".to_string(),
        s if s.ends_with("Proximal") || s.ends_with("Intermediate") || s.ends_with("Distal") => {
            finger_stems(s).get(1).cloned().unwrap_or_else(|| s.to_string())
        }
        s => s.to_string(),
    }
}

fn biped_stem(stem: &str) -> &str {
    match stem {
        "UpperLeg" => "Thigh",
        "LowerLeg" => "Calf",
        "Toes" => "Toe0",
        "Shoulder" => "Clavicle",
        "LowerArm" => "Forearm",
        "ThumbProximal" => "Finger0",
        "ThumbIntermediate" => "Finger01",
        "ThumbDistal" => "Finger02",
        "IndexProximal" => "Finger1",
        "IndexIntermediate" => "Finger11",
        "IndexDistal" => "Finger12",
        "MiddleProximal" => "Finger2",
        "MiddleIntermediate" => "Finger21",
        "MiddleDistal" => "Finger22",
        "RingProximal" => "Finger3",
        "RingIntermediate" => "Finger31",
        "RingDistal" => "Finger32",
        "LittleProximal" => "Finger4",
        "LittleIntermediate" => "Finger41",
        "LittleDistal" => "Finger42",
        s => s,
    }
}

/// MMD 标准骨骼名（不含 左/右 前缀）
fn mmd_stem(stem: &str) -> Option<&'static str> {
    let name = match stem {
        "UpperLeg" => "足",
        "LowerLeg" => "ひざ",
        "Foot" => "足首",
        "Toes" => "つま先",
        "Shoulder" => "肩",
        "UpperArm" => "腕",
        "LowerArm" => "ひじ",
        "Hand" => "手首",
        "Eye" => "目",
        "ThumbProximal" => "親指０",
        "ThumbIntermediate" => "親指１",
        "ThumbDistal" => "親指２",
        "IndexProximal" => "人指１",
        "IndexIntermediate" => "人指２",
        "IndexDistal" => "人指３",
        "MiddleProximal" => "中指１",
        "MiddleIntermediate" => "中指２",
        "MiddleDistal" => "中指３",
        "RingProximal" => "薬指１",
        "RingIntermediate" => "薬指２",
        "RingDistal" => "薬指３",
        "LittleProximal" => "小指１",
        "LittleIntermediate" => "小指２",
        "LittleDistal" => "小指３",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use CanonicalJoint::*;

    #[test]
    fn test_first_variant_is_canonical_name() {
        for joint in CanonicalJoint::ALL {
            assert_eq!(name_variants(joint)[0], joint.as_str());
        }
    }

    #[test]
    fn test_database_size() {
        let total: usize = CanonicalJoint::ALL.iter().map(|&j| name_variants(j).len()).sum();
        assert!(total > 300, "only {total} variants");
    }

    #[test]
    fn test_identify_conventions() {
        assert_eq!(try_identify("mixamorig:Hips"), Some(Hips));
        assert_eq!(try_identify("mixamorig:LeftUpLeg"), Some(LeftUpperLeg));
        assert_eq!(try_identify("mixamorig:LeftLeg"), Some(LeftLowerLeg));
        assert_eq!(try_identify("mixamorig:RightHandIndex2"), Some(RightIndexIntermediate));
        assert_eq!(try_identify("J_Bip_L_UpperArm"), Some(LeftUpperArm));
        assert_eq!(try_identify("upperarm_r"), Some(RightUpperArm));
        assert_eq!(try_identify("upper_arm.L"), Some(LeftUpperArm));
        assert_eq!(try_identify("thigh_l"), Some(LeftUpperLeg));
        assert_eq!(try_identify("Bip01 R Forearm"), Some(RightLowerArm));
        assert_eq!(try_identify("spine_02"), Some(Chest));
        assert_eq!(try_identify("左ひじ"), Some(LeftLowerArm));
        assert_eq!(try_identify("右手首"), Some(RightHand));
        assert_eq!(try_identify("上半身"), Some(Spine));
    }

    #[test]
    fn test_identify_fuzzy_respects_side() {
        assert_eq!(try_identify("LeftUpperArmm"), Some(LeftUpperArm));
        assert_eq!(try_identify("Right_Sleeve_Ribbon"), None);
        assert_eq!(try_identify("Skirt_01"), None);
    }

    #[test]
    fn test_variants_are_unique_after_normalize() {
        for joint in CanonicalJoint::ALL {
            let variants = name_variants(joint);
            let unique: HashSet<String> = variants.iter().map(|v| normalize(v)).collect();
            assert_eq!(unique.len(), variants.len(), "{joint}");
        }
    }

    #[test]
    fn test_identify_is_repeatable() {
        let first = try_identify("LeftIndexProx");
        for _ in 0..10 {
            assert_eq!(try_identify("LeftIndexProx"), first);
        }
    }
}
