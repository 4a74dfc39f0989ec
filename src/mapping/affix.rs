//! 服装骨骼名称前缀/后缀推测（例如 Jacket_Hips / Hips.jacket）

use std::collections::BTreeMap;

use crate::humanoid::try_identify;
use crate::rig::RigReference;
use crate::scene::Scene;

const AFFIX_SEPARATORS: [char; 4] = ['_', '.', ':', ' '];

/// 去掉后才能识别出关节的名称至少要有这么多个
const MIN_AFFIX_HITS: usize = 3;

/// 推测目标骨骼名称上的公共前缀和后缀
///
/// 候选取第一个/最后一个分隔符处切出的片段；只有当去掉它后能识别、
/// 而原名识别不了的名称不少于 MIN_AFFIX_HITS 个时才采用。
pub fn detect_affixes(scene: &Scene, target: &RigReference) -> (Option<String>, Option<String>) {
    let names: Vec<&str> = scene
        .descendants(target.search_root())
        .into_iter()
        .skip(1)
        .filter_map(|id| scene.name(id))
        .collect();

    let prefix = best_affix(&names, |name| {
        name.find(AFFIX_SEPARATORS).map(|pos| &name[..pos + 1])
    }, |name, affix| name.strip_prefix(affix));

    let suffix = best_affix(&names, |name| {
        name.rfind(AFFIX_SEPARATORS).map(|pos| &name[pos..])
    }, |name, affix| name.strip_suffix(affix));

    if prefix.is_some() || suffix.is_some() {
        log::info!("推测服装骨骼前后缀: prefix={prefix:?}, suffix={suffix:?}");
    }
    (prefix, suffix)
}

fn best_affix<'a>(
    names: &[&'a str],
    candidate: impl Fn(&'a str) -> Option<&'a str>,
    strip: impl Fn(&'a str, &str) -> Option<&'a str>,
) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for &name in names {
        if let Some(affix) = candidate(name) {
            if !is_side_marker(affix) {
                *counts.entry(affix).or_default() += 1;
            }
        }
    }

    // 出现次数最多者优先，同次数按字典序
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked.into_iter().find_map(|(affix, count)| {
        if count < MIN_AFFIX_HITS {
            return None;
        }
        let hits = names
            .iter()
            .filter_map(|&name| strip(name, affix).filter(|s| !s.is_empty()).map(|s| (name, s)))
            .filter(|&(name, stripped)| try_identify(name).is_none() && try_identify(stripped).is_some())
            .count();
        (hits >= MIN_AFFIX_HITS).then(|| affix.to_string())
    })
}

/// 左右侧标记（_L / .R / _Left）不算前后缀
fn is_side_marker(affix: &str) -> bool {
    let core = affix.trim_matches(AFFIX_SEPARATORS.as_slice()).to_lowercase();
    matches!(core.as_str(), "l" | "r" | "left" | "right")
}
