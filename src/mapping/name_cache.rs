//! 子树名称缓存

use std::collections::HashMap;

use crate::humanoid::{detect_side, normalize, Side};
use crate::scene::{NodeId, Scene};

/// 缓存条目：节点、规范化名称、名称所指的左右侧
#[derive(Clone, Debug)]
pub(crate) struct NameEntry {
    pub node: NodeId,
    pub normalized: String,
    pub side: Option<Side>,
}

/// 子树的 名称 -> 节点 缓存
///
/// 提供前缀/后缀时缓存构建两遍：先用原名，再用去掉前后缀的名称；
/// 两种写法都能查到，冲突时原名优先，同名时前序遍历中靠前的节点优先。
#[derive(Clone, Debug, Default)]
pub(crate) struct NameCache {
    /// 小写名称 -> 节点
    exact: HashMap<String, NodeId>,
    /// 规范化名称 -> 节点
    normalized: HashMap<String, NodeId>,
    /// 按登记顺序排列，用于相似度扫描
    entries: Vec<NameEntry>,
}

impl NameCache {
    pub fn build(scene: &Scene, root: NodeId, prefix: Option<&str>, suffix: Option<&str>) -> Self {
        let nodes = scene.descendants(root);
        let mut cache = Self::default();
        for &id in &nodes {
            if let Some(name) = scene.name(id) {
                cache.register(id, name);
            }
        }

        let prefix = prefix.filter(|p| !p.is_empty()).map(str::to_lowercase);
        let suffix = suffix.filter(|s| !s.is_empty()).map(str::to_lowercase);
        if prefix.is_some() || suffix.is_some() {
            for &id in &nodes {
                let Some(name) = scene.name(id) else { continue };
                let stripped = strip_affixes(name, prefix.as_deref(), suffix.as_deref());
                if stripped.len() != name.len() && !stripped.is_empty() {
                    cache.register(id, stripped);
                }
            }
        }
        cache
    }

    fn register(&mut self, node: NodeId, name: &str) {
        let normalized = normalize(name);
        self.exact.entry(name.to_lowercase()).or_insert(node);
        self.normalized.entry(normalized.clone()).or_insert(node);
        self.entries.push(NameEntry {
            node,
            normalized,
            side: detect_side(name),
        });
    }

    /// 大小写不敏感的精确匹配
    pub fn lookup_exact(&self, name: &str) -> Option<NodeId> {
        self.exact.get(&name.to_lowercase()).copied()
    }

    pub fn lookup_normalized(&self, normalized: &str) -> Option<NodeId> {
        self.normalized.get(normalized).copied()
    }

    pub fn entries(&self) -> &[NameEntry] {
        &self.entries
    }
}

/// 大小写不敏感地去掉前缀/后缀（prefix/suffix 已转小写）
fn strip_affixes<'a>(name: &'a str, prefix: Option<&str>, suffix: Option<&str>) -> &'a str {
    let mut result = name;
    if let Some(p) = prefix {
        if result.len() > p.len() && result.is_char_boundary(p.len()) && result[..p.len()].to_lowercase() == p {
            result = &result[p.len()..];
        }
    }
    if let Some(s) = suffix {
        if result.len() > s.len() {
            let split = result.len() - s.len();
            if result.is_char_boundary(split) && result[split..].to_lowercase() == s {
                result = &result[..split];
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_affixes() {
        assert_eq!(strip_affixes("Outfit_Hips", Some("outfit_"), None), "Hips");
        assert_eq!(strip_affixes("Hips_Jacket", None, Some("_jacket")), "Hips");
        assert_eq!(strip_affixes("Hips", Some("outfit_"), None), "Hips");
        assert_eq!(strip_affixes("Outfit_", Some("outfit_"), None), "Outfit_");
    }

    #[test]
    fn test_both_forms_are_indexed() {
        let mut scene = Scene::new();
        let root = scene.add_root("Outfit");
        let hips = scene.add_child(root, "Outfit_Hips").unwrap();
        let cache = NameCache::build(&scene, root, Some("Outfit_"), None);
        assert_eq!(cache.lookup_exact("outfit_hips"), Some(hips));
        assert_eq!(cache.lookup_exact("HIPS"), Some(hips));
        assert_eq!(cache.lookup_normalized("hips"), Some(hips));
    }

    #[test]
    fn test_first_node_wins_on_duplicate_names() {
        let mut scene = Scene::new();
        let root = scene.add_root("Outfit");
        let first = scene.add_child(root, "Spine").unwrap();
        let _second = scene.add_child(root, "spine").unwrap();
        let cache = NameCache::build(&scene, root, None, None);
        assert_eq!(cache.lookup_exact("SPINE"), Some(first));
    }
}
