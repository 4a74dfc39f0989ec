//! 骨骼实例引用

use std::sync::Arc;

use super::NativeRigMap;
use crate::config::StitchConfig;
use crate::humanoid::CanonicalJoint;
use crate::scene::{NodeId, Scene};

/// 一个骨骼实例
///
/// 由根节点构造，`refresh` 重新计算原生映射可用性并查找骨骼根；
/// 之后除缓存字段外只读。
#[derive(Clone, Debug)]
pub struct RigReference {
    root: NodeId,
    native: Option<Arc<dyn NativeRigMap>>,
    /// 原生映射由调用方显式提供（refresh 时不从根节点组件重新读取）
    explicit_native: bool,
    rig_root: Option<NodeId>,
    has_native_mapping: bool,
}

impl RigReference {
    pub fn new(scene: &Scene, root: NodeId, config: &StitchConfig) -> Self {
        let mut rig = Self {
            root,
            native: None,
            explicit_native: false,
            rig_root: None,
            has_native_mapping: false,
        };
        rig.refresh(scene, config);
        rig
    }

    /// 使用外部提供的原生映射
    pub fn with_native_map(scene: &Scene, root: NodeId, native: Arc<dyn NativeRigMap>, config: &StitchConfig) -> Self {
        let mut rig = Self {
            root,
            native: Some(native),
            explicit_native: true,
            rig_root: None,
            has_native_mapping: false,
        };
        rig.refresh(scene, config);
        rig
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// 发现的骨骼根（例如 Armature 容器）
    pub fn rig_root(&self) -> Option<NodeId> {
        self.rig_root
    }

    pub fn has_native_mapping(&self) -> bool {
        self.has_native_mapping
    }

    /// 名称启发式搜索的起点
    pub fn search_root(&self) -> NodeId {
        self.rig_root.unwrap_or(self.root)
    }

    /// 通过原生映射查询关节（节点已被删除时返回 None）
    pub fn native_joint(&self, scene: &Scene, joint: CanonicalJoint) -> Option<NodeId> {
        if !self.has_native_mapping {
            return None;
        }
        self.native
            .as_ref()?
            .joint(joint)
            .filter(|&node| scene.contains(node))
    }

    /// 重新计算原生映射可用性并查找骨骼根
    pub fn refresh(&mut self, scene: &Scene, config: &StitchConfig) {
        if !self.explicit_native {
            self.native = scene
                .node(self.root)
                .and_then(|n| n.humanoid.clone())
                .filter(|map| !map.is_empty())
                .map(|map| Arc::new(map) as Arc<dyn NativeRigMap>);
        }

        let hips = self
            .native
            .as_ref()
            .and_then(|native| native.joint(CanonicalJoint::Hips))
            .filter(|&node| scene.contains(node));
        self.has_native_mapping = hips.is_some();

        self.rig_root = hips
            .and_then(|h| scene.parent(h))
            .or_else(|| self.find_named_root(scene, config))
            .or_else(|| {
                scene
                    .children(self.root)
                    .iter()
                    .copied()
                    .find(|&c| !scene.children(c).is_empty())
            });

        log::debug!(
            "骨骼实例 '{}': native={}, rig_root={:?}",
            scene.name(self.root).unwrap_or("?"),
            self.has_native_mapping,
            self.rig_root.and_then(|r| scene.name(r)),
        );
    }

    /// 按约定名称查找骨骼根：先按优先级查直接子节点，再查整棵子树
    fn find_named_root(&self, scene: &Scene, config: &StitchConfig) -> Option<NodeId> {
        let children = scene.children(self.root);
        config
            .rig_root_names
            .iter()
            .find_map(|name| children.iter().copied().find(|&c| scene.name(c) == Some(name.as_str())))
            .or_else(|| {
                scene
                    .descendants(self.root)
                    .into_iter()
                    .skip(1)
                    .find(|&n| scene.name(n).is_some_and(|name| config.is_rig_root_name(name)))
            })
    }

    /// 数据质量检查，返回非致命警告
    pub fn validate(&self, scene: &Scene) -> Vec<String> {
        let name = scene.name(self.root).unwrap_or("?");
        let mut warnings = Vec::new();
        if !scene.contains(self.root) {
            warnings.push(format!("rig root {:?} no longer exists", self.root));
            return warnings;
        }
        if !self.has_native_mapping {
            warnings.push(format!("rig '{name}' has no native humanoid mapping, falling back to name heuristics"));
        }
        if self.rig_root.is_none() {
            warnings.push(format!("rig '{name}' has no discoverable skeleton root"));
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::HumanoidMap;

    #[test]
    fn test_root_from_native_hips_parent() {
        let mut scene = Scene::new();
        let avatar = scene.add_root("Avatar");
        let skeleton = scene.add_child(avatar, "Bones").unwrap();
        let hips = scene.add_child(skeleton, "Hips").unwrap();
        scene.node_mut(avatar).unwrap().humanoid = Some(HumanoidMap::new().with(CanonicalJoint::Hips, hips));

        let rig = RigReference::new(&scene, avatar, &StitchConfig::default());
        assert!(rig.has_native_mapping());
        assert_eq!(rig.rig_root(), Some(skeleton));
        assert_eq!(rig.native_joint(&scene, CanonicalJoint::Hips), Some(hips));
        assert!(rig.validate(&scene).is_empty());
    }

    #[test]
    fn test_root_from_conventional_name() {
        let mut scene = Scene::new();
        let outfit = scene.add_root("Outfit");
        let _mesh = scene.add_child(outfit, "Body").unwrap();
        let armature = scene.add_child(outfit, "Armature").unwrap();
        scene.add_child(armature, "Hips").unwrap();

        let rig = RigReference::new(&scene, outfit, &StitchConfig::default());
        assert!(!rig.has_native_mapping());
        assert_eq!(rig.rig_root(), Some(armature));
        let warnings = rig.validate(&scene);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("native"));
    }

    #[test]
    fn test_root_from_first_child_with_descendants() {
        let mut scene = Scene::new();
        let outfit = scene.add_root("Outfit");
        scene.add_child(outfit, "Body").unwrap();
        let bones = scene.add_child(outfit, "Bones").unwrap();
        scene.add_child(bones, "Hips").unwrap();

        let rig = RigReference::new(&scene, outfit, &StitchConfig::default());
        assert_eq!(rig.rig_root(), Some(bones));
    }

    #[test]
    fn test_missing_everything_is_only_warned() {
        let mut scene = Scene::new();
        let lonely = scene.add_root("Lonely");
        let rig = RigReference::new(&scene, lonely, &StitchConfig::default());
        assert_eq!(rig.rig_root(), None);
        assert_eq!(rig.search_root(), lonely);
        assert_eq!(rig.validate(&scene).len(), 2);
    }

    #[test]
    fn test_refresh_drops_deleted_native_joint() {
        let mut scene = Scene::new();
        let avatar = scene.add_root("Avatar");
        let armature = scene.add_child(avatar, "Armature").unwrap();
        let hips = scene.add_child(armature, "Hips").unwrap();
        scene.node_mut(avatar).unwrap().humanoid = Some(HumanoidMap::new().with(CanonicalJoint::Hips, hips));
        let config = StitchConfig::default();

        let mut rig = RigReference::new(&scene, avatar, &config);
        assert!(rig.has_native_mapping());
        scene.remove_node(hips).unwrap();
        rig.refresh(&scene, &config);
        assert!(!rig.has_native_mapping());
        assert_eq!(rig.rig_root(), Some(armature));
    }
}
