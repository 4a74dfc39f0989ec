//! 场景节点竞技场

use glam::Mat4;
use slotmap::SlotMap;

use super::{Node, NodeId, Transform};
use crate::{Result, RigError};

/// 场景图
///
/// 所有节点保存在一个 SlotMap 中，父子关系用句柄记录。
/// 删除节点后旧句柄失效，所有访问都返回 Option / Result。
#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeId, Node>,
    roots: Vec<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建根节点
    pub fn add_root(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.nodes.insert(Node::new(name));
        self.roots.push(id);
        id
    }

    /// 在父节点下创建子节点（追加到末尾）
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(RigError::NodeNotFound(parent));
        }
        let mut node = Node::new(name);
        node.parent = Some(parent);
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// 创建带局部变换的子节点
    pub fn add_child_with(&mut self, parent: NodeId, name: impl Into<String>, local: Transform) -> Result<NodeId> {
        let id = self.add_child(parent, name)?;
        self.nodes[id].local = local;
        Ok(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(RigError::NodeNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).map(|n| n.name.as_str())
    }

    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or(RigError::NodeNotFound(id))?;
        node.name = name.into();
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// 节点在兄弟节点中的位置（根节点按根列表计算）
    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        let node = self.nodes.get(id)?;
        let siblings = match node.parent {
            Some(parent) => self.children(parent),
            None => &self.roots,
        };
        siblings.iter().position(|&s| s == id)
    }

    /// 层级深度，根节点为 0
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).len()
    }

    /// 从父节点向上直到根的祖先列表（不含自身）
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            result.push(p);
            current = self.parent(p);
        }
        result
    }

    /// 前序遍历子树（含自身）
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        if !self.contains(id) {
            return result;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            // 逆序压栈保证子节点按原顺序输出
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// ancestor 是否为 node 的严格祖先
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// 在子树中按名称查找（前序遍历的第一个）
    pub fn find_by_name(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&id| self.name(id) == Some(name))
    }

    /// 世界变换（节点不存在时返回单位矩阵）
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let Some(node) = self.nodes.get(id) else {
            return Mat4::IDENTITY;
        };
        let local = node.local.to_matrix();
        match node.parent {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    /// 设置世界变换，反推局部变换：local = inverse(parent_world) * world
    ///
    /// 父节点世界变换不可逆（例如缩放为 0）时返回错误，不写入 NaN。
    pub fn set_world_matrix(&mut self, id: NodeId, world: Mat4) -> Result<()> {
        let parent_world = self.invertible_world(id, self.get(id)?.parent)?;
        self.nodes[id].local = Transform::from_matrix(parent_world.inverse() * world);
        Ok(())
    }

    fn invertible_world(&self, id: NodeId, parent: Option<NodeId>) -> Result<Mat4> {
        let Some(parent) = parent else {
            return Ok(Mat4::IDENTITY);
        };
        let world = self.world_matrix(parent);
        if world.determinant().abs() <= f32::EPSILON {
            return Err(RigError::DegenerateTransform(id));
        }
        Ok(world)
    }

    /// 重设父节点（追加到新父节点子列表末尾）
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>, keep_world: bool) -> Result<()> {
        let index = match parent {
            Some(p) => self.get(p)?.children.len(),
            None => self.roots.len(),
        };
        self.set_parent_at(id, parent, index, keep_world)
    }

    /// 重设父节点并插入到指定兄弟位置（越界时追加到末尾）
    pub fn set_parent_at(&mut self, id: NodeId, parent: Option<NodeId>, index: usize, keep_world: bool) -> Result<()> {
        self.get(id)?;
        if let Some(p) = parent {
            self.get(p)?;
            if p == id || self.is_ancestor_of(id, p) {
                return Err(RigError::CyclicParent { node: id, parent: p });
            }
        }
        if keep_world {
            // 在摘除之前检查，失败时层级保持原样
            self.invertible_world(id, parent)?;
        }

        let world = self.world_matrix(id);
        self.detach(id);

        let siblings = match parent {
            Some(p) => &mut self.nodes[p].children,
            None => &mut self.roots,
        };
        let index = index.min(siblings.len());
        siblings.insert(index, id);
        self.nodes[id].parent = parent;

        if keep_world {
            self.set_world_matrix(id, world)?;
        }
        Ok(())
    }

    /// 从当前父节点（或根列表）中摘除
    fn detach(&mut self, id: NodeId) {
        match self.nodes[id].parent {
            Some(p) => self.nodes[p].children.retain(|&c| c != id),
            None => self.roots.retain(|&r| r != id),
        }
        self.nodes[id].parent = None;
    }

    /// 删除叶子节点
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        if !self.get(id)?.children.is_empty() {
            return Err(RigError::NodeHasChildren(id));
        }
        self.detach(id);
        self.nodes.remove(id).ok_or(RigError::NodeNotFound(id))
    }

    /// 删除整个子树，返回删除的节点数量
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<usize> {
        self.get(id)?;
        let subtree = self.descendants(id);
        self.detach(id);
        for node in &subtree {
            self.nodes.remove(*node);
        }
        Ok(subtree.len())
    }
}
