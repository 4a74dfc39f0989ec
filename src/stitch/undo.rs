//! Stitch 模式的撤销日志

use crate::scene::{NodeId, Scene, Transform};
use crate::{Result, RigError};

/// 一次重挂操作前的状态
#[derive(Clone, Debug, PartialEq)]
pub struct UndoRecord {
    pub node: NodeId,
    pub previous_parent: Option<NodeId>,
    pub previous_sibling_index: usize,
    pub previous_name: String,
    pub previous_local: Transform,
}

impl UndoRecord {
    pub fn capture(scene: &Scene, node: NodeId) -> Result<Self> {
        let n = scene.node(node).ok_or(RigError::NodeNotFound(node))?;
        Ok(Self {
            node,
            previous_parent: n.parent(),
            previous_sibling_index: scene.sibling_index(node).unwrap_or(0),
            previous_name: n.name.clone(),
            previous_local: n.local,
        })
    }
}

/// 撤销日志（每次融合调用开始时清空，非线程安全）
#[derive(Clone, Debug, Default)]
pub struct UndoLog {
    records: Vec<UndoRecord>,
}

impl UndoLog {
    pub fn push(&mut self, record: UndoRecord) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn records(&self) -> &[UndoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 按相反顺序整体回滚，返回成功恢复的节点数
    ///
    /// 先恢复子骨骼再恢复父骨骼，局部变换原样写回，因此世界变换也完全还原。
    pub fn rollback(&mut self, scene: &mut Scene) -> usize {
        let mut restored = 0;
        for record in self.records.drain(..).rev() {
            match Self::restore(scene, &record) {
                Ok(()) => restored += 1,
                Err(e) => log::warn!("撤销 '{}' 失败: {e}", record.previous_name),
            }
        }
        restored
    }

    fn restore(scene: &mut Scene, record: &UndoRecord) -> Result<()> {
        let parent = record.previous_parent.filter(|&p| scene.contains(p));
        scene.set_parent_at(record.node, parent, record.previous_sibling_index, false)?;
        scene.rename(record.node, record.previous_name.clone())?;
        if let Some(node) = scene.node_mut(record.node) {
            node.local = record.previous_local;
        }
        Ok(())
    }
}
