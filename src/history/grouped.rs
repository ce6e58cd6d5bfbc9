//! 分组（多实体）历史
//!
//! 条目记录"要回到的状态"。撤销/重做时先读取各实体的当前状态作为逆条目，
//! 再覆盖写入，因此撤销后的重做是精确的。

use std::collections::VecDeque;

use super::{capacity_for, trim};
use crate::pose::PoseOverlay;
use crate::skeleton::{EntityId, Transform};

/// 可被分组历史读取与恢复的实体集合
pub trait PoseTarget {
    fn capture(&self, entity: EntityId) -> Option<(PoseOverlay, Option<Transform>)>;

    /// 实体不存在时返回 false
    fn restore(&mut self, entity: EntityId, overlay: &PoseOverlay, model: Option<Transform>) -> bool;
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupMember {
    pub entity: EntityId,
    pub overlay: PoseOverlay,
    pub model: Option<Transform>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupedEntry {
    pub members: Vec<GroupMember>,
}

impl GroupedEntry {
    /// 读取实体当前状态，缺失的实体跳过
    pub fn capture<T: PoseTarget + ?Sized>(target: &T, entities: impl IntoIterator<Item = EntityId>) -> Self {
        let members = entities
            .into_iter()
            .filter_map(|entity| {
                let (overlay, model) = target.capture(entity)?;
                Some(GroupMember { entity, overlay, model })
            })
            .collect();
        Self { members }
    }

    fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter().map(|m| m.entity)
    }

    /// 整组应用，返回成功恢复的实体数
    fn apply<T: PoseTarget + ?Sized>(&self, target: &mut T) -> usize {
        let mut restored = 0;
        for member in &self.members {
            if target.restore(member.entity, &member.overlay, member.model) {
                restored += 1;
            } else {
                log::debug!("分组历史：{} 已不存在，跳过", member.entity);
            }
        }
        restored
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// 分组撤销/重做栈
#[derive(Clone, Debug)]
pub struct GroupedHistory {
    undo: VecDeque<GroupedEntry>,
    redo: VecDeque<GroupedEntry>,
    max_size: i32,
}

impl GroupedHistory {
    pub fn new(max_size: i32) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            max_size,
        }
    }

    pub fn set_max_size(&mut self, max_size: i32) {
        self.max_size = max_size;
        match capacity_for(max_size) {
            Some(capacity) => {
                trim(&mut self.undo, capacity, 0);
                trim(&mut self.redo, capacity, 0);
            }
            None => self.clear(),
        }
    }

    /// 在编辑之前记录这组实体的状态
    pub fn snapshot<T: PoseTarget + ?Sized>(&mut self, target: &T, entities: impl IntoIterator<Item = EntityId>) {
        let Some(capacity) = capacity_for(self.max_size) else {
            return;
        };
        let entry = GroupedEntry::capture(target, entities);
        if entry.is_empty() {
            return;
        }
        self.undo.push_back(entry);
        self.redo.clear();
        trim(&mut self.undo, capacity, 0);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo<T: PoseTarget + ?Sized>(&mut self, target: &mut T) -> bool {
        let Some(entry) = self.undo.pop_back() else {
            return false;
        };
        let inverse = GroupedEntry::capture(&*target, entry.entities());
        entry.apply(target);
        self.redo.push_back(inverse);
        if let Some(capacity) = capacity_for(self.max_size) {
            trim(&mut self.redo, capacity, 0);
        }
        true
    }

    pub fn redo<T: PoseTarget + ?Sized>(&mut self, target: &mut T) -> bool {
        let Some(entry) = self.redo.pop_back() else {
            return false;
        };
        let inverse = GroupedEntry::capture(&*target, entry.entities());
        entry.apply(target);
        self.undo.push_back(inverse);
        if let Some(capacity) = capacity_for(self.max_size) {
            trim(&mut self.undo, capacity, 0);
        }
        true
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}

impl Default for GroupedHistory {
    fn default() -> Self {
        Self::new(50)
    }
}
