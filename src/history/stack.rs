//! 单实体历史

use std::collections::VecDeque;

use super::{capacity_for, trim};
use crate::pose::PoseOverlay;
use crate::skeleton::Transform;

/// 历史条目：覆盖层快照 + 模型变换覆盖
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryEntry {
    pub overlay: PoseOverlay,
    pub model: Option<Transform>,
}

/// 有界撤销/重做栈（线性历史）
#[derive(Clone, Debug)]
pub struct PoseHistory {
    undo: VecDeque<HistoryEntry>,
    redo: VecDeque<HistoryEntry>,
    max_size: i32,
}

impl PoseHistory {
    pub fn new(max_size: i32) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            max_size,
        }
    }

    pub fn max_size(&self) -> i32 {
        self.max_size
    }

    /// 修改栈大小；≤0 清空并禁用历史
    pub fn set_max_size(&mut self, max_size: i32) {
        self.max_size = max_size;
        match capacity_for(max_size) {
            Some(capacity) => {
                trim(&mut self.undo, capacity, 1);
                trim(&mut self.redo, capacity, 0);
            }
            None => self.clear(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        capacity_for(self.max_size).is_some()
    }

    /// 记录当前状态
    ///
    /// 栈为空时先压入基线（空覆盖层 + 原始模型变换），
    /// 这样撤销全部编辑会回到真正的初始姿势。
    pub fn snapshot(&mut self, overlay: &PoseOverlay, model: Option<Transform>) {
        let Some(capacity) = capacity_for(self.max_size) else {
            return;
        };

        if self.undo.is_empty() {
            self.undo.push_back(HistoryEntry::default());
        }
        self.undo.push_back(HistoryEntry {
            overlay: overlay.clone(),
            model,
        });
        self.redo.clear();
        trim(&mut self.undo, capacity, 1);
    }

    /// 基线之上还有不止一个快照
    pub fn can_undo(&self) -> bool {
        self.undo.len() > 2
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// 弹出栈顶，返回需要应用的新栈顶；基线不会被弹出
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.undo.len() < 2 {
            return None;
        }
        let top = self.undo.pop_back()?;
        self.redo.push_back(top);
        if let Some(capacity) = capacity_for(self.max_size) {
            trim(&mut self.redo, capacity, 0);
        }
        self.undo.back()
    }

    /// 弹出重做栈顶并压回撤销栈，返回需要应用的条目
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        let entry = self.redo.pop_back()?;
        self.undo.push_back(entry);
        if let Some(capacity) = capacity_for(self.max_size) {
            trim(&mut self.undo, capacity, 1);
        }
        self.undo.back()
    }

    pub fn clear_redo(&mut self) {
        self.redo.clear();
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

impl Default for PoseHistory {
    fn default() -> Self {
        Self::new(50)
    }
}
