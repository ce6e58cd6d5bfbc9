//! 撤销/重做历史

mod grouped;
mod stack;

pub use grouped::{GroupMember, GroupedEntry, GroupedHistory, PoseTarget};
pub use stack::{HistoryEntry, PoseHistory};

use std::collections::VecDeque;

/// 配置的栈大小 -> 容量；≤0 表示禁用
fn capacity_for(max_size: i32) -> Option<usize> {
    if max_size <= 0 {
        None
    } else {
        Some(max_size as usize + 1)
    }
}

/// 丢弃最旧的条目直到不超过容量，保留 `keep_front` 个最底部条目
fn trim<T>(stack: &mut VecDeque<T>, capacity: usize, keep_front: usize) {
    while stack.len() > capacity && stack.len() > keep_front {
        stack.remove(keep_front);
    }
}
