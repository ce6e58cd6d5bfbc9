//! 按帧计数的延迟任务队列
//!
//! 任务只携带值数据（实体 ID、票据），执行时再按 ID 查找实体。

use crate::skeleton::EntityId;

/// 姿势系统的延迟任务
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PosingTask {
    /// 回读稳定姿势并钉住
    Reconcile { entity: EntityId, ticket: u64 },
    /// 记录历史快照
    Snapshot { entity: EntityId },
}

impl PosingTask {
    pub fn entity(&self) -> EntityId {
        match self {
            PosingTask::Reconcile { entity, .. } | PosingTask::Snapshot { entity } => *entity,
        }
    }
}

#[derive(Clone, Debug)]
struct ScheduledTask<T> {
    due: u64,
    task: T,
}

/// 帧调度器：`schedule(n, task)` 在之后第 n 次 `advance` 时取出任务
#[derive(Clone, Debug)]
pub struct FrameScheduler<T> {
    frame: u64,
    tasks: Vec<ScheduledTask<T>>,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self {
            frame: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T> FrameScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前帧号
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// `after_frames` 为 0 时在下一次 advance 执行
    pub fn schedule(&mut self, after_frames: u32, task: T) {
        let due = self.frame + u64::from(after_frames.max(1));
        self.tasks.push(ScheduledTask { due, task });
    }

    /// 前进一帧，按到期顺序（同帧按登记顺序）取出到期任务
    pub fn advance(&mut self) -> Vec<T> {
        self.frame += 1;
        let frame = self.frame;

        let (mut due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.tasks).into_iter().partition(|t| t.due <= frame);
        self.tasks = pending;

        due.sort_by_key(|t| t.due);
        due.into_iter().map(|t| t.task).collect()
    }

    /// 丢弃不满足条件的任务
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.tasks.retain(|t| keep(&t.task));
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

impl FrameScheduler<PosingTask> {
    /// 实体销毁时丢弃它的所有任务
    pub fn cancel_entity(&mut self, entity: EntityId) {
        self.retain(|task| task.entity() != entity);
    }
}
