//! 姿势服务：被追踪角色的注册表
//!
//! 持有所有角色的控制器、共享的帧调度器和分组历史。
//! 宿主每帧先调用 `update_pose`（引擎姿势计算），再调用 `tick`（约束稳定之后）。

use std::collections::HashMap;

use super::{FrameScheduler, PoseImportOptions, PosingCapability, PosingConfig, PosingState, PosingTask, ResetOptions};
use crate::file::PoseFile;
use crate::history::{GroupedHistory, PoseTarget};
use crate::pose::PoseOverlay;
use crate::skeleton::{EntityId, SkeletonProvider, Transform};
use crate::Result;

impl PoseTarget for HashMap<EntityId, PosingCapability> {
    fn capture(&self, entity: EntityId) -> Option<(PoseOverlay, Option<Transform>)> {
        self.get(&entity).map(PosingCapability::capture_state)
    }

    fn restore(&mut self, entity: EntityId, overlay: &PoseOverlay, model: Option<Transform>) -> bool {
        match self.get_mut(&entity) {
            Some(capability) => {
                capability.restore_state(overlay, model);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug)]
pub struct PosingService {
    config: PosingConfig,
    capabilities: HashMap<EntityId, PosingCapability>,
    scheduler: FrameScheduler<PosingTask>,
    history: GroupedHistory,
}

impl PosingService {
    pub fn new(config: PosingConfig) -> Result<Self> {
        config.validate()?;
        let history = GroupedHistory::new(config.undo_stack_size);
        Ok(Self {
            config,
            capabilities: HashMap::new(),
            scheduler: FrameScheduler::new(),
            history,
        })
    }

    pub fn config(&self) -> &PosingConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &FrameScheduler<PosingTask> {
        &self.scheduler
    }

    // ========== 注册表 ==========

    /// 开始追踪一个角色；已存在时返回现有控制器
    pub fn add_entity(&mut self, entity: EntityId) -> &mut PosingCapability {
        let config = &self.config;
        self.capabilities.entry(entity).or_insert_with(|| {
            log::info!("开始追踪 {}", entity);
            PosingCapability::new(entity, config.clone())
        })
    }

    pub fn add_prop(&mut self, entity: EntityId) -> &mut PosingCapability {
        let config = &self.config;
        self.capabilities.entry(entity).or_insert_with(|| {
            log::info!("开始追踪道具 {}", entity);
            PosingCapability::new_prop(entity, config.clone())
        })
    }

    /// 停止追踪，同时丢弃它的延迟任务
    pub fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.scheduler.cancel_entity(entity);
        let removed = self.capabilities.remove(&entity).is_some();
        if removed {
            log::info!("停止追踪 {}", entity);
        }
        removed
    }

    pub fn get(&self, entity: EntityId) -> Option<&PosingCapability> {
        self.capabilities.get(&entity)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut PosingCapability> {
        self.capabilities.get_mut(&entity)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.capabilities.contains_key(&entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.capabilities.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// 修改所有历史栈的大小
    pub fn set_undo_stack_size(&mut self, size: i32) {
        self.config.undo_stack_size = size;
        self.history.set_max_size(size);
        for capability in self.capabilities.values_mut() {
            capability.set_undo_stack_size(size);
        }
    }

    // ========== 每帧 ==========

    /// 引擎姿势计算：对所有角色注入覆盖层
    pub fn update_pose(&mut self, engine: &mut dyn SkeletonProvider) {
        for capability in self.capabilities.values_mut() {
            capability.update_pose(engine);
        }
    }

    /// 前进一帧并执行到期任务；实体已不存在的任务直接丢弃
    pub fn tick(&mut self, engine: &dyn SkeletonProvider) {
        for task in self.scheduler.advance() {
            let entity = task.entity();
            let Some(capability) = self.capabilities.get_mut(&entity) else {
                log::debug!("{} 已不存在，丢弃任务 {:?}", entity, task);
                continue;
            };
            match task {
                PosingTask::Reconcile { ticket, .. } => {
                    capability.reconcile(ticket, engine);
                }
                PosingTask::Snapshot { .. } => capability.snapshot(),
            }
        }
    }

    /// 引擎明确通知约束已稳定时，立即回读而不等待延迟
    pub fn settle_now(&mut self, entity: EntityId, engine: &dyn SkeletonProvider) -> bool {
        let Some(capability) = self.capabilities.get_mut(&entity) else {
            return false;
        };
        let PosingState::PendingReconciliation { ticket } = capability.state() else {
            return false;
        };
        self.scheduler
            .retain(|task| !matches!(task, PosingTask::Reconcile { entity: e, .. } if *e == entity));
        capability.reconcile(ticket, engine)
    }

    // ========== 操作 ==========

    pub fn import_pose(&mut self, entity: EntityId, file: &PoseFile, options: &PoseImportOptions) -> Result<usize> {
        let Some(capability) = self.capabilities.get_mut(&entity) else {
            log::warn!("导入姿势：{} 未被追踪", entity);
            return Ok(0);
        };
        capability.import_pose(file, options, &mut self.scheduler)
    }

    pub fn export_pose(&self, entity: EntityId, engine: &dyn SkeletonProvider) -> Option<PoseFile> {
        Some(self.capabilities.get(&entity)?.export_pose(engine))
    }

    pub fn reset(&mut self, entity: EntityId, options: ResetOptions) -> bool {
        match self.capabilities.get_mut(&entity) {
            Some(capability) => {
                capability.reset(options, &mut self.scheduler);
                true
            }
            None => false,
        }
    }

    // ========== 分组历史 ==========

    /// 编辑一组角色之前调用，记录它们当前的状态
    pub fn group_snapshot(&mut self, entities: impl IntoIterator<Item = EntityId>) {
        self.history.snapshot(&self.capabilities, entities);
    }

    pub fn can_group_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_group_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn group_undo(&mut self) -> bool {
        self.history.undo(&mut self.capabilities)
    }

    pub fn group_redo(&mut self) -> bool {
        self.history.redo(&mut self.capabilities)
    }
}
