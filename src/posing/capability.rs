//! 单个角色的姿势控制器
//!
//! 持有覆盖层与模型变换覆盖，每帧重新解析骨骼，通过传递动作把覆盖写入引擎，
//! 导入后调度延迟回读（两阶段应用）。

use super::{FrameScheduler, PoseImportOptions, PosingConfig, PosingTask};
use crate::file::PoseFile;
use crate::history::PoseHistory;
use crate::pose::{
    BonePoseInfo, BonePoseKey, IkMarkers, ModelPosing, PoseOverlay, TransformPolicy, TransitiveQueue,
};
use crate::skeleton::{Bone, EntityId, PoseSlot, SkeletonProvider, SkeletonSet, Transform};
use crate::Result;

/// 控制器状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PosingState {
    #[default]
    Idle,
    /// 已导入，等待回读稳定姿势
    PendingReconciliation { ticket: u64 },
}

/// 重置参数
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ResetOptions {
    pub clear_redo: bool,
    /// 延迟若干帧后记录快照
    pub snapshot: bool,
}

/// 每个被追踪角色一个
#[derive(Debug)]
pub struct PosingCapability {
    entity: EntityId,
    config: PosingConfig,
    overlay: PoseOverlay,
    model: ModelPosing,
    /// 最近一次姿势计算时的骨骼
    skeletons: SkeletonSet,
    actions: TransitiveQueue,
    history: PoseHistory,
    /// 无动画的道具：重置时只重置模型变换
    is_prop: bool,
    state: PosingState,
    ticket: u64,
}

impl PosingCapability {
    pub fn new(entity: EntityId, config: PosingConfig) -> Self {
        let history = PoseHistory::new(config.undo_stack_size);
        Self {
            entity,
            config,
            overlay: PoseOverlay::new(),
            model: ModelPosing::new(),
            skeletons: SkeletonSet::new(),
            actions: TransitiveQueue::new(),
            history,
            is_prop: false,
            state: PosingState::Idle,
            ticket: 0,
        }
    }

    pub fn new_prop(entity: EntityId, config: PosingConfig) -> Self {
        Self {
            is_prop: true,
            ..Self::new(entity, config)
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn is_prop(&self) -> bool {
        self.is_prop
    }

    pub fn state(&self) -> PosingState {
        self.state
    }

    pub fn config(&self) -> &PosingConfig {
        &self.config
    }

    pub fn overlay(&self) -> &PoseOverlay {
        &self.overlay
    }

    pub fn skeletons(&self) -> &SkeletonSet {
        &self.skeletons
    }

    pub fn history(&self) -> &PoseHistory {
        &self.history
    }

    pub fn set_undo_stack_size(&mut self, size: i32) {
        self.config.undo_stack_size = size;
        self.history.set_max_size(size);
    }

    // ========== 覆盖层 ==========

    /// 获取（必要时创建）骨骼覆盖条目
    pub fn get_pose_info(&mut self, key: &BonePoseKey) -> &mut BonePoseInfo {
        self.overlay.get_pose_info(key)
    }

    /// 清除一根骨骼的变换覆盖；带 IK 标记的骨骼拒绝重置
    pub fn reset_bone(&mut self, key: &BonePoseKey) -> bool {
        match self.overlay.get(key) {
            Some(info) if info.has_ik() => {
                log::debug!("{} 带有 IK 标记，跳过重置", key);
                false
            }
            _ => {
                self.overlay.get_pose_info(key).clear_transform();
                true
            }
        }
    }

    /// 当前模型变换覆盖
    pub fn model_transform(&self) -> Option<Transform> {
        self.model.transform()
    }

    /// 覆盖前的原始模型变换
    pub fn original_model_transform(&self) -> Option<Transform> {
        self.model.original()
    }

    pub fn set_model_transform(&mut self, transform: Transform) {
        self.model.set_transform(transform);
    }

    // ========== IK 标记 ==========

    /// 标记从指定骨骼向上 `depth` 步的骨骼链，返回标记的骨骼数
    pub fn enable_ik(&mut self, slot: PoseSlot, partial: usize, name: &str, depth: usize, kind: IkMarkers) -> usize {
        let keys = self.ik_chain(slot, partial, name, depth);
        for key in &keys {
            self.overlay.get_pose_info(key).ik |= kind;
        }
        keys.len()
    }

    pub fn disable_ik(&mut self, slot: PoseSlot, partial: usize, name: &str, depth: usize, kind: IkMarkers) -> usize {
        let keys = self.ik_chain(slot, partial, name, depth);
        for key in &keys {
            self.overlay.get_pose_info(key).ik.remove(kind);
        }
        keys.len()
    }

    /// 清除所有骨骼上的 IK 标记
    pub fn clear_ik(&mut self) {
        for (_, info) in self.overlay.iter_mut() {
            info.ik = IkMarkers::empty();
        }
    }

    pub fn has_ik_stacks(&self) -> bool {
        self.overlay.has_ik_stacks()
    }

    fn ik_chain(&self, slot: PoseSlot, partial: usize, name: &str, depth: usize) -> Vec<BonePoseKey> {
        let Some(skeleton) = self.skeletons.get(slot) else {
            return Vec::new();
        };
        let Some(bone) = skeleton.find_bone(partial, name) else {
            log::debug!("IK: ({}, {}, {}) 当前不存在", slot, partial, name);
            return Vec::new();
        };
        skeleton
            .get_bones_to_depth(bone, depth, true)
            .into_iter()
            .map(|b| BonePoseKey::for_bone(slot, b))
            .collect()
    }

    // ========== 每帧姿势计算 ==========

    /// 登记一次性的传递动作，本帧姿势计算后清空
    pub fn register_transitive_action(&mut self, action: impl FnMut(&Bone, &BonePoseInfo, &mut Transform) + 'static) {
        self.actions.register(action);
    }

    /// 引擎的逐帧姿势计算
    ///
    /// 重新解析骨骼，对每根骨骼按登记顺序执行传递动作（包括覆盖层本身），
    /// 把变化写回引擎缓冲区，然后清空动作队列。
    pub fn update_pose(&mut self, engine: &mut dyn SkeletonProvider) {
        self.skeletons.refresh(&*engine, self.entity);
        if let Some(model) = engine.model_transform(self.entity) {
            self.model.observe(model);
        }

        self.actions.register(|_, info, transform| *transform = info.apply(transform));

        let empty = BonePoseInfo::default();
        let mut written = 0;
        for (slot, skeleton) in self.skeletons.iter() {
            for bone in skeleton.bones() {
                let key = BonePoseKey::for_bone(slot, bone);
                let info = self.overlay.get(&key).unwrap_or(&empty);

                let mut transform = bone.transform;
                self.actions.run(bone, info, &mut transform);
                if transform != bone.transform {
                    engine.write_bone(self.entity, slot, bone.partial, bone.local_index, transform);
                    written += 1;
                    if self.config.debug_log {
                        log::debug!("{} {}: {:?} -> {:?}", self.entity, key, bone.transform, transform);
                    }
                }
            }
        }
        self.actions.clear();

        if let Some(model) = self.model.take_pending_write() {
            engine.set_model_transform(self.entity, model);
        }
        if self.config.debug_log {
            log::debug!("{} 本帧写入 {} 根骨骼", self.entity, written);
        }
    }

    // ========== 导入 / 导出 ==========

    /// 导入姿势文件，并调度延迟回读
    ///
    /// 骨骼按最近一次姿势计算时的骨骼解析；无法解析或隐藏的骨骼跳过。
    /// 返回写入覆盖层的骨骼数。
    pub fn import_pose(
        &mut self,
        file: &PoseFile,
        options: &PoseImportOptions,
        scheduler: &mut FrameScheduler<PosingTask>,
    ) -> Result<usize> {
        file.validate()?;
        let mut file = file.clone();
        file.normalize_names();

        let applied = self.apply_bones(&file, options);
        let model_changed = self.apply_model(&file, options);

        self.ticket += 1;
        self.state = PosingState::PendingReconciliation { ticket: self.ticket };
        scheduler.schedule(
            self.config.reconcile_delay_frames,
            PosingTask::Reconcile {
                entity: self.entity,
                ticket: self.ticket,
            },
        );

        log::info!(
            "{} 导入姿势：{} / {} 根骨骼，模型变换{}",
            self.entity,
            applied,
            file.bone_count(),
            if model_changed { "已更新" } else { "未改变" }
        );
        Ok(applied)
    }

    fn apply_bones(&mut self, file: &PoseFile, options: &PoseImportOptions) -> usize {
        let absolute = options
            .bone_policy
            .components_with(TransformPolicy::Absolute, options.components);
        let difference = options
            .bone_policy
            .components_with(TransformPolicy::Difference, options.components);
        if absolute.is_empty() && difference.is_empty() {
            return 0;
        }

        let mut applied = 0;
        for slot in PoseSlot::LIVE {
            if slot != PoseSlot::Character && !options.include_weapons {
                continue;
            }
            let Some(bones) = file.bones_for(slot).filter(|b| !b.is_empty()) else {
                continue;
            };
            let Some(skeleton) = self.skeletons.get(slot) else {
                log::debug!("{} {} 当前没有骨骼，跳过 {} 根", self.entity, slot, bones.len());
                continue;
            };

            for (name, value) in bones {
                if !options.bones.accepts(name) {
                    continue;
                }
                let Some(bone) = skeleton.find_visible_bone(name) else {
                    log::debug!("{} {}: {} 无法解析，跳过", self.entity, slot, name);
                    continue;
                };

                let info = self.overlay.get_pose_info(&BonePoseKey::for_bone(slot, bone));
                if !absolute.is_empty() {
                    info.set_absolute(value, absolute);
                }
                if !difference.is_empty() {
                    info.add_delta(&value.difference(&bone.transform), difference);
                }
                applied += 1;
            }
        }
        applied
    }

    fn apply_model(&mut self, file: &PoseFile, options: &PoseImportOptions) -> bool {
        let absolute = options
            .model_policy
            .components_with(TransformPolicy::Absolute, options.components);
        let difference = options
            .model_policy
            .components_with(TransformPolicy::Difference, options.components);
        if absolute.is_empty() && difference.is_empty() {
            return false;
        }

        let current = self.model.current();
        let mut target = current;
        if !absolute.is_empty() {
            // 没有绝对值时用本角色的原始值加文件差值还原
            let value = file.model_absolute_values.unwrap_or_else(|| {
                self.model
                    .original()
                    .unwrap_or(current)
                    .compose(&file.model_difference)
            });
            target = value.filtered(absolute, &target);
        }
        if !difference.is_empty() {
            target = current.compose(&file.model_difference).filtered(difference, &target);
        }

        if target == current && self.model.transform().is_some() {
            return false;
        }
        self.model.set_transform(target);
        true
    }

    /// 延迟回读：把稳定后的姿势作为绝对值重新导入
    ///
    /// 票据不是最新的（之后又有导入、重置或撤销）时忽略。
    pub fn reconcile(&mut self, ticket: u64, engine: &dyn SkeletonProvider) -> bool {
        match self.state {
            PosingState::PendingReconciliation { ticket: pending } if pending == ticket => {}
            _ => {
                log::debug!("{} 回读票据 {} 已过期", self.entity, ticket);
                return false;
            }
        }

        let settled = self.export_pose(engine);
        let pinned = self.apply_bones(&settled, &PoseImportOptions::pin_all());
        self.state = PosingState::Idle;
        self.snapshot();

        log::info!("{} 回读稳定姿势，钉住 {} 根骨骼", self.entity, pinned);
        true
    }

    /// 读取引擎当前缓冲区中的姿势（跳过隐藏骨骼）
    pub fn export_pose(&self, engine: &dyn SkeletonProvider) -> PoseFile {
        let mut current = SkeletonSet::new();
        current.refresh(engine, self.entity);

        let mut file = PoseFile::new();
        for (slot, skeleton) in current.iter() {
            let Some(bones) = file.bones_for_mut(slot) else {
                continue;
            };
            for bone in skeleton.visible_bones() {
                bones.entry(bone.name.clone()).or_insert(bone.transform);
            }
        }

        let model = engine
            .model_transform(self.entity)
            .unwrap_or_else(|| self.model.current());
        file.model_absolute_values = Some(model);
        if self.config.export_model_difference {
            if let Some(original) = self.model.original() {
                file.model_difference = model.difference(&original);
            }
        }

        log::info!("{} 导出姿势：{} 根骨骼", self.entity, file.bone_count());
        file
    }

    // ========== 重置 / 历史 ==========

    pub fn reset(&mut self, options: ResetOptions, scheduler: &mut FrameScheduler<PosingTask>) {
        if !self.is_prop {
            self.overlay.clear();
        }
        self.model.reset();
        self.state = PosingState::Idle;
        if options.clear_redo {
            self.history.clear_redo();
        }
        if options.snapshot {
            scheduler.schedule(
                self.config.snapshot_delay_frames,
                PosingTask::Snapshot { entity: self.entity },
            );
        }
        log::info!("{} 重置姿势", self.entity);
    }

    pub fn snapshot(&mut self) {
        self.history.snapshot(&self.overlay, self.model.transform());
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// 撤销；直接覆盖当前状态，并取消待处理的回读
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(entry) => {
                self.overlay = entry.overlay.clone();
                self.model.restore(entry.model);
                self.state = PosingState::Idle;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(entry) => {
                self.overlay = entry.overlay.clone();
                self.model.restore(entry.model);
                self.state = PosingState::Idle;
                true
            }
            None => false,
        }
    }

    /// 分组历史读取的状态
    pub(crate) fn capture_state(&self) -> (PoseOverlay, Option<Transform>) {
        (self.overlay.clone(), self.model.transform())
    }

    /// 分组历史恢复的状态
    pub(crate) fn restore_state(&mut self, overlay: &PoseOverlay, model: Option<Transform>) {
        self.overlay = overlay.clone();
        self.model.restore(model);
        self.state = PosingState::Idle;
    }
}
