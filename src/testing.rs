//! 测试用骨骼数据与脚本化引擎

use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::skeleton::{
    AttachPoint, BoneRecord, EntityId, PartialBuffer, PartialConnection, PoseSlot, SkeletonBuffers,
    SkeletonProvider, Transform,
};

pub(crate) fn at(x: f32, y: f32, z: f32) -> Transform {
    Transform::new(Vec3::new(x, y, z), Quat::IDENTITY, Vec3::ONE)
}

/// 身体（分段 0）+ 脸部（分段 1，接在 j_kao 上）
pub(crate) fn body_buffers() -> SkeletonBuffers {
    let body = vec![
        BoneRecord::new("n_root", None, Transform::IDENTITY),
        BoneRecord::new("j_kosi", Some(0), at(0.0, 1.0, 0.0)),
        BoneRecord::new("j_sebo_a", Some(1), at(0.0, 0.1, 0.0)),
        BoneRecord::new("j_sebo_b", Some(2), at(0.0, 0.1, 0.0)),
        BoneRecord::new("j_kubi", Some(3), at(0.0, 0.2, 0.0)),
        BoneRecord::new("j_kao", Some(4), at(0.0, 0.1, 0.0)),
        BoneRecord::new("j_te_l", Some(3), at(0.5, 0.0, 0.0)),
        BoneRecord::new("j_te_r", Some(3), at(-0.5, 0.0, 0.0)),
        BoneRecord::new("j_f_ago", Some(5), at(0.0, -0.05, 0.05)),
    ];
    let face = vec![
        BoneRecord::new("j_kao", None, Transform::IDENTITY),
        BoneRecord::new("j_f_face", Some(0), at(0.0, 0.05, 0.0)),
        BoneRecord::new("j_f_mayu_l", Some(1), at(0.02, 0.03, 0.04)),
        BoneRecord::new("j_f_ago", Some(1), at(0.0, -0.05, 0.05)),
    ];
    SkeletonBuffers {
        partials: vec![
            PartialBuffer {
                bones: body,
                connection: None,
            },
            PartialBuffer {
                bones: face,
                connection: Some(PartialConnection::to_base(0, 5)),
            },
        ],
        attached_to: None,
        hides_base_jaw: false,
    }
}

/// 挂在身体某根骨骼上的武器
pub(crate) fn weapon_buffers(anchor_bone: usize) -> SkeletonBuffers {
    SkeletonBuffers {
        partials: vec![PartialBuffer {
            bones: vec![
                BoneRecord::new("n_buki", None, Transform::IDENTITY),
                BoneRecord::new("j_buki_a", Some(0), at(0.0, 0.3, 0.0)),
            ],
            connection: None,
        }],
        attached_to: Some(AttachPoint {
            slot: PoseSlot::Character,
            partial: 0,
            bone: anchor_bone,
        }),
        hides_base_jaw: false,
    }
}

/// 脚本化引擎：`base` 是每帧动画结果，`current` 是本帧缓冲区
#[derive(Default)]
pub(crate) struct FakeEngine {
    base: HashMap<(EntityId, PoseSlot), SkeletonBuffers>,
    current: HashMap<(EntityId, PoseSlot), SkeletonBuffers>,
    models: HashMap<EntityId, Transform>,
    pub writes: usize,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character(entity: EntityId) -> Self {
        let mut engine = Self::new();
        engine.set_slot(entity, PoseSlot::Character, Some(body_buffers()));
        engine.models.insert(entity, Transform::IDENTITY);
        engine.begin_frame();
        engine
    }

    pub fn set_slot(&mut self, entity: EntityId, slot: PoseSlot, buffers: Option<SkeletonBuffers>) {
        match buffers {
            Some(b) => {
                self.base.insert((entity, slot), b);
            }
            None => {
                self.base.remove(&(entity, slot));
            }
        }
    }

    pub fn remove_entity(&mut self, entity: EntityId) {
        self.base.retain(|(e, _), _| *e != entity);
        self.current.retain(|(e, _), _| *e != entity);
        self.models.remove(&entity);
    }

    /// 引擎开始新一帧：缓冲区恢复为动画结果
    pub fn begin_frame(&mut self) {
        self.current = self.base.clone();
    }

    /// 模拟约束求解在覆盖层之后修改骨骼
    pub fn constrain(
        &mut self,
        entity: EntityId,
        slot: PoseSlot,
        partial: usize,
        bone: usize,
        f: impl FnOnce(&mut Transform),
    ) {
        if let Some(record) = self
            .current
            .get_mut(&(entity, slot))
            .and_then(|b| b.partials.get_mut(partial))
            .and_then(|p| p.bones.get_mut(bone))
        {
            f(&mut record.transform);
        }
    }

    pub fn bone(&self, entity: EntityId, slot: PoseSlot, partial: usize, bone: usize) -> Option<Transform> {
        self.current
            .get(&(entity, slot))?
            .partials
            .get(partial)?
            .bones
            .get(bone)
            .map(|r| r.transform)
    }
}

impl SkeletonProvider for FakeEngine {
    fn skeleton_buffers(&self, entity: EntityId, slot: PoseSlot) -> Option<SkeletonBuffers> {
        self.current.get(&(entity, slot)).cloned()
    }

    fn write_bone(&mut self, entity: EntityId, slot: PoseSlot, partial: usize, bone: usize, transform: Transform) {
        self.writes += 1;
        self.constrain(entity, slot, partial, bone, |t| *t = transform);
    }

    fn model_transform(&self, entity: EntityId) -> Option<Transform> {
        self.models.get(&entity).copied()
    }

    fn set_model_transform(&mut self, entity: EntityId, transform: Transform) {
        self.models.insert(entity, transform);
    }
}
