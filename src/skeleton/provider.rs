//! 外部骨骼提供者接口

use super::{PartialConnection, PoseSlot, Transform};

/// 被追踪实体的标识
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// 引擎缓冲区中的单根骨骼
#[derive(Clone, Debug)]
pub struct BoneRecord {
    pub name: String,
    /// 同一分段内的父骨骼索引
    pub parent: Option<usize>,
    pub transform: Transform,
}

impl BoneRecord {
    pub fn new(name: impl Into<String>, parent: Option<usize>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            parent,
            transform,
        }
    }
}

/// 一个分段骨骼的缓冲区
#[derive(Clone, Debug, Default)]
pub struct PartialBuffer {
    pub bones: Vec<BoneRecord>,
    /// 非 0 分段与祖先分段的连接点
    pub connection: Option<PartialConnection>,
}

/// 本骨骼挂接到另一骨骼的位置（如武器挂在手上）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachPoint {
    pub slot: PoseSlot,
    pub partial: usize,
    pub bone: usize,
}

/// 一个槽位当前帧的完整骨骼缓冲区
#[derive(Clone, Debug, Default)]
pub struct SkeletonBuffers {
    pub partials: Vec<PartialBuffer>,
    pub attached_to: Option<AttachPoint>,
    /// 该模型族的基础分段上有一根重复的下颌骨需要隐藏
    pub hides_base_jaw: bool,
}

/// 外部引擎：提供每帧骨骼缓冲区并接收写回
///
/// 返回 `None` 表示该实体或槽位当前不存在，不是错误。
pub trait SkeletonProvider {
    fn skeleton_buffers(&self, entity: EntityId, slot: PoseSlot) -> Option<SkeletonBuffers>;

    fn write_bone(
        &mut self,
        entity: EntityId,
        slot: PoseSlot,
        partial: usize,
        bone: usize,
        transform: Transform,
    );

    fn model_transform(&self, entity: EntityId) -> Option<Transform>;

    fn set_model_transform(&mut self, entity: EntityId, transform: Transform);
}
