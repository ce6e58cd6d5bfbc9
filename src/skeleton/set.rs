//! 每个角色的骨骼集合（本体 + 武器），每帧重建

use std::collections::BTreeMap;

use super::{AttachPoint, Bone, BoneHandle, EntityId, PoseSlot, Skeleton, SkeletonBuffers, SkeletonProvider};

/// 跨骨骼的骨骼引用
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoneRef {
    pub slot: PoseSlot,
    pub bone: BoneHandle,
}

/// 骨骼集合
#[derive(Clone, Debug, Default)]
pub struct SkeletonSet {
    skeletons: BTreeMap<PoseSlot, Skeleton>,
}

impl SkeletonSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从一组缓冲区构建
    pub fn from_buffers(buffers: impl IntoIterator<Item = (PoseSlot, SkeletonBuffers)>) -> Self {
        let mut set = Self::new();
        let mut pending = Vec::new();
        for (slot, buffers) in buffers {
            if let Some(point) = buffers.attached_to {
                pending.push((slot, point));
            }
            set.skeletons.insert(slot, Skeleton::build(slot, &buffers));
        }
        set.wire_attachments(pending);
        set
    }

    /// 丢弃上一帧的骨骼，按引擎当前缓冲区重建所有槽位
    pub fn refresh(&mut self, provider: &dyn SkeletonProvider, entity: EntityId) {
        let buffers = PoseSlot::LIVE
            .iter()
            .filter_map(|&slot| provider.skeleton_buffers(entity, slot).map(|b| (slot, b)));
        *self = Self::from_buffers(buffers);
    }

    /// 连接挂接关系；锚点不存在时视为未挂接
    fn wire_attachments(&mut self, pending: Vec<(PoseSlot, AttachPoint)>) {
        for (slot, point) in pending {
            if point.slot == slot {
                log::warn!("{} 声明挂接到自身，忽略", slot);
                continue;
            }

            let anchor = self
                .skeletons
                .get(&point.slot)
                .and_then(|s| s.partial(point.partial))
                .and_then(|p| p.bone(point.bone));
            let Some(anchor) = anchor else {
                log::debug!("{} 的挂接点 {}:{}:{} 当前不存在", slot, point.slot, point.partial, point.bone);
                continue;
            };

            if let Some(parent) = self.skeletons.get_mut(&point.slot) {
                parent.attachments.push(slot);
                if let Some(bone) = parent.bone_mut(anchor) {
                    bone.attached.push(slot);
                }
            }
            if let Some(child) = self.skeletons.get_mut(&slot) {
                child.set_attached_to(Some(BoneRef {
                    slot: point.slot,
                    bone: anchor,
                }));
            }
        }
    }

    pub fn get(&self, slot: PoseSlot) -> Option<&Skeleton> {
        self.skeletons.get(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoseSlot, &Skeleton)> {
        self.skeletons.iter().map(|(slot, s)| (*slot, s))
    }

    pub fn is_empty(&self) -> bool {
        self.skeletons.is_empty()
    }

    pub fn clear(&mut self) {
        self.skeletons.clear();
    }

    pub fn resolve(&self, bone: BoneRef) -> Option<&Bone> {
        self.skeletons.get(&bone.slot)?.bone(bone.bone)
    }

    pub fn find_bone(&self, slot: PoseSlot, partial: usize, name: &str) -> Option<&Bone> {
        self.skeletons.get(&slot)?.find_bone(partial, name)
    }
}
