//! 稀疏骨骼覆盖层

use std::collections::HashMap;

use glam::{Quat, Vec3};

use super::TransformComponents;
use crate::skeleton::{Bone, PoseSlot, Transform};

/// 覆盖层键：（槽位，分段，骨骼名）
///
/// 不依赖骨骼对象本身，骨骼重建后同名骨骼仍能命中。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BonePoseKey {
    pub slot: PoseSlot,
    pub partial: usize,
    pub name: String,
}

impl BonePoseKey {
    pub fn new(slot: PoseSlot, partial: usize, name: impl Into<String>) -> Self {
        Self {
            slot,
            partial,
            name: name.into(),
        }
    }

    pub fn for_bone(slot: PoseSlot, bone: &Bone) -> Self {
        Self::new(slot, bone.partial, bone.name.as_str())
    }
}

impl std::fmt::Display for BonePoseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.slot, self.partial, self.name)
    }
}

/// 单个分量的覆盖
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChannelOverride<T> {
    /// 叠加在引擎值上的差值
    Relative(T),
    /// 钉住的绝对值
    Absolute(T),
}

impl<T: Copy> ChannelOverride<T> {
    pub fn value(&self) -> T {
        match self {
            ChannelOverride::Relative(v) | ChannelOverride::Absolute(v) => *v,
        }
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self, ChannelOverride::Absolute(_))
    }
}

bitflags::bitflags! {
    /// 骨骼上激活的 IK 约束标记（仅记录，不求解）
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct IkMarkers: u8 {
        const CCD = 1 << 0;
        const TWO_JOINT = 1 << 1;
    }
}

/// 单根骨骼的覆盖记录
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BonePoseInfo {
    pub position: Option<ChannelOverride<Vec3>>,
    pub rotation: Option<ChannelOverride<Quat>>,
    pub scale: Option<ChannelOverride<Vec3>>,
    pub ik: IkMarkers,
}

impl BonePoseInfo {
    /// 把覆盖应用到引擎值上
    pub fn apply(&self, base: &Transform) -> Transform {
        let position = match self.position {
            Some(ChannelOverride::Relative(d)) => base.position + d,
            Some(ChannelOverride::Absolute(v)) => v,
            None => base.position,
        };
        let rotation = match self.rotation {
            Some(ChannelOverride::Relative(d)) => (d * base.rotation).normalize(),
            Some(ChannelOverride::Absolute(q)) => q,
            None => base.rotation,
        };
        let scale = match self.scale {
            Some(ChannelOverride::Relative(d)) => base.scale + d,
            Some(ChannelOverride::Absolute(v)) => v,
            None => base.scale,
        };
        Transform::new(position, rotation, scale)
    }

    /// 钉住指定分量
    pub fn set_absolute(&mut self, value: &Transform, components: TransformComponents) {
        if components.contains(TransformComponents::POSITION) {
            self.position = Some(ChannelOverride::Absolute(value.position));
        }
        if components.contains(TransformComponents::ROTATION) {
            self.rotation = Some(ChannelOverride::Absolute(value.rotation.normalize()));
        }
        if components.contains(TransformComponents::SCALE) {
            self.scale = Some(ChannelOverride::Absolute(value.scale));
        }
    }

    /// 在现有覆盖之上叠加差值：相对覆盖累加差值，绝对覆盖平移绝对值
    pub fn add_delta(&mut self, delta: &Transform, components: TransformComponents) {
        if components.contains(TransformComponents::POSITION) {
            self.position = Some(match self.position {
                None => ChannelOverride::Relative(delta.position),
                Some(ChannelOverride::Relative(d)) => ChannelOverride::Relative(d + delta.position),
                Some(ChannelOverride::Absolute(v)) => ChannelOverride::Absolute(v + delta.position),
            });
        }
        if components.contains(TransformComponents::ROTATION) {
            self.rotation = Some(match self.rotation {
                None => ChannelOverride::Relative(delta.rotation.normalize()),
                Some(ChannelOverride::Relative(d)) => {
                    ChannelOverride::Relative((delta.rotation * d).normalize())
                }
                Some(ChannelOverride::Absolute(q)) => {
                    ChannelOverride::Absolute((delta.rotation * q).normalize())
                }
            });
        }
        if components.contains(TransformComponents::SCALE) {
            self.scale = Some(match self.scale {
                None => ChannelOverride::Relative(delta.scale),
                Some(ChannelOverride::Relative(d)) => ChannelOverride::Relative(d + delta.scale),
                Some(ChannelOverride::Absolute(v)) => ChannelOverride::Absolute(v + delta.scale),
            });
        }
    }

    pub fn clear_transform(&mut self) {
        self.position = None;
        self.rotation = None;
        self.scale = None;
    }

    pub fn has_transform(&self) -> bool {
        self.position.is_some() || self.rotation.is_some() || self.scale.is_some()
    }

    pub fn has_ik(&self) -> bool {
        !self.ik.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_transform() && !self.has_ik()
    }
}

/// 覆盖层：键不存在即"使用引擎值"
///
/// 条目不会因当前骨骼拓扑而被移除，骨骼消失时条目只是不生效。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseOverlay {
    entries: HashMap<BonePoseKey, BonePoseInfo>,
}

impl PoseOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取条目，首次访问时创建空条目
    pub fn get_pose_info(&mut self, key: &BonePoseKey) -> &mut BonePoseInfo {
        self.entries.entry(key.clone()).or_default()
    }

    pub fn get(&self, key: &BonePoseKey) -> Option<&BonePoseInfo> {
        self.entries.get(key)
    }

    /// 任一骨骼带有 IK 标记
    pub fn has_ik_stacks(&self) -> bool {
        self.entries.values().any(BonePoseInfo::has_ik)
    }

    /// 有实际覆盖的条目数
    pub fn override_count(&self) -> usize {
        self.entries.values().filter(|e| e.has_transform()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BonePoseKey, &BonePoseInfo)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&BonePoseKey, &mut BonePoseInfo)> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BonePoseInfo::is_empty)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
