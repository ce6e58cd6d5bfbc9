//! 骨骼图模型
//!
//! 骨骼不归本系统所有：每次刷新都从外部引擎的缓冲区重建，
//! 只在下一次刷新前有效，跨帧只保存名称与索引。

mod bone;
mod graph;
mod partial;
mod provider;
mod set;

pub use bone::{Bone, BoneHandle};
pub use graph::Skeleton;
pub use partial::{PartialConnection, PartialSkeleton};
pub use provider::{
    AttachPoint, BoneRecord, EntityId, PartialBuffer, SkeletonBuffers, SkeletonProvider,
};
pub use set::{BoneRef, SkeletonSet};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::pose::TransformComponents;

/// 骨骼变换数据（位置 / 旋转 / 缩放）
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// 零差值：与任何变换组合后保持不变
    pub const ZERO_DELTA: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ZERO,
    };

    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    /// self ⊖ base
    ///
    /// 位置、缩放取分量差，旋转取 `self * base⁻¹`。
    pub fn difference(&self, base: &Transform) -> Transform {
        Transform {
            position: self.position - base.position,
            rotation: (self.rotation * base.rotation.inverse()).normalize(),
            scale: self.scale - base.scale,
        }
    }

    /// self ⊕ delta，`difference` 的逆运算
    pub fn compose(&self, delta: &Transform) -> Transform {
        Transform {
            position: self.position + delta.position,
            rotation: (delta.rotation * self.rotation).normalize(),
            scale: self.scale + delta.scale,
        }
    }

    /// 容差比较；q 与 -q 视为同一旋转
    pub fn approx_eq(&self, other: &Transform, eps: f32) -> bool {
        self.position.abs_diff_eq(other.position, eps)
            && self.scale.abs_diff_eq(other.scale, eps)
            && (self.rotation.abs_diff_eq(other.rotation, eps)
                || self.rotation.abs_diff_eq(-other.rotation, eps))
    }

    /// `components` 中的分量取自 self，其余取自 `fallback`
    pub fn filtered(&self, components: TransformComponents, fallback: &Transform) -> Transform {
        Transform {
            position: if components.contains(TransformComponents::POSITION) {
                self.position
            } else {
                fallback.position
            },
            rotation: if components.contains(TransformComponents::ROTATION) {
                self.rotation
            } else {
                fallback.rotation
            },
            scale: if components.contains(TransformComponents::SCALE) {
                self.scale
            } else {
                fallback.scale
            },
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

/// 覆盖层槽位：角色本体、主手/副手武器骨骼，以及无法识别的骨骼
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoseSlot {
    Character,
    MainHand,
    OffHand,
    Unknown,
}

impl PoseSlot {
    /// 每帧从引擎刷新的槽位
    pub const LIVE: [PoseSlot; 3] = [PoseSlot::Character, PoseSlot::MainHand, PoseSlot::OffHand];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoseSlot::Character => "character",
            PoseSlot::MainHand => "main_hand",
            PoseSlot::OffHand => "off_hand",
            PoseSlot::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PoseSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
