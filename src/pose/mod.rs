//! 姿势覆盖层
//!
//! 操作者编辑的稀疏骨骼覆盖、整体模型变换覆盖，以及每帧唯一的注入点（传递动作队列）。

mod model;
mod overlay;
mod transitive;

pub use model::ModelPosing;
pub use overlay::{BonePoseInfo, BonePoseKey, ChannelOverride, IkMarkers, PoseOverlay};
pub use transitive::{TransitiveAction, TransitiveQueue};

bitflags::bitflags! {
    /// 变换分量子集
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TransformComponents: u8 {
        const POSITION = 1 << 0;
        const ROTATION = 1 << 1;
        const SCALE = 1 << 2;
    }
}

/// 导入值与当前值的组合策略
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransformPolicy {
    /// 不修改该分量
    Ignore,
    /// 当前值 ⊕ (文件值 ⊖ 基准)
    Difference,
    /// 直接使用文件值
    #[default]
    Absolute,
}

/// 每个分量独立的组合策略
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ChannelPolicies {
    pub position: TransformPolicy,
    pub rotation: TransformPolicy,
    pub scale: TransformPolicy,
}

impl ChannelPolicies {
    pub const fn uniform(policy: TransformPolicy) -> Self {
        Self {
            position: policy,
            rotation: policy,
            scale: policy,
        }
    }

    pub const IGNORE: ChannelPolicies = ChannelPolicies::uniform(TransformPolicy::Ignore);
    pub const ABSOLUTE: ChannelPolicies = ChannelPolicies::uniform(TransformPolicy::Absolute);
    pub const DIFFERENCE: ChannelPolicies = ChannelPolicies::uniform(TransformPolicy::Difference);

    /// 满足 `components` 且策略为 `policy` 的分量
    pub fn components_with(&self, policy: TransformPolicy, components: TransformComponents) -> TransformComponents {
        let mut out = TransformComponents::empty();
        if self.position == policy {
            out |= TransformComponents::POSITION;
        }
        if self.rotation == policy {
            out |= TransformComponents::ROTATION;
        }
        if self.scale == policy {
            out |= TransformComponents::SCALE;
        }
        out & components
    }

    pub fn is_ignored(&self) -> bool {
        *self == Self::IGNORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_with_respects_filter() {
        let policies = ChannelPolicies {
            position: TransformPolicy::Difference,
            rotation: TransformPolicy::Absolute,
            scale: TransformPolicy::Absolute,
        };
        let filter = TransformComponents::POSITION | TransformComponents::ROTATION;

        assert_eq!(
            policies.components_with(TransformPolicy::Absolute, filter),
            TransformComponents::ROTATION
        );
        assert_eq!(
            policies.components_with(TransformPolicy::Difference, filter),
            TransformComponents::POSITION
        );
        assert!(policies
            .components_with(TransformPolicy::Difference, TransformComponents::SCALE)
            .is_empty());
    }
}
