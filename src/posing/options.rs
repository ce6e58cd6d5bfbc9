//! 导入选项

use std::collections::HashSet;

use crate::file::bone_names;
use crate::pose::{ChannelPolicies, TransformComponents};

/// 按骨骼名过滤
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum BoneFilter {
    #[default]
    All,
    /// 除表情骨骼以外
    Body,
    /// 仅表情骨骼
    Expression,
    /// 指定骨骼（引擎名）
    Only(HashSet<String>),
}

impl BoneFilter {
    /// 名称先转换为引擎名
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        BoneFilter::Only(
            names
                .into_iter()
                .map(|n| bone_names::to_engine_name(n.as_ref()).into_owned())
                .collect(),
        )
    }

    pub fn accepts(&self, engine_name: &str) -> bool {
        match self {
            BoneFilter::All => true,
            BoneFilter::Body => !bone_names::is_expression_bone(engine_name),
            BoneFilter::Expression => bone_names::is_expression_bone(engine_name),
            BoneFilter::Only(names) => names.contains(engine_name),
        }
    }
}

/// 导入参数
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoseImportOptions {
    /// 参与导入的分量
    pub components: TransformComponents,
    pub bones: BoneFilter,
    /// 是否导入主手/副手武器骨骼
    pub include_weapons: bool,
    pub bone_policy: ChannelPolicies,
    pub model_policy: ChannelPolicies,
}

impl Default for PoseImportOptions {
    fn default() -> Self {
        Self::for_intent(ImportIntent::FullPose)
    }
}

/// 调用方的导入意图
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportIntent {
    FullPose,
    BodyOnly,
    ExpressionOnly,
    Scene,
    AdHoc(PoseImportOptions),
}

impl PoseImportOptions {
    pub fn for_intent(intent: ImportIntent) -> Self {
        let full = PoseImportOptions {
            components: TransformComponents::all(),
            bones: BoneFilter::All,
            include_weapons: true,
            bone_policy: ChannelPolicies::ABSOLUTE,
            model_policy: ChannelPolicies::IGNORE,
        };
        match intent {
            ImportIntent::FullPose => full,
            ImportIntent::BodyOnly => PoseImportOptions {
                bones: BoneFilter::Body,
                ..full
            },
            ImportIntent::ExpressionOnly => PoseImportOptions {
                bones: BoneFilter::Expression,
                include_weapons: false,
                ..full
            },
            ImportIntent::Scene => PoseImportOptions {
                model_policy: ChannelPolicies::ABSOLUTE,
                ..full
            },
            ImportIntent::AdHoc(options) => options,
        }
    }

    /// 两阶段应用第二步使用：全部骨骼、全部分量、绝对值，不动模型变换
    pub(crate) fn pin_all() -> Self {
        Self::for_intent(ImportIntent::FullPose)
    }
}

impl From<ImportIntent> for PoseImportOptions {
    fn from(intent: ImportIntent) -> Self {
        Self::for_intent(intent)
    }
}
