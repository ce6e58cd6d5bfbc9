//! 姿势文件（JSON）

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{bone_names, legacy};
use crate::skeleton::{PoseSlot, Transform};
use crate::{PoseError, Result};

fn zero_delta() -> Transform {
    Transform::ZERO_DELTA
}

/// 姿势文件数据
///
/// 骨骼表按槽位分开存放，键为骨骼名（可能是方言名，导入时转换）。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PoseFile {
    /// 导出时模型变换相对原始值的差
    #[serde(default = "zero_delta")]
    pub model_difference: Transform,
    /// 导出时的模型绝对变换
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_absolute_values: Option<Transform>,
    #[serde(default)]
    pub bones: BTreeMap<String, Transform>,
    #[serde(default)]
    pub main_hand: BTreeMap<String, Transform>,
    #[serde(default)]
    pub off_hand: BTreeMap<String, Transform>,
}

impl Default for PoseFile {
    fn default() -> Self {
        Self {
            model_difference: Transform::ZERO_DELTA,
            model_absolute_values: None,
            bones: BTreeMap::new(),
            main_hand: BTreeMap::new(),
            off_hand: BTreeMap::new(),
        }
    }
}

impl PoseFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// 解析 JSON，自动识别并升级旧格式
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        if legacy::is_legacy(&value) {
            log::info!("检测到旧版姿势文件，升级中");
            return legacy::upgrade(value);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// 导入前的检查：至少有一根骨骼，所有数值有限
    pub fn validate(&self) -> Result<()> {
        if self.bone_count() == 0 {
            return Err(PoseError::EmptyPose);
        }
        let bones = PoseSlot::LIVE
            .into_iter()
            .filter_map(|slot| self.bones_for(slot))
            .flat_map(|bones| bones.iter());
        for (name, transform) in bones {
            if !transform.is_finite() {
                return Err(PoseError::InvalidPose(format!("{name}: non-finite transform")));
            }
        }
        if !self.model_difference.is_finite() || !self.model_absolute_values.map_or(true, |t| t.is_finite()) {
            return Err(PoseError::InvalidPose("model: non-finite transform".to_string()));
        }
        Ok(())
    }

    pub fn bones_for(&self, slot: PoseSlot) -> Option<&BTreeMap<String, Transform>> {
        match slot {
            PoseSlot::Character => Some(&self.bones),
            PoseSlot::MainHand => Some(&self.main_hand),
            PoseSlot::OffHand => Some(&self.off_hand),
            PoseSlot::Unknown => None,
        }
    }

    pub fn bones_for_mut(&mut self, slot: PoseSlot) -> Option<&mut BTreeMap<String, Transform>> {
        match slot {
            PoseSlot::Character => Some(&mut self.bones),
            PoseSlot::MainHand => Some(&mut self.main_hand),
            PoseSlot::OffHand => Some(&mut self.off_hand),
            PoseSlot::Unknown => None,
        }
    }

    /// 所有槽位的骨骼总数
    pub fn bone_count(&self) -> usize {
        self.bones.len() + self.main_hand.len() + self.off_hand.len()
    }

    /// 把方言骨骼名转换为引擎名
    ///
    /// 同一骨骼同时以两种写法出现时，引擎写法优先。
    pub fn normalize_names(&mut self) {
        for slot in PoseSlot::LIVE {
            let Some(bones) = self.bones_for_mut(slot) else {
                continue;
            };
            let source = std::mem::take(bones);
            let (native, dialect): (Vec<_>, Vec<_>) =
                source.into_iter().partition(|(name, _)| bone_names::is_engine_name(name));

            for (name, transform) in native {
                bones.insert(name.trim().to_string(), transform);
            }
            for (name, transform) in dialect {
                let engine = bone_names::to_engine_name(&name).into_owned();
                if bones.contains_key(&engine) {
                    log::debug!("{slot}: {name} 与 {engine} 重复，忽略方言条目");
                    continue;
                }
                bones.insert(engine, transform);
            }
        }
    }
}
