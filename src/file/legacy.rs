//! 旧版姿势文件升级
//!
//! 旧格式把向量写成逗号分隔的字符串（`"0, 1, 0"`），
//! 模型变换直接放在顶层 Position/Rotation/Scale，骨骼值可能为 null。

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use serde::Deserialize;
use serde_json::Value;

use super::PoseFile;
use crate::skeleton::Transform;
use crate::{PoseError, Result};

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct LegacyTransform {
    position: Option<String>,
    rotation: Option<String>,
    scale: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct LegacyPoseFile {
    position: Option<String>,
    rotation: Option<String>,
    scale: Option<String>,
    bones: BTreeMap<String, Option<LegacyTransform>>,
    main_hand: BTreeMap<String, Option<LegacyTransform>>,
    off_hand: BTreeMap<String, Option<LegacyTransform>>,
}

const TRANSFORM_KEYS: [&str; 3] = ["Position", "Rotation", "Scale"];

/// 任意变换分量是字符串即视为旧格式
pub(crate) fn is_legacy(value: &Value) -> bool {
    let has_string_channel = |v: &Value| TRANSFORM_KEYS.iter().any(|k| v.get(k).is_some_and(Value::is_string));

    if has_string_channel(value) {
        return true;
    }
    ["Bones", "MainHand", "OffHand"].iter().any(|section| {
        value
            .get(section)
            .and_then(Value::as_object)
            .is_some_and(|bones| bones.values().any(has_string_channel))
    })
}

pub(crate) fn upgrade(value: Value) -> Result<PoseFile> {
    let legacy: LegacyPoseFile = serde_json::from_value(value)?;

    let model_absolute_values = if legacy.position.is_some() || legacy.rotation.is_some() || legacy.scale.is_some() {
        Some(parse_transform(
            "model",
            &LegacyTransform {
                position: legacy.position,
                rotation: legacy.rotation,
                scale: legacy.scale,
            },
        )?)
    } else {
        None
    };

    Ok(PoseFile {
        model_difference: Transform::ZERO_DELTA,
        model_absolute_values,
        bones: upgrade_section(legacy.bones)?,
        main_hand: upgrade_section(legacy.main_hand)?,
        off_hand: upgrade_section(legacy.off_hand)?,
    })
}

fn upgrade_section(section: BTreeMap<String, Option<LegacyTransform>>) -> Result<BTreeMap<String, Transform>> {
    let mut bones = BTreeMap::new();
    for (name, value) in section {
        // null 骨骼直接丢弃
        let Some(value) = value else {
            continue;
        };
        let transform = parse_transform(&name, &value)?;
        bones.insert(name, transform);
    }
    Ok(bones)
}

fn parse_transform(name: &str, value: &LegacyTransform) -> Result<Transform> {
    let invalid = |what: &str, text: &str| PoseError::InvalidPose(format!("{name}: bad {what} \"{text}\""));

    let position = match &value.position {
        Some(text) => parse_vec3(text).ok_or_else(|| invalid("position", text.as_str()))?,
        None => Vec3::ZERO,
    };
    let rotation = match &value.rotation {
        Some(text) => parse_quat(text).ok_or_else(|| invalid("rotation", text.as_str()))?,
        None => Quat::IDENTITY,
    };
    let scale = match &value.scale {
        Some(text) => parse_vec3(text).ok_or_else(|| invalid("scale", text.as_str()))?,
        None => Vec3::ONE,
    };
    Ok(Transform::new(position, rotation, scale))
}

fn parse_floats<const N: usize>(text: &str) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    let mut parts = text.split(',');
    for slot in &mut out {
        *slot = parts.next()?.trim().parse::<f32>().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

/// 格式: "x, y, z"
fn parse_vec3(text: &str) -> Option<Vec3> {
    parse_floats::<3>(text).map(Vec3::from_array)
}

/// 格式: "x, y, z, w"
fn parse_quat(text: &str) -> Option<Quat> {
    let [x, y, z, w] = parse_floats::<4>(text)?;
    Some(Quat::from_xyzw(x, y, z, w).normalize())
}
