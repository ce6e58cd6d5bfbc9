//! 骨骼名方言转换
//!
//! 其他姿势工具对同一关节使用可读名称（Root、SpineA、HandLeft……），
//! 导入时先转换为引擎名称再与骨骼匹配。

use std::borrow::Cow;
use std::collections::HashMap;

use once_cell::sync::Lazy;

/// (方言名, 引擎名)
const DIALECT_TABLE: &[(&str, &str)] = &[
    ("Root", "n_root"),
    ("Abdomen", "n_hara"),
    ("Throw", "n_throw"),
    ("Waist", "j_kosi"),
    ("SpineA", "j_sebo_a"),
    ("SpineB", "j_sebo_b"),
    ("SpineC", "j_sebo_c"),
    ("Neck", "j_kubi"),
    ("Head", "j_kao"),
    ("Jaw", "j_f_ago"),
    ("ClavicleLeft", "j_sako_l"),
    ("ClavicleRight", "j_sako_r"),
    ("ArmLeft", "j_ude_a_l"),
    ("ArmRight", "j_ude_a_r"),
    ("ForearmLeft", "j_ude_b_l"),
    ("ForearmRight", "j_ude_b_r"),
    ("HandLeft", "j_te_l"),
    ("HandRight", "j_te_r"),
    ("LegLeft", "j_asi_a_l"),
    ("LegRight", "j_asi_a_r"),
    ("KneeLeft", "j_asi_b_l"),
    ("KneeRight", "j_asi_b_r"),
    ("CalfLeft", "j_asi_c_l"),
    ("CalfRight", "j_asi_c_r"),
    ("FootLeft", "j_asi_d_l"),
    ("FootRight", "j_asi_d_r"),
    ("ToesLeft", "j_asi_e_l"),
    ("ToesRight", "j_asi_e_r"),
    ("WeaponLeft", "n_buki_l"),
    ("WeaponRight", "n_buki_r"),
];

static TO_ENGINE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| DIALECT_TABLE.iter().copied().collect());

static TO_DIALECT: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| DIALECT_TABLE.iter().map(|&(d, e)| (e, d)).collect());

/// 方言名 -> 引擎名；未知名称原样返回（去除首尾空白）
pub fn to_engine_name(name: &str) -> Cow<'_, str> {
    let name = name.trim();
    match TO_ENGINE.get(name) {
        Some(engine) => Cow::Borrowed(*engine),
        None => Cow::Borrowed(name),
    }
}

/// 引擎名 -> 方言名
pub fn to_dialect_name(engine_name: &str) -> Option<&'static str> {
    TO_DIALECT.get(engine_name).copied()
}

/// 名称已是引擎写法（不在方言表中）
pub fn is_engine_name(name: &str) -> bool {
    !TO_ENGINE.contains_key(name.trim())
}

/// 表情骨骼（脸部）
pub fn is_expression_bone(engine_name: &str) -> bool {
    engine_name.starts_with("j_f_")
}
