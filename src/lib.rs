//! Pose Engine - 外部驱动骨骼的姿势覆盖运行时
//!
//! 骨骼由外部动画/物理引擎每帧重建并驱动，本 crate 只维护操作者的覆盖层：
//! - 每帧重新解析的骨骼图（分段骨骼、挂接关系）
//! - 稀疏的骨骼姿势覆盖层与整体模型变换覆盖
//! - 两阶段应用（导入后延迟若干帧回读已稳定的姿势并钉住）
//! - 有界撤销/重做历史（单实体与分组）
//! - 姿势文件导入导出（差值/绝对策略、旧格式升级、骨骼名方言转换）

pub mod file;
pub mod history;
pub mod pose;
pub mod posing;
pub mod skeleton;

#[cfg(test)]
mod testing;

pub use file::PoseFile;
pub use history::{GroupedHistory, HistoryEntry, PoseHistory};
pub use pose::{BonePoseInfo, BonePoseKey, PoseOverlay, TransformComponents, TransformPolicy};
pub use posing::{
    EntityId, ImportIntent, PoseImportOptions, PosingCapability, PosingConfig, PosingService,
};
pub use skeleton::{Bone, PoseSlot, Skeleton, SkeletonProvider, Transform};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pose file contains no bones")]
    EmptyPose,

    #[error("Invalid pose file: {0}")]
    InvalidPose(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PoseError>;
