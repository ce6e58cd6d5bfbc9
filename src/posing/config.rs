//! 姿势系统配置
//!
//! 所有参数扁平化；通过构造函数显式传入，没有全局实例。

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{PoseError, Result};

/// 姿势配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PosingConfig {
    // ========== 历史 ==========
    /// 撤销栈大小，默认 50
    /// ≤0 时禁用历史（快照不再记录）
    pub undo_stack_size: i32,

    // ========== 两阶段应用 ==========
    /// 导入后等待多少帧再回读稳定姿势，默认 3
    /// 约束求解（IK、地面贴合）需要几帧才能稳定
    pub reconcile_delay_frames: u32,
    /// 重置后延迟快照的帧数，默认 3
    pub snapshot_delay_frames: u32,

    // ========== 导出 ==========
    /// 导出时是否写出模型变换差值，默认 true
    pub export_model_difference: bool,

    // ========== 调试 ==========
    /// 每帧输出逐骨骼日志，默认 false
    pub debug_log: bool,
}

impl Default for PosingConfig {
    fn default() -> Self {
        Self {
            undo_stack_size: 50,
            reconcile_delay_frames: 3,
            snapshot_delay_frames: 3,
            export_model_difference: true,
            debug_log: false,
        }
    }
}

/// 延迟帧数上限，超过视为配置错误
const MAX_DELAY_FRAMES: u32 = 600;

impl PosingConfig {
    /// 从 JSON 文本加载，缺失字段使用默认值
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reconcile_delay_frames > MAX_DELAY_FRAMES {
            return Err(PoseError::Config(format!(
                "reconcile_delay_frames {} exceeds {}",
                self.reconcile_delay_frames, MAX_DELAY_FRAMES
            )));
        }
        if self.snapshot_delay_frames > MAX_DELAY_FRAMES {
            return Err(PoseError::Config(format!(
                "snapshot_delay_frames {} exceeds {}",
                self.snapshot_delay_frames, MAX_DELAY_FRAMES
            )));
        }
        Ok(())
    }

    pub fn history_enabled(&self) -> bool {
        self.undo_stack_size > 0
    }
}
