//! 姿势控制
//!
//! 每个角色一个控制器（导入/导出/重置/撤销/重做），
//! 服务层负责注册表、帧调度和分组历史。

mod capability;
mod config;
mod options;
mod scheduler;
mod service;

pub use capability::{PosingCapability, PosingState, ResetOptions};
pub use config::PosingConfig;
pub use options::{BoneFilter, ImportIntent, PoseImportOptions};
pub use scheduler::{FrameScheduler, PosingTask};
pub use service::PosingService;

pub use crate::skeleton::EntityId;
