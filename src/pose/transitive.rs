//! 传递动作队列：覆盖层写入引擎缓冲区的唯一入口

use super::BonePoseInfo;
use crate::skeleton::{Bone, Transform};

/// 引擎逐骨骼计算姿势时调用的一次性回调
pub type TransitiveAction = Box<dyn FnMut(&Bone, &BonePoseInfo, &mut Transform)>;

/// 每帧注册、每帧清空
#[derive(Default)]
pub struct TransitiveQueue {
    actions: Vec<TransitiveAction>,
}

impl TransitiveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: impl FnMut(&Bone, &BonePoseInfo, &mut Transform) + 'static) {
        self.actions.push(Box::new(action));
    }

    /// 按注册顺序对一根骨骼执行所有动作
    pub fn run(&mut self, bone: &Bone, info: &BonePoseInfo, transform: &mut Transform) {
        for action in &mut self.actions {
            action(bone, info, transform);
        }
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl std::fmt::Debug for TransitiveQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitiveQueue")
            .field("actions", &self.actions.len())
            .finish()
    }
}
