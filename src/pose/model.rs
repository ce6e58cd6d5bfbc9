//! 整体模型变换覆盖

use crate::skeleton::Transform;

/// 模型变换覆盖，首次设置时记录覆盖前的原始变换
#[derive(Clone, Debug, Default)]
pub struct ModelPosing {
    transform: Option<Transform>,
    original: Option<Transform>,
    /// 最近一次在无覆盖时观察到的引擎值
    observed: Option<Transform>,
    /// 清除覆盖后需要写回一次的原始值
    restore: Option<Transform>,
}

impl ModelPosing {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录引擎当前的模型变换；有覆盖时引擎值就是覆盖本身，不记录
    ///
    /// 覆盖在首次观察之前设置时，首次观察的值（写入之前）补作原始值。
    pub fn observe(&mut self, engine_value: Transform) {
        if self.transform.is_none() && self.restore.is_none() {
            self.observed = Some(engine_value);
        } else if self.original.is_none() && self.observed.is_none() {
            self.original = Some(engine_value);
            self.observed = Some(engine_value);
        }
    }

    /// 设置覆盖；原始值未知时保持 None，重置时不写回
    pub fn set_transform(&mut self, transform: Transform) {
        if self.original.is_none() {
            self.original = self.observed;
        }
        self.transform = Some(transform);
        self.restore = None;
    }

    /// 直接恢复历史记录中的值（None 表示无覆盖）
    pub fn restore(&mut self, transform: Option<Transform>) {
        match transform {
            Some(t) => self.set_transform(t),
            None => self.reset(),
        }
    }

    /// 清除覆盖，下一帧写回原始值
    pub fn reset(&mut self) {
        if self.transform.take().is_some() {
            self.restore = self.original;
        }
    }

    pub fn transform(&self) -> Option<Transform> {
        self.transform
    }

    pub fn original(&self) -> Option<Transform> {
        self.original
    }

    /// 当前生效的模型变换
    pub fn current(&self) -> Transform {
        self.transform
            .or(self.observed)
            .or(self.original)
            .unwrap_or_default()
    }

    /// 覆盖相对原始值的差
    pub fn difference(&self) -> Option<Transform> {
        Some(self.transform?.difference(&self.original?))
    }

    /// 本帧需要写入引擎的值
    pub fn take_pending_write(&mut self) -> Option<Transform> {
        self.transform.or_else(|| self.restore.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn test_original_captured_on_first_set() {
        let engine = Transform::new(Vec3::new(5.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE);
        let mut model = ModelPosing::new();
        model.observe(engine);

        let first = Transform::new(Vec3::new(6.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE);
        model.set_transform(first);
        model.observe(first);
        model.set_transform(Transform::new(Vec3::new(7.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE));

        assert_eq!(model.original(), Some(engine));
        let diff = model.difference().unwrap();
        assert!(diff.position.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_reset_writes_original_once() {
        let engine = Transform::new(Vec3::Y, Quat::IDENTITY, Vec3::ONE);
        let mut model = ModelPosing::new();
        model.observe(engine);
        model.set_transform(Transform::IDENTITY);
        assert_eq!(model.take_pending_write(), Some(Transform::IDENTITY));

        model.reset();
        assert!(model.transform().is_none());
        assert_eq!(model.take_pending_write(), Some(engine));
        assert_eq!(model.take_pending_write(), None);
    }

    #[test]
    fn test_original_observed_after_early_set() {
        let engine = Transform::new(Vec3::new(10.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE);
        let posed = Transform::new(Vec3::new(12.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE);
        let mut model = ModelPosing::new();
        model.set_transform(posed);
        assert_eq!(model.original(), None);
        assert_eq!(model.difference(), None);

        model.observe(engine);
        assert_eq!(model.original(), Some(engine));
        assert_eq!(model.take_pending_write(), Some(posed));

        // 写入之后引擎值就是覆盖本身，不再改变原始值
        model.observe(posed);
        assert_eq!(model.original(), Some(engine));

        model.reset();
        assert_eq!(model.take_pending_write(), Some(engine));
    }

    #[test]
    fn test_reset_without_original_writes_nothing() {
        let mut model = ModelPosing::new();
        model.set_transform(Transform::IDENTITY);
        model.reset();
        assert_eq!(model.take_pending_write(), None);
    }
}
