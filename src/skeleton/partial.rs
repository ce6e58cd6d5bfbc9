//! 分段骨骼（身体、或一把武器）

use std::collections::HashMap;

use super::BoneHandle;

/// 分段连接点：本分段的骨骼接到祖先分段的骨骼上
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartialConnection {
    /// 本分段内的骨骼索引
    pub bone: usize,
    pub parent_partial: usize,
    /// 祖先分段内的骨骼索引
    pub parent_bone: usize,
}

impl PartialConnection {
    /// 连接到分段 0 的常见情况
    pub fn to_base(bone: usize, parent_bone: usize) -> Self {
        Self {
            bone,
            parent_partial: 0,
            parent_bone,
        }
    }
}

/// 分段骨骼
#[derive(Clone, Debug)]
pub struct PartialSkeleton {
    pub id: usize,
    /// 分段内索引 -> 骨骼句柄
    bones: Vec<BoneHandle>,
    name_to_index: HashMap<String, usize>,
    pub root: Option<BoneHandle>,
    /// 祖先分段中的连接骨骼
    pub connected_to: Option<BoneHandle>,
}

impl PartialSkeleton {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            bones: Vec::new(),
            name_to_index: HashMap::new(),
            root: None,
            connected_to: None,
        }
    }

    pub(crate) fn add_bone(&mut self, name: &str, handle: BoneHandle) {
        let index = self.bones.len();
        // 同名骨骼保留第一根
        self.name_to_index.entry(name.to_string()).or_insert(index);
        self.bones.push(handle);
    }

    /// 通过分段内索引获取骨骼句柄
    pub fn bone(&self, local_index: usize) -> Option<BoneHandle> {
        self.bones.get(local_index).copied()
    }

    /// 通过名称查找分段内索引
    pub fn find_bone_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bones(&self) -> &[BoneHandle] {
        &self.bones
    }
}
