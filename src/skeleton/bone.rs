//! 骨骼节点

use super::{PoseSlot, Transform};

/// 骨骼句柄：所属骨骼的代数 + 扁平索引
///
/// 骨骼每次刷新都会重建，旧代数的句柄在新骨骼上解析失败而不是指向错误的骨骼。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoneHandle {
    generation: u64,
    index: usize,
}

impl BoneHandle {
    pub(crate) fn new(generation: u64, index: usize) -> Self {
        Self { generation, index }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// 骨骼节点
#[derive(Clone, Debug)]
pub struct Bone {
    pub handle: BoneHandle,
    pub name: String,
    pub partial: usize,
    /// 分段内索引
    pub local_index: usize,

    // 层级（只在同一骨骼内有效）
    pub parent: Option<BoneHandle>,
    pub children: Vec<BoneHandle>,

    // 骨骼标志
    pub is_partial_root: bool,
    pub is_skeleton_root: bool,
    pub is_hidden: bool,

    /// 挂接在此骨骼上的其他骨骼槽位
    pub attached: Vec<PoseSlot>,

    /// 最近一次刷新时引擎给出的变换（覆盖层应用之前）
    pub transform: Transform,
}

impl Bone {
    pub fn new(
        handle: BoneHandle,
        name: impl Into<String>,
        partial: usize,
        local_index: usize,
        transform: Transform,
    ) -> Self {
        Self {
            handle,
            name: name.into(),
            partial,
            local_index,
            parent: None,
            children: Vec::new(),
            is_partial_root: false,
            is_skeleton_root: false,
            is_hidden: false,
            attached: Vec::new(),
            transform,
        }
    }

    pub fn is_visible(&self) -> bool {
        !self.is_hidden
    }

    pub fn has_attachments(&self) -> bool {
        !self.attached.is_empty()
    }
}
