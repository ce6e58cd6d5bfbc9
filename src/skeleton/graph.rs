//! 骨骼图：由引擎缓冲区构建的完整骨骼树

use std::sync::atomic::{AtomicU64, Ordering};

use super::{Bone, BoneHandle, BoneRef, PartialSkeleton, PoseSlot, SkeletonBuffers};

/// 部分模型族在基础分段上重复的下颌骨，与脸部分段的下颌同名
pub const HIDDEN_JAW_BONE: &str = "j_f_ago";

/// 生成骨骼代数
fn next_generation() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// 一个角色（或武器）的骨骼
#[derive(Clone, Debug)]
pub struct Skeleton {
    pub slot: PoseSlot,
    generation: u64,
    partials: Vec<PartialSkeleton>,
    bones: Vec<Bone>,
    /// 本骨骼挂接到的另一骨骼上的骨骼（由 SkeletonSet 填写）
    pub attached_to: Option<BoneRef>,
    /// 挂接到本骨骼上的其他槽位
    pub attachments: Vec<PoseSlot>,
}

impl Skeleton {
    /// 从引擎缓冲区构建骨骼并连接层级
    pub fn build(slot: PoseSlot, buffers: &SkeletonBuffers) -> Self {
        let generation = next_generation();
        let mut partials = Vec::with_capacity(buffers.partials.len());
        let mut bones = Vec::new();

        // 1. 创建骨骼
        for (partial_id, buffer) in buffers.partials.iter().enumerate() {
            let mut partial = PartialSkeleton::new(partial_id);
            for (local_index, record) in buffer.bones.iter().enumerate() {
                let handle = BoneHandle::new(generation, bones.len());
                partial.add_bone(&record.name, handle);
                bones.push(Bone::new(handle, record.name.as_str(), partial_id, local_index, record.transform));
            }
            partials.push(partial);
        }

        let mut skeleton = Self {
            slot,
            generation,
            partials,
            bones,
            attached_to: None,
            attachments: Vec::new(),
        };

        // 2. 分段内父子关系
        for (partial_id, buffer) in buffers.partials.iter().enumerate() {
            skeleton.link_partial(partial_id, buffer);
        }

        // 3. 分段间连接；挂接关系由 SkeletonSet 解析后再写入
        for (partial_id, buffer) in buffers.partials.iter().enumerate() {
            skeleton.connect_partial(partial_id, buffer);
        }

        // 4. 可见性：分段 0 的根无论是否挂接都可见
        for bone in &mut skeleton.bones {
            let exposed_root = bone.partial == 0;
            let hidden_jaw =
                buffers.hides_base_jaw && bone.partial == 0 && bone.name == HIDDEN_JAW_BONE;
            bone.is_hidden = (bone.is_partial_root && !exposed_root) || hidden_jaw;
        }

        skeleton
    }

    fn link_partial(&mut self, partial_id: usize, buffer: &super::PartialBuffer) {
        let count = buffer.bones.len();
        for (local_index, record) in buffer.bones.iter().enumerate() {
            let Some(handle) = self.partials[partial_id].bone(local_index) else {
                continue;
            };
            let parent = match record.parent {
                Some(p) if p < count && p != local_index => self.partials[partial_id].bone(p),
                Some(p) => {
                    log::warn!(
                        "{} 分段 {} 骨骼 {} 的父索引 {} 无效，按根骨骼处理",
                        self.slot, partial_id, record.name, p
                    );
                    None
                }
                None => None,
            };

            match parent {
                Some(parent) => {
                    self.bones[handle.index()].parent = Some(parent);
                    self.bones[parent.index()].children.push(handle);
                }
                None => {
                    // 第一根无父骨骼作为分段根
                    if self.partials[partial_id].root.is_none() {
                        self.partials[partial_id].root = Some(handle);
                    }
                }
            }
        }
    }

    fn connect_partial(&mut self, partial_id: usize, buffer: &super::PartialBuffer) {
        if partial_id == 0 {
            if let Some(root) = self.partials[0].root {
                let bone = &mut self.bones[root.index()];
                bone.is_partial_root = true;
                bone.is_skeleton_root = true;
            }
            return;
        }

        let Some(connection) = buffer.connection else {
            return;
        };

        let parent = if connection.parent_partial < partial_id {
            self.partials
                .get(connection.parent_partial)
                .and_then(|p| p.bone(connection.parent_bone))
        } else {
            None
        };
        let Some(parent) = parent else {
            log::warn!(
                "{} 分段 {} 的连接点 ({}, {}:{}) 无效",
                self.slot, partial_id, connection.bone, connection.parent_partial, connection.parent_bone
            );
            return;
        };

        // 连接骨骼必须是分段内的根，否则退回分段根
        let root = match self.partials[partial_id].bone(connection.bone) {
            Some(h) if self.bones[h.index()].parent.is_none() => Some(h),
            _ => self.partials[partial_id].root,
        };
        let Some(root) = root else {
            return;
        };

        self.partials[partial_id].root = Some(root);
        self.partials[partial_id].connected_to = Some(parent);
        let bone = &mut self.bones[root.index()];
        bone.is_partial_root = true;
        bone.parent = Some(parent);
        self.bones[parent.index()].children.push(root);
    }

    /// 写入解析后的挂接点；分段 0 的根仅在未挂接时是骨骼根
    pub(crate) fn set_attached_to(&mut self, attached_to: Option<BoneRef>) {
        self.attached_to = attached_to;
        if let Some(root) = self.partials.first().and_then(|p| p.root) {
            self.bones[root.index()].is_skeleton_root = attached_to.is_none();
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 解析句柄；其他代数的句柄返回 None
    pub fn bone(&self, handle: BoneHandle) -> Option<&Bone> {
        if handle.generation() != self.generation {
            return None;
        }
        self.bones.get(handle.index())
    }

    pub(crate) fn bone_mut(&mut self, handle: BoneHandle) -> Option<&mut Bone> {
        if handle.generation() != self.generation {
            return None;
        }
        self.bones.get_mut(handle.index())
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn partials(&self) -> &[PartialSkeleton] {
        &self.partials
    }

    pub fn partial(&self, id: usize) -> Option<&PartialSkeleton> {
        self.partials.get(id)
    }

    /// 分段内按名称查找
    pub fn find_bone(&self, partial: usize, name: &str) -> Option<&Bone> {
        let partial = self.partials.get(partial)?;
        let local = partial.find_bone_by_name(name)?;
        self.bone(partial.bone(local)?)
    }

    /// 按名称查找，较低编号的分段优先
    pub fn find_bone_by_name(&self, name: &str) -> Option<&Bone> {
        self.partials
            .iter()
            .find_map(|p| p.find_bone_by_name(name).and_then(|i| p.bone(i)))
            .and_then(|h| self.bone(h))
    }

    /// 按名称查找可见骨骼，较低编号的分段优先
    pub fn find_visible_bone(&self, name: &str) -> Option<&Bone> {
        self.partials
            .iter()
            .filter_map(|p| p.find_bone_by_name(name).and_then(|i| p.bone(i)))
            .filter_map(|h| self.bone(h))
            .find(|b| b.is_visible())
    }

    /// 分段 0 的根骨骼
    pub fn root(&self) -> Option<&Bone> {
        self.partials.first()?.root.and_then(|h| self.bone(h))
    }

    pub fn parent(&self, bone: &Bone) -> Option<&Bone> {
        bone.parent.and_then(|h| self.bone(h))
    }

    pub fn children<'a>(&'a self, bone: &'a Bone) -> impl Iterator<Item = &'a Bone> + 'a {
        bone.children.iter().filter_map(move |&h| self.bone(h))
    }

    /// 操作者可见的骨骼
    pub fn visible_bones(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter().filter(|b| b.is_visible())
    }

    /// 从 `bone` 向上最多走 `depth` 步，返回经过的骨骼链（含起点）
    ///
    /// 遇到分段边界时停止；`stop_at_hidden` 时遇到隐藏骨骼也停止。
    pub fn get_bones_to_depth(&self, bone: &Bone, depth: usize, stop_at_hidden: bool) -> Vec<&Bone> {
        let Some(start) = self.bone(bone.handle) else {
            return Vec::new();
        };

        let mut chain = vec![start];
        let mut current = start;
        for _ in 0..depth {
            let Some(parent) = self.parent(current) else {
                break;
            };
            if parent.partial != current.partial {
                break;
            }
            if stop_at_hidden && parent.is_hidden {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{BoneRecord, PartialBuffer, PartialConnection, Transform};
    use crate::testing::{body_buffers, weapon_buffers};

    #[test]
    fn test_single_skeleton_root() {
        let skeleton = Skeleton::build(PoseSlot::Character, &body_buffers());
        let roots: Vec<&Bone> = skeleton.bones().iter().filter(|b| b.is_skeleton_root).collect();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "n_root");
        assert_eq!(roots[0].partial, 0);
        assert!(roots[0].parent.is_none());
        assert!(roots[0].is_visible());
    }

    #[test]
    fn test_partial_root_wired_and_hidden() {
        let skeleton = Skeleton::build(PoseSlot::Character, &body_buffers());
        let face_root = skeleton.find_bone(1, "j_kao").unwrap();
        assert!(face_root.is_partial_root);
        assert!(face_root.is_hidden);

        let parent = skeleton.parent(face_root).unwrap();
        assert_eq!(parent.name, "j_kao");
        assert_eq!(parent.partial, 0);
        assert!(skeleton.children(parent).any(|c| c.handle == face_root.handle));
        assert_eq!(skeleton.partial(1).unwrap().connected_to, Some(parent.handle));
    }

    #[test]
    fn test_lower_partial_wins_name_lookup() {
        let skeleton = Skeleton::build(PoseSlot::Character, &body_buffers());
        assert_eq!(skeleton.find_bone_by_name("j_kao").unwrap().partial, 0);
        assert_eq!(skeleton.find_bone_by_name("j_f_face").unwrap().partial, 1);
        assert!(skeleton.find_bone_by_name("missing").is_none());
    }

    #[test]
    fn test_hidden_jaw_only_when_flagged() {
        let mut buffers = body_buffers();
        let skeleton = Skeleton::build(PoseSlot::Character, &buffers);
        assert!(skeleton.find_bone(0, HIDDEN_JAW_BONE).unwrap().is_visible());

        buffers.hides_base_jaw = true;
        let skeleton = Skeleton::build(PoseSlot::Character, &buffers);
        assert!(skeleton.find_bone(0, HIDDEN_JAW_BONE).unwrap().is_hidden);
        assert!(skeleton.find_bone(1, HIDDEN_JAW_BONE).unwrap().is_visible());
    }

    #[test]
    fn test_dialect_jaw_resolves_to_visible_joint() {
        let jaw = crate::file::bone_names::to_engine_name("Jaw");
        assert_eq!(jaw, HIDDEN_JAW_BONE);

        let mut buffers = body_buffers();
        let skeleton = Skeleton::build(PoseSlot::Character, &buffers);
        assert_eq!(skeleton.find_visible_bone(&jaw).unwrap().partial, 0);

        // 基础分段的下颌被隐藏后落到脸部分段
        buffers.hides_base_jaw = true;
        let skeleton = Skeleton::build(PoseSlot::Character, &buffers);
        assert_eq!(skeleton.find_bone_by_name(&jaw).unwrap().partial, 0);
        assert_eq!(skeleton.find_visible_bone(&jaw).unwrap().partial, 1);

        // 隐藏的分段根不会被解析
        assert_eq!(skeleton.find_visible_bone("j_kao").unwrap().partial, 0);
        assert!(skeleton.find_visible_bone("missing").is_none());
    }

    #[test]
    fn test_attached_skeleton_has_no_skeleton_root() {
        let body = Skeleton::build(PoseSlot::Character, &body_buffers());
        let anchor = body.find_bone(0, "j_te_r").unwrap().handle;

        // 挂接解析前按独立骨骼处理
        let mut skeleton = Skeleton::build(PoseSlot::MainHand, &weapon_buffers(7));
        assert!(skeleton.root().unwrap().is_skeleton_root);

        skeleton.set_attached_to(Some(BoneRef {
            slot: PoseSlot::Character,
            bone: anchor,
        }));
        let root = skeleton.root().unwrap();
        assert!(root.is_partial_root);
        assert!(!root.is_skeleton_root);
        assert!(root.is_visible());

        skeleton.set_attached_to(None);
        assert!(skeleton.root().unwrap().is_skeleton_root);
    }

    #[test]
    fn test_stale_handle_rejected() {
        let first = Skeleton::build(PoseSlot::Character, &body_buffers());
        let handle = first.find_bone_by_name("j_kosi").unwrap().handle;
        let second = Skeleton::build(PoseSlot::Character, &body_buffers());
        assert!(first.bone(handle).is_some());
        assert!(second.bone(handle).is_none());
    }

    #[test]
    fn test_bones_to_depth_stops_at_partial_boundary() {
        let skeleton = Skeleton::build(PoseSlot::Character, &body_buffers());
        let brow = skeleton.find_bone(1, "j_f_mayu_l").unwrap();

        let chain: Vec<&str> = skeleton
            .get_bones_to_depth(brow, 10, false)
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(chain, vec!["j_f_mayu_l", "j_f_face", "j_kao"]);

        let chain: Vec<&str> = skeleton
            .get_bones_to_depth(brow, 10, true)
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(chain, vec!["j_f_mayu_l", "j_f_face"]);
    }

    #[test]
    fn test_bones_to_depth_limited() {
        let skeleton = Skeleton::build(PoseSlot::Character, &body_buffers());
        let hand = skeleton.find_bone(0, "j_te_l").unwrap();
        let chain: Vec<&str> = skeleton
            .get_bones_to_depth(hand, 2, true)
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(chain, vec!["j_te_l", "j_sebo_b", "j_sebo_a"]);
    }

    #[test]
    fn test_invalid_indices_tolerated() {
        let buffers = SkeletonBuffers {
            partials: vec![
                PartialBuffer {
                    bones: vec![
                        BoneRecord::new("root", None, Transform::IDENTITY),
                        BoneRecord::new("self_parent", Some(1), Transform::IDENTITY),
                        BoneRecord::new("out_of_range", Some(9), Transform::IDENTITY),
                    ],
                    connection: None,
                },
                PartialBuffer {
                    bones: vec![BoneRecord::new("w", None, Transform::IDENTITY)],
                    connection: Some(PartialConnection::to_base(0, 42)),
                },
            ],
            attached_to: None,
            hides_base_jaw: false,
        };
        let skeleton = Skeleton::build(PoseSlot::Character, &buffers);
        assert_eq!(skeleton.bone_count(), 4);
        assert!(skeleton.find_bone(0, "self_parent").unwrap().parent.is_none());
        assert!(skeleton.find_bone(0, "out_of_range").unwrap().parent.is_none());

        let w = skeleton.find_bone(1, "w").unwrap();
        assert!(w.parent.is_none());
        assert!(!w.is_partial_root);
        assert!(w.is_visible());
    }
}
