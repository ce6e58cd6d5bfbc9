//! 姿势文件读写

pub mod bone_names;
mod legacy;
mod pose_file;

pub use pose_file::PoseFile;
