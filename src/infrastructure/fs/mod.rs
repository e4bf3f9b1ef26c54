//! File System Operations

mod local;

pub use local::{
    atomic_write, copy_tree, has_files, hash_tree, list_files, mirror_tree, remove_dir_if_exists,
    replace_tree, ALWAYS_SKIPPED,
};
