//! Asset loading/parsers.
//! Colored OFF meshes are expanded into flat triangle lists ready for upload.

pub mod mesh;
pub mod off;

pub use mesh::TriangleSoup;
pub use off::{
    MeshError, NoProgress, ProgressSink, load_off_from_path, load_off_from_reader,
    load_off_from_str,
};
