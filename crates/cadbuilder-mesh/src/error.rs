use cadbuilder_ir::IrError;
use thiserror::Error;

/// Errors from geometry extraction.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The GLB/GLTF data could not be decoded.
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    /// The file extension is not a mesh format we decode.
    #[error("unsupported format '{0}': only .glb and .gltf are decoded, convert other formats first")]
    UnsupportedFormat(String),

    /// The scene holds no triangles.
    #[error("no triangle geometry in scene")]
    NoTriangles,

    /// Extracted values did not form a valid geometry index.
    #[error("invalid extracted geometry: {0}")]
    Geometry(#[from] IrError),
}

/// Result type for extraction.
pub type Result<T> = std::result::Result<T, MeshError>;
