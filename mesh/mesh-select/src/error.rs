//! Error types for vertex selection.

use std::fmt;

use thiserror::Error;

/// Result type for selection operations.
pub type SelectResult<T> = Result<T, SelectError>;

/// Identifies which input mesh an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshRole {
    /// A mesh handed directly to a low-level builder.
    Unlabelled,
    /// The mesh whose vertices are being selected.
    Active,
    /// A selection mesh, by position in the selection list.
    Selection(usize),
}

impl fmt::Display for MeshRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlabelled => write!(f, "input"),
            Self::Active => write!(f, "active"),
            Self::Selection(index) => write!(f, "selection #{index}"),
        }
    }
}

/// Errors that can occur during vertex selection.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum SelectError {
    /// A mesh has no vertices, or no triangles where triangles are required.
    #[error("{mesh} mesh is empty ({vertex_count} vertices, {face_count} faces)")]
    EmptyMesh {
        /// The offending mesh.
        mesh: MeshRole,
        /// Number of vertices in the mesh.
        vertex_count: usize,
        /// Number of faces in the mesh.
        face_count: usize,
    },

    /// The list of selection meshes is empty.
    #[error("no selection meshes were provided")]
    NoSelectionInput,

    /// A parameter is outside its accepted range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A face references a vertex that does not exist.
    #[error("{mesh} mesh face {face} references vertex {vertex} (mesh has {vertex_count} vertices)")]
    InvalidFaceIndex {
        /// The offending mesh.
        mesh: MeshRole,
        /// Index of the face.
        face: usize,
        /// The out-of-range vertex index.
        vertex: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Two masks, or a mask and a host selection buffer, differ in length.
    #[error("mask length mismatch: expected {expected}, got {actual}")]
    MaskLengthMismatch {
        /// Length of the mask.
        expected: usize,
        /// Length of the other buffer.
        actual: usize,
    },
}

impl SelectError {
    /// Create an empty mesh error for an unlabelled mesh.
    #[must_use]
    pub const fn empty_mesh(vertex_count: usize, face_count: usize) -> Self {
        Self::EmptyMesh {
            mesh: MeshRole::Unlabelled,
            vertex_count,
            face_count,
        }
    }

    /// Create an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(details: impl Into<String>) -> Self {
        Self::InvalidParameter(details.into())
    }

    /// Attach the mesh role to errors that describe a single mesh.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn for_mesh(self, role: MeshRole) -> Self {
        match self {
            Self::EmptyMesh {
                vertex_count,
                face_count,
                ..
            } => Self::EmptyMesh {
                mesh: role,
                vertex_count,
                face_count,
            },
            Self::InvalidFaceIndex {
                face,
                vertex,
                vertex_count,
                ..
            } => Self::InvalidFaceIndex {
                mesh: role,
                face,
                vertex,
                vertex_count,
            },
            other => other,
        }
    }
}
