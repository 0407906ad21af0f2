use thiserror::Error;

use crate::element::{EH, FH, HH, VH};

#[derive(Debug, Error)]
pub enum Error {
    // Properties.
    #[error("property is already borrowed")]
    BorrowedPropertyAccess,
    #[error("property '{0}' does not exist")]
    PropertyDoesNotExist(String),
    #[error("property '{0}' is reserved by the mesh")]
    ReservedProperty(String),
    #[error("a property named '{0}' already exists")]
    PropertyNameTaken(String),
    #[error("property '{0}' exists with a different type")]
    PropertyTypeMismatch(String),
    #[error("arrays of mismatched lengths {0} and {1}")]
    MismatchedArrayLengths(usize, usize),
    // Face insertion.
    #[error("a face needs at least 3 vertices, found {0}")]
    InvalidFaceDegree(usize),
    #[error("face has repeated vertices")]
    DegenerateFace,
    #[error("{0} is not a valid vertex")]
    InvalidVertex(VH),
    #[error("{0} is a complex vertex")]
    ComplexVertex(VH),
    #[error("{0} is a complex halfedge")]
    ComplexHalfedge(HH),
    #[error("cannot relink the patches around the new face")]
    PatchRelinkingFailed,
    // Edits.
    #[error("{0} cannot be flipped")]
    FlipNotAllowed(EH),
    #[error("{0} cannot be collapsed")]
    CollapseNotAllowed(HH),
    #[error("{0} is not a valid face")]
    InvalidFace(FH),
    #[error("cannot insert an edge after {0} and {1}")]
    InsertEdgeNotAllowed(HH, HH),
    // Topology check.
    #[error("{0} is not a valid halfedge")]
    InvalidHalfedge(HH),
    #[error("{0} is deleted but still referenced")]
    DeletedVertex(VH),
    #[error("{0} is deleted but still referenced")]
    DeletedHalfedge(HH),
    #[error("{0} is deleted but still referenced")]
    DeletedEdge(EH),
    #[error("{0} is deleted but still referenced")]
    DeletedFace(FH),
    #[error("outgoing halfedges of {0} are inconsistent")]
    InvalidOutgoingHalfedges(VH),
    #[error("outgoing halfedge of {0} is not on the boundary")]
    OutgoingHalfedgeNotBoundary(VH),
    #[error("{0} starts and ends at the same vertex")]
    DegenerateHalfedge(HH),
    #[error("next / prev links of {0} are inconsistent")]
    InvalidHalfedgeLink(HH),
    #[error("{0} is not found around its vertices")]
    InvalidHalfedgeVertexLink(HH),
    #[error("the loop containing {0} is broken")]
    InvalidLoopTopology(HH),
    #[error("{0} has a different face than the rest of its loop")]
    InconsistentFaceInLoop(HH),
    #[error("{0} and its halfedge {1} do not point to each other")]
    InvalidFaceHalfedgeLink(FH, HH),
}
