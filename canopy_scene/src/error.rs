// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for rejected scene graph operations.

use core::fmt;

use crate::types::NodeId;

/// The node property a rejected value was meant for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    /// Local position.
    Position,
    /// Local scale.
    Scale,
    /// Local angle.
    Angle,
    /// Rotation pivot.
    RotationCenter,
    /// Rectangle size.
    Size,
    /// Offset passed to [`SceneGraph::set_position_relative_to`](crate::SceneGraph::set_position_relative_to).
    Offset,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Position => "position",
            Self::Scale => "scale",
            Self::Angle => "angle",
            Self::RotationCenter => "rotation center",
            Self::Size => "size",
            Self::Offset => "offset",
        };
        f.write_str(name)
    }
}

/// Errors returned by [`SceneGraph`](crate::SceneGraph) mutators.
///
/// Every error leaves the graph exactly as it was before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A geometry value was rejected (non-finite, negative size, or non-positive scale).
    InvalidGeometry {
        /// Which property the value was meant for.
        property: Property,
        /// Short description of the problem.
        reason: &'static str,
    },
    /// The node id is stale: the node was removed.
    DetachedNode(NodeId),
    /// The requested parent is the node itself or one of its descendants.
    CyclicReparent {
        /// Node being moved.
        node: NodeId,
        /// Requested new parent.
        parent: NodeId,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGeometry { property, reason } => {
                write!(f, "invalid {property}: {reason}")
            }
            Self::DetachedNode(id) => write!(f, "node {id:?} has been removed"),
            Self::CyclicReparent { node, parent } => {
                write!(f, "cannot reparent {node:?} under its own descendant {parent:?}")
            }
        }
    }
}

impl core::error::Error for Error {}
