//! Layer (z-order) operations over the ordered element list.
//!
//! Index 0 is the bottom of the stack; the last index is drawn on top.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::element::{CanvasElement, ElementId};
use crate::error::CanvasError;

/// Direction for a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerDirection {
    /// Swap with the next-higher element.
    Up,
    /// Swap with the next-lower element.
    Down,
    /// Move to the top of the stack.
    Front,
    /// Move to the bottom of the stack.
    Back,
}

impl FromStr for LayerDirection {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "front" => Ok(Self::Front),
            "back" => Ok(Self::Back),
            other => Err(CanvasError::InvalidOperation(format!(
                "unknown layer direction '{other}'"
            ))),
        }
    }
}

impl fmt::Display for LayerDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Front => "front",
            Self::Back => "back",
        })
    }
}

/// Move the element with `id` in `direction`.
///
/// Returns `true` only if the order actually changed. Unknown IDs and moves
/// that are already satisfied (e.g. `Up` on the top-most element) leave the
/// slice untouched and return `false`, so callers can skip the redraw.
pub fn reorder(elements: &mut [CanvasElement], id: &ElementId, direction: LayerDirection) -> bool {
    let Some(index) = elements.iter().position(|e| &e.id == id) else {
        return false;
    };
    let last = elements.len() - 1;

    match direction {
        LayerDirection::Up if index < last => elements.swap(index, index + 1),
        LayerDirection::Down if index > 0 => elements.swap(index, index - 1),
        LayerDirection::Front if index < last => elements[index..].rotate_left(1),
        LayerDirection::Back if index > 0 => elements[..=index].rotate_right(1),
        _ => return false,
    }
    true
}

/// Whether `direction` would change the position of the element at `index`
/// in a stack of `len` elements.
#[must_use]
pub fn can_move(index: usize, len: usize, direction: LayerDirection) -> bool {
    match direction {
        LayerDirection::Up | LayerDirection::Front => index + 1 < len,
        LayerDirection::Down | LayerDirection::Back => index > 0,
    }
}
