//! Integer grid coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Heading;

/// Grid cell coordinate. Doubles as the `{x, y}` wire object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub const ORIGIN: GridPosition = GridPosition { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Neighbouring cell one step along `heading`; clamped at the `i32` edge
    pub fn stepped(self, heading: Heading) -> Self {
        let (dx, dy) = heading.unit_step();
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Saturates at `u32::MAX` for opposite corners of the grid
    pub fn manhattan_distance(self, other: GridPosition) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Believed grid position.
///
/// Only advanced after a move that was cleared by the distance sensor, and
/// only by one cell.
#[derive(Clone, Debug, Default)]
pub struct PositionModel {
    position: GridPosition,
}

impl PositionModel {
    pub fn new(start: GridPosition) -> Self {
        Self { position: start }
    }

    pub fn position(&self) -> GridPosition {
        self.position
    }

    /// Record a completed one-cell move along `heading`
    pub fn advance(&mut self, heading: Heading) -> GridPosition {
        self.position = self.position.stepped(heading);
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepped_uses_screen_axes() {
        let p = GridPosition::new(2, 3);
        assert_eq!(p.stepped(Heading::East), GridPosition::new(3, 3));
        assert_eq!(p.stepped(Heading::West), GridPosition::new(1, 3));
        assert_eq!(p.stepped(Heading::South), GridPosition::new(2, 4));
        assert_eq!(p.stepped(Heading::North), GridPosition::new(2, 2));
    }

    #[test]
    fn test_advance_moves_exactly_one_cell() {
        let mut model = PositionModel::new(GridPosition::ORIGIN);
        let before = model.position();
        let after = model.advance(Heading::North);
        assert_eq!(before.manhattan_distance(after), 1);
        assert_eq!(model.position(), GridPosition::new(0, -1));
    }

    #[test]
    fn test_stepped_clamps_at_grid_edge() {
        let corner = GridPosition::new(i32::MIN, i32::MAX);
        assert_eq!(corner.stepped(Heading::West), corner);
        assert_eq!(corner.stepped(Heading::South), corner);
        assert_eq!(
            corner.stepped(Heading::East),
            GridPosition::new(i32::MIN + 1, i32::MAX)
        );
        assert_eq!(
            GridPosition::new(1, 0).manhattan_distance(GridPosition::new(i32::MIN, 0)),
            2_147_483_649
        );
        assert_eq!(
            GridPosition::new(i32::MIN, i32::MIN).manhattan_distance(GridPosition::new(i32::MAX, i32::MAX)),
            u32::MAX
        );
    }

    #[test]
    fn test_wire_format() {
        let p: GridPosition = serde_json::from_str(r#"{"x": -4, "y": 7}"#).unwrap();
        assert_eq!(p, GridPosition::new(-4, 7));
        assert_eq!(
            serde_json::to_string(&GridPosition::new(1, 2)).unwrap(),
            r#"{"x":1,"y":2}"#
        );
        assert_eq!(p.to_string(), "(-4, 7)");
    }
}
