//! Grid navigation: heading, position and single-step routing.

mod heading;
mod position;

pub use heading::{Heading, HeadingModel};
pub use position::{GridPosition, PositionModel};

use std::cmp::Ordering;

/// Heading for the next single-cell step from `current` toward `target`.
///
/// Manhattan routing with the X axis resolved completely before Y is touched.
/// Returns `None` when already at the target.
pub fn next_heading(current: GridPosition, target: GridPosition) -> Option<Heading> {
    match target.x.cmp(&current.x) {
        Ordering::Greater => Some(Heading::East),
        Ordering::Less => Some(Heading::West),
        Ordering::Equal => match target.y.cmp(&current.y) {
            Ordering::Greater => Some(Heading::South),
            Ordering::Less => Some(Heading::North),
            Ordering::Equal => None,
        },
    }
}
