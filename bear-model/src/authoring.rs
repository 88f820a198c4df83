//! Editing helpers for building models by hand.
//!
//! Compiled data is trusted by the runtime types; the values entered through
//! these helpers are not, so they are sanitized on the way in.

use crate::{Action, Easing, Error, MarkPlacement, PlacementChannel, Snapshot};
use std::ops::Deref;

/// Mutable access to one placement of a snapshot, keyed by mark label.
#[derive(Debug)]
pub struct PlacementEditor<'a> {
    placement: &'a mut MarkPlacement,
}

impl PlacementEditor<'_> {
    pub fn set_position(&mut self, x: f64, y: f64) -> &mut Self {
        self.placement.set_position(x, y);
        self
    }

    pub fn set_x(&mut self, x: f64) -> &mut Self {
        self.placement.x = x;
        self
    }

    pub fn set_y(&mut self, y: f64) -> &mut Self {
        self.placement.y = y;
        self
    }

    /// Negative widths are set to zero.
    pub fn set_width(&mut self, width: f64) -> &mut Self {
        self.placement.width = width.max(0.0);
        self
    }

    /// Negative heights are set to zero.
    pub fn set_height(&mut self, height: f64) -> &mut Self {
        self.placement.height = height.max(0.0);
        self
    }

    pub fn set_size(&mut self, width: f64, height: f64) -> &mut Self {
        self.set_width(width).set_height(height)
    }

    pub fn set_depth(&mut self, depth: i32) -> &mut Self {
        self.placement.depth = depth;
        self
    }

    pub fn set_angle(&mut self, angle: f64) -> &mut Self {
        self.placement.angle = angle;
        self
    }

    pub fn set_visibility(&mut self, visible: bool) -> &mut Self {
        self.placement.visible = visible;
        self
    }

    pub fn set_collision_function(&mut self, name: impl Into<String>) -> &mut Self {
        self.placement.collision_function = name.into();
        self
    }

    pub fn set_easing(&mut self, channel: PlacementChannel, easing: Easing) -> &mut Self {
        self.placement.set_easing(channel, easing);
        self
    }
}

impl Deref for PlacementEditor<'_> {
    type Target = MarkPlacement;

    fn deref(&self) -> &MarkPlacement {
        self.placement
    }
}

/// An axis-aligned box, in the coordinates of a snapshot.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

impl Snapshot {
    pub fn placement_by_label(&self, action: &Action, label: &str) -> Result<&MarkPlacement, Error> {
        let id = action
            .get_mark_id(label)
            .ok_or_else(|| action.unknown_mark(label))?;
        self.get_mark_placement(id)
    }

    /// The box of the snapshot extended to contain the largest sprite of
    /// every mark, centered on the mark's position.
    pub fn bounds(&self, action: &Action) -> Bounds {
        let frame = Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: self.width,
            max_y: self.height,
        };

        self.placements().iter().fold(frame, |bounds, p| {
            let (w, h) = action
                .mark(p.mark_id)
                .ok()
                .filter(|m| m.has_animation())
                .and_then(|m| m.animation())
                .map(|a| a.max_size())
                .unwrap_or((0.0, 0.0));
            bounds.union(Bounds {
                min_x: p.x - w / 2.0,
                min_y: p.y - h / 2.0,
                max_x: p.x + w / 2.0,
                max_y: p.y + h / 2.0,
            })
        })
    }
}

impl Action {
    /// Edits the placement of the mark `label` in the snapshot at `date`.
    pub fn edit_placement(&mut self, date: f64, label: &str) -> Result<PlacementEditor<'_>, Error> {
        let id = self
            .get_mark_id(label)
            .ok_or_else(|| self.unknown_mark(label))?;
        let placement = self.snapshot_at_mut(date)?.get_mark_placement_mut(id)?;
        Ok(PlacementEditor { placement })
    }

    /// Moves the snapshot at `from` to the date `to`.
    pub fn move_snapshot(&mut self, from: f64, to: f64) -> Result<(), Error> {
        if !self.has_snapshot_date(from) {
            return Err(self.unknown_snapshot(from));
        }
        if from == to {
            return Ok(());
        }
        if from == 0.0 {
            return Err(Error::InitialSnapshotRemoval {
                action: self.name().to_string(),
            });
        }
        if self.has_snapshot_date(to) {
            return Err(Error::DuplicateSnapshotDate {
                action: self.name().to_string(),
                date: to,
            });
        }

        let mut snapshot = self.remove_snapshot(from)?;
        snapshot.set_date(to);
        if let Err(e) = self.add_snapshot(snapshot.clone()) {
            snapshot.set_date(from);
            self.add_snapshot(snapshot)?;
            return Err(e);
        }
        Ok(())
    }

    /// The union of the bounds of all the snapshots.
    pub fn bounds(&self) -> Bounds {
        self.snapshots()
            .iter()
            .map(|s| s.bounds(self))
            .reduce(Bounds::union)
            .unwrap_or(Bounds {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 100.0,
                max_y: 100.0,
            })
    }
}
