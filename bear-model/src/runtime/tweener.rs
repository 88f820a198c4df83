use crate::{Action, Easing, Error, MarkId, MarkPlacement, PlacementChannel, Snapshot};

#[derive(Clone, Debug)]
struct ChannelTween {
    index: usize,
    channel: PlacementChannel,
    from: f64,
    to: f64,
    easing: Easing,
}

/// The placements of the marks of a snapshot, moving toward another snapshot
/// over a given duration.
///
/// The target snapshot may belong to another action. Marks are matched by
/// label and the target positions are expressed in the frame of the initial
/// snapshot according to the alignment of the target. Only the geometric
/// channels move; the other attributes stay those of the initial snapshot.
#[derive(Clone, Debug)]
pub struct SnapshotTweener {
    placements: Vec<MarkPlacement>,
    tweens: Vec<ChannelTween>,
    duration: f64,
    elapsed: f64,
}

impl SnapshotTweener {
    /// Placements that do not move.
    pub fn fixed(init: &Snapshot) -> Self {
        Self {
            placements: init.placements().to_vec(),
            tweens: Vec::new(),
            duration: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn new(
        init: &Snapshot,
        end: &Snapshot,
        init_action: &Action,
        end_action: &Action,
        duration: f64,
    ) -> Self {
        let mut result = Self::fixed(init);
        result.duration = duration;

        for (index, placement) in init.placements().iter().enumerate() {
            let Ok(mark) = init_action.mark(placement.mark_id) else {
                continue;
            };
            let Some(end_id) = end_action.get_mark_id(mark.label()) else {
                continue;
            };
            let Ok(target) = mark_in_local_coordinates(init, end, end_id) else {
                continue;
            };

            for channel in PlacementChannel::ALL {
                let from = placement.channel(channel);
                let to = target.channel(channel);
                if from != to {
                    result.tweens.push(ChannelTween {
                        index,
                        channel,
                        from,
                        to,
                        easing: placement.easing(channel),
                    });
                }
            }
        }

        result
    }

    pub fn placements(&self) -> &[MarkPlacement] {
        &self.placements
    }

    pub fn get_mark_placement(&self, id: MarkId) -> Option<&MarkPlacement> {
        self.placements.get(id)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.tweens.is_empty() || self.elapsed >= self.duration
    }

    /// Moves the placements `elapsed_time` further. The values depend only on
    /// the total time elapsed since the creation of the tweener.
    pub fn update(&mut self, elapsed_time: f64) {
        if elapsed_time <= 0.0 || self.tweens.is_empty() {
            return;
        }

        self.elapsed += elapsed_time;
        let ratio = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        };

        for tween in &self.tweens {
            let value = if ratio >= 1.0 {
                tween.to
            } else {
                tween.easing.interpolate(tween.from, tween.to, ratio)
            };
            self.placements[tween.index].set_channel(tween.channel, value);
        }
    }
}

/// The placement of the mark `end_id` of `end`, with its position moved into
/// the frame of `init`.
pub fn mark_in_local_coordinates(
    init: &Snapshot,
    end: &Snapshot,
    end_id: MarkId,
) -> Result<MarkPlacement, Error> {
    let (dx, dy) = end.alignment_offset(init);
    let mut result = end.get_mark_placement(end_id)?.clone();
    result.x -= dx;
    result.y -= dy;
    Ok(result)
}
