use super::events::EventSink;
use crate::{Action, AnimationPlayer, Error, MarkId, PlaybackListener, Snapshot, Sprite};
use std::sync::Arc;

/// Smallest step returned by [`ActionPlayer::duration_until_next`], so that a
/// host stepping from event to event always moves forward.
pub const MIN_DURATION_UNTIL_NEXT: f64 = 0.001;

/// Plays a single action: the date in the action, the current snapshot and
/// the animation of every mark.
///
/// The snapshot function and sound are reported to the listener once, when
/// the playback moves onto the snapshot.
pub struct ActionPlayer {
    action: Option<Arc<Action>>,
    date: f64,
    snapshot: Option<usize>,
    players: Vec<Option<AnimationPlayer>>,
    sprites: Vec<Option<Sprite>>,
    events: EventSink,
}

impl Default for ActionPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionPlayer {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    /// A player picking the snapshot sounds with `rng`.
    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            action: None,
            date: 0.0,
            snapshot: None,
            players: Vec::new(),
            sprites: Vec::new(),
            events: EventSink::new(rng),
        }
    }

    pub fn set_listener<L: PlaybackListener + 'static>(&mut self, listener: L) {
        self.events.set_listener(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.events.clear_listener();
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_deref()
    }

    /// Starts `action` from date zero and reports its first snapshot.
    pub fn set_action(&mut self, action: Arc<Action>) {
        self.action = Some(action);
        self.reset();
        self.report_current_snapshot();
    }

    pub fn clear_action(&mut self) {
        self.action = None;
        self.reset();
    }

    /// Moves back to date zero and restarts the animations of the marks.
    /// Nothing is reported.
    pub fn reset(&mut self) {
        self.date = 0.0;
        self.players.clear();
        self.sprites.clear();
        self.snapshot = None;

        if let Some(action) = &self.action {
            self.players = action
                .marks()
                .iter()
                .map(|m| {
                    m.has_animation()
                        .then(|| m.animation().cloned().map(AnimationPlayer::new))
                        .flatten()
                })
                .collect();
            self.snapshot = action.snapshot_index_at_or_before(0.0);
        }

        self.fill_sprites();
    }

    pub fn date(&self) -> f64 {
        self.date
    }

    pub fn is_finished(&self) -> bool {
        match &self.action {
            Some(action) => self.date >= action.duration(),
            None => true,
        }
    }

    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        let action = self.action.as_ref()?;
        self.snapshot.map(|i| &action.snapshots()[i])
    }

    /// The sprite to display for the mark, with the angle of its placement
    /// added when the mark applies its angle to the animation.
    pub fn get_current_sprite_for(&self, mark: MarkId) -> Option<&Sprite> {
        self.sprites.get(mark).and_then(Option::as_ref)
    }

    /// Time before something changes: a snapshot is reached, the action ends
    /// or the frame of an animation changes.
    pub fn duration_until_next(&self) -> f64 {
        let Some(action) = &self.action else {
            return MIN_DURATION_UNTIL_NEXT;
        };

        let until_end = action.duration() - self.date;
        let next_snapshot = action
            .get_snapshot_after(self.date)
            .map(|s| (s.date() - self.date).min(until_end));
        let mut result = next_snapshot.unwrap_or(until_end);

        for player in self.players.iter().flatten() {
            result = result.min(player.duration_until_next());
        }

        result = result.max(MIN_DURATION_UNTIL_NEXT);

        match next_snapshot {
            Some(d) => result.min(d),
            None => result,
        }
    }

    /// Advances to the next change reported by [`Self::duration_until_next`].
    pub fn next(&mut self) -> Result<(), Error> {
        let d = self.duration_until_next();
        self.next_by(d)
    }

    /// Advances the playback by `elapsed` seconds. The date keeps moving past
    /// the end of the action; the animations do not.
    pub fn next_by(&mut self, elapsed: f64) -> Result<(), Error> {
        self.advance(elapsed, true)
    }

    /// Moves to `date`. Going backward replays the action from the start,
    /// and only the snapshot where the playback lands is reported, if it
    /// differs from the one before the move.
    pub fn set_date(&mut self, date: f64) -> Result<(), Error> {
        check_time(date)?;

        if date >= self.date {
            return self.advance(date - self.date, true);
        }

        let previous = self.snapshot;
        self.reset();
        self.advance(date, false)?;

        if self.snapshot != previous {
            self.report_current_snapshot();
        }

        Ok(())
    }

    fn advance(&mut self, elapsed: f64, report: bool) -> Result<(), Error> {
        check_time(elapsed)?;

        let Some(action) = self.action.clone() else {
            return Ok(());
        };

        let end = self.date + elapsed;
        for (id, player) in self.players.iter_mut().enumerate() {
            if let Some(player) = player {
                player.next(action.accumulated_mark_visibility(id, self.date, end)?);
            }
        }

        self.date = end;

        let previous = self.snapshot;
        self.snapshot = action.snapshot_index_at_or_before(self.date);

        if report {
            let first = previous.map_or(0, |i| i + 1);
            if let Some(last) = self.snapshot {
                for snapshot in action.snapshots().get(first..=last).unwrap_or_default() {
                    self.events.snapshot_reached(&action, snapshot);
                }
            }
        }

        self.fill_sprites();
        Ok(())
    }

    fn report_current_snapshot(&mut self) {
        if let (Some(action), Some(i)) = (&self.action, self.snapshot) {
            self.events.snapshot_reached(action, &action.snapshots()[i]);
        }
    }

    fn fill_sprites(&mut self) {
        let Some(action) = &self.action else {
            self.sprites.clear();
            return;
        };
        let snapshot = self.snapshot.map(|i| &action.snapshots()[i]);

        self.sprites = self
            .players
            .iter()
            .enumerate()
            .map(|(id, player)| {
                let mut sprite = player.as_ref()?.sprite()?;
                let apply_angle = action.mark(id).is_ok_and(|m| m.apply_angle_to_animation);
                if apply_angle {
                    if let Some(p) = snapshot.and_then(|s| s.get_mark_placement(id).ok()) {
                        sprite.angle += p.angle;
                    }
                }
                Some(sprite)
            })
            .collect();
    }
}

pub(crate) fn check_time(value: f64) -> Result<(), Error> {
    if value.is_nan() || value < 0.0 {
        return Err(Error::InvalidValue {
            message: format!("time must be >= 0, got {value}"),
        });
    }
    Ok(())
}
