use super::action_player::check_time;
use super::events::EventSink;
use crate::{
    Action, Animation, AnimationPlayer, Error, Mark, MarkPlacement, ModelActor,
    PlaybackListener, Snapshot, SnapshotTweener, Sprite,
};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ModelPlayerOptions {
    /// Number of consecutive auto-next switches allowed without time passing,
    /// in a single call to [`ModelPlayer::progress`]. Past this limit the
    /// playback stops at the end of the current action.
    pub max_instant_switches: usize,
}

impl Default for ModelPlayerOptions {
    fn default() -> Self {
        Self {
            max_instant_switches: 16,
        }
    }
}

/// Plays the actions of a model, chaining them through their auto-next
/// action.
///
/// The actor is shared; substituting an animation on a player copies the
/// actor first if other players use it.
pub struct ModelPlayer {
    actor: Arc<ModelActor>,
    options: ModelPlayerOptions,
    action: Option<String>,
    date: f64,
    snapshot: usize,
    tweener: Option<SnapshotTweener>,
    // Animation players of each action played so far, indexed by mark id.
    animations: HashMap<String, Vec<Option<AnimationPlayer>>>,
    finished: bool,
    events: EventSink,
}

impl ModelPlayer {
    pub fn new(actor: Arc<ModelActor>) -> Self {
        Self::with_options(actor, ModelPlayerOptions::default(), fastrand::Rng::new())
    }

    pub fn with_options(
        actor: Arc<ModelActor>,
        options: ModelPlayerOptions,
        rng: fastrand::Rng,
    ) -> Self {
        Self {
            actor,
            options,
            action: None,
            date: 0.0,
            snapshot: 0,
            tweener: None,
            animations: HashMap::new(),
            finished: true,
            events: EventSink::new(rng),
        }
    }

    pub fn set_listener<L: PlaybackListener + 'static>(&mut self, listener: L) {
        self.events.set_listener(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.events.clear_listener();
    }

    pub fn actor(&self) -> &Arc<ModelActor> {
        &self.actor
    }

    pub fn options(&self) -> &ModelPlayerOptions {
        &self.options
    }

    pub fn current_action_name(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn current_action(&self) -> Option<&Action> {
        self.actor.get_action(self.action.as_deref()?).ok()
    }

    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.current_action()?.snapshots().get(self.snapshot)
    }

    /// Date in the current action.
    pub fn date(&self) -> f64 {
        self.date
    }

    /// Tells if the playback reached the end of an action with no action to
    /// continue with.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Plays the action `name` from its beginning, even if it is the current
    /// action.
    pub fn start_action(&mut self, name: &str) -> Result<(), Error> {
        self.actor.get_action(name)?;
        log::debug!("starting model action '{name}'");
        self.begin_action(name);
        Ok(())
    }

    /// Plays the action `name` unless it is already the current action.
    pub fn switch_to_action(&mut self, name: &str) -> Result<(), Error> {
        if self.action.as_deref() == Some(name) {
            return Ok(());
        }
        self.start_action(name)
    }

    pub fn stop(&mut self) {
        self.action = None;
        self.tweener = None;
        self.finished = true;
    }

    /// Advances the playback by `elapsed_time` seconds.
    ///
    /// Every snapshot reached is reported. At the end of an action the
    /// remaining time is spent in its auto-next action, if any.
    pub fn progress(&mut self, elapsed_time: f64) -> Result<(), Error> {
        check_time(elapsed_time)?;

        let actor = Arc::clone(&self.actor);
        let mut remaining = elapsed_time;
        let mut instant_switches = 0;
        // Time spent in the current action during this call.
        let mut consumed = false;

        while !self.finished {
            let Some(action) = self.action.as_deref().and_then(|n| actor.get_action(n).ok())
            else {
                self.finished = true;
                break;
            };

            let next_snapshot = action
                .snapshots()
                .get(self.snapshot + 1)
                .filter(|s| s.date() <= action.duration());
            let boundary = next_snapshot.map_or(action.duration(), Snapshot::date);
            let step = (boundary - self.date).max(0.0);

            if remaining < step {
                self.advance(action, remaining)?;
                break;
            }

            self.advance(action, step)?;
            remaining -= step;
            consumed |= step > 0.0;

            if let Some(snapshot) = next_snapshot {
                self.snapshot += 1;
                self.events.snapshot_reached(action, snapshot);
                self.tweener = self.create_tweener(&actor, action);
                continue;
            }

            let Some(next) = action.next_action() else {
                self.finished = true;
                break;
            };
            if !actor.has_action(next) {
                log::warn!(
                    "auto-next action '{next}' of '{}' is not in the model",
                    action.name()
                );
                self.finished = true;
                break;
            }

            if consumed {
                instant_switches = 0;
            } else {
                instant_switches += 1;
                if instant_switches > self.options.max_instant_switches {
                    log::warn!(
                        "stopping after {instant_switches} instant action switches at '{}'",
                        action.name()
                    );
                    self.finished = true;
                    break;
                }
            }

            log::debug!("model action '{}' continues with '{next}'", action.name());
            let next = next.to_string();
            self.begin_action(&next);
            consumed = false;
        }

        Ok(())
    }

    pub fn placements(&self) -> &[MarkPlacement] {
        self.tweener
            .as_ref()
            .map(SnapshotTweener::placements)
            .unwrap_or_default()
    }

    /// The current placement of the mark `label` of the current action.
    pub fn mark_placement(&self, label: &str) -> Option<&MarkPlacement> {
        let id = self.current_action()?.get_mark_id(label)?;
        self.tweener.as_ref()?.get_mark_placement(id)
    }

    /// The sprite to display for the mark `label` of the current action.
    pub fn current_sprite(&self, label: &str) -> Option<Sprite> {
        let action = self.current_action()?;
        let id = action.get_mark_id(label)?;
        let mut sprite = self
            .animations
            .get(action.name())?
            .get(id)?
            .as_ref()?
            .sprite()?;

        if action.mark(id).is_ok_and(|m| m.apply_angle_to_animation) {
            if let Some(p) = self.mark_placement(label) {
                sprite.angle += p.angle;
            }
        }

        Some(sprite)
    }

    /// Shows `animation` for the marks `label` of every action.
    pub fn set_global_substitute(&mut self, label: &str, animation: Animation) {
        Arc::make_mut(&mut self.actor).set_global_substitute(label, &animation);
        self.refresh_animations(label);
    }

    pub fn remove_global_substitute(&mut self, label: &str) {
        Arc::make_mut(&mut self.actor).remove_global_substitute(label);
        self.refresh_animations(label);
    }

    fn begin_action(&mut self, name: &str) {
        let actor = Arc::clone(&self.actor);
        let Ok(action) = actor.get_action(name) else {
            return;
        };

        self.action = Some(name.to_string());
        self.date = 0.0;
        self.snapshot = 0;
        self.finished = false;

        let players = self
            .animations
            .entry(name.to_string())
            .or_insert_with(|| new_players(action));
        for (mark, player) in action.marks().iter().zip(players.iter_mut()) {
            if let Some(player) = player {
                if mark.resets_animation_with_action() {
                    player.reset();
                }
            }
        }

        self.events.action_started(action);
        match action.snapshots().first() {
            Some(first) => {
                self.events.snapshot_reached(action, first);
                self.tweener = self.create_tweener(&actor, action);
            }
            None => self.tweener = None,
        }
    }

    fn create_tweener(&self, actor: &ModelActor, action: &Action) -> Option<SnapshotTweener> {
        let init = action.snapshots().get(self.snapshot)?;

        if let Some(end) = action.snapshots().get(self.snapshot + 1) {
            return Some(SnapshotTweener::new(
                init,
                end,
                action,
                action,
                end.date() - init.date(),
            ));
        }

        let next = action
            .next_action()
            .and_then(|n| actor.get_action(n).ok())
            .and_then(|a| a.first_snapshot().map(|s| (a, s)));

        Some(match next {
            Some((end_action, end)) => SnapshotTweener::new(
                init,
                end,
                action,
                end_action,
                action.duration() - init.date(),
            ),
            None => SnapshotTweener::fixed(init),
        })
    }

    fn advance(&mut self, action: &Action, elapsed: f64) -> Result<(), Error> {
        if elapsed <= 0.0 {
            return Ok(());
        }

        let from = self.date;
        let to = from + elapsed;

        if let Some(players) = self.animations.get_mut(action.name()) {
            for (id, (mark, player)) in action.marks().iter().zip(players.iter_mut()).enumerate() {
                let Some(player) = player else {
                    continue;
                };
                let d = if mark.pause_animation_when_hidden {
                    action.accumulated_mark_visibility(id, from, to)?
                } else {
                    elapsed
                };
                player.next(d);
            }
        }

        if let Some(tweener) = &mut self.tweener {
            tweener.update(elapsed);
        }

        self.date = to;
        Ok(())
    }

    fn refresh_animations(&mut self, label: &str) {
        for (name, players) in &mut self.animations {
            let Ok(action) = self.actor.get_action(name) else {
                continue;
            };
            let Some(id) = action.get_mark_id(label) else {
                continue;
            };
            if let (Some(slot), Ok(mark)) = (players.get_mut(id), action.mark(id)) {
                *slot = new_player(mark);
            }
        }
    }
}

fn new_players(action: &Action) -> Vec<Option<AnimationPlayer>> {
    action.marks().iter().map(new_player).collect()
}

fn new_player(mark: &Mark) -> Option<AnimationPlayer> {
    if !mark.has_animation() {
        return None;
    }
    mark.animation().cloned().map(AnimationPlayer::new)
}
