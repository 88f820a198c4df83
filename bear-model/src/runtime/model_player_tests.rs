use crate::{
    Action, Animation, AnimationFrame, Mark, ModelActor, ModelPlayer, ModelPlayerOptions,
    PlaybackEvent, SoundDescription, Sprite,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn assert_approx(actual: f64, expected: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-9,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn frames(prefix: &str, count: usize) -> Animation {
    Animation::new(
        (0..count)
            .map(|i| AnimationFrame {
                sprite: Sprite::new(format!("{prefix}{i}.png"), 2.0, 2.0),
                duration: 1.0,
            })
            .collect(),
    )
}

/// "walk" lasts 2 seconds, moves the arm from x=0 to x=10 in its first second
/// and continues with "idle", where the arm rests at x=4.
fn actor() -> ModelActor {
    let mut walk = Action::new("walk", 2.0)
        .with_next("idle")
        .with_sound(SoundDescription::new(["walk.ogg"], false));
    walk.add_mark(Mark::new("arm")).unwrap();
    walk.add_mark(Mark::new("leg")).unwrap();
    walk.snapshot_at_mut(0.0).unwrap().function = "step_left".to_string();

    let mut s = walk.create_snapshot(1.0);
    s.function = "step_right".to_string();
    walk.add_snapshot(s).unwrap();
    walk.edit_placement(1.0, "arm").unwrap().set_x(10.0);

    let mut idle = Action::new("idle", 1.0);
    idle.add_mark(Mark::new("arm")).unwrap();
    idle.snapshot_at_mut(0.0).unwrap().function = "rest".to_string();
    idle.edit_placement(0.0, "arm").unwrap().set_x(4.0);

    let mut actor = ModelActor::new();
    actor.add_action(walk);
    actor.add_action(idle);
    actor
}

fn recorder(player: &mut ModelPlayer) -> Rc<RefCell<Vec<PlaybackEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    player.set_listener(move |e: &PlaybackEvent| sink.borrow_mut().push(e.clone()));
    events
}

fn functions(events: &RefCell<Vec<PlaybackEvent>>) -> Vec<String> {
    events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::Function { name, .. } => Some(name.clone()),
            PlaybackEvent::Sound { .. } => None,
        })
        .collect()
}

#[test]
fn unknown_action_cannot_start() {
    let mut player = ModelPlayer::new(Arc::new(actor()));
    assert!(player.start_action("run").unwrap_err().is_not_found());
    assert!(player.current_action_name().is_none());
    assert!(player.is_finished());
}

#[test]
fn progress_reports_snapshots_and_chains_actions() {
    let mut player = ModelPlayer::new(Arc::new(actor()));
    let events = recorder(&mut player);

    player.start_action("walk").unwrap();
    assert_eq!(functions(&events), vec!["step_left"]);

    player.progress(1.0).unwrap();
    assert_eq!(functions(&events), vec!["step_left", "step_right"]);
    assert_eq!(player.current_snapshot().unwrap().date(), 1.0);

    player.progress(1.5).unwrap();
    assert_eq!(functions(&events), vec!["step_left", "step_right", "rest"]);
    assert_eq!(player.current_action_name(), Some("idle"));
    assert_approx(player.date(), 0.5);

    player.progress(1.0).unwrap();
    assert!(player.is_finished());
    assert_approx(player.date(), 1.0);

    player.progress(1.0).unwrap();
    assert_eq!(functions(&events).len(), 3);
}

#[test]
fn action_sound_comes_first() {
    let options = ModelPlayerOptions::default();
    let mut player =
        ModelPlayer::with_options(Arc::new(actor()), options, fastrand::Rng::with_seed(1));
    let events = recorder(&mut player);
    player.start_action("walk").unwrap();

    let events = events.borrow();
    assert_eq!(
        events[0],
        PlaybackEvent::Sound {
            action: "walk".to_string(),
            file: "walk.ogg".to_string(),
            global: false,
        }
    );
    assert!(matches!(&events[1], PlaybackEvent::Function { name, .. } if name == "step_left"));
}

#[test]
fn placements_are_tweened_between_snapshots() {
    let mut player = ModelPlayer::new(Arc::new(actor()));
    player.start_action("walk").unwrap();
    assert_approx(player.mark_placement("arm").unwrap().x, 0.0);

    player.progress(0.25).unwrap();
    assert_approx(player.mark_placement("arm").unwrap().x, 2.5);
    assert_eq!(player.placements().len(), 2);
    assert!(player.mark_placement("tail").is_none());
}

#[test]
fn placements_are_tweened_toward_the_next_action() {
    let mut player = ModelPlayer::new(Arc::new(actor()));
    player.start_action("walk").unwrap();
    player.progress(1.5).unwrap();

    // Halfway from x=10 in "walk" to x=4 in "idle".
    assert_approx(player.mark_placement("arm").unwrap().x, 7.0);
    // "leg" is not in "idle".
    assert_approx(player.mark_placement("leg").unwrap().x, 0.0);
}

#[test]
fn switch_keeps_the_current_action_running() {
    let mut player = ModelPlayer::new(Arc::new(actor()));
    player.start_action("walk").unwrap();
    player.progress(0.5).unwrap();

    player.switch_to_action("walk").unwrap();
    assert_approx(player.date(), 0.5);

    player.start_action("walk").unwrap();
    assert_approx(player.date(), 0.0);

    player.switch_to_action("idle").unwrap();
    assert_eq!(player.current_action_name(), Some("idle"));
}

#[test]
fn missing_next_action_stops_the_playback() {
    let mut actor = ModelActor::new();
    actor.add_action(Action::new("jump", 1.0).with_next("fall"));

    let mut player = ModelPlayer::new(Arc::new(actor));
    player.start_action("jump").unwrap();
    player.progress(2.0).unwrap();

    assert!(player.is_finished());
    assert_eq!(player.current_action_name(), Some("jump"));
    assert_approx(player.date(), 1.0);
}

#[test]
fn instant_action_cycle_is_cut() {
    let mut actor = ModelActor::new();
    actor.add_action(Action::new("a", 0.0).with_next("b"));
    actor.add_action(Action::new("b", 0.0).with_next("a"));

    let options = ModelPlayerOptions {
        max_instant_switches: 3,
    };
    let mut player = ModelPlayer::with_options(Arc::new(actor), options, fastrand::Rng::new());
    player.start_action("a").unwrap();
    player.progress(1.0).unwrap();

    assert!(player.is_finished());
    assert_eq!(player.current_action_name(), Some("b"));
}

#[test]
fn switch_after_a_snapshot_at_the_end_is_not_instant() {
    let mut blink = Action::new("blink", 1.0).with_next("blink");
    blink.add_snapshot(blink.create_snapshot(1.0)).unwrap();
    let mut actor = ModelActor::new();
    actor.add_action(blink);

    let options = ModelPlayerOptions {
        max_instant_switches: 0,
    };
    let mut player = ModelPlayer::with_options(Arc::new(actor), options, fastrand::Rng::new());
    player.start_action("blink").unwrap();
    player.progress(2.5).unwrap();

    assert!(!player.is_finished());
    assert_eq!(player.current_action_name(), Some("blink"));
    assert_approx(player.date(), 0.5);
}

#[test]
fn looping_action_runs_forever() {
    let mut actor = ModelActor::new();
    actor.add_action(Action::new("spin", 1.0).with_next("spin"));

    let mut player = ModelPlayer::new(Arc::new(actor));
    player.start_action("spin").unwrap();
    player.progress(3.25).unwrap();

    assert!(!player.is_finished());
    assert_approx(player.date(), 0.25);
}

#[test]
fn hidden_marks_can_pause_their_animation() {
    let mut action = Action::new("hide", 4.0);
    let mut paused = Mark::new("paused").with_animation(frames("p", 4));
    paused.pause_animation_when_hidden = true;
    action.add_mark(paused).unwrap();
    action
        .add_mark(Mark::new("running").with_animation(frames("r", 4)))
        .unwrap();

    let mut hidden = action.create_snapshot(1.0);
    for id in 0..2 {
        hidden.get_mark_placement_mut(id).unwrap().visible = false;
    }
    action.add_snapshot(hidden).unwrap();

    let mut actor = ModelActor::new();
    actor.add_action(action);
    let mut player = ModelPlayer::new(Arc::new(actor));
    player.start_action("hide").unwrap();
    player.progress(3.0).unwrap();

    assert_eq!(player.current_sprite("paused").unwrap().image, "p1.png");
    assert_eq!(player.current_sprite("running").unwrap().image, "r3.png");
}

#[test]
fn restarting_an_action_resets_finite_animations() {
    let mut action = Action::new("attack", 1.0);
    action
        .add_mark(Mark::new("blade").with_animation(frames("b", 3).with_loops(1)))
        .unwrap();
    action
        .add_mark(Mark::new("glow").with_animation(frames("g", 3)))
        .unwrap();

    let mut actor = ModelActor::new();
    actor.add_action(action);
    let mut player = ModelPlayer::new(Arc::new(actor));
    player.start_action("attack").unwrap();
    player.progress(1.0).unwrap();
    assert_eq!(player.current_sprite("blade").unwrap().image, "b1.png");
    assert_eq!(player.current_sprite("glow").unwrap().image, "g1.png");

    player.start_action("attack").unwrap();
    assert_eq!(player.current_sprite("blade").unwrap().image, "b0.png");
    assert_eq!(player.current_sprite("glow").unwrap().image, "g1.png");
}

#[test]
fn substitutes_do_not_touch_the_shared_actor() {
    let shared = Arc::new(actor());
    let mut player = ModelPlayer::new(shared.clone());
    player.start_action("walk").unwrap();
    assert!(player.current_sprite("arm").is_none());

    player.set_global_substitute("arm", frames("axe", 1));
    assert_eq!(player.current_sprite("arm").unwrap().image, "axe0.png");
    assert!(
        shared.get_action("walk").unwrap().get_mark("arm").unwrap().substitute.is_none()
    );

    player.switch_to_action("idle").unwrap();
    assert_eq!(player.current_sprite("arm").unwrap().image, "axe0.png");

    player.remove_global_substitute("arm");
    assert!(player.current_sprite("arm").is_none());
}

#[test]
fn negative_progress_is_rejected() {
    let mut player = ModelPlayer::new(Arc::new(actor()));
    player.start_action("walk").unwrap();
    assert!(player.progress(-1.0).is_err());
    assert_eq!(player.date(), 0.0);
}
