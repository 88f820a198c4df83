use crate::{
    Action, Animation, AnimationFrame, Easing, EasingDirection, EasingFunction, Error,
    HorizontalAlignment, Mark, ModelActor, PlacementChannel, SoundDescription, Sprite,
    VerticalAlignment,
};

/// Writes compiled model values by hand.
#[derive(Default)]
struct Bytes(Vec<u8>);

impl Bytes {
    fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn f64(mut self, v: f64) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn bool(mut self, v: bool) -> Self {
        self.0.push(u8::from(v));
        self
    }

    fn str(self, v: &str) -> Self {
        let mut out = self.u32(v.len() as u32);
        out.0.extend_from_slice(v.as_bytes());
        out
    }

    fn placement(self, id: u32, x: f64, visible: bool) -> Self {
        self.u32(id)
            .f64(x)
            .u32(9)
            .u32(2) // quad:out
            .f64(0.0)
            .u32(8)
            .u32(1)
            .f64(3.0)
            .u32(8)
            .u32(1)
            .f64(4.0)
            .u32(8)
            .u32(1)
            .i32(-1)
            .f64(0.25)
            .u32(8)
            .u32(1)
            .bool(visible)
            .str("")
    }
}

fn compiled_model(major: u32, minor: u32) -> Vec<u8> {
    Bytes::default()
        .u32(major)
        .u32(minor)
        .u32(2)
        // animations
        .u32(1)
        .u32(1)
        .str("eye.png")
        .f64(5.0)
        .f64(3.0)
        .f64(0.0)
        .f64(0.5)
        .u32(0)
        .u32(0)
        .u32(0)
        // actions
        .u32(1)
        .str("look")
        .f64(3.0)
        .str("")
        .bool(false)
        .u32(1)
        .str("hum.ogg")
        // marks
        .u32(2)
        .str("eye")
        .bool(true)
        .bool(false)
        .u32(0)
        .str("lid")
        .bool(false)
        .bool(true)
        .u32(1)
        // snapshots
        .u32(2)
        .f64(0.0)
        .str("open")
        .f64(10.0)
        .f64(12.0)
        .str("align_right")
        .str("align_center")
        .f64(1.0)
        .f64(2.0)
        .bool(true)
        .u32(0)
        .placement(0, 1.0, true)
        .placement(1, 2.0, false)
        .f64(2.0)
        .str("")
        .f64(10.0)
        .f64(10.0)
        .str("align_left")
        .str("align_bottom")
        .f64(0.0)
        .f64(0.0)
        .bool(false)
        .u32(0)
        .placement(0, 6.0, true)
        .placement(1, 7.0, true)
        .0
}

#[test]
fn reads_a_compiled_model() {
    let actor = ModelActor::from_binary(&compiled_model(0, 6)).unwrap();
    let look = actor.get_action("look").unwrap();

    assert_eq!(look.duration(), 3.0);
    assert!(look.next_action().is_none());
    assert!(look.sound.files.contains("hum.ogg"));

    let eye = look.get_mark("eye").unwrap();
    assert!(eye.apply_angle_to_animation);
    assert_eq!(eye.animation.as_ref().unwrap().frames[0].sprite.image, "eye.png");
    let lid = look.get_mark("lid").unwrap();
    assert!(lid.pause_animation_when_hidden);
    assert!(lid.animation.is_none());

    let s0 = look.snapshot_at(0.0).unwrap();
    assert_eq!(s0.function(), Some("open"));
    assert_eq!((s0.width, s0.height), (10.0, 12.0));
    assert_eq!(s0.x_alignment, HorizontalAlignment::Right);
    assert_eq!(s0.y_alignment, VerticalAlignment::Center);
    assert_eq!((s0.x_alignment_value, s0.y_alignment_value), (1.0, 2.0));
    assert!(s0.sound.global);

    let p = s0.get_mark_placement(1).unwrap();
    assert_eq!((p.x, p.width, p.height, p.depth, p.angle), (2.0, 3.0, 4.0, -1, 0.25));
    assert!(!p.visible);
    assert_eq!(
        p.x_easing,
        Easing::new(EasingFunction::Quad, EasingDirection::Out)
    );

    assert_eq!(look.snapshot_at(2.0).unwrap().get_mark_placement(1).unwrap().x, 7.0);
}

#[test]
fn newer_minor_versions_are_accepted() {
    assert!(ModelActor::from_binary(&compiled_model(0, 9)).is_ok());
}

#[test]
fn unsupported_versions_are_rejected() {
    for (major, minor) in [(0, 5), (1, 6)] {
        let err = ModelActor::from_binary(&compiled_model(major, minor)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { .. }), "{err}");
    }
}

#[test]
fn truncated_input_is_rejected() {
    let bytes = compiled_model(0, 6);
    for len in [0, 5, 40, bytes.len() - 1] {
        let err = ModelActor::from_binary(&bytes[..len]).unwrap_err();
        assert!(matches!(err, Error::BinaryParse { .. }), "{len}: {err}");
    }
}

#[test]
fn huge_counts_are_rejected() {
    let bytes = Bytes::default().u32(0).u32(6).u32(0).u32(u32::MAX).0;
    let err = ModelActor::from_binary(&bytes).unwrap_err();
    assert!(matches!(err, Error::BinaryParse { .. }));
}

#[test]
fn bad_easing_code_is_rejected() {
    let mut bytes = compiled_model(0, 6);
    let tail = Bytes::default()
        .placement(0, 6.0, true)
        .placement(1, 7.0, true)
        .0;
    let start = bytes.len() - tail.len();
    // Function code of the x easing of the last snapshot's first placement.
    bytes[start + 12..start + 16].copy_from_slice(&42u32.to_be_bytes());

    let err = ModelActor::from_binary(&bytes).unwrap_err();
    assert!(matches!(err, Error::InvalidEasing { .. }));
}

fn initial_snapshot(bytes: Bytes, function: &str) -> Bytes {
    bytes
        .f64(0.0)
        .str(function)
        .f64(10.0)
        .f64(10.0)
        .str("align_left")
        .str("align_bottom")
        .f64(0.0)
        .f64(0.0)
        .bool(false)
        .u32(0)
}

#[test]
fn second_initial_snapshot_is_rejected() {
    let header = Bytes::default()
        .u32(0)
        .u32(6)
        .u32(0)
        // no animations, one action without marks
        .u32(0)
        .u32(1)
        .str("a")
        .f64(1.0)
        .str("")
        .bool(false)
        .u32(0)
        .u32(0);

    let single = initial_snapshot(Bytes(header.0.clone()).u32(1), "first").0;
    let actor = ModelActor::from_binary(&single).unwrap();
    let a = actor.get_action("a").unwrap();
    assert_eq!(a.snapshots().len(), 1);
    assert_eq!(a.snapshots()[0].function, "first");

    let twice = initial_snapshot(initial_snapshot(header.u32(2), "first"), "second").0;
    let err = ModelActor::from_binary(&twice).unwrap_err();
    assert!(matches!(err, Error::DuplicateSnapshotDate { date, .. } if date == 0.0));
}

#[test]
fn written_model_reads_back() {
    let blink = Animation::new(vec![
        AnimationFrame {
            sprite: Sprite::new("open.png", 4.0, 4.0),
            duration: 1.5,
        },
        AnimationFrame {
            sprite: Sprite::new("shut.png", 4.0, 1.0),
            duration: 0.1,
        },
    ])
    .with_loops(2);

    let mut look = Action::new("look", 2.0)
        .with_next("rest")
        .with_sound(SoundDescription::new(["a.ogg", "b.ogg"], true));
    look.add_mark(Mark::new("eye").with_animation(blink.clone()))
        .unwrap();
    look.add_mark(Mark::new("brow")).unwrap();
    look.add_snapshot(look.create_snapshot(1.0)).unwrap();
    look.edit_placement(1.0, "eye")
        .unwrap()
        .set_position(2.0, -3.0)
        .set_depth(4)
        .set_easing(
            PlacementChannel::Height,
            Easing::new(EasingFunction::Bounce, EasingDirection::InOut),
        );
    look.snapshot_at_mut(1.0).unwrap().y_alignment = VerticalAlignment::Top;

    let mut rest = Action::new("rest", 0.5);
    rest.add_mark(Mark::new("eye").with_animation(blink)).unwrap();

    let mut actor = ModelActor::new();
    actor.add_action(look);
    actor.add_action(rest);

    let bytes = actor.to_binary().unwrap();
    assert_eq!(ModelActor::from_binary(&bytes).unwrap(), actor);
}
