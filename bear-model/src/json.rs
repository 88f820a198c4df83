//! JSON model descriptions.
//!
//! ```json
//! {
//!   "animations": [{ "frames": [{ "image": "head.png", "width": 8, "height": 8, "duration": 0.1 }] }],
//!   "actions": [{
//!     "name": "idle",
//!     "duration": 2,
//!     "next": "idle",
//!     "marks": [{ "label": "head", "animation": 0 }],
//!     "snapshots": [{
//!       "date": 0,
//!       "x_alignment": "align_left",
//!       "placements": [{ "mark": "head", "x": 4, "y": 12, "x_easing": "sine:in_out" }]
//!     }]
//!   }]
//! }
//! ```
//!
//! Placements are keyed by mark label. A mark with no placement in a snapshot
//! gets the default placement.

use crate::animation::animation_index;
use crate::{
    Action, Animation, AnimationFrame, Easing, Error, HorizontalAlignment, Mark, MarkPlacement,
    ModelActor, Snapshot, SoundDescription, Sprite, VerticalAlignment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
struct Root {
    #[serde(default)]
    animations: Vec<AnimationDef>,
    #[serde(default)]
    actions: Vec<ActionDef>,
}

#[derive(Debug, Deserialize, Serialize)]
struct AnimationDef {
    frames: Vec<FrameDef>,
    #[serde(default)]
    loops: u32,
    #[serde(default)]
    first_index: usize,
    #[serde(default)]
    last_index: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize)]
struct FrameDef {
    image: String,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    angle: f64,
    duration: f64,
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct SoundDef {
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    global: bool,
}

fn default_true() -> bool {
    true
}

fn default_size() -> f64 {
    10.0
}

fn default_x_alignment() -> String {
    HorizontalAlignment::Left.name().to_string()
}

fn default_y_alignment() -> String {
    VerticalAlignment::Bottom.name().to_string()
}

fn default_easing() -> String {
    Easing::IDENTITY.to_string()
}

#[derive(Debug, Deserialize, Serialize)]
struct ActionDef {
    name: String,
    duration: f64,
    #[serde(default)]
    next: String,
    #[serde(default)]
    sound: SoundDef,
    #[serde(default)]
    marks: Vec<MarkDef>,
    #[serde(default)]
    snapshots: Vec<SnapshotDef>,
}

#[derive(Debug, Deserialize, Serialize)]
struct MarkDef {
    label: String,
    #[serde(default)]
    animation: Option<usize>,
    #[serde(default)]
    apply_angle_to_animation: bool,
    #[serde(default)]
    pause_animation_when_hidden: bool,
    #[serde(default = "default_true")]
    reset_animation_with_action: bool,
}

#[derive(Debug, Deserialize, Serialize)]
struct SnapshotDef {
    date: f64,
    #[serde(default)]
    function: String,
    #[serde(default)]
    sound: SoundDef,
    #[serde(default = "default_size")]
    width: f64,
    #[serde(default = "default_size")]
    height: f64,
    #[serde(default = "default_x_alignment")]
    x_alignment: String,
    #[serde(default)]
    x_alignment_value: f64,
    #[serde(default = "default_y_alignment")]
    y_alignment: String,
    #[serde(default)]
    y_alignment_value: f64,
    #[serde(default)]
    placements: Vec<PlacementDef>,
}

#[derive(Debug, Deserialize, Serialize)]
struct PlacementDef {
    mark: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    depth: i32,
    #[serde(default)]
    angle: f64,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    collision_function: String,
    #[serde(default = "default_easing")]
    x_easing: String,
    #[serde(default = "default_easing")]
    y_easing: String,
    #[serde(default = "default_easing")]
    width_easing: String,
    #[serde(default = "default_easing")]
    height_easing: String,
    #[serde(default = "default_easing")]
    angle_easing: String,
}

impl ModelActor {
    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        let root: Root = serde_json::from_str(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })?;

        let animations: Vec<Animation> = root.animations.into_iter().map(read_animation).collect();
        log::trace!("read {} model animations", animations.len());

        let mut actor = ModelActor::new();
        for def in root.actions {
            let action = read_action(def, &animations)?;
            log::debug!(
                "read model action '{}' ({} marks, {} snapshots)",
                action.name(),
                action.marks_count(),
                action.snapshots().len()
            );
            actor.add_action(action);
        }

        Ok(actor)
    }

    pub fn to_json_string(&self) -> Result<String, Error> {
        let mut animations = Vec::<&Animation>::new();
        let mut actions = Vec::new();

        for action in self.actions() {
            actions.push(write_action(action, &mut animations));
        }

        let root = Root {
            animations: animations.into_iter().map(write_animation).collect(),
            actions,
        };

        serde_json::to_string_pretty(&root).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })
    }
}

fn read_animation(def: AnimationDef) -> Animation {
    let frames: Vec<AnimationFrame> = def
        .frames
        .into_iter()
        .map(|f| AnimationFrame {
            sprite: Sprite {
                image: f.image,
                width: f.width,
                height: f.height,
                angle: f.angle,
            },
            duration: f.duration,
        })
        .collect();
    let last = frames.len().saturating_sub(1);

    Animation::new(frames)
        .with_loops(def.loops)
        .with_loop_range(def.first_index, def.last_index.unwrap_or(last))
}

fn read_sound(def: SoundDef) -> SoundDescription {
    SoundDescription::new(def.files, def.global)
}

fn read_action(def: ActionDef, animations: &[Animation]) -> Result<Action, Error> {
    let mut action = Action::new(def.name, 0.0)
        .with_next(def.next)
        .with_sound(read_sound(def.sound));
    action.set_duration(def.duration)?;

    for m in def.marks {
        let mut mark = Mark::new(m.label);
        mark.apply_angle_to_animation = m.apply_angle_to_animation;
        mark.pause_animation_when_hidden = m.pause_animation_when_hidden;
        mark.reset_with_action = m.reset_animation_with_action;
        if let Some(index) = m.animation {
            let animation = animations.get(index).ok_or_else(|| Error::JsonUnknownAnimation {
                action: action.name().to_string(),
                label: mark.label().to_string(),
                index,
            })?;
            mark.animation = Some(animation.clone());
        }
        action.add_mark(mark)?;
    }

    // The first snapshot at date 0 takes the place of the initial one.
    let mut replaced_initial = false;
    for s in def.snapshots {
        let snapshot = read_snapshot(s, &action)?;
        if snapshot.date() == 0.0 && !replaced_initial {
            replaced_initial = true;
            action.replace_snapshot(snapshot)?;
        } else {
            action.add_snapshot(snapshot)?;
        }
    }

    Ok(action)
}

fn read_snapshot(def: SnapshotDef, action: &Action) -> Result<Snapshot, Error> {
    let mut snapshot = action.create_snapshot(def.date);
    snapshot.function = def.function;
    snapshot.sound = read_sound(def.sound);
    snapshot.set_size(def.width, def.height);
    snapshot.x_alignment = HorizontalAlignment::from_name(&def.x_alignment)?;
    snapshot.x_alignment_value = def.x_alignment_value;
    snapshot.y_alignment = VerticalAlignment::from_name(&def.y_alignment)?;
    snapshot.y_alignment_value = def.y_alignment_value;

    for p in def.placements {
        let mark_id = action
            .get_mark_id(&p.mark)
            .ok_or_else(|| Error::JsonUnknownPlacementMark {
                action: action.name().to_string(),
                label: p.mark.clone(),
            })?;

        let mut placement = MarkPlacement::with_values(
            mark_id,
            p.x,
            p.y,
            p.width,
            p.height,
            p.depth,
            p.angle,
            p.visible,
            p.collision_function,
        );
        placement.x_easing = p.x_easing.parse()?;
        placement.y_easing = p.y_easing.parse()?;
        placement.width_easing = p.width_easing.parse()?;
        placement.height_easing = p.height_easing.parse()?;
        placement.angle_easing = p.angle_easing.parse()?;
        snapshot.set_mark_placement(placement)?;
    }

    Ok(snapshot)
}

fn write_animation(animation: &Animation) -> AnimationDef {
    AnimationDef {
        frames: animation
            .frames
            .iter()
            .map(|f| FrameDef {
                image: f.sprite.image.clone(),
                width: f.sprite.width,
                height: f.sprite.height,
                angle: f.sprite.angle,
                duration: f.duration,
            })
            .collect(),
        loops: animation.loops,
        first_index: animation.first_index,
        last_index: Some(animation.last_index),
    }
}

fn write_sound(sound: &SoundDescription) -> SoundDef {
    SoundDef {
        files: sound.files.iter().cloned().collect(),
        global: sound.global,
    }
}

fn write_action<'a>(action: &'a Action, animations: &mut Vec<&'a Animation>) -> ActionDef {
    let marks = action
        .marks()
        .iter()
        .map(|m| MarkDef {
            label: m.label().to_string(),
            animation: m.animation.as_ref().map(|a| animation_index(animations, a)),
            apply_angle_to_animation: m.apply_angle_to_animation,
            pause_animation_when_hidden: m.pause_animation_when_hidden,
            reset_animation_with_action: m.reset_with_action,
        })
        .collect();

    let snapshots = action
        .snapshots()
        .iter()
        .map(|s| SnapshotDef {
            date: s.date(),
            function: s.function.clone(),
            sound: write_sound(&s.sound),
            width: s.width,
            height: s.height,
            x_alignment: s.x_alignment.name().to_string(),
            x_alignment_value: s.x_alignment_value,
            y_alignment: s.y_alignment.name().to_string(),
            y_alignment_value: s.y_alignment_value,
            placements: s
                .placements()
                .iter()
                .map(|p| PlacementDef {
                    mark: action
                        .mark(p.mark_id)
                        .map(|m| m.label().to_string())
                        .unwrap_or_default(),
                    x: p.x,
                    y: p.y,
                    width: p.width,
                    height: p.height,
                    depth: p.depth,
                    angle: p.angle,
                    visible: p.visible,
                    collision_function: p.collision_function.clone(),
                    x_easing: p.x_easing.to_string(),
                    y_easing: p.y_easing.to_string(),
                    width_easing: p.width_easing.to_string(),
                    height_easing: p.height_easing.to_string(),
                    angle_easing: p.angle_easing.to_string(),
                })
                .collect(),
        })
        .collect();

    ActionDef {
        name: action.name().to_string(),
        duration: action.duration(),
        next: action.next.clone(),
        sound: write_sound(&action.sound),
        marks,
        snapshots,
    }
}
