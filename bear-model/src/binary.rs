//! Compiled model files.
//!
//! All values are big endian. Strings are a `u32` byte length followed by
//! UTF-8 bytes, booleans a single byte. The loader is IO-free: it operates on
//! an in-memory byte slice.

use crate::animation::animation_index;
use crate::version::is_supported_version;
use crate::{
    Action, Animation, AnimationFrame, Easing, Error, HorizontalAlignment, Mark, MarkPlacement,
    ModelActor, Snapshot, SoundDescription, Sprite, VerticalAlignment, MODEL_FORMAT_MAJOR,
    MODEL_FORMAT_MINOR, MODEL_FORMAT_RELEASE,
};
use byteorder::{BigEndian, ByteOrder};

struct BinaryInput<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> BinaryInput<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.cursor)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        if self.remaining() < len {
            return Err(Error::BinaryParse {
                message: format!("unexpected EOF at offset {}", self.cursor),
            });
        }
        let result = &self.bytes[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(result)
    }

    fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.take(1)?[0] != 0)
    }

    fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    fn read_f64(&mut self) -> Result<f64, Error> {
        Ok(BigEndian::read_f64(self.take(8)?))
    }

    /// A count of items, each taking at least `min_item_size` bytes.
    fn read_count(&mut self, min_item_size: usize) -> Result<usize, Error> {
        let offset = self.cursor;
        let count = self.read_u32()? as usize;
        if count.saturating_mul(min_item_size) > self.remaining() {
            return Err(Error::BinaryParse {
                message: format!("count {count} at offset {offset} exceeds the input size"),
            });
        }
        Ok(count)
    }

    fn read_string(&mut self) -> Result<String, Error> {
        let offset = self.cursor;
        let length = self.read_count(1)?;
        let bytes = self.take(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::BinaryParse {
            message: format!("invalid UTF-8 string at offset {offset}: {e}"),
        })
    }

    fn read_easing(&mut self) -> Result<Easing, Error> {
        let function = self.read_u32()?;
        let direction = self.read_u32()?;
        Easing::from_codes(function, direction)
    }
}

#[derive(Default)]
struct BinaryOutput {
    bytes: Vec<u8>,
}

impl BinaryOutput {
    fn write_bool(&mut self, value: bool) {
        self.bytes.push(u8::from(value));
    }

    fn write_u32(&mut self, value: u32) {
        let mut buf = [0; 4];
        BigEndian::write_u32(&mut buf, value);
        self.bytes.extend_from_slice(&buf);
    }

    fn write_i32(&mut self, value: i32) {
        let mut buf = [0; 4];
        BigEndian::write_i32(&mut buf, value);
        self.bytes.extend_from_slice(&buf);
    }

    fn write_f64(&mut self, value: f64) {
        let mut buf = [0; 8];
        BigEndian::write_f64(&mut buf, value);
        self.bytes.extend_from_slice(&buf);
    }

    fn write_count(&mut self, count: usize) -> Result<(), Error> {
        let count = u32::try_from(count).map_err(|_| Error::BinaryParse {
            message: format!("count {count} does not fit the format"),
        })?;
        self.write_u32(count);
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<(), Error> {
        self.write_count(value.len())?;
        self.bytes.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn write_easing(&mut self, easing: Easing) {
        self.write_u32(easing.function.code());
        self.write_u32(easing.direction.code());
    }

    fn write_sound(&mut self, sound: &SoundDescription) -> Result<(), Error> {
        self.write_bool(sound.global);
        self.write_count(sound.files.len())?;
        for file in &sound.files {
            self.write_string(file)?;
        }
        Ok(())
    }
}

impl ModelActor {
    pub fn from_binary(bytes: &[u8]) -> Result<Self, Error> {
        let mut input = BinaryInput::new(bytes);

        let major = input.read_u32()?;
        let minor = input.read_u32()?;
        let release = input.read_u32()?;
        if !is_supported_version(major, minor) {
            return Err(Error::UnsupportedVersion {
                major,
                minor,
                release,
            });
        }

        let count = input.read_count(4)?;
        let mut animations = Vec::with_capacity(count);
        for _ in 0..count {
            animations.push(read_animation(&mut input)?);
        }
        log::trace!("read {} model animations", animations.len());

        let mut actor = ModelActor::new();
        let count = input.read_count(4)?;
        for _ in 0..count {
            let action = read_action(&mut input, &animations)?;
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

    /// Writes the actor in the current format version. Substitute animations
    /// are not written.
    pub fn to_binary(&self) -> Result<Vec<u8>, Error> {
        let mut animations = Vec::<&Animation>::new();
        for action in self.actions() {
            for mark in action.marks() {
                if let Some(a) = &mark.animation {
                    animation_index(&mut animations, a);
                }
            }
        }

        let mut out = BinaryOutput::default();
        out.write_u32(MODEL_FORMAT_MAJOR);
        out.write_u32(MODEL_FORMAT_MINOR);
        out.write_u32(MODEL_FORMAT_RELEASE);

        out.write_count(animations.len())?;
        for animation in &animations {
            write_animation(&mut out, animation)?;
        }

        out.write_count(self.len())?;
        for action in self.actions() {
            write_action(&mut out, action, &mut animations)?;
        }

        Ok(out.bytes)
    }
}

fn read_animation(input: &mut BinaryInput<'_>) -> Result<Animation, Error> {
    let count = input.read_count(36)?;
    let mut frames = Vec::with_capacity(count);
    for _ in 0..count {
        let image = input.read_string()?;
        let width = input.read_f64()?;
        let height = input.read_f64()?;
        let angle = input.read_f64()?;
        let duration = input.read_f64()?;
        frames.push(AnimationFrame {
            sprite: Sprite {
                image,
                width,
                height,
                angle,
            },
            duration,
        });
    }

    let loops = input.read_u32()?;
    let first_index = input.read_u32()? as usize;
    let last_index = input.read_u32()? as usize;

    Ok(Animation::new(frames)
        .with_loops(loops)
        .with_loop_range(first_index, last_index))
}

fn read_sound(input: &mut BinaryInput<'_>) -> Result<SoundDescription, Error> {
    let global = input.read_bool()?;
    let count = input.read_count(4)?;
    let mut files = Vec::with_capacity(count);
    for _ in 0..count {
        files.push(input.read_string()?);
    }
    Ok(SoundDescription::new(files, global))
}

fn read_action(input: &mut BinaryInput<'_>, animations: &[Animation]) -> Result<Action, Error> {
    let name = input.read_string()?;
    let duration = input.read_f64()?;
    let next = input.read_string()?;
    let sound = read_sound(input)?;

    let mut action = Action::new(name, 0.0).with_next(next).with_sound(sound);
    action.set_duration(duration)?;

    let count = input.read_count(10)?;
    for _ in 0..count {
        let mut mark = Mark::new(input.read_string()?);
        mark.apply_angle_to_animation = input.read_bool()?;
        mark.pause_animation_when_hidden = input.read_bool()?;
        // An index past the table means no animation.
        mark.animation = animations.get(input.read_u32()? as usize).cloned();
        action.add_mark(mark)?;
    }

    let count = input.read_count(8)?;
    let mut replaced_initial = false;
    for _ in 0..count {
        let snapshot = read_snapshot(input, &action)?;
        if snapshot.date() == 0.0 && !replaced_initial {
            replaced_initial = true;
            action.replace_snapshot(snapshot)?;
        } else {
            action.add_snapshot(snapshot)?;
        }
    }

    Ok(action)
}

fn read_snapshot(input: &mut BinaryInput<'_>, action: &Action) -> Result<Snapshot, Error> {
    let date = input.read_f64()?;
    let mut snapshot = action.create_snapshot(date);
    snapshot.function = input.read_string()?;
    let width = input.read_f64()?;
    let height = input.read_f64()?;
    snapshot.set_size(width, height);
    snapshot.x_alignment = HorizontalAlignment::from_name(&input.read_string()?)?;
    snapshot.y_alignment = VerticalAlignment::from_name(&input.read_string()?)?;
    snapshot.x_alignment_value = input.read_f64()?;
    snapshot.y_alignment_value = input.read_f64()?;
    snapshot.sound = read_sound(input)?;

    for _ in 0..action.marks_count() {
        let placement = read_placement(input)?;
        snapshot.set_mark_placement(placement)?;
    }

    Ok(snapshot)
}

fn read_placement(input: &mut BinaryInput<'_>) -> Result<MarkPlacement, Error> {
    let mut p = MarkPlacement::new(input.read_u32()? as usize);
    p.x = input.read_f64()?;
    p.x_easing = input.read_easing()?;
    p.y = input.read_f64()?;
    p.y_easing = input.read_easing()?;
    p.width = input.read_f64()?;
    p.width_easing = input.read_easing()?;
    p.height = input.read_f64()?;
    p.height_easing = input.read_easing()?;
    p.depth = input.read_i32()?;
    p.angle = input.read_f64()?;
    p.angle_easing = input.read_easing()?;
    p.visible = input.read_bool()?;
    p.collision_function = input.read_string()?;
    Ok(p)
}

fn write_animation(out: &mut BinaryOutput, animation: &Animation) -> Result<(), Error> {
    out.write_count(animation.frames.len())?;
    for frame in &animation.frames {
        out.write_string(&frame.sprite.image)?;
        out.write_f64(frame.sprite.width);
        out.write_f64(frame.sprite.height);
        out.write_f64(frame.sprite.angle);
        out.write_f64(frame.duration);
    }
    out.write_u32(animation.loops);
    out.write_count(animation.first_index)?;
    out.write_count(animation.last_index)
}

fn write_action<'a>(
    out: &mut BinaryOutput,
    action: &'a Action,
    animations: &mut Vec<&'a Animation>,
) -> Result<(), Error> {
    out.write_string(action.name())?;
    out.write_f64(action.duration());
    out.write_string(&action.next)?;
    out.write_sound(&action.sound)?;

    out.write_count(action.marks_count())?;
    for mark in action.marks() {
        out.write_string(mark.label())?;
        out.write_bool(mark.apply_angle_to_animation);
        out.write_bool(mark.pause_animation_when_hidden);
        let index = match &mark.animation {
            Some(a) => animation_index(animations, a),
            None => animations.len(),
        };
        out.write_count(index)?;
    }

    out.write_count(action.snapshots().len())?;
    for s in action.snapshots() {
        out.write_f64(s.date());
        out.write_string(&s.function)?;
        out.write_f64(s.width);
        out.write_f64(s.height);
        out.write_string(s.x_alignment.name())?;
        out.write_string(s.y_alignment.name())?;
        out.write_f64(s.x_alignment_value);
        out.write_f64(s.y_alignment_value);
        out.write_sound(&s.sound)?;

        for p in s.placements() {
            out.write_count(p.mark_id)?;
            out.write_f64(p.x);
            out.write_easing(p.x_easing);
            out.write_f64(p.y);
            out.write_easing(p.y_easing);
            out.write_f64(p.width);
            out.write_easing(p.width_easing);
            out.write_f64(p.height);
            out.write_easing(p.height_easing);
            out.write_i32(p.depth);
            out.write_f64(p.angle);
            out.write_easing(p.angle_easing);
            out.write_bool(p.visible);
            out.write_string(&p.collision_function)?;
        }
    }

    Ok(())
}
