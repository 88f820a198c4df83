//! Sprite animations attached to marks.
//!
//! These are the minimal visual values the model runtime needs: an opaque
//! sprite handle and a sequence of timed frames with an optional loop range.
//! Decoding and drawing the images is the host's business.

/// An opaque handle on a bitmap region, as handed to the renderer.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Sprite {
    pub image: String,
    pub width: f64,
    pub height: f64,
    /// Rotation applied when drawing, in radians.
    pub angle: f64,
}

impl Sprite {
    pub fn new(image: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            image: image.into(),
            width,
            height,
            angle: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationFrame {
    pub sprite: Sprite,
    pub duration: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    pub frames: Vec<AnimationFrame>,
    /// How many times the loop range is played. Zero means forever.
    pub loops: u32,
    /// First frame of the loop range.
    pub first_index: usize,
    /// Last frame of the loop range.
    pub last_index: usize,
}

impl Animation {
    /// Creates an animation looping forever over all its frames.
    pub fn new(frames: Vec<AnimationFrame>) -> Self {
        let last_index = frames.len().saturating_sub(1);
        Self {
            frames,
            loops: 0,
            first_index: 0,
            last_index,
        }
    }

    pub fn with_loops(mut self, loops: u32) -> Self {
        self.loops = loops;
        self
    }

    pub fn with_loop_range(mut self, first_index: usize, last_index: usize) -> Self {
        let last = self.frames.len().saturating_sub(1);
        self.last_index = last_index.min(last);
        self.first_index = first_index.min(self.last_index);
        self
    }

    pub fn is_valid(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn is_finite(&self) -> bool {
        self.loops != 0
    }

    /// Largest sprite size among the frames.
    pub fn max_size(&self) -> (f64, f64) {
        self.frames.iter().fold((0.0, 0.0), |(w, h), f| {
            (w.max(f.sprite.width), h.max(f.sprite.height))
        })
    }

    fn loop_duration(&self) -> f64 {
        self.frames
            .get(self.first_index..=self.last_index)
            .map(|frames| frames.iter().map(|f| f.duration.max(0.0)).sum())
            .unwrap_or(0.0)
    }
}

/// Index of `animation` in `table`, adding it if it is not there yet.
#[cfg(any(feature = "json", feature = "binary"))]
pub(crate) fn animation_index<'a>(table: &mut Vec<&'a Animation>, animation: &'a Animation) -> usize {
    match table.iter().position(|a| *a == animation) {
        Some(i) => i,
        None => {
            table.push(animation);
            table.len() - 1
        }
    }
}

/// Plays an [`Animation`] over time.
#[derive(Clone, Debug)]
pub struct AnimationPlayer {
    animation: Animation,
    index: usize,
    time_in_frame: f64,
    play_count: u32,
    finished: bool,
}

impl AnimationPlayer {
    pub fn new(animation: Animation) -> Self {
        let mut player = Self {
            animation,
            index: 0,
            time_in_frame: 0.0,
            play_count: 0,
            finished: false,
        };
        player.reset();
        player
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    pub fn set_animation(&mut self, animation: Animation) {
        self.animation = animation;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.time_in_frame = 0.0;
        self.play_count = 0;
        self.finished = !self.animation.is_valid();
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The sprite of the current frame, if the animation has frames.
    pub fn sprite(&self) -> Option<Sprite> {
        self.animation
            .frames
            .get(self.index)
            .map(|f| f.sprite.clone())
    }

    /// Time before the displayed frame changes; infinite once finished.
    pub fn duration_until_next(&self) -> f64 {
        if self.finished {
            return f64::INFINITY;
        }
        match self.animation.frames.get(self.index) {
            Some(frame) => (frame.duration - self.time_in_frame).max(0.0),
            None => f64::INFINITY,
        }
    }

    pub fn next(&mut self, elapsed: f64) {
        if self.finished || elapsed <= 0.0 {
            return;
        }

        self.time_in_frame += elapsed;

        // A zero-length infinite loop would never consume the elapsed time.
        if !self.animation.is_finite() && self.animation.loop_duration() <= 0.0 {
            if self.index < self.animation.first_index {
                self.index = self.animation.first_index;
            }
            self.time_in_frame = 0.0;
            return;
        }

        while !self.finished {
            let duration = self.animation.frames[self.index].duration.max(0.0);
            if self.time_in_frame < duration {
                break;
            }
            self.time_in_frame -= duration;
            self.advance_frame();
        }
    }

    fn advance_frame(&mut self) {
        let a = &self.animation;
        let last = a.frames.len() - 1;

        if self.index == a.last_index {
            self.play_count += 1;
            if !a.is_finite() || self.play_count < a.loops {
                self.index = a.first_index;
                return;
            }
        }

        if self.index < last {
            self.index += 1;
        } else {
            self.finished = true;
            self.time_in_frame = 0.0;
        }
    }
}
