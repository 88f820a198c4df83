use crate::{Animation, Easing, Error};
use std::collections::{BTreeSet, HashMap};

/// Dense index of a mark in its action. Snapshot placements use the same
/// indices.
pub type MarkId = usize;

#[derive(Clone, Debug, PartialEq)]
pub struct Mark {
    label: String,
    pub animation: Option<Animation>,
    pub substitute: Option<Animation>,
    pub apply_angle_to_animation: bool,
    pub pause_animation_when_hidden: bool,
    pub reset_with_action: bool,
}

impl Mark {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            animation: None,
            substitute: None,
            apply_angle_to_animation: false,
            pause_animation_when_hidden: false,
            reset_with_action: true,
        }
    }

    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The animation currently shown by the mark: the substitute if any,
    /// the main animation otherwise.
    pub fn animation(&self) -> Option<&Animation> {
        self.substitute.as_ref().or(self.animation.as_ref())
    }

    pub fn has_animation(&self) -> bool {
        self.animation().is_some_and(Animation::is_valid)
    }

    pub fn set_substitute(&mut self, animation: Animation) {
        self.substitute = Some(animation);
    }

    pub fn remove_substitute(&mut self) {
        self.substitute = None;
    }

    /// Tells if the animation must restart when the action starts.
    ///
    /// Infinite animations looping from their first frame look the same
    /// whether they are reset or not, so they are left running.
    pub fn resets_animation_with_action(&self) -> bool {
        self.reset_with_action
            && self.has_animation()
            && self
                .animation()
                .is_some_and(|a| a.is_finite() || a.first_index != 0)
    }
}

/// The numeric channels of a placement that can be tweened.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PlacementChannel {
    Angle,
    X,
    Y,
    Width,
    Height,
}

impl PlacementChannel {
    pub const ALL: [Self; 5] = [Self::Angle, Self::X, Self::Y, Self::Width, Self::Height];
}

/// The pose of one mark in one snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkPlacement {
    pub mark_id: MarkId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub depth: i32,
    /// Radians.
    pub angle: f64,
    pub visible: bool,
    pub collision_function: String,
    pub x_easing: Easing,
    pub y_easing: Easing,
    pub width_easing: Easing,
    pub height_easing: Easing,
    pub angle_easing: Easing,
}

impl MarkPlacement {
    pub fn new(mark_id: MarkId) -> Self {
        Self {
            mark_id,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            depth: 0,
            angle: 0.0,
            visible: true,
            collision_function: String::new(),
            x_easing: Easing::IDENTITY,
            y_easing: Easing::IDENTITY,
            width_easing: Easing::IDENTITY,
            height_easing: Easing::IDENTITY,
            angle_easing: Easing::IDENTITY,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_values(
        mark_id: MarkId,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        depth: i32,
        angle: f64,
        visible: bool,
        collision_function: impl Into<String>,
    ) -> Self {
        Self {
            x,
            y,
            width,
            height,
            depth,
            angle,
            visible,
            collision_function: collision_function.into(),
            ..Self::new(mark_id)
        }
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Compiled data is trusted: negative sizes are kept as they are.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn channel(&self, channel: PlacementChannel) -> f64 {
        match channel {
            PlacementChannel::Angle => self.angle,
            PlacementChannel::X => self.x,
            PlacementChannel::Y => self.y,
            PlacementChannel::Width => self.width,
            PlacementChannel::Height => self.height,
        }
    }

    pub fn set_channel(&mut self, channel: PlacementChannel, value: f64) {
        match channel {
            PlacementChannel::Angle => self.angle = value,
            PlacementChannel::X => self.x = value,
            PlacementChannel::Y => self.y = value,
            PlacementChannel::Width => self.width = value,
            PlacementChannel::Height => self.height = value,
        }
    }

    pub fn easing(&self, channel: PlacementChannel) -> Easing {
        match channel {
            PlacementChannel::Angle => self.angle_easing,
            PlacementChannel::X => self.x_easing,
            PlacementChannel::Y => self.y_easing,
            PlacementChannel::Width => self.width_easing,
            PlacementChannel::Height => self.height_easing,
        }
    }

    pub fn set_easing(&mut self, channel: PlacementChannel, easing: Easing) {
        match channel {
            PlacementChannel::Angle => self.angle_easing = easing,
            PlacementChannel::X => self.x_easing = easing,
            PlacementChannel::Y => self.y_easing = easing,
            PlacementChannel::Width => self.width_easing = easing,
            PlacementChannel::Height => self.height_easing = easing,
        }
    }

    #[cfg(feature = "glam")]
    pub fn position_vec(&self) -> glam::DVec2 {
        glam::DVec2::new(self.x, self.y)
    }

    #[cfg(feature = "glam")]
    pub fn size_vec(&self) -> glam::DVec2 {
        glam::DVec2::new(self.width, self.height)
    }
}

/// How a snapshot is anchored horizontally against the previous one.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl HorizontalAlignment {
    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "align_left",
            Self::Center => "align_center",
            Self::Right => "align_right",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "align_left" => Ok(Self::Left),
            "align_center" => Ok(Self::Center),
            "align_right" => Ok(Self::Right),
            _ => Err(Error::InvalidHorizontalAlignment {
                value: name.to_string(),
            }),
        }
    }

    /// Horizontal shift of a box of width `end` anchored on a box of width
    /// `init`.
    pub fn offset(self, init: f64, end: f64) -> f64 {
        match self {
            Self::Left => 0.0,
            Self::Center => (end - init) / 2.0,
            Self::Right => end - init,
        }
    }
}

/// How a snapshot is anchored vertically against the previous one.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum VerticalAlignment {
    #[default]
    Bottom,
    Center,
    Top,
}

impl VerticalAlignment {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bottom => "align_bottom",
            Self::Center => "align_center",
            Self::Top => "align_top",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "align_bottom" => Ok(Self::Bottom),
            "align_center" => Ok(Self::Center),
            "align_top" => Ok(Self::Top),
            _ => Err(Error::InvalidVerticalAlignment {
                value: name.to_string(),
            }),
        }
    }

    pub fn offset(self, init: f64, end: f64) -> f64 {
        match self {
            Self::Bottom => 0.0,
            Self::Center => (end - init) / 2.0,
            Self::Top => end - init,
        }
    }
}

/// A set of candidate sound files, one of them being played when triggered.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SoundDescription {
    pub files: BTreeSet<String>,
    /// The sound is not attached to the position of the model.
    pub global: bool,
}

impl SoundDescription {
    pub fn new<I, S>(files: I, global: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            global,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Picks one of the files uniformly. Every call draws again.
    pub fn random_file(&self, rng: &mut fastrand::Rng) -> Option<&str> {
        if self.files.is_empty() {
            return None;
        }
        let index = rng.usize(..self.files.len());
        self.files.iter().nth(index).map(String::as_str)
    }
}

/// A keyframe of an action.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    date: f64,
    placements: Vec<MarkPlacement>,
    /// Function called when the playback reaches the snapshot. Empty for none.
    pub function: String,
    pub sound: SoundDescription,
    pub width: f64,
    pub height: f64,
    pub x_alignment: HorizontalAlignment,
    pub x_alignment_value: f64,
    pub y_alignment: VerticalAlignment,
    pub y_alignment_value: f64,
}

impl Snapshot {
    /// Creates a snapshot with a default placement for `mark_count` marks.
    pub fn new(date: f64, mark_count: usize) -> Self {
        Self {
            date,
            placements: (0..mark_count).map(MarkPlacement::new).collect(),
            function: String::new(),
            sound: SoundDescription::default(),
            width: 10.0,
            height: 10.0,
            x_alignment: HorizontalAlignment::Left,
            x_alignment_value: 0.0,
            y_alignment: VerticalAlignment::Bottom,
            y_alignment_value: 0.0,
        }
    }

    pub fn date(&self) -> f64 {
        self.date
    }

    pub fn placements(&self) -> &[MarkPlacement] {
        &self.placements
    }

    pub fn mark_placements_count(&self) -> usize {
        self.placements.len()
    }

    pub fn get_mark_placement(&self, id: MarkId) -> Result<&MarkPlacement, Error> {
        self.placements.get(id).ok_or(Error::UnknownMarkId {
            id,
            count: self.placements.len(),
        })
    }

    pub fn get_mark_placement_mut(&mut self, id: MarkId) -> Result<&mut MarkPlacement, Error> {
        let count = self.placements.len();
        self.placements
            .get_mut(id)
            .ok_or(Error::UnknownMarkId { id, count })
    }

    /// Replaces the placement of the mark `placement.mark_id`.
    pub fn set_mark_placement(&mut self, placement: MarkPlacement) -> Result<(), Error> {
        let slot = self.get_mark_placement_mut(placement.mark_id)?;
        *slot = placement;
        Ok(())
    }

    pub fn function(&self) -> Option<&str> {
        (!self.function.is_empty()).then_some(self.function.as_str())
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn get_random_sound_name(&self, rng: &mut fastrand::Rng) -> Option<&str> {
        self.sound.random_file(rng)
    }

    /// Offset of this snapshot's frame relative to the frame of `init`, per
    /// the alignment of this snapshot.
    pub fn alignment_offset(&self, init: &Snapshot) -> (f64, f64) {
        (
            self.x_alignment_value + self.x_alignment.offset(init.width, self.width),
            self.y_alignment_value + self.y_alignment.offset(init.height, self.height),
        )
    }

    pub(crate) fn set_date(&mut self, date: f64) {
        self.date = date;
    }

    pub(crate) fn insert_mark(&mut self) {
        let id = self.placements.len();
        self.placements.push(MarkPlacement::new(id));
    }

    pub(crate) fn remove_mark(&mut self, id: MarkId) {
        self.placements.remove(id);
        for (i, p) in self.placements.iter_mut().enumerate().skip(id) {
            p.mark_id = i;
        }
    }
}

/// A named, timed sequence of snapshots placing a set of marks.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    name: String,
    duration: f64,
    /// Action played when this one is over. Empty for none.
    pub next: String,
    pub sound: SoundDescription,
    marks: Vec<Mark>,
    snapshots: Vec<Snapshot>,
}

impl Action {
    /// Creates an action with no marks and its initial snapshot at date 0.
    pub fn new(name: impl Into<String>, duration: f64) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
            next: String::new(),
            sound: SoundDescription::default(),
            marks: Vec::new(),
            snapshots: vec![Snapshot::new(0.0, 0)],
        }
    }

    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = next.into();
        self
    }

    pub fn with_sound(mut self, sound: SoundDescription) -> Self {
        self.sound = sound;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) -> Result<(), Error> {
        if duration.is_nan() || duration < 0.0 {
            return Err(Error::InvalidValue {
                message: "action duration must be >= 0".to_string(),
            });
        }
        self.duration = duration;
        Ok(())
    }

    pub fn next_action(&self) -> Option<&str> {
        (!self.next.is_empty()).then_some(self.next.as_str())
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn marks_count(&self) -> usize {
        self.marks.len()
    }

    pub fn mark(&self, id: MarkId) -> Result<&Mark, Error> {
        self.marks.get(id).ok_or(Error::UnknownMarkId {
            id,
            count: self.marks.len(),
        })
    }

    pub fn mark_mut(&mut self, id: MarkId) -> Result<&mut Mark, Error> {
        let count = self.marks.len();
        self.marks
            .get_mut(id)
            .ok_or(Error::UnknownMarkId { id, count })
    }

    /// Returns `None` when no mark has this label.
    pub fn get_mark_id(&self, label: &str) -> Option<MarkId> {
        self.marks.iter().position(|m| m.label == label)
    }

    pub fn has_mark_label(&self, label: &str) -> bool {
        self.get_mark_id(label).is_some()
    }

    pub fn get_mark(&self, label: &str) -> Result<&Mark, Error> {
        self.get_mark_id(label)
            .map(|id| &self.marks[id])
            .ok_or_else(|| self.unknown_mark(label))
    }

    pub fn get_mark_mut(&mut self, label: &str) -> Result<&mut Mark, Error> {
        match self.get_mark_id(label) {
            Some(id) => Ok(&mut self.marks[id]),
            None => Err(self.unknown_mark(label)),
        }
    }

    /// Adds a mark and a default placement for it in every snapshot.
    pub fn add_mark(&mut self, mark: Mark) -> Result<MarkId, Error> {
        if self.has_mark_label(&mark.label) {
            return Err(Error::DuplicateMarkLabel {
                action: self.name.clone(),
                label: mark.label,
            });
        }
        for s in &mut self.snapshots {
            s.insert_mark();
        }
        self.marks.push(mark);
        Ok(self.marks.len() - 1)
    }

    /// Removes a mark and its placement from every snapshot. The ids of the
    /// following marks are shifted down by one.
    pub fn remove_mark(&mut self, label: &str) -> Result<Mark, Error> {
        let id = self
            .get_mark_id(label)
            .ok_or_else(|| self.unknown_mark(label))?;
        for s in &mut self.snapshots {
            s.remove_mark(id);
        }
        Ok(self.marks.remove(id))
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn first_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    /// A snapshot at `date` with a default placement for every mark.
    pub fn create_snapshot(&self, date: f64) -> Snapshot {
        Snapshot::new(date, self.marks.len())
    }

    pub fn has_snapshot_date(&self, date: f64) -> bool {
        self.snapshot_position(date).is_ok()
    }

    /// Inserts a snapshot, keeping the snapshots sorted by date.
    ///
    /// A snapshot already present at the same date is an error; use
    /// [`Action::replace_snapshot`] to overwrite it.
    pub fn add_snapshot(&mut self, snapshot: Snapshot) -> Result<(), Error> {
        self.check_snapshot(&snapshot)?;
        match self.snapshot_position(snapshot.date) {
            Ok(_) => Err(Error::DuplicateSnapshotDate {
                action: self.name.clone(),
                date: snapshot.date,
            }),
            Err(index) => {
                self.snapshots.insert(index, snapshot);
                Ok(())
            }
        }
    }

    /// Inserts a snapshot, overwriting the one at the same date if any. The
    /// overwritten snapshot is returned.
    pub fn replace_snapshot(&mut self, snapshot: Snapshot) -> Result<Option<Snapshot>, Error> {
        self.check_snapshot(&snapshot)?;
        match self.snapshot_position(snapshot.date) {
            Ok(index) => Ok(Some(std::mem::replace(&mut self.snapshots[index], snapshot))),
            Err(index) => {
                self.snapshots.insert(index, snapshot);
                Ok(None)
            }
        }
    }

    pub fn remove_snapshot(&mut self, date: f64) -> Result<Snapshot, Error> {
        let index = self
            .snapshot_position(date)
            .map_err(|_| self.unknown_snapshot(date))?;
        if date == 0.0 {
            return Err(Error::InitialSnapshotRemoval {
                action: self.name.clone(),
            });
        }
        Ok(self.snapshots.remove(index))
    }

    pub fn snapshot_at(&self, date: f64) -> Result<&Snapshot, Error> {
        self.snapshot_position(date)
            .map(|i| &self.snapshots[i])
            .map_err(|_| self.unknown_snapshot(date))
    }

    pub fn snapshot_at_mut(&mut self, date: f64) -> Result<&mut Snapshot, Error> {
        match self.snapshot_position(date) {
            Ok(i) => Ok(&mut self.snapshots[i]),
            Err(_) => Err(self.unknown_snapshot(date)),
        }
    }

    pub fn snapshot_index_at_or_before(&self, date: f64) -> Option<usize> {
        let index = self.snapshots.partition_point(|s| s.date <= date);
        index.checked_sub(1)
    }

    /// The snapshot in effect at `date`: the last one whose date is not
    /// greater than `date`.
    pub fn get_snapshot_at_or_before(&self, date: f64) -> Option<&Snapshot> {
        self.snapshot_index_at_or_before(date)
            .map(|i| &self.snapshots[i])
    }

    /// The last snapshot strictly before `date`.
    pub fn get_snapshot_before(&self, date: f64) -> Option<&Snapshot> {
        let index = self.snapshots.partition_point(|s| s.date < date);
        index.checked_sub(1).map(|i| &self.snapshots[i])
    }

    pub fn snapshot_index_after(&self, date: f64) -> Option<usize> {
        if date >= self.duration {
            return None;
        }
        let index = self.snapshots.partition_point(|s| s.date <= date);
        (index < self.snapshots.len()).then_some(index)
    }

    /// The first snapshot strictly after `date`, if `date` is in the action.
    pub fn get_snapshot_after(&self, date: f64) -> Option<&Snapshot> {
        self.snapshot_index_after(date).map(|i| &self.snapshots[i])
    }

    /// Total time in `[from, to]` during which the mark is visible.
    ///
    /// Visibility only changes on snapshots. The interval is clamped to
    /// `[first snapshot date, duration]`.
    pub fn accumulated_mark_visibility(&self, id: MarkId, from: f64, to: f64) -> Result<f64, Error> {
        if id >= self.marks.len() {
            return Err(Error::UnknownMarkId {
                id,
                count: self.marks.len(),
            });
        }
        if from.is_nan() || to.is_nan() || from > to {
            return Err(Error::InvalidValue {
                message: format!("invalid visibility interval [{from}, {to}]"),
            });
        }

        let Some(first) = self.snapshots.first() else {
            return Ok(0.0);
        };
        let upper = self.duration.max(first.date);
        let from = from.clamp(first.date, upper);
        let to = to.clamp(first.date, upper);
        if from >= to {
            return Ok(0.0);
        }

        let start = self.snapshot_index_at_or_before(from).unwrap_or(0);
        let end = self.snapshot_index_at_or_before(to).unwrap_or(0);
        let visible = |i: usize| self.snapshots[i].placements[id].visible;

        // The interval does not start on the first snapshot.
        let mut result = if visible(start) {
            -(from - self.snapshots[start].date)
        } else {
            0.0
        };

        for i in start..end {
            if visible(i) {
                result += self.snapshots[i + 1].date - self.snapshots[i].date;
            }
        }

        if visible(end) {
            result += to - self.snapshots[end].date;
        }

        Ok(result.max(0.0))
    }

    /// The largest bounding box among the snapshots.
    pub fn max_size(&self) -> (f64, f64) {
        self.snapshots
            .iter()
            .fold((0.0, 0.0), |(w, h), s| (w.max(s.width), h.max(s.height)))
    }

    pub(crate) fn snapshot_position(&self, date: f64) -> Result<usize, usize> {
        let index = self.snapshots.partition_point(|s| s.date < date);
        match self.snapshots.get(index) {
            Some(s) if s.date == date => Ok(index),
            _ => Err(index),
        }
    }

    fn check_snapshot(&self, snapshot: &Snapshot) -> Result<(), Error> {
        if snapshot.date.is_nan() || snapshot.date < 0.0 {
            return Err(Error::InvalidValue {
                message: format!("snapshot date must be >= 0, got {}", snapshot.date),
            });
        }
        if snapshot.placements.len() != self.marks.len() {
            return Err(Error::MarkSetMismatch {
                action: self.name.clone(),
                date: snapshot.date,
                placements: snapshot.placements.len(),
                marks: self.marks.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn unknown_mark(&self, label: &str) -> Error {
        Error::UnknownMark {
            action: self.name.clone(),
            label: label.to_string(),
        }
    }

    pub(crate) fn unknown_snapshot(&self, date: f64) -> Error {
        Error::UnknownSnapshot {
            action: self.name.clone(),
            date,
        }
    }
}

/// All the actions of an animated entity.
///
/// Cloning an actor is a deep copy: the animations of the marks are values,
/// so a copy never shares animation state with its source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelActor {
    actions: Vec<Action>,
    action_index: HashMap<String, usize>,
}

impl ModelActor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions in insertion order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.action_index.contains_key(name)
    }

    pub fn get_action(&self, name: &str) -> Result<&Action, Error> {
        self.action_index
            .get(name)
            .map(|&i| &self.actions[i])
            .ok_or_else(|| Error::UnknownAction {
                name: name.to_string(),
            })
    }

    pub fn get_action_mut(&mut self, name: &str) -> Result<&mut Action, Error> {
        match self.action_index.get(name) {
            Some(&i) => Ok(&mut self.actions[i]),
            None => Err(Error::UnknownAction {
                name: name.to_string(),
            }),
        }
    }

    /// Stores the action under its name. An action with the same name is
    /// replaced and returned.
    pub fn add_action(&mut self, action: Action) -> Option<Action> {
        match self.action_index.get(action.name()) {
            Some(&i) => Some(std::mem::replace(&mut self.actions[i], action)),
            None => {
                self.action_index
                    .insert(action.name().to_string(), self.actions.len());
                self.actions.push(action);
                None
            }
        }
    }

    pub fn remove_action(&mut self, name: &str) -> Result<Action, Error> {
        let index = self
            .action_index
            .remove(name)
            .ok_or_else(|| Error::UnknownAction {
                name: name.to_string(),
            })?;
        let action = self.actions.remove(index);
        for i in self.action_index.values_mut() {
            if *i > index {
                *i -= 1;
            }
        }
        Ok(action)
    }

    /// Shows `animation` instead of the main animation of every mark labelled
    /// `label`, in every action.
    pub fn set_global_substitute(&mut self, label: &str, animation: &Animation) {
        for action in &mut self.actions {
            if let Ok(mark) = action.get_mark_mut(label) {
                mark.set_substitute(animation.clone());
            }
        }
    }

    pub fn remove_global_substitute(&mut self, label: &str) {
        for action in &mut self.actions {
            if let Ok(mark) = action.get_mark_mut(label) {
                mark.remove_substitute();
            }
        }
    }
}
