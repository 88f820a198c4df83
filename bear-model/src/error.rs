use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown action: {name}")]
    UnknownAction { name: String },

    #[error("unknown mark '{label}' in action '{action}'")]
    UnknownMark { action: String, label: String },

    #[error("invalid mark id {id} (the action has {count} marks)")]
    UnknownMarkId { id: usize, count: usize },

    #[error("no snapshot at date {date} in action '{action}'")]
    UnknownSnapshot { action: String, date: f64 },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    #[error("not a horizontal alignment '{value}'")]
    InvalidHorizontalAlignment { value: String },

    #[error("not a vertical alignment '{value}'")]
    InvalidVerticalAlignment { value: String },

    #[error("invalid easing '{value}'")]
    InvalidEasing { value: String },

    #[error("unsupported model file version {major}.{minor}.{release}")]
    UnsupportedVersion { major: u32, minor: u32, release: u32 },

    #[error("a snapshot already exists at date {date} in action '{action}'")]
    DuplicateSnapshotDate { action: String, date: f64 },

    #[error("a mark labelled '{label}' already exists in action '{action}'")]
    DuplicateMarkLabel { action: String, label: String },

    #[error(
        "snapshot at date {date} has {placements} placements but action '{action}' has {marks} marks"
    )]
    MarkSetMismatch {
        action: String,
        date: f64,
        placements: usize,
        marks: usize,
    },

    #[error("the initial snapshot of action '{action}' cannot be removed")]
    InitialSnapshotRemoval { action: String },

    #[cfg(feature = "json")]
    #[error("failed to parse model JSON: {message}")]
    JsonParse { message: String },

    #[cfg(feature = "json")]
    #[error("unknown mark '{label}' referenced by a snapshot of action '{action}'")]
    JsonUnknownPlacementMark { action: String, label: String },

    #[cfg(feature = "json")]
    #[error("unknown animation {index} referenced by mark '{label}' of action '{action}'")]
    JsonUnknownAnimation {
        action: String,
        label: String,
        index: usize,
    },

    #[cfg(feature = "binary")]
    #[error("failed to parse compiled model: {message}")]
    BinaryParse { message: String },
}

impl Error {
    /// Tells if the error reports a reference to something that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownAction { .. }
                | Self::UnknownMark { .. }
                | Self::UnknownMarkId { .. }
                | Self::UnknownSnapshot { .. }
        )
    }

    /// Tells if the error reports malformed persisted data.
    pub fn is_invalid_format(&self) -> bool {
        match self {
            Self::InvalidHorizontalAlignment { .. }
            | Self::InvalidVerticalAlignment { .. }
            | Self::InvalidEasing { .. }
            | Self::UnsupportedVersion { .. } => true,
            #[cfg(feature = "json")]
            Self::JsonParse { .. }
            | Self::JsonUnknownPlacementMark { .. }
            | Self::JsonUnknownAnimation { .. } => true,
            #[cfg(feature = "binary")]
            Self::BinaryParse { .. } => true,
            _ => false,
        }
    }

    /// Tells if the error reports a broken structural invariant of the model.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateSnapshotDate { .. }
                | Self::DuplicateMarkLabel { .. }
                | Self::MarkSetMismatch { .. }
                | Self::InitialSnapshotRemoval { .. }
        )
    }
}
