//! Supported model file versions.

/// Major version of the compiled model format.
pub const MODEL_FORMAT_MAJOR: u32 = 0;

/// Oldest minor version of the compiled model format this crate can read.
pub const MODEL_FORMAT_MIN_MINOR: u32 = 6;

/// Minor version written by this crate.
pub const MODEL_FORMAT_MINOR: u32 = 6;

/// Release number written by this crate.
pub const MODEL_FORMAT_RELEASE: u32 = 0;

#[cfg(feature = "binary")]
pub(crate) fn is_supported_version(major: u32, minor: u32) -> bool {
    major == MODEL_FORMAT_MAJOR && minor >= MODEL_FORMAT_MIN_MINOR
}
