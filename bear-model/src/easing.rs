//! Easing curves used to shape the interpolation of mark placements.
//!
//! An easing is a function and a direction. The function gives the shape of
//! the "ease in" curve; the direction tells whether the curve is applied at
//! the start, at the end, or at both ends of the interpolation.

use crate::Error;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum EasingFunction {
    Back,
    Bounce,
    Circ,
    Cubic,
    Elastic,
    Expo,
    Linear,
    #[default]
    None,
    Quad,
    Quart,
    Quint,
    Sine,
}

impl EasingFunction {
    pub const ALL: [Self; 12] = [
        Self::Back,
        Self::Bounce,
        Self::Circ,
        Self::Cubic,
        Self::Elastic,
        Self::Expo,
        Self::Linear,
        Self::None,
        Self::Quad,
        Self::Quart,
        Self::Quint,
        Self::Sine,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Back => "back",
            Self::Bounce => "bounce",
            Self::Circ => "circ",
            Self::Cubic => "cubic",
            Self::Elastic => "elastic",
            Self::Expo => "expo",
            Self::Linear => "linear",
            Self::None => "none",
            Self::Quad => "quad",
            Self::Quart => "quart",
            Self::Quint => "quint",
            Self::Sine => "sine",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Numeric code of the function in compiled model files.
    pub fn code(self) -> u32 {
        match self {
            Self::Back => 1,
            Self::Bounce => 2,
            Self::Circ => 3,
            Self::Cubic => 4,
            Self::Elastic => 5,
            Self::Expo => 6,
            Self::Linear => 7,
            Self::None => 8,
            Self::Quad => 9,
            Self::Quart => 10,
            Self::Quint => 11,
            Self::Sine => 12,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    /// The "ease in" shape of the function, for `t` in `[0, 1]`.
    fn ease_in(self, t: f64) -> f64 {
        match self {
            Self::Linear | Self::None => t,
            Self::Quad => t * t,
            Self::Cubic => t * t * t,
            Self::Quart => t.powi(4),
            Self::Quint => t.powi(5),
            Self::Sine => 1.0 - (t * PI / 2.0).cos(),
            Self::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Self::Expo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2.0_f64.powf(10.0 * t - 10.0)
                }
            }
            Self::Back => {
                const C1: f64 = 1.70158;
                const C3: f64 = C1 + 1.0;
                C3 * t * t * t - C1 * t * t
            }
            Self::Elastic => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    let c4 = (2.0 * PI) / 3.0;
                    -(2.0_f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * c4).sin()
                }
            }
            Self::Bounce => 1.0 - bounce_out(1.0 - t),
        }
    }
}

fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum EasingDirection {
    #[default]
    In,
    Out,
    InOut,
}

impl EasingDirection {
    pub fn name(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::InOut => "in_out",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            "in_out" => Some(Self::InOut),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::In => 1,
            Self::Out => 2,
            Self::InOut => 3,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::In),
            2 => Some(Self::Out),
            3 => Some(Self::InOut),
            _ => None,
        }
    }
}

/// An easing curve: a function applied in a direction.
///
/// The default easing is `none:in`, which leaves the progress unchanged.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct Easing {
    pub function: EasingFunction,
    pub direction: EasingDirection,
}

impl Easing {
    pub const IDENTITY: Self = Self {
        function: EasingFunction::None,
        direction: EasingDirection::In,
    };

    pub fn new(function: EasingFunction, direction: EasingDirection) -> Self {
        Self {
            function,
            direction,
        }
    }

    /// Builds an easing from the numeric codes of compiled model files.
    pub fn from_codes(function: u32, direction: u32) -> Result<Self, Error> {
        match (
            EasingFunction::from_code(function),
            EasingDirection::from_code(direction),
        ) {
            (Some(function), Some(direction)) => Ok(Self::new(function, direction)),
            _ => Err(Error::InvalidEasing {
                value: format!("{function}:{direction}"),
            }),
        }
    }

    /// Maps a normalized progress `t` to the eased progress.
    ///
    /// `t` is clamped to `[0, 1]`; the result is exactly 0 at 0 and 1 at 1.
    pub fn ease(&self, t: f64) -> f64 {
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }

        let f = self.function;
        match self.direction {
            EasingDirection::In => f.ease_in(t),
            EasingDirection::Out => 1.0 - f.ease_in(1.0 - t),
            EasingDirection::InOut => {
                if t < 0.5 {
                    f.ease_in(2.0 * t) / 2.0
                } else {
                    1.0 - f.ease_in(2.0 - 2.0 * t) / 2.0
                }
            }
        }
    }

    /// Interpolates between `from` and `to` at progress `t`.
    pub fn interpolate(&self, from: f64, to: f64, t: f64) -> f64 {
        from + (to - from) * self.ease(t)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.function.name(), self.direction.name())
    }
}

impl FromStr for Easing {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidEasing {
            value: s.to_string(),
        };

        let (function, direction) = s.rsplit_once(':').ok_or_else(invalid)?;
        if function.is_empty() {
            return Err(invalid());
        }
        let function = EasingFunction::from_name(function).ok_or_else(invalid)?;
        let direction = EasingDirection::from_name(direction).ok_or_else(invalid)?;
        Ok(Self::new(function, direction))
    }
}
