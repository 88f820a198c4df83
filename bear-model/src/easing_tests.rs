use crate::{Easing, EasingDirection, EasingFunction};

fn assert_approx(actual: f64, expected: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-9,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

const DIRECTIONS: [EasingDirection; 3] = [
    EasingDirection::In,
    EasingDirection::Out,
    EasingDirection::InOut,
];

#[test]
fn default_easing_is_none_in() {
    let easing = Easing::default();
    assert_eq!(easing, Easing::IDENTITY);
    assert_eq!(easing.to_string(), "none:in");
}

#[test]
fn none_is_the_identity() {
    for direction in DIRECTIONS {
        let easing = Easing::new(EasingFunction::None, direction);
        for t in [0.1, 0.25, 0.5, 0.8] {
            assert_approx(easing.ease(t), t);
        }
    }
}

#[test]
fn every_curve_starts_at_zero_and_ends_at_one() {
    for function in EasingFunction::ALL {
        for direction in DIRECTIONS {
            let easing = Easing::new(function, direction);
            assert_eq!(easing.ease(0.0), 0.0, "{easing}");
            assert_eq!(easing.ease(1.0), 1.0, "{easing}");
        }
    }
}

#[test]
fn progress_is_clamped() {
    let easing = Easing::new(EasingFunction::Quad, EasingDirection::In);
    assert_eq!(easing.ease(-3.0), 0.0);
    assert_eq!(easing.ease(7.0), 1.0);
    assert_eq!(easing.ease(f64::NAN), 0.0);
}

#[test]
fn directions_shape_the_curve() {
    let quad_in = Easing::new(EasingFunction::Quad, EasingDirection::In);
    let quad_out = Easing::new(EasingFunction::Quad, EasingDirection::Out);
    let quad_in_out = Easing::new(EasingFunction::Quad, EasingDirection::InOut);

    assert_approx(quad_in.ease(0.5), 0.25);
    assert_approx(quad_out.ease(0.5), 0.75);
    assert_approx(quad_in_out.ease(0.5), 0.5);
    assert_approx(quad_in_out.ease(0.25), 0.125);
    assert_approx(quad_in_out.ease(0.75), 0.875);
}

#[test]
fn interpolate_maps_the_eased_progress() {
    let easing = Easing::new(EasingFunction::Linear, EasingDirection::In);
    assert_approx(easing.interpolate(10.0, 20.0, 0.3), 13.0);
    assert_approx(easing.interpolate(10.0, -10.0, 1.0), -10.0);
}

#[test]
fn names_parse_back() {
    for function in EasingFunction::ALL {
        for direction in DIRECTIONS {
            let easing = Easing::new(function, direction);
            let parsed: Easing = easing.to_string().parse().unwrap();
            assert_eq!(parsed, easing);
        }
    }

    let easing: Easing = "elastic:in_out".parse().unwrap();
    assert_eq!(easing.function, EasingFunction::Elastic);
    assert_eq!(easing.direction, EasingDirection::InOut);
}

#[test]
fn unknown_names_are_rejected() {
    for input in ["", "quad", "quad:", ":in", "wobble:in", "quad:sideways"] {
        let err = input.parse::<Easing>().unwrap_err();
        assert!(err.is_invalid_format(), "{input}: {err}");
    }
}

#[test]
fn codes_match_the_compiled_format() {
    assert_eq!(EasingFunction::Back.code(), 1);
    assert_eq!(EasingFunction::None.code(), 8);
    assert_eq!(EasingFunction::Sine.code(), 12);
    assert_eq!(EasingDirection::InOut.code(), 3);

    let easing = Easing::from_codes(9, 2).unwrap();
    assert_eq!(easing, Easing::new(EasingFunction::Quad, EasingDirection::Out));

    assert!(Easing::from_codes(0, 1).is_err());
    assert!(Easing::from_codes(13, 1).is_err());
    assert!(Easing::from_codes(1, 4).is_err());
}
