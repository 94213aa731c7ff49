//! Point awards and guess normalization.
//!
//! Both awards shrink as the round runs out and never drop below one
//! point. The guesser's award is always at least the explainer's, so
//! explaining badly to deny an opponent points never pays.

/// Guesser award for an instant guess.
pub const MAX_GUESSER_POINTS: u32 = 10;

/// Explainer award for an instant guess.
pub const MAX_EXPLAINER_POINTS: u32 = 5;

/// Points for a correct guess with `remaining_fraction` of the round left.
pub fn guesser_points(remaining_fraction: f64) -> u32 {
    award(MAX_GUESSER_POINTS, remaining_fraction)
}

/// Points for the explainer whose word was guessed with
/// `remaining_fraction` of the round left.
pub fn explainer_points(remaining_fraction: f64) -> u32 {
    award(MAX_EXPLAINER_POINTS, remaining_fraction)
}

fn award(max: u32, remaining_fraction: f64) -> u32 {
    let fraction = if remaining_fraction.is_nan() {
        0.0
    } else {
        remaining_fraction.clamp(0.0, 1.0)
    };
    ((f64::from(max) * fraction).ceil() as u32).max(1)
}

/// Lowercases, trims, and drops inner spaces so "  Ice Cream " matches
/// "icecream".
pub(crate) fn normalize_guess(text: &str) -> String {
    text.trim().to_lowercase().replace(' ', "")
}
