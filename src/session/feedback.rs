//! Thumbs up / thumbs down toggling
//!
//! Feedback is purely local: nothing here talks to the backend.

use crate::session::message::{Feedback, Rating};
use crate::session::store::MessageStore;

/// Next rating after the user presses `requested`
///
/// Pressing the active rating clears it; pressing the other one switches
/// directly without passing through `None`.
///
/// # Examples
///
/// ```
/// use chatline::session::{toggled, Feedback, Rating};
///
/// assert_eq!(toggled(Feedback::None, Rating::Up), Feedback::Up);
/// assert_eq!(toggled(Feedback::Up, Rating::Up), Feedback::None);
/// assert_eq!(toggled(Feedback::Up, Rating::Down), Feedback::Down);
/// ```
pub fn toggled(current: Feedback, requested: Rating) -> Feedback {
    let requested = Feedback::from(requested);
    if current == requested {
        Feedback::None
    } else {
        requested
    }
}

/// Toggle the rating of the message at `index`
///
/// Returns the new rating, or `None` when the position is out of range or
/// holds a user message (in which case nothing changes).
pub fn toggle_feedback(
    store: &mut MessageStore,
    index: usize,
    requested: Rating,
) -> Option<Feedback> {
    let current = store.get(index)?.feedback();
    let next = toggled(current, requested);
    store.set_feedback(index, next).then_some(next)
}
