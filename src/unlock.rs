//! Lesson unlock policy.
//!
//! Lessons unlock strictly in the order the backend serves them: the
//! first lesson is always playable, every later one requires the one
//! before it to be completed.

use std::collections::BTreeSet;

use crate::domain::Lesson;

/// Whether the lesson at `index` in the ordered list is playable given
/// the set of completed lesson ids. Out-of-range indexes are locked.
pub fn is_unlocked(lessons: &[Lesson], completed: &BTreeSet<i64>, index: usize) -> bool {
    if index >= lessons.len() {
        return false;
    }
    if index == 0 {
        return true;
    }
    completed.contains(&lessons[index - 1].id)
}

/// Index of the first lesson that is unlocked but not yet completed, if
/// any. This is where a resumed session should drop the player.
pub fn next_playable(lessons: &[Lesson], completed: &BTreeSet<i64>) -> Option<usize> {
    (0..lessons.len())
        .find(|&i| !completed.contains(&lessons[i].id) && is_unlocked(lessons, completed, i))
}
