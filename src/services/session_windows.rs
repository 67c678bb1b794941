use time::{Duration, PrimitiveDateTime};

use crate::core::time::is_unscheduled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlannedWindow {
    pub(crate) start: PrimitiveDateTime,
    pub(crate) end: PrimitiveDateTime,
    pub(crate) duration_minutes: i32,
}

/// A schedule with a sentinel start is "open anytime": the batch anchors at
/// the moment of first access instead.
pub(crate) fn resolve_anchor(
    declared_start: PrimitiveDateTime,
    now: PrimitiveDateTime,
) -> PrimitiveDateTime {
    if is_unscheduled(declared_start) {
        now
    } else {
        declared_start
    }
}

/// Walks the declared exam order, handing each exam a window that begins
/// where the previous one ends. Allotted minutes are recomputed from the
/// window itself to guard against clock-arithmetic drift.
pub(crate) fn plan_windows(anchor: PrimitiveDateTime, durations: &[i32]) -> Vec<PlannedWindow> {
    let mut cursor = anchor;

    durations
        .iter()
        .map(|&minutes| {
            let start = cursor;
            let end = start + Duration::minutes(minutes as i64);
            cursor = end;

            PlannedWindow { start, end, duration_minutes: (end - start).whole_minutes() as i32 }
        })
        .collect()
}

/// The auto-move rewrite: a learner opening an auto-move session before its
/// nominal window gets the full allotment starting now. Re-checked on every
/// fetch; once start <= now the rewrite never fires again.
pub(crate) fn auto_move_window(
    auto_move: bool,
    start: PrimitiveDateTime,
    duration_minutes: i32,
    now: PrimitiveDateTime,
) -> Option<(PrimitiveDateTime, PrimitiveDateTime)> {
    if auto_move && now < start {
        Some((now, now + Duration::minutes(duration_minutes as i64)))
    } else {
        None
    }
}
