use std::cmp::Ordering;

use time::PrimitiveDateTime;

use crate::core::time::{is_unscheduled, sentinel_time};
use crate::db::models::{Exam, ExamSession};

/// One exam of a schedule with its session timing merged in. Exams the
/// learner has not touched yet carry sentinel times and sort last.
#[derive(Debug, Clone)]
pub(crate) struct SequenceEntry {
    pub(crate) exam_id: i64,
    pub(crate) exam_string: String,
    pub(crate) title: String,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) submitted: bool,
}

/// Merges session timing into the declared exam order and sorts by start
/// time, scheduled exams first. The sort is stable, so untouched exams keep
/// their declared relative order at the tail.
pub(crate) fn compute_sequence(
    exam_order: &[Exam],
    sessions: &[ExamSession],
) -> Vec<SequenceEntry> {
    let mut entries: Vec<SequenceEntry> = exam_order
        .iter()
        .map(|exam| match sessions.iter().find(|session| session.exam_id == exam.id) {
            Some(session) => SequenceEntry {
                exam_id: exam.id,
                exam_string: exam.exam_string.clone(),
                title: exam.title.clone(),
                start_time: session.start_time,
                end_time: session.end_time,
                submitted: session.submitted,
            },
            None => SequenceEntry {
                exam_id: exam.id,
                exam_string: exam.exam_string.clone(),
                title: exam.title.clone(),
                start_time: sentinel_time(),
                end_time: sentinel_time(),
                submitted: false,
            },
        })
        .collect();

    entries.sort_by(|a, b| compare_start_times(a.start_time, b.start_time));
    entries
}

fn compare_start_times(a: PrimitiveDateTime, b: PrimitiveDateTime) -> Ordering {
    match (is_unscheduled(a), is_unscheduled(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(&b),
    }
}

pub(crate) fn position_of(sequence: &[SequenceEntry], exam_id: i64) -> Option<usize> {
    sequence.iter().position(|entry| entry.exam_id == exam_id)
}

/// An exam counts as completed when explicitly submitted, or when it sits
/// strictly before the exam the learner is currently on. Exams already moved
/// past stay "done" even if their submit call was lost client-side.
pub(crate) fn is_effectively_submitted(
    sequence: &[SequenceEntry],
    index: usize,
    active_exam_id: Option<i64>,
) -> bool {
    if sequence[index].submitted {
        return true;
    }

    match active_exam_id.and_then(|exam_id| position_of(sequence, exam_id)) {
        Some(active_index) => index < active_index,
        None => false,
    }
}

/// The next exam to route the learner to.
pub(crate) fn first_incomplete(
    sequence: &[SequenceEntry],
    active_exam_id: Option<i64>,
) -> Option<&SequenceEntry> {
    (0..sequence.len())
        .find(|&index| !is_effectively_submitted(sequence, index, active_exam_id))
        .map(|index| &sequence[index])
}

/// An empty session list means "not started", which is distinct from "done".
pub(crate) fn all_completed(sessions: &[ExamSession]) -> bool {
    !sessions.is_empty() && sessions.iter().all(|session| session.submitted)
}
