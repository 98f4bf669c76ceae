//! Progress events pushed by long-running operations

use std::sync::mpsc::Sender;

/// What a progress event refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// About to transform `Progress::sheet`
    Sheet,
    /// Remote job update, with the service's message
    Remote(String),
    /// Run finished
    Done,
}

/// One progress update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Sheets finished so far
    pub completed: usize,
    pub total: usize,
    /// 0..=100, never decreasing within a run, including a local run that
    /// takes over from a failed remote job
    pub percent: u8,
    pub sheet: Option<String>,
    pub stage: Stage,
}

impl Progress {
    pub(crate) fn sheet(completed: usize, total: usize, name: &str) -> Self {
        Self {
            completed,
            total,
            percent: percent(completed, total),
            sheet: Some(name.to_string()),
            stage: Stage::Sheet,
        }
    }

    pub(crate) fn done(total: usize) -> Self {
        Self {
            completed: total,
            total,
            percent: 100,
            sheet: None,
            stage: Stage::Done,
        }
    }

    pub(crate) fn remote(percent: u8, message: &str) -> Self {
        Self {
            completed: 0,
            total: 0,
            percent: percent.min(100),
            sheet: None,
            stage: Stage::Remote(message.to_string()),
        }
    }
}

fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed.min(total) * 100) / total) as u8
}

/// Receiver of progress events
pub trait ProgressSink {
    fn report(&mut self, progress: Progress);
}

impl<F: FnMut(Progress)> ProgressSink for F {
    fn report(&mut self, progress: Progress) {
        self(progress)
    }
}

/// A dropped receiver is not an error; the run carries on
impl ProgressSink for Sender<Progress> {
    fn report(&mut self, progress: Progress) {
        let _ = self.send(progress);
    }
}

/// Maps a run's 0..=100 onto the range left over after `floor`
///
/// Used when local translation takes over from a remote job that had
/// already reported progress, so the combined stream never goes back.
pub(crate) struct Resumed<'a, S: ?Sized> {
    inner: &'a mut S,
    floor: u8,
}

impl<'a, S: ProgressSink + ?Sized> Resumed<'a, S> {
    pub(crate) fn new(inner: &'a mut S, floor: u8) -> Self {
        Self {
            inner,
            floor: floor.min(100),
        }
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for Resumed<'_, S> {
    fn report(&mut self, mut progress: Progress) {
        let span = 100 - self.floor as u32;
        progress.percent = self.floor + ((progress.percent.min(100) as u32 * span) / 100) as u8;
        self.inner.report(progress);
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _progress: Progress) {}
}
