//! Per-document state shared by the tasks written into one sink.

use isoxml_common::IdGenerator;

use crate::presentation::ValuePresentations;
use crate::sink::TaskDataSink;

/// A task data document being written.
///
/// Owns the sink, the id source and the value presentations collected so
/// far, so ids and presentations stay unique across every task in it.
pub struct TaskDataDocument<S, G> {
    pub(crate) sink: S,
    pub(crate) ids: G,
    pub(crate) presentations: ValuePresentations,
}

impl<S: TaskDataSink, G: IdGenerator> TaskDataDocument<S, G> {
    pub fn new(sink: S, ids: G) -> Self {
        Self {
            sink,
            ids,
            presentations: ValuePresentations::new(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn presentations(&self) -> &ValuePresentations {
        &self.presentations
    }

    /// Give back the sink, e.g. to call [`crate::DirectorySink::finish`].
    pub fn into_sink(self) -> S {
        self.sink
    }
}
