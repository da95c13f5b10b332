use super::{Record, RecordValue};
use log::info;

/// Writes a record to an output destination with [`Recorder::write`].
pub trait Recorder {
    /// Write a record to the [`Recorder`].
    fn write(&mut self, record: Record);

    /// Flushes records kept in the recorder, if any.
    fn flush(&mut self) {}
}

impl<R: Recorder + ?Sized> Recorder for Box<R> {
    fn write(&mut self, record: Record) {
        (**self).write(record)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

/// Writes scalar values of records to the log with level `info`.
#[derive(Default)]
pub struct LogRecorder {}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        let mut items = record
            .iter()
            .filter_map(|(k, v)| match v {
                RecordValue::Scalar(v) => Some(format!("{}: {:.4}", k, v)),
                _ => None,
            })
            .collect::<Vec<_>>();
        items.sort();
        info!("{}", items.join(", "));
    }
}

/// Writes records to a number of recorders.
#[derive(Default)]
pub struct TeeRecorder {
    recorders: Vec<Box<dyn Recorder>>,
}

impl TeeRecorder {
    /// Constructs a [`TeeRecorder`] without any destination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a destination.
    pub fn push(mut self, recorder: Box<dyn Recorder>) -> Self {
        self.recorders.push(recorder);
        self
    }
}

impl Recorder for TeeRecorder {
    fn write(&mut self, record: Record) {
        for recorder in self.recorders.iter_mut() {
            recorder.write(record.clone());
        }
    }

    fn flush(&mut self) {
        for recorder in self.recorders.iter_mut() {
            recorder.flush();
        }
    }
}
