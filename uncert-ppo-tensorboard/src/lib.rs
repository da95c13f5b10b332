//! Writes records of training to TFRecord files readable by Tensorboard.
use log::warn;
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter;
use uncert_ppo_core::record::{Record, RecordValue, Recorder};

/// Suffix of the keys holding the step of a record, like `"Train Episode"`.
const STEP_SUFFIX: &str = " Episode";

/// Write records to TFRecord.
///
/// The step of each record is taken from the key ending with `" Episode"`,
/// which the trainer and the evaluator put in every record they emit.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
        }
    }
}

fn step_of(record: &Record) -> Option<(&str, usize)> {
    record.iter().find_map(|(k, v)| match v {
        RecordValue::Scalar(v) if k.ends_with(STEP_SUFFIX) => Some((k.as_str(), *v as usize)),
        _ => None,
    })
}

impl Recorder for TensorboardRecorder {
    /// Write a given [Record] into a TFRecord.
    ///
    /// Only [RecordValue::Scalar] values are written. A record without a step
    /// key is skipped.
    fn write(&mut self, record: Record) {
        let (step_key, step) = match step_of(&record) {
            Some(s) => s,
            None => {
                warn!("Record without an episode key is not written to Tensorboard");
                return;
            }
        };

        for (k, v) in record.iter() {
            if k != step_key {
                if let RecordValue::Scalar(v) = v {
                    self.writer.add_scalar(k, *v, step);
                }
            }
        }
    }

    fn flush(&mut self) {
        self.writer.flush();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Local;
    use tempdir::TempDir;

    #[test]
    fn test_step_of() {
        let record = Record::from_slice(&[
            ("Episode Score", RecordValue::Scalar(3.0)),
            ("Train Episode", RecordValue::Scalar(12.0)),
        ]);
        assert_eq!(step_of(&record), Some(("Train Episode", 12)));

        let record = Record::from_scalar("policy_loss", 0.1);
        assert_eq!(step_of(&record), None);
    }

    #[test]
    fn test_write_records() -> std::io::Result<()> {
        let dir = TempDir::new("tensorboard_recorder")?;
        let mut recorder = TensorboardRecorder::new(dir.path());
        recorder.write(Record::from_slice(&[
            ("Eval Episode", RecordValue::Scalar(0.0)),
            ("Eval Mean Score", RecordValue::Scalar(-300.0)),
            ("Datetime", RecordValue::DateTime(Local::now())),
        ]));
        recorder.write(Record::from_scalar("policy_loss", 0.1));
        recorder.flush();

        assert!(std::fs::read_dir(dir.path())?.next().is_some());
        Ok(())
    }
}
