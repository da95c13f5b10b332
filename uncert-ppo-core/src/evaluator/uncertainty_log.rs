//! Append-only text log of per-step uncertainties.
use super::EvalMode;
use crate::UncertaintyPair;
use anyhow::Result;
use chrono::Local;
use log::info;
use std::{
    fs::{self, File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

const HEADER: &str = "episode\tindex\tscore\tsigma\tepistemic\taleatoric";

/// One line of an [`UncertaintyLog`].
#[derive(Debug, Clone, PartialEq)]
pub struct UncertaintyEntry {
    /// Training episode after which the evaluation ran.
    pub episode: usize,

    /// Index of the rollout in the evaluation.
    pub index: usize,

    /// Total reward of the rollout.
    pub score: f32,

    /// Observation noise of the environment during the rollout.
    pub sigma: f32,

    /// Uncertainty at each step of the rollout.
    pub uncertainties: Vec<UncertaintyPair>,
}

/// Uncertainty log stored in `<dir>/<mode>/<model_name>.txt`.
///
/// Each line holds the episode, the rollout index, the score, the noise level
/// and the comma-separated epistemic and aleatoric sequences, separated by tabs.
#[derive(Debug, Clone)]
pub struct UncertaintyLog {
    path: PathBuf,
}

impl UncertaintyLog {
    /// Returns the path of the log for the given mode and model.
    pub fn path_for(dir: impl AsRef<Path>, mode: EvalMode, model_name: &str) -> PathBuf {
        dir.as_ref()
            .join(mode.as_str())
            .join(format!("{}.txt", model_name))
    }

    /// Creates the log, truncating an existing one, and writes the header.
    pub fn init(dir: impl AsRef<Path>, mode: EvalMode, model_name: &str) -> Result<Self> {
        let path = Self::path_for(dir, mode, model_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&path)?;
        writeln!(file, "# created at {}", Local::now().to_rfc3339())?;
        writeln!(file, "{}", HEADER)?;
        info!("Initialized uncertainty log {:?}", &path);
        Ok(Self { path })
    }

    /// Opens an existing log for appending.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends the uncertainties of a rollout.
    pub fn append(
        &mut self,
        episode: usize,
        index: usize,
        score: f32,
        uncertainties: &[UncertaintyPair],
        sigma: f32,
    ) -> Result<()> {
        let join = |f: fn(&UncertaintyPair) -> f32| {
            uncertainties
                .iter()
                .map(|u| f(u).to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(
            file,
            "{}\t{}\t{}\t{}\t{}\t{}",
            episode,
            index,
            score,
            sigma,
            join(|u| u.epistemic),
            join(|u| u.aleatoric)
        )?;
        Ok(())
    }

    /// Reads all entries of the log.
    pub fn read(&self) -> Result<Vec<UncertaintyEntry>> {
        let rdr = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();

        for line in rdr.lines() {
            let line = line?;
            if line.starts_with('#') || line == HEADER || line.is_empty() {
                continue;
            }
            let cols = line.split('\t').collect::<Vec<_>>();
            anyhow::ensure!(cols.len() == 6, "Malformed uncertainty log line: {}", line);
            let parse_seq = |s: &str| -> Result<Vec<f32>> {
                if s.is_empty() {
                    return Ok(vec![]);
                }
                Ok(s
                    .split(',')
                    .map(|v| v.parse::<f32>())
                    .collect::<Result<Vec<_>, _>>()?)
            };
            let epis = parse_seq(cols[4])?;
            let aleat = parse_seq(cols[5])?;
            entries.push(UncertaintyEntry {
                episode: cols[0].parse()?,
                index: cols[1].parse()?,
                score: cols[2].parse()?,
                sigma: cols[3].parse()?,
                uncertainties: epis
                    .into_iter()
                    .zip(aleat)
                    .map(|(e, a)| UncertaintyPair::new(e, a))
                    .collect(),
            });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_append_and_read() -> Result<()> {
        let dir = TempDir::new("uncertainty_log")?;
        let mut log = UncertaintyLog::init(dir.path(), EvalMode::Eval, "bootstrap")?;
        assert_eq!(
            log.path(),
            dir.path().join("eval").join("bootstrap.txt").as_path()
        );

        let u = vec![UncertaintyPair::new(0.5, 0.0), UncertaintyPair::new(0.25, 0.0)];
        log.append(9, 0, -10.5, &u, 0.1)?;
        log.append(9, 1, -3.0, &u[..1], 0.1)?;

        let entries = log.read()?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].episode, 9);
        assert_eq!(entries[0].uncertainties, u);
        assert_eq!(entries[1].index, 1);
        assert_eq!(entries[1].score, -3.0);
        assert_eq!(entries[1].sigma, 0.1);
        Ok(())
    }

    #[test]
    fn test_init_truncates() -> Result<()> {
        let dir = TempDir::new("uncertainty_log")?;
        let mut log = UncertaintyLog::init(dir.path(), EvalMode::Test, "base")?;
        log.append(0, 0, 1.0, &[UncertaintyPair::default()], 0.0)?;
        let log = UncertaintyLog::init(dir.path(), EvalMode::Test, "base")?;
        assert!(log.read()?.is_empty());
        Ok(())
    }
}
