//! Scalar logging for training runs
//!
//! Diagnostics are written as `step,tag,value,wall_time` rows to
//! `scalars.csv`, a layout that plotting scripts or a Tensorboard
//! converter can read directly.

use std::fs::{File, create_dir_all};
use std::io::{Write, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::Result;

/// Destination of scalar diagnostics.
pub trait ScalarSink {
    /// Record `value` under `tag` at `step`.
    fn direct_write(&mut self, tag: &str, value: f32, step: usize) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// CSV-backed scalar writer
pub struct TensorboardWriter {
    log_dir: PathBuf,
    start_time: Instant,
    scalar_writer: BufWriter<File>,
}

impl TensorboardWriter {
    /// Create a writer logging into `log_dir`, creating the directory if needed.
    pub fn new(log_dir: impl AsRef<Path>) -> Result<Self> {
        let log_path = log_dir.as_ref().to_path_buf();
        create_dir_all(&log_path)?;

        let scalar_file = File::create(log_path.join("scalars.csv"))?;
        let mut scalar_writer = BufWriter::new(scalar_file);
        writeln!(scalar_writer, "step,tag,value,wall_time")?;

        Ok(Self {
            log_dir: log_path,
            start_time: Instant::now(),
            scalar_writer,
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Seconds since the writer was created
    fn get_wall_time(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

impl ScalarSink for TensorboardWriter {
    fn direct_write(&mut self, tag: &str, value: f32, step: usize) -> Result<()> {
        let wall_time = self.get_wall_time();
        writeln!(self.scalar_writer, "{},{},{},{:.3}", step, tag, value, wall_time)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.scalar_writer.flush()?;
        Ok(())
    }
}

impl Drop for TensorboardWriter {
    fn drop(&mut self) {
        let _ = self.scalar_writer.flush();
    }
}

/// One recorded scalar.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarRecord {
    pub tag: String,
    pub value: f32,
    pub step: usize,
}

/// In-memory sink, used by tests and for runs that only need the summary.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub records: Vec<ScalarRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All values logged under `tag`, in logging order.
    pub fn values(&self, tag: &str) -> Vec<f32> {
        self.records.iter().filter(|r| r.tag == tag).map(|r| r.value).collect()
    }
}

impl ScalarSink for MemorySink {
    fn direct_write(&mut self, tag: &str, value: f32, step: usize) -> Result<()> {
        self.records.push(ScalarRecord {
            tag: tag.to_string(),
            value,
            step,
        });
        Ok(())
    }
}

impl<S: ScalarSink + ?Sized> ScalarSink for &mut S {
    fn direct_write(&mut self, tag: &str, value: f32, step: usize) -> Result<()> {
        (**self).direct_write(tag, value, step)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
