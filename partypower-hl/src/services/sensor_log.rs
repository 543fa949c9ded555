//! Sensor stream reader and writer
//!
//! Comma-delimited rows, header first:
//!
//! ```text
//! timestamp,accel_x,accel_y,accel_z,gyro_x,gyro_y,gyro_z,
//! attitude_roll,attitude_pitch,attitude_yaw,gravity_x,gravity_y,gravity_z,
//! audio_power_db,proximity,bpm
//! ```
//!
//! Short or malformed rows are skipped and counted, never fatal.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{Attitude, SensorSample, Vec3};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Column header written and expected as the first row
pub const SENSOR_LOG_HEADER: &str = "timestamp,accel_x,accel_y,accel_z,gyro_x,gyro_y,gyro_z,\
attitude_roll,attitude_pitch,attitude_yaw,gravity_x,gravity_y,gravity_z,audio_power_db,proximity,bpm";

/// Fields per row
pub const SENSOR_LOG_FIELDS: usize = 16;

/// Parsed sensor log with skip accounting
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub samples: Vec<SensorSample>,
    /// Rows dropped as short, malformed or out of order
    pub skipped: usize,
    /// 1-based line number of the first dropped row
    pub first_bad_line: Option<usize>,
}

impl ParseReport {
    fn skip(&mut self, line_number: usize) {
        self.skipped += 1;
        self.first_bad_line.get_or_insert(line_number);
    }
}

fn parse_bool(field: &str) -> Option<bool> {
    match field.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Parse one data row; `None` for short or malformed rows
pub fn parse_row(line: &str) -> Option<SensorSample> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < SENSOR_LOG_FIELDS {
        return None;
    }

    let mut numbers = [0.0f64; 14];
    for (slot, field) in numbers.iter_mut().zip(&fields[..14]) {
        let value: f64 = field.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        *slot = value;
    }

    let proximity = parse_bool(fields[14])?;
    let bpm: f64 = fields[15].parse().ok()?;
    let recorded_bpm = if bpm.is_finite() && bpm > 0.0 {
        bpm.round() as u32
    } else {
        0
    };

    Some(SensorSample {
        t: numbers[0],
        accel: Vec3::new(numbers[1], numbers[2], numbers[3]),
        gyro: Vec3::new(numbers[4], numbers[5], numbers[6]),
        attitude: Attitude {
            roll: numbers[7],
            pitch: numbers[8],
            yaw: numbers[9],
        },
        gravity: Vec3::new(numbers[10], numbers[11], numbers[12]),
        audio_power_db: numbers[13],
        proximity,
        recorded_bpm,
    })
}

/// Parse a sensor log from any buffered reader
///
/// The first line is treated as the header unless it parses as data. Rows
/// whose timestamp goes backwards are skipped to keep samples ordered.
pub fn parse_sensor_log<R: BufRead>(reader: R) -> AnalysisResult<ParseReport> {
    let mut report = ParseReport::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;

        if line.trim().is_empty() {
            continue;
        }

        match parse_row(&line) {
            Some(sample) => {
                let in_order = report.samples.last().map_or(true, |last| sample.t >= last.t);
                if in_order {
                    report.samples.push(sample);
                } else {
                    report.skip(line_number);
                }
            }
            // Header row
            None if line_number == 1 => continue,
            None => report.skip(line_number),
        }
    }

    if report.skipped > 0 {
        warn!(
            skipped = report.skipped,
            first_bad_line = report.first_bad_line,
            kept = report.samples.len(),
            "Skipped malformed sensor rows"
        );
    }
    debug!(samples = report.samples.len(), "Sensor log parsed");

    Ok(report)
}

/// Parse a sensor log file
pub fn parse_sensor_file(path: &Path) -> AnalysisResult<ParseReport> {
    let file = File::open(path).map_err(|e| {
        AnalysisError::SensorLog(format!("Failed to open {}: {}", path.display(), e))
    })?;
    parse_sensor_log(BufReader::new(file))
}

/// Format one sample as a data row (no trailing newline)
pub fn format_row(sample: &SensorSample) -> String {
    format!(
        "{:.3},{},{},{},{},{},{},{},{},{},{},{},{},{:.2},{},{}",
        sample.t,
        sample.accel.x,
        sample.accel.y,
        sample.accel.z,
        sample.gyro.x,
        sample.gyro.y,
        sample.gyro.z,
        sample.attitude.roll,
        sample.attitude.pitch,
        sample.attitude.yaw,
        sample.gravity.x,
        sample.gravity.y,
        sample.gravity.z,
        sample.audio_power_db,
        u8::from(sample.proximity),
        sample.recorded_bpm
    )
}

/// Streaming writer producing the sensor log format
pub struct SensorLogWriter<W: Write> {
    out: W,
    rows: usize,
}

impl SensorLogWriter<BufWriter<File>> {
    /// Create a log file, writing the header row
    pub fn create(path: &Path) -> AnalysisResult<Self> {
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> SensorLogWriter<W> {
    /// Wrap a writer, writing the header row
    pub fn new(mut out: W) -> AnalysisResult<Self> {
        writeln!(out, "{}", SENSOR_LOG_HEADER)?;
        Ok(Self { out, rows: 0 })
    }

    pub fn append(&mut self, sample: &SensorSample) -> AnalysisResult<()> {
        writeln!(self.out, "{}", format_row(sample))?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far (excluding header)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> AnalysisResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
