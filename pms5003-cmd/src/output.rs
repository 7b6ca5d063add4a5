use std::io::Write;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use pms5003::{Error, Measurement, TimestampedMeasurement};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct OutputOpts {
    pub with_timestamp: bool,
    pub with_header: bool,
}

/// JSON line for a single measurement.
#[derive(Serialize)]
struct Row<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(flatten)]
    measurement: &'a Measurement,
}

fn format_timestamp(tm: &TimestampedMeasurement) -> String {
    tm.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Pull measurements until the stream is closed.
///
/// Returns the number of measurements handled. Any stream error other than
/// [Error::StreamClosed] is returned as an error.
fn drain<I, F>(measurements: I, mut handle: F) -> Result<usize>
where
    I: Iterator<Item = pms5003::Result<TimestampedMeasurement>>,
    F: FnMut(&TimestampedMeasurement) -> Result<()>,
{
    let mut count = 0;
    for zult in measurements {
        match zult {
            Ok(tm) => {
                handle(&tm)?;
                count += 1;
            }
            Err(Error::StreamClosed) => {
                debug!("stream closed after {count} measurements");
                break;
            }
            Err(err) => return Err(err).context("reading measurements"),
        }
    }
    Ok(count)
}

/// Write measurements as CSV rows, flushing after each row.
pub fn write_csv<I, W>(measurements: I, dest: W, opts: &OutputOpts) -> Result<usize>
where
    I: Iterator<Item = pms5003::Result<TimestampedMeasurement>>,
    W: Write,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(dest);

    if opts.with_header {
        let mut header: Vec<&str> = Vec::with_capacity(Measurement::NUM_FIELDS + 1);
        if opts.with_timestamp {
            header.push("timestamp");
        }
        header.extend(Measurement::FIELD_NAMES);
        writer.write_record(&header)?;
        writer.flush()?;
    }

    drain(measurements, |tm| {
        let mut record: Vec<String> = Vec::with_capacity(Measurement::NUM_FIELDS + 1);
        if opts.with_timestamp {
            record.push(format_timestamp(tm));
        }
        record.extend(tm.measurement.fields().iter().map(ToString::to_string));
        writer.write_record(&record)?;
        writer.flush().context("flushing csv output")
    })
}

/// Write measurements as JSON lines, flushing after each line.
pub fn write_json<I, W>(measurements: I, mut dest: W, opts: &OutputOpts) -> Result<usize>
where
    I: Iterator<Item = pms5003::Result<TimestampedMeasurement>>,
    W: Write,
{
    drain(measurements, |tm| {
        let row = Row {
            timestamp: opts.with_timestamp.then(|| format_timestamp(tm)),
            measurement: &tm.measurement,
        };
        serde_json::to_writer(&mut dest, &row)?;
        writeln!(dest)?;
        dest.flush().context("flushing json output")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn sample() -> Vec<pms5003::Result<TimestampedMeasurement>> {
        let timestamp: DateTime<Utc> = "2024-05-01T12:30:00.25Z".parse().unwrap();
        vec![
            Ok(TimestampedMeasurement {
                timestamp,
                measurement: Measurement::from_fields([
                    10, 20, 30, 10, 20, 30, 100, 90, 80, 70, 60, 50, 0,
                ]),
            }),
            Err(Error::StreamClosed),
        ]
    }

    #[test]
    fn csv_with_header_and_timestamp() {
        let mut buf = Vec::new();
        let opts = OutputOpts {
            with_timestamp: true,
            with_header: true,
        };
        let n = write_csv(sample().into_iter(), &mut buf, &opts).unwrap();

        assert_eq!(n, 1);
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "timestamp,pm1_0,pm2_5,pm10,pm1_0_atm,pm2_5_atm,pm10_atm,count_gt_0_3um,\
             count_gt_0_5um,count_gt_1_0um,count_gt_2_5um,count_gt_5_0um,count_gt_10um,reserved"
        );
        assert_eq!(
            lines[1],
            "2024-05-01T12:30:00.250000Z,10,20,30,10,20,30,100,90,80,70,60,50,0"
        );
    }

    #[test]
    fn csv_without_header_or_timestamp() {
        let mut buf = Vec::new();
        let opts = OutputOpts {
            with_timestamp: false,
            with_header: false,
        };
        write_csv(sample().into_iter(), &mut buf, &opts).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "10,20,30,10,20,30,100,90,80,70,60,50,0\n");
    }

    #[test]
    fn json_lines() {
        let mut buf = Vec::new();
        let opts = OutputOpts {
            with_timestamp: true,
            with_header: false,
        };
        write_json(sample().into_iter(), &mut buf, &opts).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["timestamp"], "2024-05-01T12:30:00.250000Z");
        assert_eq!(value["pm2_5"], 20);
        assert_eq!(value["count_gt_0_3um"], 100);
        assert_eq!(value["reserved"], 0);
    }

    #[test]
    fn json_without_timestamp() {
        let mut buf = Vec::new();
        let opts = OutputOpts {
            with_timestamp: false,
            with_header: false,
        };
        write_json(sample().into_iter(), &mut buf, &opts).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert!(value.get("timestamp").is_none());
        assert_eq!(value["pm10"], 30);
    }

    #[test]
    fn stream_errors_are_returned() {
        let measurements = vec![Err(Error::Io(std::io::Error::from(
            std::io::ErrorKind::BrokenPipe,
        )))];
        let opts = OutputOpts {
            with_timestamp: true,
            with_header: false,
        };
        assert!(write_json(measurements.into_iter(), Vec::<u8>::new(), &opts).is_err());
    }
}
