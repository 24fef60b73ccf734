//! CSV country tagging.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use countrypip::{GeoPoint, PointLocator};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use indicatif::ProgressBar;
use tracing::warn;

/// Column layout of the input CSV
#[derive(Debug, Clone)]
pub struct Columns {
    pub lon: String,
    pub lat: String,
    pub output: String,
}

/// Totals for a tagging run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TagStats {
    pub rows: u64,
    pub matched: u64,
    /// Rows whose coordinates could not be parsed
    pub invalid: u64,
}

/// Copy `input` to `output`, appending the containing country code to every
/// row. Rows are resolved `chunk_size` at a time.
pub fn tag_csv<R: Read, W: Write>(
    input: R,
    output: W,
    locator: &PointLocator,
    columns: &Columns,
    chunk_size: usize,
    pb: &ProgressBar,
) -> Result<TagStats> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(input);
    let mut csv_writer = WriterBuilder::new().from_writer(output);

    let headers = csv_reader.headers()?.clone();

    // Find column indices
    let lon_idx = headers
        .iter()
        .position(|h| h == columns.lon)
        .with_context(|| format!("Column '{}' not found", columns.lon))?;
    let lat_idx = headers
        .iter()
        .position(|h| h == columns.lat)
        .with_context(|| format!("Column '{}' not found", columns.lat))?;

    let mut out_headers = headers.clone();
    out_headers.push_field(&columns.output);
    csv_writer.write_record(&out_headers)?;

    let mut stats = TagStats::default();
    let mut chunk: Vec<StringRecord> = Vec::with_capacity(chunk_size);

    for result in csv_reader.records() {
        chunk.push(result?);
        if chunk.len() >= chunk_size.max(1) {
            write_chunk(&mut csv_writer, &chunk, locator, lon_idx, lat_idx, &mut stats)?;
            pb.inc(chunk.len() as u64);
            chunk.clear();
        }
    }

    if !chunk.is_empty() {
        write_chunk(&mut csv_writer, &chunk, locator, lon_idx, lat_idx, &mut stats)?;
        pb.inc(chunk.len() as u64);
    }

    csv_writer.flush()?;
    Ok(stats)
}

fn write_chunk<W: Write>(
    writer: &mut csv::Writer<W>,
    chunk: &[StringRecord],
    locator: &PointLocator,
    lon_idx: usize,
    lat_idx: usize,
    stats: &mut TagStats,
) -> Result<()> {
    let points: Vec<Option<GeoPoint>> = chunk
        .iter()
        .map(|record| parse_point(record, lon_idx, lat_idx))
        .collect();

    let valid: Vec<GeoPoint> = points.iter().flatten().copied().collect();
    let mut countries = locator.lookup_batch(&valid)?.into_iter();

    for (record, point) in chunk.iter().zip(&points) {
        stats.rows += 1;

        // Results line up with the valid points only
        let country = match point {
            Some(_) => countries.next().flatten(),
            None => {
                stats.invalid += 1;
                warn!("Skipping row {} with unparsable coordinates", stats.rows);
                None
            }
        };
        if country.is_some() {
            stats.matched += 1;
        }

        let mut out = record.clone();
        out.push_field(country.unwrap_or(""));
        writer.write_record(&out)?;
    }

    Ok(())
}

fn parse_point(record: &StringRecord, lon_idx: usize, lat_idx: usize) -> Option<GeoPoint> {
    let lon = record.get(lon_idx)?.trim().parse().ok()?;
    let lat = record.get(lat_idx)?.trim().parse().ok()?;
    Some(GeoPoint::new(lon, lat))
}
