use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray, Float64Array, UInt64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{CategoricalField, NumericField, Table, VideoRecord};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the video table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – the dataset as published, one header row
/// * `.json`    – `[{ "claim_status": "claim", "video_view_count": 343296.0, ... }, ...]`
/// * `.parquet` – one column per field, any numeric/string physical type
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::info!("Loaded {} records from {}", table.len(), path.display());
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the dataset's column names (`#`,
/// `claim_status`, `video_id`, ...). Unknown columns are ignored, missing
/// columns load as absent values.
fn load_csv(path: &Path) -> Result<Table> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Table> {
    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<VideoRecord>().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(record);
    }
    Ok(Table::from_records(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let records: Vec<VideoRecord> = serde_json::from_str(&text).context("parsing JSON")?;
    Ok(Table::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by Pandas or Polars.
///
/// Columns are matched by name and cast: categorical and text columns to
/// `Utf8`, measurements to `Float64`, `#` and `video_id` to `UInt64`.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        append_batch(&batch, &mut records)?;
    }
    Ok(Table::from_records(records))
}

fn append_batch(batch: &RecordBatch, records: &mut Vec<VideoRecord>) -> Result<()> {
    let start = records.len();
    records.resize_with(start + batch.num_rows(), VideoRecord::default);
    let rows = &mut records[start..];

    for field in CategoricalField::ALL {
        if let Some(values) = string_column(batch, field.as_str())? {
            for (record, value) in rows.iter_mut().zip(values) {
                record.set_categorical(field, value);
            }
        }
    }
    for field in NumericField::ALL {
        if let Some(col) = typed_column(batch, field.as_str(), &DataType::Float64)? {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array after cast")?;
            for (record, value) in rows.iter_mut().zip(arr.iter()) {
                record.set_numeric(field, value);
            }
        }
    }
    if let Some(values) = string_column(batch, "video_transcription_text")? {
        for (record, value) in rows.iter_mut().zip(values) {
            record.video_transcription_text = value;
        }
    }
    if let Some(values) = u64_column(batch, "#")? {
        for (record, value) in rows.iter_mut().zip(values) {
            record.row_number = value;
        }
    }
    if let Some(values) = u64_column(batch, "video_id")? {
        for (record, value) in rows.iter_mut().zip(values) {
            record.video_id = value;
        }
    }
    Ok(())
}

/// Column `name` cast to `target`, or `None` when the batch lacks it.
fn typed_column(
    batch: &RecordBatch,
    name: &str,
    target: &DataType,
) -> Result<Option<Arc<dyn Array>>> {
    let Ok(idx) = batch.schema().index_of(name) else {
        return Ok(None);
    };
    let col = cast(batch.column(idx), target)
        .with_context(|| format!("casting column '{name}' to {target:?}"))?;
    Ok(Some(col))
}

fn u64_column(batch: &RecordBatch, name: &str) -> Result<Option<Vec<Option<u64>>>> {
    let Some(col) = typed_column(batch, name, &DataType::UInt64)? else {
        return Ok(None);
    };
    let arr = col
        .as_any()
        .downcast_ref::<UInt64Array>()
        .context("expected UInt64Array after cast")?;
    Ok(Some(arr.iter().collect()))
}

fn string_column(batch: &RecordBatch, name: &str) -> Result<Option<Vec<Option<String>>>> {
    let Some(col) = typed_column(batch, name, &DataType::Utf8)? else {
        return Ok(None);
    };
    let arr = col.as_string::<i32>();
    Ok(Some(
        arr.iter().map(|v| v.map(str::to_string)).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = "\
#,claim_status,video_id,video_duration_sec,video_transcription_text,verified_status,author_ban_status,video_view_count,video_like_count,video_share_count,video_download_count,video_comment_count
1,claim,7017666017,59,someone shared with me that drone deliveries are already happening,not verified,under review,343296.0,19425.0,241.0,1.0,0.0
2,opinion,4014381136,32,,verified,active,,,,,
3,,9859838091,31,someone shared with me that a pineapple can float,not verified,active,902185.0,97690.0,2858.0,833.0,329.0
";

    fn write_temp(ext: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(ext)
            .tempfile()
            .expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn loads_published_csv_layout() {
        let file = write_temp(".csv", SAMPLE);
        let table = load_file(file.path()).expect("load csv");
        assert_eq!(table.len(), 3);

        let first = table.get(0).unwrap();
        assert_eq!(first.row_number, Some(1));
        assert_eq!(first.video_id, Some(7017666017));
        assert_eq!(first.categorical(CategoricalField::AuthorBanStatus), Some("under review"));
        assert_eq!(first.numeric(NumericField::VideoViewCount), Some(343296.0));

        let second = table.get(1).unwrap();
        assert_eq!(second.numeric(NumericField::VideoLikeCount), None);
        assert_eq!(second.transcription(), None);

        let third = table.get(2).unwrap();
        assert_eq!(third.categorical(CategoricalField::ClaimStatus), None);
    }

    #[test]
    fn loads_records_json() {
        let json = r#"[
            {"claim_status": "claim", "verified_status": "verified", "video_duration_sec": 12.0},
            {"claim_status": "opinion", "video_duration_sec": null}
        ]"#;
        let file = write_temp(".json", json);
        let table = load_file(file.path()).expect("load json");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0).unwrap().numeric(NumericField::VideoDurationSec), Some(12.0));
        assert_eq!(table.get(1).unwrap().verified_status, None);
    }

    #[test]
    fn malformed_row_reports_position() {
        let bad = "claim_status,video_view_count\nclaim,lots\n";
        let file = write_temp(".csv", bad);
        let err = load_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 0"));
    }

    fn parquet_batch(ids: &[i64], claims: &[Option<&str>], views: &[Option<i64>]) -> RecordBatch {
        use arrow::array::{ArrayRef, Int64Array, StringArray};
        use arrow::datatypes::{Field, Schema};

        // No verified_status column at all.
        let schema = Arc::new(Schema::new(vec![
            Field::new("video_id", DataType::Int64, false),
            Field::new("claim_status", DataType::Utf8, true),
            Field::new("video_view_count", DataType::Int64, true),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(ids.to_vec())),
            Arc::new(StringArray::from(claims.to_vec())),
            Arc::new(Int64Array::from(views.to_vec())),
        ];
        RecordBatch::try_new(schema, columns).expect("build batch")
    }

    #[test]
    fn loads_parquet_with_casts_and_gaps() {
        use parquet::arrow::ArrowWriter;

        let first = parquet_batch(&[11, 12], &[Some("claim"), None], &[Some(343_296), None]);
        let second = parquet_batch(&[13], &[Some("opinion")], &[Some(7)]);

        let file = tempfile::Builder::new()
            .suffix(".parquet")
            .tempfile()
            .expect("create temp file");
        let handle = file.as_file().try_clone().expect("clone handle");
        let mut writer = ArrowWriter::try_new(handle, first.schema(), None).expect("writer");
        writer.write(&first).expect("write first batch");
        writer.flush().expect("flush row group");
        writer.write(&second).expect("write second batch");
        writer.close().expect("close writer");

        let table = load_file(file.path()).expect("load parquet");
        assert_eq!(table.len(), 3);
        let ids: Vec<Option<u64>> = table.records().iter().map(|r| r.video_id).collect();
        assert_eq!(ids, vec![Some(11), Some(12), Some(13)]);

        let first = table.get(0).unwrap();
        assert_eq!(first.categorical(CategoricalField::ClaimStatus), Some("claim"));
        assert_eq!(first.numeric(NumericField::VideoViewCount), Some(343_296.0));
        assert_eq!(first.categorical(CategoricalField::VerifiedStatus), None);
        assert_eq!(first.row_number, None);

        let second = table.get(1).unwrap();
        assert_eq!(second.categorical(CategoricalField::ClaimStatus), None);
        assert_eq!(second.numeric(NumericField::VideoViewCount), None);

        let third = table.get(2).unwrap();
        assert_eq!(third.categorical(CategoricalField::ClaimStatus), Some("opinion"));
        assert_eq!(third.numeric(NumericField::VideoViewCount), Some(7.0));
    }

    #[test]
    fn later_batches_append_after_earlier_rows() {
        let mut records = Vec::new();
        append_batch(&parquet_batch(&[1, 2], &[Some("claim"), Some("claim")], &[Some(5), Some(6)]), &mut records)
            .expect("first batch");
        append_batch(&parquet_batch(&[3], &[Some("opinion")], &[None]), &mut records)
            .expect("second batch");

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].video_id, Some(2));
        assert_eq!(records[1].video_view_count, Some(6.0));
        assert_eq!(records[2].video_id, Some(3));
        assert_eq!(records[2].claim_status.as_deref(), Some("opinion"));
        assert_eq!(records[2].video_view_count, None);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = write_temp(".xlsx", "");
        assert!(load_file(file.path()).is_err());
    }
}
