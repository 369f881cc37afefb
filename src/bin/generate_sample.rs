use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use verification_void::data::model::{CategoricalField, NumericField, VideoRecord};

const ROWS: u64 = 2000;

const CLAIM_OPENERS: [&str; 4] = [
    "someone shared with me that",
    "a friend read in the media a claim that",
    "i learned from a website that",
    "my colleague discovered on the news that",
];
const OPINION_OPENERS: [&str; 4] = [
    "i think that",
    "my family's opinion is that",
    "i believe that",
    "our view is that",
];
const SUBJECTS: [&str; 8] = [
    "the moon's surface is covered in dust",
    "octopuses have three hearts",
    "the eiffel tower grows taller in summer",
    "honey never spoils when it is stored properly",
    "lightning strikes the earth many times every second",
    "a single cloud can weigh more than a million pounds",
    "the great wall of china is visible from space",
    "bananas are technically berries",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Log-uniform draw in `[lo, hi)`, rounded down.
    fn log_uniform(&mut self, lo: f64, hi: f64) -> f64 {
        (lo.ln() + self.next_f64() * (hi.ln() - lo.ln())).exp().floor()
    }
}

fn synth_record(i: u64, rng: &mut SimpleRng) -> VideoRecord {
    let claim = rng.chance(0.5);
    let verified = rng.chance(if claim { 0.05 } else { 0.12 });
    let ban = match (claim, rng.next_f64()) {
        (true, p) if p < 0.12 => "banned",
        (true, p) if p < 0.30 => "under review",
        (false, p) if p < 0.02 => "banned",
        (false, p) if p < 0.08 => "under review",
        _ => "active",
    };

    let views = if claim {
        rng.log_uniform(1_000.0, 1_000_000.0)
    } else {
        rng.log_uniform(20.0, 10_000.0)
    };
    let likes = (views * (0.05 + 0.3 * rng.next_f64())).floor();
    let shares = (likes * 0.2 * rng.next_f64()).floor();
    let downloads = (shares * 0.15 * rng.next_f64()).floor();
    let comments = (downloads * 0.5 * rng.next_f64()).floor();

    let opener = rng.pick(if claim { &CLAIM_OPENERS } else { &OPINION_OPENERS });
    let subject = rng.pick(&SUBJECTS);

    let mut record = VideoRecord {
        row_number: Some(i + 1),
        video_id: Some(1_000_000_000 + rng.next_u64() % 9_000_000_000),
        video_transcription_text: Some(format!("{opener} {subject}")),
        ..Default::default()
    };
    record.set_categorical(
        CategoricalField::ClaimStatus,
        Some(if claim { "claim" } else { "opinion" }.to_string()),
    );
    record.set_categorical(
        CategoricalField::VerifiedStatus,
        Some(if verified { "verified" } else { "not verified" }.to_string()),
    );
    record.set_categorical(CategoricalField::AuthorBanStatus, Some(ban.to_string()));
    record.set_numeric(NumericField::VideoDurationSec, Some((5 + rng.next_u64() % 56) as f64));
    record.set_numeric(NumericField::VideoViewCount, Some(views));
    record.set_numeric(NumericField::VideoLikeCount, Some(likes));
    record.set_numeric(NumericField::VideoShareCount, Some(shares));
    record.set_numeric(NumericField::VideoDownloadCount, Some(downloads));
    record.set_numeric(NumericField::VideoCommentCount, Some(comments));

    // A few gaps, like the published file.
    if rng.chance(0.01) {
        record.set_categorical(CategoricalField::ClaimStatus, None);
        record.video_transcription_text = None;
    }
    record
}

fn write_csv(path: &str, records: &[VideoRecord]) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create CSV file");
    for record in records {
        writer.serialize(record).expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV");
}

fn write_parquet(path: &str, records: &[VideoRecord]) {
    let mut fields = vec![
        Field::new("#", DataType::UInt64, true),
        Field::new("video_id", DataType::UInt64, true),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(records.iter().map(|r| r.row_number).collect::<UInt64Array>()),
        Arc::new(records.iter().map(|r| r.video_id).collect::<UInt64Array>()),
    ];
    for field in CategoricalField::ALL {
        fields.push(Field::new(field.as_str(), DataType::Utf8, true));
        columns.push(Arc::new(
            records
                .iter()
                .map(|r| r.categorical(field))
                .collect::<StringArray>(),
        ));
    }
    for field in NumericField::ALL {
        fields.push(Field::new(field.as_str(), DataType::Float64, true));
        columns.push(Arc::new(
            records
                .iter()
                .map(|r| r.numeric(field))
                .collect::<Float64Array>(),
        ));
    }
    fields.push(Field::new("video_transcription_text", DataType::Utf8, true));
    columns.push(Arc::new(
        records
            .iter()
            .map(|r| r.transcription())
            .collect::<StringArray>(),
    ));

    let schema = Arc::new(Schema::new(fields));
    let batch =
        RecordBatch::try_new(schema.clone(), columns).expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let records: Vec<VideoRecord> = (0..ROWS).map(|i| synth_record(i, &mut rng)).collect();

    write_csv("sample_data.csv", &records);
    write_parquet("sample_data.parquet", &records);

    println!("Wrote {ROWS} videos to sample_data.csv and sample_data.parquet");
}
