use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Schema – the fixed set of fields the dashboard knows about
// ---------------------------------------------------------------------------

/// A categorical column of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    ClaimStatus,
    VerifiedStatus,
    AuthorBanStatus,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::ClaimStatus,
        CategoricalField::VerifiedStatus,
        CategoricalField::AuthorBanStatus,
    ];

    /// Column name as it appears in the source file.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClaimStatus => "claim_status",
            Self::VerifiedStatus => "verified_status",
            Self::AuthorBanStatus => "author_ban_status",
        }
    }

    /// Human-readable heading used for filters and legends.
    pub fn title(self) -> &'static str {
        match self {
            Self::ClaimStatus => "Content Classification",
            Self::VerifiedStatus => "Verification Status",
            Self::AuthorBanStatus => "Ban Status",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoricalField {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(field) = Self::ALL.into_iter().find(|f| f.as_str() == s) {
            return Ok(field);
        }
        if NumericField::ALL.iter().any(|f| f.as_str() == s) {
            return Err(EngineError::not_categorical(s));
        }
        Err(EngineError::unknown_field(s))
    }
}

/// A numeric (measurement) column of the dataset. All values are >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    VideoDurationSec,
    VideoViewCount,
    VideoLikeCount,
    VideoShareCount,
    VideoDownloadCount,
    VideoCommentCount,
}

impl NumericField {
    pub const ALL: [NumericField; 6] = [
        NumericField::VideoDurationSec,
        NumericField::VideoViewCount,
        NumericField::VideoLikeCount,
        NumericField::VideoShareCount,
        NumericField::VideoDownloadCount,
        NumericField::VideoCommentCount,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VideoDurationSec => "video_duration_sec",
            Self::VideoViewCount => "video_view_count",
            Self::VideoLikeCount => "video_like_count",
            Self::VideoShareCount => "video_share_count",
            Self::VideoDownloadCount => "video_download_count",
            Self::VideoCommentCount => "video_comment_count",
        }
    }

    /// Axis title: `video_view_count` → `Video View Count`.
    pub fn title(self) -> String {
        title_case(&self.as_str().replace('_', " "))
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NumericField {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(field) = Self::ALL.into_iter().find(|f| f.as_str() == s) {
            return Ok(field);
        }
        if CategoricalField::ALL.iter().any(|f| f.as_str() == s) {
            return Err(EngineError::not_numeric(s));
        }
        Err(EngineError::unknown_field(s))
    }
}

/// Upper-case the first letter of every whitespace-separated word and
/// lower-case the rest.
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// VideoRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// A single video (one row of the source table).
///
/// Every column is optional: the source file has gaps, and a missing value
/// only excludes the record from computations that need that column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoRecord {
    #[serde(rename = "#")]
    pub row_number: Option<u64>,
    pub video_id: Option<u64>,
    pub claim_status: Option<String>,
    pub verified_status: Option<String>,
    pub author_ban_status: Option<String>,
    pub video_duration_sec: Option<f64>,
    pub video_view_count: Option<f64>,
    pub video_like_count: Option<f64>,
    pub video_share_count: Option<f64>,
    pub video_download_count: Option<f64>,
    pub video_comment_count: Option<f64>,
    pub video_transcription_text: Option<String>,
}

impl VideoRecord {
    /// Value of a categorical column, `None` when absent.
    pub fn categorical(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::ClaimStatus => self.claim_status.as_deref(),
            CategoricalField::VerifiedStatus => self.verified_status.as_deref(),
            CategoricalField::AuthorBanStatus => self.author_ban_status.as_deref(),
        }
    }

    /// Value of a numeric column, `None` when absent or NaN.
    pub fn numeric(&self, field: NumericField) -> Option<f64> {
        let value = match field {
            NumericField::VideoDurationSec => self.video_duration_sec,
            NumericField::VideoViewCount => self.video_view_count,
            NumericField::VideoLikeCount => self.video_like_count,
            NumericField::VideoShareCount => self.video_share_count,
            NumericField::VideoDownloadCount => self.video_download_count,
            NumericField::VideoCommentCount => self.video_comment_count,
        };
        value.filter(|v| !v.is_nan())
    }

    pub fn transcription(&self) -> Option<&str> {
        self.video_transcription_text.as_deref()
    }

    pub fn set_categorical(&mut self, field: CategoricalField, value: Option<String>) {
        let slot = match field {
            CategoricalField::ClaimStatus => &mut self.claim_status,
            CategoricalField::VerifiedStatus => &mut self.verified_status,
            CategoricalField::AuthorBanStatus => &mut self.author_ban_status,
        };
        *slot = value;
    }

    pub fn set_numeric(&mut self, field: NumericField, value: Option<f64>) {
        let slot = match field {
            NumericField::VideoDurationSec => &mut self.video_duration_sec,
            NumericField::VideoViewCount => &mut self.video_view_count,
            NumericField::VideoLikeCount => &mut self.video_like_count,
            NumericField::VideoShareCount => &mut self.video_share_count,
            NumericField::VideoDownloadCount => &mut self.video_download_count,
            NumericField::VideoCommentCount => &mut self.video_comment_count,
        };
        *slot = value;
    }

    /// Blank strings become absent, NaN numbers become absent.
    fn normalize(mut self) -> Self {
        for field in CategoricalField::ALL {
            let cleaned = self
                .categorical(field)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            self.set_categorical(field, cleaned);
        }
        for field in NumericField::ALL {
            let cleaned = self.numeric(field);
            self.set_numeric(field, cleaned);
        }
        self.video_transcription_text = self
            .video_transcription_text
            .take()
            .filter(|t| !t.trim().is_empty());
        self
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The immutable base dataset. Row order is the source order.
#[derive(Debug, Clone, Default)]
pub struct Table {
    records: Vec<VideoRecord>,
}

impl Table {
    pub fn from_records(records: Vec<VideoRecord>) -> Self {
        Table {
            records: records.into_iter().map(VideoRecord::normalize).collect(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&VideoRecord> {
        self.records.get(index)
    }

    pub fn numeric_column(&self, field: NumericField) -> impl Iterator<Item = Option<f64>> + '_ {
        self.records.iter().map(move |r| r.numeric(field))
    }

    /// Distinct present values of a categorical column in first-seen order.
    pub fn distinct_values(&self, field: CategoricalField) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter_map(|r| r.categorical(field))
            .filter(|v| seen.insert(*v))
            .map(str::to_string)
            .collect()
    }

    /// `(min, max)` of the present values of a numeric column.
    pub fn numeric_extent(&self, field: NumericField) -> Option<(f64, f64)> {
        extent(self.numeric_column(field).flatten())
    }
}

/// `(min, max)` of a sequence, `None` when it is empty.
pub fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
