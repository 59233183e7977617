//! Landmark frame store and its JSONL persistence format.
//!
//! The store holds one world-relative and one image-relative
//! [`LandmarkFrame`] per source frame. It is built exactly once per run and
//! is read-only afterwards.
//!
//! On disk, landmarks are kept one JSON object per line:
//!
//! ```text
//! # {"schema_version":"1.0","frame_count":3,"width":1280,"height":720}
//! {"frame":0,"world":[...],"image":[...]}
//! {"frame":2,"world":[...],"image":[...]}
//! ```
//!
//! Records may be sparse; a frame with no record is a missing detection.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use climbmetrics_common::error::{ClimbError, ClimbResult};

use crate::landmark::LandmarkFrame;

/// Current landmark file schema version.
pub const LANDMARK_SCHEMA_VERSION: &str = "1.0";

/// Per-frame world and image landmarks for a whole video.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkStore {
    world: Vec<LandmarkFrame>,
    image: Vec<LandmarkFrame>,
}

impl LandmarkStore {
    /// Build a store from two parallel sequences.
    pub fn new(world: Vec<LandmarkFrame>, image: Vec<LandmarkFrame>) -> ClimbResult<Self> {
        if world.len() != image.len() {
            return Err(ClimbError::config(format!(
                "world and image landmark sequences differ in length ({} vs {})",
                world.len(),
                image.len()
            )));
        }
        Ok(Self { world, image })
    }

    /// A store where detection failed on every one of `frame_count` frames.
    pub fn undetected(frame_count: usize) -> Self {
        Self {
            world: vec![LandmarkFrame::empty(); frame_count],
            image: vec![LandmarkFrame::empty(); frame_count],
        }
    }

    /// Build a store of exactly `frame_count` frames from (possibly sparse) records.
    pub fn from_records(records: &[LandmarkRecord], frame_count: usize) -> ClimbResult<Self> {
        let mut world = vec![LandmarkFrame::empty(); frame_count];
        let mut image = vec![LandmarkFrame::empty(); frame_count];
        for record in records {
            if record.frame >= frame_count {
                return Err(ClimbError::pose(format!(
                    "landmark record for frame {} exceeds frame count {frame_count}",
                    record.frame
                )));
            }
            world[record.frame] = record.world.clone();
            image[record.frame] = record.image.clone();
        }
        Ok(Self { world, image })
    }

    pub fn frame_count(&self) -> usize {
        self.world.len()
    }

    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    pub fn world(&self) -> &[LandmarkFrame] {
        &self.world
    }

    pub fn image(&self) -> &[LandmarkFrame] {
        &self.image
    }

    /// Detection statistics for the whole video.
    pub fn coverage(&self) -> DetectionCoverage {
        let gaps = self.gap_runs();
        DetectionCoverage {
            frame_count: self.frame_count(),
            world_detected: self.world.iter().filter(|f| !f.is_empty()).count(),
            image_detected: self.image.iter().filter(|f| !f.is_empty()).count(),
            gap_count: gaps.len(),
            longest_gap: gaps.iter().map(|r| r.len()).max().unwrap_or(0),
        }
    }

    /// Maximal runs of frames whose image landmarks are missing.
    pub fn gap_runs(&self) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut start = None;
        for (i, frame) in self.image.iter().enumerate() {
            match (frame.is_empty(), start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    runs.push(s..i);
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push(s..self.image.len());
        }
        runs
    }

    /// Records for every frame with at least one detection.
    pub fn records(&self) -> Vec<LandmarkRecord> {
        self.world
            .iter()
            .zip(&self.image)
            .enumerate()
            .filter(|(_, (w, i))| !w.is_empty() || !i.is_empty())
            .map(|(frame, (w, i))| LandmarkRecord {
                frame,
                world: w.clone(),
                image: i.clone(),
            })
            .collect()
    }

    /// Serialize to JSONL, prefixed by a `#` header comment.
    pub fn to_jsonl(&self, header: &LandmarkFileHeader) -> Result<String, serde_json::Error> {
        let mut output = format!("# {}\n", serde_json::to_string(header)?);
        output.push_str(&serialize_records(&self.records())?);
        Ok(output)
    }
}

/// Detection statistics over a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionCoverage {
    pub frame_count: usize,
    pub world_detected: usize,
    pub image_detected: usize,
    pub gap_count: usize,
    pub longest_gap: usize,
}

impl DetectionCoverage {
    /// Fraction of frames with image landmarks, in `[0, 1]`.
    pub fn image_ratio(&self) -> f64 {
        if self.frame_count == 0 {
            return 0.0;
        }
        self.image_detected as f64 / self.frame_count as f64
    }
}

/// Incrementally populates a store in frame order.
#[derive(Debug, Default)]
pub struct LandmarkStoreBuilder {
    world: Vec<LandmarkFrame>,
    image: Vec<LandmarkFrame>,
}

impl LandmarkStoreBuilder {
    pub fn with_capacity(frames: usize) -> Self {
        Self {
            world: Vec::with_capacity(frames),
            image: Vec::with_capacity(frames),
        }
    }

    /// Append the landmarks of the next source frame.
    pub fn push(&mut self, world: LandmarkFrame, image: LandmarkFrame) {
        self.world.push(world);
        self.image.push(image);
    }

    pub fn finish(self) -> LandmarkStore {
        LandmarkStore {
            world: self.world,
            image: self.image,
        }
    }
}

/// One line of a landmark file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkRecord {
    pub frame: usize,
    #[serde(default)]
    pub world: LandmarkFrame,
    #[serde(default)]
    pub image: LandmarkFrame,
}

/// Optional metadata carried in the leading `#` comment of a landmark file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFileHeader {
    pub schema_version: String,
    #[serde(default)]
    pub frame_count: Option<usize>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
}

impl LandmarkFileHeader {
    pub fn new(frame_count: usize, width: u32, height: u32) -> Self {
        Self {
            schema_version: LANDMARK_SCHEMA_VERSION.to_string(),
            frame_count: Some(frame_count),
            width: Some(width),
            height: Some(height),
            source: None,
        }
    }
}

/// A parsed landmark file.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFile {
    pub header: Option<LandmarkFileHeader>,
    pub records: Vec<LandmarkRecord>,
}

impl LandmarkFile {
    /// Parse JSONL content.
    pub fn parse(jsonl: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            header: parse_header(jsonl),
            records: parse_records(jsonl)?,
        })
    }

    /// Read and parse a landmark file.
    pub fn load(path: impl AsRef<Path>) -> ClimbResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClimbError::pose(format!("failed to read landmarks {}: {e}", path.display()))
        })?;
        let file = Self::parse(&content).map_err(|e| {
            ClimbError::pose(format!("failed to parse landmarks {}: {e}", path.display()))
        })?;
        file.validate()?;
        Ok(file)
    }

    /// Reject records whose landmark ids fall outside the catalogue.
    pub fn validate(&self) -> ClimbResult<()> {
        for record in &self.records {
            record.world.validate_ids()?;
            record.image.validate_ids()?;
        }
        Ok(())
    }

    /// Frame count from the header, or one past the highest recorded frame.
    pub fn frame_count(&self) -> usize {
        self.header
            .as_ref()
            .and_then(|h| h.frame_count)
            .unwrap_or_else(|| self.records.iter().map(|r| r.frame + 1).max().unwrap_or(0))
    }

    /// Index records by frame; a later duplicate replaces an earlier one.
    pub fn by_frame(&self) -> BTreeMap<usize, LandmarkRecord> {
        self.records
            .iter()
            .map(|r| (r.frame, r.clone()))
            .collect()
    }

    /// Materialize the whole file as a store.
    pub fn into_store(self) -> ClimbResult<LandmarkStore> {
        self.validate()?;
        let frame_count = self.frame_count();
        let deduped: Vec<LandmarkRecord> = self.by_frame().into_values().collect();
        LandmarkStore::from_records(&deduped, frame_count)
    }
}

/// Parse landmark records from JSONL, skipping blank and `#` lines.
pub fn parse_records(jsonl: &str) -> Result<Vec<LandmarkRecord>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Parse the header comment from the first non-blank line, if there is one.
pub fn parse_header(jsonl: &str) -> Option<LandmarkFileHeader> {
    let first = jsonl.lines().map(str::trim).find(|line| !line.is_empty())?;
    let body = first.strip_prefix('#')?.trim();
    serde_json::from_str(body).ok()
}

/// Serialize records to JSONL format.
pub fn serialize_records(records: &[LandmarkRecord]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for record in records {
        output.push_str(&serde_json::to_string(record)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Landmark;
    use proptest::prelude::*;

    fn detected(id_offset: f64) -> LandmarkFrame {
        LandmarkFrame::new(vec![Landmark::image(0, id_offset, id_offset, 0.0)])
    }

    #[test]
    fn test_store_rejects_misaligned_sequences() {
        let err = LandmarkStore::new(vec![LandmarkFrame::empty()], vec![]).unwrap_err();
        assert!(matches!(err, ClimbError::Config { .. }));
    }

    #[test]
    fn test_from_records_fills_gaps_with_empty_frames() {
        let records = vec![LandmarkRecord {
            frame: 1,
            world: detected(1.0),
            image: detected(1.0),
        }];
        let store = LandmarkStore::from_records(&records, 3).unwrap();
        assert_eq!(store.frame_count(), 3);
        assert!(store.image()[0].is_empty());
        assert!(!store.image()[1].is_empty());
        assert!(store.world()[2].is_empty());
    }

    #[test]
    fn test_from_records_rejects_out_of_range_frame() {
        let records = vec![LandmarkRecord {
            frame: 5,
            world: detected(0.0),
            image: detected(0.0),
        }];
        assert!(LandmarkStore::from_records(&records, 2).is_err());
    }

    #[test]
    fn test_gap_runs_and_coverage() {
        let image = vec![
            LandmarkFrame::empty(),
            detected(1.0),
            LandmarkFrame::empty(),
            LandmarkFrame::empty(),
            detected(2.0),
            LandmarkFrame::empty(),
        ];
        let store = LandmarkStore::new(image.clone(), image).unwrap();
        assert_eq!(store.gap_runs(), vec![0..1, 2..4, 5..6]);

        let coverage = store.coverage();
        assert_eq!(coverage.frame_count, 6);
        assert_eq!(coverage.image_detected, 2);
        assert_eq!(coverage.gap_count, 3);
        assert_eq!(coverage.longest_gap, 2);
        assert!((coverage.image_ratio() - 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_jsonl_roundtrip_through_file_format() {
        let mut builder = LandmarkStoreBuilder::with_capacity(3);
        builder.push(detected(1.0), detected(10.0));
        builder.push(LandmarkFrame::empty(), LandmarkFrame::empty());
        builder.push(detected(3.0), detected(30.0));
        let store = builder.finish();

        let jsonl = store.to_jsonl(&LandmarkFileHeader::new(3, 64, 48)).unwrap();
        assert!(jsonl.starts_with("# {"));

        let file = LandmarkFile::parse(&jsonl).unwrap();
        assert_eq!(file.header.as_ref().unwrap().width, Some(64));
        assert_eq!(file.records.len(), 2);
        assert_eq!(file.into_store().unwrap(), store);
    }

    #[test]
    fn test_frame_count_falls_back_to_highest_record() {
        let jsonl = "{\"frame\":4,\"image\":[{\"id\":0,\"x\":1.0,\"y\":2.0,\"z\":0.0}]}\n";
        let file = LandmarkFile::parse(jsonl).unwrap();
        assert!(file.header.is_none());
        assert_eq!(file.frame_count(), 5);
        let store = file.into_store().unwrap();
        assert!(store.world()[4].is_empty());
        assert!(!store.image()[4].is_empty());
    }

    #[test]
    fn test_duplicate_records_keep_the_last() {
        let jsonl = concat!(
            "{\"frame\":0,\"image\":[{\"id\":0,\"x\":1.0,\"y\":1.0,\"z\":0.0}]}\n",
            "{\"frame\":0,\"image\":[{\"id\":0,\"x\":9.0,\"y\":9.0,\"z\":0.0}]}\n",
        );
        let store = LandmarkFile::parse(jsonl).unwrap().into_store().unwrap();
        assert_eq!(store.image()[0].landmarks()[0].x, 9.0);
    }

    #[test]
    fn test_landmark_ids_outside_catalogue_are_config_errors() {
        let jsonl = "{\"frame\":0,\"image\":[{\"id\":33,\"x\":1.0,\"y\":1.0,\"z\":0.0}]}\n";
        let file = LandmarkFile::parse(jsonl).unwrap();
        assert!(matches!(
            file.into_store().unwrap_err(),
            ClimbError::Config { .. }
        ));

        let path = std::env::temp_dir().join(format!(
            "climbmetrics-bad-ids-{}.jsonl",
            std::process::id()
        ));
        std::fs::write(&path, jsonl).unwrap();
        let err = LandmarkFile::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ClimbError::Config { .. }));
    }

    proptest! {
        #[test]
        fn gap_runs_partition_undetected_frames(
            mask in prop::collection::vec(any::<bool>(), 0..64)
        ) {
            let image: Vec<LandmarkFrame> = mask
                .iter()
                .map(|&hit| if hit { detected_frame() } else { LandmarkFrame::empty() })
                .collect();
            let store = LandmarkStore::new(image.clone(), image).unwrap();
            let runs = store.gap_runs();

            let covered: usize = runs.iter().map(|r| r.len()).sum();
            prop_assert_eq!(covered + store.coverage().image_detected, mask.len());
            for pair in runs.windows(2) {
                // Runs are ordered and separated by at least one detection.
                prop_assert!(pair[0].end < pair[1].start);
            }
            for run in &runs {
                prop_assert!(run.clone().all(|i| !mask[i]));
            }
        }
    }

    fn detected_frame() -> LandmarkFrame {
        detected(1.0)
    }
}
