//! Archival episode store.
//!
//! Pre-recorded episodes are the second acquisition mode of the probing
//! pipeline: instead of rolling out a live environment, a store is queried
//! by environment name, frame-stack count, downsampling flag, and
//! algorithm/tag metadata, and returns either raw frame episodes or episodes
//! of pre-encoded feature representations, each with per-frame labels and a
//! per-episode reward.
//!
//! [`EpisodeArchive`] is the concrete, serde-serializable store used by the
//! CLI: one JSON document holding the recording metadata and all records.
//! Other stores (databases, remote fetchers) plug in through the
//! [`ArchivalStore`] trait.
//!
//! Stored frames use the recording-friendly `[time, height, width, channel]`
//! layout; conversion to the pipeline's `[time, channel, height, width]`
//! layout happens at episode-source level.

use serde::{Deserialize, Serialize};

use crate::episode::EpisodeLabels;

/// A query against an archival episode store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivalQuery {
    /// Environment the episodes must have been recorded on.
    pub env_name: String,
    /// Number of stacked frames per observation.
    pub num_frame_stack: usize,
    /// Whether the recording was spatially downsampled.
    pub downsample: bool,
    /// Accept only records produced by one of these algorithms; empty
    /// accepts any.
    pub algos: Vec<String>,
    /// Accept only records carrying all of these tags.
    pub tags: Vec<String>,
    /// Return pre-encoded feature representations instead of raw frames.
    pub use_representations: bool,
}

/// A raw tensor as stored in an archive: dims plus row-major data.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArchivedTensor {
    pub dims: Vec<usize>,
    pub data: Vec<f32>,
}

/// One recorded episode with its metadata.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArchiveRecord {
    /// Algorithm that produced the trajectory.
    pub algo: String,
    /// Free-form tags attached at recording time.
    pub tags: Vec<String>,
    /// Total episode reward.
    pub reward: f32,
    /// Raw frames, `[time, height, width, channel]`.
    pub frames: Option<ArchivedTensor>,
    /// Pre-encoded representations, `[time, features]`.
    pub representations: Option<ArchivedTensor>,
    /// Per-frame labels, aligned with the time dimension.
    pub labels: EpisodeLabels,
}

/// An episode as returned by a store query.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivalEpisode {
    /// The selected tensor: raw frames or representations, per the query.
    pub tensor: ArchivedTensor,
    /// Per-frame labels.
    pub labels: EpisodeLabels,
    /// Total episode reward.
    pub reward: f32,
}

/// A queryable source of pre-recorded episodes.
pub trait ArchivalStore {
    /// Returns every stored episode matching the query.
    ///
    /// Records that do not carry the requested tensor kind (raw frames vs.
    /// representations) are skipped.
    fn load_episodes(&self, query: &ArchivalQuery) -> Vec<ArchivalEpisode>;
}

/// A complete in-memory (and on-disk, via serde) episode archive.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EpisodeArchive {
    /// Environment the archive was recorded on.
    pub env_name: String,
    /// Number of stacked frames per observation.
    pub num_frame_stack: usize,
    /// Whether frames were spatially downsampled at recording time.
    pub downsampled: bool,
    /// The recorded episodes.
    pub records: Vec<ArchiveRecord>,
}

impl EpisodeArchive {
    fn matches(&self, record: &ArchiveRecord, query: &ArchivalQuery) -> bool {
        self.env_name == query.env_name
            && self.num_frame_stack == query.num_frame_stack
            && self.downsampled == query.downsample
            && (query.algos.is_empty() || query.algos.contains(&record.algo))
            && query.tags.iter().all(|tag| record.tags.contains(tag))
    }
}

impl ArchivalStore for EpisodeArchive {
    fn load_episodes(&self, query: &ArchivalQuery) -> Vec<ArchivalEpisode> {
        self.records
            .iter()
            .filter(|record| self.matches(record, query))
            .filter_map(|record| {
                let tensor = if query.use_representations {
                    record.representations.clone()
                } else {
                    record.frames.clone()
                }?;
                Some(ArchivalEpisode {
                    tensor,
                    labels: record.labels.clone(),
                    reward: record.reward,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(dims: &[usize]) -> ArchivedTensor {
        ArchivedTensor {
            dims: dims.to_vec(),
            data: vec![0.0; dims.iter().product()],
        }
    }

    fn record(algo: &str, tags: &[&str]) -> ArchiveRecord {
        ArchiveRecord {
            algo: algo.to_owned(),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            reward: 10.0,
            frames: Some(tensor(&[3, 4, 4, 1])),
            representations: Some(tensor(&[3, 16])),
            labels: vec![crate::LabelFrame::new(); 3],
        }
    }

    fn archive() -> EpisodeArchive {
        EpisodeArchive {
            env_name: "track".to_owned(),
            num_frame_stack: 1,
            downsampled: false,
            records: vec![
                record("dqn", &["probe"]),
                record("a2c", &["probe", "v2"]),
                record("dqn", &[]),
            ],
        }
    }

    fn query() -> ArchivalQuery {
        ArchivalQuery {
            env_name: "track".to_owned(),
            num_frame_stack: 1,
            downsample: false,
            algos: vec![],
            tags: vec![],
            use_representations: false,
        }
    }

    #[test]
    fn test_empty_filters_match_everything() {
        assert_eq!(archive().load_episodes(&query()).len(), 3);
    }

    #[test]
    fn test_algo_filter() {
        let mut q = query();
        q.algos = vec!["a2c".to_owned()];
        let episodes = archive().load_episodes(&q);
        assert_eq!(episodes.len(), 1);
    }

    #[test]
    fn test_tag_filter_requires_all_tags() {
        let mut q = query();
        q.tags = vec!["probe".to_owned(), "v2".to_owned()];
        assert_eq!(archive().load_episodes(&q).len(), 1);
    }

    #[test]
    fn test_mismatched_env_name_returns_nothing() {
        let mut q = query();
        q.env_name = "other".to_owned();
        assert!(archive().load_episodes(&q).is_empty());
    }

    #[test]
    fn test_representation_query_selects_representations() {
        let mut q = query();
        q.use_representations = true;
        let episodes = archive().load_episodes(&q);
        assert!(episodes.iter().all(|e| e.tensor.dims == vec![3, 16]));
    }

    #[test]
    fn test_records_without_requested_tensor_are_skipped() {
        let mut arch = archive();
        arch.records[0].frames = None;
        assert_eq!(arch.load_episodes(&query()).len(), 2);
    }

    #[test]
    fn test_archive_json_round_trip() {
        let arch = archive();
        let json = serde_json::to_string(&arch).unwrap();
        let back: EpisodeArchive = serde_json::from_str(&json).unwrap();
        assert_eq!(back.records, arch.records);
        assert_eq!(back.env_name, arch.env_name);
    }
}
