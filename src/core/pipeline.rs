use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::extractor::{self, ExtractReport};
use super::partitioner::{self, PartitionReport};
use crate::annotation::{self, Channel};
use crate::session::{self, Session};
use crate::shared::PrepConfig;
use crate::utils::{file_utils, logger};
use crate::video::{FrameSource, VideoBackend};

#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub sessions_processed: usize,
    pub incomplete_folders: Vec<PathBuf>,
    pub extraction: BTreeMap<Channel, ExtractReport>,
    pub partition: BTreeMap<Channel, PartitionReport>,
}

pub fn staging_root(dest_dir: &Path, channel: Channel) -> PathBuf {
    dest_dir.join(channel.staging_dir_name())
}

pub fn split_root(dest_dir: &Path, channel: Channel) -> PathBuf {
    dest_dir.join(channel.tag())
}

/// Read one session's annotation and extract both channels into the staging trees.
/// Any error abandons the session; clips already written stay on disk.
pub fn process_session<B: VideoBackend, R: Rng>(
    backend: &B,
    session: &Session,
    dest_dir: &Path,
    rng: &mut R,
) -> Result<BTreeMap<Channel, ExtractReport>> {
    let annotations = annotation::read_annotation(&session.annotation)
        .with_context(|| format!("Failed to parse annotations: {}", session.annotation.display()))?;

    for channel in Channel::ALL {
        extractor::prepare_label_dirs(annotations.channel(channel), &staging_root(dest_dir, channel))?;
    }

    let mut source = backend
        .open(&session.video)
        .with_context(|| format!("Failed to open recording: {}", session.video.display()))?;
    logger::debug(&format!(
        "{}: {} intervals @ {:.3} fps",
        session.dir.display(),
        annotations.interval_count(),
        source.fps()
    ));

    let mut reports = BTreeMap::new();
    for channel in Channel::ALL {
        let report = extractor::extract_channel(
            backend,
            &mut source,
            annotations.channel(channel),
            &staging_root(dest_dir, channel),
            rng,
        )
        .with_context(|| format!("Failed to extract clips from: {}", session.video.display()))?;
        reports.insert(channel, report);
    }

    Ok(reports)
}

/// Partition both channels' staging trees into `LH/` and `RH/`.
pub fn partition_all<R: Rng>(
    dest_dir: &Path,
    config: &PrepConfig,
    rng: &mut R,
) -> Result<BTreeMap<Channel, PartitionReport>> {
    let mut reports = BTreeMap::new();
    for channel in Channel::ALL {
        let report = partitioner::partition_channel(
            &staging_root(dest_dir, channel),
            &split_root(dest_dir, channel),
            &config.split,
            rng,
        )
        .with_context(|| format!("Failed to partition {} clips", channel.tag()))?;
        reports.insert(channel, report);
    }
    Ok(reports)
}

/// Full run: locate sessions under `root_dir`, stage their clips, then partition.
pub fn run<B: VideoBackend, R: Rng>(
    backend: &B,
    root_dir: &Path,
    dest_dir: &Path,
    config: &PrepConfig,
    rng: &mut R,
) -> Result<RunSummary> {
    for channel in Channel::ALL {
        file_utils::ensure_dir(&staging_root(dest_dir, channel))?;
    }

    let scan = session::locate_sessions(root_dir, &config.locator)?;
    logger::info(&format!(
        "found {} sessions ({} incomplete folders) under {}",
        scan.sessions.len(),
        scan.incomplete.len(),
        root_dir.display()
    ));

    let mut summary = RunSummary {
        incomplete_folders: scan.incomplete,
        ..RunSummary::default()
    };
    for channel in Channel::ALL {
        summary.extraction.insert(channel, ExtractReport::default());
    }

    for session in &scan.sessions {
        let reports = process_session(backend, session, dest_dir, rng)?;
        for (channel, report) in reports {
            summary.extraction.entry(channel).or_default().merge(report);
        }
        summary.sessions_processed += 1;
    }

    summary.partition = partition_all(dest_dir, config, rng)?;
    Ok(summary)
}
