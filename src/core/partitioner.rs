use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::{constants, SplitConfig};
use crate::utils::{file_utils, logger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Validation, Split::Test];

    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => constants::SPLIT_NAMES[0],
            Split::Validation => constants::SPLIT_NAMES[1],
            Split::Test => constants::SPLIT_NAMES[2],
        }
    }
}

/// One relocation, keyed on the clip's staging file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMove {
    pub label: String,
    pub source: String,
    pub split: Split,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPlan {
    /// Every label directory of the staging tree, clips or not
    pub labels: Vec<String>,
    pub moves: Vec<PlannedMove>,
}

impl PartitionPlan {
    pub fn count(&self, split: Split) -> usize {
        self.moves.iter().filter(|m| m.split == split).count()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionReport {
    pub labels: usize,
    pub train: usize,
    pub validation: usize,
    pub test: usize,
    /// True when an interrupted partition was picked up from its manifest
    pub resumed: bool,
    /// Moves found already done while resuming
    pub already_moved: usize,
}

impl PartitionReport {
    fn add_moves(&mut self, plan: &PartitionPlan) {
        self.train += plan.count(Split::Train);
        self.validation += plan.count(Split::Validation);
        self.test += plan.count(Split::Test);
    }
}

pub fn split_clip_name(token: u32, label: &str, counter: usize, extension: &str) -> String {
    format!("{}_{}_{}.{}", token, label, counter, extension)
}

/// Shuffle the staging pool and assign every clip a split and a new name.
///
/// Counters are per label and shared by the three splits, so one label's clips are
/// numbered 1..=n across train, then validation, then test.
pub fn plan_partition<R: Rng>(
    staging_root: &Path,
    split_config: &SplitConfig,
    rng: &mut R,
) -> Result<PartitionPlan> {
    let (label_dirs, _) = file_utils::list_dir(staging_root)?;

    let mut labels = Vec::with_capacity(label_dirs.len());
    let mut pool: Vec<(String, String)> = Vec::new();
    for dir in &label_dirs {
        let label = file_utils::file_name(dir);
        let (_, files) = file_utils::list_dir(dir)?;
        pool.extend(files.iter().map(|f| (label.clone(), file_utils::file_name(f))));
        labels.push(label);
    }

    pool.shuffle(rng);
    let (train_end, validation_end) = split_config.cutoffs(pool.len());

    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut moves = Vec::with_capacity(pool.len());
    for (position, (label, source)) in pool.into_iter().enumerate() {
        let assigned = if position < train_end {
            Split::Train
        } else if position < validation_end {
            Split::Validation
        } else {
            Split::Test
        };

        let counter = counters.entry(label.clone()).or_insert(0);
        *counter += 1;

        let extension = Path::new(&source)
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_else(|| constants::VIDEO_EXTENSION.to_string());
        let token = rng.gen_range(0..=constants::NAME_TOKEN_MAX);
        let target = split_clip_name(token, &label, *counter, &extension);

        moves.push(PlannedMove {
            label,
            source,
            split: assigned,
            target,
        });
    }

    Ok(PartitionPlan { labels, moves })
}

pub fn manifest_path(split_root: &Path) -> PathBuf {
    split_root.join(constants::PARTITION_MANIFEST_FILE)
}

pub fn save_manifest(split_root: &Path, plan: &PartitionPlan) -> Result<()> {
    file_utils::ensure_dir(split_root)?;
    let path = manifest_path(split_root);
    let tmp = path.with_extension("json.tmp");

    let json = serde_json::to_string_pretty(plan)?;
    fs::write(&tmp, json).with_context(|| format!("Failed to write manifest: {:?}", tmp))?;
    fs::rename(&tmp, &path).with_context(|| format!("Failed to write manifest: {:?}", path))?;
    Ok(())
}

fn load_manifest(path: &Path) -> Result<PartitionPlan> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read manifest: {:?}", path))?;
    serde_json::from_str(&json).with_context(|| format!("Corrupt partition manifest: {:?}", path))
}

fn target_path(split_root: &Path, planned: &PlannedMove) -> PathBuf {
    split_root
        .join(planned.split.dir_name())
        .join(&planned.label)
        .join(&planned.target)
}

/// Redraw the token of every target already taken in `split_root`, e.g. by an
/// earlier run into the same destination.
fn avoid_collisions<R: Rng>(plan: &mut PartitionPlan, split_root: &Path, rng: &mut R) {
    let mut claimed = HashSet::new();
    for planned in &mut plan.moves {
        while target_path(split_root, planned).exists()
            || !claimed.insert((planned.split, planned.label.clone(), planned.target.clone()))
        {
            let rest = planned
                .target
                .split_once('_')
                .map(|(_, rest)| rest.to_string())
                .unwrap_or_else(|| planned.target.clone());
            planned.target = format!("{}_{}", rng.gen_range(0..=constants::NAME_TOKEN_MAX), rest);
        }
    }
}

/// Create the split/label dirs and carry out every move of `plan`.
/// Returns how many moves were found already done.
fn apply_plan(plan: &PartitionPlan, staging_root: &Path, split_root: &Path) -> Result<usize> {
    for split in Split::ALL {
        let split_dir = split_root.join(split.dir_name());
        file_utils::ensure_dir(&split_dir)?;
        for label in &plan.labels {
            file_utils::ensure_dir(&split_dir.join(label))?;
        }
    }

    let mut already_moved = 0;
    for planned in &plan.moves {
        let src = staging_root.join(&planned.label).join(&planned.source);
        let dst = target_path(split_root, planned);

        if !src.exists() && dst.exists() {
            already_moved += 1;
            continue;
        }
        file_utils::move_file(&src, &dst)?;
    }
    Ok(already_moved)
}

/// Partition one channel's staging tree into `split_root/{train,validation,test}/<label>/`.
///
/// The plan is persisted before any clip moves. A manifest left by an interrupted
/// partition is finished first; whatever is still staged afterwards (clips staged
/// since the interruption) is then partitioned with a fresh plan.
pub fn partition_channel<R: Rng>(
    staging_root: &Path,
    split_root: &Path,
    split_config: &SplitConfig,
    rng: &mut R,
) -> Result<PartitionReport> {
    let manifest = manifest_path(split_root);
    let mut report = PartitionReport::default();

    if manifest.exists() {
        logger::info(&format!("resuming partition from {}", manifest.display()));
        let stored = load_manifest(&manifest)?;
        report.resumed = true;
        report.already_moved = apply_plan(&stored, staging_root, split_root)?;
        report.add_moves(&stored);
        fs::remove_file(&manifest).with_context(|| format!("Failed to remove manifest: {:?}", manifest))?;
    }

    let mut plan = plan_partition(staging_root, split_config, rng)?;
    avoid_collisions(&mut plan, split_root, rng);
    save_manifest(split_root, &plan)?;
    apply_plan(&plan, staging_root, split_root)?;
    fs::remove_file(&manifest).with_context(|| format!("Failed to remove manifest: {:?}", manifest))?;

    report.labels = plan.labels.len();
    report.add_moves(&plan);
    logger::info(&format!(
        "partitioned {}: {} train / {} validation / {} test over {} labels",
        staging_root.display(),
        report.train,
        report.validation,
        report.test,
        report.labels
    ));
    Ok(report)
}
