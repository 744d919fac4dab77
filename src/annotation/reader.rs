use roxmltree::{Document, Node};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{Channel, Interval, LabelSpans, SessionAnnotations};
use crate::shared::constants;

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("failed to read annotation file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed annotation document: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("{} span {}: attribute `{}` is {}", .tier, .index, .attr, describe_value(.value))]
    Field {
        tier: &'static str,
        index: usize,
        attr: &'static str,
        value: Option<String>,
    },

    #[error("{tier} span {index}: missing label value")]
    MissingLabel { tier: &'static str, index: usize },

    #[error("{tier} span {index}: label {label:?} cannot be used as a directory name")]
    UnsafeLabel {
        tier: &'static str,
        index: usize,
        label: String,
    },
}

fn describe_value(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("not a number: {:?}", v),
        None => "missing".to_string(),
    }
}

pub fn read_annotation(path: &Path) -> Result<SessionAnnotations, AnnotationError> {
    let text = fs::read_to_string(path).map_err(|source| AnnotationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_annotation(&text)
}

pub fn parse_annotation(text: &str) -> Result<SessionAnnotations, AnnotationError> {
    let doc = Document::parse(text)?;
    let mut annotations = SessionAnnotations::default();

    for channel in Channel::ALL {
        let tier = doc.descendants().find(|node| {
            node.has_tag_name(constants::TIER_TAG)
                && node.attribute(constants::TIER_ID_ATTR) == Some(channel.tier_id())
        });
        if let Some(tier) = tier {
            *annotations.channel_mut(channel) = read_tier(tier, channel.tier_id())?;
        }
    }

    Ok(annotations)
}

fn read_tier(tier: Node, tier_id: &'static str) -> Result<LabelSpans, AnnotationError> {
    let mut spans = LabelSpans::new();

    let span_nodes = tier
        .children()
        .filter(|node| node.has_tag_name(constants::SPAN_TAG));
    for (index, span) in span_nodes.enumerate() {
        let start = read_seconds(span, constants::SPAN_START_ATTR, tier_id, index)?;
        let end = read_seconds(span, constants::SPAN_END_ATTR, tier_id, index)?;
        let label = read_label(span, tier_id, index)?;

        spans
            .entry(label)
            .or_default()
            .push(Interval::new(start, end));
    }

    Ok(spans)
}

fn read_seconds(
    span: Node,
    attr: &'static str,
    tier: &'static str,
    index: usize,
) -> Result<f64, AnnotationError> {
    let raw = span.attribute(attr);
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| AnnotationError::Field {
            tier,
            index,
            attr,
            value: raw.map(str::to_string),
        })
}

fn read_label(span: Node, tier: &'static str, index: usize) -> Result<String, AnnotationError> {
    let label = span
        .children()
        .find(|node| node.has_tag_name(constants::SPAN_VALUE_TAG))
        .and_then(|v| v.text())
        .filter(|text| !text.is_empty())
        .ok_or(AnnotationError::MissingLabel { tier, index })?;

    if label == "." || label == ".." || label.contains(['/', '\\']) {
        return Err(AnnotationError::UnsafeLabel {
            tier,
            index,
            label: label.to_string(),
        });
    }

    Ok(label.to_string())
}
