pub mod reader;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::shared::constants;

pub use reader::{read_annotation, AnnotationError};

/// One of the two annotated hand-trajectory tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Channel {
    LeftHand,
    RightHand,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::LeftHand, Channel::RightHand];

    /// `columns` attribute of the channel's tier
    pub fn tier_id(self) -> &'static str {
        match self {
            Channel::LeftHand => constants::LEFT_HAND_TIER,
            Channel::RightHand => constants::RIGHT_HAND_TIER,
        }
    }

    /// Short tag, also the name of the channel's split root
    pub fn tag(self) -> &'static str {
        match self {
            Channel::LeftHand => "LH",
            Channel::RightHand => "RH",
        }
    }

    pub fn staging_dir_name(self) -> String {
        format!("{}{}", constants::STAGING_DIR_PREFIX, self.tag())
    }
}

/// A labeled span in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Label -> intervals in document order
pub type LabelSpans = BTreeMap<String, Vec<Interval>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionAnnotations {
    pub left_hand: LabelSpans,
    pub right_hand: LabelSpans,
}

impl SessionAnnotations {
    pub fn channel(&self, channel: Channel) -> &LabelSpans {
        match channel {
            Channel::LeftHand => &self.left_hand,
            Channel::RightHand => &self.right_hand,
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut LabelSpans {
        match channel {
            Channel::LeftHand => &mut self.left_hand,
            Channel::RightHand => &mut self.right_hand,
        }
    }

    pub fn interval_count(&self) -> usize {
        Channel::ALL
            .iter()
            .flat_map(|c| self.channel(*c).values())
            .map(Vec::len)
            .sum()
    }
}
