use std::fmt;

use serde::{Deserialize, Serialize};

/// Labels the emotion classifier is trained on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fear,
    Disgust,
    Surprise,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fear,
        Emotion::Disgust,
        Emotion::Surprise,
    ];

    /// Case-insensitive lookup of a classifier label. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "neutral" => Some(Emotion::Neutral),
            "happy" => Some(Emotion::Happy),
            "sad" => Some(Emotion::Sad),
            "angry" => Some(Emotion::Angry),
            "fear" => Some(Emotion::Fear),
            "disgust" => Some(Emotion::Disgust),
            "surprise" => Some(Emotion::Surprise),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fear => "fear",
            Emotion::Disgust => "disgust",
            Emotion::Surprise => "surprise",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Study-state name shown to the user, derived from the raw emotion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DerivedLabel {
    #[serde(rename = "Frustrated")]
    Frustrated,
    #[serde(rename = "Anxious / Overwhelmed")]
    AnxiousOverwhelmed,
    #[serde(rename = "Zoned Out / Passive")]
    ZonedOutPassive,
    #[serde(rename = "Motivated / Engaged")]
    MotivatedEngaged,
    #[serde(rename = "Distracted / Alert")]
    DistractedAlert,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl DerivedLabel {
    pub fn from_emotion(emotion: Option<Emotion>) -> Self {
        match emotion {
            Some(Emotion::Angry | Emotion::Disgust) => DerivedLabel::Frustrated,
            Some(Emotion::Fear | Emotion::Sad) => DerivedLabel::AnxiousOverwhelmed,
            Some(Emotion::Neutral) => DerivedLabel::ZonedOutPassive,
            Some(Emotion::Happy) => DerivedLabel::MotivatedEngaged,
            Some(Emotion::Surprise) => DerivedLabel::DistractedAlert,
            None => DerivedLabel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DerivedLabel::Frustrated => "Frustrated",
            DerivedLabel::AnxiousOverwhelmed => "Anxious / Overwhelmed",
            DerivedLabel::ZonedOutPassive => "Zoned Out / Passive",
            DerivedLabel::MotivatedEngaged => "Motivated / Engaged",
            DerivedLabel::DistractedAlert => "Distracted / Alert",
            DerivedLabel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DerivedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
