use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimationType {
    #[default]
    FadeUp,
    FadeDown,
    FadeLeft,
    FadeRight,
    ScaleUp,
    ScaleDown,
    FlipX,
    FlipY,
}

impl AnimationType {
    pub const ALL: [AnimationType; 8] = [
        AnimationType::FadeUp,
        AnimationType::FadeDown,
        AnimationType::FadeLeft,
        AnimationType::FadeRight,
        AnimationType::ScaleUp,
        AnimationType::ScaleDown,
        AnimationType::FlipX,
        AnimationType::FlipY,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationType::FadeUp => "fade-up",
            AnimationType::FadeDown => "fade-down",
            AnimationType::FadeLeft => "fade-left",
            AnimationType::FadeRight => "fade-right",
            AnimationType::ScaleUp => "scale-up",
            AnimationType::ScaleDown => "scale-down",
            AnimationType::FlipX => "flip-x",
            AnimationType::FlipY => "flip-y",
        }
    }

    /// Class carrying the initial transform for this animation.
    pub fn class_name(&self) -> String {
        format!("animate-{}", self.as_str())
    }
}

impl fmt::Display for AnimationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnimationType::ALL
            .iter()
            .find(|a| a.as_str() == s)
            .copied()
            .ok_or_else(|| anyhow!("unknown animation type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        assert_eq!("scale-up".parse::<AnimationType>().unwrap(), AnimationType::ScaleUp);
        assert_eq!(AnimationType::FlipY.class_name(), "animate-flip-y");
        assert!("spin".parse::<AnimationType>().is_err());
    }
}
