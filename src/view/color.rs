use serde::Serialize;

/// Coverage band a score falls into, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Weak,
    Poor,
    NoContracts,
}

impl ScoreBand {
    pub const ALL: [Self; 6] = [
        Self::Excellent,
        Self::Good,
        Self::Fair,
        Self::Weak,
        Self::Poor,
        Self::NoContracts,
    ];

    pub fn color(self) -> &'static str {
        match self {
            Self::Excellent => "#1a9850",
            Self::Good => "#91cf60",
            Self::Fair => "#d9ef8b",
            Self::Weak => "#fee08b",
            Self::Poor => "#fc8d59",
            Self::NoContracts => "#7f1d1d",
        }
    }
}

/// First match in descending threshold order.
pub fn score_band(score: u8) -> ScoreBand {
    if score >= 90 {
        ScoreBand::Excellent
    } else if score >= 75 {
        ScoreBand::Good
    } else if score >= 50 {
        ScoreBand::Fair
    } else if score >= 25 {
        ScoreBand::Weak
    } else if score >= 1 {
        ScoreBand::Poor
    } else {
        ScoreBand::NoContracts
    }
}

pub fn color_for_score(score: u8) -> &'static str {
    score_band(score).color()
}

/// Score bar width in percent.
pub fn score_bar_width(score: u8) -> u8 {
    score.min(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_match_bands_at_boundaries() {
        let cases = [
            (0, ScoreBand::NoContracts),
            (1, ScoreBand::Poor),
            (24, ScoreBand::Poor),
            (25, ScoreBand::Weak),
            (49, ScoreBand::Weak),
            (50, ScoreBand::Fair),
            (74, ScoreBand::Fair),
            (75, ScoreBand::Good),
            (89, ScoreBand::Good),
            (90, ScoreBand::Excellent),
            (100, ScoreBand::Excellent),
        ];

        for (score, band) in cases {
            assert_eq!(score_band(score), band, "score {score}");
            assert_eq!(color_for_score(score), band.color(), "score {score}");
        }
    }

    #[test]
    fn ramp_is_monotonic() {
        let mut last = 0;
        for score in 0..=100u8 {
            let rank = ScoreBand::ALL
                .iter()
                .rev()
                .position(|band| *band == score_band(score))
                .unwrap();
            assert!(rank >= last);
            last = rank;
        }
    }

    #[test]
    fn colors_are_distinct() {
        let mut colors: Vec<&str> = ScoreBand::ALL.iter().map(|b| b.color()).collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), 6);
    }

    #[test]
    fn bar_width_is_the_score() {
        assert_eq!(score_bar_width(0), 0);
        assert_eq!(score_bar_width(73), 73);
        assert_eq!(score_bar_width(100), 100);
    }
}
