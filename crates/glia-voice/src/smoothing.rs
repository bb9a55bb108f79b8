//! Majority-vote smoothing over the most recent raw labels.

use crate::emotion::Emotion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Latest stable estimate for one direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedEstimate {
    /// Window centre of the classification that produced this estimate
    pub timestamp_sec: f64,
    /// Majority label over the smoothing horizon
    pub label: Emotion,
    /// Confidence of the raw classification that triggered the update
    pub confidence: f32,
    pub observed_at: DateTime<Utc>,
}

/// Mode of the last `horizon` labels.
///
/// Tie-break: when several labels share the highest count, the one whose earliest
/// occurrence inside the horizon is oldest wins.
#[derive(Debug, Clone)]
pub struct MajorityVote {
    history: VecDeque<Emotion>,
    horizon: usize,
}

impl MajorityVote {
    pub fn new(horizon: usize) -> Self {
        let horizon = horizon.max(1);
        Self {
            history: VecDeque::with_capacity(horizon),
            horizon,
        }
    }

    /// Record a raw label and return the current majority.
    pub fn push(&mut self, label: Emotion) -> Emotion {
        if self.history.len() == self.horizon {
            self.history.pop_front();
        }
        self.history.push_back(label);
        self.current().unwrap_or(label)
    }

    /// Majority over the current horizon, `None` before the first label.
    pub fn current(&self) -> Option<Emotion> {
        let mut counts = [0usize; Emotion::COUNT];
        for label in &self.history {
            counts[*label as usize] += 1;
        }
        let max = counts.iter().copied().max().unwrap_or(0);
        self.history
            .iter()
            .copied()
            .find(|label| counts[*label as usize] == max)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Emotion::*;

    #[test]
    fn empty_vote_has_no_majority() {
        assert_eq!(MajorityVote::new(5).current(), None);
    }

    #[test]
    fn majority_over_last_five() {
        let mut vote = MajorityVote::new(5);
        for label in [Sad, Sad, Sad, Happy, Happy] {
            vote.push(label);
        }
        assert_eq!(vote.current(), Some(Sad));

        // Oldest SAD falls out of the horizon: SAD 2, HAPPY 3.
        assert_eq!(vote.push(Happy), Happy);
        assert_eq!(vote.len(), 5);
    }

    #[test]
    fn tie_goes_to_oldest_first_occurrence() {
        let mut vote = MajorityVote::new(5);
        assert_eq!(vote.push(Happy), Happy);
        assert_eq!(vote.push(Sad), Happy);
        assert_eq!(vote.push(Sad), Sad);
        assert_eq!(vote.push(Happy), Happy);
    }

    #[test]
    fn tie_after_eviction_uses_remaining_history() {
        let mut vote = MajorityVote::new(3);
        for label in [Angry, Fear, Fear, Angry] {
            vote.push(label);
        }
        // History is [Fear, Fear, Angry].
        assert_eq!(vote.current(), Some(Fear));
        // History is [Fear, Angry, Angry].
        assert_eq!(vote.push(Angry), Angry);
    }

    #[test]
    fn matches_mode_of_recent_labels() {
        let labels = [Neutral, Angry, Angry, Sad, Neutral, Neutral, Disgust, Angry, Sad, Sad];
        let mut vote = MajorityVote::new(5);
        for (i, label) in labels.iter().enumerate() {
            let smoothed = vote.push(*label);
            let recent = &labels[i.saturating_sub(4)..=i];
            let count = |l: Emotion| recent.iter().filter(|&&x| x == l).count();
            let best = recent.iter().map(|&l| count(l)).max().unwrap();
            assert_eq!(count(smoothed), best);
        }
    }
}
