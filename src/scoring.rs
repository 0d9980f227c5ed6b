use crate::model::ScoringEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoringSummary {
    /// Largest favored-side lead that the opponent later pulled level.
    pub max_blown_lead: u32,
    pub favored_goals: u32,
    pub opponent_goals: u32,
}

impl ScoringSummary {
    pub fn is_loss(&self) -> bool {
        self.favored_goals < self.opponent_goals
    }

    pub fn goal_differential(&self) -> i64 {
        i64::from(self.favored_goals) - i64::from(self.opponent_goals)
    }

    /// Replaces the event tallies with the official final score. Shootout
    /// winners get a goal on the scoreboard that never shows up as an event.
    pub fn with_final_score(self, favored_goals: u32, opponent_goals: u32) -> Self {
        Self {
            favored_goals,
            opponent_goals,
            ..self
        }
    }
}

/// Walks the goals in chronological order from `favored`'s point of view.
///
/// A lead only counts as blown when the opponent ties the game; trimming a
/// 3-goal lead to 1 and hanging on is not a blown lead.
pub fn analyze_scoring(events: &[ScoringEvent], favored: &str) -> ScoringSummary {
    let mut out = ScoringSummary::default();
    let mut max_lead = 0u32;

    for event in events {
        if event.team == favored {
            out.favored_goals += 1;
            let lead = out.favored_goals.saturating_sub(out.opponent_goals);
            max_lead = max_lead.max(lead);
        } else {
            out.opponent_goals += 1;
            if out.favored_goals == out.opponent_goals {
                out.max_blown_lead = out.max_blown_lead.max(max_lead);
                max_lead = 0;
            }
        }
    }

    out
}
