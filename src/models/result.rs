// src/models/result.rs

use serde::{Deserialize, Serialize};

/// Result of a graded attempt, as returned by the grading service.
///
/// Every field is optional on the wire; missing values take the defaults
/// below. The engine only displays these values and never recomputes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultSummary {
    pub attempt_id: Option<String>,
    /// Raw points scored.
    pub score: Option<f64>,
    pub percentage: f64,
    pub passed: bool,
    pub xp_earned: u32,
    pub perfect: bool,
    pub fast: bool,
    /// Days-in-a-row learning streak (server side), not the in-session combo.
    pub streak: u32,
    pub feedback: Option<String>,
    pub new_achievements: Vec<Achievement>,
    pub level_up: bool,
    pub learning_stats: Option<LearningStats>,
}

/// An achievement unlocked by this attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Achievement {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub xp_reward: u32,
}

/// Snapshot of the learner's progression after grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearningStats {
    pub level: u32,
    #[serde(rename = "totalXP")]
    pub total_xp: u32,
    pub xp_to_next_level: Option<u32>,
    pub streak: u32,
    pub longest_streak: u32,
}

impl Default for LearningStats {
    fn default() -> Self {
        Self {
            level: 1,
            total_xp: 0,
            xp_to_next_level: None,
            streak: 0,
            longest_streak: 0,
        }
    }
}
