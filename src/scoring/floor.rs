//! Floor policy applied after raw deductions.
//!
//! Rules are evaluated in order and the first one that applies wins. The order
//! is the policy: a critical threat caps the floor at 30 even when only one
//! risk factor was found.

use serde::{Deserialize, Serialize};

/// Facts the floor rules look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorContext {
    pub risk_factor_count: usize,
    pub has_critical: bool,
    pub has_high: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloorAction {
    /// Replace the score with 100
    Perfect,
    /// Raise the score to at least this value
    AtLeast(i32),
}

impl FloorAction {
    pub fn apply(self, score: i32) -> i32 {
        match self {
            FloorAction::Perfect => 100,
            FloorAction::AtLeast(floor) => score.max(floor),
        }
    }
}

pub struct FloorRule {
    pub name: &'static str,
    pub applies: fn(&FloorContext) -> bool,
    pub action: FloorAction,
}

impl std::fmt::Debug for FloorRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloorRule")
            .field("name", &self.name)
            .field("action", &self.action)
            .finish()
    }
}

pub static FLOOR_POLICY: [FloorRule; 6] = [
    FloorRule {
        name: "no risk factors",
        applies: |ctx| ctx.risk_factor_count == 0,
        action: FloorAction::Perfect,
    },
    FloorRule {
        name: "critical threat",
        applies: |ctx| ctx.has_critical,
        action: FloorAction::AtLeast(30),
    },
    FloorRule {
        name: "high threat",
        applies: |ctx| ctx.has_high,
        action: FloorAction::AtLeast(70),
    },
    FloorRule {
        name: "single low risk",
        applies: |ctx| ctx.risk_factor_count <= 1,
        action: FloorAction::AtLeast(98),
    },
    FloorRule {
        name: "two low risks",
        applies: |ctx| ctx.risk_factor_count <= 2,
        action: FloorAction::AtLeast(90),
    },
    FloorRule {
        name: "multiple low risks",
        applies: |_| true,
        action: FloorAction::AtLeast(80),
    },
];

/// First matching rule. The last rule always matches.
pub fn select_rule(ctx: &FloorContext) -> &'static FloorRule {
    FLOOR_POLICY
        .iter()
        .find(|rule| (rule.applies)(ctx))
        .unwrap_or(&FLOOR_POLICY[FLOOR_POLICY.len() - 1])
}
