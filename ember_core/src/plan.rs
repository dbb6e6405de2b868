//! Gradual reduction plan engine.
//!
//! A plan walks the daily ceiling down from the starting count to zero:
//! - One stage per step, each lasting the pace's days-per-stage
//! - The final zero-cigarette stage always lasts 7 days
//! - Stages never advance on their own; see [`advance_stage`]

use crate::{
    DailyFeedback, DailyStatus, Error, Motivation, Pace, ReductionPlan, Result, Stage,
    StageStatus,
};
use chrono::{Duration, NaiveDate};

pub const MIN_STARTING_CIGARETTES: u32 = 1;
pub const MAX_STARTING_CIGARETTES: u32 = 50;

/// Length of the zero-cigarette consolidation stage
pub const FINAL_STAGE_DAYS: u32 = 7;

/// How an explicitly advanced stage ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    Failed,
}

/// Clamp user input to the supported starting range
pub fn clamp_starting_cigarettes(n: u32) -> u32 {
    n.clamp(MIN_STARTING_CIGARETTES, MAX_STARTING_CIGARETTES)
}

/// Generate a reduction plan
///
/// For `i` from `starting - 1` down to `0` a stage is emitted with
/// `id = starting - i`, `from = starting - i + 1`, `to = i`. Stage labels in
/// report surfaces are written against this numbering, so it is kept as is
/// even where `from` does not read like a natural step boundary.
pub fn generate_plan(
    starting: u32,
    pace: Pace,
    motivation: Motivation,
    created: NaiveDate,
) -> Result<ReductionPlan> {
    if !(MIN_STARTING_CIGARETTES..=MAX_STARTING_CIGARETTES).contains(&starting) {
        return Err(Error::InvalidPlanParameters {
            got: starting,
            min: MIN_STARTING_CIGARETTES,
            max: MAX_STARTING_CIGARETTES,
        });
    }

    let days_per_stage = pace.days_per_stage();
    let mut stages: Vec<Stage> = Vec::with_capacity(starting as usize);

    for i in (0..starting).rev() {
        let first = stages.is_empty();
        stages.push(Stage {
            id: starting - i,
            from: starting - i + 1,
            to: i,
            duration: if i == 0 { FINAL_STAGE_DAYS } else { days_per_stage },
            status: if first {
                StageStatus::Active
            } else {
                StageStatus::Pending
            },
            start_date: first.then_some(created),
            completion_date: None,
        });
    }

    tracing::info!(
        "Generated {:?} plan from {} cigarettes/day with {} stages",
        pace,
        starting,
        stages.len()
    );

    Ok(ReductionPlan {
        pace,
        starting_cigarettes: starting,
        current_level: starting,
        stages,
        created_date: created,
        motivation,
    })
}

/// The stage currently marked active, if any
pub fn current_stage(plan: &ReductionPlan) -> Option<&Stage> {
    plan.stages.iter().find(|s| s.status == StageStatus::Active)
}

/// Daily ceiling of the active stage
pub fn today_goal(plan: &ReductionPlan) -> Option<u32> {
    current_stage(plan).map(|s| s.to)
}

/// Compare today's total against the goal. Does not touch stage status.
pub fn evaluate_today(plan: &ReductionPlan, today_total: u32) -> Option<DailyFeedback> {
    let goal = today_goal(plan)?;
    let status = if today_total <= goal {
        DailyStatus::Success
    } else {
        DailyStatus::Warning
    };
    Some(DailyFeedback { status, goal })
}

pub fn completed_stages(plan: &ReductionPlan) -> usize {
    plan.stages
        .iter()
        .filter(|s| s.status == StageStatus::Completed)
        .count()
}

/// Share of completed stages, 0.0..=100.0
pub fn progress_percent(plan: &ReductionPlan) -> f64 {
    let total = plan.stages.len().max(1);
    completed_stages(plan) as f64 / total as f64 * 100.0
}

/// Days left in the active stage counting `today`, or None when nothing is
/// active or the stage has no start date
pub fn days_remaining(plan: &ReductionPlan, today: NaiveDate) -> Option<u32> {
    let stage = current_stage(plan)?;
    let start = stage.start_date?;
    let end = start + Duration::days(i64::from(stage.duration));
    let left = (end - today).num_days().clamp(0, i64::from(stage.duration));
    Some(left as u32)
}

/// Close the active stage and activate the next pending one
///
/// This is only ever called on explicit user request. Returns the newly
/// active stage, or `None` if the plan has no further stages. Fails with
/// [`Error::PlanFinished`] when no stage is active.
pub fn advance_stage(
    plan: &mut ReductionPlan,
    outcome: StageOutcome,
    on: NaiveDate,
) -> Result<Option<&Stage>> {
    let idx = plan
        .stages
        .iter()
        .position(|s| s.status == StageStatus::Active)
        .ok_or(Error::PlanFinished)?;

    {
        let stage = &mut plan.stages[idx];
        stage.status = match outcome {
            StageOutcome::Completed => StageStatus::Completed,
            StageOutcome::Failed => StageStatus::Failed,
        };
        stage.completion_date = Some(on);
        plan.current_level = stage.to;
        tracing::info!("Stage {} closed as {:?}", stage.id, outcome);
    }

    let next = plan.stages[idx + 1..]
        .iter()
        .position(|s| s.status == StageStatus::Pending)
        .map(|offset| idx + 1 + offset);

    match next {
        Some(next_idx) => {
            let stage = &mut plan.stages[next_idx];
            stage.status = StageStatus::Active;
            stage.start_date = Some(on);
            tracing::debug!("Stage {} is now active (goal {})", stage.id, stage.to);
            Ok(Some(&plan.stages[next_idx]))
        }
        None => {
            tracing::info!("Reduction plan finished");
            Ok(None)
        }
    }
}
