//! Session scheduling optimizer.
//!
//! Selects and orders imaging targets into non-overlapping windows inside
//! the night's darkness. The optimizer is a pure function over its inputs:
//! persistence and UI state live in thin adapters around it, never inside
//! it. Unschedulable targets are reported in `excluded_target_ids`, and a
//! zero-darkness night yields an empty plan, never an error.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::api::Period;
use crate::astro::{horizontal, lunar};
use crate::models::catalog::DeepSkyObject;
use crate::models::time::JulianDate;
use crate::services::enrichment::{visibility_score, AltitudeData};
use crate::services::nighttime::NighttimeData;


/// Objective used to pick among competing candidates.
///
/// The strategy only changes the slot-assignment objective; non-overlap and
/// manual-edit precedence hold under every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStrategy {
    /// Fill as much of the darkness as possible
    #[default]
    MaximizeImagingTime,
    /// Fit as many distinct targets as possible
    MaximizeTargetCount,
    /// Schedule strictly by caller-assigned priority
    PriorityOrdered,
}

/// One candidate target with its per-target constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetCandidate {
    pub object: DeepSkyObject,
    /// Altitude curve for the night being planned
    pub altitude_data: AltitudeData,
    /// Altitude floor for usable imaging time
    pub min_altitude: qtty::Degrees,
    /// Smallest worthwhile imaging window, in minutes
    pub min_imaging_minutes: f64,
    /// Caller-assigned priority, higher first; only consulted by
    /// [`OptimizationStrategy::PriorityOrdered`]
    pub priority: Option<f64>,
}

/// A user-forced target placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForcedTarget {
    pub target_id: String,
    /// Fixed window; `None` asks for the target's best-fit window
    pub period: Option<Period>,
}

/// Manual plan edits. These always take precedence over the optimizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualEdits {
    #[serde(default)]
    pub forced_includes: Vec<ForcedTarget>,
    #[serde(default)]
    pub excluded_target_ids: Vec<String>,
}

/// One scheduled imaging window. Immutable snapshot produced only by the
/// optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTarget {
    pub target_id: String,
    pub name: String,
    pub ra: qtty::Degrees,
    pub dec: qtty::Degrees,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: f64,
    /// Highest altitude the target reaches during the night
    pub max_altitude: qtty::Degrees,
    /// Angular distance to the Moon at the window midpoint
    pub moon_distance: qtty::Degrees,
    /// Composite score in [0, 1]
    pub feasibility_score: f64,
    /// Position in the night's running order, 0-based
    pub order_index: usize,
}

/// The optimizer's result for one night.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPlan {
    /// Scheduled windows ordered by start time; never overlapping
    pub targets: Vec<ScheduledTarget>,
    /// Candidates that could not be scheduled
    pub excluded_target_ids: Vec<String>,
    /// Sum of scheduled window lengths, minutes
    pub total_imaging_minutes: f64,
    /// Scheduled time over darkness duration, percent [0, 100]
    pub night_coverage: f64,
    /// Scheduled time over the theoretical achievable maximum, [0, 1]
    pub efficiency: f64,
}

impl SessionPlan {
    fn empty(excluded_target_ids: Vec<String>) -> Self {
        Self {
            targets: Vec::new(),
            excluded_target_ids,
            total_imaging_minutes: 0.0,
            night_coverage: 0.0,
            efficiency: 0.0,
        }
    }
}

/// Half-open interval in Julian Date.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Block {
    start: f64,
    end: f64,
}

impl Block {
    fn minutes(&self) -> f64 {
        (self.end - self.start) * 1440.0
    }

    fn intersect(&self, other: &Block) -> Option<Block> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start < end {
            Some(Block { start, end })
        } else {
            None
        }
    }
}

/// Optimize a night session.
///
/// `night` supplies the darkness window, `candidates` carry their altitude
/// curves and per-target constraints, and `edits` are applied with absolute
/// precedence: forced targets are placed first as fixed blocks and the
/// optimizer packs the remaining candidates into the leftover free slots.
pub fn optimize_session(
    night: &NighttimeData,
    candidates: &[TargetCandidate],
    strategy: OptimizationStrategy,
    edits: &ManualEdits,
) -> SessionPlan {
    let Some((dark_start, dark_end)) = night.darkness_window() else {
        // Zero-darkness night: nothing is schedulable.
        return SessionPlan::empty(candidates.iter().map(|c| c.object.id.clone()).collect());
    };

    let darkness = Block {
        start: JulianDate::from_datetime(dark_start).value(),
        end: JulianDate::from_datetime(dark_end).value(),
    };
    let darkness_minutes = darkness.minutes();
    if darkness_minutes <= 0.0 {
        return SessionPlan::empty(candidates.iter().map(|c| c.object.id.clone()).collect());
    }

    let forced_ids: HashSet<&str> = edits
        .forced_includes
        .iter()
        .map(|f| f.target_id.as_str())
        .collect();
    // A target both forced and excluded: the forced include wins, being the
    // more specific edit.
    let excluded_ids: HashSet<&str> = edits
        .excluded_target_ids
        .iter()
        .map(|s| s.as_str())
        .filter(|id| !forced_ids.contains(id))
        .collect();

    let mut excluded: Vec<String> = Vec::new();
    let mut occupied: Vec<Block> = Vec::new();
    let mut placements: Vec<(usize, Block)> = Vec::new();

    for candidate in candidates {
        if excluded_ids.contains(candidate.object.id.as_str()) {
            excluded.push(candidate.object.id.clone());
        }
    }

    // Forced includes are placed first, verbatim where a period is given.
    for forced in &edits.forced_includes {
        let Some(index) = candidates
            .iter()
            .position(|c| c.object.id == forced.target_id)
        else {
            debug!("forced target '{}' is not a candidate", forced.target_id);
            continue;
        };

        let desired = match &forced.period {
            Some(period) => Some(Block {
                start: JulianDate::from_datetime(period.start).value(),
                end: JulianDate::from_datetime(period.end).value(),
            }),
            None => eligible_runs(&candidates[index], &darkness)
                .into_iter()
                .max_by(|a, b| compare_f64(a.minutes(), b.minutes())),
        };

        match desired.and_then(|block| longest_free_portion(&block, &occupied)) {
            Some(block) if block.minutes() > 0.0 => {
                occupied.push(block);
                placements.push((index, block));
            }
            _ => excluded.push(forced.target_id.clone()),
        }
    }

    // Remaining candidates, ordered by the strategy objective.
    let mut remaining: Vec<usize> = (0..candidates.len())
        .filter(|&i| {
            let id = candidates[i].object.id.as_str();
            !forced_ids.contains(id) && !excluded_ids.contains(id)
        })
        .collect();

    sort_by_strategy(&mut remaining, candidates, &darkness, strategy);

    for index in remaining {
        let candidate = &candidates[index];
        let runs = eligible_runs(candidate, &darkness);
        if runs.is_empty() {
            excluded.push(candidate.object.id.clone());
            continue;
        }

        match best_placement(&runs, &occupied, &darkness, candidate, strategy) {
            Some(block) => {
                occupied.push(block);
                placements.push((index, block));
            }
            None => excluded.push(candidate.object.id.clone()),
        }
    }

    assemble_plan(
        candidates,
        placements,
        excluded,
        &darkness,
        darkness_minutes,
        &excluded_ids,
    )
}

/// Contiguous above-threshold runs inside darkness that satisfy the
/// candidate's minimum imaging time.
fn eligible_runs(candidate: &TargetCandidate, darkness: &Block) -> Vec<Block> {
    let min_altitude = candidate.min_altitude.value();
    let mut runs: Vec<Block> = Vec::new();
    let mut current: Option<(f64, f64)> = None;

    for sample in &candidate.altitude_data.samples {
        let jd = JulianDate::from_datetime(sample.time).value();
        if sample.altitude.value() >= min_altitude {
            current = match current {
                Some((start, _)) => Some((start, jd)),
                None => Some((jd, jd)),
            };
        } else if let Some((start, end)) = current.take() {
            runs.push(Block { start, end });
        }
    }
    if let Some((start, end)) = current {
        runs.push(Block { start, end });
    }

    runs.iter()
        .filter_map(|run| run.intersect(darkness))
        .filter(|run| run.minutes() + 1e-9 >= candidate.min_imaging_minutes)
        .collect()
}

/// Free sub-intervals of `window` once `occupied` blocks are removed.
fn free_slots(window: &Block, occupied: &[Block]) -> Vec<Block> {
    let mut blocks: Vec<Block> = occupied
        .iter()
        .filter_map(|b| b.intersect(window))
        .collect();
    blocks.sort_by(|a, b| compare_f64(a.start, b.start));

    let mut slots = Vec::new();
    let mut cursor = window.start;
    for block in blocks {
        if block.start > cursor {
            slots.push(Block {
                start: cursor,
                end: block.start,
            });
        }
        cursor = cursor.max(block.end);
    }
    if cursor < window.end {
        slots.push(Block {
            start: cursor,
            end: window.end,
        });
    }
    slots
}

/// Largest free portion of a desired block given already occupied blocks.
fn longest_free_portion(desired: &Block, occupied: &[Block]) -> Option<Block> {
    free_slots(desired, occupied)
        .into_iter()
        .max_by(|a, b| compare_f64(a.minutes(), b.minutes()))
}

/// Pick the candidate's window under the strategy objective.
fn best_placement(
    runs: &[Block],
    occupied: &[Block],
    darkness: &Block,
    candidate: &TargetCandidate,
    strategy: OptimizationStrategy,
) -> Option<Block> {
    let slots = free_slots(darkness, occupied);
    let mut overlaps: Vec<Block> = Vec::new();
    for run in runs {
        for slot in &slots {
            if let Some(overlap) = run.intersect(slot) {
                if overlap.minutes() + 1e-9 >= candidate.min_imaging_minutes {
                    overlaps.push(overlap);
                }
            }
        }
    }

    match strategy {
        OptimizationStrategy::MaximizeImagingTime | OptimizationStrategy::PriorityOrdered => {
            overlaps
                .into_iter()
                .max_by(|a, b| compare_f64(a.minutes(), b.minutes()))
        }
        OptimizationStrategy::MaximizeTargetCount => {
            // Occupy only the minimum worthwhile window, leaving room for
            // the next target.
            let tightest = overlaps
                .into_iter()
                .min_by(|a, b| compare_f64(a.minutes(), b.minutes()))?;
            let wanted_days = candidate.min_imaging_minutes.max(1.0) / 1440.0;
            Some(Block {
                start: tightest.start,
                end: (tightest.start + wanted_days).min(tightest.end),
            })
        }
    }
}

fn sort_by_strategy(
    order: &mut [usize],
    candidates: &[TargetCandidate],
    darkness: &Block,
    strategy: OptimizationStrategy,
) {
    let best_run_minutes = |i: usize| -> f64 {
        eligible_runs(&candidates[i], darkness)
            .iter()
            .map(|r| r.minutes())
            .fold(0.0, f64::max)
    };

    match strategy {
        OptimizationStrategy::MaximizeImagingTime => {
            order.sort_by(|&a, &b| {
                compare_f64(best_run_minutes(b), best_run_minutes(a))
                    .then_with(|| candidates[a].object.id.cmp(&candidates[b].object.id))
            });
        }
        OptimizationStrategy::MaximizeTargetCount => {
            order.sort_by(|&a, &b| {
                compare_f64(
                    candidates[a].min_imaging_minutes,
                    candidates[b].min_imaging_minutes,
                )
                .then_with(|| candidates[a].object.id.cmp(&candidates[b].object.id))
            });
        }
        OptimizationStrategy::PriorityOrdered => {
            order.sort_by(|&a, &b| {
                let pa = candidates[a].priority.unwrap_or(f64::NEG_INFINITY);
                let pb = candidates[b].priority.unwrap_or(f64::NEG_INFINITY);
                compare_f64(pb, pa)
                    .then_with(|| candidates[a].object.id.cmp(&candidates[b].object.id))
            });
        }
    }
}

fn assemble_plan(
    candidates: &[TargetCandidate],
    mut placements: Vec<(usize, Block)>,
    mut excluded: Vec<String>,
    darkness: &Block,
    darkness_minutes: f64,
    user_excluded: &HashSet<&str>,
) -> SessionPlan {
    placements.sort_by(|a, b| compare_f64(a.1.start, b.1.start));

    let targets: Vec<ScheduledTarget> = placements
        .iter()
        .enumerate()
        .map(|(order_index, (index, block))| {
            let candidate = &candidates[*index];
            let midpoint = JulianDate::new((block.start + block.end) / 2.0);
            let moon = lunar::moon_position(midpoint);
            let moon_distance = horizontal::angular_separation(
                candidate.object.ra.value(),
                candidate.object.dec.value(),
                moon.ra.value(),
                moon.dec.value(),
            );
            let duration_minutes = block.minutes();
            let feasibility_score = visibility_score(
                candidate.altitude_data.max_altitude.value(),
                moon_distance,
                duration_minutes / darkness_minutes,
            );

            ScheduledTarget {
                target_id: candidate.object.id.clone(),
                name: candidate.object.name.clone(),
                ra: candidate.object.ra,
                dec: candidate.object.dec,
                start_time: JulianDate::new(block.start).to_datetime(),
                end_time: JulianDate::new(block.end).to_datetime(),
                duration_minutes,
                max_altitude: candidate.altitude_data.max_altitude,
                moon_distance: qtty::Degrees::new(moon_distance),
                feasibility_score,
                order_index,
            }
        })
        .collect();

    let total_imaging_minutes: f64 = targets.iter().map(|t| t.duration_minutes).sum();

    // Theoretical maximum: every non-excluded candidate imaged for its best
    // single window, capped by the darkness itself.
    let achievable: f64 = candidates
        .iter()
        .filter(|c| !user_excluded.contains(c.object.id.as_str()))
        .map(|c| {
            eligible_runs(c, darkness)
                .iter()
                .map(|r| r.minutes())
                .fold(0.0, f64::max)
        })
        .sum();
    let theoretical_max = achievable.min(darkness_minutes);

    let night_coverage = if darkness_minutes > 0.0 {
        (total_imaging_minutes / darkness_minutes * 100.0).min(100.0)
    } else {
        0.0
    };
    let efficiency = if theoretical_max > 0.0 {
        (total_imaging_minutes / theoretical_max).min(1.0)
    } else {
        0.0
    };

    excluded.dedup();
    debug!(
        "scheduled {} targets, {} excluded, {:.0} of {:.0} dark minutes",
        targets.len(),
        excluded.len(),
        total_imaging_minutes,
        darkness_minutes
    );

    SessionPlan {
        targets,
        excluded_target_ids: excluded,
        total_imaging_minutes,
        night_coverage,
        efficiency,
    }
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
