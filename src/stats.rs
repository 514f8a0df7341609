use serde::Serialize;

use crate::format::format_inr_compact;
use crate::models::collector::Collector;
use crate::models::task::{Task, TaskStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub financial_year: String,
    pub total_collectors: usize,
    pub active_collectors: usize,
    pub online_percent: u32,
    pub total_collected: f64,
    pub total_collected_display: String,
    pub pending_collection: f64,
    pub pending_collection_display: String,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
}

/// Dashboard header figures for one fiscal year.
///
/// Failed tasks still count towards the pending amount but not towards
/// the pending task count.
pub fn summarize(collectors: &[Collector], tasks: &[Task], financial_year: &str) -> SummaryStats {
    let year_collectors: Vec<&Collector> = collectors
        .iter()
        .filter(|collector| collector.financial_year == financial_year)
        .collect();
    let year_tasks: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.financial_year == financial_year)
        .collect();

    let total_collectors = year_collectors.len();
    let active_collectors = year_collectors
        .iter()
        .filter(|collector| collector.status.is_online())
        .count();
    let online_percent = if total_collectors == 0 {
        0
    } else {
        ((active_collectors as f64 / total_collectors as f64) * 100.0).round() as u32
    };

    let total_collected: f64 = year_collectors
        .iter()
        .map(|collector| collector.total_collected)
        .sum();
    let pending_collection: f64 = year_tasks
        .iter()
        .filter(|task| task.status != TaskStatus::Completed)
        .map(|task| task.outstanding())
        .sum();

    SummaryStats {
        financial_year: financial_year.to_string(),
        total_collectors,
        active_collectors,
        online_percent,
        total_collected,
        total_collected_display: format_inr_compact(total_collected),
        pending_collection,
        pending_collection_display: format_inr_compact(pending_collection),
        completed_tasks: year_tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Completed)
            .count(),
        pending_tasks: year_tasks.iter().filter(|task| task.status.is_open()).count(),
    }
}
