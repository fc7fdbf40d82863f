use crate::dates::{CompletionDates, date_key, days_in_month, month_key};
use crate::models::{DashboardStats, Habit, HabitSummary, HeatmapDay, HeatmapTier, Task};
use chrono::{Local, NaiveDate};

impl HeatmapTier {
    pub fn from_count(count: u32) -> Self {
        match count {
            0 => HeatmapTier::None,
            1 => HeatmapTier::Low,
            2 => HeatmapTier::Medium,
            _ => HeatmapTier::High,
        }
    }
}

/// Consecutive days ending on `today` with a completion.
///
/// Dates after `today` are ignored. If the newest remaining date is not
/// `today` the streak is zero, even when a run ended yesterday.
pub fn current_streak(dates: &CompletionDates, today: NaiveDate) -> u32 {
    let mut expected = Some(today);
    let mut streak = 0;
    for date in dates.newest_first_until(today) {
        if Some(date) != expected {
            break;
        }
        streak += 1;
        expected = date.pred_opt();
    }
    streak
}

pub fn longest_streak(habits: &[Habit], today: NaiveDate) -> u32 {
    habits
        .iter()
        .map(|habit| current_streak(&habit.completion_dates(), today))
        .max()
        .unwrap_or(0)
}

/// Per-day count of habits completed, for every day of the month containing
/// `month`.
pub fn heatmap(habits: &[Habit], month: NaiveDate) -> Vec<HeatmapDay> {
    let sets: Vec<CompletionDates> = habits.iter().map(Habit::completion_dates).collect();
    days_in_month(month)
        .into_iter()
        .map(|day| {
            let count = sets.iter().filter(|dates| dates.contains(day)).count() as u32;
            HeatmapDay {
                date: date_key(day),
                count,
                tier: HeatmapTier::from_count(count),
            }
        })
        .collect()
}

/// Integer percentage rounded half up; zero when `total` is zero.
pub fn completion_percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    ((200 * completed + total) / (2 * total)) as u32
}

pub fn completion_rate(tasks: &[Task]) -> u32 {
    let completed = tasks.iter().filter(|task| task.completed).count();
    completion_percentage(completed, tasks.len())
}

pub fn build_dashboard(tasks: &[Task], habits: &[Habit]) -> DashboardStats {
    build_dashboard_at(Local::now().date_naive(), tasks, habits)
}

pub fn build_dashboard_at(today: NaiveDate, tasks: &[Task], habits: &[Habit]) -> DashboardStats {
    DashboardStats {
        total_tasks: tasks.len(),
        completed_tasks: tasks.iter().filter(|task| task.completed).count(),
        completion_rate: completion_rate(tasks),
        active_habits: habits.len(),
        current_streak: longest_streak(habits, today),
    }
}

pub fn build_habit_summary_at(today: NaiveDate, month: NaiveDate, habits: &[Habit]) -> HabitSummary {
    let sets: Vec<CompletionDates> = habits.iter().map(Habit::completion_dates).collect();
    HabitSummary {
        month: month_key(month),
        completed_today: sets.iter().filter(|dates| dates.contains(today)).count(),
        total_check_ins: sets.iter().map(CompletionDates::len).sum(),
        best_streak: longest_streak(habits, today),
        heatmap: heatmap(habits, month),
    }
}
