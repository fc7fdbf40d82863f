use crate::dates::{CompletionDates, date_key, parse_date};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_TASK_TITLE: &str = "Untitled";
pub const DEFAULT_HABIT_NAME: &str = "New Habit";
pub const DEFAULT_HABIT_COLOR: &str = "bg-purple-500";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub completed_dates: Vec<String>,
}

impl Habit {
    pub fn completion_dates(&self) -> CompletionDates {
        CompletionDates::parse(&self.completed_dates)
    }

    /// Marks `date` done, or clears every entry for it if already done.
    pub fn toggle(&mut self, date: NaiveDate) {
        let before = self.completed_dates.len();
        self.completed_dates
            .retain(|raw| parse_date(raw).map_or(true, |parsed| parsed != date));
        if self.completed_dates.len() == before {
            self.completed_dates.push(date_key(date));
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppData {
    pub users: Vec<User>,
    pub tasks: Vec<Task>,
    pub habits: Vec<Habit>,
    pub next_user_id: u64,
    pub next_task_id: u64,
    pub next_habit_id: u64,
}

impl AppData {
    pub fn allocate_user_id(&mut self) -> u64 {
        self.next_user_id += 1;
        self.next_user_id
    }

    pub fn allocate_task_id(&mut self) -> u64 {
        self.next_task_id += 1;
        self.next_task_id
    }

    pub fn allocate_habit_id(&mut self) -> u64 {
        self.next_habit_id += 1;
        self.next_habit_id
    }

    pub fn find_user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username == username)
    }

    pub fn user_by_id(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn tasks_for(&self, user_id: u64) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| task.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn habits_for(&self, user_id: u64) -> Vec<Habit> {
        self.habits
            .iter()
            .filter(|habit| habit.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn task_mut(&mut self, user_id: u64, id: u64) -> Option<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id && task.user_id == user_id)
    }

    pub fn habit_mut(&mut self, user_id: u64, id: u64) -> Option<&mut Habit> {
        self.habits
            .iter_mut()
            .find(|habit| habit.id == id && habit.user_id == user_id)
    }

    /// Returns false when nothing owned by `user_id` had that id.
    pub fn remove_task(&mut self, user_id: u64, id: u64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| !(task.id == id && task.user_id == user_id));
        self.tasks.len() != before
    }

    pub fn remove_habit(&mut self, user_id: u64, id: u64) -> bool {
        let before = self.habits.len();
        self.habits.retain(|habit| !(habit.id == id && habit.user_id == user_id));
        self.habits.len() != before
    }
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<String>,
}

/// Fields present in the body replace the stored ones. `dueDate: null`
/// clears the due date; an absent `dueDate` leaves it alone.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
    pub completed: Option<bool>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, Default)]
pub struct TaskQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateHabitRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub completed_dates: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ToggleRequest {
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitView {
    pub id: u64,
    pub name: String,
    pub color: String,
    pub completed_dates: Vec<String>,
    pub current_streak: u32,
    pub completed_today: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatmapTier {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeatmapDay {
    pub date: String,
    pub count: u32,
    pub tier: HeatmapTier,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_rate: u32,
    pub active_habits: usize,
    pub current_streak: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitSummary {
    pub month: String,
    pub completed_today: usize,
    pub total_check_ins: usize,
    pub best_streak: u32,
    pub heatmap: Vec<HeatmapDay>,
}
