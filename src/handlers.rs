use crate::auth::CurrentUser;
use crate::dates::{parse_date, parse_month};
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::{
    CreateHabitRequest, CreateTaskRequest, DEFAULT_HABIT_COLOR, DEFAULT_HABIT_NAME,
    DEFAULT_TASK_TITLE, DashboardStats, Habit, HabitSummary, HabitView, MessageResponse,
    MonthQuery, Task, TaskQuery, ToggleRequest, UpdateHabitRequest, UpdateTaskRequest,
};
use crate::state::AppState;
use crate::stats::{build_dashboard, build_habit_summary_at, current_streak};
use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Query, State},
};
use chrono::{Local, NaiveDate, Utc};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusFilter {
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("all") => Ok(Self::All),
            Some("pending") => Ok(Self::Pending),
            Some("completed") => Ok(Self::Completed),
            Some(other) => Err(AppError::bad_request(format!(
                "status must be 'all', 'pending' or 'completed', got '{other}'"
            ))),
        }
    }

    fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    let filter = StatusFilter::parse(query.status.as_deref())?;
    let data = state.data.lock().await;
    let mut tasks: Vec<Task> = data
        .tasks_for(user.id)
        .into_iter()
        .filter(|task| filter.matches(task))
        .collect();
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<CreateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let due_date = normalize_due_date(payload.due_date)?;
    let title = payload
        .title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_TASK_TITLE.to_string());

    let task = state
        .update(|data| {
            let task = Task {
                id: data.allocate_task_id(),
                user_id: user.id,
                title,
                description: payload.description.unwrap_or_default(),
                priority: payload.priority.unwrap_or_default(),
                due_date,
                completed: false,
                created_at: Utc::now(),
            };
            data.tasks.push(task.clone());
            Ok(task)
        })
        .await?;

    info!(user_id = user.id, task_id = task.id, "created task");
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<u64>,
    ApiJson(payload): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let due_date = payload.due_date.map(normalize_due_date).transpose()?;

    let updated = state
        .update(|data| {
            let task = data
                .task_mut(user.id, id)
                .ok_or_else(|| AppError::not_found("Task not found"))?;
            if let Some(title) = payload.title {
                task.title = title;
            }
            if let Some(description) = payload.description {
                task.description = description;
            }
            if let Some(priority) = payload.priority {
                task.priority = priority;
            }
            if let Some(due_date) = due_date {
                task.due_date = due_date;
            }
            if let Some(completed) = payload.completed {
                task.completed = completed;
            }
            Ok(task.clone())
        })
        .await?;

    Ok(Json(updated))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .update(|data| {
            if data.remove_task(user.id, id) {
                Ok(())
            } else {
                Err(AppError::not_found("Task not found"))
            }
        })
        .await?;

    info!(user_id = user.id, task_id = id, "deleted task");
    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

pub async fn list_habits(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<HabitView>>, AppError> {
    let today = today();
    let data = state.data.lock().await;
    let habits: Vec<HabitView> = data
        .habits_for(user.id)
        .iter()
        .map(|habit| habit_view(habit, today))
        .collect();
    Ok(Json(habits))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<CreateHabitRequest>,
) -> Result<Json<HabitView>, AppError> {
    let name = payload
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_HABIT_NAME.to_string());
    let color = payload
        .color
        .filter(|color| !color.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HABIT_COLOR.to_string());

    let habit = state
        .update(|data| {
            let habit = Habit {
                id: data.allocate_habit_id(),
                user_id: user.id,
                name,
                color,
                completed_dates: Vec::new(),
            };
            data.habits.push(habit.clone());
            Ok(habit)
        })
        .await?;

    info!(user_id = user.id, habit_id = habit.id, "created habit");
    Ok(Json(habit_view(&habit, today())))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<u64>,
    ApiJson(payload): ApiJson<UpdateHabitRequest>,
) -> Result<Json<HabitView>, AppError> {
    if let Some(dates) = &payload.completed_dates {
        for raw in dates {
            parse_date(raw)?;
        }
    }

    let updated = state
        .update(|data| {
            let habit = data
                .habit_mut(user.id, id)
                .ok_or_else(|| AppError::not_found("Habit not found"))?;
            if let Some(name) = payload.name {
                habit.name = name;
            }
            if let Some(color) = payload.color {
                habit.color = color;
            }
            if let Some(dates) = payload.completed_dates {
                habit.completed_dates = dates;
            }
            Ok(habit.clone())
        })
        .await?;

    Ok(Json(habit_view(&updated, today())))
}

/// Toggles `date` from an optional JSON body, or today when the body is
/// empty.
pub async fn toggle_habit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<u64>,
    body: Bytes,
) -> Result<Json<HabitView>, AppError> {
    let today = today();
    let request: ToggleRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ToggleRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };
    let date = match request.date {
        Some(raw) => parse_date(&raw)?,
        None => today,
    };
    if date > today {
        return Err(AppError::bad_request("Cannot complete a habit in the future"));
    }

    let updated = state
        .update(|data| {
            let habit = data
                .habit_mut(user.id, id)
                .ok_or_else(|| AppError::not_found("Habit not found"))?;
            habit.toggle(date);
            Ok(habit.clone())
        })
        .await?;

    Ok(Json(habit_view(&updated, today)))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .update(|data| {
            if data.remove_habit(user.id, id) {
                Ok(())
            } else {
                Err(AppError::not_found("Habit not found"))
            }
        })
        .await?;

    info!(user_id = user.id, habit_id = id, "deleted habit");
    Ok(Json(MessageResponse {
        message: "Habit deleted successfully".to_string(),
    }))
}

pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<DashboardStats>, AppError> {
    let data = state.data.lock().await;
    let tasks = data.tasks_for(user.id);
    let habits = data.habits_for(user.id);
    Ok(Json(build_dashboard(&tasks, &habits)))
}

pub async fn habit_stats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<HabitSummary>, AppError> {
    let today = today();
    let month = match query.month.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_month(raw)?,
        _ => today,
    };
    let data = state.data.lock().await;
    let habits = data.habits_for(user.id);
    Ok(Json(build_habit_summary_at(today, month, &habits)))
}

fn habit_view(habit: &Habit, today: NaiveDate) -> HabitView {
    let dates = habit.completion_dates();
    HabitView {
        id: habit.id,
        name: habit.name.clone(),
        color: habit.color.clone(),
        completed_dates: habit.completed_dates.clone(),
        current_streak: current_streak(&dates, today),
        completed_today: dates.contains(today),
    }
}

/// `None` and empty strings clear the due date; anything else must be
/// `YYYY-MM-DD`.
fn normalize_due_date(raw: Option<String>) -> Result<Option<String>, AppError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            parse_date(value)?;
            Ok(Some(value.to_string()))
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
