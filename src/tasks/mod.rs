//! The productivity-demo session store ("Aura"): tasks, the stress score
//! derived from voice prosody, a bounded stress history, an action log,
//! and the pending-action confirmation flow the assistant drives through
//! `manage_burnout` tool calls.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Notice, NoticeKind};

/// Most-recent stress samples retained for charting.
const HISTORY_CAP: usize = 20;

/// Most-recent action log entries retained, newest first.
const ACTION_LOG_CAP: usize = 50;

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Which day a task is scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Today,
    Tomorrow,
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Postponed,
    Cancelled,
    Delegated,
}

/// A productivity task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub priority: Priority,
    pub day: Day,
    pub status: TaskStatus,
}

impl Task {
    /// A new pending task scheduled for today.
    pub fn new(id: impl Into<String>, title: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            priority,
            day: Day::Today,
            status: TaskStatus::Pending,
        }
    }
}

/// Adjustment kinds `manage_burnout` can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjustment {
    Postpone,
    Cancel,
    Delegate,
    Complete,
}

impl Adjustment {
    /// Fold the loose phrasings the assistant produces into a canonical
    /// adjustment. Unknown phrasings default to postpone, the safest
    /// interpretation.
    pub fn from_phrase(phrase: &str) -> Self {
        match phrase.to_lowercase().as_str() {
            "complete" | "completed" | "finished" | "done" | "finish" => Adjustment::Complete,
            "cancel" | "cancelled" | "drop" | "remove" => Adjustment::Cancel,
            "delegate" | "delegated" => Adjustment::Delegate,
            _ => Adjustment::Postpone,
        }
    }
}

/// A staged task adjustment awaiting user confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub task_id: String,
    pub task_name: String,
    pub adjustment: Adjustment,
    pub at: DateTime<Utc>,
}

/// One audit-trail entry for an applied adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLog {
    pub at: DateTime<Utc>,
    pub trigger_emotion: String,
    pub action: String,
    pub stress_score: u8,
}

/// One retained (timestamp, stress) sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressSample {
    pub at: DateTime<Utc>,
    pub score: u8,
}

/// Result of a `manage_burnout` application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnoutOutcome {
    pub success: bool,
    pub message: String,
}

/// Voice interaction state, session-local.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceState {
    #[default]
    Idle,
    Listening,
    Speaking,
    Processing,
}

/// The productivity session store.
#[derive(Debug, Clone)]
pub struct TaskStore {
    stress_score: u8,
    tasks: Vec<Task>,
    voice_state: VoiceState,
    history: VecDeque<StressSample>,
    action_logs: VecDeque<ActionLog>,
    current_emotion: String,
    pending_action: Option<PendingAction>,
    notice: Option<Notice>,
    active: bool,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Construct an empty store: no tasks, zero stress.
    pub fn new() -> Self {
        Self {
            stress_score: 0,
            tasks: Vec::new(),
            voice_state: VoiceState::Idle,
            history: VecDeque::new(),
            action_logs: VecDeque::new(),
            current_emotion: "neutral".to_string(),
            pending_action: None,
            notice: None,
            active: true,
        }
    }

    /// Construct with the demo seed tasks.
    pub fn with_seed_tasks() -> Self {
        let mut store = Self::new();
        store.tasks = vec![
            Task::new("1", "Chemistry Lab Report", Priority::High),
            Task::new("2", "Calculus Assignment", Priority::Medium),
            Task::new("3", "English Literature Essay", Priority::Low),
        ];
        store
    }

    /// Record a stress score, appending to the bounded session history.
    pub fn set_stress_score(&mut self, score: u8) {
        if !self.active {
            return;
        }
        self.stress_score = score.min(100);
        self.history.push_back(StressSample {
            at: Utc::now(),
            score: self.stress_score,
        });
        while self.history.len() > HISTORY_CAP {
            self.history.pop_front();
        }
    }

    pub fn stress_score(&self) -> u8 {
        self.stress_score
    }

    /// Bounded trailing history of stress samples, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &StressSample> {
        self.history.iter()
    }

    pub fn set_voice_state(&mut self, state: VoiceState) {
        if !self.active {
            return;
        }
        self.voice_state = state;
    }

    pub fn voice_state(&self) -> VoiceState {
        self.voice_state
    }

    /// Record the dominant emotion for the audit trail, e.g.
    /// "frustration (82%)".
    pub fn set_current_emotion(&mut self, emotion: impl Into<String>) {
        if !self.active {
            return;
        }
        self.current_emotion = emotion.into();
    }

    pub fn current_emotion(&self) -> &str {
        &self.current_emotion
    }

    pub fn add_task(&mut self, task: Task) {
        if !self.active {
            return;
        }
        self.tasks.push(task);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Find a task by id.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Apply a burnout adjustment to a task. Unknown ids mutate nothing
    /// and report the available ids so the assistant can recover.
    pub fn manage_burnout(&mut self, task_id: &str, adjustment: Adjustment) -> BurnoutOutcome {
        if !self.active {
            return BurnoutOutcome {
                success: false,
                message: "Session has ended; no changes applied.".to_string(),
            };
        }

        let Some(index) = self.tasks.iter().position(|t| t.id == task_id) else {
            let available: Vec<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
            return BurnoutOutcome {
                success: false,
                message: format!(
                    "Task with ID {} not found. Available IDs: {}",
                    task_id,
                    available.join(", ")
                ),
            };
        };

        let title = self.tasks[index].title.clone();
        let (message, notice_text, notice_kind) = match adjustment {
            Adjustment::Postpone => {
                self.tasks[index].day = Day::Tomorrow;
                self.tasks[index].status = TaskStatus::Postponed;
                (
                    format!("Postponed \"{}\" to tomorrow.", title),
                    format!("\"{}\" moved to tomorrow", title),
                    NoticeKind::Info,
                )
            }
            Adjustment::Cancel => {
                self.tasks[index].status = TaskStatus::Cancelled;
                (
                    format!("Cancelled \"{}\".", title),
                    format!("\"{}\" cancelled", title),
                    NoticeKind::Warning,
                )
            }
            Adjustment::Delegate => {
                self.tasks[index].status = TaskStatus::Delegated;
                (
                    format!("Marked \"{}\" for delegation.", title),
                    format!("\"{}\" delegated", title),
                    NoticeKind::Info,
                )
            }
            Adjustment::Complete => {
                self.tasks[index].status = TaskStatus::Completed;
                (
                    format!("Awesome! I've marked \"{}\" as completed.", title),
                    format!("\"{}\" completed! Great work!", title),
                    NoticeKind::Success,
                )
            }
        };

        self.push_action_log(message.clone());
        self.notice = Some(Notice {
            text: notice_text,
            kind: notice_kind,
        });

        BurnoutOutcome {
            success: true,
            message,
        }
    }

    fn push_action_log(&mut self, action: String) {
        self.action_logs.push_front(ActionLog {
            at: Utc::now(),
            trigger_emotion: self.current_emotion.clone(),
            action,
            stress_score: self.stress_score,
        });
        while self.action_logs.len() > ACTION_LOG_CAP {
            self.action_logs.pop_back();
        }
    }

    /// Audit trail, newest first.
    pub fn action_logs(&self) -> impl Iterator<Item = &ActionLog> {
        self.action_logs.iter()
    }

    /// Stage an adjustment for user confirmation instead of applying it
    /// immediately.
    pub fn set_pending_action(&mut self, task_id: &str, adjustment: Adjustment) {
        if !self.active {
            return;
        }
        let task_name = self
            .task(task_id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| "Unknown Task".to_string());
        self.pending_action = Some(PendingAction {
            task_id: task_id.to_string(),
            task_name,
            adjustment,
            at: Utc::now(),
        });
    }

    pub fn pending_action(&self) -> Option<&PendingAction> {
        self.pending_action.as_ref()
    }

    /// Discard the staged adjustment.
    pub fn clear_pending_action(&mut self) {
        if !self.active {
            return;
        }
        self.pending_action = None;
    }

    /// Apply the staged adjustment, if any, and clear it.
    pub fn execute_pending_action(&mut self) -> Option<BurnoutOutcome> {
        if !self.active {
            return None;
        }
        let pending = self.pending_action.take()?;
        Some(self.manage_burnout(&pending.task_id, pending.adjustment))
    }

    /// Take the most recent notice, clearing the channel.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Zero the stress score and history only; tasks and logs survive.
    pub fn reset_session(&mut self) {
        if !self.active {
            return;
        }
        self.stress_score = 0;
        self.history.clear();
    }

    /// Make the store inert after session teardown.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
