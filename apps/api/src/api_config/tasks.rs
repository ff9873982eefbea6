use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

use dashgate_core::AppError;
use serde::{Serialize, Serializer};

/// Crontab schedule restricted to minute and hour, running every day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minute: String,
    hour: String,
}

impl CronSchedule {
    /// Creates a schedule; each field is `*` or an integer within range.
    pub fn new(minute: &str, hour: &str) -> Result<Self, AppError> {
        Ok(Self {
            minute: validate_field("minute", minute, 0..=59)?,
            hour: validate_field("hour", hour, 0..=23)?,
        })
    }
}

impl Display for CronSchedule {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} {} * * *", self.minute, self.hour)
    }
}

impl Serialize for CronSchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn validate_field(name: &str, value: &str, range: RangeInclusive<u8>) -> Result<String, AppError> {
    let value = value.trim();
    if value == "*" {
        return Ok(value.to_owned());
    }

    match value.parse::<u8>() {
        Ok(parsed) if range.contains(&parsed) => Ok(parsed.to_string()),
        _ => Err(AppError::Validation(format!(
            "cron {name} must be '*' or within {}..={}, got '{value}'",
            range.start(),
            range.end()
        ))),
    }
}

/// Periodic task registered with the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeatTask {
    pub name: &'static str,
    pub task: &'static str,
    pub schedule: CronSchedule,
}

impl BeatTask {
    /// Creates an entry whose name is also the task it runs.
    #[must_use]
    pub fn new(task: &'static str, schedule: CronSchedule) -> Self {
        Self {
            name: task,
            task,
            schedule,
        }
    }
}

/// Background task queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskQueueSettings {
    pub broker_url: String,
    pub result_backend: String,
    pub verify_certificates: bool,
    pub imports: Vec<&'static str>,
    pub worker_prefetch_multiplier: u32,
    pub task_acks_late: bool,
    pub beat_schedule: Vec<BeatTask>,
}
