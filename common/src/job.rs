use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProjectionError;

pub type JobId = String;

/// Estados que puede reportar la cola del ejecutor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Deferred,
    Cancelled,
    NotFound,
}

impl JobStatus {
    /// Después de estos estados no hay más transiciones.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Deferred => "deferred",
            JobStatus::Cancelled => "cancelled",
            JobStatus::NotFound => "not_found",
        };
        f.write_str(s)
    }
}

/// Parámetros guardados al encolar. No cambian después.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionParameters {
    pub kernel_name: String,
    /// Notebook fuente ya normalizado (texto JSON)
    pub ipynb: String,
    pub enable_retry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub id: JobId,
    pub enqueue_time: DateTime<Utc>,
    pub status: JobStatus,
    pub submission: SubmissionParameters,
}

/// Resultado de un job terminado, tal como lo entrega el ejecutor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub start_time: DateTime<Utc>,
    pub finish_time: DateTime<Utc>,
    pub success: bool,
    /// Notebook ejecutado (texto JSON)
    pub ipynb: String,
}

impl JobResult {
    /// Chequea el orden de tiempos y que un éxito traiga el notebook ejecutado.
    pub fn validate(&self, job_id: &str) -> Result<(), ProjectionError> {
        if self.finish_time < self.start_time {
            return Err(ProjectionError::invalid(
                job_id,
                format!(
                    "finish_time {} es anterior a start_time {}",
                    self.finish_time, self.start_time
                ),
            ));
        }
        if self.success && self.ipynb.is_empty() {
            return Err(ProjectionError::invalid(
                job_id,
                "resultado exitoso sin notebook ejecutado",
            ));
        }
        Ok(())
    }
}
