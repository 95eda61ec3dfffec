use thiserror::Error;

use crate::job::JobId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
    /// El estado recibido del ejecutor rompe su propio contrato.
    #[error("estado de job inválido ({job_id}): {reason}")]
    InvalidJobState { job_id: JobId, reason: String },
}

impl ProjectionError {
    pub fn invalid(job_id: &str, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidJobState {
            job_id: job_id.to_string(),
            reason: reason.into(),
        }
    }
}
