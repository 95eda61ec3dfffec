pub mod error;
pub mod job;
pub mod request;
pub mod response;

pub use error::ProjectionError;
pub use job::{JobId, JobMetadata, JobResult, JobStatus, SubmissionParameters};
pub use request::{
    normalize, NormalizedSubmission, NotebookSource, PostNotebookRequest, DEFAULT_KERNEL_NAME,
};
pub use response::{project, NotebookResponse};

/* --------- Mensajes entre el server y el ejecutor externo --------- */

use serde::{Deserialize, Serialize};

/// Job entregado al ejecutor: id + parámetros tal como se enviaron.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorJob {
    pub job_id: JobId,
    pub submission: SubmissionParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorNextResponse {
    pub job: Option<ExecutorJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorAck {
    pub ok: bool,
}
