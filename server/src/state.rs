// server/src/state.rs

use chrono::{DateTime, Utc};
use common::{
    ExecutorJob, JobId, JobMetadata, JobResult, JobStatus, ProjectionError, SubmissionParameters,
};
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use thiserror::Error;

use crate::config::{ServerConfig, DEFAULT_RESULT_TTL_SECS};

#[derive(Clone)]
pub struct AppState {
    pub registry: JobRegistry,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            registry: JobRegistry::new(config.result_ttl),
            config: Arc::new(config),
        }
    }
}

/// Lo que sabemos de un job: metadata y, si terminó, su resultado.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub metadata: JobMetadata,
    pub result: Option<JobResult>,
    /// Cuándo llegó a un estado terminal; desde ahí corre el TTL
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("job no encontrado: {0}")]
    NotFound(JobId),

    #[error("job {job_id} está en estado {status}, no admite la operación")]
    Conflict { job_id: JobId, status: JobStatus },

    #[error(transparent)]
    InvalidResult(#[from] ProjectionError),

    #[error("lock del registro envenenado")]
    Poisoned,
}

#[derive(Default)]
struct RegistryInner {
    jobs: HashMap<JobId, JobRecord>,
    // jobs listos para el ejecutor (queued o deferred), en orden FIFO
    pending: VecDeque<JobId>,
}

/// Registro en memoria de jobs. Es la vista local de lo que maneja el
/// ejecutor: guarda lo que se encoló y lo que el ejecutor reporta.
/// Los jobs terminales se borran pasado `result_ttl`.
#[derive(Clone)]
pub struct JobRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    result_ttl: Duration,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_RESULT_TTL_SECS))
    }
}

impl JobRegistry {
    pub fn new(result_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner::default())),
            result_ttl,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryInner>, RegistryError> {
        self.inner.lock().map_err(|_| RegistryError::Poisoned)
    }

    /// Encola un envío ya normalizado y devuelve su metadata.
    pub fn enqueue(&self, submission: SubmissionParameters) -> Result<JobMetadata, RegistryError> {
        let metadata = JobMetadata {
            id: uuid::Uuid::new_v4().to_string(),
            enqueue_time: Utc::now(),
            status: JobStatus::Queued,
            submission,
        };

        let mut inner = self.lock()?;
        inner.pending.push_back(metadata.id.clone());
        inner.jobs.insert(
            metadata.id.clone(),
            JobRecord {
                metadata: metadata.clone(),
                result: None,
                finished_at: None,
            },
        );
        Ok(metadata)
    }

    /// Copia del estado actual del job.
    pub fn snapshot(&self, job_id: &str) -> Result<JobRecord, RegistryError> {
        let inner = self.lock()?;
        inner
            .jobs
            .get(job_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(job_id.to_string()))
    }

    /// Entrega al ejecutor el siguiente job pendiente y lo marca running.
    pub fn claim_next(&self) -> Result<Option<ExecutorJob>, RegistryError> {
        let mut inner = self.lock()?;

        while let Some(job_id) = inner.pending.pop_front() {
            let Some(record) = inner.jobs.get_mut(&job_id) else {
                continue;
            };
            if !matches!(
                record.metadata.status,
                JobStatus::Queued | JobStatus::Deferred
            ) {
                continue;
            }

            record.metadata.status = JobStatus::Running;
            return Ok(Some(ExecutorJob {
                job_id,
                submission: record.metadata.submission.clone(),
            }));
        }

        Ok(None)
    }

    /// Guarda el resultado que reporta el ejecutor.
    pub fn complete(&self, job_id: &str, result: JobResult) -> Result<JobMetadata, RegistryError> {
        let mut inner = self.lock()?;
        let record = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| RegistryError::NotFound(job_id.to_string()))?;

        if record.metadata.status != JobStatus::Running {
            return Err(RegistryError::Conflict {
                job_id: job_id.to_string(),
                status: record.metadata.status,
            });
        }
        result.validate(job_id)?;

        record.metadata.status = if result.success {
            JobStatus::Succeeded
        } else {
            JobStatus::Failed
        };
        record.result = Some(result);
        record.finished_at = Some(Utc::now());
        Ok(record.metadata.clone())
    }

    /// El ejecutor pospone un job que tenía en curso; vuelve al final de la cola.
    pub fn defer(&self, job_id: &str) -> Result<JobMetadata, RegistryError> {
        let mut inner = self.lock()?;
        let record = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| RegistryError::NotFound(job_id.to_string()))?;

        if record.metadata.status != JobStatus::Running {
            return Err(RegistryError::Conflict {
                job_id: job_id.to_string(),
                status: record.metadata.status,
            });
        }
        record.metadata.status = JobStatus::Deferred;
        let metadata = record.metadata.clone();
        inner.pending.push_back(job_id.to_string());
        Ok(metadata)
    }

    /// Cancela un job que todavía no llegó a un estado terminal.
    pub fn cancel(&self, job_id: &str) -> Result<JobMetadata, RegistryError> {
        let mut inner = self.lock()?;
        let record = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| RegistryError::NotFound(job_id.to_string()))?;

        if record.metadata.status.is_terminal() {
            return Err(RegistryError::Conflict {
                job_id: job_id.to_string(),
                status: record.metadata.status,
            });
        }
        record.metadata.status = JobStatus::Cancelled;
        record.finished_at = Some(Utc::now());
        let metadata = record.metadata.clone();
        inner.pending.retain(|id| id != job_id);
        Ok(metadata)
    }

    /// Borra los jobs terminales más viejos que el TTL. Devuelve cuántos.
    pub fn purge_expired(&self) -> Result<usize, RegistryError> {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<usize, RegistryError> {
        let ttl = self.result_ttl;
        let mut inner = self.lock()?;
        let before = inner.jobs.len();

        inner.jobs.retain(|_, record| match record.finished_at {
            // finished_at en el futuro (reloj movido): se conserva
            Some(finished) => !(now - finished).to_std().is_ok_and(|age| age >= ttl),
            None => true,
        });

        Ok(before - inner.jobs.len())
    }

    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.lock()?.jobs.len())
    }
}
