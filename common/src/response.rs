use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;
use crate::job::{JobId, JobMetadata, JobResult, JobStatus};

/// Información de un job de ejecución de notebook, con el resultado
/// y el notebook fuente cuando corresponde.
///
/// Se arma de nuevo en cada lectura y no se modifica después.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookResponse {
    pub job_id: JobId,
    pub kernel_name: String,
    /// Momento en que el job entró a la cola (UTC)
    pub enqueue_time: DateTime<Utc>,
    pub status: JobStatus,
    /// URL de este recurso
    pub self_url: String,

    /// Notebook fuente (texto JSON). Sólo si el cliente lo pidió.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    // -------- Campos del resultado: los cuatro o ninguno --------
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Notebook ejecutado (texto JSON)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipynb: Option<String>,
}

impl NotebookResponse {
    /// Arma la respuesta a partir del estado del job.
    ///
    /// `result` es `None` mientras el job no terminó. `include_source` lo
    /// controla el cliente y no depende del estado. `self_url` lo calcula
    /// quien llama (no sale del job).
    pub fn from_job(
        job: &JobMetadata,
        result: Option<&JobResult>,
        include_source: bool,
        self_url: &str,
    ) -> Result<Self, ProjectionError> {
        if job.id.is_empty() {
            return Err(ProjectionError::invalid("", "job sin id"));
        }
        if let Some(r) = result {
            r.validate(&job.id)?;
        }

        Ok(Self {
            job_id: job.id.clone(),
            kernel_name: job.submission.kernel_name.clone(),
            enqueue_time: job.enqueue_time,
            status: job.status,
            self_url: self_url.to_string(),
            source: include_source.then(|| job.submission.ipynb.clone()),
            start_time: result.map(|r| r.start_time),
            finish_time: result.map(|r| r.finish_time),
            success: result.map(|r| r.success),
            ipynb: result.map(|r| r.ipynb.clone()),
        })
    }

    pub fn has_result(&self) -> bool {
        self.success.is_some()
    }
}

pub fn project(
    job: &JobMetadata,
    result: Option<&JobResult>,
    include_source: bool,
    self_url: &str,
) -> Result<NotebookResponse, ProjectionError> {
    NotebookResponse::from_job(job, result, include_source, self_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::SubmissionParameters;
    use chrono::TimeZone;
    use serde_json::Value;

    const URL: &str = "http://localhost:8080/api/v1/notebooks/abc123";

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap()
    }

    fn job(status: JobStatus) -> JobMetadata {
        JobMetadata {
            id: "abc123".to_string(),
            enqueue_time: at(0),
            status,
            submission: SubmissionParameters {
                kernel_name: "LSST".to_string(),
                ipynb: "{\"cells\":[]}".to_string(),
                enable_retry: true,
            },
        }
    }

    fn result_ok() -> JobResult {
        JobResult {
            start_time: at(5),
            finish_time: at(10),
            success: true,
            ipynb: "{\"cells\":[{\"outputs\":[]}]}".to_string(),
        }
    }

    #[test]
    fn job_terminado_con_source() {
        let j = job(JobStatus::Succeeded);
        let r = result_ok();
        let resp = project(&j, Some(&r), true, URL).unwrap();

        assert_eq!(resp.job_id, "abc123");
        assert_eq!(resp.kernel_name, "LSST");
        assert_eq!(resp.enqueue_time, at(0));
        assert_eq!(resp.status, JobStatus::Succeeded);
        assert_eq!(resp.self_url, URL);
        assert_eq!(resp.source.as_deref(), Some("{\"cells\":[]}"));
        assert_eq!(resp.success, Some(true));
        assert_eq!(resp.start_time, Some(at(5)));
        assert_eq!(resp.finish_time, Some(at(10)));
        assert!(resp.finish_time > resp.start_time);
        assert_eq!(resp.ipynb, Some(r.ipynb.clone()));
    }

    #[test]
    fn job_en_cola_no_tiene_campos_de_resultado() {
        for include_source in [false, true] {
            let resp = project(&job(JobStatus::Queued), None, include_source, URL).unwrap();
            assert_eq!(resp.status, JobStatus::Queued);
            assert!(resp.start_time.is_none());
            assert!(resp.finish_time.is_none());
            assert!(resp.success.is_none());
            assert!(resp.ipynb.is_none());
            assert_eq!(resp.source.is_some(), include_source);
        }
    }

    #[test]
    fn sin_include_source_nunca_aparece_el_fuente() {
        let resp = project(&job(JobStatus::Succeeded), Some(&result_ok()), false, URL).unwrap();
        assert!(resp.source.is_none());

        let body = serde_json::to_value(&resp).unwrap();
        assert!(body.get("source").is_none());
    }

    #[test]
    fn campos_de_resultado_van_todos_juntos() {
        let fallido = JobResult {
            start_time: at(1),
            finish_time: at(3),
            success: false,
            ipynb: "{\"cells\":[],\"partial\":true}".to_string(),
        };
        let resp = project(&job(JobStatus::Failed), Some(&fallido), false, URL).unwrap();
        let presentes = [
            resp.start_time.is_some(),
            resp.finish_time.is_some(),
            resp.success.is_some(),
            resp.ipynb.is_some(),
        ];
        assert_eq!(presentes, [true; 4]);
        assert_eq!(resp.success, Some(false));
    }

    #[test]
    fn json_omite_campos_ausentes() {
        let resp = project(&job(JobStatus::Running), None, false, URL).unwrap();
        let body = serde_json::to_value(&resp).unwrap();
        let obj = body.as_object().unwrap();

        for k in ["job_id", "kernel_name", "enqueue_time", "status", "self_url"] {
            assert!(obj.contains_key(k), "falta {k}");
        }
        for k in ["source", "start_time", "finish_time", "success", "ipynb"] {
            assert!(!obj.contains_key(k), "sobra {k}");
        }
        assert_eq!(obj["status"], Value::String("running".to_string()));
        assert_eq!(obj["enqueue_time"], Value::String("2024-01-01T00:00:00Z".to_string()));
    }

    #[test]
    fn proyeccion_es_idempotente() {
        let j = job(JobStatus::Succeeded);
        let r = result_ok();
        let a = serde_json::to_vec(&project(&j, Some(&r), true, URL).unwrap()).unwrap();
        let b = serde_json::to_vec(&project(&j, Some(&r), true, URL).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn resultado_inconsistente_da_invalid_job_state() {
        let r = JobResult {
            start_time: at(10),
            finish_time: at(5),
            success: true,
            ipynb: "{}".to_string(),
        };
        let err = project(&job(JobStatus::Succeeded), Some(&r), false, URL).unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidJobState { .. }));
    }

    #[test]
    fn job_sin_id_es_invalido() {
        let mut j = job(JobStatus::Queued);
        j.id.clear();
        assert!(project(&j, None, false, URL).is_err());
    }

    #[test]
    fn todos_los_estados_se_proyectan_sin_resultado() {
        let estados = [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Succeeded,
            JobStatus::Failed,
            JobStatus::Deferred,
            JobStatus::Cancelled,
            JobStatus::NotFound,
        ];
        for status in estados {
            let mut j = job(status);
            j.submission.kernel_name = "python3".to_string();
            let resp = project(&j, None, false, URL).unwrap();

            assert_eq!(resp.kernel_name, "python3");
            assert_eq!(resp.status, status);
            assert!(!resp.has_result());

            let body = serde_json::to_value(&resp).unwrap();
            assert_eq!(body["status"], Value::String(status.to_string()));
        }
    }

    #[test]
    fn estados_terminales_con_resultado_tienen_los_cuatro_campos() {
        for status in [JobStatus::Succeeded, JobStatus::Failed, JobStatus::Cancelled] {
            let resp = project(&job(status), Some(&result_ok()), false, URL).unwrap();
            assert_eq!(resp.status, status);
            assert!(resp.has_result());
            assert!(resp.start_time.is_some() && resp.finish_time.is_some());
            assert!(resp.ipynb.is_some());
        }
    }
}
