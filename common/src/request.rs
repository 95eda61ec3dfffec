use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::job::SubmissionParameters;

/// Kernel por defecto: entorno Python completo de Rubin (rubin-env),
/// incluye los LSST Science Pipelines.
pub const DEFAULT_KERNEL_NAME: &str = "LSST";

/// Contenido de un notebook tal como llega del cliente.
/// Puede venir como texto JSON o ya parseado como objeto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotebookSource {
    Text(String),
    Structured(Map<String, Value>),
}

impl NotebookSource {
    /// Forma canónica: el texto tal cual, o el objeto serializado.
    /// El texto no se valida; si no es JSON fallará en el ejecutor.
    pub fn as_json_str(&self) -> String {
        match self {
            NotebookSource::Text(s) => s.clone(),
            // Map sin preserve_order => claves ordenadas, salida determinista
            NotebookSource::Structured(obj) => Value::Object(obj.clone()).to_string(),
        }
    }

    pub fn into_json_string(self) -> String {
        match self {
            NotebookSource::Text(s) => s,
            NotebookSource::Structured(obj) => Value::Object(obj).to_string(),
        }
    }
}

fn default_kernel_name() -> String {
    DEFAULT_KERNEL_NAME.to_string()
}

fn default_enable_retry() -> bool {
    true
}

/// Cuerpo de `POST /api/v1/notebooks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostNotebookRequest {
    pub ipynb: NotebookSource,

    #[serde(default = "default_kernel_name")]
    pub kernel_name: String,

    /// Si es true el ejecutor reintenta fallos transitorios.
    /// Para CI conviene apagarlo y recibir el fallo antes.
    #[serde(default = "default_enable_retry")]
    pub enable_retry: bool,
}

impl PostNotebookRequest {
    pub fn normalize(self) -> NormalizedSubmission {
        normalize(self.ipynb, self.kernel_name, self.enable_retry)
    }
}

/// Envío ya reducido a una sola forma de texto.
pub type NormalizedSubmission = SubmissionParameters;

pub fn normalize(
    ipynb: NotebookSource,
    kernel_name: impl Into<String>,
    enable_retry: bool,
) -> NormalizedSubmission {
    SubmissionParameters {
        kernel_name: kernel_name.into(),
        ipynb: ipynb.into_json_string(),
        enable_retry,
    }
}
