use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use common::{NotebookResponse, NotebookSource, PostNotebookRequest, DEFAULT_KERNEL_NAME};
use reqwest::{Client, Response, StatusCode};
use serde_json::{Map, Value};
use std::{env, fs};

/// - En Docker: SERVER_URL=http://nbexec:8080
/// - Local: default http://localhost:8080
fn server_base_url() -> String {
    env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI para enviar notebooks al servicio de ejecución")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Envía un notebook (.ipynb) para ejecutarlo
    Submit {
        #[arg(value_name = "IPYNB")]
        path: String,

        /// Kernel con el que se ejecuta
        #[arg(long, default_value = DEFAULT_KERNEL_NAME)]
        kernel: String,

        /// Desactiva los reintentos (útil en CI)
        #[arg(long)]
        no_retry: bool,

        /// Envía el notebook ya parseado como objeto en vez de texto
        #[arg(long)]
        parsed: bool,
    },
    /// Consulta el estado de un job
    Status {
        #[arg(value_name = "JOB_ID")]
        id: String,

        /// Incluye el notebook fuente en la respuesta
        #[arg(long)]
        source: bool,
    },
    /// Cancela un job que no terminó
    Cancel {
        #[arg(value_name = "JOB_ID")]
        id: String,
    },
}

/// Arma el cuerpo del POST. Con `parsed` el contenido tiene que ser un objeto JSON.
fn build_request(
    contents: String,
    kernel: String,
    no_retry: bool,
    parsed: bool,
) -> Result<PostNotebookRequest> {
    let ipynb = if parsed {
        let obj: Map<String, Value> =
            serde_json::from_str(&contents).context("el notebook no es un objeto JSON")?;
        NotebookSource::Structured(obj)
    } else {
        NotebookSource::Text(contents)
    };

    Ok(PostNotebookRequest {
        ipynb,
        kernel_name: kernel,
        enable_retry: !no_retry,
    })
}

fn print_job(job: &NotebookResponse) {
    println!("Job:");
    println!("  id: {}", job.job_id);
    println!("  kernel: {}", job.kernel_name);
    println!("  estado: {}", job.status);
    println!("  encolado: {}", job.enqueue_time);
    println!("  url: {}", job.self_url);

    if job.has_result() {
        if let (Some(start), Some(finish)) = (job.start_time, job.finish_time) {
            println!("  iniciado: {}", start);
            println!("  finalizado: {}", finish);
            println!("  duración: {}s", (finish - start).num_seconds());
        }
        println!("  éxito: {}", job.success.unwrap_or_default());
        if let Some(ref ipynb) = job.ipynb {
            println!("  notebook ejecutado: {} bytes", ipynb.len());
        }
    } else {
        println!("  (sin resultado todavía)");
    }
    if let Some(ref source) = job.source {
        println!("  fuente:");
        println!("{}", source);
    }
}

// Respuesta de error del server: {"detail": "..."}
fn error_message(status: StatusCode, body: &Value) -> String {
    match body.get("detail").and_then(Value::as_str) {
        Some(detail) => format!("el server respondió {}: {}", status, detail),
        None => format!("el server respondió {}", status),
    }
}

/// Convierte una respuesta no exitosa en error, para salir con código != 0.
async fn http_error(resp: Response) -> anyhow::Error {
    let status = resp.status();
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    anyhow!(error_message(status, &body))
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = server_base_url();

    match cli.command {
        Commands::Submit {
            path,
            kernel,
            no_retry,
            parsed,
        } => {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("no se pudo leer {path}"))?;
            let req = build_request(contents, kernel, no_retry, parsed)?;

            let url = format!("{}/api/v1/notebooks", base_url);
            let resp = client.post(&url).json(&req).send().await?;

            if resp.status().is_success() {
                let job: NotebookResponse = resp.json().await?;
                println!("Notebook enviado.");
                print_job(&job);
            } else {
                return Err(http_error(resp).await);
            }
        }

        Commands::Status { id, source } => {
            let url = format!("{}/api/v1/notebooks/{}", base_url, id);
            let resp = client
                .get(&url)
                .query(&[("source", source)])
                .send()
                .await?;

            if resp.status().is_success() {
                let job: NotebookResponse = resp.json().await?;
                print_job(&job);
            } else {
                return Err(http_error(resp).await);
            }
        }

        Commands::Cancel { id } => {
            let url = format!("{}/api/v1/notebooks/{}", base_url, id);
            let resp = client.delete(&url).send().await?;

            if resp.status().is_success() {
                let job: NotebookResponse = resp.json().await?;
                println!("Job {} cancelado.", job.job_id);
            } else {
                return Err(http_error(resp).await);
            }
        }
    }

    Ok(())
}
