use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use jsonschema::JSONSchema;
use log::{info, warn};
use rusqlite::Connection;
use url::Url;

use readlib_client::config::ClientConfig;
use readlib_client::convert::client::{ReadLibraryToFileClient, CONVERT_OPERATION, MODULE_NAME};
use readlib_client::convert::output::ConvertReadLibraryOutput;
use readlib_client::convert::params::ConvertReadLibraryParams;
use readlib_client::convert::report;
use readlib_client::db::job::{load, record, update};
use readlib_client::db::open::open_db;
use readlib_client::error::{JobError, JobResult};
use readlib_client::job::cancel::Cancellation;
use readlib_client::job::state::JobId;
use readlib_client::namespace::PlatformNamespace;
use readlib_client::request::message::Message;
use readlib_client::request::read::get_message_paths;
use readlib_client::request::schema::{load_schema, load_schema_from};
use readlib_client::WorkingDirectory;

#[derive(Parser, Debug)]
#[command(name = "readlib-client")]
#[command(about = "Convert sequencing read libraries to FASTQ files with the kb_read_library_to_file service", long_about = None)]
struct Args {
    /// Service URL, overrides --namespace
    #[arg(long, env = "READLIB_SERVICE_URL")]
    url: Option<Url>,

    /// Deployment used when no URL is given
    #[arg(long, value_enum, default_value_t = PlatformNamespace::Prod)]
    namespace: PlatformNamespace,

    /// Authorization token
    #[arg(long, env = "KB_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Read timeout per call in milliseconds, 0 for none
    #[arg(long, default_value_t = 0)]
    read_timeout_ms: u64,

    /// Allow sending the token over plain http
    #[arg(long)]
    insecure_http: bool,

    /// Trust all TLS certificates, self-signed ones included
    #[arg(long)]
    trust_all_certs: bool,

    /// Stream request bodies in chunks
    #[arg(long)]
    streaming: bool,

    /// Milliseconds between job status checks
    #[arg(long, env = "READLIB_CHECK_INTERVAL_MS", default_value_t = 5000)]
    check_interval_ms: u64,

    /// Service version tag sent with submissions
    #[arg(long, env = "READLIB_SERVICE_VER", default_value = "release")]
    service_ver: String,

    /// Submit without a service version tag
    #[arg(long, conflicts_with = "service_ver")]
    no_service_ver: bool,

    /// Directory holding the job ledger
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit conversion requests and wait until all of them finish
    Convert {
        /// Request files, or directories of request files
        #[arg(required = true)]
        params: Vec<PathBuf>,
        #[command(flatten)]
        validation: ValidationArgs,
        /// Print results as JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Submit conversion requests and print their job ids without waiting
    Submit {
        #[arg(required = true)]
        params: Vec<PathBuf>,
        #[command(flatten)]
        validation: ValidationArgs,
    },

    /// Wait for a previously submitted job
    Wait {
        job_id: String,
        #[arg(long)]
        json: bool,
    },

    /// Show the remote service status
    Status,

    /// Check request files against the parameter schema without submitting
    Validate {
        #[arg(required = true)]
        params: Vec<PathBuf>,
        /// JSON schema to validate against instead of the bundled one
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// List jobs recorded in the ledger
    Jobs {
        /// Only jobs nobody has seen finish
        #[arg(long)]
        pending: bool,
    },
}

#[derive(clap::Args, Debug)]
struct ValidationArgs {
    /// Skip schema validation of request files
    #[arg(long)]
    no_validate: bool,
    /// JSON schema to validate against instead of the bundled one
    #[arg(long, conflicts_with = "no_validate")]
    schema: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("starting readlib-client");
    let args = Args::parse();
    let wd = WorkingDirectory { path: args.work_dir.clone() };

    match &args.command {
        Commands::Convert { params, validation, json } => {
            let requests = read_requests(params, validation)?;
            let client = connect(&args)?;
            let conn = open_db(&wd).context("Open job ledger")?;
            convert(&client, &conn, requests, *json).await
        }
        Commands::Submit { params, validation } => {
            let requests = read_requests(params, validation)?;
            let client = connect(&args)?;
            let conn = open_db(&wd).context("Open job ledger")?;
            for (path, job_id) in submit_all(&client, &conn, &requests).await? {
                println!("{job_id}\t{}", path.display());
            }
            Ok(())
        }
        Commands::Wait { job_id, json } => {
            let client = connect(&args)?;
            let conn = open_db(&wd).context("Open job ledger")?;
            let job_id = JobId::new(job_id.as_str());
            record::ensure_recorded(&conn, &job_id, &submit_method())?;
            let outcome = client.wait(&job_id, &mut ctrl_c_cancellation()).await;
            finish(&conn, &job_id, outcome, *json)
        }
        Commands::Status => {
            let client = connect(&args)?;
            let status = client.status().await?;
            println!("{} {} ({})", status.state, status.version, status.git_commit_hash);
            if !status.message.is_empty() {
                println!("{}", status.message);
            }
            Ok(())
        }
        Commands::Validate { params, schema } => validate(params, schema.as_ref()),
        Commands::Jobs { pending } => {
            let conn = open_db(&wd).context("Open job ledger")?;
            for job in load::get_jobs(&conn, *pending)? {
                println!("{}\t{}\t{}\t{}", job.job_id, job.state.to_string(), job.submitted_at, job.method);
            }
            Ok(())
        }
    }
}

fn client_config(args: &Args) -> Result<ClientConfig> {
    let url = match &args.url {
        Some(url) => url.clone(),
        None => Url::parse(args.namespace.service_url())?,
    };
    info!("Using service at {url} (namespace {})", args.namespace);

    let mut builder = ClientConfig::builder(url)
        .read_timeout(Duration::from_millis(args.read_timeout_ms))
        .insecure_http_allowed(args.insecure_http)
        .trust_all_certificates(args.trust_all_certs)
        .streaming_mode(args.streaming)
        .async_job_check_time(Duration::from_millis(args.check_interval_ms))
        .async_version(match args.no_service_ver {
            true => None,
            false => Some(args.service_ver.clone()),
        });
    if let Some(token) = &args.token {
        builder = builder.token(token.as_str());
    }
    Ok(builder.build()?)
}

fn connect(args: &Args) -> Result<ReadLibraryToFileClient> {
    let config = client_config(args)?;
    Ok(ReadLibraryToFileClient::connect(&config)?)
}

fn submit_method() -> String {
    format!("{MODULE_NAME}._{CONVERT_OPERATION}_submit")
}

/// Cancellation fired by the first Ctrl-C
fn ctrl_c_cancellation() -> Cancellation {
    let (handle, cancel) = Cancellation::pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, no longer waiting");
            handle.cancel();
        }
    });
    cancel
}

fn expand_paths(params: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for path in params {
        if path.is_dir() {
            let found = get_message_paths(path).with_context(|| format!("Can't list {}", path.display()))?;
            info!("Found {} request files in {}", found.len(), path.display());
            paths.extend(found);
        } else {
            paths.push(path.clone());
        }
    }
    Ok(paths)
}

fn schema_for(path: Option<&PathBuf>) -> Result<JSONSchema> {
    match path {
        Some(path) => load_schema_from(path),
        None => load_schema(),
    }
}

fn read_requests(params: &[PathBuf], validation: &ValidationArgs) -> Result<Vec<(PathBuf, ConvertReadLibraryParams)>> {
    let schema = match validation.no_validate {
        true => None,
        false => Some(schema_for(validation.schema.as_ref())?),
    };

    let mut requests = Vec::new();
    for path in expand_paths(params)? {
        let message = Message { path: path.clone(), compiled_schema: schema.as_ref() };
        let request = message.read().with_context(|| format!("Request {}", path.display()))?;
        requests.push((path, request));
    }
    if requests.is_empty() {
        bail!("No request files found");
    }
    Ok(requests)
}

async fn submit_all(
    client: &ReadLibraryToFileClient,
    conn: &Connection,
    requests: &[(PathBuf, ConvertReadLibraryParams)],
) -> Result<Vec<(PathBuf, JobId)>> {
    let mut submitted = Vec::new();
    for (path, request) in requests {
        let job_id = client.submit(request).await.with_context(|| format!("Submit {}", path.display()))?;
        record::record_submission(conn, &job_id, &submit_method(), &serde_json::to_value(request)?)?;
        submitted.push((path.clone(), job_id));
    }
    Ok(submitted)
}

async fn convert(
    client: &ReadLibraryToFileClient,
    conn: &Connection,
    requests: Vec<(PathBuf, ConvertReadLibraryParams)>,
    json: bool,
) -> Result<()> {
    let submitted = submit_all(client, conn, &requests).await?;
    let cancel = ctrl_c_cancellation();

    // one independent poll loop per job
    let waits = submitted.iter().map(|(_, job_id)| {
        let mut cancel = cancel.clone();
        async move { client.wait(job_id, &mut cancel).await }
    });
    let outcomes = join_all(waits).await;

    let mut failures = 0;
    for ((path, job_id), outcome) in submitted.iter().zip(outcomes) {
        info!("Request {} ran as job {job_id}", path.display());
        if let Err(err) = finish(conn, job_id, outcome, json) {
            warn!("{err:#}");
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{failures} of {} conversions did not complete", submitted.len());
    }
    Ok(())
}

/// Store the outcome in the ledger and print it
fn finish(conn: &Connection, job_id: &JobId, outcome: JobResult<ConvertReadLibraryOutput>, json: bool) -> Result<()> {
    match outcome {
        Ok(output) => {
            update::mark_finished(conn, job_id, &serde_json::to_value(&output)?)?;
            match json {
                true => println!("{}", serde_json::to_string_pretty(&output)?),
                false => print!("{}", report::render(&output)?),
            }
            Ok(())
        }
        Err(JobError::Cancelled(_)) => {
            bail!("Job {job_id} is still running remotely; resume with `readlib-client wait {job_id}`")
        }
        Err(err @ JobError::RemoteJob(_)) => {
            update::mark_failed(conn, job_id, &err.to_string())?;
            Err(err).with_context(|| format!("Job {job_id}"))
        }
        Err(err) => Err(err).with_context(|| format!("Waiting for job {job_id}")),
    }
}

fn validate(params: &[PathBuf], schema: Option<&PathBuf>) -> Result<()> {
    let schema = schema_for(schema)?;
    let mut invalid = 0;
    for path in expand_paths(params)? {
        let message = Message { path: path.clone(), compiled_schema: Some(&schema) };
        match message.read() {
            Ok(_) => println!("ok\t{}", path.display()),
            Err(err) => {
                println!("invalid\t{}\t{err}", path.display());
                invalid += 1;
            }
        }
    }
    if invalid > 0 {
        bail!("{invalid} request files are invalid");
    }
    Ok(())
}
