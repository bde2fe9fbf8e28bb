//! Rendition generation for one source image.
//!
//! The source is decoded once into a [`Session`], then every [`Job`] derives
//! its rendition from that same untouched image, in command-line order.
//!
//! ## Failure scope
//!
//! | Failure | Scope |
//! |---|---|
//! | Source cannot be loaded | whole run ([`ProcessError`]) |
//! | Spec does not decode | that job only |
//! | Crop / resize / write fails | that job only |
//!
//! Job failures are reported as [`ProcessEvent::Failed`] and the run carries
//! on with the next job.

use crate::imaging::{
    BackendError, Dimensions, EncodeSettings, ImageBackend, Rendition, RenditionError,
    generate_rendition,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error(transparent)]
    Plan(#[from] crate::plan::PlanError),
}

/// One `-f <spec> -o <path>` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub spec: String,
    pub output: PathBuf,
}

/// Pair each `-o` with the most recent `-f` before it on the command line.
///
/// Both inputs carry the argument index each value was found at. An output
/// with no earlier spec gets the empty spec, which fails to decode when the
/// job runs.
pub fn jobs_from_flags(specs: &[(usize, String)], outputs: &[(usize, PathBuf)]) -> Vec<Job> {
    let mut jobs = Vec::with_capacity(outputs.len());
    let mut pending = specs.iter().peekable();
    let mut current = String::new();

    for (output_index, output) in outputs {
        while let Some((_, spec)) = pending.next_if(|(i, _)| i < output_index) {
            current.clone_from(spec);
        }
        jobs.push(Job {
            spec: current.clone(),
            output: output.clone(),
        });
    }
    jobs
}

/// Progress notifications emitted while a run proceeds.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    Loaded {
        source: PathBuf,
        dimensions: Dimensions,
    },
    Written(Rendition),
    Failed {
        source: PathBuf,
        job: Job,
        reason: String,
        /// The failure happened while writing progressive output.
        progressive: bool,
    },
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub written: Vec<Rendition>,
    pub failed: usize,
}

/// The loaded source image plus the encode settings renditions start from.
///
/// Acquired once per run. The `image` crate has no global state to set up or
/// tear down, so the session only owns the decoded source and the template,
/// both freed when it goes out of scope.
pub struct Session<'b, B: ImageBackend> {
    backend: &'b B,
    source_path: PathBuf,
    source: B::Image,
    template: EncodeSettings,
}

impl<'b, B: ImageBackend> Session<'b, B> {
    pub fn open(backend: &'b B, source_path: &Path) -> Result<Self, ProcessError> {
        let started = Instant::now();
        let source = backend.load(source_path).map_err(|e| ProcessError::Load {
            path: source_path.to_path_buf(),
            source: e,
        })?;
        debug!(
            source = %source_path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "decoded source"
        );
        Ok(Self {
            backend,
            source_path: source_path.to_path_buf(),
            source,
            template: EncodeSettings::default(),
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn dimensions(&self) -> Dimensions {
        self.backend.dimensions(&self.source)
    }

    pub fn render(&self, job: &Job) -> Result<Rendition, RenditionError> {
        generate_rendition(
            self.backend,
            &self.source,
            &self.template,
            &job.spec,
            &job.output,
        )
    }
}

/// Load `source` once and run every job against it.
pub fn run<B: ImageBackend>(
    backend: &B,
    source: &Path,
    jobs: &[Job],
    mut on_event: impl FnMut(&ProcessEvent),
) -> Result<RunSummary, ProcessError> {
    let session = Session::open(backend, source)?;
    on_event(&ProcessEvent::Loaded {
        source: source.to_path_buf(),
        dimensions: session.dimensions(),
    });

    let mut summary = RunSummary::default();
    for job in jobs {
        let started = Instant::now();
        match session.render(job) {
            Ok(rendition) => {
                info!(
                    spec = %job.spec,
                    output = %rendition.output.display(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "rendition written"
                );
                on_event(&ProcessEvent::Written(rendition.clone()));
                summary.written.push(rendition);
            }
            Err(e) => {
                summary.failed += 1;
                on_event(&ProcessEvent::Failed {
                    source: session.source_path().to_path_buf(),
                    job: job.clone(),
                    reason: e.to_string(),
                    progressive: e.failed_progressive_write(),
                });
            }
        }
    }
    Ok(summary)
}
