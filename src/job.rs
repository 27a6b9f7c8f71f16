//! Job Tracker
//!
//! Mutating operations either complete at once or hand back a job id that is
//! polled with `job_status` until it reaches a terminal state, then released
//! with `job_free`.
//!
//! ```text
//! Active ──poll──▶ Active
//!   │
//!   ├──poll──▶ Complete(result?) ──free──▶ (gone)
//!   └──poll──▶ Errored           ──free──▶ (gone)
//! ```
//!
//! The result type a job produces is fixed by the operation that started it
//! and carried statically by [`Job<T>`].

use crate::codec::{decode_optional, Record};
use crate::connection::Connection;
use crate::domain::{FileSystem, JobStatus, Pool, Snapshot, Volume};
use crate::error::{Error, ErrorCode, Result};
use crate::value::Value;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::marker::PhantomData;
use std::time::Instant;
use tracing::{debug, info, warn};

// =============================================================================
// Job Handles
// =============================================================================

/// Opaque job identifier assigned by the plugin
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a running job whose final result is a `T`.
///
/// Not `Clone`: freeing the job consumes the handle.
pub struct Job<T> {
    id: JobId,
    _result: PhantomData<fn() -> T>,
}

impl<T> Job<T> {
    pub(crate) fn new(id: JobId) -> Self {
        Self {
            id,
            _result: PhantomData,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Give up the typed handle, keeping only the id
    pub fn into_id(self) -> JobId {
        self.id
    }
}

impl<T> fmt::Debug for Job<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Job").field(&self.id).finish()
    }
}

/// Outcome of a potentially asynchronous operation
#[derive(Debug)]
pub enum Completion<T> {
    /// Finished synchronously
    Done(T),
    /// Still running; poll the job
    Job(Job<T>),
}

impl<T> Completion<T> {
    /// `Ok` for immediate completion, `JobStarted` for a running job
    pub fn code(&self) -> ErrorCode {
        match self {
            Completion::Done(_) => ErrorCode::Ok,
            Completion::Job(_) => ErrorCode::JobStarted,
        }
    }

    pub fn is_job(&self) -> bool {
        matches!(self, Completion::Job(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            Completion::Done(value) => Some(value),
            Completion::Job(_) => None,
        }
    }

    pub fn job(self) -> Option<Job<T>> {
        match self {
            Completion::Done(_) => None,
            Completion::Job(job) => Some(job),
        }
    }
}

// =============================================================================
// Job States And Results
// =============================================================================

/// State of a job as reported by one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState<T> {
    /// Still running
    Active { percent: u8 },
    /// Finished; carries the result if the operation produces one
    Complete(Option<T>),
    /// Stopped or failed
    Errored { status: JobStatus },
}

impl<T> JobState<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Active { .. })
    }
}

/// Untyped poll result
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub status: JobStatus,
    /// Percent complete, clamped to 0..=100
    pub percent: u8,
    /// Raw result value; `Null` when there is none
    pub result: Value,
}

/// Record type a job result decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    None,
    Pool,
    Volume,
    FileSystem,
    Snapshot,
}

/// Job result decoded according to a [`JobKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedJobResult {
    None,
    Pool(Pool),
    Volume(Volume),
    FileSystem(FileSystem),
    Snapshot(Snapshot),
}

impl JobKind {
    /// Decode a raw job result; `Null` always decodes to `None`
    pub fn decode(self, value: &Value) -> Result<DecodedJobResult> {
        Ok(match self {
            JobKind::None => DecodedJobResult::None,
            JobKind::Pool => {
                Pool::from_job_result(value)?.map_or(DecodedJobResult::None, DecodedJobResult::Pool)
            }
            JobKind::Volume => Volume::from_job_result(value)?
                .map_or(DecodedJobResult::None, DecodedJobResult::Volume),
            JobKind::FileSystem => FileSystem::from_job_result(value)?
                .map_or(DecodedJobResult::None, DecodedJobResult::FileSystem),
            JobKind::Snapshot => Snapshot::from_job_result(value)?
                .map_or(DecodedJobResult::None, DecodedJobResult::Snapshot),
        })
    }
}

/// Result type a job can produce
pub trait JobOutput: Sized {
    const KIND: JobKind;

    /// Decode a raw job result; `Ok(None)` when there is none
    fn from_job_result(value: &Value) -> Result<Option<Self>>;

    /// Decode a result returned without a job
    fn from_immediate(value: &Value) -> Result<Self>;
}

macro_rules! record_job_output {
    ($($ty:ident => $kind:ident),* $(,)?) => {
        $(
            impl JobOutput for $ty {
                const KIND: JobKind = JobKind::$kind;

                fn from_job_result(value: &Value) -> Result<Option<Self>> {
                    decode_optional(value)
                }

                fn from_immediate(value: &Value) -> Result<Self> {
                    <$ty as Record>::decode(value)
                }
            }
        )*
    };
}

record_job_output! {
    Pool => Pool,
    Volume => Volume,
    FileSystem => FileSystem,
    Snapshot => Snapshot,
}

impl JobOutput for () {
    const KIND: JobKind = JobKind::None;

    fn from_job_result(_value: &Value) -> Result<Option<Self>> {
        Ok(None)
    }

    fn from_immediate(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(()),
            other => Err(Error::Serialization(format!(
                "expected no result, found {}",
                other.kind()
            ))),
        }
    }
}

/// Local bookkeeping for a job handed out by a connection
#[derive(Debug, Clone)]
pub(crate) struct JobEntry {
    pub kind: JobKind,
    pub started: Instant,
}

/// Ids of recently freed jobs, so a second free or a late poll is refused
/// locally. Bounded: the oldest id is forgotten first.
#[derive(Debug, Default)]
pub(crate) struct FreedJobs {
    order: VecDeque<String>,
    ids: HashSet<String>,
}

impl FreedJobs {
    pub const CAPACITY: usize = 256;

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: String) {
        if !self.ids.insert(id.clone()) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > Self::CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}

// =============================================================================
// Polling
// =============================================================================

impl Connection {
    /// Remember a job id returned by a mutating call
    pub(crate) fn register_job<T: JobOutput>(&self, id: JobId) -> Job<T> {
        debug!("Job {} started ({:?})", id, T::KIND);
        self.jobs.insert(
            id.0.clone(),
            JobEntry {
                kind: T::KIND,
                started: Instant::now(),
            },
        );
        Job::new(id)
    }

    /// Interpret the response of a potentially asynchronous call.
    ///
    /// A string is a job id, an object or `Null` is the finished result, and
    /// the legacy pair `[job_id, record]` must have exactly one non-null
    /// member.
    pub(crate) fn completion<T: JobOutput>(
        &self,
        method: &str,
        value: Value,
    ) -> Result<Completion<T>> {
        let malformed = |what: &str| {
            Error::Serialization(format!(
                "{} returned {} instead of a job id or result",
                method, what
            ))
        };
        match value {
            Value::String(id) if id.is_empty() => Err(malformed("an empty job id")),
            Value::String(id) => Ok(Completion::Job(self.register_job(JobId(id)))),
            Value::Null if T::KIND != JobKind::None => Err(malformed("null")),
            Value::Null | Value::Object(_) => Ok(Completion::Done(T::from_immediate(&value)?)),
            Value::Array(items) if items.len() == 2 => match (&items[0], &items[1]) {
                (Value::String(id), Value::Null) if !id.is_empty() => {
                    Ok(Completion::Job(self.register_job(JobId(id.clone()))))
                }
                (Value::Null, result) if !result.is_null() || T::KIND == JobKind::None => {
                    Ok(Completion::Done(T::from_immediate(result)?))
                }
                _ => Err(malformed("an ambiguous pair")),
            },
            other => Err(malformed(&other.kind().to_string())),
        }
    }

    fn check_not_freed(&self, id: &JobId) -> Result<()> {
        if id.0.is_empty() {
            return Err(Error::argument("job id must not be empty"));
        }
        if self.freed_jobs.lock().contains(&id.0) {
            return Err(Error::InvalidJob(format!("job {} was already freed", id)));
        }
        Ok(())
    }

    async fn poll_raw(&self, id: &JobId) -> Result<JobReport> {
        self.check_not_freed(id)?;
        let value = self
            .rpc("job_status", [("job_id", Value::from(id.as_str()))])
            .await?;

        let malformed =
            |reason: String| Error::Serialization(format!("job_status reply: {}", reason));
        let items = value.into_array().map_err(|e| malformed(e.to_string()))?;
        let [status, percent, result]: [Value; 3] = items
            .try_into()
            .map_err(|v: Vec<Value>| malformed(format!("expected 3 elements, found {}", v.len())))?;

        let code = status.as_i32().map_err(|e| malformed(e.to_string()))?;
        let status = JobStatus::from_code(code)
            .ok_or_else(|| malformed(format!("unknown job status {}", code)))?;
        let percent = percent.as_u32().map_err(|e| malformed(e.to_string()))?.min(100) as u8;

        Ok(JobReport {
            status,
            percent,
            result,
        })
    }

    fn state_from_report<T: JobOutput>(report: &JobReport) -> Result<JobState<T>> {
        Ok(match report.status {
            JobStatus::InProgress => JobState::Active {
                percent: report.percent,
            },
            JobStatus::Complete => JobState::Complete(T::from_job_result(&report.result)?),
            status @ (JobStatus::Stopped | JobStatus::Error) => JobState::Errored { status },
        })
    }

    /// Poll a job without decoding its result
    pub async fn job_status(&self, id: &JobId) -> Result<JobReport> {
        self.tracked(self.poll_raw(id)).await
    }

    /// Poll a job and decode its result as `kind`
    pub async fn job_status_decoded(
        &self,
        id: &JobId,
        kind: JobKind,
    ) -> Result<JobState<DecodedJobResult>> {
        self.tracked(async {
            let report = self.poll_raw(id).await?;
            Ok(match report.status {
                JobStatus::InProgress => JobState::Active {
                    percent: report.percent,
                },
                JobStatus::Complete => match kind.decode(&report.result)? {
                    DecodedJobResult::None => JobState::Complete(None),
                    decoded => JobState::Complete(Some(decoded)),
                },
                status => JobState::Errored { status },
            })
        })
        .await
    }

    /// Poll a typed job
    pub async fn poll<T: JobOutput>(&self, job: &Job<T>) -> Result<JobState<T>> {
        self.poll_as(job.id()).await
    }

    async fn poll_as<T: JobOutput>(&self, id: &JobId) -> Result<JobState<T>> {
        self.tracked(async {
            let report = self.poll_raw(id).await?;
            Self::state_from_report(&report)
        })
        .await
    }

    pub async fn job_status_pool(&self, id: &JobId) -> Result<JobState<Pool>> {
        self.poll_as(id).await
    }

    pub async fn job_status_volume(&self, id: &JobId) -> Result<JobState<Volume>> {
        self.poll_as(id).await
    }

    pub async fn job_status_fs(&self, id: &JobId) -> Result<JobState<FileSystem>> {
        self.poll_as(id).await
    }

    pub async fn job_status_snapshot(&self, id: &JobId) -> Result<JobState<Snapshot>> {
        self.poll_as(id).await
    }

    /// Release plugin-side state for a job. Call exactly once per job.
    pub async fn job_free(&self, id: &JobId) -> Result<()> {
        self.tracked(async {
            self.check_not_freed(id)?;
            self.rpc("job_free", [("job_id", Value::from(id.as_str()))])
                .await?;
            self.freed_jobs.lock().insert(id.0.clone());
            match self.jobs.remove(&id.0) {
                Some((_, entry)) => debug!(
                    "Job {} ({:?}) freed after {:?}",
                    id,
                    entry.kind,
                    entry.started.elapsed()
                ),
                None => debug!("Job {} freed", id),
            }
            Ok(())
        })
        .await
    }

    /// Release a typed job handle
    pub async fn free<T>(&self, job: Job<T>) -> Result<()> {
        self.job_free(job.id()).await
    }

    /// Jobs handed out by this connection and not yet freed
    pub fn outstanding_jobs(&self) -> Vec<JobId> {
        self.jobs
            .iter()
            .map(|entry| JobId(entry.key().clone()))
            .collect()
    }

    /// Poll `job` with exponential backoff until it finishes, free it and
    /// return its result.
    ///
    /// A job that ends in `Stopped` or `Error` is freed and reported as
    /// [`Error::JobFailed`]. If the configured deadline passes first the job
    /// is left running and [`Error::Timeout`] is returned.
    pub async fn wait<T: JobOutput>(&self, job: Job<T>) -> Result<Option<T>> {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.job_poll.initial_interval(),
            current_interval: self.job_poll.initial_interval(),
            max_interval: self.job_poll.max_interval(),
            max_elapsed_time: self.job_poll.max_elapsed(),
            ..ExponentialBackoff::default()
        };
        backoff.reset();

        loop {
            match self.poll(&job).await? {
                JobState::Active { percent } => {
                    let Some(delay) = backoff.next_backoff() else {
                        let waited = self.job_poll.max_elapsed_ms.unwrap_or_default();
                        warn!("Gave up waiting for job {} at {}%", job.id(), percent);
                        return Err(Error::Timeout {
                            method: format!("job {}", job.id()),
                            timeout_ms: u32::try_from(waited).unwrap_or(u32::MAX),
                        });
                    };
                    debug!("Job {} at {}%, next poll in {:?}", job.id(), percent, delay);
                    tokio::time::sleep(delay).await;
                }
                JobState::Complete(result) => {
                    info!("Job {} complete", job.id());
                    self.free(job).await?;
                    return Ok(result);
                }
                JobState::Errored { status } => {
                    let job_id = job.id().to_string();
                    warn!("Job {} ended with status {}", job_id, status);
                    self.free(job).await?;
                    return Err(Error::JobFailed {
                        job_id,
                        status: status.to_string(),
                    });
                }
            }
        }
    }

    /// Resolve a completion, waiting on the job if there is one
    pub async fn complete<T: JobOutput>(&self, completion: Completion<T>) -> Result<Option<T>> {
        match completion {
            Completion::Done(value) => Ok(Some(value)),
            Completion::Job(job) => self.wait(job).await,
        }
    }
}
