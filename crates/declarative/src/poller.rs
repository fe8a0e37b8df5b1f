//! Readiness poller
//!
//! Blocks until a freshly created or updated resource reaches a terminal
//! status. The wait is a `select!` over three channels: a fixed-interval
//! ticker, a one-shot deadline and the cancel token, so cancellation and
//! timeout are observed without waiting for the next read.

use std::time::{Duration, Instant};

use crossbeam_channel::{after, select, tick};

use crate::context::ReconcileContext;
use crate::error::{Error, Result};
use crate::types::{RemoteResourceState, Status};

/// Polling cadence and bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between reads
    pub interval: Duration,
    /// Total time allowed before giving up
    pub timeout: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// What a single poll read saw
#[derive(Debug)]
pub enum Observation<'a> {
    /// The resource was read
    Status {
        status: Status,
        raw: Option<&'a str>,
    },
    /// The resource was not found
    Absent,
    /// The read failed
    Error(&'a Error),
}

#[derive(Debug)]
enum PollState {
    Pending {
        attempts: u32,
        last_error: Option<String>,
    },
    Done(Outcome),
}

#[derive(Debug)]
enum Outcome {
    Ready(RemoteResourceState),
    Failed(String),
    TimedOut(Option<String>),
    Cancelled,
}

/// Poll `read` until the resource is ready, failed, timed out or cancelled.
///
/// The first read happens after one interval. Read errors and absent
/// results are not terminal; the last one is reported if the deadline
/// passes.
pub fn wait_until_ready<F>(
    ctx: &ReconcileContext<'_>,
    id: &str,
    mut read: F,
) -> Result<RemoteResourceState>
where
    F: FnMut() -> Result<Option<RemoteResourceState>>,
{
    let config = ctx.poll;
    let started = Instant::now();
    let ticker = tick(config.interval);
    let deadline = after(config.timeout);
    let cancel = ctx.cancel.receiver();

    log::debug!(
        "Waiting for {id} (interval {}s, timeout {}s)",
        config.interval.as_secs(),
        config.timeout.as_secs()
    );

    let mut state = PollState::Pending {
        attempts: 0,
        last_error: None,
    };

    let outcome = loop {
        state = match state {
            PollState::Pending { .. } if ctx.cancel.is_cancelled() => {
                PollState::Done(Outcome::Cancelled)
            }
            PollState::Pending { last_error, .. } if started.elapsed() >= config.timeout => {
                PollState::Done(Outcome::TimedOut(last_error))
            }
            PollState::Pending {
                attempts,
                last_error,
            } => select! {
                recv(cancel) -> _ => PollState::Done(Outcome::Cancelled),
                recv(deadline) -> _ => PollState::Done(Outcome::TimedOut(last_error)),
                recv(ticker) -> _ => observe(ctx, id, attempts + 1, last_error, &mut read),
            },
            PollState::Done(outcome) => break outcome,
        };
    };

    match outcome {
        Outcome::Ready(resource) => {
            log::info!("{id} is ready after {}s", started.elapsed().as_secs());
            Ok(resource)
        }
        Outcome::Failed(status) => Err(Error::PollFailed {
            id: id.to_string(),
            status,
        }),
        Outcome::TimedOut(last_error) => Err(Error::PollTimeout {
            id: id.to_string(),
            elapsed: started.elapsed(),
            last_error,
        }),
        Outcome::Cancelled => {
            log::warn!("Stopped waiting for {id}: cancelled");
            Err(Error::Cancelled { id: id.to_string() })
        }
    }
}

fn observe<F>(
    ctx: &ReconcileContext<'_>,
    id: &str,
    attempts: u32,
    last_error: Option<String>,
    read: &mut F,
) -> PollState
where
    F: FnMut() -> Result<Option<RemoteResourceState>>,
{
    let notify = |observation: &Observation<'_>| {
        if let Some(observer) = ctx.observer {
            observer.on_poll(id, attempts, observation);
        }
    };

    match read() {
        Ok(Some(resource)) => {
            notify(&Observation::Status {
                status: resource.status,
                raw: resource.raw_status.as_deref(),
            });
            log::debug!(
                "Poll {attempts} for {id}: {}",
                resource.raw_status.as_deref().unwrap_or("no status")
            );
            match resource.status {
                Status::Ready => PollState::Done(Outcome::Ready(resource)),
                Status::Failed => PollState::Done(Outcome::Failed(
                    resource
                        .raw_status
                        .unwrap_or_else(|| resource.status.to_string()),
                )),
                _ => PollState::Pending {
                    attempts,
                    last_error,
                },
            }
        }
        Ok(None) => {
            notify(&Observation::Absent);
            log::warn!("Poll {attempts} for {id}: resource not found");
            PollState::Pending {
                attempts,
                last_error: Some(format!("{id} not found")),
            }
        }
        Err(e) => {
            notify(&Observation::Error(&e));
            log::warn!("Poll {attempts} for {id} failed: {e}");
            PollState::Pending {
                attempts,
                last_error: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockClient;
    use crate::context::{CancelToken, PollObserver};
    use crate::error::RemoteError;
    use crate::types::ResourceSpec;
    use std::cell::Cell;
    use std::sync::Mutex;
    use std::thread;

    fn resource(status: Status, raw: &str) -> RemoteResourceState {
        let mut state = RemoteResourceState::new("abc123", status, ResourceSpec::new());
        state.raw_status = Some(raw.to_string());
        state
    }

    fn fast(timeout: Duration) -> PollConfig {
        PollConfig::new(Duration::from_millis(5), timeout)
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl PollObserver for Recorder {
        fn on_poll(&self, _id: &str, attempt: u32, observation: &Observation<'_>) {
            let entry = match observation {
                Observation::Status { raw, .. } => format!("{attempt}:{}", raw.unwrap_or("-")),
                Observation::Absent => format!("{attempt}:absent"),
                Observation::Error(_) => format!("{attempt}:error"),
            };
            self.0.lock().unwrap().push(entry);
        }
    }

    #[test]
    fn test_ready_after_three_reads() {
        let client = MockClient::new();
        let ctx = ReconcileContext::new(&client).with_poll(fast(Duration::from_secs(5)));
        let reads = Cell::new(0);

        let state = wait_until_ready(&ctx, "abc123", || {
            reads.set(reads.get() + 1);
            Ok(Some(match reads.get() {
                1 | 2 => resource(Status::Pending, "PENDING"),
                _ => resource(Status::Ready, "READY"),
            }))
        })
        .unwrap();

        assert_eq!(state.status, Status::Ready);
        assert_eq!(reads.get(), 3);
    }

    #[test]
    fn test_never_ready_times_out_near_bound() {
        let client = MockClient::new();
        let bound = Duration::from_millis(60);
        let ctx = ReconcileContext::new(&client).with_poll(fast(bound));

        let started = Instant::now();
        let err = wait_until_ready(&ctx, "abc123", || {
            Ok(Some(resource(Status::Pending, "INSTALLING")))
        })
        .unwrap_err();

        let elapsed = started.elapsed();
        assert!(matches!(err, Error::PollTimeout { ref id, .. } if id == "abc123"));
        assert!(elapsed >= bound);
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    }

    #[test]
    fn test_failure_status_is_terminal() {
        let client = MockClient::new();
        let ctx = ReconcileContext::new(&client).with_poll(fast(Duration::from_secs(5)));

        let err = wait_until_ready(&ctx, "abc123", || Ok(Some(resource(Status::Failed, "ERROR"))))
            .unwrap_err();

        match err {
            Error::PollFailed { id, status } => {
                assert_eq!(id, "abc123");
                assert_eq!(status, "ERROR");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_errors_are_not_terminal() {
        let client = MockClient::new();
        let recorder = Recorder::default();
        let ctx = ReconcileContext::new(&client)
            .with_poll(fast(Duration::from_secs(5)))
            .with_observer(&recorder);
        let reads = Cell::new(0);

        let state = wait_until_ready(&ctx, "abc123", || {
            reads.set(reads.get() + 1);
            match reads.get() {
                1 => Err(Error::remote(
                    "GET",
                    "/c/abc123",
                    RemoteError::Transport("connection reset".into()),
                )),
                2 => Ok(None),
                _ => Ok(Some(resource(Status::Ready, "READY"))),
            }
        })
        .unwrap();

        assert_eq!(state.id, "abc123");
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["1:error", "2:absent", "3:READY"]
        );
    }

    #[test]
    fn test_timeout_reports_last_error() {
        let client = MockClient::new();
        let ctx = ReconcileContext::new(&client).with_poll(fast(Duration::from_millis(40)));

        let err = wait_until_ready(&ctx, "abc123", || {
            Err(Error::remote(
                "GET",
                "/c/abc123",
                RemoteError::Status {
                    code: 502,
                    message: "bad gateway".into(),
                },
            ))
        })
        .unwrap_err();

        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn test_cancel_exits_promptly() {
        let client = MockClient::new();
        let cancel = CancelToken::new();
        let ctx = ReconcileContext::new(&client)
            .with_poll(PollConfig::new(Duration::from_secs(10), Duration::from_secs(60)))
            .with_cancel(cancel.clone());

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            cancel.cancel();
        });

        let started = Instant::now();
        let reads = Cell::new(0);
        let err = wait_until_ready(&ctx, "abc123", || {
            reads.set(reads.get() + 1);
            Ok(Some(resource(Status::Pending, "PENDING")))
        })
        .unwrap_err();
        canceller.join().unwrap();

        assert!(matches!(err, Error::Cancelled { .. }));
        assert_eq!(err.remote_id(), Some("abc123"));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(reads.get(), 0);
    }

    #[test]
    fn test_already_cancelled_makes_no_reads() {
        let client = MockClient::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let ctx = ReconcileContext::new(&client)
            .with_poll(fast(Duration::from_secs(5)))
            .with_cancel(cancel);

        let err = wait_until_ready(&ctx, "abc123", || -> Result<Option<RemoteResourceState>> {
            panic!("read after cancellation")
        })
        .unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
    }

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.timeout, Duration::from_secs(1800));
    }
}
