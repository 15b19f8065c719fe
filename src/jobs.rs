// Waiting for server-side jobs. The job state machine lives on the server;
// the client only re-polls at a fixed interval until the status is terminal
// or the caller's time budget runs out. The wait blocks the calling thread.

use anyhow::{bail, Result};
use std::time::Duration;
use tracing::debug;

use crate::models::Job;

/// Pause between two polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

const TERMINAL_STATUSES: [&str; 5] = ["done", "failed", "error", "finished", "success"];

/// Whether the server is done with a job in this status.
pub fn is_terminal(status: &str) -> bool {
    let status = status.trim();
    TERMINAL_STATUSES
        .iter()
        .any(|terminal| terminal.eq_ignore_ascii_case(status))
}

/// Poll with `fetch` until the job reaches a terminal status. `sleep` is
/// called between polls and never for longer than the budget left. Fails
/// once `budget` is used up.
pub fn wait_for_job<F, S>(mut fetch: F, budget: Duration, interval: Duration, mut sleep: S) -> Result<Job>
where
    F: FnMut() -> Result<Job>,
    S: FnMut(Duration),
{
    let mut waited = Duration::ZERO;
    loop {
        let job = fetch()?;
        debug!(id = job.id, status = %job.status, waited = ?waited, "polled job");
        if is_terminal(&job.status) {
            return Ok(job);
        }
        if waited >= budget {
            bail!(
                "job {} still '{}' after {}s, giving up",
                job.id,
                job.status,
                waited.as_secs()
            );
        }
        let step = interval.min(budget - waited);
        sleep(step);
        waited += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: &str) -> Job {
        Job {
            id: 1,
            status: status.to_string(),
            ..Job::default()
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(is_terminal("done"));
        assert!(is_terminal("Failed"));
        assert!(!is_terminal("queued"));
        assert!(!is_terminal(""));
    }

    #[test]
    fn returns_first_terminal_job() {
        let mut statuses = vec!["queued", "running", "done"].into_iter();
        let mut sleeps = Vec::new();
        let result = wait_for_job(
            || Ok(job(statuses.next().unwrap_or("done"))),
            Duration::from_secs(60),
            POLL_INTERVAL,
            |d| sleeps.push(d),
        )
        .unwrap();
        assert_eq!(result.status, "done");
        assert_eq!(sleeps, vec![POLL_INTERVAL, POLL_INTERVAL]);
    }

    #[test]
    fn gives_up_after_budget() {
        let mut polls = 0;
        let mut slept = Duration::ZERO;
        let err = wait_for_job(
            || {
                polls += 1;
                Ok(job("running"))
            },
            Duration::from_secs(5),
            POLL_INTERVAL,
            |d| slept += d,
        )
        .unwrap_err();
        assert!(err.to_string().contains("giving up"));
        assert_eq!(slept, Duration::from_secs(5));
        // 2s + 2s + 1s of sleep, polled before each and once at the end
        assert_eq!(polls, 4);
    }

    #[test]
    fn zero_budget_polls_once() {
        let mut polls = 0;
        let result = wait_for_job(
            || {
                polls += 1;
                Ok(job("running"))
            },
            Duration::ZERO,
            POLL_INTERVAL,
            |_| panic!("must not sleep"),
        );
        assert!(result.is_err());
        assert_eq!(polls, 1);
    }

    #[test]
    fn fetch_errors_propagate() {
        let result = wait_for_job(
            || bail!("connection refused"),
            Duration::from_secs(10),
            POLL_INTERVAL,
            |_| {},
        );
        assert_eq!(result.unwrap_err().to_string(), "connection refused");
    }
}
