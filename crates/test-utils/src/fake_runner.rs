use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use looplaunch::cadence::{Clock, JobOutput, JobRunner};
use looplaunch::errors::Result;

/// A fake job runner that:
/// - records every command it was asked to run
/// - replies with queued results, then with success once the queue is empty.
#[derive(Debug, Clone, Default)]
pub struct FakeJobRunner {
    executed: Arc<Mutex<Vec<String>>>,
    replies: Arc<Mutex<VecDeque<std::result::Result<JobOutput, String>>>>,
}

impl FakeJobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_exit(self, exit_code: i32) -> Self {
        self.replies.lock().unwrap().push_back(Ok(JobOutput {
            exit_code,
            ..JobOutput::default()
        }));
        self
    }

    pub fn reply_error(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl JobRunner for FakeJobRunner {
    fn run_job(
        &mut self,
        command: &str,
    ) -> Pin<Box<dyn Future<Output = Result<JobOutput>> + Send + '_>> {
        self.executed.lock().unwrap().push(command.to_string());
        let reply = self.replies.lock().unwrap().pop_front();

        Box::pin(async move {
            match reply {
                Some(Ok(output)) => Ok(output),
                Some(Err(message)) => Err(anyhow::anyhow!(message).into()),
                None => Ok(JobOutput::default()),
            }
        })
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
