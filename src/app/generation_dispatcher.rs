use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;

use tracing::debug;

use crate::domain::{
    GenerationFailure, GenerationRequest, GenerationResult, GenerationTask, LlmError,
    ProviderKind,
};

use super::GenerationGateway;

/// Runs gateway calls on worker threads for callers that must not block.
pub struct GenerationDispatcher {
    gateway: Arc<GenerationGateway>,
    next_job_id: AtomicU64,
}

impl GenerationDispatcher {
    pub fn new(gateway: GenerationGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
            next_job_id: AtomicU64::new(1),
        }
    }

    pub fn submit(
        &self,
        task: GenerationTask,
        request: GenerationRequest,
        provider: ProviderKind,
    ) -> Result<PendingGeneration, LlmError> {
        let job_id = self.next_job_id.fetch_add(1, Ordering::SeqCst);
        let (result_tx, result_rx) = mpsc::channel();
        let gateway = Arc::clone(&self.gateway);

        let handle = thread::Builder::new()
            .name(format!("careerkit-generation-{job_id}"))
            .spawn(move || {
                let result = gateway.generate(task, &request, provider);
                // The receiver may already be gone if the caller dropped the pending job.
                let _ = result_tx.send(result);
            })
            .map_err(|error| {
                LlmError::internal(format!("failed to start generation worker thread: {error}"))
            })?;

        debug!(job_id, task = task.name(), provider = provider.id(), "generation job submitted");

        Ok(PendingGeneration {
            job_id,
            provider,
            result_rx,
            worker_handle: Some(handle),
        })
    }
}

/// Handle to a generation running on a worker thread. The result is delivered
/// exactly once.
pub struct PendingGeneration {
    job_id: u64,
    provider: ProviderKind,
    result_rx: mpsc::Receiver<GenerationResult>,
    worker_handle: Option<thread::JoinHandle<()>>,
}

impl PendingGeneration {
    pub fn job_id(&self) -> u64 {
        self.job_id
    }

    /// Blocks until the worker finishes.
    pub fn wait(mut self) -> GenerationResult {
        let result = self
            .result_rx
            .recv()
            .unwrap_or_else(|_| worker_lost(self.provider));
        self.join_worker();
        result
    }

    /// Returns the result if the worker has finished, without blocking.
    pub fn try_result(&mut self) -> Option<GenerationResult> {
        let result = match self.result_rx.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => {
                if self.worker_handle.is_none() {
                    return None;
                }
                worker_lost(self.provider)
            }
        };
        self.join_worker();
        Some(result)
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_lost(provider: ProviderKind) -> GenerationResult {
    GenerationResult::Failure(GenerationFailure::ProviderError {
        provider,
        source: LlmError::internal("generation worker exited without a result"),
    })
}
