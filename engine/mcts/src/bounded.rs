//! Deadline-bounded evaluator calls.
//!
//! The wrapped evaluator runs on its own worker thread. The search sends a
//! request and waits at most the configured timeout for the answer; a late
//! answer is dropped. The request queue holds one entry, so while the worker
//! is stuck on an abandoned call new requests fail immediately instead of
//! piling up.

use crate::evaluator::{Evaluator, EvaluatorError, Inference};
use engine_core::{Move, Position};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

struct Request {
    position: Position,
    agent: usize,
    moves: Vec<Move>,
    reply: SyncSender<Result<Inference, EvaluatorError>>,
}

/// An [`Evaluator`] behind a worker thread and a timeout.
pub struct BoundedEvaluator {
    requests: SyncSender<Request>,
    timeout: Duration,
}

impl BoundedEvaluator {
    /// Spawn the worker. The thread exits once this handle is dropped and
    /// any in-flight call returns.
    pub fn spawn(evaluator: Arc<dyn Evaluator>, timeout: Duration) -> Result<Self, EvaluatorError> {
        let (requests, inbox) = mpsc::sync_channel::<Request>(1);
        thread::Builder::new()
            .name("tessera-evaluator".into())
            .spawn(move || {
                for request in inbox {
                    let result = evaluator.infer(&request.position, request.agent, &request.moves);
                    // The caller may have given up already.
                    let _ = request.reply.send(result);
                }
                debug!("Evaluator worker exiting");
            })
            .map_err(|e| EvaluatorError::EvaluationFailed(format!("failed to spawn worker: {}", e)))?;
        Ok(Self { requests, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Evaluate with the configured timeout.
    pub fn infer(&self, pos: &Position, agent: usize, moves: &[Move]) -> Result<Inference, EvaluatorError> {
        self.infer_within(pos, agent, moves, self.timeout)
    }

    /// Evaluate, waiting at most `limit` (and never longer than the
    /// configured timeout). The answer is validated against `moves`.
    pub fn infer_within(
        &self,
        pos: &Position,
        agent: usize,
        moves: &[Move],
        limit: Duration,
    ) -> Result<Inference, EvaluatorError> {
        let wait = limit.min(self.timeout);
        if wait.is_zero() {
            return Err(EvaluatorError::Timeout(wait));
        }

        let (reply, answer) = mpsc::sync_channel(1);
        let request = Request {
            position: pos.clone(),
            agent,
            moves: moves.to_vec(),
            reply,
        };
        match self.requests.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Evaluator worker still busy with an abandoned call");
                return Err(EvaluatorError::Timeout(wait));
            }
            Err(TrySendError::Disconnected(_)) => return Err(EvaluatorError::Disconnected),
        }

        match answer.recv_timeout(wait) {
            Ok(result) => result?.validated(moves.len()),
            Err(RecvTimeoutError::Timeout) => Err(EvaluatorError::Timeout(wait)),
            Err(RecvTimeoutError::Disconnected) => Err(EvaluatorError::Disconnected),
        }
    }
}

impl std::fmt::Debug for BoundedEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedEvaluator")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::UniformEvaluator;
    use engine_core::legal_moves;
    use std::time::Instant;

    struct SlowEvaluator(Duration);

    impl Evaluator for SlowEvaluator {
        fn infer(&self, _pos: &Position, _agent: usize, moves: &[Move]) -> Result<Inference, EvaluatorError> {
            thread::sleep(self.0);
            Ok(Inference {
                policy: vec![1.0; moves.len()],
                value: 0.0,
            })
        }
    }

    struct BrokenEvaluator;

    impl Evaluator for BrokenEvaluator {
        fn infer(&self, _pos: &Position, _agent: usize, _moves: &[Move]) -> Result<Inference, EvaluatorError> {
            Ok(Inference {
                policy: vec![1.0],
                value: 0.0,
            })
        }
    }

    #[test]
    fn test_fast_evaluator_answers() {
        let pos = Position::new(2, 1).unwrap();
        let moves = legal_moves(&pos);
        let bounded = BoundedEvaluator::spawn(Arc::new(UniformEvaluator), Duration::from_secs(5)).unwrap();
        let inference = bounded.infer(&pos, 0, &moves).unwrap();
        assert_eq!(inference.policy.len(), moves.len());
    }

    #[test]
    fn test_slow_evaluator_times_out() {
        let pos = Position::new(2, 1).unwrap();
        let moves = legal_moves(&pos);
        let bounded =
            BoundedEvaluator::spawn(Arc::new(SlowEvaluator(Duration::from_millis(500))), Duration::from_millis(20))
                .unwrap();

        let start = Instant::now();
        let err = bounded.infer(&pos, 0, &moves).unwrap_err();
        assert!(matches!(err, EvaluatorError::Timeout(_)));
        assert!(start.elapsed() < Duration::from_millis(400));

        // The worker is still asleep on the abandoned call.
        let start = Instant::now();
        assert!(bounded.infer(&pos, 0, &moves).is_err());
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn test_limit_caps_the_wait() {
        let pos = Position::new(2, 1).unwrap();
        let moves = legal_moves(&pos);
        let bounded = BoundedEvaluator::spawn(Arc::new(UniformEvaluator), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            bounded.infer_within(&pos, 0, &moves, Duration::ZERO),
            Err(EvaluatorError::Timeout(_))
        ));
    }

    #[test]
    fn test_invalid_output_is_rejected() {
        let pos = Position::new(2, 1).unwrap();
        let moves = legal_moves(&pos);
        let bounded = BoundedEvaluator::spawn(Arc::new(BrokenEvaluator), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            bounded.infer(&pos, 0, &moves),
            Err(EvaluatorError::InvalidOutput(_))
        ));
    }
}
