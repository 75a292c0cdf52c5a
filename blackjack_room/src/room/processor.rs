//! Single-consumer command queue.
//!
//! [`CommandProcessor`] owns a piece of state inside one spawned task and
//! runs submitted handlers against it strictly one at a time, in the order
//! [`CommandProcessor::enqueue`] was called. An optional observer sees each
//! successful result before the next handler starts, so anything it emits
//! follows the same order.

use super::commands::{OperationResult, RoomCommand};
use crate::game::errors::{ErrorKind, RoomError, RoomResult, codes};
use std::{
    any::Any,
    future::Future,
    panic::{self, AssertUnwindSafe},
};
use tokio::sync::{mpsc, oneshot};

type Handler<S, T> = Box<dyn FnOnce(&mut S) -> RoomResult<T> + Send>;
type Observer<T> = Box<dyn Fn(&T) + Send>;

struct Job<S, T> {
    command: RoomCommand,
    handler: Handler<S, T>,
    completion: oneshot::Sender<RoomResult<T>>,
}

/// Handle to the processing task. Cloning shares the same queue.
pub struct CommandProcessor<S, T = OperationResult> {
    sender: mpsc::UnboundedSender<Job<S, T>>,
}

impl<S, T> Clone for CommandProcessor<S, T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<S, T> CommandProcessor<S, T>
where
    S: Send + 'static,
    T: Send + 'static,
{
    /// Move `state` into a new processing task. Must be called from within
    /// a tokio runtime.
    pub fn spawn(state: S) -> Self {
        Self::start(state, None)
    }

    /// Like [`CommandProcessor::spawn`], with `observer` called on every
    /// successful result inside the processing task.
    pub fn spawn_with_observer<O>(state: S, observer: O) -> Self
    where
        O: Fn(&T) + Send + 'static,
    {
        Self::start(state, Some(Box::new(observer)))
    }

    fn start(state: S, observer: Option<Observer<T>>) -> Self {
        let (sender, inbox) = mpsc::unbounded_channel();
        tokio::spawn(run(state, inbox, observer));
        Self { sender }
    }

    /// Queue `handler` to run against the state.
    ///
    /// The command's position in the queue is fixed when this is called,
    /// not when the returned future is first polled. Dropping the future
    /// does not cancel the command.
    pub fn enqueue<F>(
        &self,
        command: RoomCommand,
        handler: F,
    ) -> impl Future<Output = RoomResult<T>> + Send + use<S, T, F>
    where
        F: FnOnce(&mut S) -> RoomResult<T> + Send + 'static,
    {
        let (completion, response) = oneshot::channel();
        let job = Job {
            command,
            handler: Box::new(handler),
            completion,
        };
        let queued = self.sender.send(job).map_err(|_| {
            RoomError::internal(codes::PROCESSOR_STOPPED, "Command processor has stopped")
        });

        async move {
            queued?;
            response.await.unwrap_or_else(|_| {
                Err(RoomError::internal(
                    codes::HANDLER_DROPPED,
                    "Command was dropped before completing",
                ))
            })
        }
    }

    /// Whether the processing task has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

async fn run<S, T>(
    mut state: S,
    mut inbox: mpsc::UnboundedReceiver<Job<S, T>>,
    observer: Option<Observer<T>>,
) {
    log::debug!("Command processor started");

    while let Some(Job {
        command,
        handler,
        completion,
    }) = inbox.recv().await
    {
        log::debug!("Processing {} from {}", command.kind, command.connection_id);

        let result = match panic::catch_unwind(AssertUnwindSafe(|| handler(&mut state))) {
            Ok(result) => result,
            Err(payload) => {
                log::error!(
                    "Handler for {} from {} panicked: {}",
                    command.kind,
                    command.connection_id,
                    panic_message(payload.as_ref())
                );
                Err(RoomError::internal(
                    codes::HANDLER_PANICKED,
                    "Command handler panicked",
                ))
            }
        };

        if let (Ok(value), Some(observer)) = (&result, &observer) {
            observer(value);
        }

        if let Err(err) = &result {
            match err.kind {
                ErrorKind::Internal => log::error!(
                    "{} from {} failed: {}",
                    command.kind,
                    command.connection_id,
                    err
                ),
                _ => log::debug!(
                    "{} from {} rejected: {}",
                    command.kind,
                    command.connection_id,
                    err
                ),
            }
        }

        // The caller may have stopped waiting; the command still ran.
        let _ = completion.send(result);
    }

    log::debug!("Command processor stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::commands::CommandKind;
    use std::sync::{Arc, Mutex};

    fn command(id: &str) -> RoomCommand {
        RoomCommand::new(CommandKind::Snapshot, id.into())
    }

    #[tokio::test]
    async fn test_handlers_run_in_enqueue_order() {
        let processor: CommandProcessor<Vec<usize>, Vec<usize>> =
            CommandProcessor::spawn(Vec::new());

        let pending: Vec<_> = (0..100)
            .map(|i| {
                processor.enqueue(command("c"), move |log: &mut Vec<usize>| {
                    log.push(i);
                    Ok(log.clone())
                })
            })
            .collect();

        let mut last = Vec::new();
        for future in pending {
            last = future.await.unwrap();
        }
        assert_eq!(last, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_error_does_not_halt_queue() {
        let processor: CommandProcessor<u32, u32> = CommandProcessor::spawn(0);

        let failing = processor.enqueue(command("a"), |_| {
            Err(RoomError::rule(codes::NOT_YOUR_TURN, "It is not your turn."))
        });
        let next = processor.enqueue(command("b"), |count| {
            *count += 1;
            Ok(*count)
        });

        assert_eq!(failing.await.unwrap_err().code, codes::NOT_YOUR_TURN);
        assert_eq!(next.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let processor: CommandProcessor<u32, u32> = CommandProcessor::spawn(0);

        let err = processor
            .enqueue(command("a"), |_| panic!("boom"))
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::HANDLER_PANICKED);
        assert_eq!(err.kind, ErrorKind::Internal);

        let count = processor
            .enqueue(command("b"), |count| {
                *count += 1;
                Ok(*count)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(!processor.is_closed());
    }

    #[tokio::test]
    async fn test_observer_sees_successes_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let processor: CommandProcessor<u32, u32> =
            CommandProcessor::spawn_with_observer(0, move |count: &u32| {
                sink.lock().unwrap().push(*count);
            });

        let pending: Vec<_> = (0..10)
            .map(|i| {
                processor.enqueue(command("c"), move |count: &mut u32| {
                    if i % 3 == 0 {
                        return Err(RoomError::rule(codes::NOT_YOUR_TURN, "It is not your turn."));
                    }
                    *count += 1;
                    Ok(*count)
                })
            })
            .collect();
        for future in pending {
            let _ = future.await;
        }

        // Every completion is sent after the observer ran for it.
        assert_eq!(*seen.lock().unwrap(), (1..=6).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_dropped_future_still_runs() {
        let processor: CommandProcessor<u32, u32> = CommandProcessor::spawn(0);

        drop(processor.enqueue(command("a"), |count| {
            *count += 10;
            Ok(*count)
        }));
        let count = processor
            .enqueue(command("b"), |count| Ok(*count))
            .await
            .unwrap();
        assert_eq!(count, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_producers() {
        let processor: Arc<CommandProcessor<u64, u64>> = Arc::new(CommandProcessor::spawn(0));

        let tasks: Vec<_> = (0..8)
            .map(|t| {
                let processor = processor.clone();
                tokio::spawn(async move {
                    for _ in 0..50 {
                        processor
                            .enqueue(command(&format!("c{t}")), |total| {
                                // Read-modify-write would tear if handlers overlapped.
                                let seen = *total;
                                std::hint::black_box(seen);
                                *total = seen + 1;
                                Ok(*total)
                            })
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let total = processor
            .enqueue(command("final"), |total| Ok(*total))
            .await
            .unwrap();
        assert_eq!(total, 400);
    }
}
