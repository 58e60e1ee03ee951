//! Driver spawns and manages the tasks serving one open channel

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::transport::Channel;
use crate::wire::WsPacket;

/// Receives every packet read from the channel, on the receive task.
pub trait PacketHandler: Send + Sync + 'static {
    fn handle_packet(&self, packet: WsPacket);
}

/// Lifecycle events reported by the driver tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// The first message arrived.
    FirstMessage,
    /// No message arrived within the idle timeout.
    IdleTimeout,
    /// The remote closed the channel.
    Closed,
    /// The channel failed.
    Failed(String),
}

impl DriverEvent {
    /// Whether the channel is gone after this event.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DriverEvent::FirstMessage)
    }
}

/// Driver spawns and manages the channel tasks
///
/// Spawns a receive task that owns the channel and an idle watchdog. Both stop
/// when `cancel` fires; the receive task closes the channel on exit.
pub struct Driver;

impl Driver {
    /// Spawn driver tasks for the given channel
    ///
    /// Returns the receiver for lifecycle events. Exactly one terminal event is
    /// sent unless the driver is cancelled first.
    pub fn spawn<H>(
        channel: Box<dyn Channel>,
        handler: Arc<H>,
        idle_timeout: Duration,
        cancel: CancellationToken,
    ) -> mpsc::UnboundedReceiver<DriverEvent>
    where
        H: PacketHandler + ?Sized,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (activity_tx, activity_rx) = watch::channel(Instant::now());

        // Stops the watchdog when the receive task ends on its own.
        let local = cancel.child_token();

        tokio::spawn(Self::watchdog_task(activity_rx, idle_timeout, event_tx.clone(), local.clone()));
        tokio::spawn(Self::receive_task(channel, handler, activity_tx, event_tx, local));

        event_rx
    }

    /// Receive task - reads messages and hands packets to the handler
    async fn receive_task<H>(
        mut channel: Box<dyn Channel>,
        handler: Arc<H>,
        activity: watch::Sender<Instant>,
        events: mpsc::UnboundedSender<DriverEvent>,
        cancel: CancellationToken,
    ) where
        H: PacketHandler + ?Sized,
    {
        info!("Receive task started");
        let mut message_count = 0u64;

        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Receive task cancelled");
                    break;
                }
                message = channel.recv() => message,
            };

            match message {
                Some(Ok(bytes)) => {
                    message_count += 1;
                    trace!("Message {}: {} bytes", message_count, bytes.len());

                    let _ = activity.send(Instant::now());
                    if message_count == 1 {
                        let _ = events.send(DriverEvent::FirstMessage);
                    }
                    handler.handle_packet(WsPacket::new(bytes));
                }
                Some(Err(e)) => {
                    warn!("Channel failed after {} messages: {}", message_count, e);
                    if !cancel.is_cancelled() {
                        let _ = events.send(DriverEvent::Failed(e.to_string()));
                    }
                    break;
                }
                None => {
                    info!("Channel closed by remote after {} messages", message_count);
                    if !cancel.is_cancelled() {
                        let _ = events.send(DriverEvent::Closed);
                    }
                    break;
                }
            }
        }

        cancel.cancel();
        channel.close().await;
        info!("Receive task ended (processed {} messages)", message_count);
    }

    /// Watchdog task - reports when the channel has been silent too long
    async fn watchdog_task(
        mut activity: watch::Receiver<Instant>,
        idle_timeout: Duration,
        events: mpsc::UnboundedSender<DriverEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let deadline = *activity.borrow_and_update() + idle_timeout;

            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = activity.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = sleep_until(deadline) => {
                    warn!("No message for {:?}, channel considered idle", idle_timeout);
                    if !cancel.is_cancelled() {
                        let _ = events.send(DriverEvent::IdleTimeout);
                    }
                    // Ends the receive task, which closes the channel.
                    cancel.cancel();
                    break;
                }
            }
        }
        trace!("Watchdog task ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use std::sync::Mutex;

    struct ScriptedChannel {
        messages: mpsc::UnboundedReceiver<Option<Result<Vec<u8>>>>,
        closed: Arc<Mutex<bool>>,
    }

    #[async_trait::async_trait]
    impl Channel for ScriptedChannel {
        async fn recv(&mut self) -> Option<Result<Vec<u8>>> {
            self.messages.recv().await.flatten()
        }

        async fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    #[derive(Default)]
    struct Counter(Mutex<usize>);

    impl PacketHandler for Counter {
        fn handle_packet(&self, _packet: WsPacket) {
            *self.0.lock().unwrap() += 1;
        }
    }

    fn channel() -> (mpsc::UnboundedSender<Option<Result<Vec<u8>>>>, Box<dyn Channel>, Arc<Mutex<bool>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(Mutex::new(false));
        (tx, Box::new(ScriptedChannel { messages: rx, closed: closed.clone() }), closed)
    }

    #[tokio::test(start_paused = true)]
    async fn messages_reach_handler_and_first_is_reported() {
        let (tx, channel, _) = channel();
        let handler = Arc::new(Counter::default());
        let mut events = Driver::spawn(channel, handler.clone(), Duration::from_secs(30), CancellationToken::new());

        tx.send(Some(Ok(vec![1]))).unwrap();
        tx.send(Some(Ok(vec![2]))).unwrap();
        assert_eq!(events.recv().await, Some(DriverEvent::FirstMessage));

        tx.send(None).unwrap();
        assert_eq!(events.recv().await, Some(DriverEvent::Closed));
        assert_eq!(*handler.0.lock().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn silence_triggers_idle_timeout_and_closes_channel() {
        let (_tx, channel, closed) = channel();
        let mut events =
            Driver::spawn(channel, Arc::new(Counter::default()), Duration::from_secs(30), CancellationToken::new());

        assert_eq!(events.recv().await, Some(DriverEvent::IdleTimeout));
        tokio::task::yield_now().await;
        assert!(events.recv().await.is_none());
        assert!(*closed.lock().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_postpones_idle_timeout() {
        let (tx, channel, _) = channel();
        let mut events =
            Driver::spawn(channel, Arc::new(Counter::default()), Duration::from_secs(30), CancellationToken::new());

        let started = Instant::now();
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_secs(20)).await;
            tx.send(Some(Ok(vec![0]))).unwrap();
        }

        assert_eq!(events.recv().await, Some(DriverEvent::FirstMessage));
        assert_eq!(events.recv().await, Some(DriverEvent::IdleTimeout));
        assert!(started.elapsed() >= Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_is_silent() {
        let (_tx, channel, closed) = channel();
        let cancel = CancellationToken::new();
        let mut events = Driver::spawn(channel, Arc::new(Counter::default()), Duration::from_secs(30), cancel.clone());

        cancel.cancel();
        assert!(events.recv().await.is_none());
        assert!(*closed.lock().unwrap());
    }
}
