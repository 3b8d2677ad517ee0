use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the write paths. Consumed in-process; delivery to
/// external channels (mail, push) happens behind the consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    InstallationCreated(Uuid),
    InstallationUpdated(Uuid),
    WarrantyFollowUpScheduled {
        installation_id: Uuid,
        follow_up_id: Uuid,
        end_of_warranty_date: DateTime<Utc>,
    },
    ServiceFollowUpScheduled {
        installation_id: Uuid,
        follow_up_id: Uuid,
        next_service_date: DateTime<Utc>,
    },
    ServiceFollowUpCompleted {
        follow_up_id: Uuid,
        maintenance_record_id: Uuid,
        successor_id: Uuid,
    },
    ServiceDueReminder {
        installation_id: Uuid,
        follow_up_id: Uuid,
        next_service_date: DateTime<Utc>,
        days_ahead: i64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is gone.
    /// Used on write paths where event delivery must not abort the request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!(error = %e, ?event, "Dropping event, consumer unavailable");
        }
    }
}

/// Creates a connected sender/receiver pair with a bounded buffer.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Spawned once at startup.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::ServiceDueReminder {
                installation_id,
                follow_up_id,
                next_service_date,
                days_ahead,
            } => {
                info!(
                    %installation_id,
                    %follow_up_id,
                    due = %next_service_date,
                    days_ahead,
                    "Service due reminder"
                );
            }
            other => info!(event = ?other, "Event processed"),
        }
    }
    info!("Event channel closed, consumer exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_does_not_fail_without_consumer() {
        let (sender, receiver) = channel(1);
        drop(receiver);
        sender
            .send_or_log(Event::InstallationCreated(Uuid::new_v4()))
            .await;
    }

    #[tokio::test]
    async fn events_round_trip_through_the_channel() {
        let (sender, mut receiver) = channel(4);
        let id = Uuid::new_v4();
        sender.send(Event::InstallationCreated(id)).await.unwrap();
        match receiver.recv().await {
            Some(Event::InstallationCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
