use crate::{
    db::DbPool,
    entities::service_follow_up,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Duration, NaiveTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// How many days ahead of the due date reminders are sent. Zero is the
/// day-of reminder.
const REMINDER_LEAD_DAYS: [i64; 4] = [15, 7, 3, 0];

/// Fire-and-forget reminder sweep over open service follow-ups. Emits
/// events only; delivery happens behind the event consumer. Deliberately
/// not coordinated with the write path.
#[derive(Clone)]
pub struct NotificationService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl NotificationService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// One pass over all lead intervals. Returns the number of reminders
    /// emitted.
    #[instrument(skip(self))]
    pub async fn sweep_once(&self) -> Result<u64, ServiceError> {
        let db = self.db.as_ref();
        let today = Utc::now().date_naive();
        let mut emitted = 0u64;

        for days_ahead in REMINDER_LEAD_DAYS {
            let target = today + Duration::days(days_ahead);
            let window_start = target.and_time(NaiveTime::MIN).and_utc();
            let window_end = window_start + Duration::days(1);

            let due = service_follow_up::Entity::find()
                .filter(service_follow_up::Column::IsCompleted.eq(false))
                .filter(service_follow_up::Column::NextServiceDate.gte(window_start))
                .filter(service_follow_up::Column::NextServiceDate.lt(window_end))
                .all(db)
                .await?;

            for follow_up in due {
                self.event_sender
                    .send_or_log(Event::ServiceDueReminder {
                        installation_id: follow_up.installation_id,
                        follow_up_id: follow_up.id,
                        next_service_date: follow_up.next_service_date,
                        days_ahead,
                    })
                    .await;
                emitted += 1;
            }
        }

        Ok(emitted)
    }

    /// Spawns the periodic sweep loop.
    pub fn spawn(self, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(60)));
            loop {
                ticker.tick().await;
                match self.sweep_once().await {
                    Ok(count) => info!(reminders = count, "Service reminder sweep finished"),
                    Err(err) => error!(error = %err, "Service reminder sweep failed"),
                }
            }
        })
    }
}
