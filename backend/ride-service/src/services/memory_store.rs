//! In-process notification store for tests and local runs without PostgreSQL.

use super::notification_store::NotificationStore;
use crate::error::{AppError, Result};
use crate::models::{NewNotification, Notification, UserId};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryNotificationStore {
    rows: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with an internal error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<Notification> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("notification store unavailable".into()));
        }
        Ok(())
    }

    fn with_rows<T>(&self, f: impl FnOnce(&mut Vec<Notification>) -> T) -> Result<T> {
        self.check()?;
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| AppError::Internal("notification store lock poisoned".into()))?;
        Ok(f(&mut rows))
    }

    fn list(&self, user_id: UserId, read: bool) -> Result<Vec<Notification>> {
        self.with_rows(|rows| {
            let mut found: Vec<_> = rows
                .iter()
                .filter(|n| n.user_id == user_id && n.read == read)
                .cloned()
                .collect();
            found.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
            found
        })
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &NewNotification) -> Result<i64> {
        self.with_rows(|rows| {
            let id = rows.len() as i64 + 1;
            rows.push(Notification {
                id,
                text: notification.text.clone(),
                read: false,
                created: notification.created,
                route_id: notification.route_id,
                user_id: notification.user_id,
            });
            id
        })
    }

    async fn unread_count(&self, user_id: UserId) -> Result<i64> {
        self.with_rows(|rows| {
            rows.iter()
                .filter(|n| n.user_id == user_id && !n.read)
                .count() as i64
        })
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64> {
        self.with_rows(|rows| {
            let mut changed = 0;
            for n in rows.iter_mut().filter(|n| n.user_id == user_id && !n.read) {
                n.read = true;
                changed += 1;
            }
            changed
        })
    }

    async fn list_unread(&self, user_id: UserId) -> Result<Vec<Notification>> {
        self.list(user_id, false)
    }

    async fn list_read(&self, user_id: UserId) -> Result<Vec<Notification>> {
        self.list(user_id, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn note(user_id: UserId, text: &str) -> NewNotification {
        NewNotification {
            route_id: None,
            user_id,
            text: text.to_string(),
            created: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_count_and_mark_read() {
        let store = MemoryNotificationStore::new();
        store.insert(&note(1, "a")).await.unwrap();
        store.insert(&note(1, "b")).await.unwrap();
        store.insert(&note(2, "c")).await.unwrap();

        assert_eq!(store.unread_count(1).await.unwrap(), 2);
        assert_eq!(store.mark_all_read(1).await.unwrap(), 2);
        assert_eq!(store.unread_count(1).await.unwrap(), 0);
        assert_eq!(store.list_read(1).await.unwrap().len(), 2);
        assert_eq!(store.unread_count(2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failing_store_errors() {
        let store = MemoryNotificationStore::new();
        store.set_failing(true);
        assert!(store.insert(&note(1, "a")).await.is_err());
        store.set_failing(false);
        assert_eq!(store.unread_count(1).await.unwrap(), 0);
    }
}
