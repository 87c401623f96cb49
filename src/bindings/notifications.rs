//! Notification bindings

use crate::bindings::mutation::{MutationHook, Outcome};
use crate::bindings::query::Query;
use crate::cache::{Mutation, QueryCache};
use crate::keys;
use crate::model::{Notification, NotificationFilter, NotificationStats, Page, UnreadCount};
use crate::remote::NotificationsApi;

#[derive(Debug, Clone)]
pub struct NotificationBindings {
    api: NotificationsApi,
    cache: QueryCache,
}

impl NotificationBindings {
    pub(crate) fn new(api: NotificationsApi, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub async fn list(&self, filter: NotificationFilter) -> Query<Page<Notification>> {
        let api = self.api.clone();
        let key = keys::notifications::list(&filter);
        Query::mount(&self.cache, key, move || {
            let api = api.clone();
            let filter = filter.clone();
            async move { api.list(&filter).await }
        })
        .await
    }

    pub async fn unread_count(&self) -> Query<UnreadCount> {
        let api = self.api.clone();
        Query::mount(&self.cache, keys::notifications::unread(), move || {
            let api = api.clone();
            async move { api.unread_count().await }
        })
        .await
    }

    pub async fn stats(&self) -> Query<NotificationStats> {
        let api = self.api.clone();
        Query::mount(&self.cache, keys::notifications::stats(), move || {
            let api = api.clone();
            async move { api.stats().await }
        })
        .await
    }

    pub fn mark_read(&self) -> MutationHook<String, ()> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |notification_id: String| {
            let api = api.clone();
            async move {
                Outcome::from_result(api.mark_read(&notification_id).await, |_| {
                    vec![Mutation::MarkNotificationRead { notification_id }]
                })
            }
        })
    }

    pub fn mark_unread(&self) -> MutationHook<String, ()> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |notification_id: String| {
            let api = api.clone();
            async move {
                Outcome::from_result(api.mark_unread(&notification_id).await, |_| {
                    vec![Mutation::MarkNotificationUnread { notification_id }]
                })
            }
        })
    }

    pub fn mark_all_read(&self) -> MutationHook<(), ()> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |_: ()| {
            let api = api.clone();
            async move {
                Outcome::from_result(api.mark_all_read().await, |_| {
                    vec![Mutation::MarkAllNotificationsRead]
                })
            }
        })
    }

    pub fn delete(&self) -> MutationHook<String, ()> {
        let api = self.api.clone();
        MutationHook::new(&self.cache, move |notification_id: String| {
            let api = api.clone();
            async move {
                Outcome::from_result(api.delete(&notification_id).await, |_| {
                    vec![Mutation::DeleteNotification { notification_id }]
                })
            }
        })
    }
}
