use crate::bindings::query::Query;
use crate::cache::QueryCache;
use crate::keys;
use crate::model::DashboardStats;
use crate::remote::DashboardApi;

#[derive(Debug, Clone)]
pub struct DashboardBindings {
    api: DashboardApi,
    cache: QueryCache,
}

impl DashboardBindings {
    pub(crate) fn new(api: DashboardApi, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub async fn stats(&self) -> Query<DashboardStats> {
        let api = self.api.clone();
        Query::mount(&self.cache, keys::dashboard::stats(), move || {
            let api = api.clone();
            async move { api.stats().await }
        })
        .await
    }
}
