use crate::error::Result;
use crate::model::DashboardStats;
use crate::remote::client::{ResourceClient, NO_FILTER};

#[derive(Debug, Clone)]
pub struct DashboardApi {
    client: ResourceClient,
}

impl DashboardApi {
    pub fn new(client: ResourceClient) -> Self {
        Self { client }
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        self.client.get("/dashboard/stats", NO_FILTER).await
    }
}
