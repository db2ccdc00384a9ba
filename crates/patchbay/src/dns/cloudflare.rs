use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{DnsError, DnsProvider, RecordType, ZoneRecord};

/// Cloudflare API client for zone-scoped DNS management
pub struct CloudflareClient {
    client: Client,
    api_token: String,
    zone_id: String,
}

#[derive(Debug, Serialize)]
struct CreateDnsRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    proxied: bool,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    success: bool,
    result: Option<CreatedRecord>,
    #[serde(default)]
    errors: Vec<CloudflareApiError>,
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    success: bool,
    #[serde(default)]
    result: Vec<ListedRecord>,
    #[serde(default)]
    errors: Vec<CloudflareApiError>,
}

#[derive(Debug, Deserialize)]
struct ListedRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CloudflareApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    success: bool,
}

impl CloudflareClient {
    pub fn new(api_token: &str, zone_id: &str) -> Self {
        Self {
            client: Client::new(),
            api_token: api_token.to_string(),
            zone_id: zone_id.to_string(),
        }
    }

    fn records_url(&self) -> String {
        format!(
            "https://api.cloudflare.com/client/v4/zones/{}/dns_records",
            self.zone_id
        )
    }

    fn join_errors(errors: Vec<CloudflareApiError>) -> String {
        errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[async_trait]
impl DnsProvider for CloudflareClient {
    /// Create a DNS record; fire-and-forget (the record is not checked
    /// for having become active)
    async fn create_record(
        &self,
        name: &str,
        record_type: RecordType,
        content: &str,
    ) -> Result<String, DnsError> {
        tracing::info!(
            "Creating DNS {} record: {} -> {}",
            record_type,
            name,
            content
        );

        let response = self
            .client
            .post(self.records_url())
            .bearer_auth(&self.api_token)
            .json(&CreateDnsRecord {
                record_type: record_type.as_str(),
                name,
                content,
                proxied: false,
            })
            .send()
            .await
            .map_err(|e| DnsError::Request(e.to_string()))?;

        let result: CreateResponse = response
            .json()
            .await
            .map_err(|e| DnsError::Request(e.to_string()))?;

        if result.success {
            let record = result
                .result
                .ok_or_else(|| DnsError::Api("No record in response".to_string()))?;
            tracing::info!("Created DNS record {} with ID {}", name, record.id);
            Ok(record.id)
        } else {
            Err(DnsError::Api(Self::join_errors(result.errors)))
        }
    }

    async fn list_records(&self) -> Result<Vec<ZoneRecord>, DnsError> {
        let response = self
            .client
            .get(self.records_url())
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| DnsError::Request(e.to_string()))?;

        let result: ListResponse = response
            .json()
            .await
            .map_err(|e| DnsError::Request(e.to_string()))?;

        if result.success {
            Ok(result
                .result
                .into_iter()
                .map(|r| ZoneRecord {
                    id: r.id,
                    name: r.name,
                    record_type: r.record_type,
                    content: r.content,
                })
                .collect())
        } else {
            Err(DnsError::Api(Self::join_errors(result.errors)))
        }
    }

    async fn delete_record(&self, record_id: &str) -> Result<(), DnsError> {
        tracing::info!("Deleting DNS record {}", record_id);

        let response = self
            .client
            .delete(format!("{}/{}", self.records_url(), record_id))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| DnsError::Request(e.to_string()))?;

        let result: DeleteResponse = response
            .json()
            .await
            .map_err(|e| DnsError::Request(e.to_string()))?;

        if result.success {
            tracing::info!("Deleted DNS record {}", record_id);
            Ok(())
        } else {
            Err(DnsError::Api(format!(
                "Failed to delete record {}",
                record_id
            )))
        }
    }
}
