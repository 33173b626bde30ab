use std::sync::Arc;

use log::*;
use rand::Rng;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::PayoutConfig,
    data_objects::{PayoutRequest, PayoutResponse},
    PayoutApiError,
};

#[derive(Clone)]
pub struct PayoutApi {
    config: PayoutConfig,
    client: Arc<Client>,
}

impl PayoutApi {
    pub fn new(config: PayoutConfig) -> Result<Self, PayoutApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PayoutApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PayoutApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| PayoutApiError::ResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| PayoutApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PayoutApiError::ResponseError(e.to_string()))?;
            Err(PayoutApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Submits one payout leg to the provider. In simulation mode the request goes nowhere and a
    /// locally fabricated "processed" response comes back.
    pub async fn create_payout(&self, request: PayoutRequest) -> Result<PayoutResponse, PayoutApiError> {
        if self.config.simulate {
            return Ok(self.simulate_payout(request));
        }
        debug!("Submitting payout {} of {} to {}", request.reference_id, request.amount, request.beneficiary_name);
        let result = self.rest_query::<PayoutResponse, _>(Method::POST, "/payouts", Some(&request)).await?;
        info!("Payout {} accepted by the provider as {} ({})", request.reference_id, result.id, result.status);
        Ok(result)
    }

    fn simulate_payout(&self, request: PayoutRequest) -> PayoutResponse {
        let id = format!("pout_sim{:010}", rand::thread_rng().gen_range(0..10_000_000_000u64));
        warn!(
            "🚨️ SIMULATED payout {id}: {} to {} ({}/{}). No money moved.",
            request.amount, request.beneficiary_name, request.account_number, request.ifsc_code
        );
        PayoutResponse {
            id,
            reference_id: request.reference_id,
            status: "processed".to_string(),
            utr: None,
            amount: request.amount,
        }
    }
}
