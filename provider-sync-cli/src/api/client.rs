//! Azure Resource Manager client for subscriptions and resource providers

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};

use super::auth::AuthManager;
use super::constants::{PROVIDERS_API_VERSION, SUBSCRIPTIONS_API_VERSION, USER_AGENT};
use super::models::{ArmError, Provider, ProviderListResult, Subscription};
use crate::config::Config;
use crate::replication::{
    ProviderRegistry, RegistrationSnapshot, RegistrationState, SubscriptionHandle, SubscriptionId,
};

pub struct ArmClient {
    base_url: String,
    http: Client,
    auth: AuthManager,
}

impl ArmClient {
    /// Build the client and its token source from the process configuration
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.http_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let auth = AuthManager::new(
            config.cloud,
            config.credentials.clone(),
            http.clone(),
            config.http_timeout,
        );

        Ok(Self {
            base_url: config.cloud.resource_manager().to_string(),
            http,
            auth,
        })
    }

    pub fn subscription_url(&self, id: &SubscriptionId) -> String {
        format!(
            "{}/subscriptions/{}?api-version={}",
            self.base_url, id, SUBSCRIPTIONS_API_VERSION
        )
    }

    pub fn providers_url(&self, id: &SubscriptionId) -> String {
        format!(
            "{}/subscriptions/{}/providers?api-version={}",
            self.base_url, id, PROVIDERS_API_VERSION
        )
    }

    /// `register` or `unregister` action URL for one namespace
    pub fn provider_action_url(&self, id: &SubscriptionId, namespace: &str, register: bool) -> String {
        format!(
            "{}/subscriptions/{}/providers/{}/{}?api-version={}",
            self.base_url,
            id,
            urlencoding::encode(namespace),
            if register { "register" } else { "unregister" },
            PROVIDERS_API_VERSION
        )
    }

    async fn send(&self, method: Method, url: &str) -> Result<Response> {
        let token = self.auth.token().await?;

        log::debug!("{} {}", method, url);
        let response = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, url))?;
        log::debug!("{} {} -> {}", method, url, response.status());

        Ok(response)
    }

    pub async fn get_subscription(&self, id: &SubscriptionId) -> Result<Subscription> {
        let response = self.send(Method::GET, &self.subscription_url(id)).await?;

        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .with_context(|| format!("Invalid subscription response for {}", id)),
            StatusCode::NOT_FOUND => Err(arm_error(response)
                .await
                .context(format!("Subscription {} not found", id))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(arm_error(response)
                .await
                .context(format!("Not authorized to access subscription {}", id))),
            _ => Err(arm_error(response).await),
        }
    }

    /// Every provider on the subscription, following `nextLink`
    pub async fn list_providers(&self, id: &SubscriptionId) -> Result<Vec<Provider>> {
        let mut providers = Vec::new();
        let mut next = Some(self.providers_url(id));
        let mut pages = 0;

        while let Some(url) = next.take() {
            pages += 1;

            let response = self.send(Method::GET, &url).await?;
            if !response.status().is_success() {
                return Err(arm_error(response)
                    .await
                    .context(format!("Failed to list providers for {}", id)));
            }

            let page: ProviderListResult = response
                .json()
                .await
                .with_context(|| format!("Invalid provider listing for {}", id))?;
            providers.extend(page.value);
            next = page.next_link.filter(|link| !link.is_empty());
        }

        log::debug!("Listed {} providers for {} in {} page(s)", providers.len(), id, pages);
        Ok(providers)
    }

    pub async fn set_provider_registration(
        &self,
        id: &SubscriptionId,
        namespace: &str,
        register: bool,
    ) -> Result<()> {
        let url = self.provider_action_url(id, namespace, register);
        let response = self.send(Method::POST, &url).await?;

        if !response.status().is_success() {
            return Err(arm_error(response).await.context(format!(
                "Failed to {} {} on {}",
                if register { "register" } else { "unregister" },
                namespace,
                id
            )));
        }
        Ok(())
    }
}

/// Turn a failed response into an error carrying the ARM code and message
async fn arm_error(response: Response) -> anyhow::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    anyhow!("HTTP {}: {}", status, ArmError::from_body(&body))
}

/// Collapse a provider listing into a snapshot
pub fn snapshot_from_providers(providers: Vec<Provider>) -> RegistrationSnapshot {
    RegistrationSnapshot::from_states(providers.into_iter().map(|p| {
        let state = RegistrationState::parse(p.registration_state.as_deref().unwrap_or_default());
        (p.namespace, state)
    }))
}

#[async_trait]
impl ProviderRegistry for ArmClient {
    async fn lookup_subscription(&self, id: &SubscriptionId) -> Result<SubscriptionHandle> {
        let subscription = self.get_subscription(id).await?;

        if let Some(state) = subscription.state.as_deref() {
            if state != "Enabled" {
                log::warn!("Subscription {} is in state {}", id, state);
            }
        }

        Ok(SubscriptionHandle {
            id: *id,
            display_name: subscription.display_name,
        })
    }

    async fn fetch_registration_snapshot(
        &self,
        subscription: &SubscriptionHandle,
    ) -> Result<RegistrationSnapshot> {
        let providers = self.list_providers(&subscription.id).await?;
        Ok(snapshot_from_providers(providers))
    }

    async fn set_registration(
        &self,
        subscription: &SubscriptionHandle,
        namespace: &str,
        desired: bool,
    ) -> Result<()> {
        self.set_provider_registration(&subscription.id, namespace, desired)
            .await
    }
}
