//! The caller-facing client.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use authwire_core::{
    EventObserver, FromHeaders, HttpResponse, MemoryTokenStore, Result, Router, TokenRefresher,
    TokenStore, Transport,
};

use crate::config::ClientConfig;
use crate::executor::RequestExecutor;
use crate::observer::TracingObserver;
use crate::provider::TokenProvider;
use crate::signer::RequestSigner;

/// A typed HTTP client that signs, sends, retries and decodes requests
/// described by [`Router`]s.
///
/// Cheap to clone; clones share the session.
///
/// # Example
///
/// ```no_run
/// use authwire::{AuthorizationRequirement, Client, HttpTokenRefresher, Router};
/// # use authwire::{HttpRequest, HttpResponse, Result, Transport};
/// # struct MyTransport;
/// # #[async_trait::async_trait]
/// # impl Transport for MyTransport {
/// #     async fn send(&self, _: HttpRequest) -> Result<HttpResponse> { unimplemented!() }
/// # }
///
/// struct Me;
///
/// impl Router for Me {
///     fn base_url(&self) -> &str { "https://api.example.com/v1" }
///     fn path(&self) -> String { "me".into() }
///     fn authorization(&self) -> AuthorizationRequirement {
///         AuthorizationRequirement::ACCESS_TOKEN
///     }
/// }
///
/// # async fn example() -> Result<()> {
/// let endpoint = url::Url::parse("https://api.example.com/v1/token/refresh").unwrap();
/// let client = Client::builder(
///     std::sync::Arc::new(MyTransport),
///     HttpTokenRefresher::new(MyTransport, endpoint),
/// )
/// .build();
///
/// let me: serde_json::Value = client.execute(&Me).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    executor: RequestExecutor,
}

impl Client {
    /// Start building a client from its two required collaborators.
    pub fn builder(
        transport: impl Transport + 'static,
        refresher: impl TokenRefresher + 'static,
    ) -> ClientBuilder {
        ClientBuilder {
            transport: Arc::new(transport),
            refresher: Arc::new(refresher),
            store: None,
            observer: None,
            config: ClientConfig::default(),
        }
    }

    /// The token provider backing this client's session.
    pub fn token_provider(&self) -> &TokenProvider {
        self.executor.signer().provider()
    }

    /// Clear the session.
    pub async fn logout(&self) -> Result<()> {
        self.token_provider().logout().await
    }

    /// Execute `router` and decode the JSON body.
    #[instrument(skip_all, fields(path = %router.path(), auth = %router.authorization()))]
    pub async fn execute<R, T>(&self, router: &R) -> Result<T>
    where
        R: Router + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(router).await?;
        self.decode(&response)
    }

    /// Execute `router`, decoding both the JSON body and data carried in
    /// response headers.
    #[instrument(skip_all, fields(path = %router.path(), auth = %router.authorization()))]
    pub async fn execute_with_headers<R, T, H>(&self, router: &R) -> Result<(T, H)>
    where
        R: Router + ?Sized,
        T: DeserializeOwned,
        H: FromHeaders,
    {
        let response = self.send(router).await?;
        let headers = H::from_headers(&response.headers)?;
        let body = self.decode(&response)?;
        Ok((body, headers))
    }

    /// Execute `router` when no body is expected.
    #[instrument(skip_all, fields(path = %router.path(), auth = %router.authorization()))]
    pub async fn execute_empty<R>(&self, router: &R) -> Result<()>
    where
        R: Router + ?Sized,
    {
        self.send(router).await?;
        Ok(())
    }

    /// Execute `router` and return the raw 2xx response.
    pub async fn send<R>(&self, router: &R) -> Result<HttpResponse>
    where
        R: Router + ?Sized,
    {
        let request = router.to_request()?;
        self.executor.execute(request, router.authorization()).await
    }

    /// Empty bodies decode as JSON `null`.
    fn decode<T: DeserializeOwned>(&self, response: &HttpResponse) -> Result<T> {
        let value = if response.body.iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&response.body)?
        };
        self.executor.observer().on_response_decoded(&value);
        debug!(status = response.status, "Decoding response body");
        Ok(serde_json::from_value(value)?)
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    transport: Arc<dyn Transport>,
    refresher: Arc<dyn TokenRefresher>,
    store: Option<Arc<dyn TokenStore>>,
    observer: Option<Arc<dyn EventObserver>>,
    config: ClientConfig,
}

impl ClientBuilder {
    /// Persist the session in `store`. Defaults to a [`MemoryTokenStore`].
    pub fn store(mut self, store: impl TokenStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Report pipeline events to `observer`. Defaults to [`TracingObserver`].
    pub fn observer(mut self, observer: impl EventObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Client {
        let store: Arc<dyn TokenStore> = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryTokenStore::new()),
        };
        let observer: Arc<dyn EventObserver> = match self.observer {
            Some(observer) => observer,
            None => Arc::new(TracingObserver),
        };

        let provider = match self.config.expiry_policy() {
            Some(policy) => TokenProvider::with_expiry_policy(store, self.refresher, policy),
            None => TokenProvider::new(store, self.refresher),
        };
        let executor = RequestExecutor::new(self.transport, RequestSigner::new(provider), observer)
            .with_request_timeout(self.config.request_timeout());

        Client { executor }
    }
}
