//! Request factory and shared configuration.
//!
//! A [`Manager`] owns the transport, the executors and the interceptor lists.
//! Each request it creates gets a snapshot of the composed pipelines, so
//! interceptors added later only affect requests created later.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use url::Url;

use crate::error::RequestError;
use crate::execution::interceptors::{DEFAULT_MAX_REDIRECTS, ParameterEncoder, RedirectInterceptor};
use crate::execution::options::DEFAULT_TIMEOUT;
use crate::execution::{
    DefaultEnvironment, Environment, ExecutionOptions, Executor, Interceptors, RequestInterceptor,
    ResponseInterceptor, RuntimeExecutor, WorkerRuntime, compose_request, compose_response,
};
use crate::http::headers::USER_AGENT;
use crate::http::{Method, ParamValue, Parameters, Request};
use crate::transport::{Client, ReqwestClient, build_reqwest_client};

/// Manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Prefix for relative request paths
    pub base_path: Option<String>,
    /// Headers applied to every request that does not set them
    pub base_headers: HashMap<String, String>,
    /// Parameters appended to every request
    pub base_params: Vec<(String, String)>,
    /// Connect timeout
    #[serde(rename = "timeout_ms", with = "duration_millis_serde")]
    pub timeout: Duration,
    /// Read timeout
    #[serde(rename = "timeout_read_ms", with = "duration_millis_serde")]
    pub timeout_read: Duration,
    pub user_agent: Option<String>,
    pub allow_redirects: Option<bool>,
    pub use_http_cache: Option<bool>,
    /// Cap on redirects followed per request
    pub max_redirects: u32,
    /// Threads of the worker runtime started when none is supplied
    pub worker_threads: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            base_headers: HashMap::new(),
            base_params: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            timeout_read: DEFAULT_TIMEOUT,
            user_agent: None,
            allow_redirects: None,
            use_http_cache: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            worker_threads: 2,
        }
    }
}

mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Creates requests and holds what they share.
pub struct Manager {
    config: ManagerConfig,
    client: Arc<dyn Client>,
    executor: Arc<dyn Executor>,
    callback_executor: Arc<dyn Executor>,
    request_interceptors: Interceptors<dyn RequestInterceptor>,
    response_interceptors: Interceptors<dyn ResponseInterceptor>,
    _runtime: Option<Arc<WorkerRuntime>>,
}

impl Manager {
    /// Manager with default configuration, its own worker runtime and the
    /// `reqwest` transport.
    pub fn new() -> Result<Self, RequestError> {
        Self::builder().build()
    }

    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::default()
    }

    pub fn from_config(config: ManagerConfig) -> Result<Self, RequestError> {
        Self::builder().with_config(config).build()
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Changes apply to requests created afterwards.
    pub fn config_mut(&mut self) -> &mut ManagerConfig {
        &mut self.config
    }

    pub fn client(&self) -> &Arc<dyn Client> {
        &self.client
    }

    pub fn add_request_interceptor(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.request_interceptors.add(interceptor);
    }

    pub fn remove_request_interceptor(&mut self, interceptor: &Arc<dyn RequestInterceptor>) -> bool {
        self.request_interceptors.remove(interceptor)
    }

    pub fn clear_request_interceptors(&mut self) {
        self.request_interceptors.clear();
    }

    pub fn add_response_interceptor(&mut self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.response_interceptors.add(interceptor);
    }

    pub fn remove_response_interceptor(&mut self, interceptor: &Arc<dyn ResponseInterceptor>) -> bool {
        self.response_interceptors.remove(interceptor)
    }

    pub fn clear_response_interceptors(&mut self) {
        self.response_interceptors.clear();
    }

    /// Snapshot of the execution options handed to new requests.
    pub fn execution_options(&self) -> ExecutionOptions {
        let mut options = ExecutionOptions::new(
            Arc::clone(&self.client),
            Arc::clone(&self.executor),
            Arc::clone(&self.callback_executor),
            compose_request(self.request_interceptors.as_slice()),
            compose_response(self.response_interceptors.as_slice()),
        );
        options.timeout = self.config.timeout;
        options.timeout_read = self.config.timeout_read;
        options.allow_redirects = self.config.allow_redirects;
        options.use_http_cache = self.config.use_http_cache;
        options
    }

    /// Resolve `path` against the base path. Absolute URLs are used as is.
    pub fn create_url(&self, path: &str) -> Result<Url, RequestError> {
        if let Ok(url) = Url::parse(path)
            && !url.cannot_be_a_base()
        {
            return Ok(url);
        }
        let Some(base) = self.config.base_path.as_deref() else {
            return Err(RequestError::configuration(format!(
                "`{path}` is not an absolute URL and no base path is configured"
            )));
        };
        let base = base.trim_end_matches('/');
        let joined = match path.trim_start_matches('/') {
            "" => base.to_string(),
            rest => format!("{base}/{rest}"),
        };
        Ok(Url::parse(&joined)?)
    }

    /// Create a request. Base headers, base parameters and the configured
    /// user agent are applied.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        parameters: Parameters,
    ) -> Result<Request, RequestError> {
        let url = self.create_url(path)?;
        let mut request = Request::new(method, url, self.execution_options());

        for (name, value) in &self.config.base_headers {
            if !request.headers().contains(name) {
                request.headers_mut().set(name.clone(), value.clone());
            }
        }
        if let Some(user_agent) = &self.config.user_agent
            && !request.headers().contains(USER_AGENT)
        {
            request.headers_mut().set(USER_AGENT, user_agent.clone());
        }

        let params = request.parameters_mut();
        params.extend(
            self.config
                .base_params
                .iter()
                .map(|(name, value)| (name.clone(), ParamValue::Text(value.clone()))),
        );
        params.extend(parameters);

        tracing::trace!(target: "courier::manager", %method, url = %request.url(), "request created");
        Ok(request)
    }

    pub fn get(&self, path: &str) -> Result<Request, RequestError> {
        self.request(Method::Get, path, Parameters::new())
    }

    pub fn post(&self, path: &str) -> Result<Request, RequestError> {
        self.request(Method::Post, path, Parameters::new())
    }

    pub fn put(&self, path: &str) -> Result<Request, RequestError> {
        self.request(Method::Put, path, Parameters::new())
    }

    pub fn patch(&self, path: &str) -> Result<Request, RequestError> {
        self.request(Method::Patch, path, Parameters::new())
    }

    pub fn delete(&self, path: &str) -> Result<Request, RequestError> {
        self.request(Method::Delete, path, Parameters::new())
    }

    pub fn head(&self, path: &str) -> Result<Request, RequestError> {
        self.request(Method::Head, path, Parameters::new())
    }

    /// Multipart upload request.
    pub fn upload(&self, path: &str, method: Method) -> Result<Request, RequestError> {
        Ok(self.request(method, path, Parameters::new())?.multipart())
    }

    /// GET request whose response body is written to `destination`.
    pub fn download(&self, path: &str, destination: impl Into<PathBuf>) -> Result<Request, RequestError> {
        Ok(self.get(path)?.download(destination))
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("config", &self.config)
            .field("request_interceptors", &self.request_interceptors)
            .field("response_interceptors", &self.response_interceptors)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Manager`]
#[derive(Default)]
pub struct ManagerBuilder {
    config: ManagerConfig,
    client: Option<Arc<dyn Client>>,
    executor: Option<Arc<dyn Executor>>,
    callback_executor: Option<Arc<dyn Executor>>,
    environment: Option<Arc<dyn Environment>>,
    runtime_handle: Option<Handle>,
    request_interceptors: Option<Vec<Arc<dyn RequestInterceptor>>>,
    response_interceptors: Option<Vec<Arc<dyn ResponseInterceptor>>>,
}

impl ManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.config.base_path = Some(base_path.into());
        self
    }

    pub fn with_base_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.base_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_base_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.base_params.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_timeout_read(mut self, timeout: Duration) -> Self {
        self.config.timeout_read = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    /// Transport to use instead of the default `reqwest` one.
    pub fn with_client(mut self, client: Arc<dyn Client>) -> Self {
        self.client = Some(client);
        self
    }

    /// Executor for callback-style requests.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Executor for success and failure callbacks. Overrides the environment.
    pub fn with_callback_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.callback_executor = Some(executor);
        self
    }

    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Drive the default transport and executor on an existing runtime
    /// instead of starting one.
    pub fn with_runtime_handle(mut self, handle: Handle) -> Self {
        self.runtime_handle = Some(handle);
        self
    }

    /// Replace the default request interceptors (`ParameterEncoder`).
    pub fn with_request_interceptors(mut self, interceptors: Vec<Arc<dyn RequestInterceptor>>) -> Self {
        self.request_interceptors = Some(interceptors);
        self
    }

    /// Replace the default response interceptors (`RedirectInterceptor`).
    pub fn with_response_interceptors(
        mut self,
        interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    ) -> Self {
        self.response_interceptors = Some(interceptors);
        self
    }

    pub fn build(self) -> Result<Manager, RequestError> {
        let config = self.config;

        let needs_runtime = self.client.is_none() || self.executor.is_none();
        let (handle, runtime) = match (self.runtime_handle, needs_runtime) {
            (Some(handle), _) => (Some(handle), None),
            (None, true) => {
                let runtime = WorkerRuntime::new(config.worker_threads).map_err(|e| {
                    RequestError::configuration(format!("failed to start worker runtime: {e}"))
                })?;
                (runtime.handle(), Some(Arc::new(runtime)))
            }
            (None, false) => (None, None),
        };
        let require_handle = || {
            handle
                .clone()
                .ok_or_else(|| RequestError::configuration("no runtime available"))
        };

        let client: Arc<dyn Client> = match self.client {
            Some(client) => client,
            None => {
                let reqwest = build_reqwest_client(config.timeout, config.user_agent.as_deref())?;
                Arc::new(ReqwestClient::new(reqwest, require_handle()?))
            }
        };
        let executor: Arc<dyn Executor> = match self.executor {
            Some(executor) => executor,
            None => Arc::new(RuntimeExecutor::new(require_handle()?)),
        };
        let callback_executor = match self.callback_executor {
            Some(executor) => executor,
            None => self
                .environment
                .unwrap_or_else(|| Arc::new(DefaultEnvironment) as Arc<dyn Environment>)
                .callback_executor(),
        };

        let request_interceptors = self
            .request_interceptors
            .unwrap_or_else(|| vec![Arc::new(ParameterEncoder) as Arc<dyn RequestInterceptor>]);
        let response_interceptors = self.response_interceptors.unwrap_or_else(|| {
            let redirects = RedirectInterceptor::new().with_max_redirects(config.max_redirects);
            vec![Arc::new(redirects) as Arc<dyn ResponseInterceptor>]
        });

        tracing::debug!(
            target: "courier::manager",
            base_path = ?config.base_path,
            owns_runtime = runtime.is_some(),
            "manager built"
        );

        Ok(Manager {
            config,
            client,
            executor,
            callback_executor,
            request_interceptors: request_interceptors.into_iter().collect(),
            response_interceptors: response_interceptors.into_iter().collect(),
            _runtime: runtime,
        })
    }
}
