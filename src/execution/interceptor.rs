//! Interceptor traits and pipeline composition.
//!
//! A request interceptor receives the request and the rest of the chain
//! (`next`). It may modify the request before calling `next`, post-process
//! the result, or return without calling `next` at all. Response interceptors
//! work the same way over `(request, response)`.
//!
//! Interceptors are composed right to left: the first registered one is the
//! outermost and sees the request first.

use std::sync::Arc;

use crate::error::RequestError;
use crate::http::{Request, Response};

/// A composed request pipeline.
pub type RequestTransformer = Arc<dyn Fn(Request) -> Result<Request, RequestError> + Send + Sync>;

/// A composed response pipeline.
pub type ResponseTransformer =
    Arc<dyn Fn(&mut Request, Response) -> Result<Response, RequestError> + Send + Sync>;

/// Hook around the outgoing request.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(
        &self,
        request: Request,
        next: &RequestTransformer,
    ) -> Result<Request, RequestError>;
}

/// Hook around the incoming response.
pub trait ResponseInterceptor: Send + Sync {
    fn intercept(
        &self,
        request: &mut Request,
        response: Response,
        next: &ResponseTransformer,
    ) -> Result<Response, RequestError>;
}

impl<F> RequestInterceptor for F
where
    F: Fn(Request, &RequestTransformer) -> Result<Request, RequestError> + Send + Sync,
{
    fn intercept(
        &self,
        request: Request,
        next: &RequestTransformer,
    ) -> Result<Request, RequestError> {
        self(request, next)
    }
}

impl<F> ResponseInterceptor for F
where
    F: Fn(&mut Request, Response, &ResponseTransformer) -> Result<Response, RequestError>
        + Send
        + Sync,
{
    fn intercept(
        &self,
        request: &mut Request,
        response: Response,
        next: &ResponseTransformer,
    ) -> Result<Response, RequestError> {
        self(request, response, next)
    }
}

/// Pipeline that returns its input unchanged.
pub fn identity_request_transformer() -> RequestTransformer {
    Arc::new(|request: Request| Ok::<_, RequestError>(request))
}

pub fn identity_response_transformer() -> ResponseTransformer {
    Arc::new(|_: &mut Request, response: Response| Ok::<_, RequestError>(response))
}

/// Fold request interceptors into one transformer.
pub fn compose_request(interceptors: &[Arc<dyn RequestInterceptor>]) -> RequestTransformer {
    interceptors
        .iter()
        .rev()
        .fold(identity_request_transformer(), |next, interceptor| {
            let interceptor = Arc::clone(interceptor);
            Arc::new(move |request: Request| interceptor.intercept(request, &next))
        })
}

/// Fold response interceptors into one transformer.
pub fn compose_response(interceptors: &[Arc<dyn ResponseInterceptor>]) -> ResponseTransformer {
    interceptors
        .iter()
        .rev()
        .fold(identity_response_transformer(), |next, interceptor| {
            let interceptor = Arc::clone(interceptor);
            Arc::new(move |request: &mut Request, response: Response| {
                interceptor.intercept(request, response, &next)
            })
        })
}

/// Ordered interceptor registry with removal by identity.
pub struct Interceptors<I: ?Sized> {
    items: Vec<Arc<I>>,
}

impl<I: ?Sized> Interceptors<I> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn add(&mut self, interceptor: Arc<I>) {
        self.items.push(interceptor);
    }

    /// Remove `interceptor` if it was registered. Compares by identity.
    pub fn remove(&mut self, interceptor: &Arc<I>) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !Arc::ptr_eq(item, interceptor));
        before != self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Arc<I>] {
        &self.items
    }
}

impl<I: ?Sized> Default for Interceptors<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ?Sized> Clone for Interceptors<I> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<I: ?Sized> FromIterator<Arc<I>> for Interceptors<I> {
    fn from_iter<T: IntoIterator<Item = Arc<I>>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<I: ?Sized> std::fmt::Debug for Interceptors<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptors")
            .field("len", &self.items.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{manager_with, respond_with};
    use std::sync::Mutex;
    use url::Url;

    fn recording(
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    ) -> Arc<dyn RequestInterceptor> {
        Arc::new(move |request: Request, next: &RequestTransformer| -> Result<Request, RequestError> {
            log.lock().unwrap().push(format!("{label}:before"));
            let request = next(request)?;
            log.lock().unwrap().push(format!("{label}:after"));
            Ok(request)
        })
    }

    #[test]
    fn first_registered_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let transformer = compose_request(&[
            recording("a", Arc::clone(&log)),
            recording("b", Arc::clone(&log)),
        ]);
        let manager = manager_with(respond_with(200, ""));
        transformer(manager.get("https://example.com").unwrap()).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:before", "b:before", "b:after", "a:after"]
        );
    }

    #[test]
    fn interceptor_can_short_circuit() {
        let stop: Arc<dyn RequestInterceptor> =
            Arc::new(|_: Request, _: &RequestTransformer| -> Result<Request, RequestError> {
                Err(RequestError::configuration("blocked"))
            });
        let log = Arc::new(Mutex::new(Vec::new()));
        let transformer = compose_request(&[stop, recording("never", Arc::clone(&log))]);
        let manager = manager_with(respond_with(200, ""));

        assert!(transformer(manager.get("https://example.com").unwrap()).is_err());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn response_interceptors_rewrite_responses() {
        let tag: Arc<dyn ResponseInterceptor> = Arc::new(
            |request: &mut Request, response: Response, next: &ResponseTransformer| {
                next(request, response.with_header("X-Seen", "yes"))
            },
        );
        let transformer = compose_response(&[tag]);
        let manager = manager_with(respond_with(200, ""));
        let mut request = manager.get("https://example.com").unwrap();
        let response = Response::new(Url::parse("https://example.com").unwrap(), 200);

        let response = transformer(&mut request, response).unwrap();
        assert_eq!(response.header("x-seen"), ["yes"]);
    }

    #[test]
    fn registry_removes_by_identity() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = recording("a", Arc::clone(&log));
        let mut registry: Interceptors<dyn RequestInterceptor> = Interceptors::new();
        registry.add(Arc::clone(&first));
        registry.add(recording("a", log));

        assert!(registry.remove(&first));
        assert!(!registry.remove(&first));
        assert_eq!(registry.len(), 1);
    }
}
