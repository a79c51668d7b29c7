use crate::error::RequestError;
use crate::execution::interceptor::{ResponseInterceptor, ResponseTransformer};
use crate::execution::task::RequestTask;
use crate::http::headers::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_LOCATION, CONTENT_TYPE, LOCATION};
use crate::http::{Method, Request, Response};

/// Default cap on the number of redirects followed for one request.
pub const DEFAULT_MAX_REDIRECTS: u32 = 20;

/// Status codes after which the follow-up request becomes a GET.
const REDIRECT_TO_GET: [u16; 3] = [301, 302, 303];

/// Number of redirects followed so far, stored on redirected requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedirectHistory {
    pub hops: u32,
}

/// Follows 3xx responses that carry a `Location` or `Content-Location`.
///
/// The follow-up request copies the headers, dropping `Authorization` when
/// the host changes. 301, 302 and 303 switch to GET (HEAD stays HEAD);
/// other codes keep the method and forward an unconsumed body.
#[derive(Debug, Clone, Copy)]
pub struct RedirectInterceptor {
    max_redirects: u32,
}

impl Default for RedirectInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl RedirectInterceptor {
    pub const fn new() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub const fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    fn follow_up(&self, request: &mut Request, response: &Response, hops: u32) -> Result<Request, String> {
        let location = [LOCATION, CONTENT_LOCATION]
            .into_iter()
            .find_map(|name| response.headers().get_last(name).filter(|v| !v.is_empty()))
            .ok_or_else(|| "missing location".to_string())?;
        let target = request
            .url()
            .join(location)
            .map_err(|e| format!("invalid redirect location `{location}`: {e}"))?;

        let method = if REDIRECT_TO_GET.contains(&response.status_code())
            && request.method() != Method::Head
        {
            Method::Get
        } else {
            request.method()
        };

        let mut headers = request.headers().clone();
        if target.host_str() != request.url().host_str() {
            headers.remove(AUTHORIZATION);
        }

        let same_method = method == request.method();
        if same_method && request.body().is_consumed() {
            return Err(format!(
                "cannot forward the already sent request body to `{target}`; \
                 use a repeatable body to follow {} redirects",
                response.status_code()
            ));
        }

        let mut redirected = Request::new(method, target, request.execution_options().for_redirect());
        let forward_body = same_method && !request.body().is_empty();
        if forward_body {
            redirected.set_body(request.take_body());
        } else {
            headers.remove(CONTENT_LENGTH);
            if method != request.method() {
                headers.remove(CONTENT_TYPE);
            }
        }
        *redirected.headers_mut() = headers;
        redirected.capabilities_mut().insert(RedirectHistory { hops });
        Ok(redirected)
    }
}

impl ResponseInterceptor for RedirectInterceptor {
    fn intercept(
        &self,
        request: &mut Request,
        response: Response,
        next: &ResponseTransformer,
    ) -> Result<Response, RequestError> {
        let follow = response.is_redirection()
            && request.execution_options().allow_redirects != Some(false)
            && (response.headers().contains(LOCATION) || response.headers().contains(CONTENT_LOCATION));
        if !follow {
            return next(request, response);
        }

        let hops = request
            .capabilities()
            .get::<RedirectHistory>()
            .map_or(0, |history| history.hops)
            + 1;
        if hops > self.max_redirects {
            return Err(RequestError::redirect(
                format!("exceeded {} redirects", self.max_redirects),
                Some(response),
            ));
        }

        let redirected = match self.follow_up(request, &response, hops) {
            Ok(redirected) => redirected,
            Err(message) => return Err(RequestError::redirect(message, Some(response))),
        };

        tracing::debug!(
            target: "courier::redirect",
            status = response.status_code(),
            from = %request.url(),
            to = %redirected.url(),
            method = %redirected.method(),
            hops,
            "following redirect"
        );

        let followed = RequestTask::new(redirected).call()?;
        next(request, followed)
    }
}
