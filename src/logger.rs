use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderName, HeaderValue},
    Error,
};
use futures::future::LocalBoxFuture;
use log::{info, warn};
use std::rc::Rc;
use std::time::Instant;

use crate::error::scope_request_id;

/// Response header carrying the id a request was logged under
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request logging middleware
///
/// Records method, path, status and latency of every request, plus the
/// authorization scheme that was presented. The credential itself is
/// never logged. Each request runs under a fresh request id, echoed in
/// the `x-request-id` response header and in the `error_id` of error
/// bodies.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

/// Scheme word of an `Authorization` value, or `none`
fn presented_scheme(value: Option<&str>) -> &'static str {
    match value.and_then(|v| v.split_whitespace().next()) {
        Some("Bearer") => "bearer",
        Some("ApiKey") => "api_key",
        Some(_) => "other",
        None => "none",
    }
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let scheme = presented_scheme(
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok()),
        );

        let request_id = uuid::Uuid::new_v4().to_string();

        info!(
            "Request started: {} {} (auth: {}, request_id: {})",
            method, path, scheme, request_id
        );

        let service = self.service.clone();

        Box::pin(scope_request_id(request_id.clone(), async move {
            let mut res = service.call(req).await?;
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            let elapsed = start_time.elapsed();
            let status = res.status();

            if status.is_client_error() || status.is_server_error() {
                warn!(
                    "Request failed: {} {} - Status: {} ({}ms)",
                    method,
                    path,
                    status.as_u16(),
                    elapsed.as_millis()
                );
            } else {
                info!(
                    "Request completed: {} {} - Status: {} ({}ms)",
                    method,
                    path,
                    status.as_u16(),
                    elapsed.as_millis()
                );
            }

            Ok(res)
        }))
    }
}
