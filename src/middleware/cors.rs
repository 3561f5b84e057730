use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{self, HeaderValue},
        Method,
    },
    Error, HttpResponse,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::config::CorsOrigins;

pub const ALLOWED_METHODS: &str = "GET,POST,OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type,Authorization";

/// Answers every `OPTIONS` request with a 204 preflight and stamps
/// `Access-Control-Allow-Origin` on all other responses.
#[derive(Clone)]
pub struct CorsMiddleware {
    origins: CorsOrigins,
}

impl CorsMiddleware {
    pub fn new(origins: CorsOrigins) -> Self {
        Self { origins }
    }
}

/// Value for `Access-Control-Allow-Origin`, or `None` when the origin is not allowed.
fn allow_origin(origins: &CorsOrigins, request_origin: Option<&str>) -> Option<String> {
    match origins {
        CorsOrigins::Any => Some("*".to_string()),
        CorsOrigins::List(allowed) => {
            let origin = request_origin?.trim_end_matches('/');
            allowed
                .iter()
                .any(|a| a.eq_ignore_ascii_case(origin))
                .then(|| origin.to_string())
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CorsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsMiddlewareService {
            service,
            origins: self.origins.clone(),
        }))
    }
}

pub struct CorsMiddlewareService<S> {
    service: S,
    origins: CorsOrigins,
}

impl<S, B> Service<ServiceRequest> for CorsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request_origin = req
            .headers()
            .get(header::ORIGIN)
            .and_then(|o| o.to_str().ok())
            .map(str::to_string);
        let allowed = allow_origin(&self.origins, request_origin.as_deref())
            .and_then(|o| HeaderValue::from_str(&o).ok());
        let echoes_origin = matches!(self.origins, CorsOrigins::List(_));

        if req.method() == Method::OPTIONS {
            let mut preflight = HttpResponse::NoContent();
            preflight
                .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS))
                .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS))
                .insert_header((header::ACCESS_CONTROL_MAX_AGE, "3600"));
            if let Some(origin) = allowed {
                preflight.insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin));
            }
            if echoes_origin {
                preflight.insert_header((header::VARY, "Origin"));
            }
            let response = req.into_response(preflight.finish()).map_into_right_body();
            return Box::pin(ready(Ok(response)));
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            if let Some(origin) = allowed {
                res.headers_mut()
                    .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            }
            if echoes_origin {
                res.headers_mut()
                    .insert(header::VARY, HeaderValue::from_static("Origin"));
            }
            Ok(res.map_into_left_body())
        })
    }
}
