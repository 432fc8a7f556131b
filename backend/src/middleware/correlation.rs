//! Middleware scoping each request to a delivery correlation identifier.
//!
//! The event-delivery layer names each delivery in the CloudEvents `ce-id`
//! header, and redeliveries of one document reuse it. That value becomes
//! the request's [`CorrelationId`]; requests without one get a fresh UUID.
//! Every response echoes the identifier in a `correlation-id` header.

use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::error;

use crate::domain::CorrelationId;

/// Request header carrying the delivery id.
pub const DELIVERY_ID_HEADER: &str = "ce-id";

/// Response header echoing the correlation id.
pub const CORRELATION_ID_HEADER: &str = "correlation-id";

/// Correlation middleware.
///
/// Handlers can read the identifier via [`CorrelationId::current`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use vericlean::middleware::Correlation;
///
/// let app = App::new().wrap(Correlation);
/// ```
#[derive(Clone)]
pub struct Correlation;

impl<S, B> Transform<S, ServiceRequest> for Correlation
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CorrelationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorrelationMiddleware { service }))
    }
}

/// Service wrapper produced by [`Correlation`].
pub struct CorrelationMiddleware<S> {
    service: S,
}

fn delivery_id(req: &ServiceRequest) -> Option<CorrelationId> {
    req.headers()
        .get(DELIVERY_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(CorrelationId::from_delivery)
}

impl<S, B> Service<ServiceRequest> for CorrelationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let correlation_id = delivery_id(&req).unwrap_or_else(CorrelationId::generate);
        let header_value = correlation_id.to_string();
        let fut = self.service.call(req);
        Box::pin(CorrelationId::scope(correlation_id, async move {
            let mut res = fut.await?;
            match HeaderValue::from_str(&header_value) {
                Ok(value) => {
                    res.response_mut()
                        .headers_mut()
                        .insert(HeaderName::from_static(CORRELATION_ID_HEADER), value);
                }
                Err(error) => {
                    error!(
                        %error,
                        correlation_id = %header_value,
                        "failed to encode correlation identifier header"
                    );
                }
            }
            Ok(res)
        }))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use actix_web::{App, HttpResponse, test, web};

    async fn echo() -> HttpResponse {
        let id = CorrelationId::current().map(|id| id.to_string());
        HttpResponse::Ok().body(id.unwrap_or_default())
    }

    async fn call(req: test::TestRequest) -> (String, String) {
        let app = test::init_service(
            App::new()
                .wrap(Correlation)
                .route("/", web::post().to(echo)),
        )
        .await;
        let res = test::call_service(&app, req.uri("/").to_request()).await;
        let header = res
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("correlation header")
            .to_str()
            .expect("header is ascii")
            .to_owned();
        let body = test::read_body(res).await;
        let body = std::str::from_utf8(&body).expect("utf8 body").to_owned();
        (header, body)
    }

    #[actix_web::test]
    async fn adopts_delivery_id() {
        let (header, body) = call(
            test::TestRequest::post().insert_header((DELIVERY_ID_HEADER, "delivery-42")),
        )
        .await;
        assert_eq!(header, "delivery-42");
        assert_eq!(body, "delivery-42");
    }

    #[actix_web::test]
    async fn generates_id_without_delivery_header() {
        let (header, body) = call(test::TestRequest::post()).await;
        assert!(uuid::Uuid::parse_str(&header).is_ok());
        assert_eq!(header, body);
    }

    #[actix_web::test]
    async fn ignores_unusable_delivery_ids() {
        let (header, _) = call(
            test::TestRequest::post().insert_header((DELIVERY_ID_HEADER, "has space")),
        )
        .await;
        assert_ne!(header, "has space");
    }
}
