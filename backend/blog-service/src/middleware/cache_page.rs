use crate::security::SessionUser;
use actix_web::body::{self, BoxBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::{header, Method, StatusCode};
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::LocalBoxFuture;
use page_cache::{CacheKey, CachedPage, PageCache};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Caches successful GET/HEAD responses of the wrapped routes for `ttl`.
///
/// The key covers the method, the full path with query string and the
/// viewer (anonymous or user id), so signed-in users never see a page
/// rendered for someone else. Cache failures fall through to the handler.
#[derive(Clone)]
pub struct CachePage {
    cache: Arc<dyn PageCache>,
    prefix: Rc<str>,
    ttl: Duration,
}

impl CachePage {
    pub fn new(cache: Arc<dyn PageCache>, prefix: &str, ttl: Duration) -> Self {
        Self {
            cache,
            prefix: Rc::from(prefix),
            ttl,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CachePage
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = CachePageService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CachePageService {
            service: Rc::new(service),
            cache: self.cache.clone(),
            prefix: self.prefix.clone(),
            ttl: self.ttl,
        }))
    }
}

pub struct CachePageService<S> {
    service: Rc<S>,
    cache: Arc<dyn PageCache>,
    prefix: Rc<str>,
    ttl: Duration,
}

fn vary_for(req: &ServiceRequest) -> String {
    match req.extensions().get::<SessionUser>() {
        Some(user) => format!("user:{}", user.id),
        None => "anon".to_string(),
    }
}

fn cached_response(page: CachedPage) -> HttpResponse {
    let status = StatusCode::from_u16(page.status).unwrap_or(StatusCode::OK);
    let mut builder = HttpResponse::build(status);
    if let Some(content_type) = page.content_type {
        builder.insert_header((header::CONTENT_TYPE, content_type));
    }
    builder.body(page.body)
}

impl<S, B> Service<ServiceRequest> for CachePageService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let cache = self.cache.clone();
        let ttl = self.ttl;

        let cacheable = matches!(*req.method(), Method::GET | Method::HEAD);
        let key = CacheKey::page(
            &self.prefix,
            req.method().as_str(),
            &vary_for(&req),
            req.uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or_else(|| req.path()),
        );

        Box::pin(async move {
            if !cacheable {
                return Ok(service.call(req).await?.map_into_boxed_body());
            }

            match cache.get(&key).await {
                Ok(Some(page)) => return Ok(req.into_response(cached_response(page))),
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "Page cache read failed"),
            }

            let res = service.call(req).await?;
            if res.status() != StatusCode::OK {
                return Ok(res.map_into_boxed_body());
            }

            let (req, res) = res.into_parts();
            let content_type = res
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let (res, body) = res.into_parts();
            let bytes = body::to_bytes(body).await.map_err(|e| {
                let err: Box<dyn std::error::Error> = e.into();
                actix_web::error::ErrorInternalServerError(err.to_string())
            })?;

            let page = CachedPage::new(StatusCode::OK.as_u16(), content_type, bytes.to_vec());
            if let Err(e) = cache.set(&key, &page, ttl).await {
                warn!(key = %key, error = %e, "Page cache write failed");
            }

            let res = res.set_body(bytes).map_into_boxed_body();
            Ok(ServiceResponse::new(req, res))
        })
    }
}
