use crate::error::AppError;
use crate::security::{SessionKeys, SessionUser};
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

/// Decodes the session cookie, if any, into a [`SessionUser`] extension.
/// A missing or invalid cookie leaves the request anonymous.
#[derive(Clone)]
pub struct SessionMiddleware {
    keys: Rc<SessionKeys>,
}

impl SessionMiddleware {
    pub fn new(keys: SessionKeys) -> Self {
        Self { keys: Rc::new(keys) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
    keys: Rc<SessionKeys>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
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
        let service = self.service.clone();
        let viewer = req
            .cookie(self.keys.cookie_name())
            .and_then(|cookie| self.keys.validate(cookie.value()));

        Box::pin(async move {
            if let Some(user) = viewer {
                req.extensions_mut().insert(user);
            }
            service.call(req).await
        })
    }
}

/// The signed-in user, if there is one
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<SessionUser>);

impl Viewer {
    pub fn user(&self) -> Option<&SessionUser> {
        self.0.as_ref()
    }
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Viewer(req.extensions().get::<SessionUser>().cloned())))
    }
}

/// The signed-in user; guests are redirected to the login form
#[derive(Debug, Clone)]
pub struct LoginRequired(pub SessionUser);

impl FromRequest for LoginRequired {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<SessionUser>().cloned();
        ready(match user {
            Some(user) => Ok(LoginRequired(user)),
            None => {
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| req.path().to_string());
                Err(AppError::LoginRequired { next })
            }
        })
    }
}
