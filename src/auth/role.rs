use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::error::ApiError;
use crate::models::{Role, User};

/// Authorization middleware: gates a route behind a statically configured
/// role allow-list.
///
/// Must run after `AuthMiddleware`, which attaches the resolved `User` to the
/// request extensions. A missing identity is a hard 401, as is a role outside
/// the allow-list; 403 is reserved for ownership violations.
pub struct RequireRole {
    allowed: &'static [Role],
}

impl RequireRole {
    pub fn any_of(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    /// Routes open to every authenticated account.
    pub fn any_role() -> Self {
        Self::any_of(&[Role::User, Role::Admin])
    }

    pub fn admin_only() -> Self {
        Self::any_of(&[Role::Admin])
    }
}

/// True when `role` appears in the route's allow-list.
pub(crate) fn role_permitted(allowed: &[Role], role: Role) -> bool {
    allowed.contains(&role)
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            allowed: self.allowed,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    allowed: &'static [Role],
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let role = req.extensions().get::<User>().map(|user| user.role);

        match role {
            Some(role) if role_permitted(self.allowed, role) => {
                Box::pin(self.service.call(req))
            }
            Some(role) => {
                let app_err = ApiError::Unauthorized(format!(
                    "role {} is not permitted on this route",
                    role
                ));
                Box::pin(async move { Err(app_err.into()) })
            }
            None => {
                // AuthMiddleware did not run or failed to attach an identity;
                // fail closed rather than assume anything about the caller.
                let app_err = ApiError::Unauthorized(
                    "no authenticated identity attached to the request".into(),
                );
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}
