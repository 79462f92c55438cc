use crate::error::ApiError;
use crate::orm::{auth_tokens, users};
use actix_web::dev::{self, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use std::rc::Rc;

/// Keyword expected in front of the key in the `Authorization` header.
const TOKEN_KEYWORD: &str = "token";

/// Client data stored for a single request cycle.
#[derive(Clone, Debug, Default)]
pub struct ClientCtxInner {
    /// User data. None is an anonymous requester.
    pub client: Option<users::Model>,
    /// Set when an `Authorization: Token` header was sent but did not resolve.
    pub token_rejected: bool,
    /// Set when the token could not be checked because the database failed.
    pub lookup_failed: bool,
}

impl ClientCtxInner {
    /// Resolves the requester from the `Authorization` header value, if any.
    pub async fn from_header(db: &DatabaseConnection, header: Option<&str>) -> Self {
        let key = match header.map(parse_token_header) {
            None | Some(Ok(None)) => return Self::default(),
            Some(Ok(Some(key))) => key,
            Some(Err(())) => return Self::rejected(),
        };

        match authenticate_by_token(db, key).await {
            Ok(Some(user)) => Self {
                client: Some(user),
                ..Self::default()
            },
            Ok(None) => Self::rejected(),
            Err(err) => {
                log::error!("Unable to look up auth token: {}", err);
                Self {
                    lookup_failed: true,
                    ..Self::default()
                }
            }
        }
    }

    fn rejected() -> Self {
        Self {
            token_rejected: true,
            ..Self::default()
        }
    }
}

/// Splits `Token <key>` into the key.
///
/// Headers using another scheme are ignored (`Ok(None)`). A `Token` header
/// with a missing or malformed key is an error.
pub fn parse_token_header(value: &str) -> Result<Option<&str>, ()> {
    let mut parts = value.split_whitespace();
    match parts.next() {
        Some(keyword) if keyword.eq_ignore_ascii_case(TOKEN_KEYWORD) => {}
        _ => return Ok(None),
    }

    match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(Some(key)),
        _ => Err(()),
    }
}

/// Looks up the owner of an auth token.
pub async fn authenticate_by_token(
    db: &DatabaseConnection,
    key: &str,
) -> Result<Option<users::Model>, DbErr> {
    let found = auth_tokens::Entity::find_by_id(key.to_owned())
        .find_also_related(users::Entity)
        .one(db)
        .await?;

    Ok(found.and_then(|(_, user)| user))
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.0.client.as_ref().map(|u| u.id)
    }

    pub fn get_user(&self) -> Option<&users::Model> {
        self.0.client.as_ref()
    }

    /// Require user to be logged in. Returns user_id or NotAuthenticated.
    pub fn require_login(&self) -> Result<i32, ApiError> {
        self.get_id().ok_or(ApiError::NotAuthenticated)
    }

    /// Require ownership of a resource. Returns () or PermissionDenied.
    pub fn require_ownership(&self, owner_id: i32) -> Result<(), ApiError> {
        let user_id = self.require_login()?;
        if user_id == owner_id {
            Ok(())
        } else {
            Err(ApiError::PermissionDenied)
        }
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let inner = req.extensions().get::<Data<ClientCtxInner>>().cloned();
        match inner {
            Some(inner) if inner.lookup_failed => ready(Err(ApiError::Internal(
                "Unable to look up auth token".to_owned(),
            )
            .into())),
            Some(inner) if inner.token_rejected => ready(Err(ApiError::InvalidToken.into())),
            Some(inner) => ready(Ok(Self(inner))),
            // Middleware not mounted; treat as anonymous.
            None => ready(Ok(Self::default())),
        }
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        Box::pin(async move {
            // Without a database there is no one to authenticate.
            if let Some(db) = req.app_data::<Data<DatabaseConnection>>().cloned() {
                let header = req
                    .headers()
                    .get(actix_web::http::header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);

                let inner = ClientCtxInner::from_header(&db, header.as_deref()).await;
                if inner.token_rejected {
                    log::debug!("Rejected auth token for {}", req.path());
                }
                req.extensions_mut().insert(Data::new(inner));
            }

            svc.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_header() {
        assert_eq!(parse_token_header("Token abc123"), Ok(Some("abc123")));
        assert_eq!(parse_token_header("token abc123"), Ok(Some("abc123")));
        assert_eq!(parse_token_header("Bearer abc123"), Ok(None));
        assert_eq!(parse_token_header(""), Ok(None));
        assert_eq!(parse_token_header("Token"), Err(()));
        assert_eq!(parse_token_header("Token abc 123"), Err(()));
    }

    #[test]
    fn test_guest_context() {
        let client = ClientCtx::default();
        assert!(client.get_user().is_none());
        assert!(matches!(
            client.require_login(),
            Err(ApiError::NotAuthenticated)
        ));
        assert!(matches!(
            client.require_ownership(1),
            Err(ApiError::NotAuthenticated)
        ));
    }

    async fn context_for(inner: ClientCtxInner) -> Result<ClientCtx, Error> {
        let req = actix_web::test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(Data::new(inner));
        ClientCtx::from_request(&req, &mut Payload::None).await
    }

    #[actix_rt::test]
    async fn test_lookup_failure_is_server_error() {
        // No schema, so the token query fails.
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();

        let inner = ClientCtxInner::from_header(&db, Some("Token abc123")).await;
        assert!(inner.lookup_failed);
        assert!(!inner.token_rejected);

        let err = context_for(inner).await.unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_rt::test]
    async fn test_rejected_token_is_unauthorized() {
        let err = context_for(ClientCtxInner::rejected()).await.unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            actix_web::http::StatusCode::UNAUTHORIZED
        );
    }
}
