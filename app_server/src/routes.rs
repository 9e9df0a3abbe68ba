//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into
//! a separate module. Keep this module neat and tidy 🙏
//!
//! Every handler that takes a POST body extracts it as [`web::Bytes`]: the signature covers the
//! body bytes exactly as the platform sent them, so the body is verified first and only then
//! parsed, from the same buffer.

use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use platform_tools::TokenCache;
use trust_engine::{CredentialApi, CredentialStore, NewTenant, SignatureVerificationError, VerificationApi, SIGNATURE_HEADER};

use crate::{
    config::ServerOptions,
    data_objects::{ActionRequest, ConfirmationRequest, JsonResponse, RegistrationResponse, WebhookRequest},
    dispatcher::Dispatcher,
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Liveness probe.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("👍️\n")
}

route!(register => Get "/setup/register" impl CredentialStore);
/// First step of the registration handshake.
///
/// The request is query-signed with the app secret, since no tenant secret exists yet. On
/// success the tenant gets its freshly issued shared secret, the proof digest, and the URL to
/// POST the confirmation to.
pub async fn register<B: CredentialStore>(
    req: HttpRequest,
    verifier: web::Data<VerificationApi<B>>,
    credentials: web::Data<CredentialApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    trace!("🤝 Registration request: {}", req.query_string());
    verifier.verify_app_query(req.query_string())?;
    let tenant = web::Query::<NewTenant>::from_query(req.query_string())
        .map_err(|e| ServerError::CouldNotDeserializePayload(e.to_string()))?
        .into_inner();
    let outcome = credentials.register(tenant).await?;
    let response = RegistrationResponse {
        proof: outcome.proof,
        secret: outcome.shared_secret.reveal().clone(),
        confirmation_url: options.confirmation_url(),
    };
    Ok(HttpResponse::Ok().json(response))
}

route!(confirm => Post "/setup/register-confirm" impl CredentialStore);
/// Second step of the handshake: the platform posts the OAuth client pair, signed with the
/// shared secret issued at registration.
///
/// The body is not an envelope, so it is parsed for the tenant id before verification; a body
/// that cannot be parsed is indistinguishable from a forged one.
pub async fn confirm<B: CredentialStore>(
    req: HttpRequest,
    body: web::Bytes,
    verifier: web::Data<VerificationApi<B>>,
    credentials: web::Data<CredentialApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let confirmation: ConfirmationRequest =
        serde_json::from_slice(&body).map_err(SignatureVerificationError::new)?;
    let signature = signature_header(&req);
    verifier.verify_payload_for(&confirmation.tenant_id, &body, &signature).await?;
    credentials.confirm(&confirmation.tenant_id, confirmation.api_key, confirmation.api_secret).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("registration confirmed")))
}

route!(webhook => Post "/webhook" impl CredentialStore);
/// Webhook ingress. Payload-mode verification against the tenant's shared secret, then dispatch
/// on `data.event`.
pub async fn webhook<B: CredentialStore>(
    req: HttpRequest,
    body: web::Bytes,
    verifier: web::Data<VerificationApi<B>>,
    credentials: web::Data<CredentialApi<B>>,
    dispatcher: web::Data<Dispatcher>,
    tokens: web::Data<TokenCache>,
) -> Result<HttpResponse, ServerError> {
    let signature = signature_header(&req);
    verifier.verify_payload(&body, &signature).await?;
    let request: WebhookRequest =
        serde_json::from_slice(&body).map_err(|e| ServerError::CouldNotDeserializePayload(e.to_string()))?;
    dispatcher.dispatch_webhook(request, credentials.get_ref(), tokens.clone().into_inner()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("webhook processed")))
}

route!(action => Post "/action" impl CredentialStore);
/// Admin action ingress. Verified like a webhook, dispatched on the `(entity, action)` pair.
pub async fn action<B: CredentialStore>(
    req: HttpRequest,
    body: web::Bytes,
    verifier: web::Data<VerificationApi<B>>,
    credentials: web::Data<CredentialApi<B>>,
    dispatcher: web::Data<Dispatcher>,
    tokens: web::Data<TokenCache>,
) -> Result<HttpResponse, ServerError> {
    let signature = signature_header(&req);
    verifier.verify_payload(&body, &signature).await?;
    let request: ActionRequest =
        serde_json::from_slice(&body).map_err(|e| ServerError::CouldNotDeserializePayload(e.to_string()))?;
    dispatcher.dispatch_action(request, credentials.get_ref(), tokens.clone().into_inner()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("action processed")))
}

route!(page => Get "/page" impl CredentialStore);
/// Embedded page loads. Query-mode verification against the tenant's shared secret; the page
/// content itself is the embedding application's concern, so a verified request just gets an ack.
pub async fn page<B: CredentialStore>(
    req: HttpRequest,
    verifier: web::Data<VerificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    verifier.verify_tenant_query(req.query_string()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("ok")))
}

/// The payload signature header, or the empty string when absent. Verification of an empty
/// signature fails in the usual opaque way.
fn signature_header(req: &HttpRequest) -> String {
    req.headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
