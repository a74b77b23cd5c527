//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Since each worker thread processes its requests sequentially, handlers which block the current
//! thread will stop that worker from serving other requests, so anything that is not CPU-bound
//! (database access, token issuance, the order workflow) is expressed as async functions that the
//! worker can interleave.
use std::{collections::HashMap, str::FromStr};

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use travel_order_engine::{
    db_types::{NewOrder, NewUser, Order, OrderStatus, User, MAX_DESTINATION_LEN},
    order_objects::{OrderQueryFilter, Pagination},
    AuthApi,
    OrderFlowApi,
    UserManagement,
    WorkflowDatabase,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{
        CancelOrderResponse,
        IndexOrderRequest,
        LoginRequest,
        MessageResponse,
        OrderResource,
        OrdersPageResource,
        RegisterRequest,
        RegisterResponse,
        StoreOrderRequest,
        TokenResponse,
        UpdateOrderStatusRequest,
        UserResource,
    },
    errors::{AuthError, ServerError},
    helpers::{hash_password, verify_password},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal authenticated) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::BearerAuthFactory::new());
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

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

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where authenticated)  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::BearerAuthFactory::new());
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------

route!(register => Post "/register" impl UserManagement);
/// Route handler for the registration endpoint.
///
/// Creates a new account and immediately issues an access token for it. New accounts hold no
/// permissions; `view-orders`, `update-order` and `delete-order` are granted administratively.
pub async fn register<B: UserManagement>(
    body: web::Json<RegisterRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let RegisterRequest { name, email, password } = body.into_inner();
    validate_registration(&name, &email, &password)?;
    let password_hash = hash_password(&password)?;
    let user = api.register_user(NewUser::new(name, email, password_hash)).await?;
    debug!("💻️ Registered user #{}", user.id);
    let token = signer.issue_token(&user)?;
    let response =
        RegisterResponse { user: UserResource::from(&user), token: TokenResponse::bearer(token, signer.token_ttl()) };
    Ok(HttpResponse::Created().json(response))
}

fn validate_registration(name: &str, email: &str, password: &str) -> Result<(), ServerError> {
    if name.trim().is_empty() || name.len() > MAX_DESTINATION_LEN {
        return Err(ServerError::ValidationError("A name between 1 and 255 characters is required".to_string()));
    }
    if email.trim().is_empty() || !email.contains('@') {
        return Err(ServerError::ValidationError("A valid email address is required".to_string()));
    }
    if password.len() < 8 {
        return Err(ServerError::ValidationError("The password must be at least 8 characters".to_string()));
    }
    Ok(())
}

route!(login => Post "/login" impl UserManagement);
/// Route handler for the login endpoint.
///
/// Exchanges an email/password pair for a bearer token. The response does not distinguish
/// between an unknown email and a wrong password.
pub async fn login<B: UserManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let LoginRequest { email, password } = body.into_inner();
    let user = api.fetch_user_by_email(&email).await?;
    let user = match user {
        Some(user) if verify_password(&password, &user.password_hash) => user,
        _ => {
            debug!("💻️ Failed login attempt for {email}");
            return Err(ServerError::AuthenticationError(AuthError::InvalidCredentials));
        },
    };
    let token = signer.issue_token(&user)?;
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token, signer.token_ttl())))
}

route!(me => Get "/me" impl UserManagement where authenticated);
/// Returns the account behind the supplied access token, with its live permission set.
pub async fn me<B: UserManagement>(
    claims: JwtClaims,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET me for user #{}", claims.sub);
    let user = fetch_actor(&claims, api.as_ref()).await?;
    Ok(HttpResponse::Ok().json(UserResource::from(&user)))
}

route!(refresh => Post "/refresh" impl UserManagement where authenticated);
/// Issues a fresh token for the authenticated account. Permissions in the new token reflect
/// the database, not the old token.
pub async fn refresh<B: UserManagement>(
    claims: JwtClaims,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST refresh for user #{}", claims.sub);
    let user = fetch_actor(&claims, api.as_ref()).await?;
    let token = signer.issue_token(&user)?;
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token, signer.token_ttl())))
}

route!(logout => Post "/logout" authenticated);
/// Tokens are stateless, so logout is a client-side affair: the server acknowledges and the
/// client drops the token. There is no server-side denylist.
pub async fn logout(claims: JwtClaims) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST logout for user #{}", claims.sub);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Successfully logged out")))
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(orders_index => Get "/orders" impl WorkflowDatabase where authenticated);
/// Route handler for the order listing endpoint.
///
/// Users without the `view-orders` permission only ever see their own orders; users with it see
/// every order matching the filters. Supported filters: `status`, `start_date`/`end_date`
/// (both required for the range to apply), and a case-insensitive `destination` substring.
/// Results are paginated with a fixed page size; select a page with `?page=N`.
pub async fn orders_index<B: WorkflowDatabase>(
    claims: JwtClaims,
    query: web::Query<IndexOrderRequest>,
    orders: web::Data<OrderFlowApi<B>>,
    users: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for user #{}", claims.sub);
    let IndexOrderRequest { status, start_date, end_date, destination, page } = query.into_inner();
    let mut filter = OrderQueryFilter::default();
    if let Some(status) = status {
        filter.status = Some(parse_status(&status)?);
    }
    filter.start_date = start_date;
    filter.end_date = end_date;
    filter.destination = destination;
    let acting = fetch_actor(&claims, users.as_ref()).await?;
    let page = orders.search_orders(&acting, filter, &Pagination { page }).await?;
    let resources = order_resources(&page.items, users.as_ref(), &acting).await?;
    Ok(HttpResponse::Ok().json(OrdersPageResource::new(&page, resources)))
}

route!(orders_store => Post "/orders" impl WorkflowDatabase where authenticated);
/// Route handler for order creation.
///
/// The acting user becomes the order's owner and the order starts out `requested`. Dates are
/// ISO (`yyyy-mm-dd`) on the way in and `dd/mm/yyyy` on the way out.
pub async fn orders_store<B: WorkflowDatabase>(
    claims: JwtClaims,
    body: web::Json<StoreOrderRequest>,
    orders: web::Data<OrderFlowApi<B>>,
    users: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST orders for user #{}", claims.sub);
    let StoreOrderRequest { destination, departure_date, return_date } = body.into_inner();
    let acting = fetch_actor(&claims, users.as_ref()).await?;
    let order = orders.place_order(&acting, NewOrder::new(destination, departure_date, return_date)).await?;
    Ok(HttpResponse::Created().json(OrderResource::new(&order, &acting)))
}

route!(order_show => Get "/orders/{id}" impl WorkflowDatabase where authenticated);
/// Route handler for fetching a single order. Owners can always see their own orders; anyone
/// else needs `view-orders`.
pub async fn order_show<B: WorkflowDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    orders: web::Data<OrderFlowApi<B>>,
    users: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id} for user #{}", claims.sub);
    let acting = fetch_actor(&claims, users.as_ref()).await?;
    let order = orders.fetch_order(&acting, order_id).await?;
    let owner = owner_of(&order, users.as_ref(), &acting).await?;
    Ok(HttpResponse::Ok().json(OrderResource::new(&order, &owner)))
}

route!(order_update_status => Patch "/orders/{id}" impl WorkflowDatabase where authenticated);
/// Route handler for the status update endpoint.
///
/// Accepts exactly `requested`, `approved` or `canceled`; anything else is a 422. The acting
/// user must hold `update-order` and must not own the order. Setting the current status again
/// is a quiet no-op. When the new status is `approved` or `canceled`, the owner is notified
/// by email after the write commits.
pub async fn order_update_status<B: WorkflowDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateOrderStatusRequest>,
    orders: web::Data<OrderFlowApi<B>>,
    users: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let new_status = parse_status(&body.status)?;
    info!("💻️ Update order #{order_id} to {new_status} requested by user #{}", claims.sub);
    let acting = fetch_actor(&claims, users.as_ref()).await?;
    let order = orders.update_status(&acting, order_id, new_status).await.map_err(|e| {
        debug!("💻️ Could not update order status. {e}");
        e
    })?;
    let owner = owner_of(&order, users.as_ref(), &acting).await?;
    Ok(HttpResponse::Ok().json(OrderResource::new(&order, &owner)))
}

route!(order_cancel => Post "/orders/{id}/cancel" impl WorkflowDatabase where authenticated);
/// Route handler for order cancellation.
///
/// Owners can cancel their own requested orders; canceling an approved order takes the
/// `delete-order` permission, and an already-canceled order cannot be canceled again (422).
/// A successful cancellation notifies the owner.
pub async fn order_cancel<B: WorkflowDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    orders: web::Data<OrderFlowApi<B>>,
    users: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    info!("💻️ Cancel order #{order_id} requested by user #{}", claims.sub);
    let acting = fetch_actor(&claims, users.as_ref()).await?;
    let order = orders.cancel_order(&acting, order_id).await.map_err(|e| {
        debug!("💻️ Could not cancel order. {e}");
        e
    })?;
    let owner = owner_of(&order, users.as_ref(), &acting).await?;
    let response = CancelOrderResponse {
        message: "Order canceled successfully".to_string(),
        data: OrderResource::new(&order, &owner),
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Helpers  ----------------------------------------------------

fn parse_status(status: &str) -> Result<OrderStatus, ServerError> {
    OrderStatus::from_str(status).map_err(|e| ServerError::ValidationError(e.to_string()))
}

/// Resolves the acting user from the token's subject. The database is the source of truth for
/// permissions, so a grant or revoke applies to requests made with older tokens too.
async fn fetch_actor<B: UserManagement>(claims: &JwtClaims, api: &AuthApi<B>) -> Result<User, ServerError> {
    api.fetch_user(claims.sub).await?.ok_or_else(|| {
        debug!("💻️ Token subject #{} does not match any account", claims.sub);
        ServerError::AuthenticationError(AuthError::AccountNotFound)
    })
}

async fn owner_of<B: UserManagement>(order: &Order, api: &AuthApi<B>, acting: &User) -> Result<User, ServerError> {
    if order.user_id == acting.id {
        return Ok(acting.clone());
    }
    api.fetch_user(order.user_id).await?.ok_or_else(|| {
        ServerError::BackendError(format!("Order #{} refers to missing user #{}", order.id, order.user_id))
    })
}

/// Builds order resources for a page of search results, fetching each distinct owner once.
async fn order_resources<B: UserManagement>(
    orders: &[Order],
    api: &AuthApi<B>,
    acting: &User,
) -> Result<Vec<OrderResource>, ServerError> {
    let mut owners: HashMap<i64, User> = HashMap::new();
    owners.insert(acting.id, acting.clone());
    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        if !owners.contains_key(&order.user_id) {
            let owner = api.fetch_user(order.user_id).await?.ok_or_else(|| {
                ServerError::BackendError(format!("Order #{} refers to missing user #{}", order.id, order.user_id))
            })?;
            owners.insert(order.user_id, owner);
        }
        result.push(OrderResource::new(order, &owners[&order.user_id]));
    }
    Ok(result)
}
