//! Request handlers for the server.
//!
//! The webhook handler is deliberately forgiving in what it answers: the gateway retries any
//! non-2xx response, so only genuinely retryable conditions (storage failures) may surface as
//! 5xx. Everything else is acknowledged with a 200 and a [`JsonResponse`] describing the outcome.

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use split_payment_engine::{
    db_types::Order,
    helpers::best_effort,
    traits::{Notifier, PayoutProvider, SettlementDatabase, SettlementError},
    CancelOutcome,
    PaidOutcome,
    SettlementApi,
    SettlementFlowApi,
};

use crate::{
    data_objects::JsonResponse,
    errors::ServerError,
    webhook_objects::{WebhookEnvelope, WebhookEvent},
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

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(payment_webhook => Post "/payments" impl SettlementDatabase, PayoutProvider, Notifier);
/// Route handler for payment-link webhook events from the gateway.
///
/// The HMAC middleware has already authenticated the request by the time this handler runs. Paid
/// events feed the co-payment state machine (or the single-payment path when the link's notes
/// carry an order number); cancellation and expiry events terminally kill the link. When an order
/// materializes, the payout split and notifications are fired best-effort: once the order exists,
/// nothing may fail the webhook response.
pub async fn payment_webhook<B, P, N>(
    req: HttpRequest,
    body: web::Json<WebhookEnvelope>,
    flow: web::Data<SettlementFlowApi<B>>,
    settlement: web::Data<SettlementApi<B, P>>,
    notifier: web::Data<N>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    P: PayoutProvider,
    N: Notifier,
{
    trace!("🔀️ Received webhook request: {}", req.uri());
    let result = match body.into_inner().classify() {
        WebhookEvent::LinkPaid { link_id, payment_id, order_note } => {
            handle_link_paid(&link_id, payment_id.as_deref(), order_note.as_deref(), &flow, &settlement, notifier.get_ref())
                .await?
        },
        WebhookEvent::LinkCancelled { link_id, order_note } => {
            handle_link_cancelled(&link_id, order_note.as_deref(), &flow).await?
        },
        WebhookEvent::Ignored { kind } => {
            debug!("🔀️ Ignoring webhook event of kind {kind}.");
            JsonResponse::success(format!("Event {kind} ignored."))
        },
    };
    Ok(HttpResponse::Ok().json(result))
}

async fn handle_link_paid<B, P, N>(
    link_id: &str,
    payment_id: Option<&str>,
    order_note: Option<&str>,
    flow: &SettlementFlowApi<B>,
    settlement: &SettlementApi<B, P>,
    notifier: &N,
) -> Result<JsonResponse, ServerError>
where
    B: SettlementDatabase,
    P: PayoutProvider,
    N: Notifier,
{
    match flow.process_link_paid(link_id, payment_id, order_note).await {
        Ok(PaidOutcome::ContributorConfirmed { order: Some(order), newly_materialized: true, .. }) => {
            info!("🔀️ Co-payment complete. Order {} has been created.", order.order_number);
            settle_and_notify(&order, settlement, notifier).await;
            Ok(JsonResponse::success(format!("Order {} created.", order.order_number)))
        },
        Ok(PaidOutcome::ContributorConfirmed { order: Some(order), .. }) => {
            Ok(JsonResponse::success(format!("Order {} already exists.", order.order_number)))
        },
        Ok(PaidOutcome::ContributorConfirmed { co_payment, replayed, .. }) => {
            let message = if replayed {
                format!("Contribution to co-payment #{} was already recorded.", co_payment.id)
            } else {
                format!("Contribution to co-payment #{} recorded.", co_payment.id)
            };
            Ok(JsonResponse::success(message))
        },
        Ok(PaidOutcome::SingleOrderPaid { order, replayed: false }) => {
            settle_and_notify(&order, settlement, notifier).await;
            Ok(JsonResponse::success(format!("Order {} paid.", order.order_number)))
        },
        Ok(PaidOutcome::SingleOrderPaid { order, replayed: true }) => {
            Ok(JsonResponse::success(format!("Order {} was already paid.", order.order_number)))
        },
        Ok(PaidOutcome::Unroutable { link_id }) => {
            Ok(JsonResponse::success(format!("Link {link_id} is not known here. Event dropped.")))
        },
        // 5xx: the gateway will redeliver the event once storage recovers.
        Err(SettlementError::DatabaseError(e)) => Err(ServerError::BackendError(e)),
        Err(e) => {
            warn!("🔀️ Paid event for link [{link_id}] was not applied. {e}");
            Ok(JsonResponse::failure(e))
        },
    }
}

async fn handle_link_cancelled<B: SettlementDatabase>(
    link_id: &str,
    order_note: Option<&str>,
    flow: &SettlementFlowApi<B>,
) -> Result<JsonResponse, ServerError> {
    match flow.process_link_cancelled(link_id, order_note).await {
        Ok(CancelOutcome::ContributorCancelled(contributor)) => {
            Ok(JsonResponse::success(format!("Payment link of {} cancelled.", contributor.email)))
        },
        Ok(CancelOutcome::SingleOrderCancelled(order)) => {
            Ok(JsonResponse::success(format!("Order {} cancelled.", order.order_number)))
        },
        Ok(CancelOutcome::SingleOrderAlreadyPaid(order)) => {
            Ok(JsonResponse::success(format!("Order {} was already paid. Cancellation ignored.", order.order_number)))
        },
        Ok(CancelOutcome::Unroutable { link_id }) => {
            Ok(JsonResponse::success(format!("Link {link_id} is not known here. Event dropped.")))
        },
        Err(SettlementError::DatabaseError(e)) => Err(ServerError::BackendError(e)),
        Err(e) => {
            warn!("🔀️ Cancelled event for link [{link_id}] was not applied. {e}");
            Ok(JsonResponse::failure(e))
        },
    }
}

/// Fires the payout split and both notifications for a freshly paid order. Every step is
/// best-effort: failures are logged and swallowed, and reconciliation happens out of band.
async fn settle_and_notify<B, P, N>(order: &Order, settlement: &SettlementApi<B, P>, notifier: &N)
where
    B: SettlementDatabase,
    P: PayoutProvider,
    N: Notifier,
{
    best_effort("settlement", settlement.settle(order)).await;
    best_effort("customer notification", notifier.notify_customer(order)).await;
    best_effort("vendor notification", notifier.notify_vendor(order)).await;
}
