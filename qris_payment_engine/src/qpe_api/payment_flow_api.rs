use std::fmt::Debug;

use chrono::Duration;
use log::*;
use qpg_common::Rupiah;
use serde::Serialize;

use crate::{
    codec::{convert_to_dynamic, validate, ServiceFee},
    db_types::{ExpectationStatus, MatchType, NewExpectation, PaymentExpectation, PaymentNotification},
    events::{EventProducers, PaymentMatchedEvent},
    helpers::normalize_amount,
    traits::{ReconciliationDatabase, ReconciliationError},
};

/// The trailing window within which a pending expectation is considered for matching.
pub const MATCH_WINDOW: Duration = Duration::minutes(5);

/// `PaymentFlowApi` is the primary API for issuing dynamic QR payloads and matching incoming payment
/// notifications against the expectations they settle.
pub struct PaymentFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for PaymentFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B> PaymentFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

/// The result of issuing a dynamic QR: the stored expectation and the payload to render as a QR image.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedQr {
    pub expectation: PaymentExpectation,
    pub payload: String,
}

/// A successful match, reporting how the notification was tied to the expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub expectation: PaymentExpectation,
    pub match_type: MatchType,
}

impl<B> PaymentFlowApi<B>
where B: ReconciliationDatabase
{
    /// Register a payment expectation and issue the dynamic payload the buyer scans to settle it.
    ///
    /// Registration is idempotent while the expectation is pending: re-issuing for the same reference returns
    /// the stored expectation (with a fresh payload), and an active unique-amount reservation is reused rather
    /// than redrawn. Re-issuing for a completed order is an error.
    pub async fn issue_dynamic_qr(
        &self,
        static_payload: &str,
        request: NewExpectation,
        fee: Option<&ServiceFee>,
    ) -> Result<IssuedQr, ReconciliationError> {
        validate(static_payload)?;
        let reference = request.order_reference.clone();
        let wants_unique_amount = request.with_unique_amount;
        let (mut expectation, inserted) = self.db.insert_expectation(request.clone()).await?;
        if !inserted {
            if expectation.status == ExpectationStatus::Completed {
                return Err(ReconciliationError::OrderAlreadyCompleted(reference));
            }
            if !request.is_equivalent(&expectation) {
                warn!(
                    "🔄️📦️ Order {reference} was re-registered with different details. The stored expectation \
                     wins; amend it through the expectation store if that is not what you want."
                );
            }
        }
        if wants_unique_amount {
            let reservation = self.db.reserve_unique_amount(&reference).await?;
            trace!("🔄️📦️ Order {reference} holds unique amount {}", reservation.value);
            expectation = self.db.attach_unique_amount(&reference, &reservation).await?;
        }
        let payload = convert_to_dynamic(static_payload, &expectation.expected_amount.to_payload_string(), fee)?;
        debug!(
            "🔄️📦️ Expectation for order {reference} issued. Waiting on a payment of {}",
            expectation.expected_amount
        );
        Ok(IssuedQr { expectation, payload })
    }

    /// Match an incoming payment notification against the pending expectations.
    ///
    /// Returns `Ok(None)` whenever nothing was (or could be) matched: an unusable amount, no candidate inside
    /// the window, an ambiguous amount shared by several candidates, a redelivered notification for an order
    /// that has already completed, or the defensive amount re-check failing after acceptance. None of these are
    /// errors; the notification is simply left for manual resolution.
    pub async fn process_notification(
        &self,
        notification: PaymentNotification,
    ) -> Result<Option<MatchOutcome>, ReconciliationError> {
        let Some(amount) = normalize_amount(&notification.amount) else {
            warn!("🔄️💰️ A notification arrived with an unusable amount '{}'. Ignoring it.", notification.amount);
            return Ok(None);
        };
        let detected = Rupiah::from(amount);
        let candidates = self.db.pending_candidates(detected, MATCH_WINDOW).await?;
        trace!("🔄️💰️ {} candidate expectation(s) are waiting on {detected}", candidates.len());
        if candidates.is_empty() {
            debug!("🔄️💰️ No pending expectation is waiting on {detected}. Nothing to do.");
            return Ok(None);
        }
        let text = notification.full_text().to_lowercase();
        let mut matched = None;
        for candidate in &candidates {
            if text.contains(&candidate.order_reference.as_str().to_lowercase()) {
                matched = Some((candidate.order_reference.clone(), MatchType::OrderReferenceMatch));
                break;
            }
        }
        if matched.is_none() {
            // accept on amount alone only when exactly one candidate is waiting on it
            let recount = self.db.pending_candidates(detected, MATCH_WINDOW).await?;
            if recount.len() == 1 {
                matched = Some((recount[0].order_reference.clone(), MatchType::AmountOnlyMatch));
            } else {
                debug!(
                    "🔄️💰️ {} expectations are waiting on {detected} and none is named in the notification \
                     text. Standing aside for manual resolution.",
                    recount.len()
                );
            }
        }
        let Some((reference, match_type)) = matched else {
            return Ok(None);
        };
        let Some(expectation) = self.db.complete_expectation(&reference).await? else {
            debug!("🔄️💰️ Order {reference} was completed by an earlier delivery. Ignoring the duplicate.");
            return Ok(None);
        };
        if expectation.expected_amount != detected {
            warn!(
                "🔄️💰️ Order {reference} matched on text, but the amounts disagree ({} expected, {detected} \
                 detected). Rolling the match back.",
                expectation.expected_amount
            );
            self.db.revert_expectation(&reference).await?;
            return Ok(None);
        }
        self.call_payment_matched_hook(&expectation, detected, match_type, notification.full_text()).await;
        debug!("🔄️💰️ Order {reference} completed ({match_type}).");
        Ok(Some(MatchOutcome { expectation, match_type }))
    }

    async fn call_payment_matched_hook(
        &self,
        expectation: &PaymentExpectation,
        amount: Rupiah,
        match_type: MatchType,
        raw_text: String,
    ) {
        for emitter in &self.producers.payment_matched_producer {
            debug!("🔄️💰️ Notifying payment matched hook subscribers");
            let event = PaymentMatchedEvent::new(expectation.clone(), amount, match_type, raw_text.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
