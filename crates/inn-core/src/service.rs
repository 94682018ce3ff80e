//! # Booking Service
//!
//! The single entry point the HTTP layer talks to. Every mutating operation
//! opens one store transaction, runs the relevant core component inside it
//! and commits; gateway calls and notifications happen outside transactions.
//!
//! ```text
//!  create_booking ─▶ Allocator ─▶ Pricing ─▶ commit ─▶ notify (best effort)
//!  confirm_payment ─▶ gateway.verify ─▶ Reconciliation ─▶ State Machine ─▶ commit ─▶ notify
//!  run_auto_checkout_sweep ─▶ Sweeper ─▶ State Machine (one transaction per booking)
//! ```

use crate::allocator::{self, Allocation};
use crate::availability::{self, RoomTypeAvailability};
use crate::booking::{Booking, BookingFilter, BookingPage, BookingStatus};
use crate::catalog;
use crate::clock::{SharedClock, SystemClock};
use crate::error::{BookingError, BookingResult};
use crate::gateway::{BoxedPaymentGateway, GatewayStatus, InitializeTransaction};
use crate::lifecycle::{self, BookingAction, TransitionRecord};
use crate::notify::{self, BookingNotice, LoggingNotifier, NoticeKind, SharedNotifier};
use crate::pricing;
use crate::reconcile::{self, ReconcileOutcome, ReconcileRecord};
use crate::request::{
    ensure_valid, AvailabilityQuery, ConfirmPaymentRequest, CreateBookingRequest, CreateRoomRequest,
    CreateRoomTypeRequest, GuestMessageRequest, UpdateBookingRequest, UpdateRoomRequest,
    UpdateRoomTypeRequest,
};
use crate::room::{AssignedRoom, Room, RoomType, RoomTypeSummary};
use crate::store::{RoomSelection, SharedStore};
use crate::sweeper::{self, SweepReport};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Prefix of every payment reference
pub const PAYMENT_REFERENCE_PREFIX: &str = "PAY-";

/// `PAY-` followed by 12 uppercase alphanumerics
pub fn new_payment_reference() -> String {
    let random = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    format!("{}{}", PAYMENT_REFERENCE_PREFIX, &random[..12])
}

/// Tunables for the service
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub room_selection: RoomSelection,
    /// Where the gateway sends the guest after paying
    pub callback_url: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            room_selection: RoomSelection::default(),
            callback_url: "http://localhost:8080/api/v1/payments/confirm".to_string(),
        }
    }
}

/// A hosted payment page opened for a booking
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitiation {
    pub booking_id: i64,
    pub reference: String,
    pub authorization_url: String,
    pub amount: Decimal,
}

/// Result of verifying a payment with the gateway
#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation {
    pub reference: String,
    pub gateway_status: GatewayStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_response: Option<String>,
    pub outcome: ReconcileOutcome,
    pub booking: Booking,
}

#[derive(Clone)]
pub struct BookingService {
    store: SharedStore,
    gateway: BoxedPaymentGateway,
    notifier: SharedNotifier,
    clock: SharedClock,
    settings: ServiceSettings,
}

impl BookingService {
    pub fn new(store: SharedStore, gateway: BoxedPaymentGateway) -> Self {
        Self {
            store,
            gateway,
            notifier: Arc::new(LoggingNotifier),
            clock: Arc::new(SystemClock),
            settings: ServiceSettings::default(),
        }
    }

    /// Builder: set notifier
    pub fn with_notifier(mut self, notifier: SharedNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Builder: set clock
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Builder: set settings
    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn gateway(&self) -> &BoxedPaymentGateway {
        &self.gateway
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    // --- availability and booking creation ---

    #[instrument(skip(self))]
    pub async fn check_availability(
        &self,
        query: AvailabilityQuery,
    ) -> BookingResult<Vec<RoomTypeAvailability>> {
        let window = query.window(self.clock.today())?;
        let store = self.store.as_ref();
        match query.room_type_id {
            Some(id) => Ok(vec![availability::room_type_availability(store, id, &window).await?]),
            None => availability::catalog_availability(store, &window).await,
        }
    }

    #[instrument(
        skip(self, request),
        fields(room_type_id = request.room_type_id, rooms = request.number_of_rooms)
    )]
    pub async fn create_booking(&self, request: CreateBookingRequest) -> BookingResult<Allocation> {
        let request = request.into_allocation()?;

        let mut tx = self.store.begin().await?;
        let allocation =
            allocator::allocate(tx.as_mut(), request, self.settings.room_selection).await?;
        tx.commit().await?;

        let notice = BookingNotice {
            kind: NoticeKind::Reserved,
            bookings: allocation.bookings.clone(),
            assigned_rooms: allocation.assigned_rooms.clone(),
            total_amount: allocation.total_amount(),
            room_type_name: allocation.room_type.name.clone(),
        };
        notify::deliver(self.notifier.as_ref(), &notice).await;

        Ok(allocation)
    }

    // --- queries ---

    pub async fn get_booking(&self, id: i64) -> BookingResult<Booking> {
        self.store
            .booking(id)
            .await?
            .ok_or_else(|| BookingError::not_found("booking", id))
    }

    #[instrument(skip(self))]
    pub async fn list_bookings(&self, filter: BookingFilter) -> BookingResult<BookingPage> {
        self.store.list_bookings(&filter).await
    }

    // --- state machine ---

    async fn run_transition(
        &self,
        booking_id: i64,
        action: BookingAction,
    ) -> BookingResult<TransitionRecord> {
        let mut tx = self.store.begin().await?;
        let record = lifecycle::transition(tx.as_mut(), booking_id, action).await?;
        tx.commit().await?;
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn confirm_booking(&self, booking_id: i64) -> BookingResult<TransitionRecord> {
        self.run_transition(booking_id, BookingAction::Confirm).await
    }

    #[instrument(skip(self))]
    pub async fn cancel_booking(&self, booking_id: i64) -> BookingResult<TransitionRecord> {
        self.run_transition(booking_id, BookingAction::Cancel).await
    }

    #[instrument(skip(self))]
    pub async fn checkout_booking(&self, booking_id: i64) -> BookingResult<TransitionRecord> {
        self.run_transition(booking_id, BookingAction::CheckOut).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_booking(
        &self,
        booking_id: i64,
        request: UpdateBookingRequest,
    ) -> BookingResult<TransitionRecord> {
        let changes = request.into_changes()?;
        let mut tx = self.store.begin().await?;
        let record = lifecycle::update(tx.as_mut(), booking_id, changes).await?;
        tx.commit().await?;
        Ok(record)
    }

    // --- payments ---

    /// Open a payment page for a pending booking.
    ///
    /// The reference is stored only after the gateway accepts it, so a
    /// failed or timed-out initiation leaves the booking untouched.
    ///
    /// Every call issues a fresh reference (Paystack refuses to initialize a
    /// reference twice) and replaces the stored one. A payment completed on an
    /// earlier page no longer matches any booking: its webhook is acknowledged
    /// as an unknown reference and the booking stays pending until the guest
    /// pays on the latest page or an admin confirms it.
    #[instrument(skip(self))]
    pub async fn initiate_payment(&self, booking_id: i64) -> BookingResult<PaymentInitiation> {
        let booking = self.get_booking(booking_id).await?;
        if booking.status != BookingStatus::Pending {
            return Err(BookingError::InvalidTransition {
                booking_id,
                from: booking.status,
                action: BookingAction::Confirm,
            });
        }
        if booking.amount <= Decimal::ZERO {
            return Err(BookingError::Validation(format!(
                "booking {} has nothing to pay",
                booking_id
            )));
        }

        let request = InitializeTransaction {
            reference: new_payment_reference(),
            amount_minor: pricing::to_minor_units(booking.amount)?,
            email: booking.guest.email.clone(),
            callback_url: self.settings.callback_url.clone(),
            booking_id,
        };
        let init = self.gateway.initialize_transaction(&request).await?;

        let mut tx = self.store.begin().await?;
        let mut locked = tx
            .lock_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found("booking", booking_id))?;
        if locked.status != BookingStatus::Pending {
            return Err(BookingError::InvalidTransition {
                booking_id,
                from: locked.status,
                action: BookingAction::Confirm,
            });
        }
        locked.payment_reference = Some(init.reference.clone());
        tx.save_booking(&locked).await?;
        tx.commit().await?;

        info!(
            booking_id,
            reference = %init.reference,
            provider = self.gateway.provider_name(),
            "payment initiated"
        );

        Ok(PaymentInitiation {
            booking_id,
            reference: init.reference,
            authorization_url: init.authorization_url,
            amount: booking.amount,
        })
    }

    /// Verify a payment with the gateway and reconcile the result.
    ///
    /// A gateway failure is returned as-is and mutates nothing; the booking
    /// stays pending so the guest can verify again.
    #[instrument(skip(self, request), fields(reference = %request.payment_reference))]
    pub async fn confirm_payment(
        &self,
        request: ConfirmPaymentRequest,
    ) -> BookingResult<PaymentConfirmation> {
        ensure_valid(&request)?;
        let reference = request.payment_reference;

        let known = match request.booking_id {
            Some(id) => {
                let booking = self.get_booking(id).await?;
                if booking.payment_reference.as_deref() != Some(reference.as_str()) {
                    return Err(BookingError::Validation(format!(
                        "payment reference {} does not belong to booking {}",
                        reference, id
                    )));
                }
                booking
            }
            None => self
                .store
                .booking_by_reference(&reference)
                .await?
                .ok_or_else(|| BookingError::not_found("payment reference", &reference))?,
        };

        let verification = self.gateway.verify_transaction(&reference).await.map_err(|e| {
            warn!(booking_id = known.id, error = %e, "payment verification failed");
            e
        })?;

        let record = self.apply_verdict(&reference, &verification.status).await?;
        Ok(PaymentConfirmation {
            reference,
            gateway_status: verification.status,
            gateway_response: verification.gateway_response,
            outcome: record.outcome,
            booking: record.booking,
        })
    }

    /// Apply an already obtained gateway verdict to the booking holding `reference`
    #[instrument(skip(self))]
    pub async fn reconcile_payment(
        &self,
        reference: &str,
        status: GatewayStatus,
    ) -> BookingResult<ReconcileRecord> {
        self.apply_verdict(reference, &status).await
    }

    /// Authenticate a gateway push and reconcile it; a bad signature mutates nothing
    #[instrument(skip(self, payload, signature), fields(bytes = payload.len()))]
    pub async fn handle_gateway_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> BookingResult<ReconcileRecord> {
        let event = self.gateway.verify_webhook(payload, signature).await?;
        info!(event = %event.event, reference = %event.reference, "gateway event received");
        self.apply_verdict(&event.reference, &event.effective_status()).await
    }

    async fn apply_verdict(
        &self,
        reference: &str,
        status: &GatewayStatus,
    ) -> BookingResult<ReconcileRecord> {
        let mut tx = self.store.begin().await?;
        let record = reconcile::reconcile(tx.as_mut(), reference, status).await?;
        tx.commit().await?;

        if record.outcome.should_notify() {
            self.notify_payment(&record).await;
        }
        Ok(record)
    }

    async fn notify_payment(&self, record: &ReconcileRecord) {
        let room_type_name = match self.store.room_type(record.booking.room_type_id).await {
            Ok(Some(room_type)) => room_type.name,
            Ok(None) => String::new(),
            Err(e) => {
                warn!(
                    booking_id = record.booking.id,
                    error = %e,
                    "room type lookup for notice failed"
                );
                String::new()
            }
        };
        let notice = BookingNotice {
            kind: NoticeKind::PaymentConfirmed,
            bookings: vec![record.booking.clone()],
            assigned_rooms: record.room.iter().map(AssignedRoom::from).collect(),
            total_amount: record.booking.amount,
            room_type_name,
        };
        notify::deliver(self.notifier.as_ref(), &notice).await;
    }

    // --- sweeper ---

    #[instrument(skip(self))]
    pub async fn run_auto_checkout_sweep(&self) -> BookingResult<SweepReport> {
        sweeper::run_sweep(self.store.as_ref(), self.clock.today()).await
    }

    // --- guest messaging ---

    /// Send a staff-written message; unlike lifecycle notices, failure is reported
    #[instrument(skip(self, request))]
    pub async fn send_guest_message(
        &self,
        booking_id: i64,
        request: GuestMessageRequest,
    ) -> BookingResult<()> {
        ensure_valid(&request)?;
        let booking = self.get_booking(booking_id).await?;
        self.notifier
            .send_custom_message(&booking.guest.email, &request.subject, &request.message)
            .await
            .map_err(|e| match e {
                BookingError::UpstreamGateway { .. } => e,
                other => BookingError::upstream("notifier", other.to_string()),
            })?;
        info!(booking_id, "guest message sent");
        Ok(())
    }

    // --- room catalog ---

    pub async fn room_types(&self) -> BookingResult<Vec<RoomTypeSummary>> {
        self.store.room_types().await
    }

    pub async fn room_type(&self, id: i64) -> BookingResult<RoomType> {
        self.store
            .room_type(id)
            .await?
            .ok_or_else(|| BookingError::not_found("room type", id))
    }

    pub async fn rooms(&self, room_type_id: Option<i64>) -> BookingResult<Vec<Room>> {
        self.store.rooms(room_type_id).await
    }

    #[instrument(skip(self, request))]
    pub async fn create_room_type(
        &self,
        request: CreateRoomTypeRequest,
    ) -> BookingResult<RoomType> {
        let new = request.into_new_room_type()?;
        let mut tx = self.store.begin().await?;
        let created = catalog::create_room_type(tx.as_mut(), new).await?;
        tx.commit().await?;
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_room_type(
        &self,
        id: i64,
        request: UpdateRoomTypeRequest,
    ) -> BookingResult<RoomType> {
        let changes = request.into_changes()?;
        let mut tx = self.store.begin().await?;
        let updated = catalog::update_room_type(tx.as_mut(), id, changes).await?;
        tx.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self, request))]
    pub async fn create_room(&self, request: CreateRoomRequest) -> BookingResult<Room> {
        let new = request.into_new_room()?;
        let mut tx = self.store.begin().await?;
        let created = catalog::create_room(tx.as_mut(), new).await?;
        tx.commit().await?;
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_room(&self, id: i64, request: UpdateRoomRequest) -> BookingResult<Room> {
        let changes = request.into_changes()?;
        let mut tx = self.store.begin().await?;
        let updated = catalog::update_room(tx.as_mut(), id, changes).await?;
        tx.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_room(&self, id: i64) -> BookingResult<()> {
        let mut tx = self.store.begin().await?;
        catalog::delete_room(tx.as_mut(), id).await?;
        tx.commit().await
    }
}
