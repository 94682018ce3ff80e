//! # inn-core
//!
//! Booking lifecycle and inventory allocation for the innkeep reservation engine.
//!
//! This crate provides:
//! - `RoomType`, `Room`, `Booking` and their status enums
//! - the Inventory Allocator, Pricing Engine and Booking State Machine
//! - the Availability Calculator and Auto-Checkout Sweeper
//! - Payment Reconciliation against a `PaymentGateway`
//! - `BookingStore` / `StoreTx` persistence traits with an in-memory store
//! - `BookingService`, the facade exposing every operation
//! - `BookingError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use inn_core::{BookingService, CreateBookingRequest, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::from_catalog_file("config/rooms.toml")?);
//! let service = BookingService::new(store, gateway);
//!
//! // Reserve two rooms; fails with InsufficientInventory if fewer are free
//! let allocation = service.create_booking(request).await?;
//!
//! // Send the guest to the gateway's payment page
//! let payment = service.initiate_payment(allocation.bookings[0].id).await?;
//! ```

pub mod allocator;
pub mod availability;
pub mod booking;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod memory;
pub mod notify;
pub mod pricing;
pub mod reconcile;
pub mod request;
pub mod room;
pub mod service;
pub mod store;
pub mod sweeper;

// Re-exports for convenience
pub use allocator::{Allocation, AllocationRequest, MAX_ROOMS_PER_REQUEST};
pub use availability::RoomTypeAvailability;
pub use booking::{
    Booking, BookingFilter, BookingPage, BookingStatus, GuestInfo, NewBooking, StayDates,
};
pub use catalog::{RoomChanges, RoomTypeChanges};
pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use error::{BookingError, BookingResult};
pub use gateway::{
    BoxedPaymentGateway, GatewayEvent, GatewayStatus, InitializeTransaction, PaymentGateway,
    PaymentInit, Verification,
};
pub use lifecycle::{BookingAction, BookingChanges, TransitionRecord};
pub use memory::MemoryStore;
pub use notify::{BookingNotice, LoggingNotifier, NoticeKind, Notifier, SharedNotifier};
pub use pricing::Quote;
pub use reconcile::{ReconcileOutcome, ReconcileRecord};
pub use request::{
    AvailabilityQuery, ConfirmPaymentRequest, CreateBookingRequest, CreateRoomRequest,
    CreateRoomTypeRequest, GuestMessageRequest, UpdateBookingRequest, UpdateRoomRequest,
    UpdateRoomTypeRequest,
};
pub use room::{
    AssignedRoom, NewRoom, NewRoomType, Room, RoomCatalog, RoomStatus, RoomType, RoomTypeSummary,
};
pub use service::{BookingService, PaymentConfirmation, PaymentInitiation, ServiceSettings};
pub use store::{BookingStore, RoomSelection, SharedStore, StoreTx};
pub use sweeper::{SweepFailure, SweepReport};
