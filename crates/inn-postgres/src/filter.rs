//! Booking list filters rendered as SQL predicates.

use inn_core::BookingFilter;
use sqlx::{Postgres, QueryBuilder};

/// `FROM` clause shared by the page and count queries of the admin list
pub(crate) const LIST_FROM: &str = " FROM bookings b \
     LEFT JOIN rooms r ON r.id = b.room_id \
     JOIN room_types t ON t.id = b.room_type_id \
     WHERE TRUE";

fn like(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Append every predicate of `filter` to a query whose `WHERE` is already open
pub(crate) fn push_predicates(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookingFilter) {
    match filter.numeric_booking_id() {
        Some(Some(id)) => {
            qb.push(" AND b.id = ").push_bind(id);
        }
        Some(None) => {
            qb.push(" AND FALSE");
        }
        None => {}
    }
    if let Some(name) = &filter.name {
        qb.push(" AND b.guest_name ILIKE ").push_bind(like(name));
    }
    if let Some(phone) = &filter.phone {
        qb.push(" AND b.guest_phone LIKE ").push_bind(like(phone));
    }
    if let Some(number) = &filter.room_number {
        qb.push(" AND r.room_number LIKE ").push_bind(like(number));
    }
    if let Some(room_type) = &filter.room_type {
        qb.push(" AND t.name ILIKE ").push_bind(like(room_type));
    }
    if let Some(status) = filter.status {
        qb.push(" AND b.status = ").push_bind(status.as_str());
    }
    if let Some(day) = filter.check_in_date {
        qb.push(" AND b.check_in_date = ").push_bind(day);
    }
    if let Some(day) = filter.check_out_date {
        qb.push(" AND b.check_out_date = ").push_bind(day);
    }
    if let Some(day) = filter.check_in_from {
        qb.push(" AND b.check_out_date > ").push_bind(day);
    }
    if let Some(day) = filter.check_out_to {
        qb.push(" AND b.check_in_date < ").push_bind(day);
    }
}
