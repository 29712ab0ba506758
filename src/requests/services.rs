use anyhow::Context;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::repo::{Role, User};
use crate::auth::services::AuthUser;
use crate::cars::repo::{self as cars_repo, Car, CarAvailability};
use crate::error::{ApiError, ApiResult};
use crate::mailer;
use crate::state::AppState;

use super::dto::CreateRequestBody;
use super::repo::{self, NewRequest, Request, RequestKind, RequestStatus};

pub const RENTAL_DEPOSIT: i64 = 50_000;
pub const DRIVER_FEE_PER_DAY: i64 = 20_000;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentQuote {
    pub days: i64,
    pub amount: i64,
    pub deposit: i64,
    pub driver_fee: i64,
    pub total: i64,
}

/// Rental price for the booked window. Any started day counts as a full day.
pub fn quote_rent(
    price_per_day: i64,
    start: OffsetDateTime,
    end: OffsetDateTime,
    with_driver: bool,
) -> Result<RentQuote, ApiError> {
    let seconds = (end - start).whole_seconds();
    if seconds <= 0 {
        return Err(ApiError::BadRequest(
            "end_date must be after start_date".into(),
        ));
    }
    let days = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    let amount = price_per_day * days;
    let driver_fee = if with_driver { DRIVER_FEE_PER_DAY * days } else { 0 };
    Ok(RentQuote {
        days,
        amount,
        deposit: RENTAL_DEPOSIT,
        driver_fee,
        total: amount + RENTAL_DEPOSIT + driver_fee,
    })
}

pub fn can_transition(from: RequestStatus, to: RequestStatus) -> bool {
    use RequestStatus::*;
    matches!(
        (from, to),
        (Pending, Approved)
            | (Pending, Rejected)
            | (Pending, Cancelled)
            | (Approved, Completed)
            | (Approved, Cancelled)
    )
}

/// What a status change does to the linked car.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityAction {
    Keep,
    Set(CarAvailability),
    /// Guarded edge: only valid while the car is still `available`.
    SetIfAvailable(CarAvailability),
    /// Back to `available` unless the car has been sold.
    ReleaseUnlessSold,
}

pub fn availability_action(kind: RequestKind, to: RequestStatus) -> AvailabilityAction {
    use AvailabilityAction::*;
    use RequestKind::*;
    use RequestStatus::*;
    match (kind, to) {
        (Rent, Approved) => SetIfAvailable(CarAvailability::Rented),
        (Buy, Approved) => SetIfAvailable(CarAvailability::Sold),
        // An approved sell enters the rentable fleet; a declined one stays
        // parked in maintenance, invisible to the public listing.
        (Sell, Approved) => Set(CarAvailability::Available),
        (Sell, Rejected | Cancelled) => Keep,
        (_, Completed | Rejected | Cancelled) => ReleaseUnlessSold,
        _ => Keep,
    }
}

async fn bookable_car(st: &AppState, car_id: Option<Uuid>) -> ApiResult<Car> {
    let id = car_id.ok_or_else(|| ApiError::BadRequest("car_id is required".into()))?;
    let car = cars_repo::get(&st.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Car not found".into()))?;
    if car.availability_status != CarAvailability::Available {
        return Err(ApiError::BadRequest("Car is not available".into()));
    }
    Ok(car)
}

pub async fn create_request(
    st: &AppState,
    user: &AuthUser,
    body: CreateRequestBody,
) -> ApiResult<Request> {
    let mut tx = st.db.begin().await.context("begin tx")?;

    let request = match body.kind {
        RequestKind::Rent => {
            let car = bookable_car(st, body.car_id).await?;
            let start = body
                .start_date
                .ok_or_else(|| ApiError::BadRequest("start_date is required".into()))?;
            let end = body
                .end_date
                .ok_or_else(|| ApiError::BadRequest("end_date is required".into()))?;
            let quote = quote_rent(car.price_per_day, start, end, body.with_driver)?;
            repo::insert_tx(
                &mut tx,
                &NewRequest {
                    user_id: user.id,
                    car_id: car.id,
                    kind: RequestKind::Rent,
                    start_date: Some(start),
                    end_date: Some(end),
                    with_driver: body.with_driver,
                    event_note: body.event_note,
                    amount: quote.amount,
                    deposit: quote.deposit,
                    driver_fee: quote.driver_fee,
                    total_amount: quote.total,
                },
            )
            .await?
        }
        RequestKind::Buy => {
            let car = bookable_car(st, body.car_id).await?;
            let price = car
                .sale_price
                .ok_or_else(|| ApiError::BadRequest("Car is not for sale".into()))?;
            repo::insert_tx(
                &mut tx,
                &NewRequest {
                    user_id: user.id,
                    car_id: car.id,
                    kind: RequestKind::Buy,
                    start_date: None,
                    end_date: None,
                    with_driver: false,
                    event_note: body.event_note,
                    amount: price,
                    deposit: 0,
                    driver_fee: 0,
                    total_amount: price,
                },
            )
            .await?
        }
        RequestKind::Sell => {
            let vehicle = body.vehicle.as_ref().ok_or_else(|| {
                ApiError::BadRequest("vehicle is required for sell requests".into())
            })?;
            let offered = body.offered_amount.ok_or_else(|| {
                ApiError::BadRequest("offered_amount is required for sell requests".into())
            })?;
            if offered <= 0 {
                return Err(ApiError::BadRequest("offered_amount must be positive".into()));
            }
            let car_id = repo::insert_offered_car_tx(&mut tx, vehicle).await?;
            repo::insert_tx(
                &mut tx,
                &NewRequest {
                    user_id: user.id,
                    car_id,
                    kind: RequestKind::Sell,
                    start_date: None,
                    end_date: None,
                    with_driver: false,
                    event_note: body.event_note,
                    amount: offered,
                    deposit: 0,
                    driver_fee: 0,
                    total_amount: offered,
                },
            )
            .await?
        }
    };

    tx.commit().await.context("commit tx")?;
    info!(request_id = %request.id, kind = request.kind.as_str(), "request created");

    send_received_email(st, &request).await;
    Ok(request)
}

/// Apply a status change plus its car-availability side effect in one
/// transaction. Both writes are guarded on the state observed here, so a
/// concurrent change surfaces as 409 instead of a silent double-booking.
pub async fn change_status(
    st: &AppState,
    actor: &AuthUser,
    id: Uuid,
    target: RequestStatus,
) -> ApiResult<Request> {
    let request = repo::get(&st.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Request not found".into()))?;

    if target == RequestStatus::Cancelled {
        if request.user_id != actor.id {
            return Err(ApiError::Forbidden("Only the requester can cancel".into()));
        }
        if request.status != RequestStatus::Pending {
            return Err(ApiError::Conflict(
                "Only pending requests can be cancelled".into(),
            ));
        }
    } else if actor.role != Role::Admin {
        return Err(ApiError::Forbidden("Admin access required".into()));
    }

    if !can_transition(request.status, target) {
        return Err(ApiError::Conflict(format!(
            "Cannot move a {} request to {}",
            request.status.as_str(),
            target.as_str()
        )));
    }

    let mut tx = st.db.begin().await.context("begin tx")?;

    let updated = repo::update_status_tx(&mut tx, id, request.status, target)
        .await?
        .ok_or_else(|| ApiError::Conflict("Request was updated concurrently".into()))?;

    match availability_action(updated.kind, target) {
        AvailabilityAction::Keep => {}
        AvailabilityAction::Set(av) => {
            cars_repo::set_availability_tx(&mut tx, updated.car_id, av).await?;
        }
        AvailabilityAction::SetIfAvailable(av) => {
            if !cars_repo::set_availability_guarded_tx(&mut tx, updated.car_id, av).await? {
                return Err(ApiError::Conflict("Car is no longer available".into()));
            }
        }
        AvailabilityAction::ReleaseUnlessSold => {
            cars_repo::release_availability_tx(&mut tx, updated.car_id).await?;
        }
    }

    tx.commit().await.context("commit tx")?;
    info!(
        request_id = %updated.id,
        status = target.as_str(),
        "request status changed"
    );

    send_status_email(st, &updated).await;
    Ok(updated)
}

// Email failures never fail the request write.

async fn send_received_email(st: &AppState, request: &Request) {
    let Ok(Some(user)) = User::find_by_id(&st.db, request.user_id).await else {
        warn!(request_id = %request.id, "requester not found for email");
        return;
    };
    let html = mailer::request_received_html(
        &user.name,
        request.kind.as_str(),
        request.total_amount,
        &st.config.gateway.currency,
    );
    if let Err(e) = st.mailer.send(&user.email, "We received your request", &html).await {
        warn!(error = %e, request_id = %request.id, "request received email failed");
    }
}

async fn send_status_email(st: &AppState, request: &Request) {
    let Ok(Some(user)) = User::find_by_id(&st.db, request.user_id).await else {
        warn!(request_id = %request.id, "requester not found for email");
        return;
    };
    let html = mailer::request_status_html(
        &user.name,
        request.kind.as_str(),
        request.status.as_str(),
    );
    if let Err(e) = st.mailer.send(&user.email, "Your request was updated", &html).await {
        warn!(error = %e, request_id = %request.id, "status email failed");
    }
}

#[cfg(test)]
mod pricing_tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn whole_days_price_as_given() {
        let quote = quote_rent(
            100_000,
            datetime!(2026-08-01 09:00 UTC),
            datetime!(2026-08-04 09:00 UTC),
            false,
        )
        .unwrap();
        assert_eq!(quote.days, 3);
        assert_eq!(quote.amount, 300_000);
        assert_eq!(quote.deposit, RENTAL_DEPOSIT);
        assert_eq!(quote.driver_fee, 0);
        assert_eq!(quote.total, 350_000);
    }

    #[test]
    fn partial_day_rounds_up() {
        let quote = quote_rent(
            100_000,
            datetime!(2026-08-01 09:00 UTC),
            datetime!(2026-08-02 10:30 UTC),
            false,
        )
        .unwrap();
        assert_eq!(quote.days, 2);
        assert_eq!(quote.amount, 200_000);
    }

    #[test]
    fn short_booking_counts_as_one_day() {
        let quote = quote_rent(
            80_000,
            datetime!(2026-08-01 09:00 UTC),
            datetime!(2026-08-01 12:00 UTC),
            false,
        )
        .unwrap();
        assert_eq!(quote.days, 1);
        assert_eq!(quote.amount, 80_000);
    }

    #[test]
    fn driver_fee_accrues_per_day() {
        let quote = quote_rent(
            100_000,
            datetime!(2026-08-01 09:00 UTC),
            datetime!(2026-08-03 09:00 UTC),
            true,
        )
        .unwrap();
        assert_eq!(quote.driver_fee, 2 * DRIVER_FEE_PER_DAY);
        assert_eq!(quote.total, 200_000 + RENTAL_DEPOSIT + 40_000);
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = quote_rent(
            100_000,
            datetime!(2026-08-04 09:00 UTC),
            datetime!(2026-08-01 09:00 UTC),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn zero_length_window_is_rejected() {
        let at = datetime!(2026-08-01 09:00 UTC);
        assert!(quote_rent(100_000, at, at, false).is_err());
    }
}

#[cfg(test)]
mod transition_tests {
    use super::*;
    use RequestStatus::*;

    #[test]
    fn pending_fans_out() {
        assert!(can_transition(Pending, Approved));
        assert!(can_transition(Pending, Rejected));
        assert!(can_transition(Pending, Cancelled));
    }

    #[test]
    fn approved_can_complete_or_cancel() {
        assert!(can_transition(Approved, Completed));
        assert!(can_transition(Approved, Cancelled));
        assert!(!can_transition(Approved, Rejected));
        assert!(!can_transition(Approved, Pending));
    }

    #[test]
    fn terminal_states_stay_terminal() {
        for terminal in [Rejected, Completed, Cancelled] {
            for target in [Pending, Approved, Rejected, Completed, Cancelled] {
                assert!(!can_transition(terminal, target), "{terminal:?} -> {target:?}");
            }
        }
    }

    #[test]
    fn completed_cannot_be_reapproved() {
        assert!(!can_transition(Completed, Approved));
    }
}

#[cfg(test)]
mod availability_tests {
    use super::*;
    use AvailabilityAction::*;
    use RequestKind::*;
    use RequestStatus::*;

    #[test]
    fn approving_rent_takes_the_car_off_the_lot() {
        assert_eq!(
            availability_action(Rent, Approved),
            SetIfAvailable(CarAvailability::Rented)
        );
    }

    #[test]
    fn approving_buy_marks_the_car_sold() {
        assert_eq!(
            availability_action(Buy, Approved),
            SetIfAvailable(CarAvailability::Sold)
        );
    }

    #[test]
    fn approving_sell_puts_the_offered_car_on_the_lot() {
        assert_eq!(
            availability_action(Sell, Approved),
            Set(CarAvailability::Available)
        );
    }

    #[test]
    fn declined_sell_stays_parked() {
        assert_eq!(availability_action(Sell, Rejected), Keep);
        assert_eq!(availability_action(Sell, Cancelled), Keep);
    }

    #[test]
    fn finished_rent_releases_unless_sold() {
        assert_eq!(availability_action(Rent, Completed), ReleaseUnlessSold);
        assert_eq!(availability_action(Rent, Rejected), ReleaseUnlessSold);
        assert_eq!(availability_action(Rent, Cancelled), ReleaseUnlessSold);
    }

    #[test]
    fn completed_buy_keeps_the_sold_guard() {
        // release is filtered on availability != sold, so a completed buy
        // leaves the car sold
        assert_eq!(availability_action(Buy, Completed), ReleaseUnlessSold);
    }
}
