//! Ledger → statistics → transfer flows

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::models::{
    Dimension, EmployeeCreate, PaymentCreate, PaymentStatus, RailType, StatisticsQuery, TimeWindow,
};
use shared::util::{DAY_MILLIS, now_millis};
use tip_server::transfer::ManualSettlementGateway;
use tip_server::{InMemoryDirectory, PaymentLedger, RoleBudget, StatisticsService, TransferValidator};

const R: i64 = 1;

struct Engine {
    ledger: Arc<PaymentLedger>,
    budget: RoleBudget,
    statistics: StatisticsService,
    transfers: TransferValidator,
}

fn engine() -> Engine {
    let ledger = Arc::new(PaymentLedger::new());
    let directory = InMemoryDirectory::new();
    let statistics = StatisticsService::new(
        ledger.clone(),
        Arc::new(directory.clone()),
        chrono_tz::UTC,
        Duration::ZERO,
        20,
    );
    let transfers = TransferValidator::new(
        ledger.clone(),
        Arc::new(ManualSettlementGateway),
        Duration::from_secs(1),
    );
    Engine {
        ledger,
        budget: RoleBudget::new(directory),
        statistics,
        transfers,
    }
}

fn waiter(e: &Engine, name: &str) -> i64 {
    e.budget
        .register_employee(
            R,
            EmployeeCreate {
                name: name.to_string(),
                email: None,
                phone: None,
                tax_id: Some(format!("TAX-{name}")),
                role_id: None,
            },
        )
        .unwrap()
        .id
}

fn tip(amount: Decimal, waiter_id: i64, occurred_at: i64) -> PaymentCreate {
    PaymentCreate {
        amount,
        occurred_at,
        rail_type: RailType::Deposit,
        status: Some(PaymentStatus::Approved),
        table: Some("3".to_string()),
        waiter_id: Some(waiter_id),
        rating: None,
        transaction_ref: None,
        creditor_tax_id: None,
    }
}

#[test]
fn test_ranking_scenario() {
    let e = engine();
    let now = now_millis();
    let a = waiter(&e, "A");
    let b = waiter(&e, "B");
    let c = waiter(&e, "C");
    for amount in [dec!(100), dec!(100), dec!(100)] {
        e.ledger.append(R, tip(amount, a, now - 60_000)).unwrap();
    }
    for amount in [dec!(250), dec!(250)] {
        e.ledger.append(R, tip(amount, b, now - 60_000)).unwrap();
    }
    e.ledger.append(R, tip(dec!(50), c, now - 60_000)).unwrap();

    let query = StatisticsQuery::new(Dimension::Waiter, TimeWindow::LastMonth);
    let snap = e.statistics.snapshot_at(R, &query, now).unwrap();
    let ranking = snap.ranking_top5.clone().unwrap();
    let names: Vec<&str> = ranking.iter().map(|r| r.display_name.as_str()).collect();
    assert_eq!(names, vec!["B", "A", "C"]);
    assert_eq!(ranking[0].total, dec!(500));
    assert_eq!(ranking[1].total, dec!(300));
    assert_eq!(ranking[2].total, dec!(50));
    assert_eq!(snap.others.clone().unwrap().waiter_count, 0);

    // Same input, same output
    let again = e.statistics.snapshot_at(R, &query, now).unwrap();
    assert_eq!(
        serde_json::to_string(&snap).unwrap(),
        serde_json::to_string(&again).unwrap()
    );
}

#[test]
fn test_eight_day_old_payment_windows() {
    let e = engine();
    let now = now_millis();
    let a = waiter(&e, "A");
    e.ledger.append(R, tip(dec!(10), a, now - 8 * DAY_MILLIS)).unwrap();

    let total = |window| {
        e.statistics
            .snapshot_at(R, &StatisticsQuery::new(Dimension::Time, window), now)
            .unwrap()
            .grand_total
    };
    assert_eq!(total(TimeWindow::LastWeek), Decimal::ZERO);
    assert_eq!(total(TimeWindow::LastMonth), dec!(10));
    assert_eq!(total(TimeWindow::LastYear), dec!(10));
}

#[test]
fn test_waiter_subset_and_group_preview() {
    let e = engine();
    let now = now_millis();
    let a = waiter(&e, "A");
    let b = waiter(&e, "B");
    for i in 0..7 {
        e.ledger.append(R, tip(dec!(1), a, now - i * 1_000)).unwrap();
    }
    e.ledger.append(R, tip(dec!(9), b, now - 1_000)).unwrap();

    let query = StatisticsQuery::new(Dimension::Table, TimeWindow::LastWeek).with_waiters(vec![a]);
    let snap = e.statistics.snapshot_at(R, &query, now).unwrap();
    assert_eq!(snap.grand_total, dec!(7));
    let group = &snap.groups["3"];
    assert_eq!(group.preview().len(), 5);
    assert!(group.has_more());
    assert!(group.payments[0].occurred_at >= group.payments[1].occurred_at);
}

#[tokio::test]
async fn test_transfer_settles_once_and_shows_in_totals() {
    let e = engine();
    let now = now_millis();
    let a = waiter(&e, "A");
    let transfer = e
        .ledger
        .append(
            R,
            PaymentCreate {
                rail_type: RailType::Transfer,
                transaction_ref: Some("OP-1".to_string()),
                creditor_tax_id: Some("B99".to_string()),
                ..tip(dec!(20), a, now - 1_000)
            },
        )
        .unwrap();

    let query = StatisticsQuery::new(Dimension::Time, TimeWindow::LastWeek);
    let before = e.statistics.snapshot_at(R, &query, now).unwrap();
    assert_eq!(before.pending_total, dec!(20));
    assert_eq!(before.settled_total, Decimal::ZERO);

    assert!(e.transfers.validate(transfer.id, "OP-1").await.is_ok());
    let second = e.transfers.validate(transfer.id, "OP-1").await.unwrap_err();
    assert!(second.is_already_settled());

    let after = e.statistics.snapshot_at(R, &query, now).unwrap();
    assert_eq!(after.settled_total, dec!(20));
    assert_eq!(after.transfer_total, dec!(20));
}
