
use chrono::{Duration, Utc};
use harvest_engine::{
    events::EventProducers,
    MatchLifecycleApi,
    OrderLifecycleApi,
    TransactionApi,
};
use mocks::MockStore;

use crate::service::FarmerService;

/// Each lifecycle API gets its own mock, so expectations only need to be set on the one under test.
fn service(orders: MockStore, matches: MockStore, transactions: MockStore) -> FarmerService<MockStore> {
    FarmerService::from_apis(
        OrderLifecycleApi::new(orders, EventProducers::default()),
        MatchLifecycleApi::new(matches).with_validity(Duration::hours(24)),
        TransactionApi::new(transactions),
    )
}

fn orders_only(store: MockStore) -> FarmerService<MockStore> {
    service(store, MockStore::new(), MockStore::new())
}

fn transactions_only(store: MockStore) -> FarmerService<MockStore> {
    service(MockStore::new(), MockStore::new(), store)
}

mod farmer_ids {
    use super::*;
    use crate::{
        data_objects::{FarmerRequest, ListOrdersRequest, OrderRequest, TransactionsRequest},
        errors::ErrorCode,
    };

    #[tokio::test]
    async fn invalid_farmer_ids_never_reach_the_store() {
        // No expectations are set, so any store call would panic.
        let svc = service(MockStore::new(), MockStore::new(), MockStore::new());
        for id in [Some(0), Some(-1), None] {
            let err = svc.count_active_orders(FarmerRequest { farmer_id: id }).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidArgument);
            let req = ListOrdersRequest { farmer_id: id, ..Default::default() };
            assert_eq!(svc.list_orders(req).await.unwrap_err().code, ErrorCode::InvalidArgument);
            let req = TransactionsRequest { farmer_id: id, ..Default::default() };
            assert_eq!(svc.transactions(req).await.unwrap_err().code, ErrorCode::InvalidArgument);
            let req = OrderRequest { order_id: "ORD-000001".into(), farmer_id: id };
            assert_eq!(svc.transaction_details(req).await.unwrap_err().code, ErrorCode::InvalidArgument);
            let err = svc.earnings_summary(FarmerRequest { farmer_id: id }).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidArgument);
        }
        let err = svc.count_active_orders(FarmerRequest::new(0)).await.unwrap_err();
        assert_eq!(err.metadata.get("farmerId").map(String::as_str), Some("0"));
    }

    #[tokio::test]
    async fn blank_order_ids_are_rejected() {
        let svc = service(MockStore::new(), MockStore::new(), MockStore::new());
        let err = svc.get_order(OrderRequest::new("   ", 4)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
    }
}

mod orders {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use harvest_engine::{db_types::TrackingStatus, test_utils::order_fixture, StoreError};

    use super::*;
    use crate::{
        data_objects::{FarmerRequest, ListOrdersRequest, TransitionOrderRequest},
        errors::ErrorCode,
    };

    fn transition_request(order_id: &str, status: &str) -> TransitionOrderRequest {
        TransitionOrderRequest {
            order_id: order_id.into(),
            new_status: status.into(),
            actor: "farmer".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn transition_is_conditional_on_the_validated_status() {
        let now = Utc::now();
        let mut store = MockStore::new();
        store
            .expect_fetch_order()
            .times(1)
            .returning(move |id| Ok(Some(order_fixture(id.as_str(), 3, TrackingStatus::Listed, 1200, now))));
        store
            .expect_transition_order_status()
            .withf(|id, update| {
                id.as_str() == "ORD-000010" &&
                    update.expected == TrackingStatus::Listed &&
                    update.new_status == TrackingStatus::Matched &&
                    update.actor == "farmer" &&
                    update.paid_at.is_none()
            })
            .times(1)
            .returning(move |id, _| Ok(Some(order_fixture(id.as_str(), 3, TrackingStatus::Matched, 1200, now))));
        let svc = orders_only(store);
        let view = svc.transition_order(transition_request("ORD-000010", "MATCHED")).await.unwrap();
        assert_eq!(view.order.tracking_status, TrackingStatus::Matched);
        assert_eq!(view.current_step, 2);
        assert_eq!(view.timeline.len(), 7);
    }

    #[tokio::test]
    async fn a_lost_race_is_reported_from_the_fresh_state() {
        let now = Utc::now();
        let reads = Arc::new(AtomicUsize::new(0));
        let mut store = MockStore::new();
        let counter = Arc::clone(&reads);
        store.expect_fetch_order().times(2).returning(move |id| {
            // The first read sees LISTED. By the time we re-read, the other caller has already moved it on.
            let status = match counter.fetch_add(1, Ordering::SeqCst) {
                0 => TrackingStatus::Listed,
                _ => TrackingStatus::Matched,
            };
            Ok(Some(order_fixture(id.as_str(), 3, status, 1200, now)))
        });
        store.expect_transition_order_status().times(1).returning(|_, _| Ok(None));
        let svc = orders_only(store);
        let err = svc.transition_order(transition_request("ORD-000011", "MATCHED")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::FailedPrecondition);
        assert_eq!(err.metadata.get("status").map(String::as_str), Some("MATCHED"));
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_statuses_are_invalid_arguments() {
        let svc = service(MockStore::new(), MockStore::new(), MockStore::new());
        let err = svc.transition_order(transition_request("ORD-000012", "SHIPPED")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
        assert_eq!(err.metadata.get("field").map(String::as_str), Some("newStatus"));

        let req = ListOrdersRequest { farmer_id: Some(3), status: Some("archived".into()), ..Default::default() };
        let err = svc.list_orders(req).await.unwrap_err();
        assert_eq!(err.metadata.get("field").map(String::as_str), Some("status"));
    }

    #[tokio::test]
    async fn store_failures_do_not_leak() {
        let mut store = MockStore::new();
        store
            .expect_count_active_orders()
            .times(1)
            .returning(|_| Err(StoreError::DatabaseError("unable to open database file /srv/harvest.db".into())));
        let svc = orders_only(store);
        let err = svc.count_active_orders(FarmerRequest::new(3)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Internal);
        assert!(!err.message.contains("harvest.db"));
    }
}

mod matches {
    use harvest_common::Kilograms;
    use harvest_engine::{db_types::MatchStatus, test_utils::overdue_match_fixture, StoreError};

    use super::*;
    use crate::{data_objects::AcceptMatchRequest, errors::ErrorCode};

    fn overdue_store() -> MockStore {
        let now = Utc::now();
        let mut store = MockStore::new();
        store
            .expect_fetch_expired_pending()
            .times(1)
            .returning(move |_, _| Ok(vec![overdue_match_fixture(1, 3, now), overdue_match_fixture(2, 3, now)]));
        store
    }

    #[tokio::test]
    async fn a_failed_expiry_does_not_stop_the_sweep() {
        let now = Utc::now();
        let mut store = overdue_store();
        store
            .expect_update_match_status()
            .withf(|id, from, update| {
                id.value() == 1 && *from == [MatchStatus::PendingAcceptance] && update.new_status == MatchStatus::Expired
            })
            .times(1)
            .returning(|_, _, _| Err(StoreError::DatabaseError("database is locked".into())));
        store.expect_update_match_status().withf(|id, _, _| id.value() == 2).times(1).returning(move |id, _, _| {
            let mut m = overdue_match_fixture(id.value(), 3, now);
            m.status = MatchStatus::Expired;
            Ok(Some(m))
        });
        let svc = service(MockStore::new(), store, MockStore::new());
        let result = svc.expire_matches().await.unwrap();
        assert_eq!(result.expired, 1);
    }

    #[tokio::test]
    async fn a_sweep_that_expires_nothing_reports_the_failure() {
        let mut store = overdue_store();
        store
            .expect_update_match_status()
            .times(2)
            .returning(|_, _, _| Err(StoreError::DatabaseError("database is locked".into())));
        let svc = service(MockStore::new(), store, MockStore::new());
        let err = svc.expire_matches().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Internal);
    }

    #[tokio::test]
    async fn accepted_quantity_must_be_positive() {
        let svc = service(MockStore::new(), MockStore::new(), MockStore::new());
        for q in [0, -5] {
            let req = AcceptMatchRequest { match_id: 4, is_partial: true, accepted_quantity: Some(Kilograms::from(q)) };
            let err = svc.accept_match(req).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidArgument);
            assert_eq!(err.metadata.get("matchId").map(String::as_str), Some("4"));
        }
    }

    #[tokio::test]
    async fn unknown_matches_are_not_found() {
        let mut store = MockStore::new();
        store.expect_fetch_match().times(1).returning(|_| Ok(None));
        let svc = service(MockStore::new(), store, MockStore::new());
        let req = AcceptMatchRequest { match_id: 99, ..Default::default() };
        let err = svc.accept_match(req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.metadata.get("matchId").map(String::as_str), Some("99"));
    }
}

mod transactions {
    use harvest_engine::traits::{SortOrder, TransactionSortKey, TransactionStatusFilter};

    use super::*;
    use crate::{data_objects::TransactionsRequest, errors::ErrorCode};

    #[tokio::test]
    async fn the_default_window_is_the_last_ninety_days() {
        let mut store = MockStore::new();
        store
            .expect_query_transactions()
            .withf(|filter| {
                let expected = Utc::now() - Duration::days(90);
                let from_ok = filter.from_date.is_some_and(|d| (d - expected).num_seconds().abs() < 60);
                from_ok &&
                    filter.to_date.is_none() &&
                    filter.status == TransactionStatusFilter::All &&
                    filter.sort_by == TransactionSortKey::Date &&
                    filter.sort_order == SortOrder::Desc
            })
            .times(1)
            .returning(|_| Ok((vec![], 0)));
        let svc = transactions_only(store);
        let page = svc.transactions(TransactionsRequest { farmer_id: Some(5), ..Default::default() }).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn filters_are_parsed_before_querying() {
        let mut store = MockStore::new();
        store
            .expect_query_transactions()
            .withf(|filter| {
                filter.status == TransactionStatusFilter::Pending &&
                    filter.sort_by == TransactionSortKey::Amount &&
                    filter.sort_order == SortOrder::Asc &&
                    filter.crop_type.as_deref() == Some("Onion")
            })
            .times(1)
            .returning(|_| Ok((vec![], 0)));
        let svc = transactions_only(store);
        let req = TransactionsRequest {
            farmer_id: Some(5),
            status: Some("pending".into()),
            sort_by: Some("amount".into()),
            sort_order: Some("asc".into()),
            crop_type: Some("Onion".into()),
            ..Default::default()
        };
        svc.transactions(req).await.unwrap();

        let svc = transactions_only(MockStore::new());
        let req = TransactionsRequest { farmer_id: Some(5), sort_by: Some("weight".into()), ..Default::default() };
        let err = svc.transactions(req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
        assert_eq!(err.metadata.get("field").map(String::as_str), Some("sortBy"));
    }
}
