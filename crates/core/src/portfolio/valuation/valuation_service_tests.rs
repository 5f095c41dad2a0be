#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    use crate::config::EngineConfig;
    use crate::errors::{CalculatorError, Error, Result as AppResult};
    use crate::market_data::{
        InMemoryPriceLookup, MarketDataError, PriceBar, PriceLookupTrait, ResolvedPrice,
        TradingCalendarTrait, WeekdayCalendar,
    };
    use crate::portfolio::snapshot::{
        HoldingSnapshotEntry, InMemorySnapshotStore, PortfolioValueSnapshot, SnapshotStoreTrait,
    };
    use crate::portfolio::valuation::{ValuationService, ValuationServiceTrait};
    use crate::portfolio::window::WindowQuery;
    use crate::transactions::{Instrument, Transaction, TransactionType};

    const AAPL: &str = "inst-aapl";
    const MSFT: &str = "inst-msft";
    const NEWCO: &str = "inst-newco";

    // --- Price lookup that fails from a given date onward ---
    struct FailingPriceLookup {
        inner: InMemoryPriceLookup,
        fail_from: NaiveDate,
    }

    #[async_trait]
    impl PriceLookupTrait for FailingPriceLookup {
        async fn get_close_price(
            &self,
            instrument_id: &str,
            date: NaiveDate,
        ) -> AppResult<Option<Decimal>> {
            self.inner.get_close_price(instrument_id, date).await
        }

        async fn get_close_price_or_carry_forward(
            &self,
            instrument_id: &str,
            date: NaiveDate,
        ) -> AppResult<Option<ResolvedPrice>> {
            if date >= self.fail_from {
                return Err(MarketDataError::ProviderUnavailable(format!(
                    "quote service down for {} on {}",
                    instrument_id, date
                ))
                .into());
            }
            self.inner
                .get_close_price_or_carry_forward(instrument_id, date)
                .await
        }

        async fn get_first_bar_date(&self, instrument_id: &str) -> AppResult<Option<NaiveDate>> {
            self.inner.get_first_bar_date(instrument_id).await
        }
    }

    // --- Calendar that never advances ---
    struct StuckCalendar;

    impl TradingCalendarTrait for StuckCalendar {
        fn is_trading_day(&self, _date: NaiveDate, _exchange: &str) -> bool {
            true
        }

        fn next_trading_day(&self, date: NaiveDate, _exchange: &str) -> NaiveDate {
            date
        }
    }

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, day, 15, 30, 0).unwrap()
    }

    fn instruments() -> Vec<Instrument> {
        [(AAPL, "AAPL"), (MSFT, "MSFT"), (NEWCO, "NEWCO")]
            .into_iter()
            .map(|(id, symbol)| Instrument {
                id: id.to_string(),
                symbol: symbol.to_string(),
                name: None,
                exchange: Some("XNYS".to_string()),
            })
            .collect()
    }

    fn create_test_transaction(
        id: &str,
        instrument_id: &str,
        transaction_type: TransactionType,
        quantity: Decimal,
        price: Decimal,
        trade_at: DateTime<Utc>,
    ) -> Transaction {
        Transaction {
            id: id.to_string(),
            instrument_id: instrument_id.to_string(),
            transaction_type,
            quantity,
            price,
            fees: Decimal::ZERO,
            trade_at,
            notes: None,
        }
    }

    fn buy(
        id: &str,
        instrument_id: &str,
        qty: Decimal,
        price: Decimal,
        trade_at: DateTime<Utc>,
    ) -> Transaction {
        create_test_transaction(id, instrument_id, TransactionType::Buy, qty, price, trade_at)
    }

    fn sell(
        id: &str,
        instrument_id: &str,
        qty: Decimal,
        price: Decimal,
        trade_at: DateTime<Utc>,
    ) -> Transaction {
        create_test_transaction(id, instrument_id, TransactionType::Sell, qty, price, trade_at)
    }

    fn bars(instrument_id: &str, closes: &[(NaiveDate, Decimal)]) -> Vec<PriceBar> {
        closes
            .iter()
            .map(|(date, close)| PriceBar {
                instrument_id: instrument_id.to_string(),
                date: *date,
                close: *close,
            })
            .collect()
    }

    fn create_service(
        price_lookup: Arc<dyn PriceLookupTrait>,
    ) -> (ValuationService, Arc<InMemorySnapshotStore>) {
        let store = Arc::new(InMemorySnapshotStore::new());
        let service = ValuationService::new(
            price_lookup,
            store.clone(),
            Arc::new(WeekdayCalendar::new()),
            EngineConfig::default(),
        );
        (service, store)
    }

    /// Closes 150/152/155/153/158 over 2025-01-02..2025-01-08.
    fn scenario_a_prices() -> Arc<InMemoryPriceLookup> {
        Arc::new(InMemoryPriceLookup::with_bars(bars(
            AAPL,
            &[
                (d(1, 2), dec!(150)),
                (d(1, 3), dec!(152)),
                (d(1, 6), dec!(155)),
                (d(1, 7), dec!(153)),
                (d(1, 8), dec!(158)),
            ],
        )))
    }

    fn holding<'a>(
        snapshot: &'a PortfolioValueSnapshot,
        symbol: &str,
    ) -> &'a HoldingSnapshotEntry {
        snapshot
            .holdings
            .get(symbol)
            .unwrap_or_else(|| panic!("no holding {} on {}", symbol, snapshot.date))
    }

    async fn snapshot_on(store: &InMemorySnapshotStore, date: NaiveDate) -> PortfolioValueSnapshot {
        store
            .get_by_date(date)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("no snapshot on {}", date))
    }

    #[tokio::test]
    async fn test_single_buy_valued_daily() {
        let (service, store) = create_service(scenario_a_prices());
        let ledger = vec![buy("b1", AAPL, dec!(100), dec!(150), at(1, 2))];

        let summary = service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 2), d(1, 8))
            .await
            .unwrap();
        assert_eq!(summary.snapshots_written, 5);

        let first = snapshot_on(&store, d(1, 2)).await;
        assert_eq!(first.total_value, dec!(15000));
        assert_eq!(first.total_cost_basis, dec!(15000));
        assert_eq!(first.unrealized_pnl, dec!(0));
        assert!(!holding(&first, "AAPL").is_estimated());

        let last = snapshot_on(&store, d(1, 8)).await;
        assert_eq!(last.total_value, dec!(15800));
        assert_eq!(last.unrealized_pnl, dec!(800));
        assert_eq!(last.realized_pnl, dec!(0));
    }

    #[tokio::test]
    async fn test_weekends_produce_no_snapshots() {
        let (service, store) = create_service(scenario_a_prices());
        let ledger = vec![buy("b1", AAPL, dec!(100), dec!(150), at(1, 2))];

        let summary = service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 4), d(1, 6))
            .await
            .unwrap();
        assert_eq!(summary.snapshots_written, 1);
        assert!(store.get_by_date(d(1, 4)).await.unwrap().is_none());
        assert!(store.get_by_date(d(1, 5)).await.unwrap().is_none());
        assert_eq!(snapshot_on(&store, d(1, 6)).await.total_value, dec!(15500));
    }

    #[tokio::test]
    async fn test_weekend_trade_appears_on_next_trading_day() {
        let (service, store) = create_service(scenario_a_prices());
        let ledger = vec![buy("b1", AAPL, dec!(10), dec!(150), at(1, 4))];

        service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 3), d(1, 6))
            .await
            .unwrap();
        assert!(snapshot_on(&store, d(1, 3)).await.holdings.is_empty());
        assert_eq!(
            holding(&snapshot_on(&store, d(1, 6)).await, "AAPL").quantity(),
            dec!(10)
        );
    }

    #[tokio::test]
    async fn test_gap_in_prices_is_carried_forward_and_flagged() {
        let prices = Arc::new(InMemoryPriceLookup::with_bars(bars(
            AAPL,
            &[(d(1, 2), dec!(150)), (d(1, 7), dec!(160))],
        )));
        let (service, store) = create_service(prices);
        let ledger = vec![buy("b1", AAPL, dec!(100), dec!(150), at(1, 2))];

        service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 2), d(1, 8))
            .await
            .unwrap();

        for date in [d(1, 3), d(1, 6)] {
            let snapshot = snapshot_on(&store, date).await;
            let entry = holding(&snapshot, "AAPL");
            assert!(entry.is_estimated(), "{} should be estimated", date);
            assert_eq!(entry.value(), dec!(15000));
            assert_eq!(snapshot.total_value, dec!(15000));
            assert!(matches!(
                entry,
                HoldingSnapshotEntry::CarryForward { price_date, .. } if *price_date == d(1, 2)
            ));
        }

        let fresh = snapshot_on(&store, d(1, 7)).await;
        let entry = holding(&fresh, "AAPL");
        assert!(!entry.is_estimated());
        assert!(!entry.is_cost_basis_only());
        assert_eq!(entry.value(), dec!(16000));

        // 01-08 has no bar: carried forward from 01-07.
        let after = snapshot_on(&store, d(1, 8)).await;
        assert!(holding(&after, "AAPL").is_estimated());
        assert_eq!(after.total_value, dec!(16000));
    }

    #[tokio::test]
    async fn test_unpriced_holding_counts_only_toward_cost_basis() {
        let (service, store) = create_service(scenario_a_prices());
        let ledger = vec![
            buy("b1", AAPL, dec!(100), dec!(150), at(1, 2)),
            buy("b2", NEWCO, dec!(20), dec!(25), at(1, 2)),
        ];

        service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 2), d(1, 3))
            .await
            .unwrap();

        let snapshot = snapshot_on(&store, d(1, 3)).await;
        let newco = holding(&snapshot, "NEWCO");
        assert!(newco.is_cost_basis_only());
        assert_eq!(newco.value(), Decimal::ZERO);
        assert_eq!(newco.cost_basis(), dec!(500));

        assert_eq!(snapshot.total_value, dec!(15200));
        assert_eq!(snapshot.total_cost_basis, dec!(15500));
        assert_eq!(snapshot.unrealized_pnl, dec!(200));
    }

    #[tokio::test]
    async fn test_position_opened_before_first_bar() {
        let prices = Arc::new(InMemoryPriceLookup::with_bars(bars(
            MSFT,
            &[(d(1, 6), dec!(410)), (d(1, 7), dec!(415))],
        )));
        let (service, store) = create_service(prices);
        let ledger = vec![buy("b1", MSFT, dec!(2), dec!(400), at(1, 2))];

        service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 2), d(1, 7))
            .await
            .unwrap();

        for date in [d(1, 2), d(1, 3)] {
            let snapshot = snapshot_on(&store, date).await;
            assert!(holding(&snapshot, "MSFT").is_cost_basis_only());
            assert_eq!(snapshot.total_value, Decimal::ZERO);
            assert_eq!(snapshot.total_cost_basis, dec!(800));
            assert_eq!(snapshot.unrealized_pnl, Decimal::ZERO);
        }
        let priced = snapshot_on(&store, d(1, 6)).await;
        assert_eq!(priced.total_value, dec!(820));
        assert_eq!(priced.unrealized_pnl, dec!(20));
    }

    #[tokio::test]
    async fn test_empty_portfolio_still_writes_zero_snapshots() {
        let (service, store) = create_service(scenario_a_prices());

        let summary = service
            .build_portfolio_value_series(&[], &instruments(), d(1, 2), d(1, 8))
            .await
            .unwrap();
        assert_eq!(summary.snapshots_written, 5);
        for snapshot in store.get_range(d(1, 2), d(1, 8)).await.unwrap() {
            assert_eq!(snapshot.total_value, Decimal::ZERO);
            assert_eq!(snapshot.total_cost_basis, Decimal::ZERO);
            assert_eq!(snapshot.realized_pnl, Decimal::ZERO);
            assert!(snapshot.holdings.is_empty());
        }
    }

    #[tokio::test]
    async fn test_closed_position_leaves_realized_and_empty_holdings() {
        let (service, store) = create_service(scenario_a_prices());
        let mut closing = sell("s1", AAPL, dec!(100), dec!(152), at(1, 3));
        closing.fees = dec!(5);
        let ledger = vec![buy("b1", AAPL, dec!(100), dec!(150), at(1, 2)), closing];

        service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 2), d(1, 8))
            .await
            .unwrap();

        let first = snapshot_on(&store, d(1, 2)).await;
        assert_eq!(first.realized_pnl, Decimal::ZERO);
        for date in [d(1, 3), d(1, 6), d(1, 8)] {
            let snapshot = snapshot_on(&store, date).await;
            assert!(snapshot.holdings.is_empty());
            assert_eq!(snapshot.total_value, Decimal::ZERO);
            assert_eq!(snapshot.realized_pnl, dec!(195));
        }
    }

    #[tokio::test]
    async fn test_realized_pnl_is_cumulative_across_instruments() {
        let prices = scenario_a_prices();
        for (date, close) in [(d(1, 2), dec!(400)), (d(1, 6), dec!(420))] {
            prices.insert_bar(MSFT, date, close).unwrap();
        }
        let (service, store) = create_service(prices);
        let ledger = vec![
            buy("b1", AAPL, dec!(10), dec!(150), at(1, 2)),
            buy("b2", MSFT, dec!(10), dec!(400), at(1, 2)),
            sell("s1", AAPL, dec!(5), dec!(152), at(1, 3)),
            sell("s2", MSFT, dec!(5), dec!(420), at(1, 6)),
        ];

        service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 2), d(1, 8))
            .await
            .unwrap();

        let realized: Vec<Decimal> = store
            .get_range(d(1, 2), d(1, 8))
            .await
            .unwrap()
            .iter()
            .map(|s| s.realized_pnl)
            .collect();
        assert_eq!(
            realized,
            vec![dec!(0), dec!(10), dec!(110), dec!(110), dec!(110)]
        );
    }

    #[tokio::test]
    async fn test_start_after_ledger_begins_includes_prior_lots() {
        let (service, store) = create_service(scenario_a_prices());
        let ledger = vec![
            buy("b1", AAPL, dec!(100), dec!(100), at(1, 2)),
            sell("s1", AAPL, dec!(40), dec!(152), at(1, 3)),
        ];

        let summary = service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 7), d(1, 8))
            .await
            .unwrap();
        assert_eq!(summary.snapshots_written, 2);
        let snapshot = snapshot_on(&store, d(1, 7)).await;
        assert_eq!(holding(&snapshot, "AAPL").quantity(), dec!(60));
        assert_eq!(snapshot.total_cost_basis, dec!(6000));
        assert_eq!(snapshot.realized_pnl, dec!(2080));
    }

    #[tokio::test]
    async fn test_unknown_instrument_is_keyed_by_id() {
        let prices = scenario_a_prices();
        prices.insert_bar("inst-unlisted", d(1, 2), dec!(3)).unwrap();
        let (service, store) = create_service(prices);
        let ledger = vec![buy("b1", "inst-unlisted", dec!(10), dec!(2), at(1, 2))];

        service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 2), d(1, 2))
            .await
            .unwrap();
        let snapshot = snapshot_on(&store, d(1, 2)).await;
        assert_eq!(holding(&snapshot, "inst-unlisted").value(), dec!(30));
    }

    #[tokio::test]
    async fn test_shared_symbol_keeps_each_instrument_id() {
        let prices = Arc::new(InMemoryPriceLookup::with_bars(
            bars("inst-a", &[(d(1, 2), dec!(10))])
                .into_iter()
                .chain(bars("inst-b", &[(d(1, 2), dec!(20))])),
        ));
        let (service, store) = create_service(prices);
        let listed: Vec<Instrument> = ["inst-a", "inst-b"]
            .into_iter()
            .map(|id| Instrument {
                id: id.to_string(),
                symbol: "X".to_string(),
                name: None,
                exchange: None,
            })
            .collect();
        let ledger = vec![
            buy("b1", "inst-a", dec!(1), dec!(10), at(1, 2)),
            buy("b2", "inst-b", dec!(1), dec!(20), at(1, 2)),
        ];

        let result = service
            .query_portfolio_window(&WindowQuery::new(d(1, 2), d(1, 2)), &ledger, &listed)
            .await
            .unwrap();

        let snapshot = snapshot_on(&store, d(1, 2)).await;
        assert_eq!(snapshot.total_value, dec!(30));
        assert_eq!(holding(&snapshot, "X").instrument_id(), "inst-a");
        assert_eq!(holding(&snapshot, "inst-b").instrument_id(), "inst-b");

        let tagged: Vec<(&str, &str, Decimal)> = result
            .holdings
            .iter()
            .map(|h| (h.instrument_id.as_str(), h.symbol.as_str(), h.value))
            .collect();
        assert_eq!(
            tagged,
            vec![("inst-b", "X", dec!(20)), ("inst-a", "X", dec!(10))]
        );
    }

    #[tokio::test]
    async fn test_rebuilding_twice_is_idempotent() {
        let (service, store) = create_service(scenario_a_prices());
        let ledger = vec![
            buy("b1", AAPL, dec!(100), dec!(150), at(1, 2)),
            sell("s1", AAPL, dec!(30), dec!(155), at(1, 6)),
        ];

        service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 2), d(1, 8))
            .await
            .unwrap();
        let first = store.get_range(d(1, 2), d(1, 8)).await.unwrap();
        service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 2), d(1, 8))
            .await
            .unwrap();
        let second = store.get_range(d(1, 2), d(1, 8)).await.unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert!(a.is_content_equal(b), "snapshot {} changed", a.date);
        }
    }

    #[tokio::test]
    async fn test_later_transaction_never_changes_earlier_snapshots() {
        let (service, store) = create_service(scenario_a_prices());
        let base = vec![buy("b1", AAPL, dec!(100), dec!(150), at(1, 2))];
        service
            .build_portfolio_value_series(&base, &instruments(), d(1, 2), d(1, 8))
            .await
            .unwrap();
        let before = store.get_range(d(1, 2), d(1, 8)).await.unwrap();

        let mut extended = base.clone();
        extended.push(buy("b2", AAPL, dec!(50), dec!(153), at(1, 7)));
        service
            .build_portfolio_value_series(&extended, &instruments(), d(1, 2), d(1, 8))
            .await
            .unwrap();
        let after = store.get_range(d(1, 2), d(1, 8)).await.unwrap();

        for (a, b) in before.iter().zip(after.iter()) {
            if a.date < d(1, 7) {
                assert!(a.is_content_equal(b), "snapshot {} changed", a.date);
            } else {
                assert!(!a.is_content_equal(b), "snapshot {} should change", a.date);
            }
        }
    }

    #[tokio::test]
    async fn test_rebuild_from_backdated_sell_preserves_history() {
        let prices = Arc::new(InMemoryPriceLookup::with_bars(bars(
            AAPL,
            &[
                (d(1, 2), dec!(100)),
                (d(1, 3), dec!(104)),
                (d(1, 6), dec!(110)),
                (d(1, 7), dec!(108)),
                (d(1, 8), dec!(112)),
            ],
        )));
        let (service, store) = create_service(prices);
        let mut ledger = vec![buy("b1", AAPL, dec!(100), dec!(100), at(1, 2))];
        service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 2), d(1, 8))
            .await
            .unwrap();
        let untouched_before = vec![
            snapshot_on(&store, d(1, 2)).await,
            snapshot_on(&store, d(1, 3)).await,
        ];

        ledger.push(sell("s1", AAPL, dec!(50), dec!(110), at(1, 6)));
        let summary = service
            .rebuild_snapshots_from(d(1, 6), &ledger, &instruments(), d(1, 8))
            .await
            .unwrap();
        assert_eq!(summary.snapshots_rebuilt, 3);

        let rebuilt = snapshot_on(&store, d(1, 6)).await;
        assert_eq!(holding(&rebuilt, "AAPL").quantity(), dec!(50));
        assert_eq!(rebuilt.total_value, dec!(5500));
        assert_eq!(rebuilt.realized_pnl, dec!(500));
        assert_eq!(snapshot_on(&store, d(1, 8)).await.total_value, dec!(5600));

        let untouched_after = vec![
            snapshot_on(&store, d(1, 2)).await,
            snapshot_on(&store, d(1, 3)).await,
        ];
        assert_eq!(untouched_before, untouched_after);
    }

    #[tokio::test]
    async fn test_rebuild_after_end_date_is_a_no_op() {
        let (service, store) = create_service(scenario_a_prices());
        let summary = service
            .rebuild_snapshots_from(d(1, 9), &[], &instruments(), d(1, 8))
            .await
            .unwrap();
        assert_eq!(summary.snapshots_rebuilt, 0);
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_failed_build_leaves_store_untouched() {
        let good = scenario_a_prices();
        let (service, store) = create_service(good);
        let ledger = vec![buy("b1", AAPL, dec!(100), dec!(150), at(1, 2))];
        service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 2), d(1, 8))
            .await
            .unwrap();
        let before = store.get_range(d(1, 2), d(1, 8)).await.unwrap();

        let failing = Arc::new(FailingPriceLookup {
            inner: InMemoryPriceLookup::with_bars(bars(AAPL, &[(d(1, 2), dec!(1))])),
            fail_from: d(1, 7),
        });
        let broken = ValuationService::new(
            failing,
            store.clone(),
            Arc::new(WeekdayCalendar::new()),
            EngineConfig::default(),
        );
        let err = broken
            .rebuild_snapshots_from(d(1, 2), &ledger, &instruments(), d(1, 8))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MarketData(_)));

        let after = store.get_range(d(1, 2), d(1, 8)).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_stalled_calendar_is_an_error() {
        let store = Arc::new(InMemorySnapshotStore::new());
        let service = ValuationService::new(
            scenario_a_prices(),
            store.clone(),
            Arc::new(StuckCalendar),
            EngineConfig::default(),
        );
        let err = service
            .build_portfolio_value_series(&[], &instruments(), d(1, 2), d(1, 8))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Calculation(CalculatorError::CalendarStalled { .. })
        ));
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_tiny_position_still_counts_toward_cost_basis() {
        let (service, store) = create_service(scenario_a_prices());
        let ledger = vec![buy("b1", AAPL, dec!(0.000000001), dec!(1000000), at(1, 2))];

        service
            .build_portfolio_value_series(&ledger, &instruments(), d(1, 2), d(1, 2))
            .await
            .unwrap();
        let snapshot = snapshot_on(&store, d(1, 2)).await;
        assert_eq!(snapshot.holdings.len(), 1);
        assert_eq!(snapshot.total_cost_basis, dec!(0.001));
        assert_eq!(snapshot.total_value, dec!(0.00000015));
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let (service, _store) = create_service(scenario_a_prices());
        let err = service
            .build_portfolio_value_series(&[], &instruments(), d(1, 8), d(1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_affected_date_uses_configured_timezone() {
        let (service, _store) = create_service(scenario_a_prices());
        let instant = Utc.with_ymd_and_hms(2025, 1, 6, 23, 30, 0).unwrap();
        assert_eq!(service.affected_date(instant), d(1, 6));
    }

    // --- Window queries ---

    #[tokio::test]
    async fn test_window_change_metrics() {
        let (service, store) = create_service(scenario_a_prices());
        let ledger = vec![buy("b1", AAPL, dec!(100), dec!(150), at(1, 2))];

        let result = service
            .query_portfolio_window(&WindowQuery::new(d(1, 2), d(1, 8)), &ledger, &instruments())
            .await
            .unwrap();

        assert_eq!(result.start_value, dec!(15000));
        assert_eq!(result.end_value, dec!(15800));
        assert_eq!(result.absolute_change, dec!(800));
        assert_eq!(result.percentage_change, dec!(800) / dec!(15000));
        assert_eq!(result.unrealized_pnl_at_end, dec!(800));
        assert_eq!(result.realized_pnl_in_window, Decimal::ZERO);
        assert_eq!(result.series.len(), 5);
        assert_eq!(result.holdings.len(), 1);
        assert_eq!(result.holdings[0].instrument_id, AAPL);
        assert_eq!(result.holdings[0].unrealized_pnl, Some(dec!(800)));

        // Write-through: the window's snapshots are now stored.
        assert_eq!(store.len().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_window_over_empty_portfolio_is_zero() {
        let (service, _store) = create_service(scenario_a_prices());
        let result = service
            .query_portfolio_window(&WindowQuery::new(d(1, 2), d(1, 8)), &[], &instruments())
            .await
            .unwrap();
        assert_eq!(result.start_value, Decimal::ZERO);
        assert_eq!(result.end_value, Decimal::ZERO);
        assert_eq!(result.percentage_change, Decimal::ZERO);
        assert!(result.holdings.is_empty());
    }

    #[tokio::test]
    async fn test_window_realized_only_counts_sells_inside_window() {
        let (service, _store) = create_service(scenario_a_prices());
        let ledger = vec![
            buy("b1", AAPL, dec!(100), dec!(150), at(1, 2)),
            sell("s1", AAPL, dec!(10), dec!(152), at(1, 3)),
            sell("s2", AAPL, dec!(10), dec!(158), at(1, 8)),
        ];

        let result = service
            .query_portfolio_window(&WindowQuery::new(d(1, 6), d(1, 8)), &ledger, &instruments())
            .await
            .unwrap();
        assert_eq!(result.realized_pnl_in_window, dec!(80));
        assert_eq!(result.start_value, dec!(90) * dec!(155));
        assert_eq!(result.end_value, dec!(80) * dec!(158));
    }

    #[tokio::test]
    async fn test_window_as_of_hides_later_trades() {
        let (service, _store) = create_service(scenario_a_prices());
        let ledger = vec![
            buy("b1", AAPL, dec!(100), dec!(150), at(1, 2)),
            buy("b2", AAPL, dec!(100), dec!(153), at(1, 7)),
        ];
        let query = WindowQuery::new(d(1, 2), d(1, 8)).as_of_end_of_day(d(1, 6), chrono_tz::UTC);

        let result = service
            .query_portfolio_window(&query, &ledger, &instruments())
            .await
            .unwrap();
        assert_eq!(result.end_value, dec!(15800));
        assert_eq!(result.holdings[0].quantity, dec!(100));
    }
}
