use ticket_watcher::core::PriceScanner;
use ticket_watcher::models::RawListing;
use ticket_watcher::{AppError, Fatal};

use super::*;

#[tokio::test(start_paused = true)]
async fn test_scan_reads_rows_in_document_order() {
    let config = test_config();
    let driver = FakeDriver::new().with_pages(vec![page(&["$45.00", " $80 ", "$150"])]);
    let mut session = session(driver);

    let listings = PriceScanner::new(&config.selectors)
        .scan(&mut session)
        .await
        .unwrap();

    assert_eq!(
        listings,
        vec![
            RawListing::from("$45.00"),
            RawListing::from(" $80 "),
            RawListing::from("$150"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_scan_tolerates_broken_rows() {
    let config = test_config();
    let driver = FakeDriver::new().with_pages(vec![vec![
        Cell::Text("$80".to_string()),
        Cell::Missing,
        Cell::Unreadable,
        Cell::Text("$95".to_string()),
    ]]);
    let mut session = session(driver);

    let listings = PriceScanner::new(&config.selectors)
        .scan(&mut session)
        .await
        .unwrap();

    assert_eq!(
        listings,
        vec![
            RawListing::from("$80"),
            RawListing::empty(),
            RawListing::empty(),
            RawListing::from("$95"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_scan_empty_table() {
    let config = test_config();
    let driver = FakeDriver::new().with_pages(vec![vec![]]);
    let mut session = session(driver);

    let listings = PriceScanner::new(&config.selectors)
        .scan(&mut session)
        .await
        .unwrap();

    assert!(listings.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_table_is_fatal() {
    let config = test_config();
    let driver = FakeDriver::new();
    let mut session = session(driver);

    let err = PriceScanner::new(&config.selectors)
        .scan(&mut session)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Fatal(Fatal::TicketTableNotFound)));
}
