//! End-to-end dashboard flow: meter samples go in through the domain
//! services, come back out as a usage series and drive the dashboard
//! controller the same way the page does.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;

use daya::aggregate::{Aggregator, AggregatorConfig, DisplayLocale, MonthKey};
use daya::dashboard::{DashboardConfig, DashboardController, MonthChoice, WeekChoice};
use daya::domain::{DomainConfig, PowerService, RoomInput, RoomService};
use daya::notify::{FlashMessage, Severity, ToastQueue};
use daya::sdk::{Sdk, SdkConfig};
use daya::toggle::{Dropdown, NavDrawer};

fn utc(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
}

#[tokio::test]
async fn test_samples_to_filtered_chart() {
    let sdk = Sdk::bootstrap(&SdkConfig::in_memory()).unwrap();
    let rooms = RoomService::new(Arc::clone(sdk.store()));
    let power = PowerService::new(Arc::clone(sdk.store()), DomainConfig::default());

    let room = rooms
        .create(RoomInput {
            number: "101".to_string(),
            tariff_per_kwh: 1400.0,
            limit_kwh: 5.0,
        })
        .await
        .unwrap();

    // 1 kWh each at one-second sampling; 23:30 UTC on Apr 30 is May 1 locally
    for at in [
        "2024-04-10T01:00:00Z",
        "2024-04-30T23:30:00Z",
        "2024-05-01T02:00:00Z",
        "2024-05-09T03:00:00Z",
    ] {
        power.record(&room.id, 3_600_000.0, Some(utc(at))).await.unwrap();
    }

    let series = power.usage_series(&room.id, None).await.unwrap();
    assert_eq!(series.labels.len(), 4);

    let config = AggregatorConfig::new(DisplayLocale::EnglishUs, 7).unwrap();
    let aggregation = Aggregator::new(config)
        .aggregate(&series.labels, &series.values)
        .unwrap();

    let may = MonthKey::new(2024, 5).unwrap();
    assert_eq!(aggregation.month(may).unwrap().total, 3.0);
    assert_eq!(aggregation.total(), 4.0);

    let mut dashboard = DashboardController::mount(aggregation, DashboardConfig::default(), 1280.0);

    // newest month first, per-day totals
    assert_eq!(dashboard.controls().month, MonthChoice::Month(may));
    assert_eq!(dashboard.chart().series().values, vec![2.0, 1.0]);

    let week_two = dashboard.select_week(WeekChoice::Week(2)).unwrap();
    assert_eq!(week_two.values, vec![1.0]);

    let everything = dashboard.select_month(MonthChoice::All).unwrap();
    assert_eq!(everything.values, vec![1.0, 1.0, 1.0, 1.0]);
    assert!(!dashboard.controls().week_enabled);

    dashboard.resize(375.0);
    assert!(dashboard.chart().config().compact_labels);
    dashboard.teardown();
}

#[test]
fn test_page_attributes_and_notices() {
    let aggregation = Aggregator::new(AggregatorConfig::default())
        .from_json_attributes(
            r#"["2024-05-01T08:00:00", "2024-05-02T08:00:00"]"#,
            "[1.5, 2.5]",
        )
        .unwrap();
    let dashboard = DashboardController::mount(aggregation, DashboardConfig::default(), 1024.0);
    assert_eq!(dashboard.controls().month_options[0].label, "Semua Data");
    assert_eq!(dashboard.chart().series().total(), 4.0);

    let mut toasts = ToastQueue::new(3000);
    toasts.replay(
        &[
            FlashMessage::success("Kamar berhasil ditambahkan!"),
            FlashMessage::new("danger", "Nomor kamar sudah digunakan."),
        ],
        0,
    );
    assert_eq!(toasts.visible()[1].severity, Severity::Error);
    assert!(toasts.expire(2999).is_empty());
    assert_eq!(toasts.expire(3000).len(), 2);

    let mut drawer = NavDrawer::default();
    let mut dropdown = Dropdown::default();
    drawer.toggle();
    dropdown.toggle();
    assert_eq!((drawer.left_offset(), dropdown.display()), ("0", "block"));
    drawer.toggle();
    dropdown.toggle();
    assert_eq!((drawer.left_offset(), dropdown.display()), ("-100%", "none"));
}
