//! Dashboard Page
//!
//! Usage chart with month/week filters for one room. Tenants see their own
//! room; owners pick from the room overview, which also shows each room's
//! latest bill and relay switch.

use daya::aggregate::{AggregateError, Aggregator, AggregatorConfig};
use daya::dashboard::{DashboardConfig, DashboardController};
use leptos::*;
use leptos_router::*;

use crate::api::{self, Overview, RoomOverview, UsageSeries};
use crate::components::{Chart, FilterBar, Loading};
use crate::state::global::GlobalState;

/// Bucket a usage series and mount a fresh controller over it
fn mount_dashboard(series: &UsageSeries, width: f64) -> Result<DashboardController, AggregateError> {
    let aggregation =
        Aggregator::new(AggregatorConfig::default()).aggregate(&series.labels, &series.values)?;
    Ok(DashboardController::mount(aggregation, DashboardConfig::default(), width))
}

#[component]
pub fn Dashboard() -> impl IntoView {
    let state = expect_context::<GlobalState>();

    view! {
        <Show
            when=move || state.session.get().is_some()
            fallback=|| view! {
                <div class="text-center py-16">
                    <A href="/login" class="px-6 py-3 bg-blue-600 text-white rounded-lg">
                        "Masuk untuk melihat dashboard"
                    </A>
                </div>
            }
        >
            <RoomDashboard />
        </Show>
    }
}

#[component]
fn RoomDashboard() -> impl IntoView {
    let state = expect_context::<GlobalState>();

    let overview = create_rw_signal(None::<Overview>);
    let selected_room = create_rw_signal(None::<String>);
    let dashboard = create_rw_signal(None::<DashboardController>);

    // Overview once per mount
    spawn_local(async move {
        let Some(token) = state.token() else {
            return;
        };
        state.loading.set(true);
        match api::fetch_overview(&token).await {
            Ok(result) => {
                let first_room = match &result {
                    Overview::Owner { rooms, .. } => rooms.first().map(|r| r.room.id.clone()),
                    Overview::Tenant { room, flash, .. } => {
                        if let Some(flash) = flash {
                            state.flash(flash);
                        }
                        room.as_ref().map(|r| r.room.id.clone())
                    }
                };
                overview.set(Some(result));
                selected_room.set(first_room);
            }
            Err(e) => state.show_error(&e),
        }
        state.loading.set(false);
    });

    // Reload the chart whenever the room changes
    create_effect(move |_| {
        let Some(room_id) = selected_room.get() else {
            return;
        };
        let Some(token) = state.token() else {
            return;
        };
        spawn_local(async move {
            match api::fetch_usage(&token, &room_id, None).await {
                Ok(series) => match mount_dashboard(&series, state.viewport_width.get_untracked()) {
                    Ok(controller) => dashboard.update(|d| {
                        if let Some(old) = d.replace(controller) {
                            old.teardown();
                        }
                    }),
                    Err(e) => state.show_error(&e.to_string()),
                },
                Err(e) => state.show_error(&e),
            }
        });
    });

    on_cleanup(move || {
        let _ = dashboard.try_update(|d| {
            if let Some(old) = d.take() {
                old.teardown();
            }
        });
    });

    let total = move || {
        dashboard.with(|d| {
            d.as_ref()
                .map(|d| d.chart().series().total())
                .unwrap_or_default()
        })
    };

    view! {
        <div class="space-y-8">
            <div class="flex items-center justify-between">
                <div>
                    <h1 class="text-3xl font-bold">"Dashboard"</h1>
                    <p class="text-gray-500 mt-1">"Pemakaian daya per kamar"</p>
                </div>
                <div class="text-lg font-semibold">
                    {move || format!("{:.3} kWh", total())}
                </div>
            </div>

            <section class="bg-white rounded-xl shadow p-6">
                {move || {
                    if dashboard.with(Option::is_some) {
                        view! {
                            <FilterBar dashboard=dashboard />
                            <Chart dashboard=dashboard />
                        }.into_view()
                    } else {
                        view! { <Loading /> }.into_view()
                    }
                }}
            </section>

            {move || match overview.get() {
                Some(Overview::Owner { rooms, .. }) => view! {
                    <RoomList rooms=rooms selected=selected_room overview=overview />
                }.into_view(),
                Some(Overview::Tenant { room: Some(room), .. }) => view! {
                    <RoomCard room=room selected=selected_room overview=overview owner=false />
                }.into_view(),
                _ => view! {}.into_view(),
            }}
        </div>
    }
}

#[component]
fn RoomList(
    rooms: Vec<RoomOverview>,
    selected: RwSignal<Option<String>>,
    overview: RwSignal<Option<Overview>>,
) -> impl IntoView {
    view! {
        <section class="grid md:grid-cols-3 gap-4">
            {rooms
                .into_iter()
                .map(|room| view! { <RoomCard room=room selected=selected overview=overview owner=true /> })
                .collect_view()}
        </section>
    }
}

#[component]
fn RoomCard(
    room: RoomOverview,
    selected: RwSignal<Option<String>>,
    overview: RwSignal<Option<Overview>>,
    owner: bool,
) -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let room_id = room.room.id.clone();
    let relay_on = room.room.relay_on;

    let is_selected = {
        let room_id = room_id.clone();
        move || selected.get().as_deref() == Some(room_id.as_str())
    };

    let on_select = {
        let room_id = room_id.clone();
        move |_| selected.set(Some(room_id.clone()))
    };

    let on_relay = move |_| {
        let Some(token) = state.token() else {
            return;
        };
        let room_id = room_id.clone();
        spawn_local(async move {
            match api::set_relay(&token, &room_id, !relay_on).await {
                Ok(notice) => {
                    state.flash(&notice.flash);
                    overview.update(|o| {
                        if let Some(Overview::Owner { rooms, .. }) = o {
                            for entry in rooms.iter_mut().filter(|r| r.room.id == room_id) {
                                entry.room = notice.data.clone();
                            }
                        }
                    });
                }
                Err(e) => state.show_error(&e),
            }
        });
    };

    let bill_line = room
        .latest_bill
        .as_ref()
        .map(|b| format!("Tagihan {}: Rp {:.0} ({})", b.month, b.total, b.status_label()))
        .unwrap_or_else(|| "Belum ada tagihan".to_string());

    view! {
        <div
            class=move || {
                let base = "bg-white rounded-xl shadow p-4 cursor-pointer";
                if is_selected() {
                    format!("{} ring-2 ring-blue-500", base)
                } else {
                    base.to_string()
                }
            }
            on:click=on_select
        >
            <h3 class="text-lg font-semibold">{format!("Kamar {}", room.room.number)}</h3>
            <p class="text-sm text-gray-500">
                {format!("Batas {:.1} kWh, Rp {:.0}/kWh", room.room.limit_kwh, room.room.tariff_per_kwh)}
            </p>
            <p class="text-sm mt-2">{bill_line}</p>
            {owner.then(|| view! {
                <button
                    class=if relay_on {
                        "mt-3 px-3 py-1 rounded text-white text-sm bg-green-600"
                    } else {
                        "mt-3 px-3 py-1 rounded text-white text-sm bg-gray-500"
                    }
                    on:click=on_relay.clone()
                >
                    {if relay_on { "Relay ON" } else { "Relay OFF" }}
                </button>
            })}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_dashboard_starts_on_newest_month() {
        let series = UsageSeries {
            labels: vec![
                "2024-04-10T01:00:00Z".to_string(),
                "2024-05-02T01:00:00Z".to_string(),
            ],
            values: vec![1.0, 2.0],
        };
        let controller = mount_dashboard(&series, 375.0).unwrap();
        assert_eq!(controller.chart().series().values, vec![2.0]);
        assert!(controller.chart().config().compact_labels);
    }

    #[test]
    fn test_mount_dashboard_rejects_mismatched_series() {
        let series = UsageSeries {
            labels: vec!["2024-05-02T01:00:00Z".to_string()],
            values: Vec::new(),
        };
        assert!(mount_dashboard(&series, 1024.0).is_err());
    }
}
