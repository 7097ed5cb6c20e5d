//! Month and week selects
//!
//! Both selects mirror the controller's filter controls. A failed selection
//! (month gone, week out of range) leaves the chart as it was and shows an
//! error toast.

use daya::dashboard::{DashboardController, FilterError, MonthChoice, SelectOption, WeekChoice};
use leptos::*;

use crate::state::global::GlobalState;

#[derive(Clone, Copy)]
enum Select {
    Month,
    Week,
}

fn apply(controller: &mut DashboardController, select: Select, raw: &str) -> Result<(), FilterError> {
    match select {
        Select::Month => controller.select_month(MonthChoice::parse(raw)?).map(|_| ()),
        Select::Week => controller.select_week(WeekChoice::parse(raw)?).map(|_| ()),
    }
}

#[component]
pub fn FilterBar(dashboard: RwSignal<Option<DashboardController>>) -> impl IntoView {
    let state = expect_context::<GlobalState>();

    let on_change = move |select: Select, raw: String| {
        let mut outcome = Ok(());
        dashboard.update(|d| {
            if let Some(d) = d {
                outcome = apply(d, select, &raw);
            }
        });
        if let Err(e) = outcome {
            state.show_error(&e.to_string());
        }
    };

    let controls = move || dashboard.with(|d| d.as_ref().map(|d| (d.controls().clone(), d.config().labels.clone())));

    view! {
        {move || controls().map(|(controls, labels)| view! {
            <div class="flex flex-wrap items-center gap-4 mb-4">
                <label class="flex items-center space-x-2">
                    <span class="text-sm text-gray-600">{labels.month_caption.clone()}</span>
                    <select
                        id="monthFilter"
                        class="border rounded px-2 py-1"
                        on:change=move |ev| on_change(Select::Month, event_target_value(&ev))
                        prop:value=controls.month.value()
                    >
                        <Options options=controls.month_options.clone() selected=controls.month.value() />
                    </select>
                </label>

                <label class="flex items-center space-x-2">
                    <span class="text-sm text-gray-600">{labels.week_caption.clone()}</span>
                    <select
                        id="weekFilter"
                        class="border rounded px-2 py-1 disabled:opacity-50"
                        on:change=move |ev| on_change(Select::Week, event_target_value(&ev))
                        prop:disabled=!controls.week_enabled
                        prop:value=controls.week.value()
                    >
                        <Options options=controls.week_options.clone() selected=controls.week.value() />
                    </select>
                </label>
            </div>
        })}
    }
}

#[component]
fn Options(options: Vec<SelectOption>, selected: String) -> impl IntoView {
    options
        .into_iter()
        .map(|option| {
            let is_selected = option.value == selected;
            view! {
                <option value=option.value selected=is_selected>{option.label}</option>
            }
        })
        .collect_view()
}

#[cfg(test)]
mod tests {
    use super::*;
    use daya::aggregate::{Aggregator, AggregatorConfig};
    use daya::dashboard::DashboardConfig;

    fn controller() -> DashboardController {
        let timestamps = vec![
            "2024-05-01T08:00:00".to_string(),
            "2024-05-08T08:00:00".to_string(),
        ];
        let aggregation = Aggregator::new(AggregatorConfig::default())
            .aggregate(&timestamps, &[1.0, 2.0])
            .unwrap();
        DashboardController::mount(aggregation, DashboardConfig::default(), 1024.0)
    }

    #[test]
    fn test_apply_week_select() {
        let mut controller = controller();
        apply(&mut controller, Select::Week, "2").unwrap();
        assert_eq!(controller.chart().series().values, vec![2.0]);
    }

    #[test]
    fn test_apply_rejects_garbage() {
        let mut controller = controller();
        assert!(apply(&mut controller, Select::Month, "not-a-month").is_err());
        assert_eq!(controller.chart().series().values, vec![1.0, 2.0]);
    }
}
