//! Chart Component
//!
//! Line chart of the dashboard's current series on an HTML5 canvas. Sizing
//! (fonts, tick count, legend, label rotation) comes from the chart state's
//! breakpoint config, so a resize only has to feed the new width through
//! the controller.

use daya::dashboard::{ChartState, DashboardController, LegendPosition};
use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::state::global::GlobalState;

const LINE_COLOR: &str = "#2563eb";
const FILL_COLOR: &str = "rgba(37, 99, 235, 0.15)";
const GRID_COLOR: &str = "#e5e7eb";
const TEXT_COLOR: &str = "#4b5563";

/// Plot area inside the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl PlotArea {
    fn new(canvas_width: f64, canvas_height: f64, legend: LegendPosition) -> Self {
        let (top, bottom) = match legend {
            LegendPosition::Top => (40.0, 60.0),
            LegendPosition::Bottom => (16.0, 84.0),
        };
        Self {
            left: 56.0,
            top,
            width: (canvas_width - 56.0 - 16.0).max(1.0),
            height: (canvas_height - top - bottom).max(1.0),
        }
    }

    /// Canvas coordinates of each value; y grows downward
    fn points(&self, values: &[f64], lo: f64, hi: f64) -> Vec<(f64, f64)> {
        let span = if hi > lo { hi - lo } else { 1.0 };
        let step = if values.len() > 1 {
            self.width / (values.len() - 1) as f64
        } else {
            0.0
        };
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let x = if values.len() > 1 {
                    self.left + i as f64 * step
                } else {
                    self.left + self.width / 2.0
                };
                let y = self.top + (hi - v) / span * self.height;
                (x, y)
            })
            .collect()
    }
}

/// y-axis bounds: zero-based, padded above the max
fn value_bounds(range: Option<(f64, f64)>) -> (f64, f64) {
    match range {
        Some((lo, hi)) => {
            let lo = lo.min(0.0);
            let hi = if hi > lo { hi + (hi - lo) / 4.0 } else { lo + 1.0 };
            (lo, hi)
        }
        None => (0.0, 1.0),
    }
}

#[component]
pub fn Chart(dashboard: RwSignal<Option<DashboardController>>) -> impl IntoView {
    let state = expect_context::<GlobalState>();
    let canvas_ref = create_node_ref::<html::Canvas>();

    // viewport changes go through the controller
    create_effect(move |_| {
        let width = state.viewport_width.get();
        dashboard.update(|d| {
            if let Some(d) = d {
                d.resize(width);
            }
        });
    });

    create_effect(move |_| {
        dashboard.with(|d| {
            if let (Some(d), Some(canvas)) = (d, canvas_ref.get()) {
                draw_chart(&canvas, d.chart());
            }
        });
    });

    view! {
        <canvas
            id="powerChart"
            node_ref=canvas_ref
            width="800"
            height="400"
            class="w-full h-64 md:h-96 rounded-lg bg-white"
        />
    }
}

fn draw_chart(canvas: &HtmlCanvasElement, chart: &ChartState) {
    let ctx = match canvas.get_context("2d") {
        Ok(Some(ctx)) => match ctx.dyn_into::<CanvasRenderingContext2d>() {
            Ok(ctx) => ctx,
            Err(_) => return,
        },
        _ => return,
    };

    let width = canvas.width() as f64;
    let height = canvas.height() as f64;
    let config = chart.config();
    let series = chart.series();
    let area = PlotArea::new(width, height, config.legend_position);

    ctx.set_fill_style(&"#ffffff".into());
    ctx.fill_rect(0.0, 0.0, width, height);

    let (lo, hi) = value_bounds(series.value_range());

    // Horizontal grid with y labels
    ctx.set_stroke_style(&GRID_COLOR.into());
    ctx.set_line_width(1.0);
    ctx.set_fill_style(&TEXT_COLOR.into());
    ctx.set_font(&format!("{}px sans-serif", config.tick_font_size));
    for i in 0..=4 {
        let y = area.top + (i as f64 / 4.0) * area.height;
        ctx.begin_path();
        ctx.move_to(area.left, y);
        ctx.line_to(area.left + area.width, y);
        ctx.stroke();

        let value = hi - (i as f64 / 4.0) * (hi - lo);
        let _ = ctx.fill_text(&format!("{:.2}", value), 4.0, y + 4.0);
    }

    // Axis title
    ctx.set_font(&format!("{}px sans-serif", config.axis_title_font_size));
    let _ = ctx.fill_text("kWh", 4.0, area.top - 8.0);

    if series.is_empty() {
        ctx.set_font("16px sans-serif");
        let _ = ctx.fill_text("Belum ada data", width / 2.0 - 56.0, height / 2.0);
        return;
    }

    let points = area.points(&series.values, lo, hi);
    let baseline = area.top + area.height;

    // Filled area under the line
    ctx.set_fill_style(&FILL_COLOR.into());
    ctx.begin_path();
    ctx.move_to(points[0].0, baseline);
    for &(x, y) in &points {
        ctx.line_to(x, y);
    }
    ctx.line_to(points[points.len() - 1].0, baseline);
    ctx.close_path();
    ctx.fill();

    ctx.set_stroke_style(&LINE_COLOR.into());
    ctx.set_line_width(2.0);
    ctx.begin_path();
    for (i, &(x, y)) in points.iter().enumerate() {
        if i == 0 {
            ctx.move_to(x, y);
        } else {
            ctx.line_to(x, y);
        }
    }
    ctx.stroke();

    ctx.set_fill_style(&LINE_COLOR.into());
    for &(x, y) in &points {
        ctx.begin_path();
        let _ = ctx.arc(x, y, config.point_radius, 0.0, std::f64::consts::PI * 2.0);
        ctx.fill();
    }

    // Rotated x labels, skipped down to max_ticks
    let labels = chart.display_labels();
    let angle = (config.max_rotation as f64).to_radians();
    ctx.set_fill_style(&TEXT_COLOR.into());
    ctx.set_font(&format!("{}px sans-serif", config.tick_font_size));
    for index in chart.tick_indices() {
        let (Some(label), Some(&(x, _))) = (labels.get(index), points.get(index)) else {
            continue;
        };
        ctx.save();
        let _ = ctx.translate(x, baseline + 12.0);
        let _ = ctx.rotate(-angle);
        let _ = ctx.fill_text(label, -(label.len() as f64) * 2.5, 0.0);
        ctx.restore();
    }

    // Legend
    let legend_y = match config.legend_position {
        LegendPosition::Top => 16.0,
        LegendPosition::Bottom => height - 12.0,
    };
    let box_width = config.legend_box_width as f64;
    let legend_x = width / 2.0 - box_width;
    ctx.set_fill_style(&LINE_COLOR.into());
    ctx.fill_rect(legend_x, legend_y - 8.0, box_width, 8.0);
    ctx.set_fill_style(&TEXT_COLOR.into());
    ctx.set_font(&format!("{}px sans-serif", config.legend_font_size));
    let _ = ctx.fill_text(chart.dataset_label(), legend_x + box_width + 6.0, legend_y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_span_plot_area() {
        let area = PlotArea::new(800.0, 400.0, LegendPosition::Top);
        let points = area.points(&[0.0, 5.0, 10.0], 0.0, 10.0);

        assert_eq!(points[0], (area.left, area.top + area.height));
        assert_eq!(points[2], (area.left + area.width, area.top));
        assert_eq!(points[1].0, area.left + area.width / 2.0);
    }

    #[test]
    fn test_single_point_is_centered() {
        let area = PlotArea::new(800.0, 400.0, LegendPosition::Bottom);
        let points = area.points(&[3.0], 0.0, 3.0);
        assert_eq!(points[0].0, area.left + area.width / 2.0);
    }

    #[test]
    fn test_value_bounds() {
        assert_eq!(value_bounds(None), (0.0, 1.0));
        assert_eq!(value_bounds(Some((2.0, 2.0))), (0.0, 2.5));
        assert_eq!(value_bounds(Some((0.0, 0.0))), (0.0, 1.0));
    }
}
