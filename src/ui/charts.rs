use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::{self, Align2, Color32, FontId, RichText, ScrollArea, Sense, Stroke, Ui, vec2};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoints, Points,
};

use crate::color::{CategoryColors, heat_color};
use crate::data::agg::{
    self, GdpSharePoint, NoDataError, RangeBox, RegionalTrendPoint, ShareHeatmap,
};
use crate::data::filter::FilteredView;
use crate::state::AppState;
use crate::ui::table;

// Vehicle-type colours shared by the trend and distribution charts.
const EV_COLOR: Color32 = Color32::from_rgb(255, 107, 107);
const PETROL_COLOR: Color32 = Color32::from_rgb(78, 205, 196);
const DIESEL_COLOR: Color32 = Color32::from_rgb(69, 183, 209);

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the full dashboard: metric tiles, the ten charts, raw data table.
///
/// Derived tables are recomputed from the cached filter indices on every
/// frame; a chart whose aggregation reports no data renders an empty-state
/// label while the rest stays live.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No dataset loaded  (File → Open…)");
            });
            return;
        }
    };

    let view = FilteredView::new(dataset, &state.visible_indices);
    let latest_year = view.latest_year();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("EV vs Petrol Vehicle Sales Analytics");
            ui.label(
                RichText::new("Electric vs combustion engine vehicle sales across regions")
                    .weak(),
            );
            ui.separator();

            metrics_row(ui, &view);
            ui.separator();

            section(ui, "EV vs Petrol Sales Trend Over Time", agg::sales_over_time(&view), |ui, rows| {
                let ev: Vec<[f64; 2]> = rows.iter().map(|r| [r.year as f64, r.ev_sales]).collect();
                let petrol: Vec<[f64; 2]> =
                    rows.iter().map(|r| [r.year as f64, r.petrol_sales]).collect();
                Plot::new("sales_over_time")
                    .legend(Legend::default())
                    .height(300.0)
                    .allow_scroll(false)
                    .x_axis_label("Year")
                    .y_axis_label("Sales Count")
                    .show(ui, |plot_ui| {
                        plot_ui.line(
                            Line::new(PlotPoints::from(ev.clone()))
                                .color(EV_COLOR)
                                .width(2.0)
                                .name("EV sales"),
                        );
                        plot_ui.points(
                            Points::new(PlotPoints::from(ev))
                                .color(EV_COLOR)
                                .radius(3.0)
                                .name("EV sales"),
                        );
                        plot_ui.line(
                            Line::new(PlotPoints::from(petrol.clone()))
                                .color(PETROL_COLOR)
                                .width(2.0)
                                .name("Petrol sales"),
                        );
                        plot_ui.points(
                            Points::new(PlotPoints::from(petrol))
                                .color(PETROL_COLOR)
                                .radius(3.0)
                                .name("Petrol sales"),
                        );
                    });
            });

            section(
                ui,
                "Top 15 Countries by EV Market Share",
                agg::market_share_by_country(&view),
                |ui, ranking| {
                    let labels: Vec<String> =
                        ranking.iter().map(|e| e.country.clone()).collect();
                    let bars: Vec<Bar> = ranking
                        .iter()
                        .enumerate()
                        .map(|(i, e)| {
                            Bar::new(i as f64, e.ev_share)
                                .width(0.6)
                                .fill(state.country_colors.color_for(&e.country))
                                .name(&e.country)
                        })
                        .collect();
                    Plot::new("market_share_ranking")
                        .height(320.0)
                        .allow_scroll(false)
                        .y_axis_label("EV Market Share (%)")
                        .x_axis_formatter(category_formatter(labels))
                        .show(ui, |plot_ui| {
                            plot_ui.bar_chart(BarChart::new(bars));
                        });
                },
            );

            ui.columns(2, |cols: &mut [Ui]| {
                let dist_title = match latest_year {
                    Some(y) => format!("Vehicle Type Distribution ({y})"),
                    None => "Vehicle Type Distribution".to_string(),
                };
                let dist = latest_year
                    .ok_or(NoDataError)
                    .and_then(|y| agg::vehicle_type_distribution(&view, y));
                section(&mut cols[0], &dist_title, dist, |ui, dist| {
                    let total = dist.total();
                    let pct = |v: f64| if total > 0.0 { v / total * 100.0 } else { 0.0 };
                    let bars = vec![
                        Bar::new(0.0, dist.ev)
                            .width(0.6)
                            .fill(EV_COLOR)
                            .name(format!("EV ({:.1}%)", pct(dist.ev))),
                        Bar::new(1.0, dist.petrol)
                            .width(0.6)
                            .fill(PETROL_COLOR)
                            .name(format!("Petrol ({:.1}%)", pct(dist.petrol))),
                        Bar::new(2.0, dist.diesel)
                            .width(0.6)
                            .fill(DIESEL_COLOR)
                            .name(format!("Diesel ({:.1}%)", pct(dist.diesel))),
                    ];
                    let labels = vec!["EV".to_string(), "Petrol".to_string(), "Diesel".to_string()];
                    Plot::new("vehicle_distribution")
                        .height(300.0)
                        .allow_scroll(false)
                        .y_axis_label("Sales")
                        .x_axis_formatter(category_formatter(labels))
                        .show(ui, |plot_ui| {
                            plot_ui.bar_chart(BarChart::new(bars));
                        });
                });

                section(
                    &mut cols[1],
                    "EV Sales by Region (Stacked)",
                    agg::regional_sales_trend(&view),
                    |ui, trend| stacked_area_chart(ui, &trend, &state.region_colors),
                );
            });

            section(
                ui,
                "EV Growth Rate (YoY) Across Countries",
                agg::growth_rate_points(&view),
                |ui, points| {
                    let mut by_country: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
                    for p in &points {
                        by_country
                            .entry(p.country.as_str())
                            .or_default()
                            .push([p.year as f64, p.growth_rate]);
                    }
                    Plot::new("growth_rate_scatter")
                        .legend(Legend::default())
                        .height(300.0)
                        .allow_scroll(false)
                        .x_axis_label("Year")
                        .y_axis_label("Growth Rate (%)")
                        .show(ui, |plot_ui| {
                            for (country, pts) in by_country {
                                plot_ui.points(
                                    Points::new(PlotPoints::from(pts))
                                        .color(state.country_colors.color_for(country))
                                        .radius(3.0)
                                        .name(country),
                                );
                            }
                        });
                },
            );

            let gdp = latest_year
                .ok_or(NoDataError)
                .and_then(|y| agg::gdp_vs_share(&view, y));
            section(ui, "GDP Per Capita vs EV Market Share", gdp, |ui, points| {
                gdp_share_chart(ui, &points, &state.region_colors);
            });

            ui.columns(2, |cols: &mut [Ui]| {
                section(
                    &mut cols[0],
                    "CO2 Emissions Trend (Transport)",
                    agg::emissions_trend(&view),
                    |ui, trend| {
                        let pts: Vec<[f64; 2]> =
                            trend.iter().map(|p| [p.year as f64, p.value]).collect();
                        Plot::new("emissions_trend")
                            .height(280.0)
                            .allow_scroll(false)
                            .x_axis_label("Year")
                            .y_axis_label("CO2 (MT)")
                            .show(ui, |plot_ui| {
                                plot_ui.line(
                                    Line::new(PlotPoints::from(pts.clone()))
                                        .color(EV_COLOR)
                                        .width(2.0)
                                        .name("Mean CO2"),
                                );
                                plot_ui.points(
                                    Points::new(PlotPoints::from(pts))
                                        .color(EV_COLOR)
                                        .radius(3.0),
                                );
                            });
                    },
                );

                section(
                    &mut cols[1],
                    "Charging Stations Expansion",
                    agg::charging_trend(&view),
                    |ui, trend| {
                        let bars: Vec<Bar> = trend
                            .iter()
                            .map(|p| {
                                Bar::new(p.year as f64, p.value)
                                    .width(0.6)
                                    .fill(DIESEL_COLOR)
                                    .name(p.year.to_string())
                            })
                            .collect();
                        Plot::new("charging_trend")
                            .height(280.0)
                            .allow_scroll(false)
                            .x_axis_label("Year")
                            .y_axis_label("Avg Charging Stations")
                            .show(ui, |plot_ui| {
                                plot_ui.bar_chart(BarChart::new(bars));
                            });
                    },
                );
            });

            let range_title = match latest_year {
                Some(y) => format!("EV Range Distribution by Region ({y})"),
                None => "EV Range Distribution by Region".to_string(),
            };
            let ranges = latest_year
                .ok_or(NoDataError)
                .and_then(|y| agg::range_distribution(&view, y));
            section(ui, &range_title, ranges, |ui, boxes| {
                range_box_chart(ui, &boxes, &state.region_colors);
            });

            section(
                ui,
                "EV Market Share Heatmap (Country × Year)",
                agg::market_share_heatmap(&view),
                heatmap_chart,
            );

            ui.add_space(12.0);
            egui::CollapsingHeader::new(RichText::new("Raw data").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    if view.is_empty() {
                        empty_state(ui);
                    } else {
                        table::raw_data_table(ui, &view);
                    }
                });
            ui.add_space(8.0);
        });
}

// ---------------------------------------------------------------------------
// Section / empty-state helpers
// ---------------------------------------------------------------------------

fn section<T>(
    ui: &mut Ui,
    title: &str,
    derived: Result<T, NoDataError>,
    render: impl FnOnce(&mut Ui, T),
) {
    ui.add_space(12.0);
    ui.strong(title);
    match derived {
        Ok(t) => render(ui, t),
        Err(_) => empty_state(ui),
    }
}

fn empty_state(ui: &mut Ui) {
    ui.label(RichText::new("No data for the current selection.").weak().italics());
}

/// Axis formatter mapping integer positions to category labels.
fn category_formatter(
    labels: Vec<String>,
) -> impl Fn(GridMark, &std::ops::RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let i = mark.value.round();
        if (mark.value - i).abs() > 0.25 || i < 0.0 {
            return String::new();
        }
        labels.get(i as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Summary metric tiles
// ---------------------------------------------------------------------------

fn metrics_row(ui: &mut Ui, view: &FilteredView<'_>) {
    match agg::summary(view) {
        Ok(s) => {
            ui.columns(4, |cols: &mut [Ui]| {
                metric_tile(&mut cols[0], "Total EV Sales", thousands(s.total_ev_sales));
                metric_tile(
                    &mut cols[1],
                    "Total Petrol Sales",
                    thousands(s.total_petrol_sales),
                );
                metric_tile(
                    &mut cols[2],
                    "Avg EV Market Share",
                    format!("{:.2}%", s.mean_ev_share_pct),
                );
                metric_tile(
                    &mut cols[3],
                    "Max Charging Stations",
                    thousands(s.max_charging_stations as f64),
                );
            });
        }
        Err(_) => empty_state(ui),
    }
}

fn metric_tile(ui: &mut Ui, label: &str, value: String) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.label(RichText::new(label).weak());
            ui.label(RichText::new(value).heading().strong());
        });
    });
}

/// Format a count with thousands separators, rounding to whole units.
fn thousands(v: f64) -> String {
    let n = v.round() as i64;
    let digits = n.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

// ---------------------------------------------------------------------------
// Stacked area: regional EV sales
// ---------------------------------------------------------------------------

fn stacked_area_chart(ui: &mut Ui, trend: &[RegionalTrendPoint], colors: &CategoryColors) {
    let regions: BTreeSet<&str> = trend.iter().map(|p| p.region.as_str()).collect();
    let years: BTreeSet<i32> = trend.iter().map(|p| p.year).collect();
    let values: BTreeMap<(&str, i32), f64> = trend
        .iter()
        .map(|p| ((p.region.as_str(), p.year), p.ev_sales))
        .collect();

    // Cumulative series per region; a region with no rows in a year adds 0.
    let years: Vec<i32> = years.into_iter().collect();
    let mut cumulative: BTreeMap<i32, f64> = years.iter().map(|&y| (y, 0.0)).collect();
    let mut series: Vec<(&str, Vec<[f64; 2]>)> = Vec::new();
    for region in regions {
        let pts: Vec<[f64; 2]> = years
            .iter()
            .map(|&y| {
                let top = cumulative.entry(y).or_insert(0.0);
                *top += values.get(&(region, y)).copied().unwrap_or(0.0);
                [y as f64, *top]
            })
            .collect();
        series.push((region, pts));
    }

    Plot::new("regional_stacked_area")
        .legend(Legend::default())
        .height(300.0)
        .allow_scroll(false)
        .x_axis_label("Year")
        .y_axis_label("EV Sales")
        .show(ui, |plot_ui| {
            // Draw from the tallest stack down so each band stays visible.
            for (region, pts) in series.iter().rev() {
                plot_ui.line(
                    Line::new(PlotPoints::from(pts.clone()))
                        .color(colors.color_for(region))
                        .fill(0.0)
                        .name(*region),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// GDP vs share scatter (latest year, sized by charging stations)
// ---------------------------------------------------------------------------

fn gdp_share_chart(ui: &mut Ui, points: &[GdpSharePoint], colors: &CategoryColors) {
    let max_stations = points
        .iter()
        .map(|p| p.charging_stations)
        .max()
        .unwrap_or(1)
        .max(1) as f64;

    Plot::new("gdp_vs_share")
        .legend(Legend::default())
        .height(320.0)
        .allow_scroll(false)
        .x_axis_label("GDP Per Capita (USD)")
        .y_axis_label("EV Market Share (%)")
        .show(ui, |plot_ui| {
            for p in points {
                let radius =
                    2.0 + 8.0 * ((p.charging_stations.max(0) as f64 / max_stations).sqrt() as f32);
                plot_ui.points(
                    Points::new(PlotPoints::from(vec![[p.gdp_per_capita, p.ev_share_pct]]))
                        .color(colors.color_for(&p.region))
                        .radius(radius)
                        .name(&p.region),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Range distribution box plot (latest year)
// ---------------------------------------------------------------------------

fn range_box_chart(ui: &mut Ui, boxes: &[RangeBox], colors: &CategoryColors) {
    let labels: Vec<String> = boxes.iter().map(|b| b.region.clone()).collect();
    let elems: Vec<BoxElem> = boxes
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let color = colors.color_for(&b.region);
            BoxElem::new(i as f64, BoxSpread::new(b.min, b.q1, b.median, b.q3, b.max))
                .box_width(0.5)
                .fill(color.gamma_multiply(0.4))
                .stroke(Stroke::new(1.5, color))
                .name(&b.region)
        })
        .collect();

    Plot::new("range_distribution")
        .height(300.0)
        .allow_scroll(false)
        .y_axis_label("Average EV Range (km)")
        .x_axis_formatter(category_formatter(labels))
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(elems));
        });
}

// ---------------------------------------------------------------------------
// Country × year heatmap
// ---------------------------------------------------------------------------

const HEATMAP_LABEL_WIDTH: f32 = 110.0;
const HEATMAP_HEADER_HEIGHT: f32 = 20.0;
const HEATMAP_CELL_HEIGHT: f32 = 22.0;

fn heatmap_chart(ui: &mut Ui, hm: ShareHeatmap) {
    let n_cols = hm.years.len();
    let n_rows = hm.countries.len();

    let mut max_share = 0.0f64;
    for row in &hm.cells {
        for cell in row.iter().flatten() {
            max_share = max_share.max(*cell);
        }
    }
    let max_share = max_share.max(f64::EPSILON);

    let cell_w =
        ((ui.available_width() - HEATMAP_LABEL_WIDTH) / n_cols as f32).clamp(24.0, 64.0);
    let size = vec2(
        HEATMAP_LABEL_WIDTH + cell_w * n_cols as f32,
        HEATMAP_HEADER_HEIGHT + HEATMAP_CELL_HEIGHT * n_rows as f32,
    );
    let (rect, _response) = ui.allocate_exact_size(size, Sense::hover());
    let painter = ui.painter_at(rect);
    let text_color = ui.visuals().text_color();
    let blank = ui.visuals().faint_bg_color;

    // Column headers: years.
    for (j, year) in hm.years.iter().enumerate() {
        let x = rect.left() + HEATMAP_LABEL_WIDTH + (j as f32 + 0.5) * cell_w;
        painter.text(
            egui::pos2(x, rect.top() + HEATMAP_HEADER_HEIGHT / 2.0),
            Align2::CENTER_CENTER,
            year.to_string(),
            FontId::proportional(12.0),
            text_color,
        );
    }

    for (i, country) in hm.countries.iter().enumerate() {
        let y = rect.top() + HEATMAP_HEADER_HEIGHT + i as f32 * HEATMAP_CELL_HEIGHT;

        painter.text(
            egui::pos2(rect.left() + HEATMAP_LABEL_WIDTH - 6.0, y + HEATMAP_CELL_HEIGHT / 2.0),
            Align2::RIGHT_CENTER,
            country,
            FontId::proportional(12.0),
            text_color,
        );

        for (j, cell) in hm.cells[i].iter().enumerate() {
            let cell_rect = egui::Rect::from_min_size(
                egui::pos2(rect.left() + HEATMAP_LABEL_WIDTH + j as f32 * cell_w, y),
                vec2(cell_w - 1.0, HEATMAP_CELL_HEIGHT - 1.0),
            );
            match cell {
                Some(share) => {
                    let fill = heat_color(share / max_share);
                    painter.rect_filled(cell_rect, 2.0, fill);
                    if cell_w >= 36.0 {
                        painter.text(
                            cell_rect.center(),
                            Align2::CENTER_CENTER,
                            format!("{share:.1}"),
                            FontId::proportional(10.0),
                            Color32::BLACK,
                        );
                    }
                }
                // Missing (country, year) pairs stay blank, not zero.
                None => {
                    painter.rect_filled(cell_rect, 2.0, blank);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::thousands;

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(1000.0), "1,000");
        assert_eq!(thousands(2_345_678.9), "2,345,679");
        assert_eq!(thousands(-12_000.0), "-12,000");
    }
}
