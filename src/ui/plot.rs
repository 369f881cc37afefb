use std::collections::BTreeMap;

use eframe::egui::{
    self, Align2, Color32, FontId, Pos2, Rect, RichText, Sense, Stroke, Ui, Vec2,
    epaint::CubicBezierShape,
};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoints, Points, VLine};

use verification_void::analysis::flow::FlowGraph;
use verification_void::analysis::kde::{DensityReport, OmitReason};
use verification_void::analysis::stats::{Correlation, ScatterSummary};
use verification_void::analysis::terms::TermWeight;
use verification_void::error::{EngineError, Outcome};

use crate::color::{self, ACCENT, ColorMap, NODE_GRAY};
use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the current page in the central panel.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    let Some(view) = &state.view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a dataset to begin  (File → Open…)");
        });
        return;
    };

    match state.page {
        Page::ContentJourney => {
            ui.heading("TikTok Content Journey");
            with_panel(ui, view.flow.as_ref().map(Outcome::Ready), |ui, graph| {
                if graph.is_empty() {
                    ui.label("No data available for the selected filters");
                } else {
                    flow_diagram(ui, graph);
                }
            });
        }
        Page::DurationDynamics => {
            ui.heading("Duration Dynamics: Claims vs. Opinions");
            with_panel(ui, view.density.as_ref().map(Outcome::as_ref), density_plot);
        }
        Page::Correlations => {
            ui.heading("How are various engagement metrics correlated?");
            with_panel(ui, view.scatter.as_ref().map(Outcome::as_ref), scatter_page);
        }
        Page::ContentThemes => {
            ui.heading("What are the common themes in these videos?");
            match view.terms.as_ref().map(Outcome::as_ref) {
                Ok(Outcome::Empty) => {
                    ui.label("No transcripts match these filters");
                }
                other => with_panel(ui, other.map(|o| o.map(Vec::as_slice)), term_cloud),
            }
        }
    }
}

/// Show a panel's data, its empty state, or its error.
fn with_panel<T: ?Sized>(
    ui: &mut Ui,
    panel: Result<Outcome<&T>, &EngineError>,
    render: impl FnOnce(&mut Ui, &T),
) {
    match panel {
        Ok(Outcome::Ready(data)) => render(ui, data),
        Ok(Outcome::Empty) => {
            ui.label("No data available for the selected filters");
        }
        Err(e) => {
            ui.label(RichText::new(format!("Error: {e}")).color(Color32::RED));
        }
    }
}

// ---------------------------------------------------------------------------
// Flow diagram (painter)
// ---------------------------------------------------------------------------

const NODE_WIDTH: f32 = 25.0;
const NODE_PAD: f32 = 20.0;

fn flow_diagram(ui: &mut Ui, graph: &FlowGraph) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
    let area = response.rect.shrink(30.0);

    // Layer = position of the node's column in the graph.
    let mut layers: Vec<Vec<usize>> = Vec::new();
    let mut layer_of = vec![0usize; graph.nodes.len()];
    for node in &graph.nodes {
        let layer = match layers
            .iter()
            .position(|ids| graph.nodes[ids[0]].field == node.field)
        {
            Some(layer) => layer,
            None => {
                layers.push(Vec::new());
                layers.len() - 1
            }
        };
        layers[layer].push(node.id);
        layer_of[node.id] = layer;
    }

    let mut inflow = vec![0usize; graph.nodes.len()];
    let mut outflow = vec![0usize; graph.nodes.len()];
    for edge in &graph.edges {
        outflow[edge.source] += edge.weight;
        inflow[edge.target] += edge.weight;
    }
    let size: Vec<usize> = (0..graph.nodes.len())
        .map(|id| inflow[id].max(outflow[id]).max(1))
        .collect();

    let scale = layers
        .iter()
        .map(|ids| {
            let total: usize = ids.iter().map(|&id| size[id]).sum();
            (area.height() - NODE_PAD * (ids.len() as f32 - 1.0)) / total as f32
        })
        .fold(f32::INFINITY, f32::min)
        .max(0.1);

    let step = if layers.len() > 1 {
        (area.width() - NODE_WIDTH) / (layers.len() - 1) as f32
    } else {
        0.0
    };
    let mut rects = vec![Rect::NOTHING; graph.nodes.len()];
    for (layer, ids) in layers.iter().enumerate() {
        let x = area.left() + step * layer as f32;
        let mut y = area.top();
        for &id in ids {
            let h = size[id] as f32 * scale;
            rects[id] = Rect::from_min_size(Pos2::new(x, y), Vec2::new(NODE_WIDTH, h));
            y += h + NODE_PAD;
        }
    }

    let mut out_offset = vec![0.0f32; graph.nodes.len()];
    let mut in_offset = vec![0.0f32; graph.nodes.len()];
    for edge in &graph.edges {
        let width = edge.weight as f32 * scale;
        let (src, dst) = (rects[edge.source], rects[edge.target]);
        let start = Pos2::new(src.right(), src.top() + out_offset[edge.source] + width / 2.0);
        let end = Pos2::new(dst.left(), dst.top() + in_offset[edge.target] + width / 2.0);
        out_offset[edge.source] += width;
        in_offset[edge.target] += width;

        let mid = (start.x + end.x) / 2.0;
        let link_color = color::hex_to_color32(edge.color).gamma_multiply(0.6);
        painter.add(CubicBezierShape::from_points_stroke(
            [start, Pos2::new(mid, start.y), Pos2::new(mid, end.y), end],
            false,
            Color32::TRANSPARENT,
            Stroke::new(width.max(1.0), link_color),
        ));
    }

    for node in &graph.nodes {
        let rect = rects[node.id];
        painter.rect_filled(rect, 0.0, NODE_GRAY);
        let (anchor, pos) = if layer_of[node.id] + 1 == layers.len() {
            (Align2::RIGHT_CENTER, rect.left_center() - Vec2::new(6.0, 0.0))
        } else {
            (Align2::LEFT_CENTER, rect.right_center() + Vec2::new(6.0, 0.0))
        };
        painter.text(
            pos,
            anchor,
            format!("{} ({})", node.label, size[node.id]),
            FontId::proportional(16.0),
            Color32::WHITE,
        );
    }
}

// ---------------------------------------------------------------------------
// Density comparison
// ---------------------------------------------------------------------------

fn density_plot(ui: &mut Ui, report: &DensityReport) {
    let groups: Vec<String> = report.curves.iter().map(|c| c.group.clone()).collect();
    let colors = ColorMap::for_claim_status(&groups);

    for omitted in &report.omitted {
        let why = match omitted.reason {
            OmitReason::TooFewPoints => "too few videos",
            OmitReason::NoSpread => "every video has the same value",
        };
        ui.label(format!("{}: no curve ({why}, n = {})", omitted.group, omitted.count));
    }

    Plot::new("density_plot")
        .legend(Legend::default())
        .x_axis_label(report.value_field.title())
        .y_axis_label("Density")
        .show(ui, |plot_ui| {
            for curve in &report.curves {
                let color = colors.color_for(&curve.group);
                let points: PlotPoints = curve
                    .xs
                    .iter()
                    .zip(&curve.ys)
                    .map(|(&x, &y)| [x, y])
                    .collect();
                plot_ui.line(
                    Line::new(points)
                        .name(&curve.group)
                        .color(color)
                        .width(3.0)
                        .fill(0.0),
                );
                plot_ui.vline(
                    VLine::new(curve.median)
                        .name(format!("{} median: {:.1}", curve.group, curve.median))
                        .color(color)
                        .style(LineStyle::Dashed { length: 8.0 })
                        .width(2.0),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Correlation explorer
// ---------------------------------------------------------------------------

fn scatter_page(ui: &mut Ui, summary: &ScatterSummary) {
    ui.columns(2, |cols| {
        scatter_plot(&mut cols[0], summary);
        insights(&mut cols[1], summary);
    });
}

fn scatter_plot(ui: &mut Ui, summary: &ScatterSummary) {
    let mut groups: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for p in &summary.points {
        let key = p.group.as_deref().unwrap_or("");
        groups.entry(key).or_default().push([p.x, p.y]);
    }
    let names: Vec<String> = groups.keys().map(|k| k.to_string()).collect();
    let colors = ColorMap::new(&names);
    let transcripts: Vec<([f64; 2], String)> = summary
        .points
        .iter()
        .filter_map(|p| Some(([p.x, p.y], p.hover_text.clone()?)))
        .collect();

    Plot::new("scatter_plot")
        .legend(Legend::default())
        .x_axis_label(summary.x_field.title())
        .y_axis_label(summary.y_field.title())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .label_formatter(move |name, value| {
            let mut label = format!("{name}\nx: {:.0}\ny: {:.0}", value.x, value.y);
            // Hovering a point snaps to its exact coordinates.
            if let Some((_, text)) = transcripts.iter().find(|(xy, _)| *xy == [value.x, value.y]) {
                label.push('\n');
                label.push_str(text);
            }
            label
        })
        .show(ui, |plot_ui| {
            for (name, coords) in groups {
                let color = if summary.group_field.is_some() {
                    colors.color_for(name)
                } else {
                    ACCENT
                };
                let label = if name.is_empty() { "videos" } else { name };
                plot_ui.points(
                    Points::new(PlotPoints::from(coords))
                        .name(label)
                        .color(color)
                        .radius(2.5),
                );
            }
        });
}

fn insights(ui: &mut Ui, summary: &ScatterSummary) {
    ui.heading("Data Insights");
    let correlation = match summary.correlation {
        Correlation::Percent(p) => format!("{p:.3}%"),
        Correlation::Undefined => "Could not calculate".to_string(),
    };
    let rows = [
        ("Total points", summary.count().to_string()),
        (
            "X-Axis",
            format!("{:.2} to {:.2}", summary.x_range.0, summary.x_range.1),
        ),
        (
            "Y-Axis",
            format!("{:.2} to {:.2}", summary.y_range.0, summary.y_range.1),
        ),
        ("Correlation", correlation),
    ];
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .column(Column::remainder())
        .body(|mut body| {
            for (name, value) in rows {
                body.row(20.0, |mut row| {
                    row.col(|ui| {
                        ui.strong(name);
                    });
                    row.col(|ui| {
                        ui.label(value);
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Term cloud
// ---------------------------------------------------------------------------

fn term_cloud(ui: &mut Ui, terms: &[TermWeight]) {
    egui::Frame::new().fill(Color32::BLACK).show(ui, |ui: &mut Ui| {
        ui.horizontal_wrapped(|ui: &mut Ui| {
            for term in terms {
                let size = 12.0 + 36.0 * term.weight as f32;
                ui.label(
                    RichText::new(&term.term)
                        .size(size)
                        .color(color::cloud_ramp(1.0 - term.weight)),
                )
                .on_hover_text(format!("{} mentions", term.count));
            }
        });
    });

    ui.add_space(8.0);
    egui::CollapsingHeader::new("Term counts")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .column(Column::auto())
                .column(Column::remainder())
                .header(20.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("Term");
                    });
                    header.col(|ui| {
                        ui.strong("Count");
                    });
                })
                .body(|mut body| {
                    for term in terms {
                        body.row(18.0, |mut row| {
                            row.col(|ui| {
                                ui.label(&term.term);
                            });
                            row.col(|ui| {
                                ui.label(term.count.to_string());
                            });
                        });
                    }
                });
        });
}
