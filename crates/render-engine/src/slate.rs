//! Slate filtergraph: a single 1920x1080 title card built from the first
//! frame of the sequence, the bars and logo assets, and the slate fields.

use dailies_common::error::DailiesResult;
use dailies_model::fields::{FieldKey, FieldSet};
use dailies_model::layout::LayoutConfig;
use dailies_model::resources::ResourcePaths;

use crate::graph::{Filter, FilterGraph, FilterNode, StreamRef};
use crate::inputs::{GraphPlan, InputRole, InputRoster};

const BASE: &str = "base";
const THUMBNAIL: &str = "thumbnail";
const BARS: &str = "bars";
const LOGO: &str = "logo";

/// Horizontal shift of the thumbnail from the canvas center.
const THUMBNAIL_OFFSET_X: i32 = -500;
/// Gap between the bars and the bottom edge.
const BARS_BOTTOM_MARGIN: u32 = 50;
/// Logo scale relative to its source size.
const LOGO_SCALE: &str = "0.2";
const LOGO_POSITION: (u32, u32) = (500, 100);
const COMPANY_POSITION: (&str, &str) = ("690", "130");
const PROJECT_POSITION: (&str, &str) = ("(w)/2", "250");

/// Builds the slate graph.
#[derive(Debug, Clone)]
pub struct SlateGraphBuilder<'a> {
    layout: &'a LayoutConfig,
    resources: &'a ResourcePaths,
}

impl<'a> SlateGraphBuilder<'a> {
    pub fn new(layout: &'a LayoutConfig, resources: &'a ResourcePaths) -> Self {
        Self { layout, resources }
    }

    /// Build the slate graph for the given fields.
    ///
    /// Fails with `ConfigMissingKey` when any field is unset.
    pub fn build(&self, fields: &FieldSet) -> DailiesResult<GraphPlan> {
        fields.validate()?;

        let mut inputs = InputRoster::new();
        let sequence = inputs.add(InputRole::Sequence);
        let color = inputs.add(InputRole::ColorSource);
        let bars = inputs.add(InputRole::Bars);
        let color_bars = inputs.add(InputRole::ColorBars);
        let logo = inputs.add(InputRole::Logo);

        let canvas = self.layout.canvas;
        let base = || StreamRef::label(BASE);
        let thumbnail = || StreamRef::label(THUMBNAIL);
        let mut graph = FilterGraph::new();

        graph.push(FilterNode::new(
            vec![color],
            vec![
                Filter::scale(canvas.width, canvas.height),
                Filter::square_pixels(),
            ],
            Some(BASE),
        ));
        graph.push(FilterNode::new(
            vec![sequence],
            vec![Filter::scale(canvas.width, canvas.height)],
            Some(THUMBNAIL),
        ));
        graph.push(FilterNode::new(
            vec![thumbnail(), color_bars.clone()],
            vec![Filter::overlay()],
            Some(THUMBNAIL),
        ));
        graph.push(FilterNode::new(
            vec![thumbnail(), color_bars],
            vec![Filter::overlay_at(
                "(main_w-overlay_w)",
                "(main_h-overlay_h)",
            )],
            Some(THUMBNAIL),
        ));
        graph.push(FilterNode::new(
            vec![thumbnail()],
            vec![Filter::scale("(iw/4)", "(ih/4)")],
            Some(THUMBNAIL),
        ));
        graph.push(FilterNode::new(
            vec![base(), thumbnail()],
            vec![Filter::overlay()
                .positional(format!("((main_w-overlay_w)/2){THUMBNAIL_OFFSET_X}"))
                .positional("(main_h-overlay_h)/2")],
            Some(BASE),
        ));
        graph.push(FilterNode::new(
            vec![bars],
            vec![Filter::scale(-1, -1)],
            Some(BARS),
        ));
        graph.push(FilterNode::new(
            vec![base(), StreamRef::label(BARS)],
            vec![Filter::overlay_at(
                "(main_w-overlay_w)",
                format!("(main_h-overlay_h-{BARS_BOTTOM_MARGIN})"),
            )],
            Some(BASE),
        ));
        graph.push(FilterNode::new(
            vec![logo],
            vec![Filter::scale(
                format!("(iw*{LOGO_SCALE})"),
                format!("(ih*{LOGO_SCALE})"),
            )],
            Some(LOGO),
        ));
        graph.push(FilterNode::new(
            vec![base(), StreamRef::label(LOGO)],
            vec![Filter::overlay_at(LOGO_POSITION.0, LOGO_POSITION.1)],
            Some(BASE),
        ));
        graph.push(FilterNode::new(
            vec![base()],
            self.text_chain(fields)?,
            None,
        ));

        tracing::debug!(nodes = graph.nodes().len(), "Built slate graph");
        Ok(GraphPlan { graph, inputs })
    }

    fn text_chain(&self, fields: &FieldSet) -> DailiesResult<Vec<Filter>> {
        let layout = self.layout;
        let mut chain = vec![
            self.text(
                layout.company_font_size,
                &self.resources.logo_font.to_string_lossy(),
                &fields.display_value(FieldKey::CompanyName)?,
                COMPANY_POSITION.0,
                COMPANY_POSITION.1,
            ),
            self.text(
                layout.project_font_size,
                &self.resources.body_font.to_string_lossy(),
                &fields.display_value(FieldKey::ProjectName)?,
                PROJECT_POSITION.0,
                PROJECT_POSITION.1,
            ),
        ];

        let body_font = self.resources.body_font.to_string_lossy();
        let label_x = layout.label_x();
        let value_x = layout.value_x();
        for (row, (key, value)) in fields.rows()?.into_iter().enumerate() {
            let y = layout.row_y(row);
            chain.push(self.text(layout.font_size, &body_font, key.caption(), &label_x, &y));
            chain.push(self.text(layout.font_size, &body_font, &value, &value_x, &y));
        }
        Ok(chain)
    }

    fn text(&self, size: u32, font: &str, text: &str, x: &str, y: &str) -> Filter {
        Filter::drawtext()
            .arg("fontsize", size)
            .arg("fontcolor", &self.layout.font_color)
            .text("fontfile", font)
            .arg("expansion", "none")
            .text("text", text)
            .arg("x", x)
            .arg("y", y)
    }
}

/// Build the slate graph with the given layout and assets.
pub fn build_slate_graph(
    layout: &LayoutConfig,
    resources: &ResourcePaths,
    fields: &FieldSet,
) -> DailiesResult<GraphPlan> {
    SlateGraphBuilder::new(layout, resources).build(fields)
}
