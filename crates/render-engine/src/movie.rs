//! Review movie filtergraph: the sequence on the canvas, optionally preceded
//! by the slate and overlaid with file name and frame counter burn-ins.

use dailies_model::layout::LayoutConfig;
use dailies_model::resources::ResourcePaths;
use dailies_model::sequence::SequenceDescriptor;

use crate::graph::{Filter, FilterGraph, FilterNode, StreamRef, TextPart};
use crate::inputs::{GraphPlan, InputRole, InputRoster};

const BASE: &str = "base";
const SLATE: &str = "slate";

/// Last output frame that still carries burn-ins.
const BURNIN_LAST_FRAME: u64 = 99_999;
/// Distance of burn-in text from the frame edges.
const BURNIN_MARGIN: u32 = 10;

/// What the movie graph should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieGraphOptions {
    /// Prepend the rendered slate as the first frame.
    pub slate: bool,
    /// Overlay file name and frame counter.
    pub burnin: bool,
}

impl Default for MovieGraphOptions {
    fn default() -> Self {
        Self {
            slate: true,
            burnin: true,
        }
    }
}

/// Build the movie graph for a resolved sequence.
///
/// Input 0 is the slate image when a slate is requested and a generated null
/// source otherwise, so the sequence is always input 1.
pub fn build_movie_graph(
    layout: &LayoutConfig,
    resources: &ResourcePaths,
    sequence: &SequenceDescriptor,
    options: MovieGraphOptions,
) -> GraphPlan {
    let mut inputs = InputRoster::new();
    let head = inputs.add(if options.slate {
        InputRole::SlateImage
    } else {
        InputRole::NullSource
    });
    let frames = inputs.add(InputRole::Sequence);

    let canvas = layout.canvas;
    let mut graph = FilterGraph::new();
    graph.push(FilterNode::new(
        vec![frames],
        vec![
            Filter::scale(canvas.width, canvas.height),
            Filter::square_pixels(),
        ],
        Some(BASE),
    ));

    if options.slate {
        graph.push(FilterNode::new(
            vec![head],
            vec![Filter::trim_frames(0, 1)],
            Some(SLATE),
        ));
        graph.push(FilterNode::new(
            vec![StreamRef::label(SLATE), StreamRef::label(BASE)],
            vec![Filter::concat()],
            Some(BASE),
        ));
    }

    // The final node feeds the output file, so it stays unlabeled.
    if options.burnin {
        // The slate occupies output frame 0.
        let first = u64::from(options.slate);
        graph.push(FilterNode::new(
            vec![StreamRef::label(BASE)],
            burnin_chain(layout, resources, sequence, first),
            None,
        ));
    } else {
        graph.push(FilterNode::new(
            vec![StreamRef::label(BASE)],
            vec![Filter::null()],
            None,
        ));
    }

    tracing::debug!(
        slate = options.slate,
        burnin = options.burnin,
        nodes = graph.nodes().len(),
        "Built movie graph"
    );
    GraphPlan { graph, inputs }
}

fn burnin_chain(
    layout: &LayoutConfig,
    resources: &ResourcePaths,
    sequence: &SequenceDescriptor,
    first: u64,
) -> Vec<Filter> {
    let font = resources.body_font.to_string_lossy();
    let enable = format!("'between(n,{first},{BURNIN_LAST_FRAME})'");
    let bottom = format!("(h-(text_h+{BURNIN_MARGIN}))");
    let file_name = Filter::drawtext()
        .arg("fontsize", layout.burnin_font_size)
        .arg("fontcolor", &layout.font_color)
        .text("fontfile", &*font)
        .arg("expansion", "none")
        .text("text", sequence.file_name())
        .arg("x", BURNIN_MARGIN)
        .arg("y", &bottom)
        .arg("enable", &enable);

    // drawtext adds start_number to the output frame index, and start_number
    // cannot go below zero.
    let offset = i64::try_from(sequence.start()).unwrap_or(i64::MAX) - first as i64;
    let range = TextPart::Literal(format!(" [{}]", sequence.frame_range()));
    let mut counter = Filter::drawtext()
        .arg("fontsize", layout.burnin_font_size)
        .arg("fontcolor", &layout.font_color)
        .text("fontfile", &*font);
    counter = if offset >= 0 {
        counter
            .arg("start_number", offset)
            .text_parts("text", vec![TextPart::FrameNumber, range])
    } else {
        counter.text_parts("text", vec![TextPart::FrameOffset(offset), range])
    };
    let counter = counter
        .arg("x", format!("(w-(text_w+{BURNIN_MARGIN}))"))
        .arg("y", &bottom)
        .arg("enable", &enable);

    vec![file_name, counter]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FilterKind;
    use dailies_model::sequence::resolve;

    fn resources() -> ResourcePaths {
        let res = std::path::PathBuf::from("/opt/dailies/resources");
        ResourcePaths {
            bars: res.join("bars.png"),
            color_bars: res.join("color_bars.png"),
            logo: res.join("logo.png"),
            logo_font: res.join("Bold.ttf"),
            body_font: res.join("Regular.ttf"),
        }
    }

    fn sequence(dir: &std::path::Path) -> SequenceDescriptor {
        frames(dir, 1001..=1050)
    }

    fn frames(dir: &std::path::Path, range: std::ops::RangeInclusive<u64>) -> SequenceDescriptor {
        for frame in range {
            std::fs::write(dir.join(format!("shot010.{frame:04}.exr")), b"").unwrap();
        }
        resolve(dir.join("shot010.%04d.exr").to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_slate_makes_input_zero_the_slate_image() {
        let dir = tempfile::tempdir().unwrap();
        let plan = build_movie_graph(
            &LayoutConfig::default(),
            &resources(),
            &sequence(dir.path()),
            MovieGraphOptions::default(),
        );
        assert_eq!(plan.roles(), &[InputRole::SlateImage, InputRole::Sequence]);
        let graph = plan.render();
        assert!(graph.starts_with(concat!(
            "[1:v]scale=1920:1080,setsar=1:1[base];",
            "[0:v]trim=start_frame=0:end_frame=1[slate];",
            "[slate][base]concat[base];",
            "[base]drawtext="
        )));
        assert!(!graph.ends_with(']'), "{graph}");
    }

    #[test]
    fn test_without_slate_input_zero_is_null_source() {
        let dir = tempfile::tempdir().unwrap();
        let plan = build_movie_graph(
            &LayoutConfig::default(),
            &resources(),
            &sequence(dir.path()),
            MovieGraphOptions {
                slate: false,
                burnin: true,
            },
        );
        assert_eq!(plan.roles(), &[InputRole::NullSource, InputRole::Sequence]);
        assert!(!plan.render().contains("trim"));
        assert!(plan.render().contains("start_number=1001:"));
        assert!(plan.render().contains("enable='between(n,0,99999)'"));
    }

    #[test]
    fn test_burnin_counter_and_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let graph = build_movie_graph(
            &LayoutConfig::default(),
            &resources(),
            &sequence(dir.path()),
            MovieGraphOptions::default(),
        )
        .render();
        assert!(graph.contains(
            "drawtext=fontsize=30:fontcolor=White:fontfile=/opt/dailies/resources/Regular.ttf:expansion=none:text=shot010.%04d.exr:x=10:y=(h-(text_h+10)):enable='between(n,1,99999)'"
        ), "{graph}");
        assert!(graph.contains(
            r"start_number=1000:text=%{n} \[1001-1050\]:x=(w-(text_w+10)):y=(h-(text_h+10)):enable='between(n,1,99999)'"
        ), "{graph}");
    }

    #[test]
    fn test_plain_movie_still_scales_and_ends_with_null() {
        let dir = tempfile::tempdir().unwrap();
        let plan = build_movie_graph(
            &LayoutConfig::default(),
            &resources(),
            &sequence(dir.path()),
            MovieGraphOptions {
                slate: false,
                burnin: false,
            },
        );
        assert_eq!(
            plan.render(),
            "[1:v]scale=1920:1080,setsar=1:1[base];[base]null"
        );
        assert_eq!(
            plan.graph.filters().last().map(Filter::kind),
            Some(FilterKind::Null)
        );
    }

    #[test]
    fn test_slate_without_burnin_ends_with_null() {
        let dir = tempfile::tempdir().unwrap();
        let graph = build_movie_graph(
            &LayoutConfig::default(),
            &resources(),
            &sequence(dir.path()),
            MovieGraphOptions {
                slate: true,
                burnin: false,
            },
        )
        .render();
        assert!(graph.ends_with("[slate][base]concat[base];[base]null"), "{graph}");
    }

    #[test]
    fn test_zero_based_sequence_counts_from_zero_after_slate() {
        let dir = tempfile::tempdir().unwrap();
        let graph = build_movie_graph(
            &LayoutConfig::default(),
            &resources(),
            &frames(dir.path(), 0..=9),
            MovieGraphOptions::default(),
        )
        .render();
        // Output frame 1 is sequence frame 0.
        assert!(
            graph.contains(r"text=%{eif\\:n-1\\:d} \[0-9\]:x="),
            "{graph}"
        );
        assert!(!graph.contains("start_number"), "{graph}");
        assert!(graph.contains("enable='between(n,1,99999)'"), "{graph}");
    }

    #[test]
    fn test_zero_based_sequence_without_slate_uses_start_number() {
        let dir = tempfile::tempdir().unwrap();
        let graph = build_movie_graph(
            &LayoutConfig::default(),
            &resources(),
            &frames(dir.path(), 0..=9),
            MovieGraphOptions {
                slate: false,
                burnin: true,
            },
        )
        .render();
        assert!(graph.contains(r"start_number=0:text=%{n} \[0-9\]"), "{graph}");
    }
}
