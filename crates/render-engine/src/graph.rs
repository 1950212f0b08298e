//! Typed filtergraph nodes and their serialization to ffmpeg syntax.
//!
//! Builders never format graph text themselves. They append [`FilterNode`]s
//! and the graph is rendered in one place, which is also where every
//! user-controlled value gets escaped.
//!
//! ffmpeg parses a filtergraph in two passes: the graph parser splits on
//! `[ ] , ;` and then each filter parses its own `key=value:key=value`
//! options. Text values are escaped for the option pass first and for the
//! graph pass second.

use std::fmt;

/// Frame index token understood by `drawtext` when expansion is enabled.
const FRAME_NUMBER_EXPANSION: &str = "%{n}";

/// A reference to a stream consumed by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRef {
    /// Video stream of the n-th external input.
    Input(usize),
    /// Output of an earlier node.
    Label(String),
}

impl StreamRef {
    pub fn label(name: impl Into<String>) -> Self {
        Self::Label(name.into())
    }
}

impl fmt::Display for StreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamRef::Input(index) => write!(f, "[{index}:v]"),
            StreamRef::Label(name) => write!(f, "[{name}]"),
        }
    }
}

/// Operations the builders emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Scale,
    SetSar,
    Overlay,
    DrawText,
    Trim,
    Concat,
    Null,
}

impl FilterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::Scale => "scale",
            FilterKind::SetSar => "setsar",
            FilterKind::Overlay => "overlay",
            FilterKind::DrawText => "drawtext",
            FilterKind::Trim => "trim",
            FilterKind::Concat => "concat",
            FilterKind::Null => "null",
        }
    }
}

/// One piece of a text value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPart {
    Literal(String),
    /// Current frame number, expanded by the engine per frame.
    FrameNumber,
    /// Output frame index plus a fixed offset, for counters that would need
    /// a negative `start_number`.
    FrameOffset(i64),
}

impl TextPart {
    fn is_dynamic(&self) -> bool {
        !matches!(self, TextPart::Literal(_))
    }
}

/// A filter option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterArg {
    /// Expression written by the builders, emitted verbatim.
    Expr(String),
    /// Caller-supplied text or paths, always escaped.
    Text(Vec<TextPart>),
}

impl FilterArg {
    fn render(&self) -> String {
        match self {
            FilterArg::Expr(expr) => expr.clone(),
            FilterArg::Text(parts) => {
                let dynamic = parts.iter().any(TextPart::is_dynamic);
                let mut out = String::new();
                for part in parts {
                    match part {
                        TextPart::Literal(text) if dynamic => {
                            out.push_str(&escape_text(&escape_expansion(text)))
                        }
                        TextPart::Literal(text) => out.push_str(&escape_text(text)),
                        // Substituted last so no escaping pass touches it.
                        TextPart::FrameNumber => out.push_str(FRAME_NUMBER_EXPANSION),
                        // Option and graph passes only: the engine expands it.
                        TextPart::FrameOffset(offset) => {
                            out.push_str(&escape_text(&format!("%{{eif:n{offset:+}:d}}")))
                        }
                    }
                }
                out
            }
        }
    }
}

/// A single filter with ordered options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    kind: FilterKind,
    args: Vec<(Option<&'static str>, FilterArg)>,
}

impl Filter {
    pub fn new(kind: FilterKind) -> Self {
        Self {
            kind,
            args: Vec::new(),
        }
    }

    /// Positional option.
    pub fn positional(mut self, expr: impl Into<String>) -> Self {
        self.args.push((None, FilterArg::Expr(expr.into())));
        self
    }

    /// Named option with a builder-controlled expression.
    pub fn arg(mut self, key: &'static str, expr: impl fmt::Display) -> Self {
        self.args.push((Some(key), FilterArg::Expr(expr.to_string())));
        self
    }

    /// Named option with caller-supplied text.
    pub fn text(mut self, key: &'static str, text: impl Into<String>) -> Self {
        let parts = vec![TextPart::Literal(text.into())];
        self.args.push((Some(key), FilterArg::Text(parts)));
        self
    }

    /// Named option with text that mixes literals and per-frame tokens.
    pub fn text_parts(mut self, key: &'static str, parts: Vec<TextPart>) -> Self {
        self.args.push((Some(key), FilterArg::Text(parts)));
        self
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Value of a named option, if set.
    pub fn get(&self, key: &str) -> Option<&FilterArg> {
        self.args
            .iter()
            .find(|(k, _)| *k == Some(key))
            .map(|(_, v)| v)
    }

    /// `scale=w:h`
    pub fn scale(width: impl fmt::Display, height: impl fmt::Display) -> Self {
        Self::new(FilterKind::Scale)
            .positional(width.to_string())
            .positional(height.to_string())
    }

    /// `setsar=1:1`
    pub fn square_pixels() -> Self {
        Self::new(FilterKind::SetSar).positional("1").positional("1")
    }

    /// Overlay at the top-left corner.
    pub fn overlay() -> Self {
        Self::new(FilterKind::Overlay)
    }

    /// Overlay at explicit coordinates.
    pub fn overlay_at(x: impl fmt::Display, y: impl fmt::Display) -> Self {
        Self::new(FilterKind::Overlay).arg("x", x).arg("y", y)
    }

    pub fn drawtext() -> Self {
        Self::new(FilterKind::DrawText)
    }

    /// Keep frames `[start, end)`.
    pub fn trim_frames(start: u64, end: u64) -> Self {
        Self::new(FilterKind::Trim)
            .arg("start_frame", start)
            .arg("end_frame", end)
    }

    pub fn concat() -> Self {
        Self::new(FilterKind::Concat)
    }

    pub fn null() -> Self {
        Self::new(FilterKind::Null)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())?;
        for (i, (key, value)) in self.args.iter().enumerate() {
            f.write_str(if i == 0 { "=" } else { ":" })?;
            if let Some(key) = key {
                write!(f, "{key}=")?;
            }
            f.write_str(&value.render())?;
        }
        Ok(())
    }
}

/// A filter chain with its input and output pads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterNode {
    pub inputs: Vec<StreamRef>,
    pub chain: Vec<Filter>,
    /// `None` leaves the pad unlabeled so it feeds the output file.
    pub output: Option<String>,
}

impl FilterNode {
    pub fn new(inputs: Vec<StreamRef>, chain: Vec<Filter>, output: Option<&str>) -> Self {
        Self {
            inputs,
            chain,
            output: output.map(str::to_string),
        }
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            write!(f, "{input}")?;
        }
        for (i, filter) in self.chain.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{filter}")?;
        }
        if let Some(output) = &self.output {
            write!(f, "[{output}]")?;
        }
        Ok(())
    }
}

/// An ordered list of nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterGraph {
    nodes: Vec<FilterNode>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node. Nodes are never modified once appended.
    pub fn push(&mut self, node: FilterNode) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    /// Every filter in graph order.
    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.nodes.iter().flat_map(|n| n.chain.iter())
    }

    /// Serialize to `-filter_complex` syntax.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

/// Escape a value for a filter's own option parser.
pub fn escape_option_value(value: &str) -> String {
    escape_chars(value, &['\\', '\'', ':'])
}

/// Escape a filter description for the graph parser.
pub fn escape_graph_value(value: &str) -> String {
    escape_chars(value, &['\\', '\'', '[', ']', ',', ';'])
}

/// Escape literal text for `drawtext` expansion (`%{...}` sequences).
pub fn escape_expansion(value: &str) -> String {
    escape_chars(value, &['\\', '%'])
}

/// Escape caller-supplied text so it survives both parsing passes.
pub fn escape_text(value: &str) -> String {
    escape_graph_value(&escape_option_value(value))
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        if special.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Inverse of one escaping pass: drops each escaping backslash.
    fn unescape(value: &str) -> String {
        let mut out = String::new();
        let mut chars = value.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(ch);
            }
        }
        out
    }

    /// Characters that would end a token at the given pass if unescaped.
    fn has_bare_delimiter(value: &str, delimiters: &[char]) -> bool {
        let mut chars = value.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                chars.next();
            } else if delimiters.contains(&ch) {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_escape_text_matches_documented_example() {
        let text = "this is a 'string': may contain one, or more, special characters";
        assert_eq!(
            escape_text(text),
            r"this is a \\\'string\\\'\\: may contain one\, or more\, special characters"
        );
    }

    #[test]
    fn test_filter_renders_positional_then_named() {
        assert_eq!(Filter::scale(1920, 1080).to_string(), "scale=1920:1080");
        assert_eq!(Filter::square_pixels().to_string(), "setsar=1:1");
        assert_eq!(Filter::overlay().to_string(), "overlay");
        assert_eq!(
            Filter::overlay_at("(main_w-overlay_w)", 10).to_string(),
            "overlay=x=(main_w-overlay_w):y=10"
        );
        assert_eq!(
            Filter::trim_frames(0, 1).to_string(),
            "trim=start_frame=0:end_frame=1"
        );
    }

    #[test]
    fn test_text_option_is_escaped() {
        let filter = Filter::drawtext().text("text", "Shot: 'A'").arg("x", 10);
        assert_eq!(
            filter.to_string(),
            r"drawtext=text=Shot\\: \\\'A\\\':x=10"
        );
    }

    #[test]
    fn test_frame_number_is_inserted_unescaped() {
        let filter = Filter::drawtext().text_parts(
            "text",
            vec![
                TextPart::FrameNumber,
                TextPart::Literal(" [1001-1050] 100%".to_string()),
            ],
        );
        assert_eq!(
            filter.to_string(),
            r"drawtext=text=%{n} \[1001-1050\] 100\\\\%"
        );
    }

    #[test]
    fn test_frame_offset_survives_both_passes() {
        let filter = Filter::drawtext().text_parts(
            "text",
            vec![
                TextPart::FrameOffset(-1),
                TextPart::Literal(" [0-9]".to_string()),
            ],
        );
        let rendered = filter.to_string();
        assert_eq!(rendered, r"drawtext=text=%{eif\\:n-1\\:d} \[0-9\]");
        // Graph pass then option pass leave the plain expansion.
        let text = rendered.trim_start_matches("drawtext=text=");
        assert_eq!(unescape(&unescape(text)), "%{eif:n-1:d} [0-9]");
    }

    #[test]
    fn test_node_and_graph_rendering() {
        let mut graph = FilterGraph::new();
        graph.push(FilterNode::new(
            vec![StreamRef::Input(1)],
            vec![Filter::scale(1920, 1080), Filter::square_pixels()],
            Some("base"),
        ));
        graph.push(FilterNode::new(
            vec![StreamRef::label("base")],
            vec![Filter::null()],
            None,
        ));
        assert_eq!(
            graph.render(),
            "[1:v]scale=1920:1080,setsar=1:1[base];[base]null"
        );
        assert_eq!(graph.filters().count(), 3);
    }

    proptest! {
        #[test]
        fn prop_escaped_text_has_no_bare_delimiters(text in ".{0,64}") {
            let escaped = escape_text(&text);
            prop_assert!(!has_bare_delimiter(&escaped, &['[', ']', ',', ';', '\'']));
            let option_pass = unescape(&escaped);
            prop_assert!(!has_bare_delimiter(&option_pass, &[':', '\'']));
            prop_assert_eq!(unescape(&option_pass), text);
        }
    }
}
