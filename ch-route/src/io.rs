//! Text formats for graphs.
//!
//! Input graphs are read as a `<vertices> <edges>` header, then one `<id> <longitude> <latitude>`
//! line per vertex and one `<from> <to> <cost>` line per edge. The augmented graph is read back in
//! the layout [`AugmentedGraph::write_to`] produces. Blank lines are skipped in both formats and
//! every error names the 1-based line it was found on.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{
    BufRead,
    BufReader,
    Lines,
};
use std::path::Path;
use std::str::FromStr;

use ch_core::{
    Cost,
    GraphError,
    VertexId,
};
use tracing::{
    info,
    instrument,
};

use crate::contraction_hierarchies::{
    AugmentedGraph,
    Shortcut,
};
use crate::graph::{
    Coordinates,
    Edge,
    Graph,
};

/// Marker for "no rank" and "not a shortcut" in the augmented layout.
const NONE_MARKER: &str = "-1";

/// Non-blank lines of a reader, tagged with their 1-based line number.
struct Records<R> {
    /// Underlying lines.
    lines: Lines<R>,
    /// Number of the last line read.
    line: usize,
}

impl<R: BufRead> Records<R> {
    /// Wrap `reader`.
    fn new(reader: R) -> Self {
        Self { lines: reader.lines(), line: 0 }
    }

    /// The next non-blank line split on whitespace, which must have exactly `width` fields.
    fn record(&mut self, width: usize, what: &str) -> Result<(usize, Vec<String>), GraphError> {
        loop {
            let Some(text) = self.lines.next() else {
                return Err(GraphError::parse(self.line + 1, format!("unexpected end of input, expected {what}")));
            };
            let text = text?;
            self.line += 1;
            if text.trim().is_empty() {
                continue;
            }

            let fields: Vec<String> = text.split_whitespace().map(str::to_owned).collect();
            if fields.len() != width {
                return Err(GraphError::parse(
                    self.line,
                    format!("expected {width} fields for {what}, found {}", fields.len()),
                ));
            }
            return Ok((self.line, fields));
        }
    }
}

/// Parse one field, naming it in the error.
fn field<T: FromStr>(line: usize, raw: &str, name: &str) -> Result<T, GraphError> {
    raw.parse().map_err(|_| GraphError::parse(line, format!("invalid {name} '{raw}'")))
}

/// Parse a field that is either [`NONE_MARKER`] or a value.
fn optional_field<T: FromStr>(line: usize, raw: &str, name: &str) -> Result<Option<T>, GraphError> {
    if raw == NONE_MARKER {
        Ok(None)
    } else {
        field(line, raw, name).map(Some)
    }
}

/// Read the `<vertices> <edges>` header.
fn header<R: BufRead>(records: &mut Records<R>) -> Result<(usize, usize), GraphError> {
    let (line, f) = records.record(2, "the header")?;
    Ok((field(line, &f[0], "vertex count")?, field(line, &f[1], "edge count")?))
}

/// Read an input graph.
///
/// # Errors
///
/// [`GraphError::Parse`] for malformed or missing records, [`GraphError::UnknownVertex`] for an edge
/// whose endpoint was never declared, and [`GraphError::Io`] for read failures.
pub fn read_graph<R: BufRead>(reader: R) -> Result<Graph, GraphError> {
    let mut records = Records::new(reader);
    let (vertex_count, edge_count) = header(&mut records)?;

    let mut graph = Graph::new();
    for _ in 0..vertex_count {
        let (line, f) = records.record(3, "a vertex")?;
        let id = field(line, &f[0], "vertex id")?;
        let coordinates = Coordinates {
            longitude: field(line, &f[1], "longitude")?,
            latitude: field(line, &f[2], "latitude")?,
        };
        graph.add_vertex(id, coordinates);
    }
    for _ in 0..edge_count {
        let (line, f) = records.record(3, "an edge")?;
        let from: VertexId = field(line, &f[0], "source vertex")?;
        let to: VertexId = field(line, &f[1], "target vertex")?;
        let cost: Cost = field(line, &f[2], "cost")?;
        graph.add_edge(from, to, cost)?;
    }
    Ok(graph)
}

/// Read an input graph from a file.
///
/// # Errors
///
/// See [`read_graph`]; failing to open the file is a [`GraphError::Io`].
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_graph_file(path: &Path) -> Result<Graph, GraphError> {
    let graph = read_graph(BufReader::new(File::open(path)?))?;
    info!(vertices = graph.vertex_count(), edges = graph.edge_count(), "Loaded graph");
    Ok(graph)
}

/// Read an augmented graph back from its exported layout.
///
/// Vertex attributes are not part of the layout and come back as [`Coordinates::default`].
///
/// # Errors
///
/// [`GraphError::Parse`] for malformed or missing records, [`GraphError::UnknownVertex`] for an edge
/// whose endpoint was never declared, and [`GraphError::Io`] for read failures.
pub fn read_augmented<R: BufRead>(reader: R) -> Result<AugmentedGraph, GraphError> {
    let mut records = Records::new(reader);
    let (vertex_count, edge_count) = header(&mut records)?;

    let mut vertices = Vec::new();
    let mut ranks = BTreeMap::new();
    for _ in 0..vertex_count {
        let (line, f) = records.record(2, "a ranked vertex")?;
        let id: VertexId = field(line, &f[0], "vertex id")?;
        if let Some(rank) = optional_field(line, &f[1], "rank")? {
            ranks.insert(id, rank);
        }
        vertices.push((id, Coordinates::default()));
    }

    let mut original_edges = Vec::new();
    let mut shortcuts = Vec::new();
    for _ in 0..edge_count {
        let (line, f) = records.record(4, "an augmented edge")?;
        let from = field(line, &f[0], "source vertex")?;
        let to = field(line, &f[1], "target vertex")?;
        let cost = field(line, &f[2], "cost")?;
        match optional_field(line, &f[3], "via vertex")? {
            None => original_edges.push(Edge { from, to, cost, via: None }),
            Some(via) => shortcuts.push(Shortcut { from, to, cost, via }),
        }
    }

    AugmentedGraph::from_parts(vertices, ranks, original_edges, shortcuts)
}
