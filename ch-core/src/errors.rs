//! Error types shared by the graph store, the loaders and the exporters.

use thiserror::Error;

use crate::VertexId;

/// Everything that can go wrong while building, loading or writing a graph.
///
/// Unreachable query targets and empty graphs are *not* errors; they are ordinary results.
#[derive(Debug, Error)]
pub enum GraphError {
    /// An edge was requested between vertices where at least one endpoint is not stored.
    #[error("edge {from} -> {to} references unknown vertex {missing}")]
    UnknownVertex {
        /// Source of the rejected edge.
        from: VertexId,
        /// Target of the rejected edge.
        to: VertexId,
        /// The endpoint that does not exist.
        missing: VertexId,
    },

    /// An operation addressed a vertex id that is not stored in the graph.
    #[error("vertex {0} does not exist")]
    NoSuchVertex(VertexId),

    /// A graph description could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number of the offending record.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// Reading or writing a graph file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GraphError {
    /// Shorthand for a [`GraphError::Parse`] at `line`.
    #[must_use]
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse { line, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;

    use super::*;

    #[test]
    fn test_unknown_vertex_names_missing_endpoint() {
        let err = GraphError::UnknownVertex { from: 1, to: 7, missing: 7 };
        assert_eq!(err.to_string(), "edge 1 -> 7 references unknown vertex 7");
    }

    #[test]
    fn test_parse_error_carries_line() {
        let err = GraphError::parse(3, "expected 3 fields, found 2");
        assert_contains!(err.to_string(), "line 3");
        assert!(matches!(err, GraphError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_io_error_is_transparent() {
        let err: GraphError = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file").into();
        assert_eq!(err.to_string(), "no such file");
    }
}
