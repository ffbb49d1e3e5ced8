//! Rendered chart handed from the visualizer to the report and web layers.

/// Opaque chart output. Consumers embed it; they never inspect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    svg: String,
}

impl ChartArtifact {
    pub fn from_svg(svg: String) -> Self {
        Self { svg }
    }

    /// Inline `<svg>` markup.
    pub fn as_svg(&self) -> &str {
        &self.svg
    }
}
