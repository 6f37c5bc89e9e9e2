/// Counters accumulated since the last [`reset_stats`](crate::Renderer2D::reset_stats).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Renderer2DStats {
    pub draw_calls: u32,
    pub quad_count: u32,
    pub circle_count: u32,
    pub line_count: u32,
}

impl Renderer2DStats {
    /// Quad and circle vertices. Lines are not counted.
    pub fn total_vertex_count(&self) -> u32 {
        (self.quad_count + self.circle_count) * 4
    }

    pub fn total_index_count(&self) -> u32 {
        (self.quad_count + self.circle_count) * 6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let stats = Renderer2DStats {
            draw_calls: 3,
            quad_count: 5,
            circle_count: 2,
            line_count: 7,
        };
        assert_eq!(stats.total_vertex_count(), 28);
        assert_eq!(stats.total_index_count(), 42);
        assert_eq!(Renderer2DStats::default().total_index_count(), 0);
    }
}
