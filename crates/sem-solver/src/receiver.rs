//! Receivers: point sampling of the displacement fields.

use crate::element::ElementOps;

/// A receiver with a physical location; after localization it caches the
/// owning element, reference coordinates and interpolation row, and
/// accumulates one trace per recorded field component.
#[derive(Debug, Clone)]
pub struct Receiver {
    pub name: String,
    pub location: [f64; 3],
    pub element: Option<usize>,
    pub xi: Option<Vec<f64>>,
    interp: Option<Vec<f64>>,
    pub times: Vec<f64>,
    /// One trace per pulled field component.
    pub traces: Vec<Vec<f64>>,
}

impl Receiver {
    pub fn new(name: &str, location: [f64; 3]) -> Self {
        Self {
            name: name.to_string(),
            location,
            element: None,
            xi: None,
            interp: None,
            times: Vec::new(),
            traces: Vec::new(),
        }
    }

    pub fn is_localized(&self) -> bool {
        self.element.is_some()
    }

    pub fn finalize(
        &mut self,
        element_id: usize,
        element: &dyn ElementOps,
        num_components: usize,
    ) -> bool {
        let Some(xi) = element.inverse_map(&self.location) else {
            return false;
        };
        self.interp = Some(element.interp_at(&xi));
        self.xi = Some(xi);
        self.element = Some(element_id);
        self.traces = vec![Vec::new(); num_components];
        true
    }

    /// Record one sample per component from the element-local field
    /// values (tensor order). A receiver that was never localized records
    /// nothing.
    pub fn record(&mut self, t: f64, element_fields: &[Vec<f64>]) {
        let Some(interp) = self.interp.as_ref() else {
            return;
        };
        self.times.push(t);
        for (c, field) in element_fields.iter().enumerate() {
            let value: f64 = interp.iter().zip(field).map(|(a, b)| a * b).sum();
            self.traces[c].push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::BasisCache;
    use crate::element::build_element;
    use sem_mesh::{ElementShape, structured_quads};

    #[test]
    fn records_interpolated_samples() {
        let mesh = structured_quads(1, 1, [0.0, 1.0], [0.0, 1.0]).unwrap();
        let mut cache = BasisCache::new();
        let coords = mesh.cell_coords(0);
        let element = build_element(&mut cache, ElementShape::Quad, 3, &coords, 0).unwrap();

        let mut rec = Receiver::new("r0", [0.3, 0.7, 0.0]);
        assert!(rec.finalize(0, element.as_ref(), 1));

        // sample a polynomial field: interpolation is exact in the span
        let u: Vec<f64> = element
            .node_coords()
            .iter()
            .map(|c| c[0] * c[0] + 2.0 * c[1])
            .collect();
        rec.record(0.0, &[u]);
        let expected = 0.3f64 * 0.3 + 2.0 * 0.7;
        assert!((rec.traces[0][0] - expected).abs() < 1e-12);
        assert_eq!(rec.times, vec![0.0]);
    }

    #[test]
    fn unlocalized_receiver_reports_status() {
        let rec = Receiver::new("far", [100.0, 100.0, 0.0]);
        assert!(!rec.is_localized());
    }
}
