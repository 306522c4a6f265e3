//! Point sources and their time functions.

use serde::{Deserialize, Serialize};

use crate::element::ElementOps;

/// Source time function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SourceTimeFunction {
    /// f(t) = A (1 - 2 pi^2 nu^2 (t - tau)^2) exp(-pi^2 nu^2 (t - tau)^2)
    Ricker {
        amplitude: f64,
        center_freq: f64,
        time_delay: f64,
    },
    /// Tabulated samples at a fixed interval, linearly interpolated and
    /// zero outside the tabulated range.
    Table {
        samples: Vec<f64>,
        sample_interval: f64,
    },
}

impl SourceTimeFunction {
    pub fn eval(&self, t: f64) -> f64 {
        match self {
            SourceTimeFunction::Ricker {
                amplitude,
                center_freq,
                time_delay,
            } => {
                let arg = std::f64::consts::PI.powi(2)
                    * center_freq
                    * center_freq
                    * (t - time_delay)
                    * (t - time_delay);
                amplitude * (1.0 - 2.0 * arg) * (-arg).exp()
            }
            SourceTimeFunction::Table {
                samples,
                sample_interval,
            } => {
                if samples.is_empty() || t < 0.0 {
                    return 0.0;
                }
                let pos = t / sample_interval;
                let i = pos.floor() as usize;
                if i + 1 >= samples.len() {
                    return 0.0;
                }
                let frac = pos - i as f64;
                samples[i] * (1.0 - frac) + samples[i + 1] * frac
            }
        }
    }
}

/// A point source with physical location and a per-component direction
/// vector (length 1 expected; not renormalized).
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub location: [f64; 3],
    pub direction: Vec<f64>,
    pub time_function: SourceTimeFunction,
    /// Owning element and reference coordinates after localization.
    pub element: Option<usize>,
    pub xi: Option<Vec<f64>>,
    /// Nodal force pattern l_i(xi) on the owning element.
    pub force: Option<Vec<f64>>,
}

impl Source {
    pub fn new(
        name: &str,
        location: [f64; 3],
        direction: Vec<f64>,
        time_function: SourceTimeFunction,
    ) -> Self {
        Self {
            name: name.to_string(),
            location,
            direction,
            time_function,
            element: None,
            xi: None,
            force: None,
        }
    }

    pub fn is_localized(&self) -> bool {
        self.element.is_some()
    }

    /// Bind the source to its owning element: invert the map and cache the
    /// force pattern apply_test_and_integrate(delta_coefficients).
    pub fn finalize(&mut self, element_id: usize, element: &dyn ElementOps) -> bool {
        let Some(xi) = element.inverse_map(&self.location) else {
            return false;
        };
        let coeffs = element.delta_coefficients(&xi);
        let mut force = vec![0.0; element.num_nodes()];
        element.apply_test_and_integrate(&coeffs, &mut force);
        self.element = Some(element_id);
        self.xi = Some(xi);
        self.force = Some(force);
        true
    }
}
