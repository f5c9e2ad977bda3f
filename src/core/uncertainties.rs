use ndarray::{Array, ArrayBase, Data, Dimension};

use crate::core::uncertain::Uncertain;

/// Pair raw photon counts with their counting statistics.
///
/// The uncertainty is `sqrt(count)` but never below one count, so empty and
/// negative pixels still carry a usable error estimate.
pub fn estimate_poisson_uncertainty<S, D>(counts: &ArrayBase<S, D>) -> Array<Uncertain, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    counts.map(|&count| Uncertain::new(count, count.max(1.0).sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_poisson_uncertainty() {
        let counts = arr1(&[0.0, 1.0, 4.0, 100.0, -3.0]);
        let estimated = estimate_poisson_uncertainty(&counts);

        let uncertainties: Vec<f64> = estimated.iter().map(|v| v.uncertainty()).collect();
        assert_eq!(uncertainties, vec![1.0, 1.0, 2.0, 10.0, 1.0]);
        assert_eq!(estimated[3].nominal(), 100.0);
        assert_eq!(estimated[4].nominal(), -3.0);
    }
}
