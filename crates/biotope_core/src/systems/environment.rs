use crate::error::Result;
use crate::matrix::Matrix;
use crate::topology::Topology;

/// Integrates one explicit diffusion step: `environment += flux * dt`.
pub fn diffuse(
    environment: &mut Matrix,
    topology: &Topology,
    diffusion: &Matrix,
    dt: f64,
) -> Result<()> {
    let flux = topology.flux(environment, diffusion)?;
    environment.scaled_add(dt, &flux);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Axis};

    #[test]
    fn test_diffuse_moves_toward_neighbour() {
        let topology = Topology::from_adjacency(vec![vec![1], vec![0]], 1.0).unwrap();
        let mut env = array![[10.0, 4.0]];
        diffuse(&mut env, &topology, &array![[0.5, 0.5]], 0.1).unwrap();
        assert!(env[[0, 0]] < 10.0);
        assert!(env[[0, 1]] > 4.0);
        assert!((env.sum_axis(Axis(1))[0] - 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_coefficient_is_inert() {
        let topology = Topology::honeycomb(4, 2, 1.0).unwrap();
        let mut env = Matrix::from_shape_fn((1, 8), |(_, c)| c as f64);
        let before = env.clone();
        diffuse(&mut env, &topology, &Matrix::zeros((1, 8)), 1.0).unwrap();
        assert_eq!(env, before);
    }
}
