//! Demand ingestion. Non-positive or unparsable magnitudes abort the run
//! here, before any processing starts; a zero demand would otherwise drive
//! the capacity tuner's shrink loop forever.

use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{DemandConfig, SyntheticDemands};

pub fn load_demands(config: &DemandConfig) -> Result<Vec<f64>> {
    match (&config.file, &config.synthetic) {
        (Some(path), None) => read_demands(path),
        (None, Some(spec)) => Ok(generate_demands(spec)),
        _ => bail!("configure either a demand file or synthetic demands"),
    }
}

/// Reads one demand magnitude per line, skipping blank lines.
pub fn read_demands<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let content =
        std::fs::read_to_string(path).with_context(|| format!("fail to open {:?}", path))?;

    let mut values = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: f64 = line
            .parse()
            .with_context(|| format!("{:?}:{}: bad demand value {:?}", path, lineno + 1, line))?;
        if !value.is_finite() || value <= 0.0 {
            bail!(
                "{:?}:{}: demand magnitudes must be positive, got {}",
                path,
                lineno + 1,
                value
            );
        }
        values.push(value);
    }
    if values.is_empty() {
        bail!("no demand values in {:?}", path);
    }
    Ok(values)
}

/// Deterministic synthetic demands from a seeded uniform distribution.
pub fn generate_demands(spec: &SyntheticDemands) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let dist = Uniform::new_inclusive(spec.min, spec.max);
    (0..spec.count).map(|_| dist.sample(&mut rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_demands_are_reproducible_and_in_range() {
        let spec = SyntheticDemands {
            count: 100,
            min: 500.0,
            max: 9000.0,
            seed: 7,
        };
        let a = generate_demands(&spec);
        let b = generate_demands(&spec);
        assert_eq!(a, b);
        assert_eq!(a.len(), 100);
        assert!(a.iter().all(|&d| (500.0..=9000.0).contains(&d)));
    }

    #[test]
    fn different_seeds_differ() {
        let mut spec = SyntheticDemands {
            count: 10,
            min: 1.0,
            max: 100.0,
            seed: 0,
        };
        let a = generate_demands(&spec);
        spec.seed = 1;
        let b = generate_demands(&spec);
        assert_ne!(a, b);
    }
}
