//! Bounded bisection search for the largest encode that fits a byte budget.
//!
//! The search relies on the encoder being monotonic: a higher parameter never
//! yields a strictly smaller output for the same source. Under that invariant
//! the fitting region is a prefix `[min, p*]` of the parameter range and
//! bisection converges on `p*` from below.

use super::error::{CompressError, CompressResult};
use crate::models::TargetSize;

/// Default iteration budget for the image quality search.
pub const DEFAULT_MAX_ITERATIONS: u32 = 8;

/// Something that can produce an encoded buffer for a given parameter.
///
/// The parameter is a quality factor or bitrate depending on the encoder.
pub trait Encoder {
    /// Encode the source at `parameter`.
    fn encode(&mut self, parameter: f64) -> CompressResult<Vec<u8>>;
}

impl<F> Encoder for F
where
    F: FnMut(f64) -> CompressResult<Vec<u8>>,
{
    fn encode(&mut self, parameter: f64) -> CompressResult<Vec<u8>> {
        self(parameter)
    }
}

/// Parameter range and budget for a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Lowest parameter tried (best-effort fallback).
    pub min: f64,
    /// Highest parameter tried (probed first).
    pub max: f64,
    /// Maximum number of encode invocations, including the first probe.
    pub max_iterations: u32,
    /// Stop bisecting once the interval is narrower than this.
    pub tolerance: f64,
}

impl SearchConfig {
    /// JPEG quality search over `[0.01, 0.85]` with 8 encodes.
    pub fn image() -> Self {
        Self {
            min: 0.01,
            max: 0.85,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: 0.005,
        }
    }

    /// Check the range and budget are usable.
    pub fn validate(&self) -> CompressResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(CompressError::InvalidSearch(
                "range bounds must be finite".to_string(),
            ));
        }
        if self.min > self.max {
            return Err(CompressError::InvalidSearch(format!(
                "min {} is greater than max {}",
                self.min, self.max
            )));
        }
        if self.max_iterations < 2 {
            return Err(CompressError::InvalidSearch(
                "at least 2 iterations are required".to_string(),
            ));
        }
        if self.tolerance < 0.0 || !self.tolerance.is_finite() {
            return Err(CompressError::InvalidSearch(
                "tolerance must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::image()
    }
}

/// Result of a target-size search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Encoded output.
    pub data: Vec<u8>,
    /// Parameter that produced `data`.
    pub parameter: f64,
    /// False when even the minimum parameter exceeded the target.
    pub within_target: bool,
    /// Number of encoder invocations performed.
    pub encode_calls: u32,
}

impl SearchOutcome {
    /// Size of the encoded output in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the encoded output is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Find the largest encode that fits within `target`.
///
/// 1. Encode at `config.max`; return it if it fits.
/// 2. Bisect `[min, max]`, keeping the largest fitting output seen.
///    While nothing fits, one invocation stays reserved for step 3.
/// 3. If nothing fit, encode at `config.min` and return it even if it
///    still exceeds the target (`within_target == false`).
///
/// Encoder errors abort the search immediately.
pub fn search_target_size<E>(
    encoder: &mut E,
    target: TargetSize,
    config: &SearchConfig,
) -> CompressResult<SearchOutcome>
where
    E: Encoder + ?Sized,
{
    config.validate()?;

    let mut calls = 0u32;

    let top = encoder.encode(config.max)?;
    calls += 1;
    tracing::debug!(
        "[Search] probe max {:.3} -> {} bytes (target {})",
        config.max,
        top.len(),
        target.bytes()
    );
    if target.fits(top.len() as u64) {
        return Ok(SearchOutcome {
            data: top,
            parameter: config.max,
            within_target: true,
            encode_calls: calls,
        });
    }

    let mut lo = config.min;
    let mut hi = config.max;
    let mut best: Option<(f64, Vec<u8>)> = None;

    loop {
        let reserve = if best.is_some() { 0 } else { 1 };
        if calls + reserve >= config.max_iterations || hi - lo < config.tolerance {
            break;
        }

        let mid = (lo + hi) / 2.0;
        let data = encoder.encode(mid)?;
        calls += 1;

        let size = data.len();
        if target.fits(size as u64) {
            tracing::trace!("[Search] {:.4} -> {} bytes fits", mid, size);
            let larger = best
                .as_ref()
                .map_or(true, |(_, current)| size > current.len());
            if larger {
                best = Some((mid, data));
            }
            lo = mid;
        } else {
            tracing::trace!("[Search] {:.4} -> {} bytes too large", mid, size);
            hi = mid;
        }
    }

    if let Some((parameter, data)) = best {
        tracing::debug!(
            "[Search] converged at {:.4} -> {} bytes after {} encodes",
            parameter,
            data.len(),
            calls
        );
        return Ok(SearchOutcome {
            data,
            parameter,
            within_target: true,
            encode_calls: calls,
        });
    }

    // Nothing fit: fall back to the lowest quality
    let floor = encoder.encode(config.min)?;
    calls += 1;
    let within_target = target.fits(floor.len() as u64);
    if !within_target {
        tracing::warn!(
            "[Search] target {} unreachable, minimum {:.3} gives {} bytes",
            target,
            config.min,
            floor.len()
        );
    }

    Ok(SearchOutcome {
        data: floor,
        parameter: config.min,
        within_target,
        encode_calls: calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Linear model: 80,000 bytes at 0.01 up to 1,200,000 bytes at 0.85.
    fn linear_size(q: f64) -> usize {
        let t = ((q - 0.01) / 0.84).clamp(0.0, 1.0);
        80_000 + (t * 1_120_000.0) as usize
    }

    /// Encoder over `linear_size` that records every call.
    struct Recording {
        calls: Vec<(f64, usize)>,
    }

    impl Recording {
        fn new() -> Self {
            Self { calls: Vec::new() }
        }
    }

    impl Encoder for Recording {
        fn encode(&mut self, parameter: f64) -> CompressResult<Vec<u8>> {
            let size = linear_size(parameter);
            self.calls.push((parameter, size));
            Ok(vec![0u8; size])
        }
    }

    fn target(bytes: u64) -> TargetSize {
        TargetSize::from_bytes(bytes).unwrap()
    }

    #[test]
    fn fits_on_first_try_when_target_is_large() {
        let mut encoder = Recording::new();
        let outcome =
            search_target_size(&mut encoder, target(2_000_000), &SearchConfig::image()).unwrap();

        assert_eq!(outcome.encode_calls, 1);
        assert!(outcome.within_target);
        assert_eq!(outcome.parameter, 0.85);
        assert_eq!(encoder.calls.len(), 1);
    }

    #[test]
    fn target_equal_to_max_encode_fits_first_try() {
        let max_size = linear_size(0.85) as u64;
        let mut encoder = Recording::new();
        let outcome =
            search_target_size(&mut encoder, target(max_size), &SearchConfig::image()).unwrap();

        assert_eq!(outcome.encode_calls, 1);
        assert_eq!(outcome.len(), max_size);
    }

    #[test]
    fn unreachable_target_returns_minimum_quality() {
        let mut encoder = Recording::new();
        let outcome =
            search_target_size(&mut encoder, target(10_000), &SearchConfig::image()).unwrap();

        assert!(!outcome.within_target);
        assert_eq!(outcome.parameter, 0.01);
        assert_eq!(outcome.len(), 80_000);
        assert!(outcome.encode_calls <= 8);
        assert_eq!(encoder.calls.last().map(|(q, _)| *q), Some(0.01));
    }

    #[test]
    fn never_exceeds_eight_encodes() {
        for bytes in (1..=1_300_000u64).step_by(25_000) {
            let mut encoder = Recording::new();
            let outcome =
                search_target_size(&mut encoder, target(bytes), &SearchConfig::image()).unwrap();
            assert!(
                encoder.calls.len() <= 8,
                "target {} used {} encodes",
                bytes,
                encoder.calls.len()
            );
            assert_eq!(outcome.encode_calls as usize, encoder.calls.len());
        }
    }

    #[test]
    fn converges_below_target_with_largest_found() {
        let mut encoder = Recording::new();
        let outcome =
            search_target_size(&mut encoder, target(500_000), &SearchConfig::image()).unwrap();

        assert!(outcome.within_target);
        assert!(outcome.len() <= 500_000);

        let largest_fitting = encoder
            .calls
            .iter()
            .map(|(_, size)| *size as u64)
            .filter(|size| *size <= 500_000)
            .max()
            .unwrap();
        assert_eq!(outcome.len(), largest_fitting);

        // Within one bisection step of the ideal size
        assert!(outcome.len() > 400_000, "got {}", outcome.len());
    }

    #[test]
    fn reachable_target_found_even_near_minimum() {
        // Only parameters very close to 0.01 fit
        let mut encoder = Recording::new();
        let outcome =
            search_target_size(&mut encoder, target(85_000), &SearchConfig::image()).unwrap();

        assert!(outcome.within_target);
        assert!(outcome.len() <= 85_000);
    }

    #[test]
    fn encode_error_aborts_search() {
        let mut calls = 0u32;
        let mut encoder = |q: f64| -> CompressResult<Vec<u8>> {
            calls += 1;
            if calls == 2 {
                return Err(CompressError::encode_failed(q, "encoder crashed"));
            }
            Ok(vec![0u8; 1_000_000])
        };

        let result = search_target_size(&mut encoder, target(10), &SearchConfig::image());

        assert!(matches!(result, Err(CompressError::EncodeFailed { .. })));
        assert_eq!(calls, 2);
    }

    #[test]
    fn tolerance_stops_early() {
        let config = SearchConfig {
            tolerance: 0.5,
            ..SearchConfig::image()
        };
        let mut encoder = Recording::new();
        let outcome = search_target_size(&mut encoder, target(500_000), &config).unwrap();

        // max probe, one bisection at 0.43 (too large), interval now 0.42 wide
        assert!(encoder.calls.len() < 8);
        assert_eq!(outcome.parameter, 0.01);
        assert!(outcome.within_target);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut encoder = Recording::new();
        let inverted = SearchConfig {
            min: 0.9,
            max: 0.1,
            ..SearchConfig::image()
        };
        assert!(matches!(
            search_target_size(&mut encoder, target(1), &inverted),
            Err(CompressError::InvalidSearch(_))
        ));

        let tiny_budget = SearchConfig {
            max_iterations: 1,
            ..SearchConfig::image()
        };
        assert!(search_target_size(&mut encoder, target(1), &tiny_budget).is_err());
        assert!(encoder.calls.is_empty());
    }
}
