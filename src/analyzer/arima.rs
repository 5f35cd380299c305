//! ARIMA(p, d, q) estimation by the Hannan–Rissanen two-stage regression.
//!
//! The series is differenced `d` times. A long autoregression on the differenced
//! series provides innovation estimates, then `w_t` is regressed on `p` of its own
//! lags and `q` lagged innovations. With `d > 0` no constant is fitted; with
//! `d == 0` the sample mean is removed first.

use crate::analyzer::forecast::{FittedModel, ForecastingEngine};
use crate::model::{ArimaOrder, ModelFitError};
use crate::utils::mean;
use tracing::debug;

const PIVOT_EPSILON: f64 = 1e-10;
const CONSTANT_EPSILON: f64 = 1e-12;

#[derive(Debug, Default, Clone, Copy)]
pub struct ArimaEngine;

impl ArimaEngine {
    pub fn new() -> Self {
        Self
    }

    /// Order of the first-stage autoregression for `m` differenced samples.
    fn long_ar_order(m: usize, order: ArimaOrder) -> usize {
        if order.q == 0 {
            return 0;
        }
        let log_m = (m.max(1) as f64).ln().ceil() as usize;
        (order.p + order.q + 1).max(log_m)
    }

    /// Minimum number of differenced samples both regressions need.
    fn required_samples(long_ar: usize, order: ArimaOrder) -> usize {
        let first_stage = if long_ar > 0 { 2 * long_ar + 1 } else { 0 };
        let second_stage = long_ar + order.p.max(order.q) + order.p + order.q + 1;
        first_stage.max(second_stage)
    }

    pub fn fit_arima(
        &self,
        values: &[f64],
        order: ArimaOrder,
    ) -> Result<FittedArima, ModelFitError> {
        if values.is_empty() {
            return Err(ModelFitError::EmptySeries);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ModelFitError::NonFinite);
        }

        let n = values.len();
        let m = n.saturating_sub(order.d);
        let long_ar = Self::long_ar_order(m, order);
        let required = Self::required_samples(long_ar, order);
        if n <= order.d || m < required {
            return Err(ModelFitError::TooShort {
                order,
                required: required + order.d,
                actual: n,
            });
        }

        let (differenced, tails) = difference(values, order.d);
        let level = if order.d == 0 {
            mean(&differenced).unwrap_or(0.0)
        } else {
            0.0
        };
        let z: Vec<f64> = differenced.iter().map(|v| v - level).collect();

        let scale = z.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        if z.iter().all(|v| (v - z[0]).abs() <= CONSTANT_EPSILON * scale) {
            return Err(ModelFitError::Constant);
        }

        let innovations = if long_ar > 0 {
            let rows: Vec<Vec<f64>> = (long_ar..m).map(|t| lags(&z, t, long_ar)).collect();
            let targets: Vec<f64> = z[long_ar..].to_vec();
            let a = least_squares(&rows, &targets)?;

            let mut e = vec![0.0; m];
            for t in long_ar..m {
                e[t] = z[t] - dot(&a, &lags(&z, t, long_ar));
            }
            e
        } else {
            vec![0.0; m]
        };

        let start = long_ar + order.p.max(order.q);
        let (phi, theta, sigma2) = if order.p + order.q == 0 {
            let sigma2 = z.iter().map(|v| v * v).sum::<f64>() / m as f64;
            (Vec::new(), Vec::new(), sigma2)
        } else {
            let rows: Vec<Vec<f64>> = (start..m)
                .map(|t| {
                    let mut row = lags(&z, t, order.p);
                    row.extend(lags(&innovations, t, order.q));
                    row
                })
                .collect();
            let targets: Vec<f64> = z[start..].to_vec();
            let beta = least_squares(&rows, &targets)?;

            let sse: f64 = rows
                .iter()
                .zip(&targets)
                .map(|(row, y)| (y - dot(&beta, row)).powi(2))
                .sum();
            let theta = beta[order.p..].to_vec();
            let mut phi = beta;
            phi.truncate(order.p);
            (phi, theta, sse / targets.len() as f64)
        };

        if phi.iter().chain(&theta).any(|c| !c.is_finite()) || !sigma2.is_finite() {
            return Err(ModelFitError::Diverged);
        }
        if !is_stationary(&phi) {
            debug!("ARIMA{} rejected: phi={:?} has a root inside the unit circle", order, phi);
            return Err(ModelFitError::NonStationary);
        }
        // 1 + sum(theta_j z^j) is the same test on the negated coefficients
        let negated: Vec<f64> = theta.iter().map(|c| -c).collect();
        if !is_stationary(&negated) {
            debug!("ARIMA{} rejected: theta={:?} is not invertible", order, theta);
            return Err(ModelFitError::NonInvertible);
        }

        debug!(
            "ARIMA{} fitted: phi={:?} theta={:?} sigma2={:.6}",
            order, phi, theta, sigma2
        );

        Ok(FittedArima {
            order,
            phi,
            theta,
            level,
            sigma2,
            z,
            innovations,
            tails,
        })
    }
}

impl ForecastingEngine for ArimaEngine {
    fn fit(
        &self,
        values: &[f64],
        order: ArimaOrder,
    ) -> Result<Box<dyn FittedModel>, ModelFitError> {
        Ok(Box::new(self.fit_arima(values, order)?))
    }
}

#[derive(Debug, Clone)]
pub struct FittedArima {
    order: ArimaOrder,
    phi: Vec<f64>,
    theta: Vec<f64>,
    level: f64,
    sigma2: f64,
    /// Differenced, demeaned history.
    z: Vec<f64>,
    innovations: Vec<f64>,
    /// Last observed value at each differencing level, original series first.
    tails: Vec<f64>,
}

impl FittedArima {
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.phi
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.theta
    }

    /// Mean of the modelled series; zero when differenced.
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }
}

impl FittedModel for FittedArima {
    fn forecast(&self, steps: usize) -> Vec<f64> {
        let m = self.z.len();
        let mut z = self.z.clone();
        let mut e = self.innovations.clone();

        for _ in 0..steps {
            let t = z.len();
            let ar: f64 = self.phi.iter().enumerate().map(|(i, c)| c * z[t - 1 - i]).sum();
            let ma: f64 = self.theta.iter().enumerate().map(|(j, c)| c * e[t - 1 - j]).sum();
            z.push(ar + ma);
            // future innovations have zero expectation
            e.push(0.0);
        }

        let mut out: Vec<f64> = z[m..].iter().map(|v| v + self.level).collect();
        for tail in self.tails.iter().rev() {
            let mut acc = *tail;
            for v in out.iter_mut() {
                acc += *v;
                *v = acc;
            }
        }
        out
    }
}

/// Differences `values` `d` times, returning the result and the last value of every
/// level before it.
fn difference(values: &[f64], d: usize) -> (Vec<f64>, Vec<f64>) {
    let mut current = values.to_vec();
    let mut tails = Vec::with_capacity(d);
    for _ in 0..d {
        if let Some(&last) = current.last() {
            tails.push(last);
        }
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }
    (current, tails)
}

/// Step-down (Schur-Cohn) test: true when every root of `1 - c_1 z - ... - c_k z^k`
/// lies outside the unit circle, i.e. every reflection coefficient is below one in
/// magnitude.
fn is_stationary(coefficients: &[f64]) -> bool {
    let mut a = coefficients.to_vec();
    while let Some(&r) = a.last() {
        if r.is_nan() || r.abs() >= 1.0 {
            return false;
        }
        let k = a.len() - 1;
        let denom = 1.0 - r * r;
        a = (0..k).map(|j| (a[j] + r * a[k - 1 - j]) / denom).collect();
    }
    true
}

/// `[x_{t-1}, ..., x_{t-count}]`
fn lags(x: &[f64], t: usize, count: usize) -> Vec<f64> {
    (1..=count).map(|i| x[t - i]).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Ordinary least squares through the normal equations.
fn least_squares(rows: &[Vec<f64>], targets: &[f64]) -> Result<Vec<f64>, ModelFitError> {
    let k = rows.first().map_or(0, |r| r.len());
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];

    for (row, &y) in rows.iter().zip(targets) {
        for i in 0..k {
            xty[i] += row[i] * y;
            for j in i..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            let mirrored = xtx[j][i];
            xtx[i][j] = mirrored;
        }
    }

    solve(xtx, xty)
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, ModelFitError> {
    let n = b.len();
    let scale = (0..n).fold(1.0_f64, |acc, i| acc.max(a[i][i].abs()));

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .ok_or(ModelFitError::Singular)?;
        if !a[pivot][col].is_finite() || a[pivot][col].abs() <= PIVOT_EPSILON * scale {
            return Err(ModelFitError::Singular);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                let delta = factor * a[col][k];
                a[row][k] -= delta;
            }
            let delta = factor * b[col];
            b[row] -= delta;
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(ModelFitError::Singular);
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_walk(n: usize, start: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut level = start;
        (0..n)
            .map(|_| {
                level += rng.random_range(-1.0..1.0);
                level
            })
            .collect()
    }

    fn ar1(n: usize, phi: f64, mean: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = 0.0;
        (0..n)
            .map(|_| {
                x = phi * x + rng.random_range(-1.0..1.0);
                mean + x
            })
            .collect()
    }

    #[test]
    fn test_recovers_ar1_coefficient() {
        let values = ar1(2000, 0.6, 10.0, 7);
        let fitted = ArimaEngine::new()
            .fit_arima(&values, ArimaOrder::new(1, 0, 0))
            .unwrap();
        assert!((fitted.ar_coefficients()[0] - 0.6).abs() < 0.1);
        assert!((fitted.level() - 10.0).abs() < 0.3);
        assert!(fitted.ma_coefficients().is_empty());
    }

    /// Closes moving up to `pct` percent a day, rounded to cents.
    fn price_walk(n: usize, pct: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut price = 400.0_f64;
        (0..n)
            .map(|_| {
                price *= 1.0 + rng.random_range(-pct..pct) / 100.0;
                (price * 100.0).round() / 100.0
            })
            .collect()
    }

    #[test]
    fn test_default_order_forecasts_stay_near_last_price() {
        let engine = ArimaEngine::new();
        for (len, horizon) in [(22, 15), (25, 15), (30, 15), (250, 60)] {
            let mut accepted = 0;
            for seed in 0..100 {
                let values = price_walk(len, 2.0, seed);
                let last = *values.last().unwrap();
                let Ok(fitted) = engine.fit_arima(&values, ArimaOrder::DEFAULT) else {
                    continue;
                };
                accepted += 1;
                let forecast = fitted.forecast(horizon);
                assert!(
                    forecast.iter().all(|v| (v / last - 1.0).abs() < 0.5),
                    "len {} seed {}: last {} forecast {:?}",
                    len,
                    seed,
                    last,
                    forecast
                );
            }
            if len == 250 {
                assert!(accepted >= 50, "only {} of 100 year-long walks fitted", accepted);
            }
        }
    }

    #[test]
    fn test_explosive_fit_is_rejected() {
        let engine = ArimaEngine::new();
        let rejected = (0..100)
            .map(|seed| engine.fit_arima(&price_walk(22, 2.0, seed), ArimaOrder::DEFAULT))
            .filter(|r| matches!(r, Err(ModelFitError::NonStationary)))
            .count();
        assert!(rejected > 0);
    }

    #[test]
    fn test_stationarity_check() {
        assert!(is_stationary(&[]));
        assert!(is_stationary(&[0.5, 0.3]));
        assert!(is_stationary(&[0.9, -0.2]));
        assert!(is_stationary(&[0.0, 0.0, 0.95]));
        assert!(!is_stationary(&[1.2]));
        assert!(!is_stationary(&[-1.5]));
        assert!(!is_stationary(&[0.5, 0.6]));
        assert!(!is_stationary(&[0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_accepted_fit_exposes_coefficients() {
        let values = ar1(2000, 0.6, 10.0, 4);
        let fitted = ArimaEngine::new()
            .fit_arima(&values, ArimaOrder::new(2, 0, 0))
            .unwrap();
        assert_eq!(fitted.order(), ArimaOrder::new(2, 0, 0));
        assert!(fitted.sigma2() > 0.0);
        assert!(is_stationary(fitted.ar_coefficients()));
    }

    #[test]
    fn test_random_walk_model_repeats_last_value() {
        let values = random_walk(50, 100.0, 3);
        let last = *values.last().unwrap();
        let fitted = ArimaEngine::new()
            .fit_arima(&values, ArimaOrder::new(0, 1, 0))
            .unwrap();
        assert!(fitted.forecast(4).iter().all(|v| (v - last).abs() < 1e-9));
    }

    #[test]
    fn test_second_difference_extrapolates_linearly() {
        let values = random_walk(40, 10.0, 5);
        let n = values.len();
        let last = values[n - 1];
        let slope = values[n - 1] - values[n - 2];
        let forecast = ArimaEngine::new()
            .fit_arima(&values, ArimaOrder::new(0, 2, 0))
            .unwrap()
            .forecast(3);
        for (k, v) in forecast.iter().enumerate() {
            assert!((v - (last + (k as f64 + 1.0) * slope)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_white_noise_forecasts_mean() {
        let values = ar1(300, 0.0, 5.0, 9);
        let fitted = ArimaEngine::new()
            .fit_arima(&values, ArimaOrder::new(0, 0, 0))
            .unwrap();
        let expected = values.iter().sum::<f64>() / values.len() as f64;
        assert!(fitted.forecast(3).iter().all(|v| (v - expected).abs() < 1e-9));
    }

    #[test]
    fn test_degenerate_inputs() {
        let engine = ArimaEngine::new();
        assert_eq!(
            engine.fit_arima(&[], ArimaOrder::DEFAULT).unwrap_err(),
            ModelFitError::EmptySeries
        );
        assert_eq!(
            engine.fit_arima(&[100.0; 300], ArimaOrder::DEFAULT).unwrap_err(),
            ModelFitError::Constant
        );

        let linear: Vec<f64> = (0..300).map(|i| 50.0 + 0.5 * i as f64).collect();
        assert_eq!(
            engine.fit_arima(&linear, ArimaOrder::DEFAULT).unwrap_err(),
            ModelFitError::Constant
        );

        let mut with_nan = random_walk(100, 10.0, 1);
        with_nan[40] = f64::NAN;
        assert_eq!(
            engine.fit_arima(&with_nan, ArimaOrder::DEFAULT).unwrap_err(),
            ModelFitError::NonFinite
        );
    }

    #[test]
    fn test_too_short() {
        let values = random_walk(10, 10.0, 2);
        match ArimaEngine::new().fit_arima(&values, ArimaOrder::DEFAULT) {
            Err(ModelFitError::TooShort { required, actual, .. }) => {
                assert_eq!(actual, 10);
                assert!(required > 10);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_solve_detects_singular_system() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert_eq!(solve(a, vec![1.0, 2.0]).unwrap_err(), ModelFitError::Singular);

        let x = solve(vec![vec![2.0, 1.0], vec![1.0, 3.0]], vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_difference_tails() {
        let (diff, tails) = difference(&[1.0, 4.0, 9.0, 16.0], 2);
        assert_eq!(diff, vec![2.0, 2.0]);
        assert_eq!(tails, vec![16.0, 7.0]);
    }
}
