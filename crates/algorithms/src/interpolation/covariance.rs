//! Covariance models from a compact textual notation
//!
//! A model is a sum of components written as `<sill> <Name>(<range>)`,
//! joined by `+`, e.g. `"1.0 Nug(0.0) + 10 Sph(1000)"`. Supported names:
//!
//! | Name | Function | Extra parameters |
//! |------|----------|------------------|
//! | `Nug` | nugget: `sill` for h ≤ range, else 0 | |
//! | `Lin` | linear: `sill·(1 − h/range)` for h < range, else 0 | |
//! | `Sph` | spherical | |
//! | `Exp` | exponential: `sill·exp(−h/range)` | |
//! | `Gau` | gaussian: `sill·exp(−h²/range²)` | |
//! | `Mat` | matérn | `^shape` (default 0.5) |
//! | `Pow` | power law: `sill − h^range` | |
//! | `Cau` | cauchy | `^alpha^beta` (default 1, 1) |
//!
//! Components are independent of the spatial interpolation core; they are
//! plain closed-form functions of the separation distance `h`.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array, ArrayBase, Data, Dimension};
use scatterfill_core::{Error, Result};

/// Matérn shapes above this use the gaussian limit
const MATERN_GAUSSIAN_SHAPE: f64 = 100.0;

/// Closed-form covariance function families
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CovarianceFunction {
    Nugget,
    Linear,
    Spherical,
    Exponential,
    Gaussian,
    /// Shape 0.5 is the exponential model, infinity the gaussian one
    Matern { shape: f64 },
    Power,
    /// `alpha` in (0, 2] shapes the origin, `beta > 0` the long-range memory
    Cauchy { alpha: f64, beta: f64 },
}

impl CovarianceFunction {
    fn tag(&self) -> &'static str {
        match self {
            CovarianceFunction::Nugget => "Nug",
            CovarianceFunction::Linear => "Lin",
            CovarianceFunction::Spherical => "Sph",
            CovarianceFunction::Exponential => "Exp",
            CovarianceFunction::Gaussian => "Gau",
            CovarianceFunction::Matern { .. } => "Mat",
            CovarianceFunction::Power => "Pow",
            CovarianceFunction::Cauchy { .. } => "Cau",
        }
    }
}

/// One term of a covariance model
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CovarianceComponent {
    pub function: CovarianceFunction,
    pub sill: f64,
    pub range: f64,
}

impl CovarianceComponent {
    /// Covariance at separation distance `h`
    pub fn evaluate(&self, h: f64) -> f64 {
        let Self { sill, range, .. } = *self;
        match self.function {
            CovarianceFunction::Nugget => {
                if h <= range {
                    sill
                } else {
                    0.0
                }
            }
            CovarianceFunction::Linear => {
                if h < range {
                    sill * (1.0 - h / range)
                } else {
                    0.0
                }
            }
            CovarianceFunction::Spherical => {
                if h < range {
                    sill * (1.0 - 1.5 * h / range + h.powi(3) / (2.0 * range.powi(3)))
                } else {
                    0.0
                }
            }
            CovarianceFunction::Exponential => sill * (-h / range).exp(),
            CovarianceFunction::Gaussian => gaussian(h, sill, range),
            CovarianceFunction::Matern { shape } => matern(h, sill, range, shape),
            CovarianceFunction::Power => sill - h.powf(range),
            CovarianceFunction::Cauchy { alpha, beta } => {
                sill * (1.0 + (h / range).powf(alpha)).powf(-beta / alpha)
            }
        }
    }
}

impl fmt::Display for CovarianceComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}({})", self.sill, self.function.tag(), self.range)?;
        match self.function {
            CovarianceFunction::Matern { shape } => write!(f, "^{shape}"),
            CovarianceFunction::Cauchy { alpha, beta } => write!(f, "^{alpha}^{beta}"),
            _ => Ok(()),
        }
    }
}

/// Sum of covariance components
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CovarianceModel {
    components: Vec<CovarianceComponent>,
}

impl CovarianceModel {
    pub fn new(components: Vec<CovarianceComponent>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[CovarianceComponent] {
        &self.components
    }

    /// Covariance at separation distance `h`
    pub fn evaluate(&self, h: f64) -> f64 {
        self.components.iter().map(|c| c.evaluate(h)).sum()
    }

    /// Covariance for every distance in `h`
    pub fn evaluate_array<S, D>(&self, h: &ArrayBase<S, D>) -> Array<f64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        h.mapv(|v| self.evaluate(v))
    }
}

impl fmt::Display for CovarianceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl FromStr for CovarianceModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_covariogram(s)
    }
}

/// Parse a covariance model such as `"1.0 Nug(0.0) + 10 Sph(1000)"`.
///
/// # Errors
/// `Parse` for an empty model, an unknown function name or malformed
/// numbers.
pub fn parse_covariogram(model: &str) -> Result<CovarianceModel> {
    if model.trim().is_empty() {
        return Err(Error::Parse("empty covariance model".into()));
    }

    let components = model
        .split('+')
        .map(parse_component)
        .collect::<Result<Vec<_>>>()?;

    Ok(CovarianceModel::new(components))
}

fn parse_component(term: &str) -> Result<CovarianceComponent> {
    let term = term.trim();
    let malformed = || Error::Parse(format!("malformed covariance term '{term}'"));

    let (sill, rest) = term.split_once(char::is_whitespace).ok_or_else(malformed)?;
    let rest = rest.trim_start();
    let (name, rest) = rest.split_once('(').ok_or_else(malformed)?;
    let (range, extras) = rest.split_once(')').ok_or_else(malformed)?;

    let sill = parse_number(sill, term)?;
    let range = parse_number(range, term)?;
    let extras = match extras.trim() {
        "" => Vec::new(),
        e => e
            .strip_prefix('^')
            .ok_or_else(malformed)?
            .split('^')
            .map(|p| parse_number(p, term))
            .collect::<Result<Vec<_>>>()?,
    };

    let function = match (name.trim(), extras.as_slice()) {
        ("Nug", []) => CovarianceFunction::Nugget,
        ("Lin", []) => CovarianceFunction::Linear,
        ("Sph", []) => CovarianceFunction::Spherical,
        ("Exp", []) => CovarianceFunction::Exponential,
        ("Gau", []) => CovarianceFunction::Gaussian,
        ("Mat", []) => CovarianceFunction::Matern { shape: 0.5 },
        ("Mat", [shape]) => CovarianceFunction::Matern { shape: *shape },
        ("Pow", []) => CovarianceFunction::Power,
        ("Cau", []) => CovarianceFunction::Cauchy {
            alpha: 1.0,
            beta: 1.0,
        },
        ("Cau", [alpha, beta]) => CovarianceFunction::Cauchy {
            alpha: *alpha,
            beta: *beta,
        },
        ("Nug" | "Lin" | "Sph" | "Exp" | "Gau" | "Mat" | "Pow" | "Cau", _) => {
            return Err(Error::Parse(format!(
                "wrong number of '^' parameters in covariance term '{term}'"
            )))
        }
        (other, _) => {
            return Err(Error::Parse(format!(
                "unknown covariance function '{other}' in '{term}'"
            )))
        }
    };

    Ok(CovarianceComponent {
        function,
        sill,
        range,
    })
}

fn parse_number(text: &str, term: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::Parse(format!("invalid number '{}' in '{term}'", text.trim())))
}

fn gaussian(h: f64, sill: f64, range: f64) -> f64 {
    sill * (-(h * h) / (range * range)).exp()
}

fn matern(h: f64, sill: f64, range: f64, shape: f64) -> f64 {
    if shape > MATERN_GAUSSIAN_SHAPE {
        return gaussian(h, sill, range);
    }
    if h == 0.0 {
        return sill;
    }
    let x = h / range * 2.0 * shape.sqrt();
    let (_, bessel_k) = puruspe::Inu_Knu(shape, x);
    let norm = puruspe::gamma(shape) * 2f64.powf(shape - 1.0);
    sill / norm * x.powf(shape) * bessel_k
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn test_parse_two_components() {
        let model = parse_covariogram("1.0 Nug(0.0) + 10 Sph(1000)").unwrap();
        assert_eq!(model.components().len(), 2);
        assert_eq!(model.components()[0].function, CovarianceFunction::Nugget);
        assert_eq!(model.components()[1].sill, 10.0);
        assert_eq!(model.components()[1].range, 1000.0);

        assert_relative_eq!(model.evaluate(0.0), 11.0);
        assert_relative_eq!(model.evaluate(1000.0), 0.0);
        // spherical at half range: 1 - 0.75 + 0.0625
        assert_relative_eq!(model.evaluate(500.0), 10.0 * 0.3125, epsilon = 1e-12);
    }

    #[test]
    fn test_parse_extra_parameters() {
        let model = parse_covariogram("2 Mat(3)^1.5 + 1 Cau(2)^1^2").unwrap();
        assert_eq!(
            model.components()[0].function,
            CovarianceFunction::Matern { shape: 1.5 }
        );
        assert_eq!(
            model.components()[1].function,
            CovarianceFunction::Cauchy {
                alpha: 1.0,
                beta: 2.0
            }
        );
    }

    #[test]
    fn test_display_round_trip() {
        let text = "1 Nug(0) + 10 Exp(250) + 0.5 Mat(4)^2.5";
        let model: CovarianceModel = text.parse().unwrap();
        assert_eq!(model.to_string(), text);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_covariogram(""), Err(Error::Parse(_))));
        assert!(matches!(parse_covariogram("1 Foo(2)"), Err(Error::Parse(_))));
        assert!(matches!(parse_covariogram("x Exp(2)"), Err(Error::Parse(_))));
        assert!(matches!(parse_covariogram("1 Exp(2"), Err(Error::Parse(_))));
        assert!(matches!(parse_covariogram("1 Exp(2)^3"), Err(Error::Parse(_))));
        assert!(matches!(parse_covariogram("1 Exp(2) +"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_closed_forms() {
        let c = |function, sill, range| CovarianceComponent {
            function,
            sill,
            range,
        };
        assert_relative_eq!(
            c(CovarianceFunction::Exponential, 2.0, 10.0).evaluate(5.0),
            2.0 * (-0.5f64).exp()
        );
        assert_relative_eq!(
            c(CovarianceFunction::Gaussian, 1.0, 2.0).evaluate(2.0),
            (-1.0f64).exp()
        );
        assert_relative_eq!(c(CovarianceFunction::Linear, 4.0, 8.0).evaluate(2.0), 3.0);
        assert_eq!(c(CovarianceFunction::Linear, 4.0, 8.0).evaluate(9.0), 0.0);
        assert_relative_eq!(c(CovarianceFunction::Power, 10.0, 2.0).evaluate(3.0), 1.0);
        assert_eq!(c(CovarianceFunction::Nugget, 1.0, 0.0).evaluate(0.0), 1.0);
        assert_eq!(c(CovarianceFunction::Nugget, 1.0, 0.0).evaluate(0.1), 0.0);
        let cauchy = CovarianceFunction::Cauchy {
            alpha: 1.0,
            beta: 1.0,
        };
        assert_relative_eq!(c(cauchy, 1.0, 1.0).evaluate(1.0), 0.5);
    }

    #[test]
    fn test_matern_half_is_exponential() {
        let matern = CovarianceComponent {
            function: CovarianceFunction::Matern { shape: 0.5 },
            sill: 3.0,
            range: 2.0,
        };
        for h in [0.0, 0.1, 1.0, 2.5, 7.0] {
            let expected = 3.0 * (-h * 2f64.sqrt() / 2.0).exp();
            assert_relative_eq!(matern.evaluate(h), expected, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_matern_large_shape_is_gaussian() {
        let matern = CovarianceComponent {
            function: CovarianceFunction::Matern { shape: 150.0 },
            sill: 1.0,
            range: 4.0,
        };
        assert_relative_eq!(matern.evaluate(2.0), (-0.25f64).exp());
    }

    #[test]
    fn test_matern_three_halves() {
        // closed form for shape 1.5: (1 + x) exp(-x)
        let matern = CovarianceComponent {
            function: CovarianceFunction::Matern { shape: 1.5 },
            sill: 2.0,
            range: 10.0,
        };
        for h in [0.5, 3.0, 12.0, 40.0] {
            let x = h / 10.0 * 2.0 * 1.5f64.sqrt();
            assert_relative_eq!(matern.evaluate(h), 2.0 * (1.0 + x) * (-x).exp(), epsilon = 1e-8);
        }
    }

    #[test]
    fn test_evaluate_array() {
        let model = parse_covariogram("1 Exp(1)").unwrap();
        let out = model.evaluate_array(&arr1(&[0.0, 1.0]));
        assert_relative_eq!(out[0], 1.0);
        assert_relative_eq!(out[1], (-1.0f64).exp());
    }
}
