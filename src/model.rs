pub const NUM_FEATURES: usize = 8;

/// Column order the scaler and classifier were fitted with.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{}: {}", .0.display(), .1)]
    Io(std::path::PathBuf, std::io::Error),

    #[error("{}: {}", .0.display(), .1)]
    SerdeJson(std::path::PathBuf, serde_json::Error),

    #[error("{field} has {got} entries, expected {}", NUM_FEATURES)]
    Shape { field: &'static str, got: usize },

    #[error("{0} contains a non-finite value")]
    NonFinite(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    pub pregnancies: f64,
    pub glucose: f64,
    pub blood_pressure: f64,
    pub skin_thickness: f64,
    pub insulin: f64,
    pub bmi: f64,
    pub diabetes_pedigree: f64,
    pub age: f64,
}

impl Features {
    pub fn to_row(&self) -> [f64; NUM_FEATURES] {
        [
            self.pregnancies,
            self.glucose,
            self.blood_pressure,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.diabetes_pedigree,
            self.age,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub at_risk: bool,

    /// Probability of the at-risk class.
    pub probability: f64,
}

impl Prediction {
    /// Probability of whichever class was predicted.
    pub fn confidence(&self) -> f64 {
        if self.at_risk {
            self.probability
        } else {
            1.0 - self.probability
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<T, Error> {
    let buf = std::fs::read(path).map_err(|e| Error::Io(path.to_owned(), e))?;
    serde_json::from_slice(&buf).map_err(|e| Error::SerdeJson(path.to_owned(), e))
}

fn to_fixed(field: &'static str, v: Vec<f64>) -> Result<[f64; NUM_FEATURES], Error> {
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::NonFinite(field));
    }
    let got = v.len();
    v.try_into().map_err(|_| Error::Shape { field, got })
}

#[derive(serde::Deserialize)]
struct ScalerFile {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// Standardization fitted at training time.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    mean: [f64; NUM_FEATURES],
    scale: [f64; NUM_FEATURES],
}

impl Scaler {
    pub fn new(mean: [f64; NUM_FEATURES], scale: [f64; NUM_FEATURES]) -> Self {
        // Zero-variance columns are stored with a zero scale; they pass through unscaled.
        let scale = scale.map(|s| if s == 0.0 { 1.0 } else { s });
        Self { mean, scale }
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let file: ScalerFile = read_json(path.as_ref())?;
        Ok(Self::new(to_fixed("mean", file.mean)?, to_fixed("scale", file.scale)?))
    }

    pub fn transform(&self, features: &Features) -> Result<[f64; NUM_FEATURES], Error> {
        let mut out = [0.0; NUM_FEATURES];
        for (i, x) in features.to_row().iter().enumerate() {
            if !x.is_finite() {
                return Err(Error::NonFinite(FEATURE_NAMES[i]));
            }
            out[i] = (x - self.mean[i]) / self.scale[i];
        }
        Ok(out)
    }
}

pub trait Classifier {
    fn predict(&self, row: &[f64; NUM_FEATURES]) -> Result<u8, Error>;
    fn predict_proba(&self, row: &[f64; NUM_FEATURES]) -> Result<f64, Error>;
}

#[derive(serde::Deserialize)]
struct LogisticRegressionFile {
    coefficients: Vec<f64>,
    intercept: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    coefficients: [f64; NUM_FEATURES],
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(coefficients: [f64; NUM_FEATURES], intercept: f64) -> Self {
        Self { coefficients, intercept }
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let file: LogisticRegressionFile = read_json(path.as_ref())?;
        if !file.intercept.is_finite() {
            return Err(Error::NonFinite("intercept"));
        }
        Ok(Self::new(to_fixed("coefficients", file.coefficients)?, file.intercept))
    }

    fn decision_function(&self, row: &[f64; NUM_FEATURES]) -> f64 {
        self.intercept + self.coefficients.iter().zip(row.iter()).map(|(c, x)| c * x).sum::<f64>()
    }
}

impl Classifier for LogisticRegression {
    fn predict(&self, row: &[f64; NUM_FEATURES]) -> Result<u8, Error> {
        Ok(if self.decision_function(row) > 0.0 { 1 } else { 0 })
    }

    fn predict_proba(&self, row: &[f64; NUM_FEATURES]) -> Result<f64, Error> {
        Ok(1.0 / (1.0 + (-self.decision_function(row)).exp()))
    }
}

pub struct Model {
    scaler: Scaler,
    classifier: Box<dyn Classifier + Send + Sync>,
}

impl Model {
    pub fn new(scaler: Scaler, classifier: Box<dyn Classifier + Send + Sync>) -> Self {
        Self { scaler, classifier }
    }

    pub fn load(model_path: impl AsRef<std::path::Path>, scaler_path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        Ok(Self::new(
            Scaler::load(scaler_path)?,
            Box::new(LogisticRegression::load(model_path)?),
        ))
    }

    pub fn assess(&self, features: &Features) -> Result<Prediction, Error> {
        let row = self.scaler.transform(features)?;
        let class = self.classifier.predict(&row)?;
        let probability = self.classifier.predict_proba(&row)?;
        Ok(Prediction {
            at_risk: class == 1,
            probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn features() -> Features {
        Features {
            pregnancies: 2.0,
            glucose: 145.0,
            blood_pressure: 72.0,
            skin_thickness: 30.0,
            insulin: 100.0,
            bmi: 27.4,
            diabetes_pedigree: 0.5,
            age: 34.0,
        }
    }

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_row_order() {
        assert_eq!(features().to_row(), [2.0, 145.0, 72.0, 30.0, 100.0, 27.4, 0.5, 34.0]);
    }

    #[test]
    fn test_scaler_transform() {
        let scaler = Scaler::new([1.0, 100.0, 0.0, 0.0, 0.0, 20.0, 0.0, 30.0], [1.0, 15.0, 1.0, 1.0, 1.0, 2.0, 0.0, 2.0]);
        let row = scaler.transform(&features()).unwrap();
        assert_eq!(row[0], 1.0);
        assert_eq!(row[1], 3.0);
        assert!((row[5] - 3.7).abs() < 1e-9);
        // zero scale passes the centred value through
        assert_eq!(row[6], 0.5);
        assert_eq!(row[7], 2.0);
    }

    #[test]
    fn test_scaler_rejects_non_finite() {
        let scaler = Scaler::new([0.0; NUM_FEATURES], [1.0; NUM_FEATURES]);
        let mut f = features();
        f.insulin = f64::NAN;
        assert!(matches!(scaler.transform(&f), Err(Error::NonFinite("Insulin"))));
    }

    #[test]
    fn test_logistic_regression() {
        let clf = LogisticRegression::new([0.0; NUM_FEATURES], 0.0);
        assert_eq!(clf.predict_proba(&[0.0; NUM_FEATURES]).unwrap(), 0.5);
        assert_eq!(clf.predict(&[0.0; NUM_FEATURES]).unwrap(), 0);

        let clf = LogisticRegression::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 0.0);
        let row = [2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(clf.predict(&row).unwrap(), 1);
        assert!((clf.predict_proba(&row).unwrap() - 0.880797077977882).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_is_complementary() {
        let p = Prediction { at_risk: true, probability: 0.8 };
        assert_eq!(p.confidence(), 0.8);
        let p = Prediction { at_risk: false, probability: 0.25 };
        assert_eq!(p.confidence(), 0.75);
    }

    #[test]
    fn test_load_and_assess() {
        let model = write_temp(r#"{"coefficients": [0, 1, 0, 0, 0, 1, 0, 0], "intercept": -0.5}"#);
        let scaler = write_temp(r#"{"mean": [0, 120, 0, 0, 0, 25, 0, 0], "scale": [1, 25, 1, 1, 1, 6, 1, 1]}"#);
        let model = Model::load(model.path(), scaler.path()).unwrap();

        let prediction = model.assess(&features()).unwrap();
        assert!(prediction.at_risk);
        assert!(prediction.probability > 0.5 && prediction.probability < 1.0);

        let mut healthy = features();
        healthy.glucose = 85.0;
        healthy.bmi = 21.0;
        assert!(!model.assess(&healthy).unwrap().at_risk);
    }

    #[test]
    fn test_load_wrong_shape() {
        let scaler = write_temp(r#"{"mean": [0, 0, 0], "scale": [1, 1, 1, 1, 1, 1, 1, 1]}"#);
        match Scaler::load(scaler.path()) {
            Err(Error::Shape { field, got }) => {
                assert_eq!(field, "mean");
                assert_eq!(got, 3);
            }
            r => panic!("unexpected: {:?}", r),
        }
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(LogisticRegression::load("/nonexistent/model.json"), Err(Error::Io(..))));
    }

    #[test]
    fn test_load_bad_json() {
        let model = write_temp("not json");
        assert!(matches!(LogisticRegression::load(model.path()), Err(Error::SerdeJson(..))));
    }
}
