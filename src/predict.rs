#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("could not convert `{field}` to a number: {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("could not convert `{field}` to an integer: {value:?}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("form: {0}")]
    Form(String),

    #[error("model: {0}")]
    Model(#[from] crate::model::Error),
}

#[derive(serde::Deserialize, Default, Debug, Clone)]
pub struct PredictForm {
    pub name: Option<String>,
    pub diet_preference: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,

    #[serde(rename = "Pregnancies")]
    pub pregnancies: Option<String>,
    #[serde(rename = "Glucose")]
    pub glucose: Option<String>,
    #[serde(rename = "BloodPressure")]
    pub blood_pressure: Option<String>,
    #[serde(rename = "SkinThickness")]
    pub skin_thickness: Option<String>,
    #[serde(rename = "Insulin")]
    pub insulin: Option<String>,
    #[serde(rename = "BMI")]
    pub bmi: Option<String>,
    #[serde(rename = "DiabetesPedigreeFunction")]
    pub diabetes_pedigree: Option<String>,
    #[serde(rename = "Age")]
    pub age: Option<String>,
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, Error> {
    value.as_deref().ok_or(Error::MissingField(field))
}

fn number(field: &'static str, value: &Option<String>) -> Result<f64, Error> {
    let value = required(field, value)?;
    value.trim().parse::<f64>().map_err(|_| Error::NotANumber {
        field,
        value: value.to_owned(),
    })
}

impl PredictForm {
    pub fn features(&self) -> Result<crate::model::Features, Error> {
        Ok(crate::model::Features {
            pregnancies: number("Pregnancies", &self.pregnancies)?,
            glucose: number("Glucose", &self.glucose)?,
            blood_pressure: number("BloodPressure", &self.blood_pressure)?,
            skin_thickness: number("SkinThickness", &self.skin_thickness)?,
            insulin: number("Insulin", &self.insulin)?,
            bmi: number("BMI", &self.bmi)?,
            diabetes_pedigree: number("DiabetesPedigreeFunction", &self.diabetes_pedigree)?,
            age: number("Age", &self.age)?,
        })
    }

    pub fn age_years(&self) -> Result<i64, Error> {
        let value = required("Age", &self.age)?;
        value.trim().parse::<i64>().map_err(|_| Error::NotAnInteger {
            field: "Age",
            value: value.to_owned(),
        })
    }

    /// Everything the diet step needs, with BMI and glucose as submitted.
    pub fn user_context(&self, age: i64) -> Result<crate::diet::UserContext, Error> {
        Ok(crate::diet::UserContext {
            name: required("name", &self.name)?.to_owned(),
            age: age.to_string(),
            diet_preference: required("diet_preference", &self.diet_preference)?.to_owned(),
            state: required("state", &self.state)?.to_owned(),
            country: required("country", &self.country)?.to_owned(),
            bmi: required("BMI", &self.bmi)?.trim().to_owned(),
            glucose: required("Glucose", &self.glucose)?.trim().to_owned(),
        })
    }
}

pub fn message(prediction: &crate::model::Prediction) -> String {
    let verdict = if prediction.at_risk {
        "You are at risk of Diabetes."
    } else {
        "You are not at risk of Diabetes."
    };
    format!("{} (Confidence: {:.2}%)", verdict, prediction.confidence() * 100.0)
}

pub async fn predict(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    form: Result<axum::Form<PredictForm>, axum::extract::rejection::FormRejection>,
) -> Result<axum::response::Html<String>, crate::app::Error> {
    let axum::Form(form) = form.map_err(|e| Error::Form(e.body_text()))?;

    // Context fields are checked up front so a missing one fails the request in either branch.
    let age = form.age_years()?;
    let features = form.features()?;
    let user = form.user_context(age)?;

    let prediction = state.model.assess(&features).map_err(Error::from)?;
    log::info!(
        "prediction: at_risk={} probability={:.4}",
        prediction.at_risk,
        prediction.probability
    );

    let result = message(&prediction);
    let html = state
        .renderer
        .result(&result, if prediction.at_risk { Some(&user) } else { None })?;
    Ok(axum::response::Html(html))
}
