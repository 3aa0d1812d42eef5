/// User details carried from the result page. Values are display strings and never re-parsed.
#[derive(serde::Serialize, serde::Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UserContext {
    pub name: String,
    pub age: String,
    pub diet_preference: String,
    pub state: String,
    pub country: String,
    pub bmi: String,
    pub glucose: String,
}

pub fn build_prompt(user: &UserContext) -> String {
    format!(
        "A {age}-year-old {diet} woman named {name} from {state}, {country}, has a BMI of {bmi} and a glucose level of {glucose}. \
         Write a 5-point personalized diabetes-prevention diet plan for her, explaining why each point is important, \
         neither too long nor too short. Whenever you name a food, also give its name in the local language in parentheses (). \
         Do not add unnecessary information, and respond as if you are talking to {name} directly, in a friendly tone and simple language.",
        age = user.age,
        diet = user.diet_preference,
        name = user.name,
        state = user.state,
        country = user.country,
        bmi = user.bmi,
        glucose = user.glucose,
    )
}

async fn generate_plan(state: &crate::app::AppState, user: &UserContext) -> Result<String, anyhow::Error> {
    let prompt = build_prompt(user);
    let timeout = state.backend.request_timeout();

    let markdown = tokio::time::timeout(timeout, state.backend.generate(&prompt))
        .await
        .map_err(|_| anyhow::format_err!("timed out after {:?}", timeout))??;

    let plan = crate::render::markdown_to_html(&markdown);
    Ok(state.renderer.diet(&user.name, &plan)?)
}

pub async fn diet(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    form: Result<axum::Form<UserContext>, axum::extract::rejection::FormRejection>,
) -> Result<axum::response::Html<String>, crate::app::Error> {
    let axum::Form(user) = form.map_err(|e| crate::app::Error::Generation(anyhow::anyhow!(e.body_text())))?;

    let html = generate_plan(&state, &user)
        .await
        .map_err(crate::app::Error::Generation)?;
    log::info!("diet plan generated ({} bytes)", html.len());
    Ok(axum::response::Html(html))
}
