pub struct Renderer {
    handlebars: handlebars::Handlebars<'static>,
}

#[derive(serde::Serialize)]
struct ResultArgs<'a> {
    result: &'a str,
    risk: bool,
    user: Option<&'a crate::diet::UserContext>,
}

#[derive(serde::Serialize)]
struct DietArgs<'a> {
    name: &'a str,
    plan: &'a str,
}

impl Renderer {
    pub fn new() -> Result<Self, handlebars::TemplateError> {
        let mut handlebars = handlebars::Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_template_string("index", include_str!("../templates/index.hbs"))?;
        handlebars.register_template_string("result", include_str!("../templates/result.hbs"))?;
        handlebars.register_template_string("diet", include_str!("../templates/diet.hbs"))?;
        Ok(Self { handlebars })
    }

    pub fn index(&self) -> Result<String, handlebars::RenderError> {
        self.handlebars.render("index", &serde_json::json!({}))
    }

    /// The "generate diet plan" form is only rendered when a user context is given.
    pub fn result(&self, result: &str, user: Option<&crate::diet::UserContext>) -> Result<String, handlebars::RenderError> {
        self.handlebars.render(
            "result",
            &ResultArgs {
                result,
                risk: user.is_some(),
                user,
            },
        )
    }

    /// `plan_html` is inserted as-is and must already be safe HTML.
    pub fn diet(&self, name: &str, plan_html: &str) -> Result<String, handlebars::RenderError> {
        self.handlebars.render("diet", &DietArgs { name, plan: plan_html })
    }
}

/// Converts a Markdown reply to HTML. Raw HTML in the input is escaped rather than passed through.
pub fn markdown_to_html(markdown: &str) -> String {
    let options = pulldown_cmark::Options::ENABLE_TABLES | pulldown_cmark::Options::ENABLE_STRIKETHROUGH;
    let parser = pulldown_cmark::Parser::new_ext(markdown, options).map(|event| match event {
        pulldown_cmark::Event::Html(html) => pulldown_cmark::Event::Text(html),
        event => event,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut out, parser);
    out
}
