// HTML digest rendering with tera. One embedded template; context built in `view`.

pub mod view;

use chrono::Local;
use tera::{Context, Tera};

use crate::models::Report;
pub use view::{ReportView, RunInfo, ViewSettings};

const BASE_TEMPLATE: &str = include_str!("../../templates/base.html");

pub struct HtmlRenderer {
    tera: Tera,
}

impl HtmlRenderer {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("base.html", BASE_TEMPLATE)?;
        Ok(Self { tera })
    }

    pub fn render(&self, view: &ReportView) -> anyhow::Result<String> {
        let mut context = Context::new();
        context.insert("report", view);
        Ok(self.tera.render("base.html", &context)?)
    }
}

/// Render `report` with run info for the current user, host and time.
pub fn format_html(report: &Report, settings: &ViewSettings) -> anyhow::Result<String> {
    let view = ReportView::build(report, settings, RunInfo::current(Local::now()));
    HtmlRenderer::new()?.render(&view)
}
