use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::application::error::{ErrorReport, HttpError};
use crate::domain::article::ArticleMetadata;

/// Raised when an askama template fails to render.
#[derive(Debug, Error)]
#[error("template `{template}` failed to render")]
pub struct TemplateRenderError {
    template: &'static str,
    #[source]
    source: AskamaError,
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        HttpError::from_error(
            "presentation::views",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Template rendering failed",
            &err,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|source| {
        TemplateRenderError {
            template: std::any::type_name::<T>(),
            source,
        }
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// The uniform not-found page. Every page-surface failure funnels here so a
/// viewer cannot distinguish an unknown slug from an unreadable article.
pub fn render_not_found_response() -> Response {
    let mut response = render_template_response(NotFoundTemplate {}, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Article not found",
    )
    .attach(&mut response);
    response
}

/// SEO head fields for one page.
#[derive(Debug, Clone)]
pub struct PageMeta {
    pub title: String,
    pub description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub author: Option<String>,
    pub published_time: Option<String>,
}

impl PageMeta {
    pub fn from_metadata(metadata: &ArticleMetadata) -> Self {
        Self {
            title: metadata.title.clone(),
            description: Some(metadata.description.clone()),
            og_title: Some(metadata.social_title().to_string()),
            og_description: Some(metadata.social_description().to_string()),
            og_image: metadata.og_image.clone(),
            author: metadata.author.clone(),
            published_time: metadata.published_at.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArticleView {
    pub meta: PageMeta,
    pub heading: String,
    pub byline: Option<String>,
    pub html: String,
}

impl ArticleView {
    pub fn new(html: String, metadata: &ArticleMetadata) -> Self {
        Self {
            meta: PageMeta::from_metadata(metadata),
            heading: metadata.title.clone(),
            byline: compose_byline(metadata),
            html,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlogCardView {
    pub title: String,
    pub description: String,
    pub href: String,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {}

#[derive(Template)]
#[template(path = "blogs.html")]
pub struct BlogsTemplate {
    pub cards: Vec<BlogCardView>,
}

#[derive(Template)]
#[template(path = "article.html")]
pub struct ArticleTemplate {
    pub view: ArticleView,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct NotFoundTemplate {}

fn compose_byline(metadata: &ArticleMetadata) -> Option<String> {
    let author = metadata.author.as_deref()?;
    match metadata.published_at.as_deref().and_then(format_published) {
        Some(date) => Some(format!("By {author} • {date}")),
        None => Some(format!("By {author}")),
    }
}

/// Render an ISO-8601 timestamp as a long-form date. Unparseable values are
/// dropped rather than shown raw.
fn format_published(raw: &str) -> Option<String> {
    let parsed = OffsetDateTime::parse(raw, &Rfc3339).ok()?;
    parsed
        .format(format_description!("[month repr:long] [day padding:none], [year]"))
        .ok()
}
