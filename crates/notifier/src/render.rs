//! Campaign view renderer.
//!
//! Views are registered by name (`{campaign_group_id}-{campaign_id}`) and
//! rendered to HTML from a `RenderContext`. All interpolated values are
//! HTML-escaped.

use std::collections::HashMap;
use std::fmt::Write;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use campaign_common::error::{AppError, AppResult};
use campaign_engine::content::RenderContext;
use campaign_engine::providers::ContentRenderer;

/// The layouts a campaign view can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Voting is open: nominees plus the recipient's contributions
    VotingOpen,
}

#[derive(Debug, Default, Clone)]
pub struct CampaignViewRenderer {
    views: HashMap<String, ViewKind>,
}

impl CampaignViewRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(mut self, name: impl Into<String>, kind: ViewKind) -> Self {
        self.views.insert(name.into(), kind);
        self
    }

    pub fn render_view(&self, view_name: &str, context: &RenderContext) -> AppResult<String> {
        let kind = self
            .views
            .get(view_name)
            .ok_or_else(|| AppError::Render(format!("unknown view '{}'", view_name)))?;

        let body = match kind {
            ViewKind::VotingOpen => voting_open(context)?,
        };
        Ok(wrap_html(&body, context))
    }
}

#[async_trait]
impl ContentRenderer for CampaignViewRenderer {
    async fn render(&self, view_name: &str, context: &RenderContext) -> AppResult<String> {
        self.render_view(view_name, context)
    }
}

fn voting_open(ctx: &RenderContext) -> AppResult<String> {
    if ctx.nominees.is_empty() {
        return Err(AppError::Render(format!(
            "election {} has no approved nominees",
            ctx.election.election_id
        )));
    }

    let mut html = String::new();
    let fmt_err = |_| AppError::Render("formatting failed".to_string());

    write!(
        html,
        "<h1>{}</h1><h2>{}</h2>",
        escape(&ctx.headline),
        escape(&ctx.election.title)
    )
    .map_err(fmt_err)?;
    if !ctx.election.description.is_empty() {
        write!(html, "<p>{}</p>", escape(&ctx.election.description)).map_err(fmt_err)?;
    }
    write!(
        html,
        "<p>Hi {}, thanks to your open source contributions as <strong>{}</strong> you can \
         vote for a project between {} and {}.</p>",
        escape(&ctx.employee.corporate_display_name),
        escape(&ctx.employee.third_party_username),
        day(ctx.election.voting_start),
        day(ctx.election.voting_end)
    )
    .map_err(fmt_err)?;

    html.push_str("<h3>Nominees</h3><ul>");
    for nominee in &ctx.nominees {
        let written = match &nominee.web {
            Some(web) => write!(
                html,
                "<li><a href=\"{}\">{}</a>: {}</li>",
                escape(web),
                escape(&nominee.title),
                escape(&nominee.description)
            ),
            None => write!(
                html,
                "<li><strong>{}</strong>: {}</li>",
                escape(&nominee.title),
                escape(&nominee.description)
            ),
        };
        written.map_err(fmt_err)?;
    }
    html.push_str("</ul>");

    html.push_str("<h3>Your contributions</h3><ul>");
    for (action, events) in ctx.contributions.iter() {
        let mut repos: Vec<&str> = events
            .iter()
            .filter_map(|e| e.repository_name.as_deref())
            .collect();
        repos.sort_unstable();
        repos.dedup();
        write!(
            html,
            "<li>{} &times; {}",
            events.len(),
            escape(&humanize_action(action))
        )
        .map_err(fmt_err)?;
        if !repos.is_empty() {
            let repos: Vec<String> = repos.into_iter().map(escape).collect();
            write!(html, " ({})", repos.join(", ")).map_err(fmt_err)?;
        }
        html.push_str("</li>");
    }
    html.push_str("</ul>");

    if !ctx.other_contributions_data.is_empty() {
        write!(
            html,
            "<p>We also saw {} other activities on GitHub.</p>",
            ctx.other_contributions_data.len()
        )
        .map_err(fmt_err)?;
    }

    Ok(html)
}

fn wrap_html(content: &str, ctx: &RenderContext) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{subject}</title>
</head>
<body class="{notification}">
    {content}
    <hr>
    <p style="font-size: 12px; color: #6c757d;">
        {reason}<br>
        <a href="{link}">{unsubscribe}</a><br>
        {app}
    </p>
</body>
</html>"#,
        subject = escape(&ctx.subject),
        notification = ctx.notification,
        content = content,
        reason = escape(&ctx.reason),
        link = escape(&ctx.unsubscribe_link),
        unsubscribe = escape(&ctx.unsubscribe_text),
        app = escape(&ctx.app),
    )
}

/// `PullRequestEvent` -> `pull request`
fn humanize_action(action: &str) -> String {
    let trimmed = action.strip_suffix("Event").unwrap_or(action);
    let mut out = String::with_capacity(trimmed.len() + 4);
    for (i, c) in trimmed.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push(' ');
        }
        out.extend(c.to_lowercase());
    }
    out
}

fn day(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
