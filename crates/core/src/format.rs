//! Subject and body rendering.
//!
//! Templates use ERB-style markers evaluated by `MiniJinja`:
//!
//! - `<%= expr %>` interpolates an expression,
//! - `<% if ... %>` / `<% for ... %>` control blocks,
//! - `<%# ... %>` comments.
//!
//! Only the values in [`TemplateContext`] are reachable from a template:
//! `node.{name, fqdn, run_list, chef_environment}`,
//! `run.{success, status, elapsed_time, start_time, end_time, exception, backtrace}`,
//! `solo` and `client_label`.
//!
//! The subject is limited to [`MAX_SUBJECT_CHARS`] printable ASCII characters and the
//! body to [`MAX_BODY_BYTES`] bytes of UTF-8. Anything that cannot be
//! represented is replaced with `?`.

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use tracing::debug;

use crate::config::HandlerConfig;
use crate::error::ReportError;
use crate::report::RunReport;

/// Maximum subject length accepted by the topic service.
pub const MAX_SUBJECT_CHARS: usize = 100;

/// Maximum message size accepted by the topic service (256 KiB).
pub const MAX_BODY_BYTES: usize = 262_144;

/// Fuel limit for template evaluation, sized so loops producing a full
/// [`MAX_BODY_BYTES`] body still finish.
const FUEL_LIMIT: u64 = 10_000_000;

/// Replacement for characters that cannot be encoded.
const REPLACEMENT: char = '?';

/// Body template used when no `body_template_path` is configured.
pub const DEFAULT_BODY_TEMPLATE: &str = include_str!("../templates/body.txt");

/// Subject and body ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Values exposed to templates.
#[derive(Debug, Serialize)]
struct TemplateContext<'a> {
    node: NodeContext<'a>,
    run: RunContext<'a>,
    solo: bool,
    client_label: &'static str,
}

#[derive(Debug, Serialize)]
struct NodeContext<'a> {
    name: &'a str,
    fqdn: Option<&'a str>,
    run_list: String,
    chef_environment: &'a str,
}

#[derive(Debug, Serialize)]
struct RunContext<'a> {
    success: bool,
    status: &'static str,
    elapsed_time: f64,
    start_time: String,
    end_time: String,
    exception: Option<&'a str>,
    backtrace: &'a [String],
}

impl<'a> TemplateContext<'a> {
    fn new(report: &'a RunReport) -> Self {
        const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";
        Self {
            node: NodeContext {
                name: &report.node.name,
                fqdn: report.node.fqdn.as_deref(),
                run_list: report.node.run_list_description(),
                chef_environment: &report.node.chef_environment,
            },
            run: RunContext {
                success: report.run.success,
                status: report.run.status(),
                elapsed_time: report.run.elapsed_time(),
                start_time: report.run.start_time.format(TIME_FORMAT).to_string(),
                end_time: report.run.end_time.format(TIME_FORMAT).to_string(),
                exception: report.run.exception.as_deref(),
                backtrace: &report.run.backtrace,
            },
            solo: report.solo,
            client_label: client_label(report.solo),
        }
    }
}

/// Name of the client flavour that produced the run.
pub fn client_label(solo: bool) -> &'static str {
    if solo { "Chef Solo" } else { "Chef Client" }
}

fn template_environment() -> Result<Environment<'static>, ReportError> {
    let syntax = SyntaxConfig::builder()
        .block_delimiters("<%", "%>")
        .variable_delimiters("<%=", "%>")
        .comment_delimiters("<%#", "%>")
        .build()
        .map_err(|e| ReportError::TemplateRender(format!("invalid template syntax: {e}")))?;

    let mut env = Environment::new();
    env.set_syntax(syntax);
    env.set_fuel(Some(FUEL_LIMIT));
    env.set_keep_trailing_newline(true);
    env.set_trim_blocks(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    Ok(env)
}

fn render(source: &str, report: &RunReport, what: &str) -> Result<String, ReportError> {
    let env = template_environment()?;
    env.render_str(source, TemplateContext::new(report))
        .map_err(|e| ReportError::TemplateRender(format!("error rendering {what} template: {e}")))
}

/// Render the message subject.
///
/// Without a `subject_template` the subject is
/// `"<client label> <success|failure> in <node name>"`.
pub fn render_subject(config: &HandlerConfig, report: &RunReport) -> Result<String, ReportError> {
    let subject = match config.subject_template() {
        Some(template) => render(template, report, "subject")?,
        None => format!(
            "{} {} in {}",
            client_label(report.solo),
            report.run.status(),
            report.node.name
        ),
    };
    Ok(sanitize_ascii(&subject)
        .chars()
        .take(MAX_SUBJECT_CHARS)
        .collect())
}

/// Render the message body from the configured or the bundled template.
pub fn render_body(config: &HandlerConfig, report: &RunReport) -> Result<String, ReportError> {
    let body = match config.body_template_path() {
        Some(path) => {
            debug!(path = %path.display(), "reading body template");
            let bytes = std::fs::read(path).map_err(|source| ReportError::TemplateRead {
                path: path.to_path_buf(),
                source,
            })?;
            render(&sanitize_utf8(&bytes), report, "body")?
        }
        None => render(DEFAULT_BODY_TEMPLATE, report, "body")?,
    };
    Ok(truncate_bytes(body, MAX_BODY_BYTES))
}

/// Render subject and body together.
pub fn render_message(
    config: &HandlerConfig,
    report: &RunReport,
) -> Result<RenderedMessage, ReportError> {
    Ok(RenderedMessage {
        subject: render_subject(config, report)?,
        body: render_body(config, report)?,
    })
}

/// Replace every non-ASCII or control character with `?`.
pub fn sanitize_ascii(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() {
                c
            } else {
                REPLACEMENT
            }
        })
        .collect()
}

/// Decode bytes as UTF-8, replacing each invalid sequence with `?`.
pub fn sanitize_utf8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
        if !chunk.invalid().is_empty() {
            out.push(REPLACEMENT);
        }
    }
    out
}

/// Cut `text` to at most `max_bytes` bytes without splitting a character.
pub fn truncate_bytes(mut text: String, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text
}
