//! Human-readable (HTML) rendering of reports.


use serde_json::Value;

use crate::report::Report;

/// Base path of the report collection.
pub const REPORTS_PATH: &str = "/v1.0/reports";

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse}\
td,th{border:1px solid #ccc;padding:.3em .6em;text-align:left}\
pre{background:#f6f6f6;padding:1em;overflow:auto}";

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = html_escape(title),
    )
}

/// Render the report collection as an HTML table.
#[must_use]
pub fn render_list(reports: &[Report]) -> String {
    let mut body = String::from("<h1>Reports</h1>\n<table>\n");
    body.push_str(
        "<tr><th>Id</th><th>Product</th><th>Version</th><th>Timestamp</th><th></th></tr>\n",
    );

    if reports.is_empty() {
        body.push_str("<tr><td colspan=\"5\">No reports</td></tr>\n");
    }

    for report in reports {
        body.push_str(&format!(
            "<tr><td><a href=\"{base}/{id}\">{id}</a></td><td>{product}</td><td>{version}</td>\
             <td>{timestamp}</td><td><a href=\"{base}/{id}/download\">download</a></td></tr>\n",
            base = REPORTS_PATH,
            id = report.id,
            product = html_escape(&report.product),
            version = html_escape(&report.version),
            timestamp = report.timestamp.to_rfc3339(),
        ));
    }

    body.push_str("</table>\n");
    page("Reports", &body)
}

/// Render one report with its payload pretty-printed.
#[must_use]
pub fn render_report(report: &Report) -> String {
    let pretty = serde_json::from_str::<Value>(&report.raw)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| report.raw.clone());

    let title = format!("Report {}", report.id);
    let mut body = format!("<h1>{}</h1>\n<dl>\n", html_escape(&title));
    body.push_str(&format!(
        "<dt>Product</dt><dd>{}</dd>\n<dt>Version</dt><dd>{}</dd>\n<dt>Timestamp</dt><dd>{}</dd>\n",
        html_escape(&report.product),
        html_escape(&report.version),
        report.timestamp.to_rfc3339(),
    ));
    body.push_str("</dl>\n");
    body.push_str(&format!("<pre>{}</pre>\n", html_escape(&pretty)));
    body.push_str(&format!(
        "<p><a href=\"{REPORTS_PATH}/{id}/download\">download</a> | \
         <a href=\"{REPORTS_PATH}\">all reports</a></p>\n",
        id = report.id,
    ));
    page(&title, &body)
}
