//! Self-contained HTML report.

use vigil::reconcile::{Change, ChangeReport};

const STYLE: &str = "
body { font-family: Arial, sans-serif; margin: 20px; }
.header { background-color: #f0f0f0; padding: 20px; border-radius: 5px; }
.change { margin: 10px 0; padding: 10px; border-left: 4px solid #ccc; }
.added { border-left-color: #4CAF50; }
.modified { border-left-color: #FF9800; }
.removed { border-left-color: #F44336; }
.critical { background-color: #fdecea; }
.hash { font-family: monospace; font-size: 0.9em; color: #666; }
";

/// 转义 HTML 特殊字符
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn render_report(report: &ChangeReport) -> String {
    let summary = report.summary();
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Vigil Integrity Report</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <div class=\"header\">\n<h1>Vigil File Integrity Monitor</h1>\n\
         <p>Root: {}</p>\n<p>Baseline: {} (id {})</p>\n<p>Scan completed: {}</p>\n\
         <p>Total changes: {} (added {}, modified {}, removed {}, critical {})</p>\n</div>\n",
        escape(&report.root_path),
        escape(&report.baseline_name),
        report.baseline_id,
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.total(),
        summary.added,
        summary.modified,
        summary.removed,
        summary.critical,
    );

    for record in &report.changes {
        let kind = record.kind();
        let critical = if record.critical { " critical" } else { "" };
        html.push_str(&format!(
            "<div class=\"change {}{critical}\">\n<h3>[{kind}] {}</h3>\n",
            kind.as_str().to_ascii_lowercase(),
            escape(record.path().as_str()),
        ));
        if let Change::Modified { old, new } = &record.change {
            for (algorithm, digest) in &old.digests {
                if let Some(current) = new.digests.get(algorithm) {
                    if current != digest {
                        html.push_str(&format!("<p class=\"hash\">{algorithm}: {digest} &rarr; {current}</p>\n"));
                    }
                }
            }
            if old.size_bytes != new.size_bytes {
                html.push_str(&format!(
                    "<p>Size: {} &rarr; {}</p>\n",
                    bytesize::to_string(old.size_bytes, true),
                    bytesize::to_string(new.size_bytes, true)
                ));
            }
            if old.permissions != new.permissions {
                html.push_str(&format!("<p>Permissions: {:o} &rarr; {:o}</p>\n", old.permissions, new.permissions));
            }
        }
        html.push_str("</div>\n");
    }

    if !report.skipped.is_empty() {
        html.push_str(&format!("<h2>Skipped files ({})</h2>\n<ul>\n", report.skipped.len()));
        for skipped in &report.skipped {
            html.push_str(&format!("<li>{}</li>\n", escape(skipped.path.as_str())));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}
