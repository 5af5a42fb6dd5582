//! The HTML page: a nine-field form and a CSV upload.

use crate::AppState;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::Html;
use potability::{FeatureRow, Potability, PotabilityError, FEATURE_NAMES};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, warn};

/// Form label for each feature column, in canonical order.
const FIELD_LABELS: [&str; 9] = [
    "pH",
    "Hardness",
    "Solids (ppm)",
    "Chloramines",
    "Sulfate",
    "Conductivity",
    "Organic Carbon",
    "Trihalomethanes",
    "Turbidity",
];

/// Uploads the chosen CSV to the batch endpoint and saves the response.
const UPLOAD_SCRIPT: &str = r#"
document.getElementById("upload").addEventListener("submit", async (event) => {
  event.preventDefault();
  const status = document.getElementById("upload-status");
  const file = document.getElementById("csv").files[0];
  if (!file) { status.textContent = "Choose a CSV file first."; return; }
  const response = await fetch("/api/predict/batch", {
    method: "POST",
    headers: { "Content-Type": "text/csv" },
    body: await file.text(),
  });
  if (!response.ok) {
    const body = await response.json().catch(() => ({ error: response.statusText }));
    status.textContent = "Error processing file: " + body.error;
    return;
  }
  const link = document.createElement("a");
  link.href = URL.createObjectURL(await response.blob());
  link.download = "potability_results.csv";
  link.click();
  status.textContent = "Predictions completed.";
});
"#;

/// Outcome shown under the form.
enum Verdict {
    Label(Potability),
    Error(String),
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Form values for a parsed row.
fn row_values(row: &FeatureRow) -> Vec<String> {
    row.to_values().iter().map(|v| v.to_string()).collect()
}

/// Form values as submitted, in canonical order; absent fields are blank.
fn submitted_values(fields: &[(String, String)]) -> Vec<String> {
    FEATURE_NAMES
        .iter()
        .map(|name| {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        })
        .collect()
}

fn render(values: &[String], verdict: Option<&Verdict>) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Water Potability Predictor</title>\n</head>\n<body>\n\
         <h1>Water Potability Predictor</h1>\n\
         <h2>Predict a Single Sample</h2>\n\
         <form method=\"post\" action=\"/predict\">\n",
    );
    for ((name, label), value) in FEATURE_NAMES.iter().zip(FIELD_LABELS).zip(values) {
        let max = if *name == "ph" { " max=\"14\"" } else { "" };
        let _ = writeln!(
            html,
            "<label>{label} <input type=\"number\" step=\"any\" min=\"0\"{max} name=\"{name}\" value=\"{}\" required></label><br>",
            escape_html(value)
        );
    }
    html.push_str("<button type=\"submit\">Predict Potability</button>\n</form>\n");

    match verdict {
        Some(Verdict::Label(Potability::Potable)) => {
            html.push_str(
                "<p id=\"verdict\">The water is <strong>POTABLE</strong> (safe to drink).</p>\n",
            );
        }
        Some(Verdict::Label(Potability::NotPotable)) => {
            html.push_str(
                "<p id=\"verdict\">The water is <strong>NOT POTABLE</strong> (unsafe to drink).</p>\n",
            );
        }
        Some(Verdict::Error(message)) => {
            let _ = writeln!(html, "<p id=\"error\">{}</p>", escape_html(message));
        }
        None => {}
    }

    html.push_str(
        "<h2>Upload CSV for Batch Prediction</h2>\n\
         <form id=\"upload\">\n\
         <input type=\"file\" id=\"csv\" accept=\".csv,text/csv\">\n\
         <button type=\"submit\">Predict and Download</button>\n\
         </form>\n<p id=\"upload-status\"></p>\n<script>",
    );
    html.push_str(UPLOAD_SCRIPT);
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

/// `GET /`: the empty form, pre-filled with a sample.
pub async fn index() -> Html<String> {
    Html(render(&row_values(&FeatureRow::default()), None))
}

/// `POST /predict`: classify the submitted form.
pub async fn predict_form(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> (StatusCode, Html<String>) {
    let pairs = fields.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    let result = FeatureRow::from_named_fields(pairs)
        .and_then(|row| state.predictor.predict_one(&row).map(|label| (row, label)));

    match result {
        Ok((row, label)) => {
            debug!(%label, "form prediction");
            let page = render(&row_values(&row), Some(&Verdict::Label(label)));
            (StatusCode::OK, Html(page))
        }
        Err(err @ PotabilityError::SchemaMismatch(_)) => {
            warn!(error = %err, "rejected form");
            let verdict = Verdict::Error(err.to_string());
            let page = render(&submitted_values(&fields), Some(&verdict));
            (StatusCode::UNPROCESSABLE_ENTITY, Html(page))
        }
        Err(err) => {
            tracing::error!(error = %err, "form prediction failed");
            let verdict = Verdict::Error("internal error".to_string());
            let page = render(&submitted_values(&fields), Some(&verdict));
            (StatusCode::INTERNAL_SERVER_ERROR, Html(page))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_render_has_every_field() {
        let html = render(&row_values(&FeatureRow::default()), None);
        for name in FEATURE_NAMES {
            assert!(html.contains(&format!("name=\"{name}\"")), "{name}");
        }
        assert!(html.contains("value=\"10000\""));
        assert!(!html.contains("id=\"verdict\""));
    }

    #[test]
    fn test_render_verdicts() {
        let row = row_values(&FeatureRow::default());
        let html = render(&row, Some(&Verdict::Label(Potability::Potable)));
        assert!(html.contains("<strong>POTABLE</strong>"));
        let html = render(&row, Some(&Verdict::Label(Potability::NotPotable)));
        assert!(html.contains("NOT POTABLE"));
        let html = render(&row, Some(&Verdict::Error("bad <input>".to_string())));
        assert!(html.contains("bad &lt;input&gt;"));
    }

    #[test]
    fn test_submitted_values_keep_user_input() {
        let fields = vec![
            ("Hardness".to_string(), "123.5".to_string()),
            ("ph".to_string(), "\"><b>".to_string()),
        ];
        let values = submitted_values(&fields);
        assert_eq!(values.len(), FEATURE_NAMES.len());
        assert_eq!(values[0], "\"><b>");
        assert_eq!(values[1], "123.5");
        assert_eq!(values[2], "");

        let html = render(&values, None);
        assert!(html.contains("name=\"Hardness\" value=\"123.5\""));
        assert!(html.contains("name=\"ph\" value=\"&quot;&gt;&lt;b&gt;\""));
    }
}
