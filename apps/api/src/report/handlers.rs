//! Axum route handlers for the Report API.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::report::template::{ReportSection, ReportTemplate};
use crate::report::{generate_report, DateRange};
use crate::state::AppState;

const DEFAULT_TEMPLATE: &str = "comprehensive";

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub user_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Built-in template name. Ignored when `sections` is given.
    pub template: Option<String>,
    pub sections: Option<Vec<ReportSection>>,
}

fn resolve_template(req: &ReportRequest) -> Result<ReportTemplate, AppError> {
    if let Some(sections) = &req.sections {
        if sections.is_empty() {
            return Err(AppError::Validation(
                "A custom report needs at least one section".to_string(),
            ));
        }
        return Ok(ReportTemplate {
            name: req.template.clone().unwrap_or_else(|| "custom".to_string()),
            sections: sections.clone(),
        });
    }
    let name = req.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);
    ReportTemplate::builtin(name)
        .ok_or_else(|| AppError::Validation(format!("Unknown report template '{name}'")))
}

/// POST /api/v1/reports
///
/// Returns the report as a plain-text attachment.
pub async fn handle_generate_report(
    State(state): State<AppState>,
    Json(req): Json<ReportRequest>,
) -> Result<Response, AppError> {
    let range = DateRange::new(req.from, req.to)?;
    let template = resolve_template(&req)?;
    let text = generate_report(state.records.as_ref(), req.user_id, range, &template).await?;

    let file_name = format!("health-report-{}-to-{}.txt", range.from, range.to);
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        text,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(template: Option<&str>, sections: Option<Vec<ReportSection>>) -> ReportRequest {
        ReportRequest {
            user_id: Uuid::new_v4(),
            from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            template: template.map(String::from),
            sections,
        }
    }

    #[test]
    fn test_default_template_is_comprehensive() {
        let t = resolve_template(&request(None, None)).unwrap();
        assert_eq!(t.name, "comprehensive");
    }

    #[test]
    fn test_custom_sections_win() {
        let t = resolve_template(&request(
            Some("digestive"),
            Some(vec![ReportSection::Seizures]),
        ))
        .unwrap();
        assert_eq!(t.sections, vec![ReportSection::Seizures]);
    }

    #[test]
    fn test_unknown_template_rejected() {
        assert!(matches!(
            resolve_template(&request(Some("cardiology"), None)),
            Err(AppError::Validation(_))
        ));
        assert!(resolve_template(&request(None, Some(vec![]))).is_err());
    }
}
