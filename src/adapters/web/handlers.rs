//! HTTP request handlers for web adapter.

use askama::Template;
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use crate::adapters::csv_adapter::summary_csv;
use crate::adapters::html_report_adapter::{ReportFragment, ReportTemplate, ReportView};
use crate::domain::collector::{FIELD_SUBMIT, FormInput, FormOutcome, collect_backtest_form};
use crate::domain::form::build_strategy_section;
use crate::pipeline::Pipeline;

use super::templates::{
    BacktestFormTemplate, BacktestPageTemplate, FormView, ParamSectionTemplate, SectionView,
};
use super::{AppState, WebError, is_htmx_request, status_from_error};

type Fields = Vec<(String, String)>;

fn pipeline(state: &AppState) -> Pipeline<'_> {
    Pipeline {
        catalog: &state.catalog,
        engine: state.engine.as_ref(),
        visualizer: &state.visualizer,
        settings: &state.settings,
    }
}

fn render_form(
    state: &AppState,
    headers: &HeaderMap,
    outcome: &FormOutcome,
    status: StatusCode,
) -> Result<Response, WebError> {
    let Some(form) = &outcome.form else {
        return Err(WebError::unprocessable(outcome.notices.join("; ")));
    };
    let view = FormView::from_form(form, &outcome.notices);
    let section = SectionView::from_section(&form.section);

    if is_htmx_request(headers) {
        let html = BacktestFormTemplate {
            form: &view,
            section: &section,
        }
        .render()?;
        let mut response = (status, Html(html)).into_response();
        // A re-rendered form replaces the whole form, not the report slot.
        let h = response.headers_mut();
        h.insert("HX-Retarget", HeaderValue::from_static("#content"));
        h.insert("HX-Reswap", HeaderValue::from_static("outerHTML"));
        Ok(response)
    } else {
        let html = BacktestPageTemplate {
            title: &state.settings.title,
            form: &view,
            section: &section,
        }
        .render()?;
        Ok((status, Html(html)).into_response())
    }
}

/// The configuration form. Query parameters preselect values but never
/// submit.
pub async fn backtest_form(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<Fields>,
) -> Result<Response, WebError> {
    let input = FormInput::new(query.into_iter().filter(|(k, _)| k != FIELD_SUBMIT).collect());
    let outcome = collect_backtest_form(&state.catalog, state.visualizer.reference_date(), &input);
    render_form(&state, &headers, &outcome, StatusCode::OK).map_err(|e| {
        tracing::error!(error = %e.message, "failed to render backtest form");
        e
    })
}

#[derive(Debug, serde::Deserialize)]
pub struct ParamsQuery {
    pub strategy: String,
}

/// Parameter section for one strategy, swapped in when the selection changes.
pub async fn strategy_params(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ParamsQuery>,
) -> Response {
    let spec = match state.catalog.strategies.get(&query.strategy) {
        Ok(spec) => spec,
        Err(e) => {
            tracing::warn!(strategy = %query.strategy, error = %e, "unknown strategy requested");
            return WebError::from(e).respond(&headers);
        }
    };
    let section = SectionView::from_section(&build_strategy_section(spec, |_| None));
    match (ParamSectionTemplate { section: &section }).render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => WebError::from(e).respond(&headers),
    }
}

/// Collect the posted form and, once submitted, run the backtest and return
/// the report.
pub async fn run_backtest(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(fields): Form<Fields>,
) -> Result<Response, WebError> {
    let input = FormInput::new(fields.clone());
    let mut outcome =
        collect_backtest_form(&state.catalog, state.visualizer.reference_date(), &input);

    let request = match (&outcome.request, outcome.submitted) {
        (Some(request), true) => request.clone(),
        _ => {
            let status = if outcome.notices.is_empty() {
                StatusCode::OK
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            return render_form(&state, &headers, &outcome, status);
        }
    };

    let generated_at = chrono::Local::now().naive_local();
    match pipeline(&state).run(&request, generated_at) {
        Ok(report) => {
            let view = ReportView::from_input(&report).with_download(fields);
            let html = if is_htmx_request(&headers) {
                ReportFragment { report: &view }.render()?
            } else {
                ReportTemplate { report: &view }.render()?
            };
            Ok(Html(html).into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "backtest run failed");
            let status = status_from_error(&e);
            outcome.notices.push(e.to_string());
            render_form(&state, &headers, &outcome, status)
        }
    }
}

/// Run a submitted backtest again and return the per-symbol summary as a
/// CSV attachment.
pub async fn download_summary(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Fields>,
) -> Result<Response, WebError> {
    let input = FormInput::new(fields);
    let outcome = collect_backtest_form(&state.catalog, state.visualizer.reference_date(), &input);
    let request = match (&outcome.request, outcome.submitted) {
        (Some(request), true) => request,
        _ if outcome.notices.is_empty() => {
            return Err(WebError::unprocessable("backtest not submitted"));
        }
        _ => return Err(WebError::unprocessable(outcome.notices.join("; "))),
    };

    let generated_at = chrono::Local::now().naive_local();
    let report = pipeline(&state).run(request, generated_at).map_err(|e| {
        tracing::warn!(error = %e, "summary download failed");
        WebError::from(e)
    })?;
    let body = summary_csv(report.results.values())?;

    let filename = format!(
        "attachment; filename=\"trendquest_summary_{}.csv\"",
        generated_at.format("%Y%m%d_%H%M%S")
    );
    let disposition =
        HeaderValue::from_str(&filename).map_err(|e| WebError::internal(e.to_string()))?;
    tracing::info!(symbols = report.results.len(), "summary CSV downloaded");
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub async fn not_found(headers: HeaderMap) -> Response {
    WebError::not_found("Page not found").respond(&headers)
}
