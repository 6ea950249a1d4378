use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use serde_json::{json, Value};
use tracing::info;

use certdesk_core::domain::certificate::{CertificateId, CertificateStatus};
use certdesk_core::report::{FormData, ReportSchema, ReportSession, ReportValidator};
use certdesk_db::catalog_resolver;
use certdesk_db::repositories::{
    CertificateRepository, ReportRepository, SqlCertificateRepository, SqlReportRepository,
};

use crate::commands::{
    build_runtime, load_config, open_database, to_data, CommandFailure, CommandResult,
};

const COMMAND: &str = "report";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportOperation {
    Validate,
    Submit,
}

enum ReportRun {
    Validated(Value),
    Invalid(Value),
    Submitted { certificate_id: CertificateId, status: CertificateStatus },
}

pub fn run(certificate_id: &str, data_path: &Path, operation: ReportOperation) -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let sub_forms = match read_sub_forms(data_path) {
        Ok(sub_forms) => sub_forms,
        Err(error) => {
            return CommandResult::failure(COMMAND, "invalid_input", format!("{error:#}"), 6)
        }
    };
    let runtime = match build_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };
    let certificate_id = CertificateId(certificate_id.trim().to_string());

    let result: Result<ReportRun, CommandFailure> = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let outcome = async {
            let certificates = SqlCertificateRepository::new(pool.clone());
            let Some(certificate) =
                certificates.find_by_id(&certificate_id).await.map_err(persistence)?
            else {
                return Err((
                    "not_found",
                    format!("certificate {certificate_id} does not exist"),
                    6u8,
                ));
            };
            // Nothing is written unless the certificate can still take a report.
            if operation == ReportOperation::Submit
                && !certificate.can_transition_to(CertificateStatus::Inspected)
            {
                return Err((
                    "invalid_transition",
                    format!(
                        "certificate {certificate_id} is {} and no longer accepts a report",
                        certificate.status.as_str()
                    ),
                    7u8,
                ));
            }

            let catalog = catalog_resolver(&pool).await.map_err(persistence)?;
            let validator = ReportValidator::new(ReportSchema::inspection(), catalog);
            let mut session = ReportSession::new(certificate_id.clone(), validator);
            for values in sub_forms {
                session.record(values);
            }

            let validation = session.validate();
            let summary = json!({
                "certificate_id": certificate_id,
                "is_valid": validation.is_valid,
                "errors": validation.errors,
                "errors_by_section": session.store().errors_by_section(),
            });
            if !validation.is_valid {
                return Ok(ReportRun::Invalid(summary));
            }
            if operation == ReportOperation::Validate {
                return Ok(ReportRun::Validated(summary));
            }

            let form_data = match session.submit() {
                Ok(form_data) => form_data,
                Err(error) => return Err(("report_invalid", error.to_string(), 7u8)),
            };
            SqlReportRepository::new(pool.clone())
                .save(&certificate_id, form_data)
                .await
                .map_err(persistence)?;
            let certificate = certificates
                .update_status(&certificate_id, CertificateStatus::Inspected)
                .await
                .map_err(persistence)?;
            Ok(ReportRun::Submitted { certificate_id: certificate.id, status: certificate.status })
        }
        .await;
        pool.close().await;
        outcome
    });

    match result {
        Ok(ReportRun::Validated(summary)) => {
            CommandResult::success_with_data(COMMAND, "report is valid", Some(summary))
        }
        Ok(ReportRun::Invalid(summary)) => CommandResult::failure_with_data(
            COMMAND,
            "report_invalid",
            "report has validation errors",
            7,
            Some(summary),
        ),
        Ok(ReportRun::Submitted { certificate_id, status }) => {
            info!(
                event_name = "report.submitted",
                certificate_id = %certificate_id,
                status = status.as_str(),
                "inspection report stored"
            );
            CommandResult::success_with_data(
                COMMAND,
                format!("report for {certificate_id} submitted"),
                to_data(json!({ "certificate_id": certificate_id, "status": status })),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}

/// Reads one JSON object, or an array of objects recorded in order as successive sub-forms.
fn read_sub_forms(path: &Path) -> anyhow::Result<Vec<FormData>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read report data from {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("report data in {} is not valid JSON", path.display()))?;

    match value {
        Value::Object(values) => Ok(vec![values]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(values) => Ok(values),
                _ => bail!("sub-form #{index} in {} is not a JSON object", path.display()),
            })
            .collect(),
        _ => bail!("report data in {} must be an object or an array of objects", path.display()),
    }
}

fn persistence(error: impl std::fmt::Display) -> CommandFailure {
    ("persistence", error.to_string(), 8)
}
