use std::sync::Arc;

use serde_json::json;
use tracing::info;

use certdesk_core::audit::{AuditContext, TracingAuditSink};
use certdesk_core::config::AppConfig;
use certdesk_core::drafts::{DraftPatch, DraftSlot, DraftStore, FileDraftStorage};
use certdesk_core::errors::{ApplicationError, DomainError};
use certdesk_core::flows::{CustomerFlow, FlowDefinition, FlowVariant, PartnerFlow};
use certdesk_core::wizard::{DraftWizard, StepMove};
use certdesk_db::repositories::{
    CertificateRepository, DraftSnapshotRepository, SqlCertificateRepository,
    SqlDraftSnapshotRepository,
};

use crate::commands::{build_runtime, load_config, open_database, to_data, CommandResult};

const COMMAND: &str = "draft";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DraftOperation {
    Show,
    /// JSON object merged into the draft; `null` clears a key. The step itself moves only via
    /// `Next` and `Back`.
    Set { patch: String },
    Next,
    Back,
    Clear,
    Submit,
}

pub fn run(slot: DraftSlot, operation: DraftOperation) -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let storage = Arc::new(FileDraftStorage::new(config.storage.draft_dir.clone()));
    let store = match DraftStore::open(slot, storage) {
        Ok(store) => store,
        Err(error) => return application_failure(error),
    };
    let audit = AuditContext::new(
        None,
        Some(slot.storage_key().to_string()),
        format!("cli-{}", std::process::id()),
        "certdesk-cli",
    );

    match slot.flow_variant() {
        FlowVariant::Customer => execute(&config, store, CustomerFlow, audit, operation),
        FlowVariant::Partner => execute(&config, store, PartnerFlow, audit, operation),
    }
}

fn execute<F>(
    config: &AppConfig,
    store: DraftStore,
    flow: F,
    audit: AuditContext,
    operation: DraftOperation,
) -> CommandResult
where
    F: FlowDefinition,
{
    let mut wizard = match DraftWizard::new(store, flow) {
        Ok(wizard) => wizard.with_audit(Arc::new(TracingAuditSink), audit),
        Err(error) => return application_failure(error),
    };

    match operation {
        DraftOperation::Show => CommandResult::success_with_data(
            COMMAND,
            format!("draft at step {}", wizard.draft().current_step),
            Some(state(&wizard)),
        ),
        DraftOperation::Set { patch } => {
            let patch = match serde_json::from_str::<DraftPatch>(&patch) {
                Ok(patch) => patch,
                Err(error) => {
                    return CommandResult::failure(
                        COMMAND,
                        "invalid_input",
                        format!("draft patch is not valid: {error}"),
                        6,
                    )
                }
            };
            match wizard.update(patch) {
                Ok(_) => {
                    CommandResult::success_with_data(COMMAND, "draft updated", Some(state(&wizard)))
                }
                Err(error) => application_failure(error),
            }
        }
        DraftOperation::Next => step_result(wizard.next(), &wizard),
        DraftOperation::Back => step_result(wizard.back(), &wizard),
        DraftOperation::Clear => match wizard.cancel() {
            Ok(()) => {
                CommandResult::success_with_data(COMMAND, "draft cleared", Some(state(&wizard)))
            }
            Err(error) => application_failure(error),
        },
        DraftOperation::Submit => submit(config, &mut wizard),
    }
}

fn submit<F>(config: &AppConfig, wizard: &mut DraftWizard<F>) -> CommandResult
where
    F: FlowDefinition,
{
    let snapshot = match wizard.submission() {
        Ok(snapshot) => snapshot,
        Err(error) => return application_failure(error),
    };
    let runtime = match build_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };
    let slot = wizard.store().slot();

    let result = runtime.block_on(async {
        let pool = open_database(config).await?;
        let created = async {
            let saved = SqlDraftSnapshotRepository::new(pool.clone())
                .save(slot, snapshot)
                .await
                .map_err(|error| ("persistence", error.to_string(), 8u8))?;
            SqlCertificateRepository::new(pool.clone())
                .create_from_draft(&saved.snapshot)
                .await
                .map_err(|error| ("persistence", error.to_string(), 8u8))
        }
        .await;
        pool.close().await;
        created
    });

    let certificate = match result {
        Ok(certificate) => certificate,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    };

    if let Err(error) = wizard.complete_submission(&certificate.id) {
        return application_failure(error);
    }
    info!(
        event_name = "certificate.created",
        certificate_id = %certificate.id,
        status = certificate.status.as_str(),
        "certificate created from draft"
    );

    CommandResult::success_with_data(
        COMMAND,
        format!("certificate {} created", certificate.id),
        Some(json!({
            "certificate_id": certificate.id,
            "status": certificate.status,
            "draft": state(wizard),
        })),
    )
}

fn step_result<F>(
    result: Result<StepMove, ApplicationError>,
    wizard: &DraftWizard<F>,
) -> CommandResult
where
    F: FlowDefinition,
{
    match result {
        Ok(StepMove::Moved { from, to }) => CommandResult::success_with_data(
            COMMAND,
            format!("moved from {from} to {to}"),
            Some(state(wizard)),
        ),
        Ok(StepMove::Blocked { step, errors }) => CommandResult::failure_with_data(
            COMMAND,
            "step_blocked",
            format!("step {step} is incomplete"),
            7,
            to_data(json!({ "step": step, "errors": errors })),
        ),
        Err(error) => application_failure(error),
    }
}

fn state<F>(wizard: &DraftWizard<F>) -> serde_json::Value
where
    F: FlowDefinition,
{
    json!({
        "slot": wizard.store().slot(),
        "draft": wizard.draft().snapshot(),
        "navigation": wizard.navigation(),
    })
}

fn application_failure(error: ApplicationError) -> CommandResult {
    let (error_class, exit_code) = match &error {
        ApplicationError::Domain(
            DomainError::FlowTransition(_) | DomainError::StepChangeRejected { .. },
        ) => ("invalid_transition", 7),
        ApplicationError::Domain(_) => ("invalid_input", 6),
        ApplicationError::Persistence(_) => ("persistence", 8),
        ApplicationError::Configuration(_) => ("config_validation", 2),
    };
    CommandResult::failure(COMMAND, error_class, error.to_string(), exit_code)
}
