use certdesk_db::{seed_catalog, SeedResult};

use crate::commands::{build_runtime, load_config, open_database, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let seeded = seed_catalog(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8));
        pool.close().await;
        seeded
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", seed_message(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_message(seeded: &SeedResult) -> String {
    let type_ids =
        seeded.certificate_types.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ");
    format!(
        "demo catalog loaded: certificate types [{type_ids}], certificates [{}]",
        seeded.certificates.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use certdesk_core::domain::certificate_type::CertificateTypeId;
    use certdesk_db::SeedResult;

    use super::seed_message;

    #[test]
    fn message_lists_seeded_records() {
        let seeded = SeedResult {
            certificate_types: vec![CertificateTypeId(1), CertificateTypeId(2)],
            certificates: vec!["CERT-DEMO-0001".to_string()],
        };

        assert_eq!(
            seed_message(&seeded),
            "demo catalog loaded: certificate types [1, 2], certificates [CERT-DEMO-0001]"
        );
    }
}
