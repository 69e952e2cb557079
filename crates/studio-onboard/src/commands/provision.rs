use crate::ProvisionArgs;
use colored::Colorize;
use std::sync::Arc;
use studio_onboard_config::Settings;
use studio_onboard_core::{OnboardError, Provisioner, StepLogger};
use studio_onboard_yc::RealInvoker;

pub async fn handle(args: &ProvisionArgs) -> anyhow::Result<()> {
    let settings = Settings::load(args.config.as_deref())
        .map_err(OnboardError::from)?
        .apply(args.overrides());

    tracing::debug!(?settings, "Effective settings");

    println!("{}", "🚀 AI Studio onboarding".bold());
    println!(
        "   service account: {}  role: {}",
        settings.service_account_name.cyan(),
        settings.role.cyan()
    );
    println!();

    let provisioner = Provisioner::new(Arc::new(RealInvoker), settings);
    let mut logger = StepLogger::new();
    let report = provisioner.run(&mut logger).await?;

    report.print_summary(&logger);
    if logger.warning_count() > 0 {
        println!(
            "{}",
            format!("{} warning(s), see above", logger.warning_count()).yellow()
        );
    }

    Ok(())
}
