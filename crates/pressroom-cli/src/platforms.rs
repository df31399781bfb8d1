use clap::Subcommand;
use pressroom_core::{AppConfig, Platform};
use pressroom_publish::BlogIntegrationService;

/// Sub-commands available under `platforms`.
#[derive(Debug, Subcommand)]
pub enum PlatformCommands {
    /// Show which platforms have credentials
    List,
    /// Check credentials against the platform APIs
    Verify {
        /// Platform to check; defaults to every configured platform
        platform: Option<Platform>,
    },
}

pub(crate) fn run_platforms_list(config: &AppConfig) {
    println!("{:<12}{:<12}CONFIGURED", "PLATFORM", "NAME");
    for platform in Platform::ALL {
        let configured = if config.platform_configured(platform) {
            "yes"
        } else {
            "no"
        };
        println!(
            "{:<12}{:<12}{configured}",
            platform.as_str(),
            platform.display_name()
        );
    }
}

/// Verifies credentials for one platform or every configured one.
///
/// # Errors
///
/// Returns an error if no platform is configured, a client cannot be built,
/// or any verification fails.
pub(crate) async fn run_platforms_verify(
    config: &AppConfig,
    platform: Option<Platform>,
) -> anyhow::Result<()> {
    let service = BlogIntegrationService::from_config(config)?;
    let platforms = match platform {
        Some(p) => vec![p],
        None => service.configured_platforms(),
    };
    if platforms.is_empty() {
        anyhow::bail!("no publishing platforms are configured");
    }

    let mut failed = 0usize;
    for platform in platforms {
        match service.verify(platform).await {
            Ok(account) => println!("{:<12}ok    {account}", platform.as_str()),
            Err(e) => {
                failed += 1;
                println!("{:<12}FAIL  {e}", platform.as_str());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} platform(s) failed verification");
    }
    Ok(())
}
