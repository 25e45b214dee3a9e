//! Doctor command for deployment diagnostics
//!
//! Checks that the adapter can actually do its job: cli-vision present, the
//! vision endpoint answering, and somewhere to write screenshots.

use crate::config::AdapterConfig;
use crate::tools::invoker::{resolve_program, EXECUTABLE_HINT};
use colored::Colorize;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    config: AdapterConfig,
    scratch_dir: PathBuf,
}

impl Doctor {
    /// Create a new doctor instance
    pub fn new(config: AdapterConfig) -> Self {
        Self {
            config,
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Probe a different directory for write access
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        vec![
            self.check_configuration(),
            self.check_executable(),
            self.check_vlm_endpoint().await,
            self.check_scratch_dir(),
        ]
    }

    fn check_configuration(&self) -> HealthCheck {
        let status = match self.config.validate() {
            Ok(()) => HealthStatus::Pass,
            Err(e) => HealthStatus::Fail(e.to_string()),
        };
        HealthCheck::new("Configuration", status)
    }

    fn check_executable(&self) -> HealthCheck {
        let status = match resolve_program(&self.config.executable) {
            Some(path) if is_executable(&path) => HealthStatus::Pass,
            Some(path) => HealthStatus::Fail(format!("{} is not executable", path.display())),
            None => HealthStatus::Fail(format!(
                "cli-vision not found at {}{}",
                self.config.executable.display(),
                EXECUTABLE_HINT
            )),
        };
        HealthCheck::new("cli-vision", status)
    }

    /// Any HTTP response counts as reachable; only analysis needs it, so
    /// an unreachable endpoint is a warning.
    async fn check_vlm_endpoint(&self) -> HealthCheck {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        let status = match client.get(&self.config.vlm_endpoint).send().await {
            Ok(_) => HealthStatus::Pass,
            Err(e) => HealthStatus::Warn(format!(
                "{} unreachable, analyze=true calls will fail ({})",
                self.config.vlm_endpoint, e
            )),
        };
        HealthCheck::new("VLM endpoint", status)
    }

    fn check_scratch_dir(&self) -> HealthCheck {
        let marker = self
            .scratch_dir
            .join(format!(".cli_vision_mcp_write_check_{}", std::process::id()));
        let status = match std::fs::write(&marker, "ok") {
            Ok(()) => {
                let _ = std::fs::remove_file(&marker);
                HealthStatus::Pass
            }
            Err(e) => HealthStatus::Fail(format!(
                "cannot write to {}: {}",
                self.scratch_dir.display(),
                e
            )),
        };
        HealthCheck::new("Temp directory", status)
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n{}\n", "cli-vision-mcp diagnostics".bold());
        println!("{:<20} Status", "Check");
        println!("{}", "=".repeat(50));

        for check in checks {
            let message = match &check.status {
                HealthStatus::Pass => "PASS".green().to_string(),
                HealthStatus::Warn(msg) => format!("WARN: {}", msg).yellow().to_string(),
                HealthStatus::Fail(msg) => format!("FAIL: {}", msg).red().to_string(),
            };
            println!("{:<20} {}", check.name, message);
        }

        println!();
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_equality() {
        assert_eq!(HealthStatus::Pass, HealthStatus::Pass);
        assert_ne!(
            HealthStatus::Warn("test".to_string()),
            HealthStatus::Fail("test".to_string())
        );
    }

    #[test]
    fn test_overall_status() {
        let passing = vec![
            HealthCheck::new("a", HealthStatus::Pass),
            HealthCheck::new("b", HealthStatus::Warn("warning".to_string())),
        ];
        assert!(Doctor::overall_status(&passing));

        let failing = vec![
            HealthCheck::new("a", HealthStatus::Pass),
            HealthCheck::new("b", HealthStatus::Fail("error".to_string())),
        ];
        assert!(!Doctor::overall_status(&failing));
    }

    #[test]
    fn test_missing_executable_fails() {
        let doctor = Doctor::new(AdapterConfig::default().with_executable("/nonexistent/cli-vision"));
        let check = doctor.check_executable();
        match check.status {
            HealthStatus::Fail(msg) => assert!(msg.contains("CLI_VISION_PATH")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_present_executable_passes() {
        let doctor = Doctor::new(AdapterConfig::default().with_executable("/bin/sh"));
        assert_eq!(doctor.check_executable().status, HealthStatus::Pass);
    }

    #[test]
    fn test_scratch_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let doctor = Doctor::new(AdapterConfig::default()).with_scratch_dir(dir.path());
        assert_eq!(doctor.check_scratch_dir().status, HealthStatus::Pass);

        let doctor = Doctor::new(AdapterConfig::default()).with_scratch_dir("/nonexistent/dir");
        assert!(matches!(doctor.check_scratch_dir().status, HealthStatus::Fail(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_only_warns() {
        let config = AdapterConfig::default()
            .with_executable("/bin/sh")
            .with_vlm_endpoint("http://127.0.0.1:1/v1/chat/completions");
        let checks = Doctor::new(config).run_diagnostics().await;

        let endpoint = checks.iter().find(|c| c.name == "VLM endpoint").unwrap();
        assert!(matches!(endpoint.status, HealthStatus::Warn(_)));
        assert_eq!(checks.len(), 4);
    }
}
