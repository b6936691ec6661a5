use goldleaf_core::config::{AppConfig, LoadOptions};
use goldleaf_core::{Catalog, JsonFileCatalog};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { 1 } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match JsonFileCatalog::new(&config.catalog.path).try_load() {
                Ok(catalog) => {
                    checks.push(DoctorCheck {
                        name: "catalog_load",
                        status: CheckStatus::Pass,
                        details: format!(
                            "loaded {} products from `{}`",
                            catalog.len(),
                            config.catalog.path.display()
                        ),
                    });
                    checks.push(check_catalog_hygiene(&catalog));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "catalog_load",
                        status: CheckStatus::Fail,
                        details: format!("{error}; the API would serve an empty catalog"),
                    });
                    checks.push(skipped("catalog_hygiene", "catalog did not load"));
                }
            }
            checks.push(check_gold_credential(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("catalog_load", "configuration did not load"));
            checks.push(skipped("catalog_hygiene", "configuration did not load"));
            checks.push(skipped("gold_price_credential", "configuration did not load"));
        }
    }

    let any_fail = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let any_warn = checks.iter().any(|check| check.status == CheckStatus::Warn);
    let (overall_status, summary) = if any_fail {
        (CheckStatus::Fail, "doctor: one or more readiness checks failed")
    } else if any_warn {
        (CheckStatus::Warn, "doctor: ready with warnings")
    } else {
        (CheckStatus::Pass, "doctor: all readiness checks passed")
    };

    DoctorReport { overall_status, summary: summary.to_string(), checks }
}

fn check_catalog_hygiene(catalog: &Catalog) -> DoctorCheck {
    let findings: Vec<String> = catalog
        .products()
        .iter()
        .enumerate()
        .flat_map(|(index, record)| {
            record
                .validate()
                .into_iter()
                .map(move |issue| format!("#{index} `{}`: {issue}", record.name))
        })
        .collect();

    if findings.is_empty() {
        DoctorCheck {
            name: "catalog_hygiene",
            status: CheckStatus::Pass,
            details: "every record has a name, positive weight, in-range popularity, and three images"
                .to_string(),
        }
    } else {
        DoctorCheck {
            name: "catalog_hygiene",
            status: CheckStatus::Warn,
            details: findings.join("; "),
        }
    }
}

fn check_gold_credential(config: &AppConfig) -> DoctorCheck {
    if config.gold.has_api_key() {
        DoctorCheck {
            name: "gold_price_credential",
            status: CheckStatus::Pass,
            details: format!("credential configured for `{}`", config.gold.base_url),
        }
    } else {
        DoctorCheck {
            name: "gold_price_credential",
            status: CheckStatus::Warn,
            details: format!(
                "no credential configured; prices will use the fallback of {} per gram",
                config.gold.fallback_price_per_gram
            ),
        }
    }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
