use std::path::Path;

use anyhow::{Context, Result};
use colored::*;
use nfusion_common::config::Config;
use nfusion_common::policy::RiskPolicy;
use nfusion_common::success;
use nfusion_core::classifier::RiskClassifier;

use crate::terminal::print;

pub fn check_policy(path: &Path, cfg: &Config) -> Result<()> {
    let policy = RiskPolicy::from_file(path)?;
    let classifier = RiskClassifier::from_policy(&policy)
        .with_context(|| format!("Risk policy {} is invalid", path.display()))?;

    if cfg.quiet < 2 {
        let rows = [
            ("High-risk ports", policy.high_risk_ports.len()),
            ("Cipher patterns", policy.weak_cipher_patterns.len()),
            ("Version floors", policy.outdated_versions.len()),
            ("Signatures", policy.vulnerable_signatures.len()),
            ("Script flags", policy.script_flags.len()),
            ("Business functions", policy.business_ports.len()),
        ];
        print::set_key_width(rows.iter().map(|(k, _)| *k).chain(["CVE references", "Rules"]));
        for (key, count) in rows {
            print::aligned_line(key, count.to_string());
        }
        print::aligned_line(
            "CVE references",
            if policy.flag_script_cves { "on".green() } else { "off".bright_black() },
        );
        print::aligned_line("Rules", classifier.rule_names().join(", "));
    }

    success!("Policy {} is valid", path.display());
    Ok(())
}
