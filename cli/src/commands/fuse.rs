use anyhow::{Context, Result, bail};
use colored::*;
use nfusion_common::config::Config;
use nfusion_common::model::{FindingSet, Severity};
use nfusion_common::policy::RiskPolicy;
use nfusion_common::success;
use nfusion_core::pipeline::{self, Analysis};
use nfusion_core::views::{
    HostDetail, HostSummary, PortDistribution, ServiceExposure, SubnetSummary, Views,
};
use tracing::{error, info, warn};

use crate::commands::{FuseArgs, View};
use crate::export::{self, Report};
use crate::input;
use crate::terminal::{colors, format, print};

pub fn fuse(args: FuseArgs, cfg: &Config) -> Result<()> {
    let policy = match &args.policy {
        Some(path) => RiskPolicy::from_file(path)
            .with_context(|| format!("Could not load risk policy {}", path.display()))?,
        None => {
            info!("No risk policy given, only merge ambiguities will be reported");
            RiskPolicy::default()
        }
    };

    let scans = input::load_scans(&args.inputs)?;
    info!("Loaded {} scan files", scans.len());

    let analysis = pipeline::analyze(&scans, &policy, cfg);

    if analysis.dataset.is_empty() {
        print::no_results();
    } else if cfg.quiet < 2 {
        render(&args, &analysis, cfg);
    }

    if let Some(path) = &args.json {
        export::write_json(&Report::new(&analysis), path)?;
        success!("Report written to {}", path.display());
    }

    let summary = match &analysis.findings {
        Ok(findings) => findings.summary(),
        Err(e) => {
            error!("Classification failed: {e}");
            bail!("risk policy rejected; fused tables were still produced");
        }
    };

    success!(
        "{} hosts fused from {} files: {} critical, {} high, {} medium, {} low",
        analysis.dataset.len(),
        analysis.stats.files_processed,
        summary.critical,
        summary.high,
        summary.medium,
        summary.low
    );
    Ok(())
}

fn render(args: &FuseArgs, analysis: &Analysis, cfg: &Config) {
    let views = analysis.views();
    let empty = FindingSet::new();
    let findings = analysis.findings.as_ref().unwrap_or(&empty);

    render_stats(analysis);

    if args.shows(View::Summary) {
        print::header("host summary", cfg.quiet);
        render_summary(&views.summary);
    }
    if args.shows(View::Detail) {
        print::header("host detail", cfg.quiet);
        render_detail(&views.detail);
    }
    if args.shows(View::Ports) {
        print::header("port distribution", cfg.quiet);
        render_distribution(&views.port_distribution);
    }
    if args.shows(View::Services) {
        print::header("service exposure", cfg.quiet);
        render_exposure(&views.service_exposure);
    }
    if args.shows(View::Subnets) {
        print::header("subnets", cfg.quiet);
        render_subnets(&views.subnets);
    }
    if args.shows(View::Findings) {
        print::header("findings", cfg.quiet);
        render_findings(findings, &views);
    }
}

fn render_stats(analysis: &Analysis) {
    let stats = &analysis.stats;
    let rows = [
        ("Files", stats.files_processed),
        ("Input hosts", stats.input_hosts),
        ("Unique IPs", stats.unique_ips),
        ("Input ports", stats.input_ports),
        ("Fused ports", stats.fused_ports),
        ("Duplicates", stats.duplicate_ports_removed),
        ("Scripts", stats.scripts),
        ("Skipped", stats.skipped_records),
    ];
    print::set_key_width(rows.iter().map(|(k, _)| *k));
    for (key, value) in rows {
        print::aligned_line(key, value.to_string());
    }
    for skipped in &analysis.skipped {
        warn!("{skipped}");
    }
}

fn render_summary(rows: &[HostSummary]) {
    for (idx, row) in rows.iter().enumerate() {
        let name = match row.hostnames.first() {
            Some(hostname) => format!("{} ({})", row.ip, hostname),
            None => row.ip.to_string(),
        };
        print::tree_head(idx, &name);
        print::as_tree_one_level(vec![
            ("status".to_string(), row.status.as_str().normal()),
            ("os".to_string(), row.os.normal()),
            ("subnet".to_string(), row.subnet.color(colors::SEPARATOR)),
            (
                "ports".to_string(),
                format!(
                    "{} open / {} total ({} tcp, {} udp)",
                    row.open_ports, row.total_ports, row.tcp_ports, row.udp_ports
                )
                .normal(),
            ),
            ("services".to_string(), format::list(&row.services)),
            (
                "risk".to_string(),
                format!(
                    "{} (score {:.1}, {} findings)",
                    format::severity(row.risk_level),
                    row.risk_score,
                    row.finding_count
                )
                .normal(),
            ),
        ]);
    }
}

fn render_detail(rows: &[HostDetail]) {
    for (idx, host) in rows.iter().enumerate() {
        print::tree_head(idx, &format::ip(&host.ip).to_string());
        let os = match &host.os {
            Some(os) => format!("{} ({}%)", os.name, os.accuracy),
            None => "unknown".to_string(),
        };
        let os_alternatives: Vec<String> = host
            .os_alternatives
            .iter()
            .map(|os| format!("{} ({}%)", os.name, os.accuracy))
            .collect();
        print::as_tree_one_level(vec![
            ("hostnames".to_string(), format::list(&host.hostnames)),
            ("os".to_string(), os.normal()),
            ("os alt".to_string(), format::list(&os_alternatives)),
            ("sources".to_string(), format::list(&host.sources)),
        ]);

        for (i, port) in host.ports.iter().enumerate() {
            let service = &port.service;
            let line = format!(
                "{}/{} {} {} {} {}",
                port.port.to_string().color(colors::ACCENT),
                port.protocol,
                format::state(port.state),
                format!("[{}]", port.business_function).bright_black(),
                service.name,
                service.banner()
            );
            print::tree_leaf(i + 1 == host.ports.len(), line.trim_end());

            for alt in &service.alternatives {
                print::print_status(format!(
                    "      also seen {} '{}'",
                    alt.field,
                    alt.value.bright_black()
                ));
            }
            for script in &port.scripts {
                print::print_status(format!(
                    "      {}: {}",
                    script.id.color(colors::HOSTNAME),
                    format::truncate(&script.output, 60)
                ));
            }
        }
        for script in &host.scripts {
            print::print_status(format!(
                "{}: {}",
                script.id.color(colors::HOSTNAME),
                format::truncate(&script.output, 60)
            ));
        }
    }
}

fn render_distribution(rows: &[PortDistribution]) {
    for row in rows {
        let hosts: Vec<String> = row.hosts.iter().map(ToString::to_string).collect();
        print::print_status(format!(
            "{:>5}/{:<3} {:>3} hosts, {:>3} open  {:<12} {}",
            row.port,
            row.protocol,
            row.occurrences,
            row.open,
            row.common_service.as_deref().unwrap_or("unknown"),
            format::truncate(&hosts.join(", "), 40).bright_black()
        ));
    }
}

fn render_exposure(rows: &[ServiceExposure]) {
    for (idx, row) in rows.iter().enumerate() {
        print::tree_head(idx, &format!("{} ({} hosts)", row.service, row.host_count));
        for (i, host) in row.hosts.iter().enumerate() {
            let ports: Vec<String> = host
                .ports
                .iter()
                .map(|p| format!("{} [{}]", p.key, p.business_function))
                .collect();
            print::tree_leaf(
                i + 1 == row.hosts.len(),
                &format!("{} {}", format::ip(&host.ip), ports.join(", ").bright_black()),
            );
        }
    }
}

fn render_subnets(rows: &[SubnetSummary]) {
    for row in rows {
        print::print_status(format!(
            "{:<20} {:>3} hosts  {} - {}  {:>3} open  {}",
            row.subnet,
            row.host_count,
            row.first,
            row.last,
            row.open_ports,
            format::optional_severity(row.top_severity)
        ));
    }
}

fn render_findings(findings: &FindingSet, views: &Views) {
    if findings.is_empty() {
        print::centerln(&"no findings".bright_black().to_string());
        return;
    }

    // Most severe first; FindingSet itself is ordered by target.
    let mut ordered: Vec<_> = findings.iter().collect();
    ordered.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.cmp(b)));

    for finding in ordered {
        print::print_status(format!(
            "{:<8} {:<22} {:<18} {}",
            format::severity(finding.severity),
            finding.target.to_string(),
            finding.kind.as_str().color(colors::ACCENT),
            finding.detail
        ));
    }

    let hosts_at_risk = views
        .summary
        .iter()
        .filter(|row| row.top_severity >= Some(Severity::High))
        .count();
    print::aligned_line("Hosts at high risk or above", hosts_at_risk.to_string());
}
