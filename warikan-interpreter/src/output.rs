use std::fmt::Write as _;

use serde::Serialize;
use warikan_domain::{MemberBalances, SettlementReport, Transfer};

#[derive(Serialize)]
struct ReportJson<'r, 'a> {
    balances: &'r MemberBalances<'a>,
    transfers: &'r [Transfer<'a>],
    residuals: MemberBalances<'r>,
}

pub fn render_text(report: &SettlementReport<'_>) -> String {
    let mut out = String::new();

    for (member, balance) in &report.balances {
        let _ = writeln!(out, "{member}: {balance}");
    }

    out.push('\n');
    for transfer in &report.settlement.transfers {
        let _ = writeln!(out, "{} -> {}: {}", transfer.from, transfer.to, transfer.amount);
    }

    for (member, balance) in report.settlement.residuals() {
        let _ = writeln!(out, "residual {member}: {balance}");
    }

    out.truncate(out.trim_end().len());
    out
}

pub fn render_json(report: &SettlementReport<'_>) -> serde_json::Result<String> {
    let json = ReportJson {
        balances: &report.balances,
        transfers: &report.settlement.transfers,
        residuals: report.settlement.residuals().collect(),
    };
    serde_json::to_string_pretty(&json)
}
