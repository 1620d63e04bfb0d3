use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::models::{BadgeStatus, DirectoryEntry, LiveDispatchTicket, Sla};

/// Sites above this badged percentage count as live.
pub const LIVE_SITE_THRESHOLD: f64 = 65.0;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn ratio_pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn average(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

// ---------------------------------------------------------------------------
// Budget allocation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: &'static str,
    pub amount: f64,
    /// Share of the chart total, 0-100.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetAllocation {
    pub budget: f64,
    pub paid: f64,
    pub unallocated: f64,
    /// Paid exceeds the budget; unallocated is clamped to zero.
    pub overage: bool,
    pub slices: Vec<Slice>,
}

pub fn budget_allocation(totals: &[f64], budget: f64) -> BudgetAllocation {
    let paid: f64 = totals.iter().sum();
    let remaining = budget - paid;
    let overage = remaining < 0.0;
    let unallocated = remaining.max(0.0);

    let mut parts: Vec<(&'static str, f64)> = [("Spent", paid), ("Unallocated Funds", unallocated)]
        .into_iter()
        .filter(|(_, v)| *v > 0.0)
        .collect();
    if parts.is_empty() {
        parts = if budget > 0.0 {
            vec![("Unallocated Funds", budget)]
        } else {
            vec![("No Budget Set", 1.0)]
        };
    }
    let chart_total: f64 = parts.iter().map(|(_, v)| v).sum();
    let slices = parts
        .into_iter()
        .map(|(label, amount)| Slice {
            label,
            amount,
            percent: if chart_total > 0.0 { amount / chart_total * 100.0 } else { 0.0 },
        })
        .collect();

    BudgetAllocation {
        budget,
        paid,
        unallocated,
        overage,
        slices,
    }
}

// ---------------------------------------------------------------------------
// Badging by site
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SiteBadging {
    pub site: String,
    pub total: usize,
    pub badged: usize,
    pub not_badged: usize,
    pub badged_fraction: String,
    pub badged_pct: f64,
    pub not_badged_fraction: String,
    pub not_badged_pct: f64,
}

impl SiteBadging {
    fn new(site: String, badged: usize, not_badged: usize) -> Self {
        let total = badged + not_badged;
        let fraction = |k: usize| {
            if total == 0 {
                "0/0".to_string()
            } else {
                format!("{k}/{total}")
            }
        };
        Self {
            badged_fraction: fraction(badged),
            not_badged_fraction: fraction(not_badged),
            badged_pct: round2(ratio_pct(badged, total)),
            not_badged_pct: round2(ratio_pct(not_badged, total)),
            site,
            total,
            badged,
            not_badged,
        }
    }
}

/// Per-site counts, sorted by site name.
pub fn badging_by_site(entries: &[DirectoryEntry]) -> Vec<SiteBadging> {
    let mut by_site: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for e in entries {
        let counts = by_site.entry(e.site.as_str()).or_default();
        match e.badge {
            BadgeStatus::Yes => counts.0 += 1,
            BadgeStatus::No => counts.1 += 1,
        }
    }
    by_site
        .into_iter()
        .map(|(site, (yes, no))| SiteBadging::new(site.to_string(), yes, no))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct BadgingStatistics {
    pub live_sites: Vec<String>,
    pub badged_techs: usize,
    pub pending_techs: usize,
    /// `None` when there are no technicians.
    pub percent_badged: Option<f64>,
}

/// Live sites are judged on the rounded badged percentage.
pub fn badging_statistics(entries: &[DirectoryEntry], sites: &[SiteBadging]) -> BadgingStatistics {
    let live_sites = sites
        .iter()
        .filter(|s| s.badged_pct > LIVE_SITE_THRESHOLD)
        .map(|s| s.site.clone())
        .collect();
    let names = |status: BadgeStatus| {
        entries
            .iter()
            .filter(|e| e.badge == status)
            .map(|e| e.name.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    };
    let badged_techs = names(BadgeStatus::Yes);
    let pending_techs = names(BadgeStatus::No);
    let all = badged_techs + pending_techs;
    BadgingStatistics {
        live_sites,
        badged_techs,
        pending_techs,
        percent_badged: (all > 0).then(|| ratio_pct(badged_techs, all)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BadgingBar {
    pub site: String,
    pub badged: usize,
    pub not_badged: usize,
}

pub fn badging_chart(sites: &[SiteBadging]) -> Vec<BadgingBar> {
    sites
        .iter()
        .map(|s| BadgingBar {
            site: s.site.clone(),
            badged: s.badged,
            not_badged: s.not_badged,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SLA counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SlaCounts {
    pub total: usize,
    pub known: Vec<(Sla, usize)>,
    pub other: usize,
    /// Tickets carrying a non-blank SLA outside the known set.
    pub other_rows: Vec<LiveDispatchTicket>,
}

pub fn sla_counts(tickets: &[LiveDispatchTicket]) -> SlaCounts {
    let known = Sla::ALL
        .iter()
        .map(|sla| (*sla, tickets.iter().filter(|t| t.known_sla() == Some(*sla)).count()))
        .collect();
    let other_rows: Vec<LiveDispatchTicket> = tickets
        .iter()
        .filter(|t| t.known_sla().is_none() && !t.sla.trim().is_empty())
        .cloned()
        .collect();
    SlaCounts {
        total: tickets.len(),
        known,
        other: other_rows.len(),
        other_rows,
    }
}

// ---------------------------------------------------------------------------
// Monthly financials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRollup {
    pub month: String,
    pub tickets: usize,
    pub total_fn_pay: f64,
    pub total_dxc_pay: f64,
    pub total_pnl: f64,
    pub avg_fn_pay: f64,
    pub avg_dxc_pay: f64,
    pub avg_pnl: f64,
    pub by_sla: Vec<(String, usize)>,
    pub by_site: Vec<(String, usize)>,
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Live dispatches bucketed by `YYYY-MM`. Undated tickets are ignored.
pub struct MonthlyLedger<'a> {
    months: BTreeMap<String, Vec<&'a LiveDispatchTicket>>,
}

impl<'a> MonthlyLedger<'a> {
    pub fn new(tickets: &'a [LiveDispatchTicket]) -> Self {
        let mut months: BTreeMap<String, Vec<&LiveDispatchTicket>> = BTreeMap::new();
        for t in tickets {
            if let Some(d) = t.date {
                months.entry(month_key(d)).or_default().push(t);
            }
        }
        Self { months }
    }

    /// Newest first.
    pub fn months(&self) -> Vec<&str> {
        self.months.keys().rev().map(String::as_str).collect()
    }

    pub fn latest(&self) -> Option<&str> {
        self.months.keys().next_back().map(String::as_str)
    }

    /// Rollup for `month`; an unknown month yields zero tickets.
    pub fn rollup(&self, month: &str) -> MonthlyRollup {
        let rows = self.months.get(month).map(Vec::as_slice).unwrap_or(&[]);
        let tickets = rows.len();
        let total_fn_pay: f64 = rows.iter().map(|t| t.total_fn_pay).sum();
        let total_dxc_pay: f64 = rows.iter().map(|t| t.total_dxc_pay).sum();
        let total_pnl: f64 = rows.iter().map(|t| t.pnl).sum();

        let count_by = |key: fn(&LiveDispatchTicket) -> &str| {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for t in rows {
                *counts.entry(key(t).to_string()).or_default() += 1;
            }
            counts.into_iter().collect::<Vec<_>>()
        };

        MonthlyRollup {
            month: month.to_string(),
            tickets,
            total_fn_pay,
            total_dxc_pay,
            total_pnl,
            avg_fn_pay: average(total_fn_pay, tickets),
            avg_dxc_pay: average(total_dxc_pay, tickets),
            avg_pnl: average(total_pnl, tickets),
            by_sla: count_by(|t| t.sla.as_str()),
            by_site: count_by(|t| t.site.as_str()),
        }
    }
}
