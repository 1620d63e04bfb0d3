use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use super::{PnlPage, ReportingPage};
use crate::fmt::{month_label, money, pct};
use crate::repository::{Notice, NoticeLevel};

fn right(text: impl Into<String>) -> Cell {
    Cell::new(text.into()).set_alignment(CellAlignment::Right)
}

fn notices_block(notices: &[Notice]) -> String {
    let mut out = String::new();
    for n in notices {
        let line = match n.level {
            NoticeLevel::Info => n.message.cyan().to_string(),
            NoticeLevel::Success => n.message.green().to_string(),
            NoticeLevel::Warning => format!("Warning: {}", n.message).yellow().to_string(),
            NoticeLevel::Error => format!("Error: {}", n.message).red().to_string(),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub fn reporting(page: &ReportingPage, title: &str) -> String {
    let mut out = format!("{}\n\n", title.bold());
    out.push_str(&notices_block(&page.notices));

    let a = &page.allocation;
    out.push_str(&format!("{}\n", "Budget Allocation".bold()));
    let mut budget = Table::new();
    budget.set_header(vec!["", "Amount", "Share"]);
    for s in &a.slices {
        budget.add_row(vec![Cell::new(s.label), right(money(s.amount)), right(pct(s.percent, 1))]);
    }
    out.push_str(&format!("{budget}\n"));
    out.push_str(&format!(
        "Budget: {}   Paid: {}   Unallocated: {}\n",
        money(a.budget),
        money(a.paid),
        money(a.unallocated)
    ));
    if a.overage {
        out.push_str(&format!(
            "{}\n",
            format!("Over budget by {}", money(a.paid - a.budget)).red().bold()
        ));
    }

    out.push_str(&format!("\n{}\n", "Badging Progress by Site".bold()));
    if page.sites.is_empty() {
        out.push_str("No badging data to summarize.\n");
    } else {
        let mut sites = Table::new();
        sites.set_header(vec!["Site", "Techs", "Badged", "Badged %", "Not Badged", "Not Badged %"]);
        for s in &page.sites {
            sites.add_row(vec![
                Cell::new(&s.site),
                right(s.total.to_string()),
                right(&s.badged_fraction),
                right(pct(s.badged_pct, 2)),
                right(&s.not_badged_fraction),
                right(pct(s.not_badged_pct, 2)),
            ]);
        }
        out.push_str(&format!("{sites}\n"));
    }

    let st = &page.statistics;
    out.push_str(&format!("\n{}\n", "Badging Statistics".bold()));
    let live = if st.live_sites.is_empty() {
        "none".to_string()
    } else {
        st.live_sites.join(", ")
    };
    out.push_str(&format!("Live sites (over 65% badged): {live}\n"));
    out.push_str(&format!("Badged technicians: {}\n", st.badged_techs));
    out.push_str(&format!("Pending technicians: {}\n", st.pending_techs));
    match st.percent_badged {
        Some(p) => out.push_str(&format!("Overall badged: {}\n", pct(p, 1))),
        None => out.push_str("Overall badged: n/a\n"),
    }
    out.trim_end().to_string()
}

pub fn pnl(page: &PnlPage) -> String {
    let mut out = format!("{}\n\n", "Live Dispatch PNL Report".bold());
    out.push_str(&notices_block(&page.notices));

    out.push_str(&format!("{}\n", "SLA Counts".bold()));
    let mut sla = Table::new();
    sla.set_header(vec!["SLA", "Dispatches"]);
    for (s, n) in &page.sla.known {
        sla.add_row(vec![Cell::new(s.label()), right(n.to_string())]);
    }
    sla.add_row(vec![Cell::new("Other"), right(page.sla.other.to_string())]);
    out.push_str(&format!("{sla}\n"));
    out.push_str(&format!("Total dispatches: {}\n", page.sla.total));

    if !page.sla.other_rows.is_empty() {
        out.push_str(&format!("\n{}\n", "Dispatches with other SLA values".bold()));
        let mut other = Table::new();
        other.set_header(vec!["ID", "Date", "Tech", "SLA", "Site"]);
        for t in &page.sla.other_rows {
            other.add_row(vec![
                Cell::new(t.id.map(|i| i.to_string()).unwrap_or_default()),
                Cell::new(t.date.map(|d| d.to_string()).unwrap_or_default()),
                Cell::new(&t.tech),
                Cell::new(&t.sla),
                Cell::new(&t.site),
            ]);
        }
        out.push_str(&format!("{other}\n"));
    }

    let Some(r) = page.rollup() else {
        out.push_str("\nNo dated dispatches available for monthly analysis.");
        return out;
    };
    out.push_str(&format!("\n{}\n", format!("Monthly Financials: {}", month_label(&r.month)).bold()));
    let mut fin = Table::new();
    fin.set_header(vec!["", "Total", "Per Ticket"]);
    fin.add_row(vec![Cell::new("FN Pay"), right(money(r.total_fn_pay)), right(money(r.avg_fn_pay))]);
    fin.add_row(vec![Cell::new("DXC Pay"), right(money(r.total_dxc_pay)), right(money(r.avg_dxc_pay))]);
    fin.add_row(vec![Cell::new("PNL"), right(money(r.total_pnl)), right(money(r.avg_pnl))]);
    out.push_str(&format!("{fin}\n"));
    out.push_str(&format!("Tickets: {}\n", r.tickets));

    for (heading, counts) in [("By SLA", &r.by_sla), ("By Site", &r.by_site)] {
        if counts.is_empty() {
            continue;
        }
        let mut t = Table::new();
        t.set_header(vec![heading, "Tickets"]);
        for (k, n) in counts {
            let label = if k.is_empty() { "(blank)" } else { k.as_str() };
            t.add_row(vec![Cell::new(label), right(n.to_string())]);
        }
        out.push_str(&format!("\n{t}\n"));
    }
    if page.months().len() > 1 {
        let others: Vec<String> = page.months().iter().map(|m| month_label(m)).collect();
        out.push_str(&format!("\nMonths on record: {}\n", others.join(", ")));
    }
    out.trim_end().to_string()
}
