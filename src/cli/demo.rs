use std::io::IsTerminal;

use chrono::{Datelike, Local, Months, NaiveDate};
use serde_json::{json, Value};

use crate::error::Result;
use crate::models::{RawRow, Sla};
use crate::repository::Repository;
use crate::schema::TicketTable;
use crate::settings::load_settings;
use crate::store::memory::MemoryStore;

use super::report::{text, PnlPage, ReportingPage};

struct DemoTech {
    name: &'static str,
    site: &'static str,
    badged: &'static str,
}

/// Badge flags are deliberately messy: the reports normalize case and Y/N.
const TECHS: &[DemoTech] = &[
    DemoTech { name: "Alex Moreno", site: "Austin", badged: "YES" },
    DemoTech { name: "Bea Lindqvist", site: "Austin", badged: "yes" },
    DemoTech { name: "Carlos Ruiz", site: "Austin", badged: "NO" },
    DemoTech { name: "Dana Okafor", site: "Denver", badged: "Y" },
    DemoTech { name: "Eli Novak", site: "Denver", badged: "N" },
    DemoTech { name: "Farah Haddad", site: "Denver", badged: "no" },
    DemoTech { name: "Gus Petrov", site: "Raleigh", badged: "YES" },
    DemoTech { name: "Hana Ito", site: "Raleigh", badged: "YES" },
    DemoTech { name: "Ivan Cole", site: "Raleigh", badged: "pending" },
];

/// Per-SLA base pay to the technician and hourly rate billed to the client.
fn sla_rates(sla: Sla) -> (f64, f64) {
    match sla {
        Sla::TwoHour => (95.0, 140.0),
        Sla::FourHour => (85.0, 120.0),
        Sla::TwoDay => (70.0, 95.0),
        Sla::FourDay => (60.0, 80.0),
    }
}

fn obj(v: Value) -> RawRow {
    match v {
        Value::Object(map) => map,
        _ => RawRow::new(),
    }
}

fn months_back(today: NaiveDate, n: u32, day: u32) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    let month = first.checked_sub_months(Months::new(n)).unwrap_or(first);
    month.with_day(day).unwrap_or(month)
}

fn directory_rows() -> Vec<RawRow> {
    TECHS
        .iter()
        .map(|t| obj(json!({"Name": t.name, "Site": t.site, "Badge": t.badged})))
        .collect()
}

fn badging_rows(today: NaiveDate) -> Vec<RawRow> {
    let mut rows = Vec::new();
    for (i, t) in TECHS.iter().enumerate() {
        let date = months_back(today, (i % 3) as u32, 3 + i as u32 * 2);
        let base = 450.0 + (i % 4) as f64 * 50.0;
        let additional = if i % 3 == 0 { 75.0 } else { 0.0 };
        rows.push(obj(json!({
            "id": i as i64 + 1,
            "Date": date.to_string(),
            "Tech": t.name,
            "Site": t.site,
            "Hours": 4.0 + (i % 3) as f64,
            "Additional": additional,
            "Base": base,
            "Total": base + additional,
        })));
    }
    rows
}

/// Live dispatches carry the columns the store's triggers would have filled in.
fn live_rows(today: NaiveDate) -> Vec<RawRow> {
    let mut rows = Vec::new();
    let mut id = 100;
    for month in 0..4u32 {
        for (i, t) in TECHS.iter().enumerate().filter(|(i, _)| (i + month as usize) % 2 == 0) {
            let sla = Sla::ALL[(i + month as usize) % Sla::ALL.len()];
            let (base, dxc_rate) = sla_rates(sla);
            let hours = 1.25 + (i % 4) as f64 * 0.75;
            let rounded = (hours * 2.0).ceil() / 2.0;
            let additional = if i % 4 == 1 { 40.0 } else { 0.0 };
            let fn_pay = base + additional;
            let dxc_pay = dxc_rate * rounded;
            id += 1;
            rows.push(obj(json!({
                "id": id,
                "Date": months_back(today, month, 2 + i as u32 * 3).to_string(),
                "Tech": t.name,
                "SLA": sla.label(),
                "Site": t.site,
                "Hours": hours,
                "Rounded Hours": rounded,
                "Additional": additional,
                "Base": base,
                "DXC Rate": dxc_rate,
                "Total FN Pay": fn_pay,
                "Total DXC Pay": dxc_pay,
                "PNL": dxc_pay - fn_pay,
            })));
        }
    }
    rows.push(obj(json!({
        "id": id + 1,
        "Date": months_back(today, 0, 1).to_string(),
        "Tech": "Gus Petrov",
        "SLA": "Next Business Day",
        "Site": "Raleigh",
        "Hours": 2.0,
        "Rounded Hours": 2.0,
        "Additional": 0.0,
        "Base": 70.0,
        "DXC Rate": 90.0,
        "Total FN Pay": 70.0,
        "Total DXC Pay": 180.0,
        "PNL": 110.0,
    })));
    rows
}

/// In-memory store seeded with sample technicians and tickets dated around `today`.
pub fn demo_store(today: NaiveDate) -> MemoryStore {
    let store = MemoryStore::new();
    store.seed(TicketTable::Directory, directory_rows());
    store.seed(TicketTable::Badging, badging_rows(today));
    store.seed(TicketTable::Live, live_rows(today));
    store
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let mut repo = Repository::new(demo_store(Local::now().date_naive()));
    if std::io::stdout().is_terminal() {
        return super::dashboard::run_with(repo, settings);
    }
    println!("{}\n", super::dashboard::home_text(&settings));
    println!(
        "{}\n",
        text::reporting(&ReportingPage::load(&mut repo, settings.startup_budget), &settings.title)
    );
    println!("{}", text::pnl(&PnlPage::load(&mut repo)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::sla_counts;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
    }

    #[test]
    fn test_demo_data_loads_without_warnings() {
        let mut repo = Repository::new(demo_store(today()));
        let badging = repo.load_badging();
        assert!(badging.notices.is_empty(), "{:?}", badging.notices);
        assert_eq!(badging.data.len(), TECHS.len());
        let live = repo.load_live();
        assert!(live.notices.is_empty(), "{:?}", live.notices);
        let pnl = repo.load_pnl_tickets();
        assert!(pnl.notices.is_empty(), "{:?}", pnl.notices);
        assert_eq!(sla_counts(&pnl.data).other, 1);
    }

    #[test]
    fn test_demo_reporting_page() {
        let mut repo = Repository::new(demo_store(today()));
        let page = ReportingPage::load(&mut repo, 35_000.0);
        // "pending" is not a badge flag, so Raleigh counts two technicians.
        let raleigh = page.sites.iter().find(|s| s.site == "Raleigh").unwrap();
        assert_eq!(raleigh.badged_fraction, "2/2");
        assert_eq!(page.statistics.live_sites, ["Austin", "Raleigh"]);
        assert!(!page.allocation.overage);
    }

    #[test]
    fn test_demo_pnl_spans_months() {
        let mut repo = Repository::new(demo_store(today()));
        let page = PnlPage::load(&mut repo);
        assert_eq!(page.months().len(), 4);
        assert_eq!(page.month(), Some("2025-03"));
    }

    #[test]
    fn test_months_back_clamps_day() {
        let d = months_back(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(), 1, 31);
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    }
}
