use std::path::Path;

use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;

fn desk(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dispatch-desk").unwrap();
    cmd.env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn desk_with_store(home: &Path, server: &MockServer) -> Command {
    let mut cmd = desk(home);
    cmd.env("SUPABASE_URL", server.base_url())
        .env("SUPABASE_KEY", "test-key");
    cmd
}

#[test]
fn help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    desk(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("badging"))
        .stdout(predicate::str::contains("pnl"))
        .stdout(predicate::str::contains("demo"));
}

#[test]
fn no_command_without_terminal_prints_home() {
    let home = tempfile::tempdir().unwrap();
    desk(home.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("DXC-HPI Reporting Tool"))
        .stdout(predicate::str::contains("Badging Tickets"))
        .stdout(predicate::str::contains("PNL Report"));
}

#[test]
fn missing_credentials_is_a_config_error() {
    let home = tempfile::tempdir().unwrap();
    desk(home.path())
        .args(["badging", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error: Configuration error"))
        .stderr(predicate::str::contains("SUPABASE_URL"))
        .stderr(predicate::str::contains("SUPABASE_KEY"));
}

#[test]
fn badging_list_renders_rows() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/badging_dispatches")
            .query_param("order", "Date.asc")
            .header("apikey", "test-key");
        then.status(200).json_body(json!([
            {"id": 7, "Date": "2025-02-03", "Tech": "Ana", "Site": "North", "Hours": 4,
             "Additional": 250, "Base": 1000, "Total": 1250}
        ]));
    });
    desk_with_store(home.path(), &server)
        .args(["badging", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Pay ($)"))
        .stdout(predicate::str::contains("$1,250.00"))
        .stdout(predicate::str::contains("2025-02-03"))
        .stdout(predicate::str::contains("1 rows"));
    mock.assert();
}

#[test]
fn store_failure_is_shown_not_fatal() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/live_dispatches");
        then.status(500).json_body(json!({"message": "boom"}));
    });
    desk_with_store(home.path(), &server)
        .args(["live", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Error loading data from the store"))
        .stdout(predicate::str::contains("boom"));
}

#[test]
fn report_shows_budget_and_badging() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/badging_dispatches");
        then.status(200)
            .json_body(json!([{"Total": 30000}, {"Total": 10000}]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/names_and_sites");
        then.status(200).json_body(json!([
            {"Name": "Ana", "Site": "North", "Badge": "YES"},
            {"Name": "Bo", "Site": "North", "Badge": "y"},
            {"Name": "Cy", "Site": "North", "Badge": "no"},
            {"Name": "Di", "Site": "South", "Badge": "No"}
        ]));
    });
    desk_with_store(home.path(), &server)
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::contains("Budget Allocation"))
        .stdout(predicate::str::contains("Over budget by $5,000.00"))
        .stdout(predicate::str::contains("2/3"))
        .stdout(predicate::str::contains("66.67%"))
        .stdout(predicate::str::contains("Live sites (over 65% badged): North"));
}

#[test]
fn pnl_reports_latest_month_and_other_sla() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/live_dispatches");
        then.status(200).json_body(json!([
            {"id": 1, "Date": "2025-03-01", "SLA": "2 Hour", "Site": "North",
             "Total FN Pay": 100, "Total DXC Pay": 160, "PNL": 60},
            {"id": 2, "Date": "2025-04-02", "SLA": "Weekend", "Site": "North",
             "Total FN Pay": 50, "Total DXC Pay": 70, "PNL": 20},
            {"id": 3, "Date": "04/05/2025", "SLA": "4 Hour", "Site": "South",
             "Total FN Pay": 10, "Total DXC Pay": 10, "PNL": 0}
        ]));
    });
    desk_with_store(home.path(), &server)
        .arg("pnl")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 rows due to invalid 'Date' values."))
        .stdout(predicate::str::contains("Weekend"))
        .stdout(predicate::str::contains("Monthly Financials: Apr 2025"))
        .stdout(predicate::str::contains("$20.00"));

    desk_with_store(home.path(), &server)
        .args(["pnl", "--month", "2025-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Monthly Financials: Mar 2025"))
        .stdout(predicate::str::contains("$60.00"));
}

#[test]
fn pnl_rejects_malformed_month() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/live_dispatches");
        then.status(200).json_body(json!([]));
    });
    desk_with_store(home.path(), &server)
        .args(["pnl", "--month", "March"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("month must be YYYY-MM"));
}

#[test]
fn badging_edit_sends_only_the_changed_cell() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/badging_dispatches");
        then.status(200).json_body(json!([
            {"id": 3, "Date": "2025-02-03", "Tech": "Ana", "Site": "North", "Hours": 4,
             "Additional": 0, "Base": 100, "Total": 100}
        ]));
    });
    let patch = server.mock(|when, then| {
        when.method(httpmock::Method::PATCH)
            .path("/rest/v1/badging_dispatches")
            .query_param("id", "eq.3")
            .json_body(json!({"Hours": 6.0}));
        then.status(200).json_body(json!([{"id": 3, "Hours": 6.0}]));
    });
    desk_with_store(home.path(), &server)
        .args(["badging", "edit", "--id", "3", "--set", "Hours=6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Row with ID 3 updated successfully!"));
    patch.assert();
}

#[test]
fn live_edit_of_derived_column_fails() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/live_dispatches");
        then.status(200).json_body(json!([{"id": 9, "Date": "2025-01-01", "PNL": 5}]));
    });
    let patch = server.mock(|when, then| {
        when.method(httpmock::Method::PATCH).path("/rest/v1/live_dispatches");
        then.status(200).json_body(json!([]));
    });
    desk_with_store(home.path(), &server)
        .args(["live", "edit", "--id", "9", "--set", "PNL=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("computed by the store"));
    patch.assert_hits(0);
}

#[test]
fn badging_add_posts_total() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/names_and_sites");
        then.status(200)
            .json_body(json!([{"Name": "Ana", "Site": "North"}]));
    });
    let insert = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/badging_dispatches")
            .header("prefer", "return=representation")
            .body_contains(r#""Tech":"Ana""#)
            .body_contains(r#""Total":125.0"#);
        then.status(201).json_body(json!([{"id": 11}]));
    });
    desk_with_store(home.path(), &server)
        .args([
            "badging", "add", "--date", "2025-06-01", "--tech", "Ana", "--site", "North",
            "--base", "100", "--additional", "25",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("New ticket added successfully!"))
        .stdout(predicate::str::contains("id 11"));
    insert.assert();
}

#[test]
fn badging_add_without_echo_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/names_and_sites");
        then.status(200).json_body(json!([]));
    });
    let insert = server.mock(|when, then| {
        when.method(POST).path("/rest/v1/badging_dispatches");
        then.status(201).json_body(json!([]));
    });
    desk_with_store(home.path(), &server)
        .args(["badging", "add", "--base", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed to add new ticket"))
        .stdout(predicate::str::contains("did not echo back data"))
        .stdout(predicate::str::contains("added successfully").not());
    insert.assert();
}

#[test]
fn badging_edit_when_load_fails_shows_store_error() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/badging_dispatches");
        then.status(500).json_body(json!({"message": "db down"}));
    });
    let patch = server.mock(|when, then| {
        when.method(httpmock::Method::PATCH).path("/rest/v1/badging_dispatches");
        then.status(200).json_body(json!([]));
    });
    desk_with_store(home.path(), &server)
        .args(["badging", "edit", "--id", "3", "--set", "Hours=2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Error loading data from the store"))
        .stdout(predicate::str::contains("db down"))
        .stderr(predicate::str::contains("no row with id").not());
    patch.assert_hits(0);
}

#[test]
fn badging_edit_without_echo_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/badging_dispatches");
        then.status(200).json_body(json!([
            {"id": 3, "Date": "2025-02-03", "Tech": "Ana", "Site": "North", "Hours": 4,
             "Additional": 0, "Base": 100, "Total": 100}
        ]));
    });
    server.mock(|when, then| {
        when.method(httpmock::Method::PATCH)
            .path("/rest/v1/badging_dispatches")
            .query_param("id", "eq.3");
        then.status(200).json_body(json!([]));
    });
    desk_with_store(home.path(), &server)
        .args(["badging", "edit", "--id", "3", "--set", "Hours=6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed to update row 3"))
        .stdout(predicate::str::contains("updated successfully").not());
}

#[test]
fn init_then_status_reports_counts() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/badging_dispatches");
        then.status(200).json_body(json!([{"id": 1}, {"id": 2}]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/live_dispatches");
        then.status(200).json_body(json!([]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/names_and_sites");
        then.status(401).json_body(json!({"message": "bad key"}));
    });

    desk(home.path())
        .args(["init", "--url", &server.base_url(), "--key", "k", "--budget", "20000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved settings to"));
    assert!(home
        .path()
        .join(".config/dispatch-desk/settings.json")
        .exists());

    desk(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("API key:    set"))
        .stdout(predicate::str::contains("$20,000.00"))
        .stdout(predicate::str::contains("2 rows"))
        .stdout(predicate::str::contains("0 rows"))
        .stdout(predicate::str::contains("bad key"));
}

#[test]
fn demo_without_terminal_prints_reports() {
    let home = tempfile::tempdir().unwrap();
    desk(home.path())
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Budget Allocation"))
        .stdout(predicate::str::contains("SLA Counts"))
        .stdout(predicate::str::contains("Next Business Day"));
}
