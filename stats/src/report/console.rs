use crate::{
    pipeline::RunReport,
    units::format_power,
};
use comfy_table::{
    CellAlignment,
    presets,
    Attribute,
    Cell,
    Color,
    ContentArrangement,
    Table,
};

const ACCOUNTS_SHOWN: usize = 10;

/// Terminal overview of a finished run.
pub fn render(report: &RunReport) -> String {
    let mut output = String::new();

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new(format!("🌌 MILKY WAY {}", report.mode.to_string().to_uppercase()))
            .add_attribute(Attribute::Bold)
            .fg(Color::Cyan)]);

    let totals = &report.totals;
    let mut rows = vec![
        ("Players", totals.total_players.to_string()),
        ("Power", format_power(totals.total_power)),
        ("Sails launched", totals.total_sails.to_string()),
        ("Dyson spheres", totals.total_dyson_spheres.to_string()),
        ("Clusters", report.clusters.len().to_string()),
        ("Pages fetched", report.pages_fetched.to_string()),
        (
            "Elapsed",
            format!("{:.1}s", report.elapsed().num_milliseconds() as f64 / 1000.0),
        ),
    ];
    if let Some(seed) = report.seed {
        rows.insert(0, ("Seed", seed.to_string()));
    }
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    if report.duplicates_dropped > 0 {
        table.add_row(vec![
            Cell::new("Duplicates dropped").add_attribute(Attribute::Bold),
            Cell::new(report.duplicates_dropped.to_string()).fg(Color::Yellow),
        ]);
    }
    output.push_str(&format!("{table}\n"));

    if !report.leaderboard.is_empty() {
        let mut board = Table::new();
        board
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new(format!("🏆 TOP {}", report.leaderboard.len()))
                    .add_attribute(Attribute::Bold)
                    .fg(Color::Cyan),
                Cell::new("Seed").add_attribute(Attribute::Bold),
                Cell::new("Account").add_attribute(Attribute::Bold),
                Cell::new("Platform").add_attribute(Attribute::Bold),
                Cell::new("Power").add_attribute(Attribute::Bold),
            ]);
        for (rank, row) in report.leaderboard.iter().enumerate() {
            let account = Cell::new(&row.player.account_name);
            board.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(row.cluster.seed),
                if row.player.anonymous {
                    account.fg(Color::DarkGrey)
                } else {
                    account
                },
                Cell::new(row.player.platform),
                Cell::new(format_power(row.player.power)).fg(Color::Green),
            ]);
        }
        output.push_str(&format!("{board}\n"));
    }

    if !report.accounts.is_empty() {
        let mut accounts = Table::new();
        accounts
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new(format!("👤 TOP {} OF {}", report.accounts.len().min(ACCOUNTS_SHOWN), report.accounts.len()))
                    .add_attribute(Attribute::Bold)
                    .fg(Color::Cyan),
                Cell::new("Names").add_attribute(Attribute::Bold),
                Cell::new("Clusters").add_attribute(Attribute::Bold),
                Cell::new("Power").add_attribute(Attribute::Bold),
            ]);
        for (rank, account) in report.accounts.iter().take(ACCOUNTS_SHOWN).enumerate() {
            accounts.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(account.account_names.join(" / ")),
                Cell::new(account.cluster_count).set_alignment(CellAlignment::Right),
                Cell::new(format_power(account.power)).fg(Color::Green),
            ]);
        }
        output.push_str(&format!("{accounts}\n"));
    }

    if !report.artifacts.is_empty() {
        output.push_str("Artifacts:\n");
        for path in &report.artifacts {
            output.push_str(&format!("  {}\n", path.display()));
        }
    }

    output
}
