use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use team_stats_terminal::config::AppConfig;
use team_stats_terminal::export::export_stats;
use team_stats_terminal::metrics::{lookup_player, player_profile, team_summary};
use team_stats_terminal::pipeline;
use team_stats_terminal::registry::load_registry;
use team_stats_terminal::sheets_fetch::source_from_config;

fn main() -> Result<()> {
    let config = AppConfig::from_env();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let registry = load_registry(&config.registry_file, &config.default_range)?;
    let label = match arg_value("--sheet") {
        Some(label) => label,
        None => registry
            .labels()
            .first()
            .map(|l| l.to_string())
            .ok_or_else(|| anyhow!("no sheets in {}", config.registry_file.display()))?,
    };

    let source = source_from_config(&config)?;
    let loaded = pipeline::load_sheet(source.as_ref(), &registry, &label)
        .with_context(|| format!("load sheet {label}"))?;
    let table = &loaded.table;

    println!("Sheet: {} ({})", loaded.label, loaded.sheet.range);
    println!("Players: {}", table.row_count());
    if !loaded.report.missing.is_empty() {
        println!("Missing columns: {}", loaded.report.missing.join(", "));
    }

    if let Some(name) = arg_value("--player") {
        let record = lookup_player(table, &name)?;
        let profile = player_profile(&record);
        println!();
        println!("{}", profile.name);
        println!("  Goals {}  Assists {}", profile.goals, profile.assists);
        println!(
            "  Shots {} ({} on / {} off)  Accuracy {:.1}%",
            profile.shooting.total,
            profile.shooting.on_target,
            profile.shooting.off_target,
            profile.shooting.accuracy
        );
        println!(
            "  Key passes {}  Dribbles {}",
            profile.key_passes, profile.dribbles
        );
        for (category, value) in &profile.radar {
            println!("  {category}: {value}");
        }
    }

    let summary = team_summary(table);
    println!();
    println!("Team goals {}  assists {}", summary.goals, summary.assists);
    println!(
        "Team shots {}  accuracy {:.1}%",
        summary.shooting.total, summary.shooting.accuracy
    );
    println!(
        "Key passes {}  dribbles {}",
        summary.key_passes, summary.dribbles
    );
    println!(
        "Tackles won {}  fouls committed {}  fouls won {}",
        summary.tackles_won, summary.fouls_committed, summary.fouls_won
    );
    println!(
        "Clearances/saves {}  ball lost {}  failed passes {}  crosses {}",
        summary.clearances_saves, summary.ball_lost, summary.failed_passes, summary.crosses_to_box
    );

    println!();
    println!("Top goalscorers:");
    for p in &summary.top_scorers {
        println!("  {:<24} {}", p.name, p.value);
    }
    println!("Top assisters:");
    for p in &summary.top_assisters {
        println!("  {:<24} {}", p.name, p.value);
    }

    if let Some(path) = arg_value("--export").map(PathBuf::from) {
        let report = export_stats(&path, table)?;
        println!();
        println!(
            "Exported {} players x {} columns to {}",
            report.players,
            report.columns,
            path.display()
        );
    }

    Ok(())
}

fn arg_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
