use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};
use textplots::Plot;

use crate::fetch::FetchSummary;
use crate::import::ImportResult;
use lotto_analysis::frequency::FrequencyTable;
use lotto_analysis::patterns::PatternReport;
use lotto_db::models::{Combination, Draw};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Tirage", "Date", "Numéros", "Complémentaire"]);
    for draw in draws {
        table.add_row(vec![
            draw.draw_no.to_string(),
            draw.date.to_string(),
            draw.numbers.to_string(),
            format!("{:2}", draw.bonus),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_fetch_summary(summary: &FetchSummary) {
    println!("Récupération terminée :");
    println!("  Nouveaux tirages : {}", summary.inserted);
    match summary.latest {
        Some(n) => println!("  Dernier tirage   : n°{}", n),
        None => println!("  Dernier tirage   : —"),
    }
    if !summary.skipped.is_empty() {
        let skipped = summary.skipped.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ");
        println!("  Ignorés          : {}", skipped);
    }
}

pub fn display_frequency(table: &FrequencyTable, draw_count: usize) {
    println!("\n📊 Fréquences sur {} tirages\n", draw_count);

    let max = table.iter().map(|(_, c)| c).max().unwrap_or(0).max(1);
    let mut out = new_table(vec!["Numéro", "Fréquence", ""]);
    for (number, count) in table.ranked() {
        let bar = "█".repeat((count as f64 / max as f64 * 30.0).round() as usize);
        out.add_row(vec![format!("{:2}", number), count.to_string(), bar]);
    }
    println!("{out}");
}

pub fn display_frequency_chart(table: &FrequencyTable) {
    let points: Vec<(f32, f32)> = table.iter().map(|(n, c)| (n as f32, c as f32)).collect();
    let y_max = points.iter().map(|p| p.1).fold(1.0f32, f32::max);

    println!("\n== Fréquence par numéro ==\n");
    let shape = textplots::Shape::Bars(&points);
    let mut chart = textplots::Chart::new_with_y_range(120, 40, 0.0, 46.0, 0.0, y_max * 1.1);
    println!("{}", chart.lineplot(&shape));
}

pub fn display_patterns(report: &PatternReport, top_pairs: &[((u8, u8), u32)]) {
    println!("\n🔁 Motifs ({} numéros analysés)\n", report.slots);

    let mut table = new_table(vec!["Motif", "Proportion"]);
    table.add_row(vec!["Pairs".to_string(), format!("{:.2} %", report.even_pct)]);
    table.add_row(vec!["Impairs".to_string(), format!("{:.2} %", report.odd_pct)]);
    table.add_row(vec!["Bas (1-22)".to_string(), format!("{:.2} %", report.low_pct)]);
    table.add_row(vec!["Hauts (23-45)".to_string(), format!("{:.2} %", report.high_pct)]);
    table.add_row(vec!["Paires consécutives".to_string(), report.total_consecutive().to_string()]);
    println!("{table}");

    if top_pairs.is_empty() {
        return;
    }
    println!("\n── Paires consécutives les plus fréquentes ──");
    let mut table = new_table(vec!["Paire", "Occurrences"]);
    for ((a, b), count) in top_pairs {
        table.add_row(vec![format!("{:2} - {:2}", a, b), count.to_string()]);
    }
    println!("{table}");
}

pub fn display_recent(top: &[u8], cold: &[u8], window_days: u32) {
    println!("\n🔥 Fenêtre des {} derniers jours\n", window_days);
    if top.is_empty() {
        println!("  Aucun tirage dans la fenêtre.");
        return;
    }
    println!("  Numéros les plus sortis : {}", join_numbers(top));
    if cold.is_empty() {
        println!("  Numéros absents         : aucun");
    } else {
        println!("  Numéros absents         : {}", join_numbers(cold));
    }
}

pub fn display_combinations(combinations: &[Combination], seeds: &[u8]) {
    println!("\n🎲 Combinaisons proposées\n");
    if seeds.is_empty() {
        println!("  (sans biais récent)");
    } else {
        println!("  Au moins un numéro parmi : {}", join_numbers(seeds));
    }

    let mut table = new_table(vec!["#", "Numéros", "Favoris inclus"]);
    for (i, combination) in combinations.iter().enumerate() {
        let favored: Vec<u8> = combination
            .numbers()
            .iter()
            .copied()
            .filter(|n| seeds.contains(n))
            .collect();
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(combination.to_string()),
            Cell::new(join_numbers(&favored)).fg(Color::Green),
        ]);
    }
    println!("{table}");
}

pub fn display_check(combination: &Combination, winner: Option<&Draw>) {
    match winner {
        Some(draw) => println!(
            "✅ {} est sortie au tirage n°{} du {}.",
            combination, draw.draw_no, draw.date
        ),
        None => println!("❌ {} n'est jamais sortie.", combination),
    }
}
