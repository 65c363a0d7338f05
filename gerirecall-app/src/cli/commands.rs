use crate::cli::opts::*;
use crate::config::Config;
use crate::SharedScheduler;

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use gerirecall_core::{
    daily_streak, filter_by_category, filter_by_difficulty, filter_by_text, summarize,
    ExportBundle, PersistencePolicy, ReviewItem, Scheduler, Settings, Store,
};
use gerirecall_json::{paths::data_root, JsonFileStore};
use serde::{Deserialize, Serialize};
use std::io::{stdin, stdout, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

pub fn open_scheduler(args: &Cli, config: &Config) -> Result<SharedScheduler> {
    let root = args
        .data_dir
        .clone()
        .or_else(|| config.storage.data_dir.clone())
        .unwrap_or_else(data_root);
    let key = args.key.as_deref().unwrap_or(&config.storage.key);
    let policy = if args.strict {
        PersistencePolicy::Strict
    } else {
        config.storage.policy()
    };

    let store = JsonFileStore::open_in(&root, key, config.storage.max_backups)
        .with_context(|| format!("opening store in {}", root.display()))?;
    let store: Box<dyn Store> = Box::new(store);
    let sched = Scheduler::open(store, policy)?;

    if let Some(sc) = &config.scheduler {
        let wanted = Settings::from(sc);
        if wanted != sched.settings() {
            info!(?wanted, "applying scheduler settings from config");
            sched.set_settings(wanted)?;
        }
    }
    Ok(Arc::new(sched))
}

pub fn run(sched: &SharedScheduler, cmd: Command) -> Result<()> {
    match cmd {
        Command::Add(a) => {
            let id = a.id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let c = sched.add_item(&id, &a.front, &a.back, &a.category, &a.difficulty)?;
            println!("{}", c.id);
        }
        Command::Review(r) => {
            let c = sched.review(&r.id, r.performance, r.seconds)?;
            println!("→ next due in {} day(s) ({})", c.interval, fmt_time(&c));
        }
        Command::Study(s) => study(sched, s)?,
        Command::Due { limit } => {
            for c in sched.due_cards(limit) {
                print_item(&c);
            }
        }
        Command::New { limit } => {
            for c in sched.new_cards(limit) {
                print_item(&c);
            }
        }
        Command::List(l) => {
            let mut cards = sched.list();
            if let Some(cat) = &l.category {
                cards = filter_by_category(&cards, cat);
            }
            if let Some(d) = &l.difficulty {
                cards = filter_by_difficulty(&cards, d);
            }
            if let Some(q) = &l.search {
                cards = filter_by_text(&cards, q);
            }
            cards.sort_by_key(|c| c.created);
            for c in cards {
                print_item(&c);
            }
        }
        Command::Show { id } => {
            let c = sched.get(&id)?;
            println!("{}", serde_json::to_string_pretty(&c)?);
            for r in sched.history(&id)? {
                println!(
                    "{}\tperformance={}\tinterval={}\tef={:.2}\tseconds={}",
                    r.reviewed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                    r.performance.value(),
                    r.interval_applied,
                    r.ease_factor_after,
                    r.time_spent
                );
            }
        }
        Command::Reset { id } => {
            sched.reset_card(&id)?;
            println!("ok");
        }
        Command::Rm { id } => {
            if sched.delete_card(&id)? {
                println!("ok");
            } else {
                println!("no such card: {id}");
            }
        }
        Command::Stats { json } => stats_cmd(sched, json)?,
        Command::Settings(s) => settings_cmd(sched, s)?,
        Command::Export(cmd) => export_cmd(sched, cmd)?,
        Command::Import(cmd) => import_cmd(sched, cmd)?,
        Command::Serve { .. } => bail!("serve runs on the async runtime"),
    }
    Ok(())
}

fn study(sched: &SharedScheduler, args: StudyArgs) -> Result<()> {
    let mut pool = sched.due_cards(usize::MAX);
    if args.include_new {
        for c in sched.new_cards(usize::MAX) {
            if !pool.iter().any(|p| p.id == c.id) {
                pool.push(c);
            }
        }
    }
    if let Some(cat) = &args.category {
        pool = filter_by_category(&pool, cat);
    }
    pool.truncate(args.limit);
    if pool.is_empty() {
        println!("no cards due");
        return Ok(());
    }

    let total = pool.len();
    let mut reviewed = 0usize;
    for (i, card) in pool.into_iter().enumerate() {
        println!("\n[{}/{}] {} ({})", i + 1, total, card.id, card.category);
        println!("Q: {}", card.front);
        let started = Instant::now();
        prompt_enter("[enter=show]")?;
        println!("A: {}", card.back);
        println!("[0-5=rating, s=skip, q=quit]");
        let rating = loop {
            let line = read_line("rating> ")?;
            match line.trim().to_lowercase().as_str() {
                "s" | "skip" => break None,
                "q" | "quit" => {
                    println!("\nreviewed {reviewed}");
                    return Ok(());
                }
                other => match other.parse::<i64>() {
                    Ok(p) if (0..=5).contains(&p) => break Some(p),
                    _ => println!("enter 0-5, s, or q"),
                },
            }
        };

        if let Some(p) = rating {
            let updated = sched.review(&card.id, p, started.elapsed().as_secs())?;
            reviewed += 1;
            println!("→ next due in {} day(s)", updated.interval);
        }
    }

    println!("\nreviewed {reviewed}");
    Ok(())
}

fn stats_cmd(sched: &SharedScheduler, json: bool) -> Result<()> {
    let st = sched.statistics();
    let history = sched.all_history();
    let streak = daily_streak(&history, Utc::now().date_naive());
    if json {
        let out = serde_json::json!({
            "statistics": st,
            "history": summarize(&history),
            "streak": streak,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("cards:     {} (new {}, learning {}, review {})", st.total, st.new, st.learning, st.review);
    println!("due:       {} (overdue {})", st.due, st.overdue);
    println!("mastered:  {}", st.mastered);
    println!("mean ease: {:.2}", st.average_ease_factor);
    match st.retention.overall {
        Some(r) => println!("retention: {r:.2} / 5"),
        None => println!("retention: -"),
    }
    for (d, r) in &st.retention.by_difficulty {
        println!("  {d}: {r:.2}");
    }
    println!("streak:    {streak} day(s)");
    for (name, c) in &st.categories {
        println!(
            "{name}\ttotal={}\tnew={}\tdue={}\tmastered={}\tease={:.2}\treviews={}",
            c.total, c.new, c.due, c.mastered, c.average_ease_factor, c.total_reviews
        );
    }
    Ok(())
}

fn settings_cmd(sched: &SharedScheduler, args: SettingsArgs) -> Result<()> {
    let mut s = sched.settings();
    let before = s.clone();
    if let Some(v) = args.new_card_interval {
        s.new_card_interval = v;
    }
    if let Some(v) = args.max_interval {
        s.max_interval = v;
    }
    if let Some(v) = args.min_ease_factor {
        s.min_ease_factor = v;
    }
    if let Some(v) = args.default_ease_factor {
        s.default_ease_factor = v;
    }
    if s != before {
        sched.set_settings(s.clone())?;
    }
    println!("{}", serde_json::to_string_pretty(&s)?);
    Ok(())
}

fn export_cmd(sched: &SharedScheduler, cmd: ExportCmd) -> Result<()> {
    match cmd {
        ExportCmd::Json { path } => {
            let s = serde_json::to_string_pretty(&sched.export())?;
            std::fs::write(&path, s).with_context(|| format!("writing {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        ExportCmd::Csv { path } => {
            let file = std::fs::File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            let n = export_csv(sched.as_ref(), file)?;
            println!("wrote {n} card(s) to {}", path.display());
        }
    }
    Ok(())
}

fn import_cmd(sched: &SharedScheduler, cmd: ImportCmd) -> Result<()> {
    match cmd {
        ImportCmd::Json { path } => {
            let data = read_file(&path)?;
            let bundle: ExportBundle = serde_json::from_str(&data)
                .with_context(|| format!("parsing {}", path.display()))?;
            sched.import(bundle)?;
            println!("imported {} card(s)", sched.len());
        }
        ImportCmd::Csv { path } => {
            let file = std::fs::File::open(&path)
                .with_context(|| format!("opening {}", path.display()))?;
            let n = import_csv(sched.as_ref(), file)?;
            println!("imported {n} card(s)");
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CsvCardIn {
    #[serde(default)]
    id: String,
    front: String,
    back: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    difficulty: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvCardOut<'a> {
    id: &'a str,
    front: &'a str,
    back: &'a str,
    category: &'a str,
    difficulty: &'a str,
    repetitions: u32,
    ease_factor: f64,
    interval: u32,
    next_review: String,
    total_reviews: u32,
}

/// Adds every CSV row as a card. Rows without an id get a fresh UUID.
pub fn import_csv<S: Store>(sched: &Scheduler<S>, input: impl Read) -> Result<usize> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut n = 0;
    for (line, rec) in rdr.deserialize::<CsvCardIn>().enumerate() {
        let rec = rec.with_context(|| format!("csv row {}", line + 1))?;
        let id = if rec.id.is_empty() { Uuid::new_v4().to_string() } else { rec.id };
        let category = non_empty_or(&rec.category, "general");
        let difficulty = non_empty_or(&rec.difficulty, "medium");
        sched.add_item(&id, &rec.front, &rec.back, category, difficulty)?;
        n += 1;
    }
    Ok(n)
}

pub fn export_csv<S: Store>(sched: &Scheduler<S>, output: impl Write) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(output);
    let mut cards = sched.list();
    cards.sort_by_key(|c| c.created);
    for c in &cards {
        wtr.serialize(CsvCardOut {
            id: &c.id,
            front: &c.front,
            back: &c.back,
            category: &c.category,
            difficulty: &c.difficulty,
            repetitions: c.repetitions,
            ease_factor: c.ease_factor,
            interval: c.interval,
            next_review: fmt_time(c),
            total_reviews: c.total_reviews,
        })?;
    }
    wtr.flush()?;
    Ok(cards.len())
}

// ===== Helpers =====
fn non_empty_or<'a>(s: &'a str, fallback: &'a str) -> &'a str {
    if s.is_empty() { fallback } else { s }
}

fn fmt_time(c: &ReviewItem) -> String {
    c.next_review.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn print_item(c: &ReviewItem) {
    println!(
        "{}\t{}\t{}/{}\tdue={}\tinterval={}\tef={:.2}\treviews={}",
        c.id, c.front, c.category, c.difficulty, fmt_time(c), c.interval, c.ease_factor, c.total_reviews
    );
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn prompt_enter(label: &str) -> Result<()> { print!("{label}"); stdout().flush().ok(); let mut s = String::new(); stdin().read_line(&mut s)?; Ok(()) }
fn read_line(prompt: &str) -> Result<String> { print!("{prompt}"); stdout().flush().ok(); let mut s = String::new(); stdin().read_line(&mut s)?; Ok(s) }
