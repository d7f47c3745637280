use socialgraph::reset::audit::recent_resets;
use socialgraph::{config::Config, db::Db, GraphStore, SqliteGraphStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    let db = Db::new(config.db_path());
    let store = SqliteGraphStore::new(db.clone());

    println!("\n=== SocialGraph Dataset Statistics ===\n");

    let counts = store.counts().await?;
    println!("People:        {}", counts.people);
    println!("Relationships: {}", counts.relationships);

    let resets = recent_resets(&db, 10).await?;
    if resets.is_empty() {
        println!("\nNo resets recorded yet.");
        return Ok(());
    }

    println!("\nRecent Resets:\n");
    println!("{:-<96}", "");
    println!(
        "{:<36} {:<26} {:>9} {:>8} {:<12}",
        "Reset ID", "Timestamp", "Requested", "Written", "Outcome"
    );
    println!("{:-<96}", "");
    for entry in &resets {
        println!(
            "{:<36} {:<26} {:>9} {:>8} {:<12}",
            entry.reset_id,
            entry.timestamp.get(..26).unwrap_or(&entry.timestamp),
            entry.requested_count,
            entry.written_count,
            entry.outcome
        );
        if let Some(err) = &entry.error_message {
            println!("    error: {}", err);
        }
    }
    println!("{:-<96}", "");
    println!();

    Ok(())
}
