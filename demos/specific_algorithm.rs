use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use typed_ini::{ConfigStore, Kind, Rule, Schema, SchemaItem, SchemaSection};

fn schema() -> Schema {
    let between_0_and_100 = Arc::new(Rule::in_range(0.0, 100.0));
    let positive = Arc::new(Rule::AlwaysPositive);

    Schema::new()
        .section(
            SchemaSection::new("ABT")
                .item(
                    SchemaItem::new("kor", Kind::Float, "500.0", "ABT kor value")
                        .with_rule(Arc::clone(&positive)),
                )
                .item(SchemaItem::new("koh", Kind::Integer, "1", "ABT koh value")),
        )
        .section(
            SchemaSection::new("TBM").item(
                SchemaItem::new("kor", Kind::Float, "500.0", "TBM kor value").with_rule(positive),
            ),
        )
        .section(
            SchemaSection::new("General")
                .item(
                    SchemaItem::new("FW", Kind::Float, "10.0", "Fixed Wing value")
                        .with_rule(Arc::clone(&between_0_and_100)),
                )
                .item(
                    SchemaItem::new("RW", Kind::Float, "20.0", "Rotary Wing value")
                        .with_rule(Arc::clone(&between_0_and_100)),
                )
                .item(
                    SchemaItem::new("CM", Kind::Float, "30.0", "Cruise Missile value")
                        .with_rule(between_0_and_100),
                )
                .item(SchemaItem::new(
                    "Misc",
                    Kind::FloatList,
                    "1.0,2.0,3.0",
                    "Misc item just for proof of principle",
                )),
        )
}

fn main() -> Result<(), typed_ini::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Pass a schema document path as the first argument to use it instead
    // of the built-in schema, e.g. `demos/specific_algorithm.toml`.
    let schema = match std::env::args().nth(1) {
        Some(path) => Schema::from_file(path)?,
        None => schema(),
    };

    let mut config = ConfigStore::builder()
        .with_file("specific_algorithm_config.ini")
        .with_schema(schema)
        .build()?;

    let report = config.initialize()?;
    for fallback in &report.fallbacks {
        info!(
            "[{}] {} = '{}' replaced: {}",
            fallback.section, fallback.key, fallback.text, fallback.reason
        );
    }

    println!("Loaded configuration:");
    for (name, section) in config.sections() {
        println!("[{name}]");
        for (key, value) in section.values() {
            println!("{key} = {value}");
        }
        println!();
    }

    let kor: f64 = config.get_value("ABT", "kor")?;
    let koh: i64 = config.get_value("ABT", "koh")?;
    println!("ABT.kor = {kor}, ABT.koh = {koh}, kor * 3 = {}", kor * 3.0);

    if let Err(e) = config.set_value("General", "FW", 150.0) {
        error!("validation error: {e}");
    }
    config.set_value("General", "FW", 20.0)?;
    println!("General.FW = {}", config.get_value::<f64>("General", "FW")?);

    config.save_config()?;
    Ok(())
}
