#![allow(clippy::expect_used, clippy::doc_markdown, clippy::uninlined_format_args)]
//! Example: register a few settings, override one per account, and dump them
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=mailledger_config=debug cargo run --package mailledger-config --example dump_settings
//! ```

use mailledger_config::{
    ConfigSet, DataType, DumpOptions, DumpStyle, LoggingListener, RegisterFlags, SortContext,
    SortKey, SortOrder, Storage, VarType, VariableDef, dump,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailledger_config=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let sort = Storage::new();
    let sort_aux = Storage::new();
    let sort_browser = Storage::new();
    let beep = Storage::new();

    let mut cs = ConfigSet::with_default_types();
    cs.register(
        vec![
            VariableDef::new("sort", SortContext::Index.var_type(), &sort)
                .with_initial(SortOrder::new(SortKey::Date).to_native()),
            VariableDef::new("sort_aux", SortContext::Aux.var_type(), &sort_aux)
                .with_initial(SortOrder::new(SortKey::Date).to_native()),
            VariableDef::new("sort_browser", SortContext::Browser.var_type(), &sort_browser)
                .with_initial(SortOrder::new(SortKey::ALPHA).to_native()),
            VariableDef::new("beep", VarType::new(DataType::BOOL, 0), &beep).with_initial(1),
        ],
        RegisterFlags::NONE,
    )?;
    cs.add_listener(LoggingListener);

    cs.string_set("sort", "threads")?;
    cs.string_set("sort_aux", "reverse-last-date-received")?;

    cs.create_scope("work", &["sort", "beep"])?;
    cs.string_set("work:sort", "reverse-score")?;
    cs.string_set("work:beep", "no")?;

    println!("All settings");
    println!("============\n");
    print!("{}", dump(&cs, DumpOptions::new())?);

    println!("\nChanged settings");
    println!("================\n");
    let options = DumpOptions::new()
        .style(DumpStyle::Mutt)
        .only_changed(true)
        .show_defaults(true);
    print!("{}", dump(&cs, options)?);

    let work = cs.scope_id("work").expect("scope was just created");
    cs.destroy_scope(work)?;
    println!("\nsort is still {}", cs.string_get("sort")?);

    Ok(())
}
