use kamonitu_config::{AppContext, CheckDefinition, Schematic, DEFAULT_CONFIG_PATH};

fn main() -> Result<(), kamonitu_config::Error> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let ctx = AppContext::load(&path)?;

    println!("Application config ({path}):");
    for (key, source) in ctx.config_provenance().iter() {
        println!("  {key:<42} {source}");
    }

    // Failed files are reported but don't stop the others from loading
    let scan = ctx.checks().scan()?;
    for (file, check) in &scan.entities {
        println!("\n{file}:");
        for (key, value) in CheckDefinition::schema().render(&check.value) {
            let source = check.provenance.get(&key).map(|s| s.as_str()).unwrap_or("-");
            println!("  {key:<42} {value:<30} {source}");
        }
    }
    if let Some(errors) = &scan.errors {
        eprintln!("\n{errors}");
    }

    Ok(())
}
