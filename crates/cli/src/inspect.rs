use std::path::Path;

use anyhow::Context;
use apistub_dex::DexContainer;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct DexRow {
    #[tabled(rename = "Entry")]
    entry: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Classes")]
    classes: u32,
}

pub fn run(archive: &Path) -> anyhow::Result<()> {
    let container = DexContainer::open(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;

    let mut rows = Vec::new();
    container.for_each_dex(|name, dex| {
        rows.push(DexRow {
            entry: name.to_string(),
            version: format!("{:03}", dex.version()),
            classes: dex.class_count(),
        });
        Ok(())
    })?;

    if rows.is_empty() {
        println!("No dex images found in {}", archive.display());
    } else {
        let total: u32 = rows.iter().map(|row| row.classes).sum();
        println!("{}", Table::new(rows));
        println!("Total classes: {}", total);
    }
    Ok(())
}
